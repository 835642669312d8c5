//! Prompts sent to the extraction model.

use std::fmt::Write;

/// Characters of a skill document included in the prompt.
pub const CONTENT_BUDGET: usize = 8000;

/// System prompt requesting one JSON object with keywords in each of `languages`.
#[must_use]
pub fn system_prompt(languages: &[String]) -> String {
    let keyword_lines = languages
        .iter()
        .map(|lang| format!("    \"{lang}\": [\"keyword1\", \"keyword2\", ...]"))
        .collect::<Vec<_>>()
        .join(",\n");

    let mut prompt = String::with_capacity(2048);
    prompt.push_str(
        "You extract structured metadata from skill documents for keyword-based skill matching.\n\n",
    );
    let _ = writeln!(
        prompt,
        "Produce:\n\
         1. Keywords in these languages: {}\n\
         2. Tags for categorization\n\
         3. Use cases describing when the skill applies\n\
         4. Intent patterns (regular expressions) for longer user requests\n\
         5. Priority (high/medium/low)\n\
         6. A confidence threshold between 0.5 and 0.9; higher is stricter\n",
        languages.join(", ")
    );
    let _ = writeln!(
        prompt,
        "Reply with a single JSON object and nothing else, in exactly this shape:\n\
         {{\n  \"keywords\": {{\n{keyword_lines}\n  }},\n  \
         \"tags\": [\"tag1\", \"tag2\", ...],\n  \
         \"use_cases\": [\"Sentence starting with an -ing verb\", ...],\n  \
         \"intent_patterns\": [\"regex 1\", \"regex 2\", ...],\n  \
         \"priority\": \"high|medium|low\",\n  \
         \"confidence_threshold\": 0.7,\n  \
         \"description\": \"One line saying when to use this skill\"\n}}\n"
    );
    prompt.push_str(
        "Keywords:\n\
         - Only terms central to the skill's main purpose; skip generic words shared by unrelated skills\n\
         - Short words users actually type, one or two words each\n\
         - Include the root word and its common forms (debug, debugging, debugger)\n\
         - Include nouns and verbs, 15 to 25 per language\n\n\
         Use cases (these drive matching):\n\
         - Start each with a present participle (-ing) verb\n\
         - Mention the skill's main action verb in at least one\n\
         - Give 4 to 6 concrete cases, e.g. \"Debugging intermittent test failures in CI pipelines\"\n\n\
         Intent patterns:\n\
         - 2 to 4 case-insensitive regular expressions, using .* between words, e.g. \"fix.*bug\"\n\n\
         Other:\n\
         - At most 5 general tags\n\
         - Priority: high for core, frequently used skills; medium for specialized; low for niche\n\
         - Threshold: 0.5 to 0.6 for general skills, 0.7 or more for specific ones",
    );
    prompt
}

/// User prompt embedding the skill name and the start of its document.
#[must_use]
pub fn extraction_prompt(skill_name: &str, content: &str) -> String {
    format!(
        "Analyze this skill document and extract metadata:\n\n\
         Skill Name: {skill_name}\n\n\
         Content:\n---\n{}\n---\n\n\
         Remember: output ONLY valid JSON, no markdown code blocks.",
        truncate_chars(content, CONTENT_BUDGET)
    )
}

fn truncate_chars(text: &str, max: usize) -> &str {
    text.char_indices().nth(max).map_or(text, |(i, _)| &text[..i])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_lists_every_language() {
        let prompt = system_prompt(&["english".into(), "korean".into()]);
        assert!(prompt.contains("these languages: english, korean"));
        assert!(prompt.contains("\"english\": [\"keyword1\""));
        assert!(prompt.contains("\"korean\": [\"keyword1\""));
    }

    #[test]
    fn extraction_prompt_truncates_by_chars() {
        let content = "가".repeat(CONTENT_BUDGET + 100);
        let prompt = extraction_prompt("wide", &content);
        assert_eq!(prompt.matches('가').count(), CONTENT_BUDGET);
        assert!(prompt.contains("Skill Name: wide"));
    }

    #[test]
    fn short_content_kept_whole() {
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abcdef", 3), "abc");
    }
}
