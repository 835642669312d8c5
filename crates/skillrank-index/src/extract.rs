//! Turning a model reply into an index entry.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use skillrank_skills::record::lenient_list;
use skillrank_skills::{Keywords, Priority, SkillEntry};

/// Threshold stored when the model omits one, and for fallback entries.
pub const EXTRACTED_THRESHOLD: f64 = 0.7;

static OPEN_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\A```\w*\n?").unwrap());
static CLOSE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n?```\z").unwrap());

/// Metadata fields as the model returned them. Wrong shapes degrade to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ExtractedMetadata {
    #[serde(default)]
    pub keywords: Option<Keywords>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub use_cases: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub intent_patterns: Vec<String>,
    #[serde(default)]
    pub priority: Option<Value>,
    #[serde(default)]
    pub confidence_threshold: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
}

impl ExtractedMetadata {
    /// Parse a reply, tolerating a surrounding fenced code block.
    ///
    /// Returns `None` when the reply is not a non-empty JSON object.
    #[must_use]
    pub fn parse(reply: &str) -> Option<Self> {
        let body = strip_fences(reply);
        let value: Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("reply is not JSON: {e}");
                return None;
            }
        };
        match &value {
            Value::Object(map) if !map.is_empty() => {}
            _ => {
                tracing::debug!("reply is not a non-empty JSON object");
                return None;
            }
        }
        serde_json::from_value(value)
            .inspect_err(|e| tracing::debug!("reply has unusable fields: {e}"))
            .ok()
    }

    /// Index entry for this metadata. Missing keywords become empty lists for
    /// each of `languages`.
    #[must_use]
    pub fn into_entry(self, languages: &[String]) -> SkillEntry {
        let keywords = self
            .keywords
            .unwrap_or_else(|| languages.iter().map(|l| (l.clone(), Vec::new())).collect());
        let priority = self
            .priority
            .as_ref()
            .and_then(Value::as_str)
            .map_or(Priority::Medium, |p| Priority::from(p.to_owned()));
        let confidence_threshold = self
            .confidence_threshold
            .as_ref()
            .and_then(Value::as_f64)
            .unwrap_or(EXTRACTED_THRESHOLD);
        let description = self
            .description
            .as_ref()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();

        SkillEntry {
            priority,
            enforcement: None,
            description,
            keywords,
            tags: self.tags,
            use_cases: self.use_cases,
            intent_patterns: self.intent_patterns,
            auto_activate: true,
            confidence_threshold,
        }
    }
}

/// Entry synthesized when extraction fails: the skill name (dashes as spaces)
/// as the only keyword in the first language.
#[must_use]
pub fn fallback_entry(skill_name: &str, languages: &[String]) -> SkillEntry {
    let keywords: Keywords = languages
        .iter()
        .enumerate()
        .map(|(i, lang)| {
            let terms = if i == 0 {
                vec![skill_name.replace('-', " ")]
            } else {
                Vec::new()
            };
            (lang.clone(), terms)
        })
        .collect();

    SkillEntry {
        priority: Priority::Medium,
        description: format!("Skill: {skill_name}"),
        keywords,
        confidence_threshold: EXTRACTED_THRESHOLD,
        ..SkillEntry::default()
    }
}

/// Trim and drop a leading and trailing code fence when the reply starts with one.
#[must_use]
pub fn strip_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let start = OPEN_FENCE.find(trimmed).map_or(0, |m| m.end());
    let inner = &trimmed[start..];
    let end = CLOSE_FENCE.find(inner).map_or(inner.len(), |m| m.start());
    &inner[..end]
}
