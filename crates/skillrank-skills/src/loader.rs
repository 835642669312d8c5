use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Result, SkillError};
use crate::record::{Enforcement, Keywords, Priority, SkillRecord, SourceTier, lenient_list};

pub const SKILL_FILE: &str = "SKILL.md";

static FRONTMATTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A---\s*\n(.*?)\n---\s*\n").unwrap());

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Frontmatter {
    name: Option<String>,
    description: Option<String>,
    priority: Option<Priority>,
    enforcement: Option<Enforcement>,
    keywords: Option<Keywords>,
    #[serde(deserialize_with = "lenient_list")]
    tags: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    use_cases: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    intent_patterns: Vec<String>,
    auto_activate: Option<bool>,
    confidence_threshold: Option<f64>,
}

/// Load the `SKILL.md` inside `skill_dir`.
///
/// A missing or malformed metadata block never fails: the record is
/// synthesized from the directory name instead.
///
/// # Errors
///
/// Returns an error only if the document cannot be read.
pub fn load_skill_document(skill_dir: &Path, source: SourceTier) -> Result<SkillRecord> {
    let path = skill_dir.join(SKILL_FILE);
    let content =
        std::fs::read_to_string(&path).map_err(|e| SkillError::Read { path, source: e })?;
    Ok(parse_skill_document(&content, skill_dir, source))
}

#[must_use]
pub fn parse_skill_document(content: &str, skill_dir: &Path, source: SourceTier) -> SkillRecord {
    let dir_name = skill_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let Some(frontmatter) = parse_frontmatter(content) else {
        tracing::debug!(dir = %skill_dir.display(), "no usable frontmatter, using minimal record");
        return minimal_record(&dir_name, skill_dir, source);
    };

    let name = frontmatter
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| dir_name.clone());

    let mut record = SkillRecord::new(name, skill_dir, source);
    record.description = frontmatter.description.unwrap_or_default();
    record.priority = frontmatter.priority.unwrap_or_default();
    record.enforcement = frontmatter.enforcement.unwrap_or_default();
    record.keywords = frontmatter.keywords.unwrap_or_default();
    record.tags = frontmatter.tags;
    record.use_cases = frontmatter.use_cases;
    record.intent_patterns = frontmatter.intent_patterns;
    record.auto_activate = frontmatter.auto_activate.unwrap_or(true);
    if let Some(threshold) = frontmatter.confidence_threshold {
        record.confidence_threshold = threshold;
    }
    record
}

fn parse_frontmatter(content: &str) -> Option<Frontmatter> {
    let block = FRONTMATTER_RE.captures(content)?.get(1)?.as_str();
    if block.trim().is_empty() {
        return None;
    }
    match serde_yaml::from_str::<Frontmatter>(block) {
        Ok(fm) => Some(fm),
        Err(e) => {
            tracing::warn!("invalid skill frontmatter: {e}");
            None
        }
    }
}

fn minimal_record(dir_name: &str, skill_dir: &Path, source: SourceTier) -> SkillRecord {
    SkillRecord::new(dir_name, skill_dir, source).with_description(format!("Skill from {dir_name}"))
}
