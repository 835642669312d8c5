//! The persisted `INDEX.yaml` artifact.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};

use crate::config::{ActivationConfig, KeywordWeights};
use crate::error::Result;
use crate::record::{
    DEFAULT_CONFIDENCE_THRESHOLD, Enforcement, Keywords, Priority, SkillRecord, SourceTier,
    lenient_list,
};

pub const INDEX_FILE: &str = "INDEX.yaml";
pub const ARTIFACT_VERSION: &str = "1.0";
pub const GENERATED_BY: &str = "ai-index-generator";

/// Per-skill entries are kept as raw YAML values so that regenerating a
/// subset leaves every other entry exactly as it was read.
///
/// Header fields are lenient: a malformed one falls back to its default.
/// Only invalid YAML or a `skills` value that is not a mapping rejects the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexArtifact {
    #[serde(deserialize_with = "lenient_text")]
    pub version: String,
    #[serde(deserialize_with = "lenient_text")]
    pub generated_by: String,
    #[serde(deserialize_with = "lenient_text")]
    pub ai_provider: String,
    #[serde(deserialize_with = "lenient_text")]
    pub ai_model: String,
    #[serde(deserialize_with = "lenient_section")]
    pub activation_config: ActivationConfig,
    #[serde(deserialize_with = "lenient_section")]
    pub keyword_weights: KeywordWeights,
    pub skills: Mapping,
}

fn lenient_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => {
            tracing::warn!("ignoring non-scalar index header field: {other:?}");
            String::new()
        }
    })
}

fn lenient_section<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    Ok(serde_yaml::from_value(value).unwrap_or_else(|e| {
        tracing::warn!("ignoring malformed index header section: {e}");
        T::default()
    }))
}

impl Default for IndexArtifact {
    fn default() -> Self {
        Self {
            version: ARTIFACT_VERSION.into(),
            generated_by: GENERATED_BY.into(),
            ai_provider: String::new(),
            ai_model: String::new(),
            activation_config: ActivationConfig::default(),
            keyword_weights: KeywordWeights::default(),
            skills: Mapping::new(),
        }
    }
}

impl IndexArtifact {
    #[must_use]
    pub fn new(ai_provider: impl Into<String>, ai_model: impl Into<String>) -> Self {
        Self {
            ai_provider: ai_provider.into(),
            ai_model: ai_model.into(),
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid artifact.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// # Errors
    ///
    /// Returns an error if the text is not a valid artifact.
    pub fn parse(content: &str) -> Result<Self> {
        let mut artifact: Self = serde_yaml::from_str(content)?;
        if artifact.version.is_empty() {
            artifact.version = ARTIFACT_VERSION.into();
        }
        Ok(artifact)
    }

    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the file written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    #[must_use]
    pub fn raw_entry(&self, name: &str) -> Option<&Value> {
        self.skills.get(name)
    }

    /// Well-formed entries in file order; malformed ones are logged and skipped.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, SkillEntry)> {
        self.skills
            .iter()
            .filter_map(|(key, value)| {
                let Some(name) = key.as_str() else {
                    tracing::warn!("skipping index entry with non-string name: {key:?}");
                    return None;
                };
                if !value.is_mapping() {
                    tracing::warn!(skill = name, "skipping index entry that is not a mapping");
                    return None;
                }
                match serde_yaml::from_value::<SkillEntry>(value.clone()) {
                    Ok(entry) => Some((name.to_owned(), entry)),
                    Err(e) => {
                        tracing::warn!(skill = name, "skipping malformed index entry: {e}");
                        None
                    }
                }
            })
            .collect()
    }

    /// Insert or replace one entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be converted to YAML.
    pub fn insert(&mut self, name: &str, entry: &SkillEntry) -> Result<()> {
        let value = serde_yaml::to_value(entry)?;
        self.skills.insert(Value::String(name.to_owned()), value);
        Ok(())
    }
}

/// Metadata stored for one skill in the artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEntry {
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforcement: Option<Enforcement>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Keywords,
    #[serde(default, deserialize_with = "lenient_list")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub use_cases: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub intent_patterns: Vec<String>,
    #[serde(default = "default_true")]
    pub auto_activate: bool,
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f64,
}

fn default_true() -> bool {
    true
}

fn default_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

impl Default for SkillEntry {
    fn default() -> Self {
        Self {
            priority: Priority::default(),
            enforcement: None,
            description: String::new(),
            keywords: Keywords::new(),
            tags: Vec::new(),
            use_cases: Vec::new(),
            intent_patterns: Vec::new(),
            auto_activate: true,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

impl SkillEntry {
    /// Build the record for this entry, as found in the artifact next to `skills_dir`.
    ///
    /// The record points at `skills_dir/<name>` when that directory exists,
    /// otherwise at `skills_dir` itself.
    #[must_use]
    pub fn into_record(self, name: &str, skills_dir: &Path, source: SourceTier) -> SkillRecord {
        let skill_dir = skills_dir.join(name);
        let path = if skill_dir.is_dir() {
            skill_dir
        } else {
            skills_dir.to_path_buf()
        };

        let mut record = SkillRecord::new(name, path, source);
        record.priority = self.priority;
        record.enforcement = self.enforcement.unwrap_or_default();
        record.description = self.description;
        record.keywords = self.keywords;
        record.tags = self.tags;
        record.use_cases = self.use_cases;
        record.intent_patterns = self.intent_patterns;
        record.auto_activate = self.auto_activate;
        record.confidence_threshold = self.confidence_threshold;
        record
    }
}
