use std::fmt;
use std::path::PathBuf;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Language that flat keyword lists are attributed to.
pub const DEFAULT_LANGUAGE: &str = "english";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTier {
    Project,
    User,
    System,
    Custom,
}

impl SourceTier {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::User => "user",
            Self::System => "system",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for SourceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown spellings fall back to `Medium` rather than failing the record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl From<String> for Priority {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Enforcement {
    Required,
    #[default]
    Suggested,
    Optional,
}

impl Enforcement {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Suggested => "suggested",
            Self::Optional => "optional",
        }
    }
}

impl From<String> for Enforcement {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "required" => Self::Required,
            "optional" => Self::Optional,
            _ => Self::Suggested,
        }
    }
}

impl fmt::Display for Enforcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword lists per language, in source order. The first terms across all
/// languages are the skill's primary keywords.
///
/// Deserializes from either a `{language: [terms]}` mapping or a flat list,
/// which is attributed to [`DEFAULT_LANGUAGE`]. Non-list values are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keywords(Vec<(String, Vec<String>)>);

impl Keywords {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn single(language: &str, terms: Vec<String>) -> Self {
        Self(vec![(language.to_owned(), terms)])
    }

    #[must_use]
    pub fn get(&self, language: &str) -> &[String] {
        self.0
            .iter()
            .find(|(lang, _)| lang == language)
            .map(|(_, terms)| terms.as_slice())
            .unwrap_or_default()
    }

    /// Replace the terms for `language`, appending it if new.
    pub fn set(&mut self, language: &str, terms: Vec<String>) {
        if let Some(slot) = self.0.iter_mut().find(|(lang, _)| lang == language) {
            slot.1 = terms;
        } else {
            self.0.push((language.to_owned(), terms));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(lang, terms)| (lang.as_str(), terms.as_slice()))
    }

    /// True when no language carries any term.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|(_, terms)| terms.is_empty())
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.0.iter().map(|(_, terms)| terms.len()).sum()
    }

    /// Every term across languages, lowercased, in order.
    #[must_use]
    pub fn flatten_lowercase(&self) -> Vec<String> {
        self.0
            .iter()
            .flat_map(|(_, terms)| terms.iter().map(|t| t.to_lowercase()))
            .collect()
    }
}

impl FromIterator<(String, Vec<String>)> for Keywords {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        let mut keywords = Self::new();
        for (lang, terms) in iter {
            keywords.set(&lang, terms);
        }
        keywords
    }
}

impl Serialize for Keywords {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (lang, terms) in &self.0 {
            map.serialize_entry(lang, terms)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Keywords {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeywordsVisitor;

        impl<'de> Visitor<'de> for KeywordsVisitor {
            type Value = Keywords;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a language-to-terms mapping or a list of terms")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Keywords, A::Error> {
                let mut keywords = Keywords::new();
                while let Some(lang) = access.next_key::<String>()? {
                    let terms = access.next_value::<LenientList>()?;
                    keywords.set(&lang.to_lowercase(), terms.0);
                }
                Ok(keywords)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Keywords, A::Error> {
                let mut terms = Vec::new();
                while let Some(item) = access.next_element::<LenientItem>()? {
                    if let LenientItem::Text(term) = item {
                        terms.push(term);
                    }
                }
                Ok(Keywords::single(DEFAULT_LANGUAGE, terms))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Keywords, E> {
                Ok(Keywords::new())
            }

            fn visit_none<E: de::Error>(self) -> Result<Keywords, E> {
                Ok(Keywords::new())
            }
        }

        deserializer.deserialize_any(KeywordsVisitor)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientItem {
    Text(String),
    #[allow(dead_code)]
    Other(de::IgnoredAny),
}

/// A list of strings that tolerates wrong shapes: non-lists become empty and
/// non-string items are skipped.
#[derive(Debug, Default)]
pub(crate) struct LenientList(pub Vec<String>);

impl<'de> Deserialize<'de> for LenientList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            List(Vec<LenientItem>),
            #[allow(dead_code)]
            Other(de::IgnoredAny),
        }

        Ok(match Shape::deserialize(deserializer)? {
            Shape::List(items) => Self(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        LenientItem::Text(s) => Some(s),
                        LenientItem::Other(_) => None,
                    })
                    .collect(),
            ),
            Shape::Other(_) => Self::default(),
        })
    }
}

/// `deserialize_with` adapter for [`LenientList`].
pub fn lenient_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<String>, D::Error> {
    LenientList::deserialize(deserializer).map(|l| l.0)
}

/// Canonical in-memory description of one skill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillRecord {
    pub name: String,
    pub path: PathBuf,
    pub source: SourceTier,
    pub priority: Priority,
    pub enforcement: Enforcement,
    pub description: String,
    pub keywords: Keywords,
    pub tags: Vec<String>,
    pub use_cases: Vec<String>,
    pub intent_patterns: Vec<String>,
    pub auto_activate: bool,
    /// `0.0` means unset: the matcher falls back to the global threshold.
    pub confidence_threshold: f64,
}

impl SkillRecord {
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, source: SourceTier) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            source,
            priority: Priority::default(),
            enforcement: Enforcement::default(),
            description: String::new(),
            keywords: Keywords::new(),
            tags: Vec::new(),
            use_cases: Vec::new(),
            intent_patterns: Vec::new(),
            auto_activate: true,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    #[must_use]
    pub fn with_keywords(mut self, language: &str, terms: &[&str]) -> Self {
        self.keywords
            .set(language, terms.iter().map(|t| (*t).to_owned()).collect());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
