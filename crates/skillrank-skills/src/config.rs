use serde::{Deserialize, Serialize};

use crate::record::Priority;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationMode {
    #[default]
    Suggest,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PriorityMultipliers {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for PriorityMultipliers {
    fn default() -> Self {
        Self {
            high: 1.5,
            medium: 1.0,
            low: 0.7,
        }
    }
}

impl PriorityMultipliers {
    #[must_use]
    pub fn for_priority(&self, priority: Priority) -> f64 {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct KeywordWeights {
    pub exact_match: f64,
    pub compound_match: f64,
    pub partial_match: f64,
    pub tag_match: f64,
    pub use_case_match: f64,
}

impl Default for KeywordWeights {
    fn default() -> Self {
        Self {
            exact_match: 3.0,
            compound_match: 2.5,
            partial_match: 1.5,
            tag_match: 2.0,
            use_case_match: 2.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ActivationConfig {
    pub mode: ActivationMode,
    pub confidence_threshold: f64,
    pub max_suggestions: usize,
    pub priority_multipliers: PriorityMultipliers,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            mode: ActivationMode::default(),
            confidence_threshold: 0.5,
            max_suggestions: 3,
            priority_multipliers: PriorityMultipliers::default(),
        }
    }
}

/// Everything the matcher needs besides the registry itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchConfig {
    pub activation: ActivationConfig,
    pub weights: KeywordWeights,
    /// Caller-forced threshold; beats per-skill and global thresholds.
    pub override_threshold: Option<f64>,
}
