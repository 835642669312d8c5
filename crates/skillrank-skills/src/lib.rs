//! Skill discovery across priority tiers, record merging, and query matching.

pub mod artifact;
pub mod config;
pub mod error;
pub mod keywords;
pub mod loader;
pub mod matcher;
pub mod merge;
pub mod paths;
pub mod record;
pub mod registry;

pub use artifact::{INDEX_FILE, IndexArtifact, SkillEntry};
pub use config::{ActivationConfig, ActivationMode, KeywordWeights, MatchConfig, PriorityMultipliers};
pub use error::SkillError;
pub use matcher::{SkillMatch, SkillMatcher};
pub use paths::{DiscoveryOptions, RegistryPath};
pub use record::{Enforcement, Keywords, Priority, SkillRecord, SourceTier};
pub use registry::SkillRegistry;
