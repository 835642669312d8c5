//! Application layer: configuration and the skill activation facade.

pub mod activator;
pub mod config;

pub use activator::{Activator, SkillSummary};
pub use config::{Config, SkillsConfig};
