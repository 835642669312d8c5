mod env;
mod types;


pub use types::*;

use std::path::Path;

use anyhow::Context;
use skillrank_skills::{DiscoveryOptions, MatchConfig};

/// Config file read when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "skillrank.toml";

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist. Unset skill
    /// directories are resolved to their platform defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str::<Self>(&content)
                .with_context(|| format!("failed to parse config file {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.resolve_default_dirs();
        Ok(config)
    }

    /// Search locations with disabled tiers removed.
    #[must_use]
    pub fn discovery_options(&self) -> DiscoveryOptions {
        let skills = &self.skills;
        DiscoveryOptions {
            project_root: skills.project_root.clone(),
            user_dir: skills.user_dir.clone().filter(|_| skills.include_user),
            system_dir: skills.system_dir.clone().filter(|_| skills.include_system),
            custom_paths: skills.custom_paths.clone(),
        }
    }

    /// Matcher settings, with an optional caller-forced threshold.
    #[must_use]
    pub fn match_config(&self, override_threshold: Option<f64>) -> MatchConfig {
        MatchConfig {
            activation: self.activation.clone(),
            weights: self.keyword_weights,
            override_threshold,
        }
    }
}
