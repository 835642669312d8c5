//! One-stop facade: discover skills from configuration, list them, and match queries.

use std::path::PathBuf;

use serde::Serialize;
use skillrank_skills::{
    MatchConfig, Priority, RegistryPath, SkillMatch, SkillMatcher, SkillRegistry, SourceTier,
};

use crate::config::Config;

/// Listing row for one registered skill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillSummary {
    pub name: String,
    pub source: SourceTier,
    pub path: PathBuf,
    pub priority: Priority,
    pub description: String,
    pub auto_activate: bool,
    pub keyword_count: usize,
}

#[derive(Debug)]
pub struct Activator {
    registry: SkillRegistry,
    match_config: MatchConfig,
}

impl Activator {
    #[must_use]
    pub fn new(registry: SkillRegistry, match_config: MatchConfig) -> Self {
        Self {
            registry,
            match_config,
        }
    }

    /// Discover and load every configured tier.
    #[must_use]
    pub fn from_config(config: &Config, override_threshold: Option<f64>) -> Self {
        let paths = config.discovery_options().discover();
        tracing::debug!(paths = paths.len(), "loading skill registry");
        let registry = SkillRegistry::load(paths);
        tracing::debug!(skills = registry.len(), "skill registry loaded");
        Self::new(registry, config.match_config(override_threshold))
    }

    #[must_use]
    pub fn registry(&self) -> &SkillRegistry {
        &self.registry
    }

    /// Search paths in priority order.
    #[must_use]
    pub fn paths(&self) -> &[RegistryPath] {
        self.registry.paths()
    }

    /// Matcher over the current registry. Build it once when matching many queries.
    #[must_use]
    pub fn matcher(&self) -> SkillMatcher<'_> {
        SkillMatcher::new(&self.registry, self.match_config.clone())
    }

    #[must_use]
    pub fn detect(&self, query: &str) -> Vec<SkillMatch<'_>> {
        self.matcher().detect(query)
    }

    /// Every skill, sorted by name.
    #[must_use]
    pub fn list(&self) -> Vec<SkillSummary> {
        self.registry
            .all()
            .map(|record| SkillSummary {
                name: record.name.clone(),
                source: record.source,
                path: record.path.clone(),
                priority: record.priority,
                description: record.description.clone(),
                auto_activate: record.auto_activate,
                keyword_count: record.keywords.total(),
            })
            .collect()
    }
}
