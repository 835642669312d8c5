use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::record::SourceTier;

/// A directory that may hold skills, tagged with its tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryPath {
    pub dir: PathBuf,
    pub tier: SourceTier,
}

impl RegistryPath {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, tier: SourceTier) -> Self {
        Self {
            dir: dir.into(),
            tier,
        }
    }
}

/// Resolved search locations. `None` skips the tier.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    pub project_root: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
    pub system_dir: Option<PathBuf>,
    pub custom_paths: Vec<PathBuf>,
}

/// `<root>/.claude/skills` then `<root>/skills`.
#[must_use]
pub fn project_dirs(root: &Path) -> [PathBuf; 2] {
    [root.join(".claude").join("skills"), root.join("skills")]
}

impl DiscoveryOptions {
    /// Existing directories in priority order: project, user, system, custom.
    ///
    /// A directory reachable through several tiers is kept only at its
    /// highest-priority position.
    #[must_use]
    pub fn discover(&self) -> Vec<RegistryPath> {
        let mut candidates = Vec::new();
        if let Some(root) = &self.project_root {
            candidates.extend(
                project_dirs(root)
                    .into_iter()
                    .map(|d| RegistryPath::new(d, SourceTier::Project)),
            );
        }
        if let Some(dir) = &self.user_dir {
            candidates.push(RegistryPath::new(dir, SourceTier::User));
        }
        if let Some(dir) = &self.system_dir {
            candidates.push(RegistryPath::new(dir, SourceTier::System));
        }
        candidates.extend(
            self.custom_paths
                .iter()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| RegistryPath::new(p, SourceTier::Custom)),
        );

        let mut found: Vec<RegistryPath> = Vec::new();
        for candidate in candidates {
            if !candidate.dir.is_dir() {
                tracing::debug!(dir = %candidate.dir.display(), tier = %candidate.tier, "skill path absent");
                continue;
            }
            if found.iter().any(|p| p.dir == candidate.dir) {
                continue;
            }
            found.push(candidate);
        }
        found
    }
}
