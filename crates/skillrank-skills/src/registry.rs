use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::artifact::{INDEX_FILE, IndexArtifact};
use crate::loader::{SKILL_FILE, load_skill_document};
use crate::merge::{merge_artifact, merge_document};
use crate::paths::RegistryPath;
use crate::record::{SkillRecord, SourceTier};

/// Canonical set of skills merged from every discovered tier.
///
/// Built once and read-only afterwards.
#[derive(Debug, Default)]
pub struct SkillRegistry {
    paths: Vec<RegistryPath>,
    skills: BTreeMap<String, SkillRecord>,
}

impl SkillRegistry {
    /// Load every tier in `paths` (given highest priority first).
    ///
    /// Tiers are applied lowest priority first so that higher tiers merge last.
    /// Within a directory, documents load before the artifact. Unreadable
    /// documents and artifacts are logged with `tracing::warn` and skipped.
    #[must_use]
    pub fn load(paths: Vec<RegistryPath>) -> Self {
        let mut skills = BTreeMap::new();

        for path in paths.iter().rev() {
            load_documents(&mut skills, &path.dir, path.tier);
            load_artifact(&mut skills, &path.dir, path.tier);
        }

        tracing::debug!(skills = skills.len(), paths = paths.len(), "skill registry loaded");
        Self { paths, skills }
    }

    /// Registry over in-memory records with no backing directories.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = SkillRecord>) -> Self {
        Self {
            paths: Vec::new(),
            skills: records.into_iter().map(|r| (r.name.clone(), r)).collect(),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SkillRecord> {
        self.skills.get(name)
    }

    /// Records ordered by name.
    pub fn all(&self) -> impl Iterator<Item = &SkillRecord> {
        self.skills.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Directories searched, highest priority first.
    #[must_use]
    pub fn paths(&self) -> &[RegistryPath] {
        &self.paths
    }
}

/// Immediate subdirectories of `dir` that contain a skill document, sorted.
#[must_use]
pub fn skill_dirs(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        tracing::warn!("cannot read skill directory: {}", dir.display());
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir() && p.join(SKILL_FILE).is_file())
        .collect();
    dirs.sort();
    dirs
}

fn load_documents(skills: &mut BTreeMap<String, SkillRecord>, dir: &Path, tier: SourceTier) {
    for skill_dir in skill_dirs(dir) {
        let record = match load_skill_document(&skill_dir, tier) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("skipping {}: {e:#}", skill_dir.display());
                continue;
            }
        };
        let merged = match skills.get(&record.name) {
            Some(existing) => merge_document(existing, &record),
            None => record,
        };
        skills.insert(merged.name.clone(), merged);
    }
}

fn load_artifact(skills: &mut BTreeMap<String, SkillRecord>, dir: &Path, tier: SourceTier) {
    let index_path = dir.join(INDEX_FILE);
    if !index_path.is_file() {
        return;
    }
    let artifact = match IndexArtifact::load(&index_path) {
        Ok(artifact) => artifact,
        Err(e) => {
            tracing::warn!("skipping {}: {e:#}", index_path.display());
            return;
        }
    };

    for (name, entry) in artifact.entries() {
        let incoming = entry.into_record(&name, dir, tier);
        let merged = match skills.get(&name) {
            Some(existing) => merge_artifact(existing, &incoming),
            None => incoming,
        };
        skills.insert(name, merged);
    }
}
