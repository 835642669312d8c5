//! Error types for skillrank-index.

use std::path::PathBuf;

use skillrank_skills::SkillError;

/// Errors that abort a whole index run. Per-skill problems never surface here.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Artifact could not be written.
    #[error("artifact error: {0}")]
    Artifact(#[from] SkillError),

    /// A subset run found an existing artifact it cannot read, so it will not overwrite it.
    #[error("existing index {} is unreadable, refusing to overwrite: {source}", path.display())]
    ExistingArtifact {
        path: PathBuf,
        #[source]
        source: SkillError,
    },

    #[error("no skills found in {0}")]
    NoSkills(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;
