use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use skillrank_llm::AiConfig;
use skillrank_skills::{ActivationConfig, KeywordWeights};

/// Top-level configuration, read from TOML and then overridden from the environment.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub ai: AiConfig,
    pub skills: SkillsConfig,
    pub activation: ActivationConfig,
    pub keyword_weights: KeywordWeights,
}

/// Where skills are searched for.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SkillsConfig {
    /// Root of the project tier; the working directory when unset.
    pub project_root: Option<PathBuf>,
    pub include_user: bool,
    pub include_system: bool,
    /// Defaults to `~/.claude/skills`.
    pub user_dir: Option<PathBuf>,
    /// Defaults to the platform's shared skills directory.
    pub system_dir: Option<PathBuf>,
    pub custom_paths: Vec<PathBuf>,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            project_root: None,
            include_user: true,
            include_system: true,
            user_dir: None,
            system_dir: None,
            custom_paths: Vec::new(),
        }
    }
}
