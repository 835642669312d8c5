use std::path::PathBuf;
use std::str::FromStr;

use super::Config;

/// Parsed value of `key`, or `None` when unset. Unparsable values are ignored.
fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("ignoring invalid {key} value: {raw}");
            None
        }
    }
}

fn comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_ai();
        self.apply_env_overrides_skills();
    }

    fn apply_env_overrides_ai(&mut self) {
        let ai = &mut self.ai;
        if let Some(kind) = parse_var("AI_PROVIDER") {
            ai.provider = kind;
        }
        if let Ok(v) = std::env::var("AI_API_KEY") {
            ai.api_key = v;
        }
        if let Ok(v) = std::env::var("AI_MODEL")
            && !v.trim().is_empty()
        {
            ai.model = Some(v.trim().to_owned());
        }
        if let Ok(v) = std::env::var("AI_BASE_URL")
            && !v.trim().is_empty()
        {
            ai.base_url = Some(v.trim().to_owned());
        }
        if let Some(n) = parse_var("AI_MAX_TOKENS") {
            ai.max_tokens = n;
        }
        if let Some(t) = parse_var("AI_TEMPERATURE") {
            ai.temperature = t;
        }
        if let Some(secs) = parse_var("AI_TIMEOUT") {
            ai.timeout_secs = secs;
        }
        if let Ok(v) = std::env::var("AI_FALLBACK_MODELS") {
            ai.fallback_models = comma_list(&v);
        }
        if let Some(rpm) = parse_var("AI_RATE_LIMIT_RPM") {
            ai.rate_limit_rpm = rpm;
        }
        if let Some(delay) = parse_var("AI_RATE_LIMIT_DELAY") {
            ai.rate_limit_delay_secs = delay;
        }
        if let Some(n) = parse_var("AI_MAX_RETRIES") {
            ai.max_retries = n;
        }
        if let Some(delay) = parse_var("AI_RETRY_DELAY") {
            ai.retry_delay_secs = delay;
        }
        if let Ok(v) = std::env::var("AI_LANGUAGES") {
            let languages: Vec<String> = comma_list(&v).iter().map(|l| l.to_lowercase()).collect();
            if !languages.is_empty() {
                ai.languages = languages;
            }
        }
    }

    fn apply_env_overrides_skills(&mut self) {
        if let Some(paths) = std::env::var_os("SKILLRANK_SKILLS_PATH") {
            self.skills.custom_paths = std::env::split_paths(&paths)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }
    }

    /// Fill unset skill directories from the home directory, the platform, and
    /// the working directory.
    pub(crate) fn resolve_default_dirs(&mut self) {
        let skills = &mut self.skills;
        if skills.project_root.is_none() {
            skills.project_root = std::env::current_dir().ok();
        }
        if skills.user_dir.is_none() {
            skills.user_dir = dirs::home_dir().map(|home| home.join(".claude").join("skills"));
        }
        if skills.system_dir.is_none() {
            skills.system_dir = default_system_dir();
        }
    }
}

#[cfg(target_os = "windows")]
fn default_system_dir() -> Option<PathBuf> {
    let base = std::env::var_os("PROGRAMDATA").map_or_else(|| PathBuf::from(r"C:\ProgramData"), PathBuf::from);
    Some(base.join("claude").join("skills"))
}

#[cfg(target_os = "macos")]
fn default_system_dir() -> Option<PathBuf> {
    Some(PathBuf::from("/Library/Application Support/claude/skills"))
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn default_system_dir() -> Option<PathBuf> {
    Some(PathBuf::from("/usr/share/claude/skills"))
}
