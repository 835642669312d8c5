//! `skillrank`: discover skills, rank them against a message, and generate
//! skill indexes with an AI model.
//!
//! Results go to stdout; logs go to stderr (`RUST_LOG`, default `info`).

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use skillrank_core::config::DEFAULT_CONFIG_FILE;
use skillrank_core::{Activator, Config};
use skillrank_index::{IndexBuilder, ProgressSink, SilentSink, StdoutSink};
use skillrank_llm::AiClient;

const CONFIG_ENV: &str = "SKILLRANK_CONFIG";
const DESCRIPTION_WIDTH: usize = 50;
const RESPONSE_PREVIEW: usize = 100;

#[derive(Parser, Debug)]
#[command(name = "skillrank", version)]
#[command(about = "Rank skills against a message and generate skill indexes")]
struct Cli {
    /// Config file (default: $SKILLRANK_CONFIG or ./skillrank.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Suggest skills for a message
    Match {
        /// Message to analyze
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
        /// Threshold that overrides per-skill and global thresholds
        #[arg(short, long)]
        threshold: Option<f64>,
        #[arg(short, long)]
        json: bool,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// List every discovered skill
    List {
        #[arg(short, long)]
        json: bool,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Show the directories searched for skills
    Paths {
        #[arg(short, long)]
        json: bool,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Generate INDEX.yaml for a skills directory
    Index {
        skills_dir: PathBuf,
        /// Output file (default: <skills_dir>/INDEX.yaml)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Only regenerate these skills, keeping the rest of the existing index
        #[arg(long, value_delimiter = ',')]
        skills: Vec<String>,
        #[command(flatten)]
        ai: AiArgs,
        /// Keyword languages, comma-separated
        #[arg(long, value_delimiter = ',')]
        languages: Vec<String>,
        /// Suppress progress lines
        #[arg(short, long)]
        quiet: bool,
    },
    /// Check that the configured AI provider answers
    TestAi {
        #[command(flatten)]
        ai: AiArgs,
    },
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Project directory (default: current directory)
    #[arg(long)]
    project: Option<PathBuf>,
    #[arg(long)]
    skip_user: bool,
    #[arg(long)]
    skip_system: bool,
}

impl SearchArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(project) = &self.project {
            config.skills.project_root = Some(project.clone());
        }
        if self.skip_user {
            config.skills.include_user = false;
        }
        if self.skip_system {
            config.skills.include_system = false;
        }
    }
}

#[derive(Args, Debug)]
struct AiArgs {
    /// Override the AI model
    #[arg(short, long)]
    model: Option<String>,
    /// Override the provider base URL
    #[arg(long)]
    base_url: Option<String>,
}

impl AiArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.ai.model = Some(model.clone());
        }
        if let Some(url) = &self.base_url {
            config.ai.base_url = Some(url.clone());
        }
    }
}

#[derive(Serialize)]
struct MatchRow<'a> {
    skill: &'a str,
    source: &'a str,
    confidence: f64,
    description: &'a str,
    path: &'a Path,
}

fn main() -> anyhow::Result<()> {
    init_subscriber();
    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());
    let mut config = Config::load(&config_path)?;

    match cli.command {
        Command::Match {
            message,
            threshold,
            json,
            search,
        } => {
            search.apply(&mut config);
            run_match(&config, &message.join(" "), threshold, json)
        }
        Command::List { json, search } => {
            search.apply(&mut config);
            run_list(&config, json)
        }
        Command::Paths { json, search } => {
            search.apply(&mut config);
            run_paths(&config, json)
        }
        Command::Index {
            skills_dir,
            output,
            skills,
            ai,
            languages,
            quiet,
        } => {
            ai.apply(&mut config);
            let languages: Vec<String> = languages
                .iter()
                .map(|l| l.trim().to_lowercase())
                .filter(|l| !l.is_empty())
                .collect();
            if !languages.is_empty() {
                config.ai.languages = languages;
            }
            run_index(&config, &skills_dir, output.as_deref(), &skills, quiet)
        }
        Command::TestAi { ai } => {
            ai.apply(&mut config);
            run_test_ai(&config)
        }
    }
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn resolve_config_path(flag: Option<&Path>) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

fn run_match(config: &Config, message: &str, threshold: Option<f64>, json: bool) -> anyhow::Result<()> {
    let activator = Activator::from_config(config, threshold);
    let matcher = activator.matcher();
    if matcher.skipped_patterns() > 0 {
        tracing::warn!(
            skipped = matcher.skipped_patterns(),
            "some intent patterns are invalid and were ignored"
        );
    }
    let matches = matcher.detect(message);

    if json {
        let rows: Vec<MatchRow<'_>> = matches
            .iter()
            .map(|m| MatchRow {
                skill: &m.skill.name,
                source: m.skill.source.as_str(),
                confidence: (m.score * 1000.0).round() / 1000.0,
                description: &m.skill.description,
                path: &m.skill.path,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if matches.is_empty() {
        println!("No matching skills found.");
        return Ok(());
    }
    println!("Suggested skills for: {message}");
    for m in &matches {
        println!(
            "  {:25} {:>4.0}%  [{}] {}",
            m.skill.name,
            m.display_confidence() * 100.0,
            m.skill.source,
            truncate(&m.skill.description, DESCRIPTION_WIDTH)
        );
        println!("  {:25} {}", "", m.skill.path.display());
    }
    Ok(())
}

fn run_list(config: &Config, json: bool) -> anyhow::Result<()> {
    let activator = Activator::from_config(config, None);
    let skills = activator.list();
    if json {
        println!("{}", serde_json::to_string_pretty(&skills)?);
        return Ok(());
    }
    println!("Discovered skills ({} total):", skills.len());
    for s in &skills {
        let state = if s.auto_activate { "auto" } else { "off " };
        println!(
            "  {state} {:25} [{:7}] {:6} - {}",
            s.name,
            s.source.as_str(),
            s.priority.as_str(),
            truncate(&s.description, DESCRIPTION_WIDTH)
        );
    }
    Ok(())
}

fn run_paths(config: &Config, json: bool) -> anyhow::Result<()> {
    let paths = config.discovery_options().discover();
    if json {
        println!("{}", serde_json::to_string_pretty(&paths)?);
        return Ok(());
    }
    println!("Skill search paths:");
    for p in &paths {
        println!("  [{:7}] {}", p.tier.as_str(), p.dir.display());
    }
    Ok(())
}

fn run_index(
    config: &Config,
    skills_dir: &Path,
    output: Option<&Path>,
    only: &[String],
    quiet: bool,
) -> anyhow::Result<()> {
    let client = AiClient::new(&config.ai).context("failed to create AI client")?;
    let builder = IndexBuilder::new(&client, &config.ai);
    let mut sink: Box<dyn ProgressSink> = if quiet {
        Box::new(SilentSink)
    } else {
        Box::new(StdoutSink)
    };
    let only = (!only.is_empty()).then_some(only);
    let report = builder
        .generate(skills_dir, output, only, sink.as_mut())
        .with_context(|| format!("index generation failed for {}", skills_dir.display()))?;
    tracing::info!(
        output = %report.output.display(),
        entries = report.total_entries,
        extracted = report.extracted.len(),
        fallbacks = report.fallbacks.len(),
        "done"
    );
    Ok(())
}

fn run_test_ai(config: &Config) -> anyhow::Result<()> {
    let ai = &config.ai;
    println!("Testing connection to {} / {}", ai.provider, ai.model());
    println!("Base URL: {}", ai.base_url());
    println!("API key: {}", mask_key(&ai.api_key));

    let client = AiClient::new(ai).context("failed to create AI client")?;
    let reply = client.test_connection().context("AI connection test failed")?;
    println!("Success. Response: {}", truncate(reply.trim(), RESPONSE_PREVIEW));
    Ok(())
}

fn truncate(text: &str, max: usize) -> &str {
    text.char_indices().nth(max).map_or(text, |(i, _)| &text[..i])
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    match chars.len() {
        0 => "[not set]".to_owned(),
        n if n <= 8 => "*".repeat(n),
        n => format!(
            "{}...{}",
            chars[..4].iter().collect::<String>(),
            chars[n - 4..].iter().collect::<String>()
        ),
    }
}
