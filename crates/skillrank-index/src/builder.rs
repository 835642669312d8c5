//! Index generation: read each skill, ask the model, write `INDEX.yaml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use skillrank_llm::{AiClient, AiConfig};
use skillrank_skills::loader::SKILL_FILE;
use skillrank_skills::registry::skill_dirs;
use skillrank_skills::{INDEX_FILE, IndexArtifact};

use crate::error::{IndexError, Result};
use crate::extract::{ExtractedMetadata, fallback_entry};
use crate::progress::{ProgressEvent, ProgressSink, Status};
use crate::prompt::{extraction_prompt, system_prompt};

/// Pause between consecutive skills.
pub const SKILL_DELAY: Duration = Duration::from_millis(500);

/// Longest error excerpt shown in an activity line.
const ERROR_EXCERPT: usize = 50;

/// Summary of an index run.
#[derive(Debug, Default)]
pub struct IndexReport {
    pub output: PathBuf,
    /// Skills targeted by this run.
    pub targeted: usize,
    pub extracted: Vec<String>,
    pub fallbacks: Vec<String>,
    /// Skills skipped because their document could not be read.
    pub errors: Vec<String>,
    /// Requested names with no matching skill directory.
    pub missing: Vec<String>,
    /// Entries in the written artifact.
    pub total_entries: usize,
}

/// Generates or refreshes an index artifact with one [`AiClient`].
///
/// Skills are processed one at a time; a failure for one skill never stops the batch.
#[derive(Debug)]
pub struct IndexBuilder<'a> {
    client: &'a AiClient,
    provider: String,
    model: String,
    languages: Vec<String>,
    system_prompt: String,
    skill_delay: Duration,
}

impl<'a> IndexBuilder<'a> {
    #[must_use]
    pub fn new(client: &'a AiClient, config: &AiConfig) -> Self {
        let languages = config.languages();
        Self {
            client,
            provider: config.provider.as_str().to_owned(),
            model: config.model().to_owned(),
            system_prompt: system_prompt(&languages),
            languages,
            skill_delay: SKILL_DELAY,
        }
    }

    #[must_use]
    pub fn with_skill_delay(mut self, delay: Duration) -> Self {
        self.skill_delay = delay;
        self
    }

    /// Build the index for `skills_dir`.
    ///
    /// With `only`, just the named skills are regenerated and every other entry
    /// of an existing artifact at `output` is kept as is. Without it the
    /// artifact is rebuilt from scratch. `output` defaults to
    /// `<skills_dir>/INDEX.yaml`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NoSkills`] when nothing is left to process,
    /// [`IndexError::ExistingArtifact`] when a subset run cannot read the artifact
    /// it would update, or an error if the artifact cannot be written.
    pub fn generate(
        &self,
        skills_dir: &Path,
        output: Option<&Path>,
        only: Option<&[String]>,
        sink: &mut dyn ProgressSink,
    ) -> Result<IndexReport> {
        let output = output.map_or_else(|| skills_dir.join(INDEX_FILE), Path::to_path_buf);
        let mut report = IndexReport {
            output: output.clone(),
            ..IndexReport::default()
        };

        let available: BTreeMap<String, PathBuf> = skill_dirs(skills_dir)
            .into_iter()
            .filter_map(|dir| {
                let name = dir.file_name()?.to_string_lossy().into_owned();
                Some((name, dir))
            })
            .collect();

        let only = only.filter(|names| !names.is_empty());
        let targets: Vec<(&String, &PathBuf)> = match only {
            Some(names) => {
                for name in names {
                    if !available.contains_key(name) && !report.missing.contains(name) {
                        sink.emit(ProgressEvent::status(Status::Warning, name, "Skill not found"));
                        report.missing.push(name.clone());
                    }
                }
                available
                    .iter()
                    .filter(|(name, _)| names.contains(*name))
                    .collect()
            }
            None => available.iter().collect(),
        };

        if targets.is_empty() {
            return Err(IndexError::NoSkills(skills_dir.display().to_string()));
        }
        report.targeted = targets.len();

        tracing::info!(
            skills = targets.len(),
            dir = %skills_dir.display(),
            provider = %self.provider,
            model = %self.model,
            languages = %self.languages.join(", "),
            output = %output.display(),
            "generating skill index"
        );

        let mut artifact = match only {
            Some(_) if output.is_file() => match IndexArtifact::load(&output) {
                Ok(existing) => {
                    sink.emit(ProgressEvent::activity(format!(
                        "Merging with existing index ({} skills)",
                        existing.len()
                    )));
                    existing
                }
                Err(source) => {
                    return Err(IndexError::ExistingArtifact {
                        path: output,
                        source,
                    });
                }
            },
            _ => IndexArtifact::new(&self.provider, &self.model),
        };

        let total = targets.len();
        for (i, (name, dir)) in targets.into_iter().enumerate() {
            let done = i + 1;
            sink.emit(ProgressEvent::Progress {
                done,
                total,
                skill: name.clone(),
            });

            let content = match std::fs::read_to_string(dir.join(SKILL_FILE)) {
                Ok(content) => content,
                Err(e) => {
                    sink.emit(ProgressEvent::status(
                        Status::Error,
                        name,
                        format!("Read error - {e}"),
                    ));
                    report.errors.push(name.clone());
                    continue;
                }
            };

            sink.emit(ProgressEvent::activity("Sending to AI..."));
            match self.extract(name, &content, sink) {
                Some(metadata) => {
                    let entry = metadata.into_entry(&self.languages);
                    let count = entry.keywords.total();
                    artifact.insert(name, &entry)?;
                    sink.emit(ProgressEvent::status(
                        Status::Ok,
                        name,
                        format!("{count} keywords"),
                    ));
                    report.extracted.push(name.clone());
                }
                None => {
                    artifact.insert(name, &fallback_entry(name, &self.languages))?;
                    sink.emit(ProgressEvent::status(
                        Status::Fallback,
                        name,
                        "using fallback metadata",
                    ));
                    report.fallbacks.push(name.clone());
                }
            }

            if done < total {
                self.client.clock().sleep(self.skill_delay);
            }
        }

        artifact.save(&output)?;
        report.total_entries = artifact.len();
        sink.emit(ProgressEvent::Complete {
            count: artifact.len(),
            output,
        });

        tracing::info!(
            extracted = report.extracted.len(),
            fallbacks = report.fallbacks.len(),
            errors = report.errors.len(),
            "index written"
        );
        Ok(report)
    }

    /// Ask the model for metadata. `None` means the caller should fall back.
    fn extract(
        &self,
        name: &str,
        content: &str,
        sink: &mut dyn ProgressSink,
    ) -> Option<ExtractedMetadata> {
        sink.emit(ProgressEvent::activity("Waiting for AI response..."));
        let reply = match self
            .client
            .generate(&extraction_prompt(name, content), Some(&self.system_prompt))
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(skill = name, "extraction failed: {e}");
                let message = e.to_string();
                let excerpt: String = message.chars().take(ERROR_EXCERPT).collect();
                sink.emit(ProgressEvent::activity(format!("Error - {excerpt}")));
                return None;
            }
        };

        sink.emit(ProgressEvent::activity("Processing response..."));
        let metadata = ExtractedMetadata::parse(&reply);
        if metadata.is_none() {
            tracing::warn!(skill = name, "extraction reply was not usable JSON");
            sink.emit(ProgressEvent::activity("Parse error - using fallback"));
        }
        metadata
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use skillrank_llm::mock::{MockClock, MockProvider, MockReply};
    use skillrank_llm::{AnyProvider, Clock};
    use skillrank_skills::Priority;

    use super::*;
    use crate::progress::RecordingSink;

    const DEBUG_REPLY: &str = r#"{"keywords": {"english": ["debug", "bug"]}, "priority": "high", "description": "Find bugs"}"#;

    fn config() -> AiConfig {
        AiConfig {
            model: Some("m".into()),
            max_retries: 1,
            rate_limit_rpm: 0,
            rate_limit_delay_secs: 0.0,
            retry_delay_secs: 0.0,
            ..AiConfig::default()
        }
    }

    fn client(mock: &MockProvider, clock: &Arc<MockClock>) -> AiClient {
        let clock: Arc<dyn Clock> = clock.clone();
        AiClient::with_provider(AnyProvider::Mock(mock.clone()), &config(), clock)
    }

    fn skill(root: &Path, name: &str) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(SKILL_FILE), format!("# {name}\nDoes {name} things.")).unwrap();
    }

    #[test]
    fn full_run_mixes_ok_and_fallback() {
        let tmp = tempfile::tempdir().unwrap();
        skill(tmp.path(), "alpha");
        skill(tmp.path(), "beta-tool");
        let mock = MockProvider::with_replies(vec![
            MockReply::Text(format!("```json\n{DEBUG_REPLY}\n```")),
            MockReply::Text("definitely not json".into()),
        ]);
        let clock = Arc::new(MockClock::new());
        let client = client(&mock, &clock);
        let builder = IndexBuilder::new(&client, &config());
        let mut sink = RecordingSink::default();

        let report = builder.generate(tmp.path(), None, None, &mut sink).unwrap();

        let output = tmp.path().join(INDEX_FILE);
        assert_eq!(report.extracted, ["alpha"]);
        assert_eq!(report.fallbacks, ["beta-tool"]);
        assert_eq!(
            sink.lines(),
            vec![
                "PROGRESS:1:2:alpha".to_owned(),
                "ACTIVITY:Sending to AI...".into(),
                "ACTIVITY:Waiting for AI response...".into(),
                "ACTIVITY:Processing response...".into(),
                "STATUS:OK:alpha:2 keywords".into(),
                "PROGRESS:2:2:beta-tool".into(),
                "ACTIVITY:Sending to AI...".into(),
                "ACTIVITY:Waiting for AI response...".into(),
                "ACTIVITY:Processing response...".into(),
                "ACTIVITY:Parse error - using fallback".into(),
                "STATUS:FALLBACK:beta-tool:using fallback metadata".into(),
                format!("COMPLETE:2:{}", output.display()),
            ]
        );
        assert_eq!(clock.sleeps(), vec![SKILL_DELAY]);

        let artifact = IndexArtifact::load(&output).unwrap();
        assert_eq!(artifact.ai_model, "m");
        let entries: BTreeMap<_, _> = artifact.entries().into_iter().collect();
        assert_eq!(entries["alpha"].priority, Priority::High);
        assert_eq!(entries["beta-tool"].keywords.get("english"), ["beta tool"]);
        assert_eq!(entries["beta-tool"].description, "Skill: beta-tool");

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].prompt.contains("Skill Name: alpha"));
        assert!(calls[0].system.as_deref().unwrap().contains("english"));
    }

    #[test]
    fn subset_regeneration_preserves_other_entries() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["a", "b", "c"] {
            skill(tmp.path(), name);
        }
        let clock = Arc::new(MockClock::new());
        let first = MockProvider::default().with_default(MockReply::Text(DEBUG_REPLY.into()));
        let client_one = client(&first, &clock);
        IndexBuilder::new(&client_one, &config())
            .generate(tmp.path(), None, None, &mut RecordingSink::default())
            .unwrap();
        let output = tmp.path().join(INDEX_FILE);
        let before = IndexArtifact::load(&output).unwrap();

        let second = MockProvider::default().with_default(MockReply::Text(
            r#"{"keywords": {"english": ["fresh"]}, "description": "Regenerated"}"#.into(),
        ));
        let client_two = client(&second, &clock);
        let mut sink = RecordingSink::default();
        let only = vec!["b".to_owned(), "zzz".to_owned()];
        let report = IndexBuilder::new(&client_two, &config())
            .generate(tmp.path(), None, Some(&only), &mut sink)
            .unwrap();

        assert_eq!(report.missing, ["zzz"]);
        assert_eq!(report.targeted, 1);
        let lines = sink.lines();
        assert_eq!(lines[0], "STATUS:WARNING:zzz:Skill not found");
        assert_eq!(lines[1], "ACTIVITY:Merging with existing index (3 skills)");
        assert_eq!(second.calls().len(), 1);

        let after = IndexArtifact::load(&output).unwrap();
        assert_eq!(after.len(), 3);
        assert_eq!(after.raw_entry("a"), before.raw_entry("a"));
        assert_eq!(after.raw_entry("c"), before.raw_entry("c"));
        assert_ne!(after.raw_entry("b"), before.raw_entry("b"));
    }

    #[test]
    fn subset_run_keeps_entries_under_unexpected_header() {
        let tmp = tempfile::tempdir().unwrap();
        skill(tmp.path(), "a");
        skill(tmp.path(), "b");
        let output = tmp.path().join(INDEX_FILE);
        std::fs::write(
            &output,
            "activation_config:\n  mode: manual\nskills:\n  a:\n    description: precious\n  b:\n    description: stale\n",
        )
        .unwrap();
        let before = IndexArtifact::load(&output).unwrap();

        let mock = MockProvider::default().with_default(MockReply::Text(DEBUG_REPLY.into()));
        let clock = Arc::new(MockClock::new());
        let client = client(&mock, &clock);
        let only = vec!["b".to_owned()];
        IndexBuilder::new(&client, &config())
            .generate(tmp.path(), None, Some(&only), &mut RecordingSink::default())
            .unwrap();

        let after = IndexArtifact::load(&output).unwrap();
        assert_eq!(after.len(), 2);
        assert_eq!(after.raw_entry("a"), before.raw_entry("a"));
        let entries: BTreeMap<_, _> = after.entries().into_iter().collect();
        assert_eq!(entries["a"].description, "precious");
        assert_eq!(entries["b"].description, "Find bugs");
    }

    #[test]
    fn subset_run_refuses_to_overwrite_unreadable_index() {
        let tmp = tempfile::tempdir().unwrap();
        skill(tmp.path(), "a");
        let output = tmp.path().join(INDEX_FILE);
        let original = "skills: [unclosed";
        std::fs::write(&output, original).unwrap();

        let mock = MockProvider::default().with_default(MockReply::Text(DEBUG_REPLY.into()));
        let clock = Arc::new(MockClock::new());
        let client = client(&mock, &clock);
        let only = vec!["a".to_owned()];
        let err = IndexBuilder::new(&client, &config())
            .generate(tmp.path(), None, Some(&only), &mut RecordingSink::default())
            .unwrap_err();

        assert!(matches!(err, IndexError::ExistingArtifact { ref path, .. } if *path == output));
        assert_eq!(std::fs::read_to_string(&output).unwrap(), original);
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn unreadable_document_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        skill(tmp.path(), "good");
        let bad = tmp.path().join("bad");
        std::fs::create_dir_all(&bad).unwrap();
        std::fs::write(bad.join(SKILL_FILE), [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let mock = MockProvider::default().with_default(MockReply::Text(DEBUG_REPLY.into()));
        let clock = Arc::new(MockClock::new());
        let client = client(&mock, &clock);
        let mut sink = RecordingSink::default();
        let report = IndexBuilder::new(&client, &config())
            .generate(tmp.path(), None, None, &mut sink)
            .unwrap();

        assert_eq!(report.errors, ["bad"]);
        assert_eq!(report.total_entries, 1);
        assert!(
            sink.lines()
                .iter()
                .any(|l| l.starts_with("STATUS:ERROR:bad:Read error - "))
        );
        assert_eq!(mock.calls().len(), 1);
    }

    #[test]
    fn client_failure_falls_back_per_skill() {
        let tmp = tempfile::tempdir().unwrap();
        skill(tmp.path(), "one");
        skill(tmp.path(), "two");
        let mock = MockProvider::with_replies(vec![MockReply::Fail("boom".into())])
            .with_default(MockReply::Text(DEBUG_REPLY.into()));
        let clock = Arc::new(MockClock::new());
        let client = client(&mock, &clock);
        let mut sink = RecordingSink::default();
        let report = IndexBuilder::new(&client, &config())
            .generate(tmp.path(), None, None, &mut sink)
            .unwrap();

        assert_eq!(report.fallbacks, ["one"]);
        assert_eq!(report.extracted, ["two"]);
        assert!(sink.lines().iter().any(|l| l.starts_with("ACTIVITY:Error - All models failed")));
    }

    #[test]
    fn custom_output_path() {
        let tmp = tempfile::tempdir().unwrap();
        skill(tmp.path(), "solo");
        let output = tmp.path().join("out").join("index.yaml");
        let mock = MockProvider::default();
        let clock = Arc::new(MockClock::new());
        let client = client(&mock, &clock);
        let report = IndexBuilder::new(&client, &config())
            .generate(tmp.path(), Some(&output), None, &mut RecordingSink::default())
            .unwrap();
        assert_eq!(report.output, output);
        assert!(output.is_file());
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn empty_directory_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mock = MockProvider::default();
        let clock = Arc::new(MockClock::new());
        let client = client(&mock, &clock);
        let err = IndexBuilder::new(&client, &config())
            .generate(tmp.path(), None, None, &mut RecordingSink::default())
            .unwrap_err();
        assert!(matches!(err, IndexError::NoSkills(_)));
    }
}
