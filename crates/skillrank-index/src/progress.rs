//! Line-oriented progress protocol emitted while an index is generated.
//!
//! ```text
//! PROGRESS:<done>:<total>:<skill>
//! ACTIVITY:<message>
//! STATUS:<OK|FALLBACK|ERROR|WARNING>:<skill>:<detail>
//! COMPLETE:<count>:<output path>
//! ```

use std::fmt;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Fallback,
    Error,
    Warning,
}

impl Status {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Fallback => "FALLBACK",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Progress {
        done: usize,
        total: usize,
        skill: String,
    },
    Activity(String),
    Status {
        status: Status,
        skill: String,
        detail: String,
    },
    Complete {
        count: usize,
        output: PathBuf,
    },
}

impl ProgressEvent {
    pub(crate) fn activity(message: impl Into<String>) -> Self {
        Self::Activity(message.into())
    }

    pub(crate) fn status(status: Status, skill: &str, detail: impl Into<String>) -> Self {
        Self::Status {
            status,
            skill: skill.to_owned(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Progress { done, total, skill } => write!(f, "PROGRESS:{done}:{total}:{skill}"),
            Self::Activity(message) => write!(f, "ACTIVITY:{message}"),
            Self::Status {
                status,
                skill,
                detail,
            } => write!(f, "STATUS:{}:{skill}:{detail}", status.as_str()),
            Self::Complete { count, output } => {
                write!(f, "COMPLETE:{count}:{}", output.display())
            }
        }
    }
}

/// Receiver for progress events.
pub trait ProgressSink {
    fn emit(&mut self, event: ProgressEvent);
}

/// Writes each event as one flushed line on stdout.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl ProgressSink for StdoutSink {
    fn emit(&mut self, event: ProgressEvent) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{event}").and_then(|()| out.flush()) {
            tracing::debug!("progress line dropped: {e}");
        }
    }
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct SilentSink;

impl ProgressSink for SilentSink {
    fn emit(&mut self, _event: ProgressEvent) {}
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<ProgressEvent>,
}

impl RecordingSink {
    /// Events rendered as protocol lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(ToString::to_string).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&mut self, event: ProgressEvent) {
        self.events.push(event);
    }
}
