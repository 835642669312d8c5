//! Generation delegated to a locally installed assistant CLI.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::config::AiConfig;
use crate::error::LlmError;
use crate::provider::{GenerateRequest, LlmProvider};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs `<program> --model <model> --dangerously-skip-permissions -p <prompt>`
/// and returns its trimmed stdout.
#[derive(Debug, Clone)]
pub struct CliProvider {
    program: String,
    timeout: Duration,
}

impl CliProvider {
    #[must_use]
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    #[must_use]
    pub fn from_config(config: &AiConfig) -> Self {
        Self::new(config.cli_program.clone(), config.timeout())
    }

    fn spawn(&self, model: &str, prompt: &str) -> Result<Child, LlmError> {
        Command::new(&self.program)
            .args([
                "--model",
                model,
                "--dangerously-skip-permissions",
                "-p",
                prompt,
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    LlmError::Process(format!(
                        "{} CLI not found; install it or choose a different provider",
                        self.program
                    ))
                } else {
                    LlmError::Process(format!("failed to start {}: {e}", self.program))
                }
            })
    }
}

/// `System:` block, blank line, then the `User:` turn.
fn render_prompt(request: &GenerateRequest<'_>) -> String {
    match request.system {
        Some(system) => format!("System: {system}\n\nUser: {}", request.prompt),
        None => format!("User: {}", request.prompt),
    }
}

fn drain(pipe: Option<impl Read + Send + 'static>) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut out = String::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_string(&mut out).ok();
        }
        out
    })
}

impl LlmProvider for CliProvider {
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, LlmError> {
        let prompt = render_prompt(request);
        let mut child = self.spawn(request.model, &prompt)?;

        // Pipes are drained off-thread so a chatty child cannot fill the buffer and stall.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child
                .try_wait()
                .map_err(|e| LlmError::Process(e.to_string()))?
            {
                break status;
            }
            if Instant::now() >= deadline {
                child.kill().ok();
                child.wait().ok();
                return Err(LlmError::Timeout(self.timeout.as_secs()));
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if !status.success() {
            return Err(LlmError::Process(format!(
                "{} exited with {status}: {}",
                self.program,
                stderr.trim()
            )));
        }

        let text = stdout.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyResponse { provider: "claude" });
        }
        Ok(text.to_owned())
    }

    fn name(&self) -> &'static str {
        "claude"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_includes_system_block() {
        let req = GenerateRequest::new("haiku", "extract", Some("json only"));
        assert_eq!(render_prompt(&req), "System: json only\n\nUser: extract");
    }

    #[test]
    fn prompt_without_system() {
        let req = GenerateRequest::new("haiku", "hello", None);
        assert_eq!(render_prompt(&req), "User: hello");
    }

    #[test]
    fn missing_program_is_not_found() {
        let p = CliProvider::new("skillrank-no-such-binary", Duration::from_secs(1));
        let err = p
            .generate(&GenerateRequest::new("haiku", "hi", None))
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert_eq!(
            crate::retry::FailureKind::classify(&err),
            crate::retry::FailureKind::NotFound
        );
    }

    #[cfg(unix)]
    #[test]
    fn returns_trimmed_stdout() {
        // `echo` prints its arguments, which lets us check the argument layout.
        let p = CliProvider::new("echo", Duration::from_secs(5));
        let out = p
            .generate(&GenerateRequest::new("haiku", "hi", None))
            .unwrap();
        assert_eq!(out, "--model haiku --dangerously-skip-permissions -p User: hi");
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_process_error() {
        let p = CliProvider::new("false", Duration::from_secs(5));
        let err = p
            .generate(&GenerateRequest::new("haiku", "hi", None))
            .unwrap_err();
        assert!(matches!(err, LlmError::Process(_)));
    }
}
