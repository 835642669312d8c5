use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::clock::Clock;

const WINDOW: Duration = Duration::from_secs(60);
const SAFETY_MARGIN: Duration = Duration::from_millis(100);

/// Gate in front of every outbound AI call.
///
/// Enforces a minimum spacing between consecutive requests and a rolling
/// requests-per-minute cap over a trailing 60 second window. An `rpm` of zero
/// disables the cap.
pub struct RateLimiter {
    rpm: usize,
    min_delay: Duration,
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    last_request: Option<Instant>,
    window: VecDeque<Instant>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("rpm", &self.rpm)
            .field("min_delay", &self.min_delay)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    #[must_use]
    pub fn new(rpm: u32, min_delay: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            rpm: rpm as usize,
            min_delay,
            clock,
            state: Mutex::new(State::default()),
        }
    }

    /// Block until the next request is allowed, then record it.
    pub fn wait_if_needed(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(last) = state.last_request {
            let elapsed = self.clock.now().saturating_duration_since(last);
            if elapsed < self.min_delay {
                self.clock.sleep(self.min_delay - elapsed);
            }
        }

        let now = self.clock.now();
        prune(&mut state.window, now);

        if self.rpm > 0
            && state.window.len() >= self.rpm
            && let Some(&oldest) = state.window.front()
        {
            let wait = (WINDOW + SAFETY_MARGIN).saturating_sub(now.saturating_duration_since(oldest));
            tracing::debug!(
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                rpm = self.rpm,
                "requests-per-minute cap reached"
            );
            self.clock.sleep(wait);
            prune(&mut state.window, self.clock.now());
        }

        let now = self.clock.now();
        state.window.push_back(now);
        state.last_request = Some(now);
    }

    /// Requests recorded inside the trailing window.
    #[must_use]
    pub fn in_window(&self) -> usize {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        prune(&mut state.window, self.clock.now());
        state.window.len()
    }
}

fn prune(window: &mut VecDeque<Instant>, now: Instant) {
    while let Some(&front) = window.front() {
        if now.saturating_duration_since(front) >= WINDOW {
            window.pop_front();
        } else {
            break;
        }
    }
}
