//! Bounded poll loop waiting for an accepted submission.
//!
//! The page needs a moment to render the verdict after a submit, so the
//! loop re-checks the source on a fixed interval and gives up after a
//! bounded number of attempts. The budget is explicit state, not an
//! open-ended retry.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::contract::ProblemSource;
use crate::error::SyncError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            attempts: 10,
            interval: Duration::from_secs(1),
        }
    }
}

/// Poll-loop states. `Accepted` and `TimedOut` are terminal; a timed-out
/// detection is only restarted by a fresh user-triggered submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectState {
    Polling { attempt: u32 },
    Accepted,
    TimedOut,
}

/// Wait until the source reports an accepted submission, or fail with
/// [`SyncError::Timeout`] once the attempt budget is spent.
pub async fn await_accepted<P: ProblemSource + ?Sized>(
    source: &P,
    config: &PollConfig,
) -> Result<(), SyncError> {
    let mut state = DetectState::Polling { attempt: 0 };
    loop {
        match state {
            DetectState::Polling { attempt } if attempt >= config.attempts => {
                state = DetectState::TimedOut;
            }
            DetectState::Polling { attempt } => {
                if source.accepted().await {
                    state = DetectState::Accepted;
                } else {
                    debug!(attempt = attempt + 1, "no accepted submission yet");
                    sleep(config.interval).await;
                    state = DetectState::Polling {
                        attempt: attempt + 1,
                    };
                }
            }
            DetectState::Accepted => {
                info!("accepted submission detected");
                return Ok(());
            }
            DetectState::TimedOut => {
                warn!(
                    attempts = config.attempts,
                    "gave up waiting for an accepted submission"
                );
                return Err(SyncError::Timeout {
                    attempts: config.attempts,
                });
            }
        }
    }
}
