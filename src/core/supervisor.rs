//! Cooldown-and-retry wrapper around a full traversal.
//!
//! Retryable failures restart the traversal from the first page after a
//! fixed cooldown, forever unless `max_attempts` is configured. Fatal
//! failures are returned immediately.

use std::time::Duration;

use tracing::{error, info, warn};

use super::error::SyncError;
use super::traversal::PaginationDriver;
use crate::config::RetrySettings;
use crate::domain::SyncReport;

/// Restarts the traversal after retryable failures
pub struct RetrySupervisor<'a> {
    driver: PaginationDriver<'a>,
    policy: RetrySettings,
}

impl<'a> RetrySupervisor<'a> {
    pub fn new(driver: PaginationDriver<'a>, policy: RetrySettings) -> Self {
        Self { driver, policy }
    }

    /// Run traversals until one drains the collection
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::new();

        loop {
            report.attempts += 1;

            match self.driver.traverse(&mut report).await {
                Ok(()) => {
                    report.finish();
                    info!(
                        attempts = report.attempts,
                        pages = report.pages,
                        entries = report.entries,
                        archived = report.archived,
                        "Collection drained"
                    );
                    return Ok(report);
                }
                Err(e) if e.is_fatal() => {
                    error!(entry_id = ?e.entry_id(), error = %e, "Unrecoverable error, stopping");
                    return Err(e);
                }
                Err(e) => {
                    error!(
                        attempt = report.attempts,
                        entry_id = ?e.entry_id(),
                        error = %e,
                        "Traversal failed"
                    );

                    if let Some(max) = self.policy.max_attempts {
                        if report.attempts >= max {
                            error!(max_attempts = max, "Giving up after maximum attempts");
                            return Err(e);
                        }
                    }

                    warn!(cooldown_secs = self.policy.cooldown.as_secs(), "Retrying after cooldown");
                    cool_down(self.policy.cooldown, self.policy.heartbeat).await;
                }
            }
        }
    }
}

/// Wait out `cooldown`, emitting a heartbeat every `heartbeat`.
///
/// Returns the number of heartbeats emitted.
async fn cool_down(cooldown: Duration, heartbeat: Duration) -> u32 {
    let mut remaining = cooldown;
    let mut beats = 0;

    while !remaining.is_zero() {
        let tick = if heartbeat.is_zero() {
            remaining
        } else {
            remaining.min(heartbeat)
        };
        tokio::time::sleep(tick).await;
        remaining = remaining.saturating_sub(tick);

        if remaining > Duration::ZERO {
            beats += 1;
            info!(remaining_secs = remaining.as_secs(), "Retry countdown");
        }
    }

    beats
}
