use crate::error_code::ErrorKind;
use crate::settings::AdvancedSettings;
use std::time::Duration;

/// What to do after a failed primary attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Retry { delay: Duration },
    /// Reload credentials once and retry the same attempt immediately.
    ReloadCredentials,
    Stop,
}

/// Primary-model retry policy.
///
/// - linear backoff: `2 * attempt * backoff_unit` before attempt `attempt` (0-based)
/// - only [`ErrorKind::retryable`] kinds are retried; anything else stops the loop
/// - the first `Auth` failure of a call triggers one credential reload
pub(crate) struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &AdvancedSettings, backoff_unit: Duration) -> Self {
        Self {
            max_attempts: settings.retry_attempts.max(1),
            backoff_unit,
        }
    }

    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff_unit.saturating_mul(2u32.saturating_mul(attempt))
    }

    /// `attempt` is 0-based; `reloaded` is whether this call already reloaded credentials.
    pub fn decide(&self, kind: ErrorKind, attempt: u32, reloaded: bool) -> Decision {
        if kind == ErrorKind::Auth && !reloaded {
            return Decision::ReloadCredentials;
        }
        let next = attempt + 1;
        if kind.retryable() && next < self.max_attempts {
            return Decision::Retry {
                delay: self.backoff_delay(next),
            };
        }
        Decision::Stop
    }
}

/// Whether the alternates walk runs after the primary gave up with `last`.
pub(crate) fn should_walk_alternates(settings: &AdvancedSettings, last: ErrorKind) -> bool {
    settings.auto_fallback
        && settings.alt_attempt_cap > 0
        && (last.opens_alternates() || settings.ignore_status_pings)
}
