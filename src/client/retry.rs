use crate::config::ClientConfig;
use std::time::Duration;

/// One numbered try within a retry sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAttempt {
    /// 1-based
    pub attempt_number: u32,
    pub max_attempts: u32,
    /// Pause taken after this attempt fails, unless it is the last one
    pub backoff: Duration,
}

impl RetryAttempt {
    pub fn is_last(&self) -> bool {
        self.attempt_number >= self.max_attempts
    }
}

/// Fixed number of attempts with a linear backoff of two seconds per attempt
///
/// Attempt `n` failing is followed by a pause of `2 * n` seconds, so `N`
/// attempts pause `2, 4, ..., 2(N-1)` seconds in total.
///
/// # Examples
///
/// ```
/// use acksrv::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(3);
/// assert_eq!(policy.attempts().count(), 3);
/// assert_eq!(policy.pauses(), vec![Duration::from_secs(2), Duration::from_secs(4)]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    pub const BACKOFF_STEP: Duration = Duration::from_secs(2);

    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.retry_attempts)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff_for(attempt_number: u32) -> Duration {
        Self::BACKOFF_STEP * attempt_number
    }

    /// Attempts in order, 1 through `max_attempts`
    pub fn attempts(&self) -> impl Iterator<Item = RetryAttempt> + use<> {
        let max_attempts = self.max_attempts;
        (1..=max_attempts).map(move |attempt_number| RetryAttempt {
            attempt_number,
            max_attempts,
            backoff: Self::backoff_for(attempt_number),
        })
    }

    /// Every pause a fully failing sequence takes
    pub fn pauses(&self) -> Vec<Duration> {
        self.attempts()
            .filter(|attempt| !attempt.is_last())
            .map(|attempt| attempt.backoff)
            .collect()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}
