//! Iteration failure policy for the periodic driver.

use std::time::Duration;

/// What the driver does after an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// Sleep for `after`, then run the next iteration.
    Continue { after: Duration },
}

impl NextStep {
    pub fn delay(self) -> Duration {
        match self {
            NextStep::Continue { after } => after,
        }
    }
}

/// How the driver reacts to a failed iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Log the failure and run again after the normal interval.
    /// No backoff, no attempt limit.
    RetryForever { interval: Duration },
}

impl RetryPolicy {
    pub fn retry_forever(interval: Duration) -> Self {
        RetryPolicy::RetryForever { interval }
    }

    pub fn interval(&self) -> Duration {
        match self {
            RetryPolicy::RetryForever { interval } => *interval,
        }
    }

    pub fn on_success(&self) -> NextStep {
        NextStep::Continue {
            after: self.interval(),
        }
    }

    pub fn on_failure(&self) -> NextStep {
        match self {
            RetryPolicy::RetryForever { interval } => NextStep::Continue { after: *interval },
        }
    }
}
