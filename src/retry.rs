//! rate-limit retry policy
//!
//! a pure decision function: given what a 429 said and how many attempts the
//! call has made, either authorize one more attempt after a wait or give up
//! with a [`RateLimitFailure`]. only 429 reaches this module; every other
//! non-2xx status fails in the executor without a retry.

use crate::timestamp::{parse_optional_resume_after, ResumeAt, TimestampError};
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;
use std::time::Duration;

/// default number of extra attempts after a 429
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// default longest wait the client will sit through for one 429
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(60);

/// retry bounds for rate-limited calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// retries allowed after the first attempt
    pub max_retries: u32,
    /// waits longer than this are not sat through
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

/// what the policy decided for one 429
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    /// sleep for `wait` (possibly zero) and send again
    Retry { wait: Duration },
    /// stop and surface the failure
    GiveUp(RateLimitFailure),
}

/// rate-limit information extracted from a 429 response
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitSignal {
    /// raw header value, if the response carried one
    pub header: Option<String>,
    /// parsed resume time or the reason parsing failed
    pub resume: Result<ResumeAt, TimestampError>,
    /// `resume - now` at evaluation time; negative when already passed
    pub wait: Option<TimeDelta>,
}

impl RateLimitSignal {
    /// evaluate a resume header against `now`
    pub fn from_header(header: Option<&str>, now: DateTime<Utc>) -> Self {
        let resume = parse_optional_resume_after(header);
        let wait = resume.as_ref().ok().map(|resume| resume.at - now);
        Self {
            header: header.map(str::to_string),
            resume,
            wait,
        }
    }

    /// parsed resume time, if any
    pub fn resume_at(&self) -> Option<DateTime<Utc>> {
        self.resume.as_ref().ok().map(|resume| resume.at)
    }

    /// wait clamped to zero; `None` when the header did not parse
    pub fn clamped_wait(&self) -> Option<Duration> {
        self.wait
            .map(|wait| wait.to_std().unwrap_or(Duration::ZERO))
    }
}

impl RetryPolicy {
    /// create a policy with explicit bounds
    pub fn new(max_retries: u32, max_wait: Duration) -> Self {
        Self {
            max_retries,
            max_wait,
        }
    }

    /// total physical attempts one logical call may make
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// decide what to do after the `attempt`-th send (1-based) returned 429
    pub fn decide(&self, signal: &RateLimitSignal, attempt: u32) -> RetryDecision {
        let Some(wait) = signal.clamped_wait() else {
            return RetryDecision::GiveUp(RateLimitFailure {
                reason: RateLimitReason::UnparseableHeader,
                attempts: attempt,
                header: signal.header.clone(),
                resume_at: None,
                wait: None,
                max_wait: None,
            });
        };

        if wait > self.max_wait {
            return RetryDecision::GiveUp(RateLimitFailure {
                reason: RateLimitReason::WaitExceedsCap,
                attempts: attempt,
                header: signal.header.clone(),
                resume_at: signal.resume_at(),
                wait: Some(wait),
                max_wait: Some(self.max_wait),
            });
        }

        // an already-passed resume time still spends one attempt
        if attempt >= self.max_attempts() {
            return RetryDecision::GiveUp(RateLimitFailure {
                reason: RateLimitReason::RetriesExhausted,
                attempts: attempt,
                header: signal.header.clone(),
                resume_at: signal.resume_at(),
                wait: Some(wait),
                max_wait: None,
            });
        }

        RetryDecision::Retry { wait }
    }
}

/// why a rate-limited call gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitReason {
    /// resume header absent or not a timestamp
    UnparseableHeader,
    /// computed wait is above the configured cap
    WaitExceedsCap,
    /// every allowed attempt returned 429
    RetriesExhausted,
}

impl fmt::Display for RateLimitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RateLimitReason::UnparseableHeader => "unparseable resume header",
            RateLimitReason::WaitExceedsCap => "wait exceeds cap",
            RateLimitReason::RetriesExhausted => "retries exhausted",
        };
        f.write_str(text)
    }
}

/// server-enforced rate limit the client did not (or could not) wait out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitFailure {
    pub reason: RateLimitReason,
    /// physical attempts made, including the one that gave up
    pub attempts: u32,
    /// last raw resume header
    pub header: Option<String>,
    /// last parsed resume time
    pub resume_at: Option<DateTime<Utc>>,
    /// last computed wait
    pub wait: Option<Duration>,
    /// configured cap, set when the wait exceeded it
    pub max_wait: Option<Duration>,
}

impl fmt::Display for RateLimitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rate limited ({}); attempts={}", self.reason, self.attempts)?;
        if let Some(resume_at) = self.resume_at {
            write!(f, "; retry_at={}", resume_at.to_rfc3339())?;
        }
        if let Some(header) = &self.header {
            write!(f, "; Retry-After={header}")?;
        }
        if let Some(wait) = self.wait {
            write!(f, "; wait_seconds={:.3}", wait.as_secs_f64())?;
        }
        if let Some(max_wait) = self.max_wait {
            write!(f, "; max_wait_seconds={:.3}", max_wait.as_secs_f64())?;
        }
        Ok(())
    }
}
