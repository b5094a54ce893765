//! local cost budget
//!
//! a client-side token bucket approximating the server's point budget. it only
//! lowers the odds of a real 429; the server stays the authority. one bucket is
//! owned per [`crate::Client`] (and shared by its clones), never per process.

use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// token bucket settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostBudgetConfig {
    /// points the bucket holds when full
    pub capacity: u32,
    /// points restored per second
    pub refill_per_second: f64,
    /// longest a call may block waiting for points
    pub max_wait: Duration,
}

impl CostBudgetConfig {
    /// budget of `capacity` points restored over `window`
    ///
    /// mirrors how the remote api publishes its quota ("n points per minute").
    pub fn new(capacity: u32, window: Duration) -> Self {
        let refill_per_second = if window.is_zero() {
            0.0
        } else {
            f64::from(capacity) / window.as_secs_f64()
        };
        Self {
            capacity,
            refill_per_second,
            max_wait: Duration::from_secs(30),
        }
    }

    /// set how long a call may block for points
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::Config("budget capacity must be positive".to_string()));
        }
        if !(self.refill_per_second.is_finite() && self.refill_per_second > 0.0) {
            return Err(Error::Config(
                "budget refill rate must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// shared point counter with time-based refill
#[derive(Debug)]
pub struct CostBudget {
    capacity: f64,
    refill_per_second: f64,
    max_wait: Duration,
    state: Mutex<BucketState>,
}

impl CostBudget {
    /// create a full bucket
    pub fn new(config: CostBudgetConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            capacity: f64::from(config.capacity),
            refill_per_second: config.refill_per_second,
            max_wait: config.max_wait,
            state: Mutex::new(BucketState {
                tokens: f64::from(config.capacity),
                last_refill: Instant::now(),
            }),
        })
    }

    /// points currently available
    pub fn available(&self) -> f64 {
        let mut state = self.state.lock();
        self.refill_locked(&mut state, Instant::now());
        state.tokens
    }

    fn refill_locked(&self, state: &mut BucketState, now: Instant) {
        let elapsed = now.saturating_duration_since(state.last_refill);
        if !elapsed.is_zero() {
            state.tokens =
                (state.tokens + elapsed.as_secs_f64() * self.refill_per_second).min(self.capacity);
            state.last_refill = now;
        }
    }

    /// take `cost` points now, or report how long until they would be there
    fn try_take(&self, cost: f64) -> std::result::Result<(), Duration> {
        let mut state = self.state.lock();
        self.refill_locked(&mut state, Instant::now());
        if state.tokens + f64::EPSILON >= cost {
            state.tokens = (state.tokens - cost).max(0.0);
            return Ok(());
        }
        let needed = (cost - state.tokens) / self.refill_per_second;
        Err(Duration::try_from_secs_f64(needed).unwrap_or(Duration::MAX))
    }

    /// withdraw `cost` points, blocking up to the configured max wait
    ///
    /// returns how long the call waited. fails with [`Error::LocalThrottled`]
    /// when the points cannot arrive in time and with [`Error::Cancelled`] when
    /// `cancel` fires during the wait.
    pub async fn acquire(&self, cost: u32, cancel: &CancellationToken) -> Result<Duration> {
        if cost == 0 {
            return Ok(Duration::ZERO);
        }
        let cost_points = f64::from(cost);
        if cost_points > self.capacity {
            return Err(Error::LocalThrottled {
                cost,
                wait: Duration::try_from_secs_f64(cost_points / self.refill_per_second)
                    .unwrap_or(Duration::MAX),
                max_wait: self.max_wait,
            });
        }

        let start = Instant::now();
        // a cap past the clock's range means no deadline
        let deadline = start.checked_add(self.max_wait);
        loop {
            let needed = match self.try_take(cost_points) {
                Ok(()) => return Ok(start.elapsed()),
                Err(needed) => needed,
            };

            let remaining = deadline
                .map(|deadline| deadline.saturating_duration_since(Instant::now()))
                .unwrap_or(Duration::MAX);
            if needed > remaining {
                return Err(Error::LocalThrottled {
                    cost,
                    wait: needed,
                    max_wait: self.max_wait,
                });
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(needed) => {}
            }
        }
    }
}
