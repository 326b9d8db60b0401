//! Reconnect backoff
//!
//! The first reconnect attempt waits a uniformly random delay below the
//! retry interval, so many clients losing the same server do not all
//! reconnect in the same instant. Later attempts wait the full interval.

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Delay schedule for one connection's reconnect attempts
#[derive(Debug)]
pub struct Backoff {
    interval: Option<Duration>,
    rng: SmallRng,
}

impl Backoff {
    pub fn new(interval: Option<Duration>) -> Self {
        Self {
            interval,
            rng: SmallRng::from_entropy(),
        }
    }

    /// Deterministic jitter, for tests
    pub fn with_seed(interval: Option<Duration>, seed: u64) -> Self {
        Self {
            interval,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Delay before reconnect attempt `attempt` (zero-based)
    pub fn delay(&mut self, attempt: u32) -> Duration {
        let Some(interval) = self.interval else {
            return Duration::ZERO;
        };
        if attempt > 0 {
            return interval;
        }
        let micros = interval.as_micros().min(u64::MAX as u128) as u64;
        if micros == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(self.rng.gen_range(0..micros))
    }
}
