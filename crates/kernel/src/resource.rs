//! Busy-wait latency and buffered-indirect throughput throttling.
//!
//! Energy, heat, and call-budget accounting live directly on
//! [`crate::computer::Computer`] since they're just arithmetic over its
//! own fields (§4.4); this module covers the two knobs that need outside
//! help: wall-clock latency simulation and the per-component token
//! bucket used for indirect-method throttling (§4.6). Latency is
//! deliberately a busy-wait rather than a cooperative sleep — §9 is
//! explicit that suspending the host thread would change guest-observable
//! timing — with the wait itself routed through a swappable
//! [`LatencySource`] so test builds can skip real time.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;

/// A source of randomness and wall-clock delay for resource simulation.
pub trait LatencySource: fmt::Debug + Send + Sync {
    /// Draws a uniform value in `[min, max]`.
    fn random(&self, min: f64, max: f64) -> f64;

    /// Busy-waits for `seconds`.
    fn busy_sleep(&self, seconds: f64);
}

/// The default source: real randomness, real spinning.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealLatency;

impl LatencySource for RealLatency {
    fn random(&self, min: f64, max: f64) -> f64 {
        if min >= max {
            return min;
        }
        rand::thread_rng().gen_range(min..max)
    }

    fn busy_sleep(&self, seconds: f64) {
        if seconds <= 0.0 {
            return;
        }
        let deadline = Instant::now() + Duration::from_secs_f64(seconds);
        while Instant::now() < deadline {
            std::hint::spin_loop();
        }
    }
}

/// A no-op source for test builds: `random` returns the midpoint, `sleep`
/// does nothing. Keeps test runs fast and deterministic, per §9's note
/// that a no-op clock substitute should be offered.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLatency;

impl LatencySource for NoLatency {
    fn random(&self, min: f64, max: f64) -> f64 {
        (min + max) / 2.0
    }

    fn busy_sleep(&self, _seconds: f64) {}
}

/// Per-component buffered-indirect state: bytes/chunks/files (caller's
/// unit) used so far in the current tick, and which tick that count
/// belongs to.
#[derive(Debug, Default)]
pub struct IndirectThrottle {
    used_this_tick: f64,
    tick: u64,
}

impl IndirectThrottle {
    /// `simulateBufferedIndirect`: if charging `amount` in the current
    /// tick would exceed `amount_per_tick`, refuses (the caller transitions
    /// the computer to Busy) without mutating the accumulator; otherwise
    /// charges it and accepts.
    pub fn try_charge(&mut self, current_tick: u64, amount: f64, amount_per_tick: f64) -> bool {
        if self.tick != current_tick {
            self.tick = current_tick;
            self.used_this_tick = 0.0;
        }
        if self.used_this_tick + amount > amount_per_tick {
            return false;
        }
        self.used_this_tick += amount;
        true
    }
}

/// The knobs a backend dispatch charges after a successful operation:
/// energy drain, heat addition, busy-wait latency bounds, and call-budget
/// cost. See [`crate::computer::Computer::charge`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceCharge {
    pub energy: f64,
    pub heat: f64,
    pub latency: Option<(f64, f64)>,
    pub call_budget: f64,
}

/// Shared simulator handle threaded through a universe's computers.
#[derive(Debug, Clone)]
pub struct ResourceSimulator {
    latency: Arc<dyn LatencySource>,
}

impl ResourceSimulator {
    pub fn new(latency: Arc<dyn LatencySource>) -> Self {
        ResourceSimulator { latency }
    }

    pub fn random_latency(&self, min: f64, max: f64) -> f64 {
        self.latency.random(min, max)
    }

    pub fn busy_sleep(&self, seconds: f64) {
        self.latency.busy_sleep(seconds)
    }
}

impl Default for ResourceSimulator {
    fn default() -> Self {
        ResourceSimulator::new(Arc::new(RealLatency))
    }
}
