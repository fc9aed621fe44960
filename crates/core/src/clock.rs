//! Wall-clock abstraction used by the universe and by resource-latency
//! simulation. Mirrors `nn_clock_t`/`nn_realTimeClock` — a function that
//! returns seconds since an arbitrary epoch, swappable so test builds can
//! avoid depending on real wall-clock time.

use std::time::{SystemTime, UNIX_EPOCH};

/// A source of monotonically-nondecreasing time, in seconds.
pub trait Clock: std::fmt::Debug + Send + Sync {
    fn now(&self) -> f64;
}

/// The default clock: real wall-clock time since the Unix epoch.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before epoch")
            .as_secs_f64()
    }
}

/// A clock that always reports the same instant — useful in test builds
/// that want deterministic uptime without real sleeps, per §9's note that
/// busy-wait latency should be swappable for a no-op clock in tests.
#[derive(Debug, Clone, Copy)]
pub struct FrozenClock(pub f64);

impl Clock for FrozenClock {
    fn now(&self) -> f64 {
        self.0
    }
}
