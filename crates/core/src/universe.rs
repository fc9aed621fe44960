//! The process-scoped container tying an allocator, a clock, and a
//! name-registered side table together. Mirrors `nn_universe` in
//! `examples/original_source/src/universe.c`.

use std::any::Any;
use std::sync::{Arc, Mutex};

use crate::alloc::{Allocator, UnboundedAllocator};
use crate::clock::{Clock, SystemClock};
use crate::limits::MAX_USERDATA;

/// Process-scoped container: allocator, clock, and a small name->value
/// side table used to register component-type tables.
///
/// A universe is created explicitly and is expected to outlive every
/// computer and shared backend derived from it (§3's ownership note);
/// nothing here enforces that at the type level, matching the original's
/// `nn_unsafeDeleteUniverse` naming, which exists precisely to flag that
/// the caller must uphold the ordering.
#[derive(Debug)]
pub struct Universe {
    allocator: Arc<dyn Allocator>,
    clock: Mutex<Arc<dyn Clock>>,
    registry: Mutex<Vec<(String, Arc<dyn Any + Send + Sync>)>>,
}

impl Universe {
    pub fn new(allocator: Arc<dyn Allocator>) -> Self {
        Universe {
            allocator,
            clock: Mutex::new(Arc::new(SystemClock)),
            registry: Mutex::new(Vec::new()),
        }
    }

    pub fn allocator(&self) -> &Arc<dyn Allocator> {
        &self.allocator
    }

    pub fn set_clock(&self, clock: Arc<dyn Clock>) {
        *self.clock.lock().expect("universe clock lock poisoned") = clock;
    }

    /// `getTime`: dispatches through the installed clock.
    pub fn now(&self) -> f64 {
        self.clock.lock().expect("universe clock lock poisoned").now()
    }

    /// `store`: appends a named registration, silently ignoring the call
    /// once the registry is at capacity — registrations happen at init and
    /// are expected to succeed, so callers cannot depend on a failure
    /// signal (§9).
    pub fn store<T: Any + Send + Sync>(&self, name: impl Into<String>, value: Arc<T>) {
        let mut registry = self.registry.lock().expect("universe registry lock poisoned");
        if registry.len() >= MAX_USERDATA {
            return;
        }
        registry.push((name.into(), value));
    }

    /// `query`: linear-scans the registry by name, downcasting to `T`.
    /// Returns `None` both when the name is unregistered and when it is
    /// registered under a different type.
    pub fn query<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        let registry = self.registry.lock().expect("universe registry lock poisoned");
        registry
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| Arc::clone(v).downcast::<T>().ok())
    }
}

impl Default for Universe {
    fn default() -> Self {
        Universe::new(Arc::new(UnboundedAllocator::default()))
    }
}
