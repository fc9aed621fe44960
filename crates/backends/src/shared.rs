//! Refcounted, mutex-guarded shared backend handle.
//!
//! EEPROM, filesystem, and drive state in the original runtime lives
//! outside any single computer: several computers can mount the same
//! backend, so it's refcounted and carries its own lock (§4.5, §9). The
//! Rust translation keeps that shape explicitly — `Shared<T>` wraps an
//! `Arc<Mutex<_>>` rather than a raw refcount + guard pair — but the
//! "deinit exactly once, at the final destroy" guarantee §8 tests for
//! falls straight out of `Arc`'s own drop glue, the same trick
//! `neonucleus_core::value::Value` uses for its own reference counting.

use std::sync::{Arc, Mutex};

/// Runs cleanup when the backend's last handle is dropped. Default is a
/// no-op, matching an absent `deinit` vtable entry in the original.
pub trait Deinit {
    fn deinit(&mut self) {}
}

struct Cell<T: Deinit> {
    value: T,
}

impl<T: Deinit> Drop for Cell<T> {
    fn drop(&mut self) {
        log::debug!("shared backend: last handle dropped, running deinit");
        self.value.deinit();
    }
}

/// A reference-counted, mutex-guarded backend handle.
///
/// Cloning is `retain`; dropping the last clone is `destroy`. Every
/// vtable call goes through [`Shared::with_lock`], which acquires the
/// mutex for the duration of the closure — the same "acquire, operate,
/// release" discipline §4.5 and §5 specify, including for `getChecksum`,
/// whose multi-read composition must observe a single lock acquisition.
pub struct Shared<T: Deinit> {
    cell: Arc<Mutex<Cell<T>>>,
}

impl<T: Deinit> Shared<T> {
    pub fn new(value: T) -> Self {
        Shared {
            cell: Arc::new(Mutex::new(Cell { value })),
        }
    }

    pub fn with_lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.cell.lock().expect("shared backend lock poisoned");
        f(&mut guard.value)
    }

    /// Outstanding handle count, for tests that want to observe refcount
    /// behavior directly.
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.cell)
    }
}

impl<T: Deinit> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Shared {
            cell: Arc::clone(&self.cell),
        }
    }
}
