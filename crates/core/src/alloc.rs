//! Polymorphic allocator abstraction threaded through the universe.
//!
//! The original C API (`nn_Alloc`) is a `(userdata, fn pointer)` pair that
//! every heap operation in the runtime is routed through, so an embedder
//! can interpose memory accounting without touching libc directly. Rust's
//! `Value` variants already ride on the ordinary global allocator (`Rc`,
//! `Vec`), so there is nothing left for a byte allocator to *allocate* —
//! what the embedder actually wants is the accounting hook. `Allocator`
//! keeps that seam: every byte-producing operation in the kernel and
//! backends reports through it, and an embedder can refuse an allocation by
//! returning `false` from `try_reserve`, matching `nn_alloc` returning NULL
//! on an accounting failure.
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A host-pluggable memory accountant.
pub trait Allocator: fmt::Debug + Send + Sync {
    /// Requests permission to account for `bytes` more memory. Returns
    /// `false` if the embedder wants to refuse (e.g. a computer's
    /// `memoryLimit` would be exceeded); callers must treat `false` the
    /// same way the C API treats a NULL `nn_alloc` result — as an
    /// "out of memory" condition.
    fn try_reserve(&self, bytes: usize) -> bool;

    /// Releases a previous reservation. Must be called with the same
    /// `bytes` value passed to a successful `try_reserve`.
    fn release(&self, bytes: usize);

    /// Current accounted usage, for `getComputerMemoryUsed`-style queries.
    fn in_use(&self) -> usize;
}

/// An allocator with no limit and no accounting — the default for
/// embedders that don't care about memory metering.
#[derive(Debug, Default)]
pub struct UnboundedAllocator {
    in_use: AtomicUsize,
}

impl Allocator for UnboundedAllocator {
    fn try_reserve(&self, bytes: usize) -> bool {
        self.in_use.fetch_add(bytes, Ordering::Relaxed);
        true
    }

    fn release(&self, bytes: usize) {
        self.in_use.fetch_sub(bytes, Ordering::Relaxed);
    }

    fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Relaxed)
    }
}

/// An allocator that refuses any reservation once a fixed budget is
/// exceeded — the Rust-native counterpart of passing `memoryLimit` to
/// `nn_newComputer`.
#[derive(Debug)]
pub struct BoundedAllocator {
    limit: usize,
    in_use: AtomicUsize,
}

impl BoundedAllocator {
    pub fn new(limit: usize) -> Self {
        BoundedAllocator {
            limit,
            in_use: AtomicUsize::new(0),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Allocator for BoundedAllocator {
    fn try_reserve(&self, bytes: usize) -> bool {
        loop {
            let current = self.in_use.load(Ordering::Acquire);
            let Some(next) = current.checked_add(bytes) else {
                return false;
            };
            if next > self.limit {
                return false;
            }
            if self
                .in_use
                .compare_exchange(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return true;
            }
        }
    }

    fn release(&self, bytes: usize) {
        self.in_use.fetch_sub(bytes, Ordering::Release);
    }

    fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_allocator_rejects_past_limit() {
        let a = BoundedAllocator::new(100);
        assert!(a.try_reserve(60));
        assert!(!a.try_reserve(60));
        assert!(a.try_reserve(40));
        assert_eq!(a.in_use(), 100);
        a.release(40);
        assert_eq!(a.in_use(), 60);
    }
}
