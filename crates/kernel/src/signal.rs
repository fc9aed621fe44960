//! Bounded FIFO of guest-visible events.
//!
//! Mirrors the signal ring in `computer.c`: at most
//! [`neonucleus_core::limits::MAX_SIGNALS`] queued signals, each with at
//! most [`neonucleus_core::limits::MAX_SIGNAL_VALS`] values and a measured
//! packet size under [`neonucleus_core::limits::MAX_SIGNAL_SIZE`].

use std::collections::VecDeque;

use neonucleus_core::limits::{MAX_SIGNALS, MAX_SIGNAL_SIZE, MAX_SIGNAL_VALS};
use neonucleus_core::value::{measure_packet_size, Value};

use crate::error::KernelError;

#[derive(Debug)]
struct Signal {
    values: Vec<Value>,
}

/// The queue itself. Push-time retain and pop-time drop are the kernel's
/// responsibility (§9's resolved ambiguity): pushing clones each value
/// handle in, popping simply drops the stored `Vec`.
#[derive(Debug, Default)]
pub struct SignalQueue {
    queue: VecDeque<Signal>,
}

impl SignalQueue {
    pub fn new() -> Self {
        SignalQueue::default()
    }

    /// `push`: rejects empty, oversized-arity, oversized-packet, or a
    /// full queue. Values are retained (cloned) into the queue, matching
    /// the kernel-retains-on-push policy adopted in §9.
    pub fn push(&mut self, values: &[Value]) -> Result<(), KernelError> {
        if values.is_empty() || values.len() > MAX_SIGNAL_VALS {
            log::debug!("signal push rejected: {} values", values.len());
            return Err(KernelError::TooManyValues);
        }
        if measure_packet_size(values) > MAX_SIGNAL_SIZE {
            log::debug!("signal push rejected: packet too big");
            return Err(KernelError::TooBig);
        }
        if self.queue.len() >= MAX_SIGNALS {
            log::debug!("signal push rejected: queue full ({} signals)", self.queue.len());
            return Err(KernelError::TooManySignals);
        }
        self.queue.push_back(Signal {
            values: values.iter().map(Value::retain).collect(),
        });
        Ok(())
    }

    /// `fetchValue`: value `index` of the head signal, `Nil` if the queue
    /// is empty or `index` is out of range.
    pub fn fetch_value(&self, index: usize) -> Value {
        self.queue
            .front()
            .and_then(|s| s.values.get(index))
            .cloned()
            .unwrap_or(Value::Nil)
    }

    /// `size`: arity of the head signal, 0 if empty.
    pub fn size(&self) -> usize {
        self.queue.front().map(|s| s.values.len()).unwrap_or(0)
    }

    /// `pop`: drops the head signal's values and advances the queue.
    /// Returns `false` ("missing event") if the queue was already empty.
    pub fn pop(&mut self) -> bool {
        self.queue.pop_front().is_some()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_is_preserved() {
        let mut q = SignalQueue::new();
        q.push(&[Value::int(1)]).unwrap();
        q.push(&[Value::int(2), Value::string(b"x".to_vec())]).unwrap();
        assert_eq!(q.size(), 1);
        assert_eq!(q.fetch_value(0).to_int(), 1);
        assert!(q.pop());
        assert_eq!(q.size(), 2);
        assert_eq!(q.fetch_value(1).to_bytes(), Some(b"x".to_vec()));
    }

    #[test]
    fn push_rejects_empty_and_oversized_arity() {
        let mut q = SignalQueue::new();
        assert_eq!(q.push(&[]).unwrap_err(), KernelError::TooManyValues);
        let too_many: Vec<Value> = (0..MAX_SIGNAL_VALS + 1).map(Value::int).collect();
        assert_eq!(q.push(&too_many).unwrap_err(), KernelError::TooManyValues);
    }

    #[test]
    fn push_rejects_oversized_packet() {
        let mut q = SignalQueue::new();
        let big = Value::string(vec![0u8; MAX_SIGNAL_SIZE]);
        assert_eq!(q.push(&[big]).unwrap_err(), KernelError::TooBig);
        assert_eq!(q.len(), 0);
    }

    #[test]
    fn push_rejects_once_queue_full() {
        let mut q = SignalQueue::new();
        for _ in 0..MAX_SIGNALS {
            q.push(&[Value::int(1)]).unwrap();
        }
        assert_eq!(q.push(&[Value::int(1)]).unwrap_err(), KernelError::TooManySignals);
    }

    #[test]
    fn pop_on_empty_returns_false() {
        let mut q = SignalQueue::new();
        assert!(!q.pop());
    }
}
