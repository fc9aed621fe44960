//! Tagged value model shared between architectures and components.
//!
//! Mirrors `nn_value` from the original `neonucleus.h`, but replaces the
//! manual `nn_refc` bookkeeping with `Rc`: cloning a [`Value`] is the
//! "retain", and letting the last clone drop is the "drop" — Rust's own
//! drop glue walks arrays and tables recursively, which is exactly what the
//! C version did by hand.

use std::cell::RefCell;
use std::rc::Rc;

use crate::alloc::Allocator;

/// A guest-visible value.
///
/// Nil/Int/Number/Bool/BorrowedStr are plain by-value data. `Str`, `Array`
/// and `Table` are heap-backed and reference-counted via `Rc`; cloning one
/// is cheap and is the moral equivalent of `nn_values_retain`.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Int(i64),
    Number(f64),
    Bool(bool),
    /// A borrowed string with static or caller-managed lifetime — the
    /// counterpart of `nn_values_cstring`, used for constants that are
    /// never freed (e.g. literals baked into an architecture).
    BorrowedStr(&'static str),
    Str(Rc<Vec<u8>>),
    Array(Rc<RefCell<Vec<Value>>>),
    Table(Rc<RefCell<Vec<(Value, Value)>>>),
}

impl Value {
    pub fn nil() -> Value {
        Value::Nil
    }

    pub fn int(v: i64) -> Value {
        Value::Int(v)
    }

    pub fn number(v: f64) -> Value {
        Value::Number(v)
    }

    pub fn boolean(v: bool) -> Value {
        Value::Bool(v)
    }

    pub fn borrowed_str(v: &'static str) -> Value {
        Value::BorrowedStr(v)
    }

    pub fn string(bytes: impl Into<Vec<u8>>) -> Value {
        Value::Str(Rc::new(bytes.into()))
    }

    /// Builds an array of `len` nil-initialized slots.
    pub fn array(len: usize) -> Value {
        Value::Array(Rc::new(RefCell::new(vec![Value::Nil; len])))
    }

    /// Builds a table of `len` (nil, nil) pairs.
    pub fn table(len: usize) -> Value {
        Value::Table(Rc::new(RefCell::new(vec![
            (Value::Nil, Value::Nil);
            len
        ])))
    }

    pub fn array_from(values: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(values)))
    }

    /// Accounted string construction: charges `bytes.len()` against
    /// `alloc` before allocating. Returns `Nil` on accounting failure,
    /// matching `nn_values_string` returning a nil-tagged value rather
    /// than propagating an error through the guest-facing API (§4.1).
    /// Library callers that want a `Result` should check
    /// `alloc.try_reserve` themselves and treat a `Nil` result as
    /// [`crate::error::ValueError::OutOfMemory`].
    pub fn try_string(alloc: &dyn Allocator, bytes: impl Into<Vec<u8>>) -> Value {
        let bytes = bytes.into();
        if !alloc.try_reserve(bytes.len()) {
            return Value::Nil;
        }
        Value::Str(Rc::new(bytes))
    }

    /// Accounted array construction, see [`Value::try_string`].
    pub fn try_array(alloc: &dyn Allocator, len: usize) -> Value {
        if !alloc.try_reserve(len * std::mem::size_of::<Value>()) {
            return Value::Nil;
        }
        Value::array(len)
    }

    /// Accounted table construction, see [`Value::try_string`].
    pub fn try_table(alloc: &dyn Allocator, len: usize) -> Value {
        if !alloc.try_reserve(len * std::mem::size_of::<(Value, Value)>()) {
            return Value::Nil;
        }
        Value::table(len)
    }

    /// Retains the value — an explicit alias for [`Clone::clone`], named to
    /// match `nn_retain`; bumps the `Rc` strong count for heap-backed
    /// variants and is free for the rest.
    pub fn retain(&self) -> Value {
        self.clone()
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn tag_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Int(_) => "int",
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
            Value::BorrowedStr(_) => "cstring",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Table(_) => "table",
        }
    }

    /// `toString`: yields bytes for `Str`/`BorrowedStr`; everything else
    /// returns `None` (the C API returned a null pointer here; the caller
    /// distinguishes `Nil` via tag inspection, same as the C version).
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Value::Str(s) => Some(s.as_ref().clone()),
            Value::BorrowedStr(s) => Some(s.as_bytes().to_vec()),
            _ => None,
        }
    }

    /// `toInt`: int/number convert losslessly for in-range values, bool is
    /// 0/1, everything else is 0.
    pub fn to_int(&self) -> i64 {
        match self {
            Value::Int(i) => *i,
            Value::Number(n) => *n as i64,
            Value::Bool(b) => *b as i64,
            _ => 0,
        }
    }

    /// `toNumber`: the numeric mirror of [`Value::to_int`].
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Int(i) => *i as f64,
            Value::Number(n) => *n,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }

    /// `toBoolean`: Nil is false, Bool is itself, everything else is true.
    pub fn to_bool(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            _ => true,
        }
    }

    /// Gets element `idx` of an array or table-key-pair-as-array view.
    /// Out-of-range or non-array values yield `Nil`.
    pub fn array_get(&self, idx: usize) -> Value {
        match self {
            Value::Array(a) => a.borrow().get(idx).cloned().unwrap_or(Value::Nil),
            _ => Value::Nil,
        }
    }

    /// Sets element `idx` of an array in place. No-op if out of range or
    /// not an array.
    pub fn array_set(&self, idx: usize, val: Value) {
        if let Value::Array(a) = self {
            if let Some(slot) = a.borrow_mut().get_mut(idx) {
                *slot = val;
            }
        }
    }

    pub fn array_len(&self) -> usize {
        match self {
            Value::Array(a) => a.borrow().len(),
            _ => 0,
        }
    }

    /// Gets pair `idx` of a table. Out-of-range yields `(Nil, Nil)`.
    pub fn table_get(&self, idx: usize) -> (Value, Value) {
        match self {
            Value::Table(t) => t
                .borrow()
                .get(idx)
                .cloned()
                .unwrap_or((Value::Nil, Value::Nil)),
            _ => (Value::Nil, Value::Nil),
        }
    }

    pub fn table_set(&self, idx: usize, key: Value, val: Value) {
        if let Value::Table(t) = self {
            if let Some(slot) = t.borrow_mut().get_mut(idx) {
                *slot = (key, val);
            }
        }
    }

    pub fn table_len(&self) -> usize {
        match self {
            Value::Table(t) => t.borrow().len(),
            _ => 0,
        }
    }

    /// The "packet size" used to bound signals, matching OpenComputers'
    /// measurement: nil -> 0, bool -> 2, int -> 6, number -> 10,
    /// string/cstring -> len + 4, arrays/tables recurse, +2 per container
    /// header.
    pub fn packet_size(&self) -> usize {
        match self {
            Value::Nil => 0,
            Value::Bool(_) => 2,
            Value::Int(_) => 6,
            Value::Number(_) => 10,
            Value::Str(s) => s.len() + 4,
            Value::BorrowedStr(s) => s.len() + 4,
            Value::Array(a) => {
                2 + a.borrow().iter().map(Value::packet_size).sum::<usize>()
            }
            Value::Table(t) => {
                2 + t
                    .borrow()
                    .iter()
                    .map(|(k, v)| k.packet_size() + v.packet_size())
                    .sum::<usize>()
            }
        }
    }
}

/// Measures the packet size of a whole signal payload — the sum of each
/// value's own `packet_size`, used by [`crate::limits::MAX_SIGNAL_SIZE`]
/// enforcement in the signal queue.
pub fn measure_packet_size(values: &[Value]) -> usize {
    values.iter().map(Value::packet_size).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_size_matches_formula() {
        assert_eq!(Value::Nil.packet_size(), 0);
        assert_eq!(Value::Bool(true).packet_size(), 2);
        assert_eq!(Value::Int(1).packet_size(), 6);
        assert_eq!(Value::Number(1.0).packet_size(), 10);
        assert_eq!(Value::string(b"hello".to_vec()).packet_size(), 9);
    }

    #[test]
    fn packet_size_recurses_with_header() {
        let arr = Value::array_from(vec![Value::Int(1), Value::Bool(false)]);
        // header (2) + int (6) + bool (2)
        assert_eq!(arr.packet_size(), 10);
    }

    #[test]
    fn retain_then_drop_is_a_no_op_on_contents() {
        let s = Value::string(b"abc".to_vec());
        let retained = s.retain();
        assert_eq!(retained.to_bytes(), Some(b"abc".to_vec()));
        drop(retained);
        // original is still valid.
        assert_eq!(s.to_bytes(), Some(b"abc".to_vec()));
    }

    #[test]
    fn coercions() {
        assert_eq!(Value::Bool(true).to_int(), 1);
        assert_eq!(Value::Int(5).to_number(), 5.0);
        assert!(Value::string(b"x".to_vec()).to_bool());
        assert!(!Value::Nil.to_bool());
        assert_eq!(Value::Int(3).to_bytes(), None);
    }

    #[test]
    fn try_string_returns_nil_on_accounting_failure() {
        use crate::alloc::BoundedAllocator;
        let alloc = BoundedAllocator::new(2);
        let v = Value::try_string(&alloc, b"too long".to_vec());
        assert!(v.is_nil());
    }

    #[test]
    fn array_get_set_out_of_range_is_nil() {
        let arr = Value::array(2);
        arr.array_set(0, Value::Int(42));
        assert_eq!(arr.array_get(0).to_int(), 42);
        assert!(arr.array_get(5).is_nil());
    }
}
