//! Error taxonomy for value construction failures.
//!
//! Matches the "out of memory" sentinel the C API returns as a `Nil` value
//! from `nn_values_string`/`nn_values_array`/`nn_values_table` — here it's
//! a proper `Result` for library callers, alongside the Nil-returning path
//! kept for guest-call compatibility (see `value::Value` constructors).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("out of memory")]
    OutOfMemory,
}
