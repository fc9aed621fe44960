//! Error taxonomy surfaced through a computer's error slot.
//!
//! Matches §7's taxonomy: argument errors, resource errors, state errors,
//! and backend errors. Backend errors are opaque strings by the time they
//! reach here (§9's two-tier design: backends report into a bounded
//! buffer, the kernel copies that into the error slot), so this enum only
//! needs to cover the errors the kernel itself raises.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    #[error("too many signals")]
    TooManySignals,
    #[error("too many values")]
    TooManyValues,
    #[error("too big")]
    TooBig,
    #[error("missing event")]
    MissingEvent,
    #[error("too many users")]
    TooManyUsers,
    #[error("out of memory")]
    OutOfMemory,
    #[error("readonly")]
    ReadOnly,
    #[error("{0}")]
    Backend(String),
}

impl KernelError {
    /// The message stored in the computer's error slot, matching the
    /// lowercase, unpunctuated style of the original C string literals.
    pub fn message(&self) -> String {
        self.to_string()
    }
}
