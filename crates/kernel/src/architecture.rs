//! The architecture interface: the embedder-supplied guest interpreter.
//!
//! The original `neonucleus.h` passes the embedder five function pointers
//! (`setup`/`teardown`/`getMemoryUsage`/`tick`/`serialize`/`deserialize`).
//! A trait is the idiomatic Rust replacement for a function-pointer
//! vtable supplied by the embedder (§9's "function-pointer vtables" note
//! applies here just as much as to component tables).

use crate::computer::{Computer, State};

/// A pluggable guest interpreter bound to a [`Computer`].
///
/// Implementors drive one tick of guest work per [`Architecture::tick`]
/// call and may invoke zero or more component methods through the
/// `Computer` they're handed. Serialization is opaque to the kernel: the
/// host persists and restores whatever bytes `serialize`/`deserialize`
/// produce and consume.
pub trait Architecture: std::fmt::Debug + Send + Sync {
    /// Called once during computer construction. Returning anything other
    /// than [`State::Setup`] aborts construction.
    fn setup(&mut self, computer: &mut Computer) -> State;

    /// Called when the computer is being destroyed or is switching away
    /// from this architecture.
    fn teardown(&mut self, computer: &mut Computer);

    /// Runs one bounded quantum of guest work, invoking component methods
    /// as needed through `computer`. Returns the state the computer should
    /// transition to.
    fn tick(&mut self, computer: &mut Computer) -> State;

    /// Current memory footprint of the architecture's own interpreter
    /// state (bytecode, guest heap, etc.), for `getComputerMemoryUsed`.
    fn get_memory_usage(&self) -> usize;

    /// Serializes the architecture's guest-visible program state to an
    /// opaque byte string, if this architecture supports persistence.
    fn serialize(&self, computer: &Computer) -> Option<Vec<u8>>;

    /// Restores state previously produced by `serialize`. Returns `false`
    /// if the bytes are rejected.
    fn deserialize(&mut self, computer: &mut Computer, bytes: &[u8]) -> bool;
}

/// Builds a fresh, freshly-`setup`-able architecture instance.
///
/// The C API's `supportedArch` list (`nn_addSupportedArchitecture`/
/// `nn_getSupportedArchitecture`) holds stateless vtables that many
/// computers can share, each instantiating its own opaque `archState` at
/// `setup` time. A trait object combining vtable and state in one
/// `&mut self` (as [`Architecture`] does, per §4.7) can't play that same
/// shared-vtable role directly, so the "supported architecture" a
/// computer registers is a factory that produces a fresh
/// [`Architecture`] instance on demand — the same pattern as a
/// [`crate::component_table::ConstructorFn`], generalized to architectures.
pub type ArchitectureFactory = std::sync::Arc<dyn Fn() -> Box<dyn Architecture> + Send + Sync>;
