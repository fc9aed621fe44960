//! # NeoNucleus core
//!
//! Value model, universe, and allocator abstraction shared by every
//! NeoNucleus crate.
//!
//! NeoNucleus is an embeddable emulation core for a fantasy-computer
//! runtime: a host embeds a [`universe::Universe`], registers component
//! tables and architectures against it, and drives computers forward one
//! tick at a time. This crate holds the pieces that sit underneath that —
//! the tagged [`value::Value`] model guest code and components exchange,
//! the [`alloc::Allocator`] accounting seam, the [`clock::Clock`]
//! abstraction, and the [`universe::Universe`] registry that ties a
//! process's computers together.
//!
//! ## Architecture
//!
//! - **Value**: a tagged, reference-counted value (nil/int/number/bool/
//!   string/array/table) exchanged between the kernel, components, and
//!   guest architectures.
//! - **Allocator**: a pluggable memory-accounting hook threaded through
//!   value construction and component backends.
//! - **Clock**: a swappable time source, real by default and frozen in
//!   test builds.
//! - **Universe**: the process-scoped registry a host creates once and
//!   shares across every computer it runs.
//!
//! ## Example
//!
//! ```rust
//! use neonucleus_core::universe::Universe;
//! use neonucleus_core::value::Value;
//!
//! let universe = Universe::default();
//! let greeting = Value::string(b"hello".to_vec());
//! assert_eq!(greeting.to_bytes(), Some(b"hello".to_vec()));
//! ```

pub mod alloc;
pub mod clock;
pub mod error;
pub mod limits;
pub mod universe;
pub mod value;

pub use alloc::Allocator;
pub use clock::Clock;
pub use error::ValueError;
pub use universe::Universe;
pub use value::Value;
