//! # NeoNucleus kernel
//!
//! The computer kernel: architecture lifecycle, component dispatch,
//! resource simulation, and the signal queue.
//!
//! A [`computer::Computer`] ties together an [`architecture::Architecture`]
//! (the guest interpreter), an array of [`component::Component`] instances
//! dispatched through [`component_table::ComponentTable`] vtables, a
//! [`signal::SignalQueue`], and the energy/heat/call-budget accounting
//! that makes guest programs experience the same economic pressure as
//! real OpenComputers hardware. [`resource::ResourceSimulator`] supplies
//! the busy-wait latency and buffered-indirect throttling backend
//! dispatch charges on top of that.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use neonucleus_core::alloc::UnboundedAllocator;
//! use neonucleus_core::universe::Universe;
//! use neonucleus_kernel::architecture::Architecture;
//! use neonucleus_kernel::computer::{Computer, State};
//!
//! #[derive(Debug, Default)]
//! struct NoopArchitecture;
//!
//! impl Architecture for NoopArchitecture {
//!     fn setup(&mut self, _c: &mut Computer) -> State { State::Setup }
//!     fn teardown(&mut self, _c: &mut Computer) {}
//!     fn tick(&mut self, _c: &mut Computer) -> State { State::Running }
//!     fn get_memory_usage(&self) -> usize { 0 }
//!     fn serialize(&self, _c: &Computer) -> Option<Vec<u8>> { None }
//!     fn deserialize(&mut self, _c: &mut Computer, _bytes: &[u8]) -> bool { false }
//! }
//!
//! let universe = Arc::new(Universe::new(Arc::new(UnboundedAllocator::default())));
//! let mut computer =
//!     Computer::new(universe, "addr-1", Box::new(NoopArchitecture), Box::new(()), 0, 16).unwrap();
//! assert_eq!(computer.tick(), State::Running);
//! ```

pub mod architecture;
pub mod component;
pub mod component_table;
pub mod computer;
pub mod error;
pub mod resource;
pub mod signal;

pub use architecture::{Architecture, ArchitectureFactory};
pub use component::Component;
pub use component_table::ComponentTable;
pub use computer::{Computer, State};
pub use error::KernelError;
pub use resource::ResourceSimulator;
