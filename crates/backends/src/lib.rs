//! Reference component backends for NeoNucleus: EEPROM, filesystem, and
//! drive — the three vtable shapes `neonucleus.h` fixes
//! (`nn_eeprom`/`nn_filesystem`/`nn_drive`) plus small in-memory
//! implementations of each, used by the kernel's own test suite and
//! available to embedders that don't need real persistent storage.
//!
//! Concrete production backends (real disk I/O, persistence, etc.) are
//! left to embedders. This crate fixes the interface and the dispatch
//! discipline (`crate::path`, `crate::crc`, `crate::shared`) that any
//! real backend plugs into.

pub mod crc;
pub mod drive;
pub mod eeprom;
pub mod filesystem;
pub mod path;
pub mod shared;

pub use drive::{DriveConfig, DriveOps, InMemoryDrive};
pub use eeprom::{EepromConfig, EepromOps, InMemoryEeprom};
pub use filesystem::{FilesystemConfig, FilesystemOps, InMemoryFilesystem};
pub use shared::{Deinit, Shared};
