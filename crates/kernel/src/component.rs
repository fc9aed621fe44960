//! A component instance bound to a computer.
//!
//! Mirrors `nn_component` in `computer.c`: an address, a slot index, a
//! borrowed reference to its type's vtable, and opaque per-instance
//! state. Ownership of the state lives here; the table itself is shared
//! and outlives every component built from it.

use std::sync::Arc;

use crate::component_table::{ComponentState, ComponentTable};

/// One addressable peripheral instance.
///
/// `address` is empty exactly when the slot is a tombstone — see
/// [`crate::computer::Computer::new_component`] and
/// [`crate::computer::Computer::remove_component`].
pub struct Component {
    pub address: String,
    pub slot: usize,
    pub table: Arc<ComponentTable>,
    pub state: ComponentState,
}

impl Component {
    pub fn is_tombstone(&self) -> bool {
        self.address.is_empty()
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("address", &self.address)
            .field("slot", &self.slot)
            .field("type_name", &self.table.type_name)
            .finish()
    }
}
