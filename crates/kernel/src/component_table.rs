//! Per-component-type vtable: type name, lifecycle hooks, and a
//! name-dispatched method list.
//!
//! Grounded on the name->callable registry pattern in
//! `InteropService`/`InteropDescriptor` (the Neo VM's own answer to "how
//! do you replace a C function-pointer table with something idiomatic"),
//! generalized from a single global table to one table per component
//! type as §4.3/§9 call for.

use std::any::Any;
use std::sync::Arc;

use neonucleus_core::value::Value;

use crate::computer::Computer;
use crate::error::KernelError;

/// Component-instance state, boxed so each component type can carry
/// whatever shape it needs; methods downcast through [`Any`].
pub type ComponentState = Box<dyn Any + Send + Sync>;

/// Builds a component's initial state from constructor userdata supplied
/// at table-registration time and at `newComponent` time.
pub type ConstructorFn =
    Arc<dyn Fn(&dyn Any, &dyn Any) -> ComponentState + Send + Sync>;

/// Runs once when a component is removed, after which the state is
/// dropped by ordinary Rust drop glue.
pub type DestructorFn = Arc<dyn Fn(&mut ComponentState) + Send + Sync>;

/// A single vtable entry. The handler receives the component's boxed
/// state, this method's userdata (if any), the owning computer (for
/// resource charging and allocator access), and the call's arguments; it
/// returns zero or more values or a [`KernelError`] to surface through
/// the computer's error slot.
pub type MethodHandler = Arc<
    dyn Fn(&mut ComponentState, Option<&dyn Any>, &mut Computer, &[Value]) -> Result<Vec<Value>, KernelError>
        + Send
        + Sync,
>;

#[derive(Clone)]
pub struct MethodDescriptor {
    pub name: String,
    /// Cheap enough to run synchronously (true) vs. subject to
    /// buffered-indirect throttling (false). See §4.3 and §4.6.
    pub direct: bool,
    pub doc: &'static str,
    pub userdata: Option<Arc<dyn Any + Send + Sync>>,
    handler: MethodHandler,
}

/// A component type's vtable: stable name, optional constructor/destructor,
/// and up to [`neonucleus_core::limits::MAX_METHODS`] named methods.
pub struct ComponentTable {
    pub type_name: String,
    constructor: Option<ConstructorFn>,
    destructor: Option<DestructorFn>,
    methods: Vec<MethodDescriptor>,
}

impl ComponentTable {
    pub fn new(type_name: impl Into<String>) -> Self {
        ComponentTable {
            type_name: type_name.into(),
            constructor: None,
            destructor: None,
            methods: Vec::new(),
        }
    }

    pub fn with_constructor(mut self, ctor: ConstructorFn) -> Self {
        self.constructor = Some(ctor);
        self
    }

    pub fn with_destructor(mut self, dtor: DestructorFn) -> Self {
        self.destructor = Some(dtor);
        self
    }

    pub fn constructor(&self) -> Option<&ConstructorFn> {
        self.constructor.as_ref()
    }

    pub fn destructor(&self) -> Option<&DestructorFn> {
        self.destructor.as_ref()
    }

    /// Appends a method. Past [`neonucleus_core::limits::MAX_METHODS`]
    /// entries the call is silently dropped (§4.3); a name collision with
    /// an existing entry replaces it in place (last-write-wins, which is
    /// how legacy aliases like `makeReadOnly`/`makeReadonly` are modeled —
    /// register the canonical name first, then the alias).
    pub fn define_method(
        &mut self,
        name: impl Into<String>,
        direct: bool,
        doc: &'static str,
        userdata: Option<Arc<dyn Any + Send + Sync>>,
        handler: MethodHandler,
    ) {
        let name = name.into();
        if let Some(existing) = self.methods.iter_mut().find(|m| m.name == name) {
            existing.direct = direct;
            existing.doc = doc;
            existing.userdata = userdata;
            existing.handler = handler;
            return;
        }
        if self.methods.len() >= neonucleus_core::limits::MAX_METHODS {
            return;
        }
        self.methods.push(MethodDescriptor {
            name,
            direct,
            doc,
            userdata,
            handler,
        });
    }

    /// Aliases `alias` to the same handler currently registered under
    /// `canonical`. No-op if `canonical` isn't registered.
    pub fn alias_method(&mut self, canonical: &str, alias: impl Into<String>) {
        if let Some(found) = self.methods.iter().find(|m| m.name == canonical).cloned() {
            self.define_method(alias, found.direct, found.doc, found.userdata, found.handler);
        }
    }

    /// Introspection: the full method list, for guests that enumerate a
    /// component's surface.
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// `invokeComponentMethod`: linear search by name, then call. Returns
    /// `None` if no such method exists (the caller maps that to a boolean
    /// false return, matching §4.3).
    pub fn invoke(
        &self,
        state: &mut ComponentState,
        name: &str,
        computer: &mut Computer,
        args: &[Value],
    ) -> Option<Result<Vec<Value>, KernelError>> {
        let method = self.find_method(name)?;
        log::trace!("dispatching {}::{name}", self.type_name);
        let userdata = method.userdata.as_deref();
        Some((method.handler)(state, userdata, computer, args))
    }
}

impl std::fmt::Debug for ComponentTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentTable")
            .field("type_name", &self.type_name)
            .field("methods", &self.methods.iter().map(|m| &m.name).collect::<Vec<_>>())
            .finish()
    }
}
