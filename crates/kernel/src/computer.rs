//! The computer kernel: architecture lifecycle, component array, signal
//! queue, call frame, error slot, and energy/thermal accounting.
//!
//! Grounded on `computer.c`'s `nn_computer` struct and on the
//! `ExecutionEngine`/`ApplicationEngine` split (construction, a `tick`
//! entry point, and a host-visible state result) — generalized from a
//! single blockchain-script state machine to the Setup/Running/Busy/
//! Blackout/Closing/Repeat/Switch/Overworked state machine below.

use std::any::Any;
use std::sync::Arc;

use neonucleus_core::limits::{MAX_ARCHITECTURES, MAX_ARGS, MAX_RETS, MAX_USERS, OVERHEAT_MIN};
use neonucleus_core::universe::Universe;
use neonucleus_core::value::Value;

use crate::architecture::{Architecture, ArchitectureFactory};
use crate::component::Component;
use crate::component_table::ComponentTable;
use crate::error::KernelError;
use crate::resource::{ResourceCharge, ResourceSimulator};
use crate::signal::SignalQueue;

/// Host-visible computer state, matching §6's fixed integer encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum State {
    Setup = 0,
    Running = 1,
    Busy = 2,
    Blackout = 3,
    Closing = 4,
    Repeat = 5,
    Switch = 6,
    Overworked = 7,
}

/// The error slot: unset, a borrowed static string (never freed), or an
/// owned string (freed on clear). Matches `setError`/`setCError` in §4.4
/// and the two-tier error design in §9.
#[derive(Debug, Clone, Default)]
pub enum ErrorSlot {
    #[default]
    None,
    Borrowed(&'static str),
    Owned(String),
}

impl ErrorSlot {
    pub fn message(&self) -> Option<&str> {
        match self {
            ErrorSlot::None => None,
            ErrorSlot::Borrowed(s) => Some(s),
            ErrorSlot::Owned(s) => Some(s.as_str()),
        }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, ErrorSlot::None)
    }
}

/// An owning, tick-driven computer instance.
pub struct Computer {
    universe: Arc<Universe>,
    address: String,
    architecture: Box<dyn Architecture>,
    next_architecture: Option<Box<dyn Architecture>>,
    supported_architectures: Vec<ArchitectureFactory>,

    components: Vec<Option<Component>>,
    component_len: usize,

    signals: SignalQueue,
    users: Vec<String>,
    error: ErrorSlot,

    energy: f64,
    max_energy: f64,
    temperature: f64,
    room_temperature: f64,
    temperature_coefficient: f64,

    call_cost: f64,
    call_budget: f64,

    state: State,
    time_offset: f64,
    tick_count: u64,

    args: Vec<Value>,
    rets: Vec<Value>,
    tmp_address: Option<String>,

    resource_simulator: ResourceSimulator,

    memory_limit: usize,
    userdata: Box<dyn Any>,
}

impl Computer {
    /// Construction per §4.4: allocates the component array, duplicates
    /// the address, sets the documented defaults, then runs the
    /// architecture's `setup`. A non-`Setup` return from `setup` is
    /// reported to the caller as a construction failure — there's
    /// nothing to unwind in the Rust version since every intermediate
    /// allocation is owned by `self` and drops automatically on `Err`.
    pub fn new(
        universe: Arc<Universe>,
        address: impl Into<String>,
        mut architecture: Box<dyn Architecture>,
        userdata: Box<dyn Any>,
        memory_limit: usize,
        component_cap: usize,
    ) -> Result<Self, State> {
        let mut computer = Computer {
            universe,
            address: address.into(),
            architecture: Box::new(NullArchitecture),
            next_architecture: None,
            supported_architectures: Vec::new(),
            components: (0..component_cap).map(|_| None).collect(),
            component_len: 0,
            signals: SignalQueue::new(),
            users: Vec::new(),
            error: ErrorSlot::None,
            energy: 0.0,
            max_energy: 5000.0,
            temperature: 30.0,
            room_temperature: 30.0,
            temperature_coefficient: 1.0,
            call_cost: 0.0,
            call_budget: 256.0,
            state: State::Setup,
            time_offset: 0.0,
            tick_count: 0,
            args: Vec::new(),
            rets: Vec::new(),
            tmp_address: None,
            resource_simulator: ResourceSimulator::default(),
            memory_limit,
            userdata,
        };
        let setup_state = architecture.setup(&mut computer);
        computer.architecture = architecture;
        if setup_state != State::Setup {
            return Err(setup_state);
        }
        Ok(computer)
    }

    pub fn universe(&self) -> &Arc<Universe> {
        &self.universe
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn uptime(&self) -> f64 {
        self.universe.now() - self.time_offset
    }

    /// `getComputerMemoryUsed`: delegates to the active architecture's
    /// own accounting of its guest-visible memory footprint.
    pub fn memory_used(&self) -> usize {
        self.architecture.get_memory_usage()
    }

    /// `getComputerMemoryTotal`: the limit fixed at construction.
    pub fn memory_total(&self) -> usize {
        self.memory_limit
    }

    /// `getComputerUserData`: the opaque embedder value handed to
    /// [`Computer::new`], downcast to whatever concrete type the
    /// embedder knows it stored.
    pub fn userdata(&self) -> &(dyn Any + 'static) {
        self.userdata.as_ref()
    }

    pub fn userdata_mut(&mut self) -> &mut (dyn Any + 'static) {
        self.userdata.as_mut()
    }

    /// `tick`: zero `callCost`, enter Running, clear the error slot,
    /// invoke the architecture, and return the resulting state. A
    /// `Setup -> Running` transition on the very first tick happens
    /// implicitly since `state` is set to `Running` unconditionally here.
    pub fn tick(&mut self) -> State {
        self.call_cost = 0.0;
        self.state = State::Running;
        self.error = ErrorSlot::None;
        self.tick_count += 1;
        log::trace!("computer {}: tick {} starting", self.address, self.tick_count);

        // The architecture's return value is only a request: it takes
        // effect solely if dispatch left the computer in `Running` — a
        // component that already moved the state to Busy/Overworked/
        // Blackout mid-tick (via `set_busy`/`charge_call_budget`/
        // `remove_energy`) must not have that transition clobbered by
        // whatever the architecture happens to return afterwards. This
        // matches `nn_tickComputer` ignoring `arch->tick`'s return
        // entirely and just reporting whatever `computer->state` ended up
        // being after the architecture mutated it directly.
        let requested = self.architecture.tick(self);
        if self.state == State::Running {
            self.state = requested;
        }

        match self.state {
            State::Overworked => log::debug!("computer {}: overworked at tick {}", self.address, self.tick_count),
            State::Blackout => log::debug!("computer {}: blackout at tick {}", self.address, self.tick_count),
            State::Busy => log::trace!("computer {}: busy, host should retry", self.address),
            State::Switch => log::debug!(
                "computer {}: requested architecture switch, host must destroy and recreate",
                self.address
            ),
            _ => {}
        }

        self.state
    }

    /// `setNextArchitecture`: the architecture (or the guest, through it)
    /// calls this before returning [`State::Switch`] from `tick`. The
    /// kernel does *not* perform the swap itself — §4.7 is explicit that
    /// the host destroys this computer and recreates it with whatever
    /// [`Computer::next_architecture`] holds at that point.
    pub fn set_next_architecture(&mut self, next: Box<dyn Architecture>) {
        self.next_architecture = Some(next);
    }

    /// The architecture instance queued by `setNextArchitecture`, for the
    /// host to read after observing [`State::Switch`] and before
    /// recreating the computer. Returns `None` if nothing was queued.
    pub fn next_architecture(&mut self) -> Option<Box<dyn Architecture>> {
        self.next_architecture.take()
    }

    /// `addSupportedArchitecture`: registers a factory the guest can later
    /// select by index to build the next architecture to switch to.
    /// Past [`MAX_ARCHITECTURES`] entries, the call is silently dropped
    /// (§3: at most 16 supported, same capping discipline as components
    /// and methods elsewhere in the kernel).
    pub fn add_supported_architecture(&mut self, factory: ArchitectureFactory) {
        if self.supported_architectures.len() >= MAX_ARCHITECTURES {
            return;
        }
        self.supported_architectures.push(factory);
    }

    /// `getSupportedArchitecture`: `None` if `idx` is out of range.
    pub fn get_supported_architecture(&self, idx: usize) -> Option<&ArchitectureFactory> {
        self.supported_architectures.get(idx)
    }

    pub fn supported_architecture_count(&self) -> usize {
        self.supported_architectures.len()
    }

    // ---- Components -----------------------------------------------

    /// `newComponent`: reuses a tombstoned slot if one exists, otherwise
    /// appends up to `component_cap`. Returns the new address, or `None`
    /// if the array is full.
    pub fn new_component(
        &mut self,
        table: Arc<ComponentTable>,
        table_userdata: &dyn Any,
        component_userdata: &dyn Any,
        address: impl Into<String>,
    ) -> Option<String> {
        let address = address.into();
        let state = table
            .constructor()
            .map(|ctor| ctor(table_userdata, component_userdata))
            .unwrap_or_else(|| Box::new(()));

        let slot = self.components.iter().position(|c| c.is_none())?;

        self.components[slot] = Some(Component {
            address: address.clone(),
            slot,
            table,
            state,
        });
        if slot >= self.component_len {
            self.component_len = slot + 1;
        }
        Some(address)
    }

    /// `removeComponent`: tombstones the slot (empties the address) after
    /// invoking the table's destructor, if any. `component_len` is never
    /// decremented — it is a high-water mark, per §3.
    pub fn remove_component(&mut self, address: &str) -> bool {
        if let Some(slot) = self.components.iter().position(|c| {
            c.as_ref().map(|c| c.address == address).unwrap_or(false)
        }) {
            if let Some(component) = &mut self.components[slot] {
                if let Some(dtor) = component.table.destructor() {
                    dtor(&mut component.state);
                }
            }
            self.components[slot] = None;
            true
        } else {
            false
        }
    }

    pub fn find_component(&self, address: &str) -> Option<&Component> {
        self.components
            .iter()
            .flatten()
            .find(|c| c.address == address)
    }

    pub fn find_component_mut(&mut self, address: &str) -> Option<&mut Component> {
        self.components
            .iter_mut()
            .flatten()
            .find(|c| c.address == address)
    }

    /// Live components, skipping tombstones, in slot order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.iter().flatten()
    }

    pub fn component_len(&self) -> usize {
        self.component_len
    }

    /// `invokeComponentMethod`: looks up `address`, then dispatches
    /// `name` through its table. Returns `None` if the component or the
    /// method doesn't exist.
    ///
    /// The component is temporarily taken out of the component array so
    /// its handler can receive `&mut Computer` (for resource charging and
    /// allocator access) alongside its own state without aliasing `self`.
    ///
    /// On `Err`, the message is also copied into the computer's error slot
    /// before returning (§4.5 step 5: "surface it as the computer's error"),
    /// matching the two-tier error design in §9 — callers don't need to
    /// re-propagate the error themselves to make it guest-visible.
    pub fn invoke_component_method(
        &mut self,
        address: &str,
        name: &str,
    ) -> Option<Result<Vec<Value>, KernelError>> {
        let args = self.args.clone();
        let slot = self.components.iter().position(|c| {
            c.as_ref().map(|c| c.address == address).unwrap_or(false)
        })?;
        let mut component = self.components[slot].take()?;
        let table = Arc::clone(&component.table);
        let result = table.invoke(&mut component.state, name, self, &args);
        self.components[slot] = Some(component);
        if let Some(Err(ref e)) = result {
            self.set_error(e.message());
        }
        result
    }

    // ---- Signals ----------------------------------------------------

    pub fn push_signal(&mut self, values: &[Value]) -> Result<(), KernelError> {
        self.signals.push(values)
    }

    pub fn fetch_signal_value(&self, index: usize) -> Value {
        self.signals.fetch_value(index)
    }

    pub fn signal_size(&self) -> usize {
        self.signals.size()
    }

    pub fn pop_signal(&mut self) -> bool {
        self.signals.pop()
    }

    // ---- Call frame ---------------------------------------------------

    /// `resetCall`: drops args and rets and zeros their counts. Must be
    /// called by the host between invocations (§4.4).
    pub fn reset_call(&mut self) {
        self.args.clear();
        self.rets.clear();
    }

    pub fn add_argument(&mut self, value: Value) {
        if self.args.len() < MAX_ARGS {
            self.args.push(value);
        }
    }

    pub fn get_argument(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or(Value::Nil)
    }

    pub fn argc(&self) -> usize {
        self.args.len()
    }

    /// `return`: `push_return` avoids colliding with the Rust keyword.
    pub fn push_return(&mut self, value: Value) {
        if self.rets.len() < MAX_RETS {
            self.rets.push(value);
        }
    }

    pub fn get_return(&self, index: usize) -> Value {
        self.rets.get(index).cloned().unwrap_or(Value::Nil)
    }

    pub fn retc(&self) -> usize {
        self.rets.len()
    }

    // ---- Error slot ---------------------------------------------------

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = ErrorSlot::Owned(message.into());
    }

    pub fn set_c_error(&mut self, message: &'static str) {
        self.error = ErrorSlot::Borrowed(message);
    }

    pub fn clear_error(&mut self) {
        self.error = ErrorSlot::None;
    }

    pub fn error(&self) -> &ErrorSlot {
        &self.error
    }

    // ---- Users ----------------------------------------------------

    /// `addUser`: rejects once the list is at `MAX_USERS`.
    pub fn add_user(&mut self, name: impl Into<String>) -> bool {
        if self.users.len() >= MAX_USERS {
            return false;
        }
        self.users.push(name.into());
        true
    }

    /// `isUser`: an empty list means unrestricted access.
    pub fn is_user(&self, name: &str) -> bool {
        self.users.is_empty() || self.users.iter().any(|u| u == name)
    }

    /// `deleteUser`: removes every matching entry in one pass.
    pub fn delete_user(&mut self, name: &str) {
        self.users.retain(|u| u != name);
    }

    pub fn users(&self) -> &[String] {
        &self.users
    }

    // ---- Energy & heat ----------------------------------------------

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn max_energy(&self) -> f64 {
        self.max_energy
    }

    pub fn set_max_energy(&mut self, max_energy: f64) {
        self.max_energy = max_energy;
        self.energy = self.energy.min(self.max_energy);
    }

    /// `removeEnergy`: clamps at zero; transitions to Blackout if the
    /// debit would have gone negative.
    pub fn remove_energy(&mut self, amount: f64) {
        if amount > self.energy {
            self.energy = 0.0;
            self.state = State::Blackout;
            log::warn!("computer {}: insufficient energy, blackout", self.address);
        } else {
            self.energy -= amount;
        }
    }

    /// `addEnergy`: clamps at `max_energy`.
    pub fn add_energy(&mut self, amount: f64) {
        self.energy = (self.energy + amount).min(self.max_energy);
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn room_temperature(&self) -> f64 {
        self.room_temperature
    }

    pub fn set_room_temperature(&mut self, room_temperature: f64) {
        self.room_temperature = room_temperature;
        self.temperature = self.temperature.max(self.room_temperature);
    }

    pub fn temperature_coefficient(&self) -> f64 {
        self.temperature_coefficient
    }

    pub fn set_temperature_coefficient(&mut self, coefficient: f64) {
        self.temperature_coefficient = coefficient;
    }

    /// `addHeat`: scaled by the thermal coefficient, floored at
    /// `room_temperature`.
    pub fn add_heat(&mut self, heat: f64) {
        self.temperature =
            (self.temperature + heat * self.temperature_coefficient).max(self.room_temperature);
    }

    /// `removeHeat`: unscaled, floored at `room_temperature`.
    pub fn remove_heat(&mut self, heat: f64) {
        self.temperature = (self.temperature - heat).max(self.room_temperature);
    }

    /// `isOverheating`: compares absolute temperature against the fixed
    /// [`OVERHEAT_MIN`] threshold, matching `nn_isOverheating`'s
    /// `temperature > NN_OVERHEAT_MIN` exactly (no offset by room
    /// temperature, strict inequality).
    pub fn is_overheating(&self) -> bool {
        self.temperature > OVERHEAT_MIN
    }

    // ---- Call budget ----------------------------------------------

    pub fn call_budget(&self) -> f64 {
        self.call_budget
    }

    pub fn set_call_budget(&mut self, budget: f64) {
        self.call_budget = budget;
    }

    pub fn call_cost(&self) -> f64 {
        self.call_cost
    }

    /// Charges `cost` against the call budget, transitioning to
    /// Overworked if it's crossed. Called by backend dispatch after a
    /// successful operation (§4.5 step 6) and by the default per-call
    /// charge (`CALL_COST`) any dispatcher applies uniformly.
    pub fn charge_call_budget(&mut self, cost: f64) {
        self.call_cost += cost;
        if self.call_cost >= self.call_budget {
            self.state = State::Overworked;
        }
    }

    /// Applies a combined resource charge from a backend dispatch: energy
    /// drain (may cause Blackout), heat, a busy-wait over a random draw in
    /// `charge.latency`'s bounds (if set), and call-budget cost.
    pub fn charge(&mut self, charge: ResourceCharge) {
        self.remove_energy(charge.energy);
        self.add_heat(charge.heat);
        if let Some((min, max)) = charge.latency {
            let seconds = self.resource_simulator.random_latency(min, max);
            self.resource_simulator.busy_sleep(seconds);
        }
        self.charge_call_budget(charge.call_budget);
    }

    /// The latency/randomness source used by [`Computer::charge`]. Swap it
    /// with [`crate::resource::NoLatency`] in test builds to skip real
    /// busy-waiting.
    pub fn resource_simulator(&self) -> &ResourceSimulator {
        &self.resource_simulator
    }

    pub fn set_resource_simulator(&mut self, simulator: ResourceSimulator) {
        self.resource_simulator = simulator;
    }

    /// Transitions to [`State::Busy`]: a component couldn't acquire a
    /// shared resource (here, a buffered-indirect throughput budget) this
    /// tick. The host is expected to yield and re-invoke the same method
    /// call next tick (§4.4, §4.6).
    pub fn set_busy(&mut self) {
        self.state = State::Busy;
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn tmp_address(&self) -> Option<&str> {
        self.tmp_address.as_deref()
    }

    pub fn set_tmp_address(&mut self, address: Option<String>) {
        self.tmp_address = address;
    }
}

impl std::fmt::Debug for Computer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computer")
            .field("address", &self.address)
            .field("state", &self.state)
            .field("energy", &self.energy)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// A placeholder architecture used only as a swap target while
/// [`Computer::new`] is mid-construction — never observed by callers.
#[derive(Debug, Default)]
struct NullArchitecture;

impl Architecture for NullArchitecture {
    fn setup(&mut self, _computer: &mut Computer) -> State {
        State::Setup
    }
    fn teardown(&mut self, _computer: &mut Computer) {}
    fn tick(&mut self, _computer: &mut Computer) -> State {
        State::Running
    }
    fn get_memory_usage(&self) -> usize {
        0
    }
    fn serialize(&self, _computer: &Computer) -> Option<Vec<u8>> {
        None
    }
    fn deserialize(&mut self, _computer: &mut Computer, _bytes: &[u8]) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neonucleus_core::alloc::UnboundedAllocator;

    #[derive(Debug, Default)]
    struct TestArchitecture;

    impl Architecture for TestArchitecture {
        fn setup(&mut self, _computer: &mut Computer) -> State {
            State::Setup
        }
        fn teardown(&mut self, _computer: &mut Computer) {}
        fn tick(&mut self, _computer: &mut Computer) -> State {
            State::Running
        }
        fn get_memory_usage(&self) -> usize {
            0
        }
        fn serialize(&self, _computer: &Computer) -> Option<Vec<u8>> {
            Some(b"state".to_vec())
        }
        fn deserialize(&mut self, _computer: &mut Computer, bytes: &[u8]) -> bool {
            bytes == b"state"
        }
    }

    fn test_computer() -> Computer {
        let universe = Arc::new(Universe::new(Arc::new(UnboundedAllocator::default())));
        Computer::new(universe, "addr-1", Box::new(TestArchitecture), Box::new(()), 0, 4).unwrap()
    }

    #[test]
    fn memory_limit_and_userdata_roundtrip() {
        let universe = Arc::new(Universe::new(Arc::new(UnboundedAllocator::default())));
        let mut c = Computer::new(
            universe,
            "addr-1",
            Box::new(TestArchitecture),
            Box::new(42u32),
            65536,
            4,
        )
        .unwrap();
        assert_eq!(c.memory_total(), 65536);
        assert_eq!(c.memory_used(), 0);
        assert_eq!(c.userdata().downcast_ref::<u32>(), Some(&42));
        *c.userdata_mut().downcast_mut::<u32>().unwrap() = 7;
        assert_eq!(c.userdata().downcast_ref::<u32>(), Some(&7));
    }

    #[test]
    fn energy_bookkeeping_s1() {
        let mut c = test_computer();
        c.add_energy(100.0);
        c.set_max_energy(200.0);
        c.remove_energy(30.0);
        assert_eq!(c.energy(), 70.0);
        assert_eq!(c.state(), State::Running);
        c.remove_energy(80.0);
        assert_eq!(c.energy(), 0.0);
        assert_eq!(c.state(), State::Blackout);
        c.add_energy(500.0);
        assert_eq!(c.energy(), 200.0);
    }

    #[test]
    fn switch_leaves_architecture_swap_to_the_host() {
        #[derive(Debug, Default)]
        struct SwitchingArchitecture;
        impl Architecture for SwitchingArchitecture {
            fn setup(&mut self, _c: &mut Computer) -> State {
                State::Setup
            }
            fn teardown(&mut self, _c: &mut Computer) {}
            fn tick(&mut self, c: &mut Computer) -> State {
                c.set_next_architecture(Box::new(TestArchitecture));
                State::Switch
            }
            fn get_memory_usage(&self) -> usize {
                0
            }
            fn serialize(&self, _c: &Computer) -> Option<Vec<u8>> {
                None
            }
            fn deserialize(&mut self, _c: &mut Computer, _bytes: &[u8]) -> bool {
                false
            }
        }

        let universe = Arc::new(Universe::new(Arc::new(UnboundedAllocator::default())));
        let mut c =
            Computer::new(universe, "addr-1", Box::new(SwitchingArchitecture), Box::new(()), 0, 4).unwrap();
        assert_eq!(c.tick(), State::Switch);
        // the kernel does not perform the swap itself; the host must pull
        // the queued architecture out and recreate the computer with it.
        assert!(c.next_architecture().is_some());
        assert!(c.next_architecture().is_none());
    }

    #[test]
    fn supported_architectures_cap_at_max_architectures() {
        let mut c = test_computer();
        let factory: crate::architecture::ArchitectureFactory =
            Arc::new(|| Box::new(TestArchitecture) as Box<dyn Architecture>);
        for _ in 0..neonucleus_core::limits::MAX_ARCHITECTURES + 3 {
            c.add_supported_architecture(Arc::clone(&factory));
        }
        assert_eq!(c.supported_architecture_count(), neonucleus_core::limits::MAX_ARCHITECTURES);
        assert!(c.get_supported_architecture(0).is_some());
        assert!(c.get_supported_architecture(neonucleus_core::limits::MAX_ARCHITECTURES).is_none());
    }

    #[test]
    fn heat_floors_at_room_temperature() {
        let mut c = test_computer();
        c.remove_heat(1000.0);
        assert_eq!(c.temperature(), c.room_temperature());
        c.add_heat(50.0);
        assert!(c.temperature() >= c.room_temperature());
    }

    #[test]
    fn call_budget_crossing_sets_overworked() {
        let mut c = test_computer();
        c.set_call_budget(10.0);
        c.tick();
        c.charge_call_budget(11.0);
        assert_eq!(c.state(), State::Overworked);
    }

    #[test]
    fn add_argument_is_a_no_op_past_cap() {
        let mut c = test_computer();
        for i in 0..MAX_ARGS + 2 {
            c.add_argument(Value::int(i as i64));
        }
        assert_eq!(c.argc(), MAX_ARGS);
        assert!(c.get_argument(MAX_ARGS).is_nil());
    }

    #[test]
    fn user_list_empty_means_unrestricted() {
        let mut c = test_computer();
        assert!(c.is_user("anyone"));
        c.add_user("alice");
        assert!(!c.is_user("bob"));
        assert!(c.is_user("alice"));
        c.delete_user("alice");
        assert!(c.is_user("bob"));
    }

    #[test]
    fn component_slot_reuse_s6() {
        let mut c = test_computer();
        let table = Arc::new(ComponentTable::new("NN:TEST"));
        let a = c.new_component(Arc::clone(&table), &(), &(), "A").unwrap();
        let _b = c.new_component(Arc::clone(&table), &(), &(), "B").unwrap();
        let _c_addr = c.new_component(Arc::clone(&table), &(), &(), "C").unwrap();
        assert_eq!(c.component_len(), 3);

        c.remove_component("B");
        let d = c.new_component(Arc::clone(&table), &(), &(), "D").unwrap();

        let addrs: Vec<&str> = c.components().map(|comp| comp.address.as_str()).collect();
        assert_eq!(addrs.len(), 3);
        assert!(addrs.contains(&a.as_str()));
        assert!(addrs.contains(&d.as_str()));
        assert_eq!(c.component_len(), 3);
    }

    #[test]
    fn error_slot_distinguishes_owned_and_borrowed() {
        let mut c = test_computer();
        c.set_c_error("readonly");
        assert_eq!(c.error().message(), Some("readonly"));
        c.clear_error();
        assert!(!c.error().is_set());
        c.set_error(format!("bad argument #{}", 1));
        assert_eq!(c.error().message(), Some("bad argument #1"));
    }

    #[test]
    fn invoke_component_method_surfaces_backend_errors_into_the_error_slot() {
        let mut c = test_computer();
        let mut table = ComponentTable::new("NN:TEST");
        table.define_method(
            "fail",
            true,
            "",
            None,
            Arc::new(|_s, _u, _c, _a| Err(KernelError::Backend("readonly".to_string()))),
        );
        let address = c.new_component(Arc::new(table), &(), &(), "A").unwrap();
        let result = c.invoke_component_method(&address, "fail").unwrap();
        assert!(result.is_err());
        assert_eq!(c.error().message(), Some("readonly"));
    }
}
