//! EEPROM component: vtable trait, simulated-physical configuration,
//! dispatch wiring, and an in-memory reference implementation.
//!
//! Grounded on `nn_eeprom`/`nn_loadEepromTable` in
//! `examples/original_source/src/components/eeprom.c`: each method
//! validates arguments, locks the backend, calls the corresponding
//! [`EepromOps`] method, unlocks, and either surfaces a backend error or
//! returns values and charges resources — the dispatch discipline §4.5
//! names explicitly.

use std::any::Any;
use std::sync::{Arc, Mutex};

use neonucleus_core::limits::LABEL_SIZE;
use neonucleus_core::value::Value;
use neonucleus_kernel::component_table::{ComponentState, ComponentTable, MethodHandler};
use neonucleus_kernel::computer::Computer;
use neonucleus_kernel::error::KernelError;
use neonucleus_kernel::resource::{IndirectThrottle, ResourceCharge};

use crate::crc;
use crate::shared::{Deinit, Shared};

/// The operations a concrete EEPROM implementation must provide. Mirrors
/// the method pointers in `nn_eepromTable`; `deinit` replaces the
/// optional destructor callback.
pub trait EepromOps: Send {
    fn size(&self) -> usize;
    fn data_size(&self) -> usize;
    fn get_label(&self) -> Vec<u8>;
    /// Sets the label, truncating to at most [`LABEL_SIZE`] bytes, and
    /// returns the label actually stored.
    fn set_label(&mut self, label: &[u8]) -> Vec<u8>;
    fn get(&self) -> Vec<u8>;
    fn set(&mut self, data: &[u8]) -> Result<(), String>;
    fn get_data(&self) -> Vec<u8>;
    fn set_data(&mut self, data: &[u8]) -> Result<(), String>;
    fn get_architecture(&self) -> Option<String>;
    fn set_architecture(&mut self, architecture: &str) -> Result<(), String>;
    fn is_readonly(&self) -> bool;
    /// Returns whether the read-only flag was actually flipped by this
    /// call (idempotent: the second call returns `false`).
    fn make_readonly(&mut self) -> bool;
}

impl Deinit for Box<dyn EepromOps> {}

pub type SharedEeprom = Shared<Box<dyn EepromOps>>;

/// Simulated-physical parameters charged per operation, mirroring
/// `nn_eepromControl`.
#[derive(Debug, Clone, Copy)]
pub struct EepromConfig {
    pub read_latency: f64,
    pub write_latency: f64,
    pub read_energy_cost: f64,
    pub write_energy_cost: f64,
    pub write_heat_cost: f64,
    pub random_latency_min: f64,
    pub random_latency_max: f64,
    pub read_cost: f64,
    pub write_cost: f64,
    pub bytes_per_tick: f64,
}

impl Default for EepromConfig {
    fn default() -> Self {
        EepromConfig {
            read_latency: 0.0,
            write_latency: 0.0,
            read_energy_cost: 0.0,
            write_energy_cost: 0.0,
            write_heat_cost: 0.0,
            random_latency_min: 0.0,
            random_latency_max: 0.0,
            read_cost: 1.0,
            write_cost: 1.0,
            bytes_per_tick: f64::INFINITY,
        }
    }
}

/// Per-component dispatch state: the shared backend handle, its charge
/// configuration, and the buffered-indirect accumulators for reads and
/// writes. Boxed as the component's [`ComponentState`].
pub struct EepromComponentState {
    pub backend: SharedEeprom,
    pub config: EepromConfig,
    read_throttle: Mutex<IndirectThrottle>,
    write_throttle: Mutex<IndirectThrottle>,
}

impl EepromComponentState {
    pub fn new(backend: SharedEeprom, config: EepromConfig) -> Self {
        EepromComponentState {
            backend,
            config,
            read_throttle: Mutex::new(IndirectThrottle::default()),
            write_throttle: Mutex::new(IndirectThrottle::default()),
        }
    }
}

fn state(cs: &mut ComponentState) -> &mut EepromComponentState {
    cs.downcast_mut::<EepromComponentState>()
        .expect("eeprom component state has the wrong type")
}

/// Checks the read-side buffered-indirect budget for `bytes` in the
/// current tick, committing the charge into the throttle's accumulator if
/// it fits. Must be checked (and, on success, followed by
/// [`apply_read_charge`]) *before* any guest-visible read result is
/// returned — §4.6: a throttled call goes [`Computer::set_busy`] instead.
fn throttle_read(st: &EepromComponentState, computer: &Computer, bytes: usize) -> bool {
    st.read_throttle.lock().expect("eeprom read throttle lock poisoned").try_charge(
        computer.tick_count(),
        bytes as f64,
        st.config.bytes_per_tick,
    )
}

fn throttle_write(st: &EepromComponentState, computer: &Computer, bytes: usize) -> bool {
    st.write_throttle.lock().expect("eeprom write throttle lock poisoned").try_charge(
        computer.tick_count(),
        bytes as f64,
        st.config.bytes_per_tick,
    )
}

fn apply_read_charge(st: &EepromComponentState, computer: &mut Computer) {
    computer.charge(ResourceCharge {
        energy: st.config.read_energy_cost,
        heat: 0.0,
        latency: Some((st.config.random_latency_min, st.config.random_latency_max)),
        call_budget: st.config.read_cost,
    });
}

fn apply_write_charge(st: &EepromComponentState, computer: &mut Computer) {
    computer.charge(ResourceCharge {
        energy: st.config.write_energy_cost,
        heat: st.config.write_heat_cost,
        latency: Some((st.config.random_latency_min, st.config.random_latency_max)),
        call_budget: st.config.write_cost,
    });
}

/// Coerces a value to bytes, treating `nil` as an empty string — the
/// convention the original uses for `set`/`setData` when no argument is
/// supplied.
fn bytes_or_nil_as_empty(v: &Value) -> Option<Vec<u8>> {
    match v.to_bytes() {
        Some(b) => Some(b),
        None if v.is_nil() => Some(Vec::new()),
        None => None,
    }
}

fn handler(
    f: impl Fn(&mut EepromComponentState, &mut Computer, &[Value]) -> Result<Vec<Value>, KernelError>
        + Send
        + Sync
        + 'static,
) -> MethodHandler {
    Arc::new(move |cs, _ud, computer, args| f(state(cs), computer, args))
}

/// Builds the `NN:EEPROM` component table, wiring every method named in
/// §4.5 plus the `makeReadOnly`/`makeReadonly` legacy alias.
///
/// Its constructor expects the component-userdata passed to
/// [`neonucleus_kernel::computer::Computer::new_component`] to be a
/// `&(SharedEeprom, EepromConfig)`; see [`new_eeprom_state`] for building
/// state directly without going through the constructor hook.
pub fn eeprom_component_table() -> ComponentTable {
    let mut table = ComponentTable::new("eeprom").with_constructor(Arc::new(
        |_table_ud: &dyn Any, component_ud: &dyn Any| -> ComponentState {
            let (backend, config) = component_ud
                .downcast_ref::<(SharedEeprom, EepromConfig)>()
                .expect("eeprom component userdata must be (SharedEeprom, EepromConfig)");
            Box::new(EepromComponentState::new(backend.clone(), *config))
        },
    ));

    table.define_method(
        "getSize",
        true,
        "getSize(): integer - Returns the maximum code capacity of the EEPROM.",
        None,
        handler(|st, _c, _a| {
            let size = st.backend.with_lock(|b| b.size());
            Ok(vec![Value::int(size as i64)])
        }),
    );

    table.define_method(
        "getDataSize",
        true,
        "getDataSize(): integer - Returns the maximum data capacity of the EEPROM.",
        None,
        handler(|st, _c, _a| {
            let size = st.backend.with_lock(|b| b.data_size());
            Ok(vec![Value::int(size as i64)])
        }),
    );

    table.define_method(
        "getLabel",
        true,
        "getLabel(): string - Returns the current label.",
        None,
        handler(|st, c, _a| {
            let label = st.backend.with_lock(|b| b.get_label());
            if !throttle_read(st, c, label.len()) {
                c.set_busy();
                return Ok(vec![]);
            }
            apply_read_charge(st, c);
            if label.is_empty() {
                Ok(vec![Value::Nil])
            } else {
                Ok(vec![Value::string(label)])
            }
        }),
    );

    table.define_method(
        "setLabel",
        false,
        "setLabel(label: string): string - Sets the new label. Returns the actual label set to, which may be truncated.",
        None,
        handler(|st, c, args| {
            let Some(mut label) = args.first().and_then(Value::to_bytes) else {
                return Err(KernelError::Backend("bad label (string expected)".to_string()));
            };
            label.truncate(LABEL_SIZE);
            if !throttle_write(st, c, label.len()) {
                c.set_busy();
                return Ok(vec![]);
            }
            let set = st.backend.with_lock(|b| b.set_label(&label));
            apply_write_charge(st, c);
            Ok(vec![Value::string(set)])
        }),
    );

    table.define_method(
        "get",
        true,
        "get(): string - Reads the current code contents.",
        None,
        handler(|st, c, _a| {
            let code = st.backend.with_lock(|b| b.get());
            if !throttle_read(st, c, code.len()) {
                c.set_busy();
                return Ok(vec![]);
            }
            apply_read_charge(st, c);
            Ok(vec![Value::string(code)])
        }),
    );

    table.define_method(
        "set",
        false,
        "set(data: string) - Sets the current code contents.",
        None,
        handler(|st, c, args| {
            let Some(data) = args.first().and_then(bytes_or_nil_as_empty) else {
                return Err(KernelError::Backend("bad data (string expected)".to_string()));
            };
            let cap = st.backend.with_lock(|b| b.size());
            if data.len() > cap {
                return Err(KernelError::Backend("out of space".to_string()));
            }
            if !throttle_write(st, c, data.len()) {
                c.set_busy();
                return Ok(vec![]);
            }
            let result = st.backend.with_lock(|b| {
                if b.is_readonly() {
                    return Err("readonly".to_string());
                }
                b.set(&data)
            });
            result.map_err(KernelError::Backend)?;
            apply_write_charge(st, c);
            Ok(vec![])
        }),
    );

    table.define_method(
        "getData",
        true,
        "getData(): string - Reads the current data contents.",
        None,
        handler(|st, c, _a| {
            let data = st.backend.with_lock(|b| b.get_data());
            if !throttle_read(st, c, data.len()) {
                c.set_busy();
                return Ok(vec![]);
            }
            apply_read_charge(st, c);
            Ok(vec![Value::string(data)])
        }),
    );

    table.define_method(
        "setData",
        false,
        "setData(data: string) - Sets the current data contents.",
        None,
        handler(|st, c, args| {
            let Some(data) = args.first().and_then(bytes_or_nil_as_empty) else {
                return Err(KernelError::Backend("bad data (string expected)".to_string()));
            };
            let cap = st.backend.with_lock(|b| b.data_size());
            if data.len() > cap {
                return Err(KernelError::Backend("out of space".to_string()));
            }
            if !throttle_write(st, c, data.len()) {
                c.set_busy();
                return Ok(vec![]);
            }
            let result = st.backend.with_lock(|b| {
                if b.is_readonly() {
                    return Err("readonly".to_string());
                }
                b.set_data(&data)
            });
            result.map_err(KernelError::Backend)?;
            apply_write_charge(st, c);
            Ok(vec![])
        }),
    );

    table.define_method(
        "getArchitecture",
        true,
        "getArchitecture(): string - Gets the intended architecture.",
        None,
        handler(|st, c, _a| {
            let arch = st.backend.with_lock(|b| b.get_architecture());
            match arch {
                Some(a) => {
                    if !throttle_read(st, c, a.len()) {
                        c.set_busy();
                        return Ok(vec![]);
                    }
                    apply_read_charge(st, c);
                    Ok(vec![Value::string(a)])
                }
                None => Ok(vec![Value::Nil]),
            }
        }),
    );

    table.define_method(
        "setArchitecture",
        false,
        "setArchitecture(data: string) - Sets the intended architecture.",
        None,
        handler(|st, c, args| {
            let Some(data) = args.first().and_then(Value::to_bytes) else {
                return Err(KernelError::Backend("bad data (string expected)".to_string()));
            };
            let arch = String::from_utf8_lossy(&data).into_owned();
            if !throttle_write(st, c, arch.len()) {
                c.set_busy();
                return Ok(vec![]);
            }
            let result = st.backend.with_lock(|b| {
                if b.is_readonly() {
                    return Err("readonly".to_string());
                }
                b.set_architecture(&arch)
            });
            result.map_err(KernelError::Backend)?;
            apply_write_charge(st, c);
            Ok(vec![])
        }),
    );

    table.define_method(
        "isReadOnly",
        true,
        "isReadOnly(): boolean - Returns whether this EEPROM is read-only.",
        None,
        handler(|st, _c, _a| {
            let ro = st.backend.with_lock(|b| b.is_readonly());
            Ok(vec![Value::boolean(ro)])
        }),
    );

    table.define_method(
        "makeReadOnly",
        false,
        "makeReadOnly() - Makes the current EEPROM read-only. Normally, this cannot be undone.",
        None,
        handler(|st, _c, _a| {
            let flipped = st.backend.with_lock(|b| b.make_readonly());
            Ok(vec![Value::boolean(flipped)])
        }),
    );
    table.alias_method("makeReadOnly", "makeReadonly");

    table.define_method(
        "getChecksum",
        true,
        "getChecksum(): string - Returns a checksum of the data on the EEPROM.",
        None,
        handler(|st, c, _a| {
            // Single lock acquisition covers both reads, per §5.
            let (data, code) = st.backend.with_lock(|b| (b.get_data(), b.get()));
            let total = data.len() + code.len();
            if !throttle_read(st, c, total) {
                c.set_busy();
                return Ok(vec![]);
            }
            let sum = crc::checksum(&data, &code);
            apply_read_charge(st, c);
            Ok(vec![Value::string(sum.into_bytes())])
        }),
    );

    table
}

/// Convenience constructor: wraps `ops` in a [`SharedEeprom`] and builds
/// the per-component dispatch state for it in one step.
pub fn new_eeprom_state(ops: Box<dyn EepromOps>, config: EepromConfig) -> EepromComponentState {
    EepromComponentState::new(Shared::new(ops), config)
}

/// An in-memory EEPROM, suitable as a test fixture or a minimal embedder
/// default. Not a production backend — concrete persistent backends are
/// left to embedders; this exists so the dispatch logic above has a
/// concrete `EepromOps` to exercise against.
pub struct InMemoryEeprom {
    code: Vec<u8>,
    data: Vec<u8>,
    label: Vec<u8>,
    architecture: Option<String>,
    readonly: bool,
    code_cap: usize,
    data_cap: usize,
}

impl InMemoryEeprom {
    pub fn new(code_cap: usize, data_cap: usize) -> Self {
        InMemoryEeprom {
            code: Vec::new(),
            data: Vec::new(),
            label: Vec::new(),
            architecture: None,
            readonly: false,
            code_cap,
            data_cap,
        }
    }
}

impl EepromOps for InMemoryEeprom {
    fn size(&self) -> usize {
        self.code_cap
    }

    fn data_size(&self) -> usize {
        self.data_cap
    }

    fn get_label(&self) -> Vec<u8> {
        self.label.clone()
    }

    fn set_label(&mut self, label: &[u8]) -> Vec<u8> {
        let mut label = label.to_vec();
        label.truncate(LABEL_SIZE);
        self.label = label.clone();
        label
    }

    fn get(&self) -> Vec<u8> {
        self.code.clone()
    }

    fn set(&mut self, data: &[u8]) -> Result<(), String> {
        self.code = data.to_vec();
        Ok(())
    }

    fn get_data(&self) -> Vec<u8> {
        self.data.clone()
    }

    fn set_data(&mut self, data: &[u8]) -> Result<(), String> {
        self.data = data.to_vec();
        Ok(())
    }

    fn get_architecture(&self) -> Option<String> {
        self.architecture.clone()
    }

    fn set_architecture(&mut self, architecture: &str) -> Result<(), String> {
        self.architecture = Some(architecture.to_string());
        Ok(())
    }

    fn is_readonly(&self) -> bool {
        self.readonly
    }

    fn make_readonly(&mut self) -> bool {
        if self.readonly {
            false
        } else {
            self.readonly = true;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neonucleus_kernel::architecture::Architecture;
    use neonucleus_kernel::computer::State;
    use neonucleus_core::alloc::UnboundedAllocator;
    use neonucleus_core::universe::Universe;

    #[derive(Debug, Default)]
    struct StubArchitecture;
    impl Architecture for StubArchitecture {
        fn setup(&mut self, _c: &mut Computer) -> State {
            State::Setup
        }
        fn teardown(&mut self, _c: &mut Computer) {}
        fn tick(&mut self, _c: &mut Computer) -> State {
            State::Running
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

    fn computer_with_eeprom(eeprom: InMemoryEeprom) -> (Computer, String) {
        let universe = Arc::new(Universe::new(Arc::new(UnboundedAllocator::default())));
        let mut computer =
            Computer::new(universe, "computer-1", Box::new(StubArchitecture), Box::new(()), 0, 4).unwrap();
        let table = Arc::new(eeprom_component_table());
        let backend: SharedEeprom = Shared::new(Box::new(eeprom));
        let component_userdata = (backend, EepromConfig::default());
        let address = computer
            .new_component(table, &(), &component_userdata, "eeprom-0")
            .unwrap();
        (computer, address)
    }

    #[test]
    fn label_truncation_s2() {
        let (mut computer, address) = computer_with_eeprom(InMemoryEeprom::new(4096, 256));
        computer.add_argument(Value::string(vec![b'x'; 200]));
        let result = computer
            .invoke_component_method(&address, "setLabel")
            .unwrap()
            .unwrap();
        assert_eq!(result[0].to_bytes().unwrap().len(), LABEL_SIZE);
        computer.reset_call();

        let result = computer
            .invoke_component_method(&address, "getLabel")
            .unwrap()
            .unwrap();
        assert_eq!(result[0].to_bytes().unwrap().len(), LABEL_SIZE);
    }

    #[test]
    fn checksum_determinism_s3() {
        let mut eeprom = InMemoryEeprom::new(4096, 256);
        eeprom.set(b"hello").unwrap();
        eeprom.set_data(b"world").unwrap();
        let (mut computer, address) = computer_with_eeprom(eeprom);

        let expected = crc::checksum(b"world", b"hello");
        let r1 = computer
            .invoke_component_method(&address, "getChecksum")
            .unwrap()
            .unwrap();
        computer.reset_call();
        let r2 = computer
            .invoke_component_method(&address, "getChecksum")
            .unwrap()
            .unwrap();

        assert_eq!(String::from_utf8(r1[0].to_bytes().unwrap()).unwrap(), expected);
        assert_eq!(r1[0].to_bytes(), r2[0].to_bytes());
    }

    #[test]
    fn readonly_enforcement_s5() {
        let mut eeprom = InMemoryEeprom::new(4096, 256);
        eeprom.set(b"abc").unwrap();
        let (mut computer, address) = computer_with_eeprom(eeprom);

        computer.invoke_component_method(&address, "makeReadOnly").unwrap().unwrap();
        computer.reset_call();

        computer.add_argument(Value::string(b"xyz".to_vec()));
        let result = computer.invoke_component_method(&address, "set").unwrap();
        assert_eq!(result.unwrap_err(), KernelError::Backend("readonly".to_string()));
        computer.reset_call();

        let contents = computer
            .invoke_component_method(&address, "get")
            .unwrap()
            .unwrap();
        assert_eq!(contents[0].to_bytes(), Some(b"abc".to_vec()));
    }

    #[test]
    fn make_readonly_is_idempotent() {
        let (mut computer, address) = computer_with_eeprom(InMemoryEeprom::new(4096, 256));
        let first = computer
            .invoke_component_method(&address, "makeReadOnly")
            .unwrap()
            .unwrap();
        assert!(first[0].to_bool());
        computer.reset_call();
        let second = computer
            .invoke_component_method(&address, "makeReadonly")
            .unwrap()
            .unwrap();
        assert!(!second[0].to_bool());
    }

    #[test]
    fn exceeding_buffered_indirect_budget_sets_busy_without_mutating() {
        let mut eeprom = InMemoryEeprom::new(4096, 256);
        eeprom.set(b"abc").unwrap();
        let universe = Arc::new(Universe::new(Arc::new(UnboundedAllocator::default())));
        let mut computer =
            Computer::new(universe, "computer-1", Box::new(StubArchitecture), Box::new(()), 0, 4).unwrap();
        let table = Arc::new(eeprom_component_table());
        let backend: SharedEeprom = Shared::new(Box::new(eeprom));
        let config = EepromConfig {
            bytes_per_tick: 2.0,
            ..EepromConfig::default()
        };
        let component_userdata = (backend.clone(), config);
        let address = computer
            .new_component(table, &(), &component_userdata, "eeprom-0")
            .unwrap();
        computer.tick();

        computer.add_argument(Value::string(b"xyz".to_vec()));
        let result = computer.invoke_component_method(&address, "set").unwrap().unwrap();
        assert!(result.is_empty());
        assert_eq!(computer.state(), neonucleus_kernel::computer::State::Busy);

        assert_eq!(backend.with_lock(|b| b.get()), b"abc".to_vec());
    }
}
