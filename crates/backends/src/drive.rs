//! Drive (raw sector storage) component: vtable trait, simulated-physical
//! configuration, dispatch wiring, and an in-memory reference
//! implementation.
//!
//! `examples/original_source/src/components/drive.c` doesn't exist in the
//! retrieved source tree — only the `nn_drive`/`nn_driveControl` structs
//! in `neonucleus.h` survive, with no dispatcher to resolve ambiguities
//! against. The method set and costs below are modeled directly on those
//! structs and on the sibling `eeprom`/`filesystem` dispatch pattern
//! (validate args, lock, call, unlock, charge), the same discipline §4.5
//! names for every component.

use std::any::Any;
use std::sync::{Arc, Mutex};

use neonucleus_core::limits::LABEL_SIZE;
use neonucleus_core::value::Value;
use neonucleus_kernel::component_table::{ComponentState, ComponentTable, MethodHandler};
use neonucleus_kernel::computer::Computer;
use neonucleus_kernel::error::KernelError;
use neonucleus_kernel::resource::{IndirectThrottle, ResourceCharge};

use crate::shared::{Deinit, Shared};

/// The operations a concrete drive implementation must provide. Mirrors
/// the method pointers in `nn_drive`. Sectors are 1-indexed, per OC
/// convention (`neonucleus.h`'s own comment on `readSector`/`writeSector`).
pub trait DriveOps: Send {
    fn get_label(&self) -> Vec<u8>;
    fn set_label(&mut self, label: &[u8]) -> Vec<u8>;
    fn platter_count(&self) -> usize;
    fn capacity(&self) -> usize;
    fn sector_size(&self) -> usize;
    /// `sector` is 1-indexed; returns exactly `sector_size()` bytes.
    fn read_sector(&self, sector: usize) -> Result<Vec<u8>, String>;
    /// `sector` is 1-indexed; `data` is exactly `sector_size()` bytes.
    fn write_sector(&mut self, sector: usize, data: &[u8]) -> Result<(), String>;
}

impl Deinit for Box<dyn DriveOps> {}

pub type SharedDrive = Shared<Box<dyn DriveOps>>;

/// Simulated-physical parameters charged per operation, mirroring
/// `nn_driveControl`.
#[derive(Debug, Clone, Copy)]
pub struct DriveConfig {
    pub random_latency_min: f64,
    pub random_latency_max: f64,
    pub read_energy_cost: f64,
    pub write_energy_cost: f64,
    pub write_heat_cost: f64,
    pub read_cost_per_sector: f64,
    pub write_cost_per_sector: f64,
    pub sectors_per_tick: f64,
}

impl Default for DriveConfig {
    fn default() -> Self {
        DriveConfig {
            random_latency_min: 0.0,
            random_latency_max: 0.0,
            read_energy_cost: 0.0,
            write_energy_cost: 0.0,
            write_heat_cost: 0.0,
            read_cost_per_sector: 1.0,
            write_cost_per_sector: 1.0,
            sectors_per_tick: f64::INFINITY,
        }
    }
}

/// Per-component dispatch state: the shared backend handle, its charge
/// configuration, and the buffered-indirect accumulators for reads and
/// writes (counted in sectors, not bytes, matching `nn_driveControl`'s
/// per-sector cost fields).
pub struct DriveComponentState {
    pub backend: SharedDrive,
    pub config: DriveConfig,
    read_throttle: Mutex<IndirectThrottle>,
    write_throttle: Mutex<IndirectThrottle>,
}

impl DriveComponentState {
    pub fn new(backend: SharedDrive, config: DriveConfig) -> Self {
        DriveComponentState {
            backend,
            config,
            read_throttle: Mutex::new(IndirectThrottle::default()),
            write_throttle: Mutex::new(IndirectThrottle::default()),
        }
    }
}

fn state(cs: &mut ComponentState) -> &mut DriveComponentState {
    cs.downcast_mut::<DriveComponentState>()
        .expect("drive component state has the wrong type")
}

/// Checks the read-side buffered-indirect budget for one sector in the
/// current tick. `false` means the caller must [`Computer::set_busy`]
/// and skip the read entirely (§4.6).
fn throttle_read(st: &DriveComponentState, computer: &Computer) -> bool {
    st.read_throttle
        .lock()
        .expect("drive read throttle lock poisoned")
        .try_charge(computer.tick_count(), 1.0, st.config.sectors_per_tick)
}

fn throttle_write(st: &DriveComponentState, computer: &Computer) -> bool {
    st.write_throttle
        .lock()
        .expect("drive write throttle lock poisoned")
        .try_charge(computer.tick_count(), 1.0, st.config.sectors_per_tick)
}

fn apply_read_charge(st: &DriveComponentState, computer: &mut Computer) {
    computer.charge(ResourceCharge {
        energy: st.config.read_energy_cost,
        heat: 0.0,
        latency: Some((st.config.random_latency_min, st.config.random_latency_max)),
        call_budget: st.config.read_cost_per_sector,
    });
}

fn apply_write_charge(st: &DriveComponentState, computer: &mut Computer) {
    computer.charge(ResourceCharge {
        energy: st.config.write_energy_cost,
        heat: st.config.write_heat_cost,
        latency: Some((st.config.random_latency_min, st.config.random_latency_max)),
        call_budget: st.config.write_cost_per_sector,
    });
}

fn arg_sector(args: &[Value], index: usize) -> Result<usize, KernelError> {
    let n = args.get(index).map(Value::to_int).unwrap_or(0);
    if n < 1 {
        return Err(KernelError::Backend("bad sector (out of bounds)".to_string()));
    }
    Ok(n as usize)
}

fn handler(
    f: impl Fn(&mut DriveComponentState, &mut Computer, &[Value]) -> Result<Vec<Value>, KernelError>
        + Send
        + Sync
        + 'static,
) -> MethodHandler {
    Arc::new(move |cs, _ud, computer, args| f(state(cs), computer, args))
}

/// Builds the `NN:DRIVE` component table: label accessors, geometry
/// getters, and 1-indexed sector read/write.
///
/// Its constructor expects the component-userdata passed to
/// [`neonucleus_kernel::computer::Computer::new_component`] to be a
/// `&(SharedDrive, DriveConfig)`.
pub fn drive_component_table() -> ComponentTable {
    let mut table = ComponentTable::new("drive").with_constructor(Arc::new(
        |_table_ud: &dyn Any, component_ud: &dyn Any| -> ComponentState {
            let (backend, config) = component_ud
                .downcast_ref::<(SharedDrive, DriveConfig)>()
                .expect("drive component userdata must be (SharedDrive, DriveConfig)");
            Box::new(DriveComponentState::new(backend.clone(), *config))
        },
    ));

    table.define_method(
        "getLabel",
        true,
        "getLabel(): string - Returns the label of the drive.",
        None,
        handler(|st, _c, _a| {
            let label = st.backend.with_lock(|b| b.get_label());
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
        "setLabel(label: string): string - Sets a new label for the drive. Returns the actual label set, which may have been truncated.",
        None,
        handler(|st, _c, args| {
            let Some(mut label) = args.first().and_then(Value::to_bytes) else {
                return Err(KernelError::Backend("bad label (string expected)".to_string()));
            };
            label.truncate(LABEL_SIZE);
            let set = st.backend.with_lock(|b| b.set_label(&label));
            Ok(vec![Value::string(set)])
        }),
    );

    table.define_method(
        "getPlatterCount",
        true,
        "getPlatterCount(): integer - Returns the number of platters in the drive.",
        None,
        handler(|st, _c, _a| {
            let count = st.backend.with_lock(|b| b.platter_count());
            Ok(vec![Value::int(count as i64)])
        }),
    );

    table.define_method(
        "getCapacity",
        true,
        "getCapacity(): integer - Returns the total capacity of the drive, in bytes.",
        None,
        handler(|st, _c, _a| {
            let cap = st.backend.with_lock(|b| b.capacity());
            Ok(vec![Value::int(cap as i64)])
        }),
    );

    table.define_method(
        "getSectorSize",
        true,
        "getSectorSize(): integer - Returns the size of a single sector, in bytes.",
        None,
        handler(|st, _c, _a| {
            let size = st.backend.with_lock(|b| b.sector_size());
            Ok(vec![Value::int(size as i64)])
        }),
    );

    table.define_method(
        "readSector",
        false,
        "readSector(sector: integer): string - Reads a sector, 1-indexed.",
        None,
        handler(|st, c, args| {
            let sector = arg_sector(args, 0)?;
            let data = st
                .backend
                .with_lock(|b| b.read_sector(sector))
                .map_err(KernelError::Backend)?;
            if !throttle_read(st, c) {
                c.set_busy();
                return Ok(vec![]);
            }
            apply_read_charge(st, c);
            Ok(vec![Value::string(data)])
        }),
    );

    table.define_method(
        "writeSector",
        false,
        "writeSector(sector: integer, data: string) - Writes a sector, 1-indexed.",
        None,
        handler(|st, c, args| {
            let sector = arg_sector(args, 0)?;
            let Some(data) = args.get(1).and_then(Value::to_bytes) else {
                return Err(KernelError::Backend("bad data (string expected)".to_string()));
            };
            if !throttle_write(st, c) {
                c.set_busy();
                return Ok(vec![]);
            }
            st.backend
                .with_lock(|b| b.write_sector(sector, &data))
                .map_err(KernelError::Backend)?;
            apply_write_charge(st, c);
            Ok(vec![])
        }),
    );

    table
}

/// An in-memory drive, suitable as a test fixture or a minimal embedder
/// default. Not a production backend — a flat zero-initialized byte
/// array sliced into fixed-size sectors.
pub struct InMemoryDrive {
    sectors: Vec<Vec<u8>>,
    sector_size: usize,
    platter_count: usize,
    label: Vec<u8>,
}

impl InMemoryDrive {
    pub fn new(capacity: usize, sector_size: usize, platter_count: usize) -> Self {
        let sector_count = capacity / sector_size;
        InMemoryDrive {
            sectors: vec![vec![0u8; sector_size]; sector_count],
            sector_size,
            platter_count,
            label: Vec::new(),
        }
    }
}

impl DriveOps for InMemoryDrive {
    fn get_label(&self) -> Vec<u8> {
        self.label.clone()
    }

    fn set_label(&mut self, label: &[u8]) -> Vec<u8> {
        let mut label = label.to_vec();
        label.truncate(LABEL_SIZE);
        self.label = label.clone();
        label
    }

    fn platter_count(&self) -> usize {
        self.platter_count
    }

    fn capacity(&self) -> usize {
        self.sectors.len() * self.sector_size
    }

    fn sector_size(&self) -> usize {
        self.sector_size
    }

    fn read_sector(&self, sector: usize) -> Result<Vec<u8>, String> {
        self.sectors
            .get(sector - 1)
            .cloned()
            .ok_or_else(|| "bad sector (out of bounds)".to_string())
    }

    fn write_sector(&mut self, sector: usize, data: &[u8]) -> Result<(), String> {
        let slot = self
            .sectors
            .get_mut(sector - 1)
            .ok_or_else(|| "bad sector (out of bounds)".to_string())?;
        if data.len() != self.sector_size {
            return Err("bad data (wrong sector size)".to_string());
        }
        slot.copy_from_slice(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neonucleus_core::alloc::UnboundedAllocator;
    use neonucleus_core::universe::Universe;
    use neonucleus_kernel::architecture::Architecture;
    use neonucleus_kernel::computer::State;

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

    fn computer_with_drive(drive: InMemoryDrive) -> (Computer, String) {
        let universe = Arc::new(Universe::new(Arc::new(UnboundedAllocator::default())));
        let mut computer =
            Computer::new(universe, "computer-1", Box::new(StubArchitecture), Box::new(()), 0, 4).unwrap();
        let table = Arc::new(drive_component_table());
        let backend: SharedDrive = Shared::new(Box::new(drive));
        let component_userdata = (backend, DriveConfig::default());
        let address = computer
            .new_component(table, &(), &component_userdata, "drive-0")
            .unwrap();
        (computer, address)
    }

    #[test]
    fn sectors_are_one_indexed() {
        let (mut computer, address) = computer_with_drive(InMemoryDrive::new(8192, 512, 1));

        computer.add_argument(Value::int(0));
        let err = computer.invoke_component_method(&address, "readSector").unwrap();
        assert!(err.is_err());
        computer.reset_call();

        computer.add_argument(Value::int(1));
        let ok = computer.invoke_component_method(&address, "readSector").unwrap();
        assert!(ok.is_ok());
    }

    #[test]
    fn write_then_read_round_trips_a_sector() {
        let (mut computer, address) = computer_with_drive(InMemoryDrive::new(8192, 512, 1));

        let mut payload = vec![0xABu8; 512];
        payload[0] = 1;
        computer.add_argument(Value::int(3));
        computer.add_argument(Value::string(payload.clone()));
        computer
            .invoke_component_method(&address, "writeSector")
            .unwrap()
            .unwrap();
        computer.reset_call();

        computer.add_argument(Value::int(3));
        let result = computer
            .invoke_component_method(&address, "readSector")
            .unwrap()
            .unwrap();
        assert_eq!(result[0].to_bytes().unwrap(), payload);
    }

    #[test]
    fn geometry_matches_construction_parameters() {
        let (mut computer, address) = computer_with_drive(InMemoryDrive::new(8192, 512, 2));

        let size = computer
            .invoke_component_method(&address, "getSectorSize")
            .unwrap()
            .unwrap();
        computer.reset_call();
        let platters = computer
            .invoke_component_method(&address, "getPlatterCount")
            .unwrap()
            .unwrap();
        computer.reset_call();
        let capacity = computer
            .invoke_component_method(&address, "getCapacity")
            .unwrap()
            .unwrap();

        assert_eq!(size[0].to_int(), 512);
        assert_eq!(platters[0].to_int(), 2);
        assert_eq!(capacity[0].to_int(), 8192);
    }

    #[test]
    fn exceeding_buffered_indirect_budget_sets_busy_without_writing() {
        let universe = Arc::new(Universe::new(Arc::new(UnboundedAllocator::default())));
        let mut computer =
            Computer::new(universe, "computer-1", Box::new(StubArchitecture), Box::new(()), 0, 4).unwrap();
        let table = Arc::new(drive_component_table());
        let backend: SharedDrive = Shared::new(Box::new(InMemoryDrive::new(8192, 512, 1)));
        let config = DriveConfig {
            sectors_per_tick: 0.5,
            ..DriveConfig::default()
        };
        let component_userdata = (backend.clone(), config);
        let address = computer
            .new_component(table, &(), &component_userdata, "drive-0")
            .unwrap();
        computer.tick();

        let payload = vec![0xABu8; 512];
        computer.add_argument(Value::int(1));
        computer.add_argument(Value::string(payload));
        let result = computer
            .invoke_component_method(&address, "writeSector")
            .unwrap()
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(computer.state(), State::Busy);

        assert_eq!(backend.with_lock(|b| b.read_sector(1).unwrap()), vec![0u8; 512]);
    }
}
