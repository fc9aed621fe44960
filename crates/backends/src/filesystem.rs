//! Filesystem component: vtable trait, simulated-physical configuration,
//! dispatch wiring, and an in-memory reference implementation.
//!
//! Grounded on `nn_filesystem`/`nn_loadFilesystemTable` in
//! `examples/original_source/src/components/filesystem.c`, with three
//! confirmed bugs in that dispatcher *not* carried forward:
//!
//! - `spaceTotal` calls the backend's `space_total`, not `space_used`.
//! - `rename` reads its second path from argument index 1, not 0 again.
//! - `write` returns exactly one boolean, not two.
//!
//! The original's `nn_filesystemControl` struct (in `neonucleus.h`) and
//! the cost fields the dispatcher actually reads (`control.readBytesPerTick`,
//! `control.removeEnergy`, ...) don't agree with each other — the struct
//! was evidently edited after the dispatcher was written. [`FilesystemConfig`]
//! below follows the fields the dispatcher actually uses, the same way
//! [`crate::eeprom::EepromConfig`] follows `nn_eepromControl`.

use std::any::Any;
use std::sync::{Arc, Mutex};

use neonucleus_core::limits::LABEL_SIZE;
use neonucleus_core::value::Value;
use neonucleus_kernel::component_table::{ComponentState, ComponentTable, MethodHandler};
use neonucleus_kernel::computer::Computer;
use neonucleus_kernel::error::KernelError;
use neonucleus_kernel::resource::{IndirectThrottle, ResourceCharge};

use crate::path;
use crate::shared::{Deinit, Shared};

/// The operations a concrete filesystem implementation must provide.
/// Mirrors the method pointers in `nn_filesystem`; `deinit` replaces the
/// optional destructor callback.
pub trait FilesystemOps: Send {
    fn get_label(&self) -> Vec<u8>;
    fn set_label(&mut self, label: &[u8]) -> Vec<u8>;
    fn space_used(&self) -> usize;
    fn space_total(&self) -> usize;
    fn is_readonly(&self) -> bool;

    fn size(&self, path: &str) -> usize;
    fn remove(&mut self, path: &str) -> bool;
    /// Milliseconds since the epoch; the dispatcher rounds this down to
    /// the nearest 1000 before returning it (§4.5 item 7).
    fn last_modified(&self, path: &str) -> u64;
    /// Returns the number of entries actually moved.
    fn rename(&mut self, from: &str, to: &str) -> usize;
    fn exists(&self, path: &str) -> bool;

    fn is_directory(&self, path: &str) -> bool;
    fn make_directory(&mut self, path: &str) -> bool;
    /// `None` means the listing failed (bad path, not a directory); the
    /// dispatcher returns no values in that case, matching the original
    /// skipping `nn_return` entirely when `files == NULL`.
    fn list(&self, path: &str) -> Option<Vec<String>>;

    fn open(&mut self, path: &str, mode: &str) -> usize;
    fn close(&mut self, fd: usize) -> bool;
    fn write(&mut self, fd: usize, data: &[u8]) -> bool;
    /// An empty result means end-of-file.
    fn read(&mut self, fd: usize, max_len: usize) -> Vec<u8>;
    fn seek(&mut self, fd: usize, whence: &str, offset: i64) -> Result<i64, String>;
}

impl Deinit for Box<dyn FilesystemOps> {}

pub type SharedFilesystem = Shared<Box<dyn FilesystemOps>>;

/// Simulated-physical parameters charged per operation, following the
/// cost fields `nn_fs_readCost`/`writeCost`/`removeCost`/`createCost`
/// actually read (see module doc).
#[derive(Debug, Clone, Copy)]
pub struct FilesystemConfig {
    pub random_latency_min: f64,
    pub random_latency_max: f64,
    pub read_energy_per_byte: f64,
    pub write_energy_per_byte: f64,
    pub read_heat_per_byte: f64,
    pub write_heat_per_byte: f64,
    pub read_cost_per_byte: f64,
    pub write_cost_per_byte: f64,
    pub bytes_per_tick: f64,
    pub remove_energy: f64,
    pub remove_heat: f64,
    pub remove_cost: f64,
    pub create_energy: f64,
    pub create_heat: f64,
    pub create_cost: f64,
    pub files_per_tick: f64,
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        FilesystemConfig {
            random_latency_min: 0.0,
            random_latency_max: 0.0,
            read_energy_per_byte: 0.0,
            write_energy_per_byte: 0.0,
            read_heat_per_byte: 0.0,
            write_heat_per_byte: 0.0,
            read_cost_per_byte: 0.0,
            write_cost_per_byte: 0.0,
            bytes_per_tick: f64::INFINITY,
            remove_energy: 0.0,
            remove_heat: 0.0,
            remove_cost: 1.0,
            create_energy: 0.0,
            create_heat: 0.0,
            create_cost: 1.0,
            files_per_tick: f64::INFINITY,
        }
    }
}

/// Per-component dispatch state: the shared backend handle, its charge
/// configuration, and the buffered-indirect accumulators for each of the
/// four cost shapes (read, write, remove, create).
pub struct FilesystemComponentState {
    pub backend: SharedFilesystem,
    pub config: FilesystemConfig,
    read_throttle: Mutex<IndirectThrottle>,
    write_throttle: Mutex<IndirectThrottle>,
    remove_throttle: Mutex<IndirectThrottle>,
    create_throttle: Mutex<IndirectThrottle>,
}

impl FilesystemComponentState {
    pub fn new(backend: SharedFilesystem, config: FilesystemConfig) -> Self {
        FilesystemComponentState {
            backend,
            config,
            read_throttle: Mutex::new(IndirectThrottle::default()),
            write_throttle: Mutex::new(IndirectThrottle::default()),
            remove_throttle: Mutex::new(IndirectThrottle::default()),
            create_throttle: Mutex::new(IndirectThrottle::default()),
        }
    }
}

fn state(cs: &mut ComponentState) -> &mut FilesystemComponentState {
    cs.downcast_mut::<FilesystemComponentState>()
        .expect("filesystem component state has the wrong type")
}

/// Checks the buffered-indirect budget before any guest-visible effect of
/// an operation is committed; `false` means the caller must
/// [`Computer::set_busy`] and skip the operation entirely (§4.6).
fn throttle_read(st: &FilesystemComponentState, computer: &Computer, bytes: usize) -> bool {
    st.read_throttle
        .lock()
        .expect("filesystem read throttle lock poisoned")
        .try_charge(computer.tick_count(), bytes as f64, st.config.bytes_per_tick)
}

fn throttle_write(st: &FilesystemComponentState, computer: &Computer, bytes: usize) -> bool {
    st.write_throttle
        .lock()
        .expect("filesystem write throttle lock poisoned")
        .try_charge(computer.tick_count(), bytes as f64, st.config.bytes_per_tick)
}

fn throttle_remove(st: &FilesystemComponentState, computer: &Computer, count: usize) -> bool {
    st.remove_throttle
        .lock()
        .expect("filesystem remove throttle lock poisoned")
        .try_charge(computer.tick_count(), count as f64, st.config.files_per_tick)
}

fn throttle_create(st: &FilesystemComponentState, computer: &Computer, count: usize) -> bool {
    st.create_throttle
        .lock()
        .expect("filesystem create throttle lock poisoned")
        .try_charge(computer.tick_count(), count as f64, st.config.files_per_tick)
}

fn apply_read_charge(st: &FilesystemComponentState, computer: &mut Computer, bytes: usize) {
    computer.charge(ResourceCharge {
        energy: st.config.read_energy_per_byte * bytes as f64,
        heat: st.config.read_heat_per_byte * bytes as f64,
        latency: Some((st.config.random_latency_min, st.config.random_latency_max)),
        call_budget: st.config.read_cost_per_byte * bytes as f64,
    });
}

fn apply_write_charge(st: &FilesystemComponentState, computer: &mut Computer, bytes: usize) {
    computer.charge(ResourceCharge {
        energy: st.config.write_energy_per_byte * bytes as f64,
        heat: st.config.write_heat_per_byte * bytes as f64,
        latency: Some((st.config.random_latency_min, st.config.random_latency_max)),
        call_budget: st.config.write_cost_per_byte * bytes as f64,
    });
}

fn apply_remove_charge(st: &FilesystemComponentState, computer: &mut Computer, count: usize) {
    computer.charge(ResourceCharge {
        energy: st.config.remove_energy * count as f64,
        heat: st.config.remove_heat * count as f64,
        latency: None,
        call_budget: st.config.remove_cost * count as f64,
    });
}

fn apply_create_charge(st: &FilesystemComponentState, computer: &mut Computer, count: usize) {
    computer.charge(ResourceCharge {
        energy: st.config.create_energy * count as f64,
        heat: st.config.create_heat * count as f64,
        latency: None,
        call_budget: st.config.create_cost * count as f64,
    });
}

fn arg_path(args: &[Value], index: usize, label: &str) -> Result<String, KernelError> {
    let bytes = args.get(index).and_then(Value::to_bytes).ok_or_else(|| {
        KernelError::Backend(format!("bad {label} (string expected)"))
    })?;
    let p = String::from_utf8_lossy(&bytes).into_owned();
    path::validate(&p).map_err(|_| KernelError::Backend(format!("bad {label} (illegal path)")))?;
    Ok(p)
}

fn handler(
    f: impl Fn(&mut FilesystemComponentState, &mut Computer, &[Value]) -> Result<Vec<Value>, KernelError>
        + Send
        + Sync
        + 'static,
) -> MethodHandler {
    Arc::new(move |cs, _ud, computer, args| f(state(cs), computer, args))
}

/// Builds the `NN:FILESYSTEM` component table, wiring every method named
/// in §4.5.
///
/// Its constructor expects the component-userdata passed to
/// [`neonucleus_kernel::computer::Computer::new_component`] to be a
/// `&(SharedFilesystem, FilesystemConfig)`.
pub fn filesystem_component_table() -> ComponentTable {
    let mut table = ComponentTable::new("filesystem").with_constructor(Arc::new(
        |_table_ud: &dyn Any, component_ud: &dyn Any| -> ComponentState {
            let (backend, config) = component_ud
                .downcast_ref::<(SharedFilesystem, FilesystemConfig)>()
                .expect("filesystem component userdata must be (SharedFilesystem, FilesystemConfig)");
            Box::new(FilesystemComponentState::new(backend.clone(), *config))
        },
    ));

    table.define_method(
        "getLabel",
        true,
        "getLabel(): string - Returns the label of the filesystem.",
        None,
        handler(|st, c, _a| {
            let label = st.backend.with_lock(|b| b.get_label());
            if !throttle_read(st, c, label.len()) {
                c.set_busy();
                return Ok(vec![]);
            }
            apply_read_charge(st, c, label.len());
            if label.is_empty() {
                Ok(vec![Value::Nil])
            } else {
                Ok(vec![Value::string(label)])
            }
        }),
    );

    table.define_method(
        "setLabel",
        true,
        "setLabel(label: string): string - Sets a new label for the filesystem and returns the new label of the filesystem, which may have been truncated.",
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
            apply_write_charge(st, c, set.len());
            Ok(vec![Value::string(set)])
        }),
    );

    table.define_method(
        "spaceUsed",
        true,
        "spaceUsed(): integer - Returns the amounts of bytes used.",
        None,
        handler(|st, _c, _a| {
            let used = st.backend.with_lock(|b| b.space_used());
            Ok(vec![Value::int(used as i64)])
        }),
    );

    table.define_method(
        "spaceTotal",
        true,
        "spaceTotal(): integer - Returns the capacity of the filesystem.",
        None,
        handler(|st, _c, _a| {
            let total = st.backend.with_lock(|b| b.space_total());
            Ok(vec![Value::int(total as i64)])
        }),
    );

    table.define_method(
        "isReadOnly",
        true,
        "isReadOnly(): boolean - Returns whether the filesystem is in read-only mode.",
        None,
        handler(|st, _c, _a| {
            let ro = st.backend.with_lock(|b| b.is_readonly());
            Ok(vec![Value::boolean(ro)])
        }),
    );

    table.define_method(
        "size",
        true,
        "size(path: string): integer - Gets the size, in bytes, of a file.",
        None,
        handler(|st, _c, args| {
            let path = arg_path(args, 0, "path")?;
            let size = st.backend.with_lock(|b| b.size(&path));
            Ok(vec![Value::int(size as i64)])
        }),
    );

    table.define_method(
        "remove",
        true,
        "remove(path: string): boolean - Removes a file. Returns whether the operation succeeded.",
        None,
        handler(|st, c, args| {
            let path = arg_path(args, 0, "path")?;
            if !throttle_remove(st, c, 1) {
                c.set_busy();
                return Ok(vec![]);
            }
            let ok = st.backend.with_lock(|b| b.remove(&path));
            apply_remove_charge(st, c, 1);
            Ok(vec![Value::boolean(ok)])
        }),
    );

    table.define_method(
        "lastModified",
        true,
        "lastModified(path: string): integer - Returns the unix timestamp of the last time the file was modified, rounded to the nearest 1000.",
        None,
        handler(|st, _c, args| {
            let path = arg_path(args, 0, "path")?;
            let t = st.backend.with_lock(|b| b.last_modified(&path));
            let rounded = t - (t % 1000);
            Ok(vec![Value::int(rounded as i64)])
        }),
    );

    table.define_method(
        "rename",
        true,
        "rename(from: string, to: string): boolean - Moves files from one path to another.",
        None,
        handler(|st, c, args| {
            let from = arg_path(args, 0, "path #1")?;
            let to = arg_path(args, 1, "path #2")?;
            if !throttle_remove(st, c, 1) || !throttle_create(st, c, 1) {
                c.set_busy();
                return Ok(vec![]);
            }
            let moved = st.backend.with_lock(|b| b.rename(&from, &to));
            apply_remove_charge(st, c, moved);
            apply_create_charge(st, c, moved);
            Ok(vec![Value::boolean(moved > 0)])
        }),
    );

    table.define_method(
        "exists",
        true,
        "exists(path: string): boolean - Checks whether a file exists.",
        None,
        handler(|st, _c, args| {
            let path = arg_path(args, 0, "path")?;
            let exists = st.backend.with_lock(|b| b.exists(&path));
            Ok(vec![Value::boolean(exists)])
        }),
    );

    table.define_method(
        "isDirectory",
        true,
        "isDirectory(path: string): boolean - Returns whether a file is actually a directory.",
        None,
        handler(|st, _c, args| {
            let path = arg_path(args, 0, "path")?;
            let is_dir = st.backend.with_lock(|b| b.is_directory(&path));
            Ok(vec![Value::boolean(is_dir)])
        }),
    );

    table.define_method(
        "makeDirectory",
        true,
        "makeDirectory(path: string): boolean - Creates a new directory at the given path. Returns whether it succeeded.",
        None,
        handler(|st, c, args| {
            let path = arg_path(args, 0, "path")?;
            if !throttle_create(st, c, 1) {
                c.set_busy();
                return Ok(vec![]);
            }
            let ok = st.backend.with_lock(|b| b.make_directory(&path));
            apply_create_charge(st, c, 1);
            Ok(vec![Value::boolean(ok)])
        }),
    );

    table.define_method(
        "list",
        true,
        "list(path: string): string[] - Returns a list of file paths. Directories will have a / after them.",
        None,
        handler(|st, _c, args| {
            let path = arg_path(args, 0, "path")?;
            let files = st.backend.with_lock(|b| b.list(&path));
            match files {
                Some(names) => {
                    let values = names.into_iter().map(Value::string).collect();
                    Ok(vec![Value::array_from(values)])
                }
                None => Ok(vec![]),
            }
        }),
    );

    table.define_method(
        "open",
        true,
        "open(path: string[, mode: string = \"r\"]): integer - Opens a file, may create it.",
        None,
        handler(|st, c, args| {
            let path = arg_path(args, 0, "path")?;
            let mode = args
                .get(1)
                .and_then(Value::to_bytes)
                .map(|b| String::from_utf8_lossy(&b).into_owned())
                .unwrap_or_else(|| "r".to_string());

            let pre_existing = st.backend.with_lock(|b| b.exists(&path));
            if !pre_existing {
                if !throttle_create(st, c, 1) {
                    c.set_busy();
                    return Ok(vec![]);
                }
                let fd = st.backend.with_lock(|b| b.open(&path, &mode));
                apply_create_charge(st, c, 1);
                return Ok(vec![Value::int(fd as i64)]);
            }
            let fd = st.backend.with_lock(|b| b.open(&path, &mode));
            Ok(vec![Value::int(fd as i64)])
        }),
    );

    table.define_method(
        "close",
        true,
        "close(fd: integer): boolean - Closes a file.",
        None,
        handler(|st, _c, args| {
            let fd = args.first().map(Value::to_int).unwrap_or(0).max(0) as usize;
            let closed = st.backend.with_lock(|b| b.close(fd));
            Ok(vec![Value::boolean(closed)])
        }),
    );

    table.define_method(
        "write",
        true,
        "write(fd: integer, data: string): boolean - Writes data to a file.",
        None,
        handler(|st, c, args| {
            let fd = args.first().map(Value::to_int).unwrap_or(0).max(0) as usize;
            let Some(data) = args.get(1).and_then(Value::to_bytes) else {
                return Err(KernelError::Backend("bad buffer (string expected)".to_string()));
            };
            if !throttle_write(st, c, data.len()) {
                c.set_busy();
                return Ok(vec![]);
            }
            let ok = st.backend.with_lock(|b| b.write(fd, &data));
            apply_write_charge(st, c, data.len());
            Ok(vec![Value::boolean(ok)])
        }),
    );

    table.define_method(
        "read",
        true,
        "read(fd: integer, len: number): string - Reads bytes from a file. Infinity is a valid length, in which case it reads as much as possible.",
        None,
        handler(|st, c, args| {
            let fd = args.first().map(Value::to_int).unwrap_or(0).max(0) as usize;
            let requested = args.get(1).map(Value::to_number).unwrap_or(0.0);
            let capacity = st.backend.with_lock(|b| b.space_total()) as f64;
            let len = requested.min(capacity).max(0.0);
            let byte_len = len as usize;

            if !throttle_read(st, c, byte_len) {
                c.set_busy();
                return Ok(vec![]);
            }
            let data = st.backend.with_lock(|b| b.read(fd, byte_len));
            apply_read_charge(st, c, byte_len);
            if data.is_empty() {
                Ok(vec![])
            } else {
                Ok(vec![Value::string(data)])
            }
        }),
    );

    table.define_method(
        "seek",
        true,
        "seek(fd: integer, whence: string, offset: integer): integer - Seeks a file. Returns the new position. Valid whences are set, cur and end.",
        None,
        handler(|st, _c, args| {
            let fd = args.first().map(Value::to_int).unwrap_or(0).max(0) as usize;
            let Some(whence) = args.get(1).and_then(Value::to_bytes) else {
                return Err(KernelError::Backend("bad whence (string expected)".to_string()));
            };
            let whence = String::from_utf8_lossy(&whence).into_owned();
            if !matches!(whence.as_str(), "set" | "cur" | "end") {
                return Err(KernelError::Backend("bad whence".to_string()));
            }
            let offset = args.get(2).map(Value::to_int).unwrap_or(0);

            let pos = st
                .backend
                .with_lock(|b| b.seek(fd, &whence, offset))
                .map_err(KernelError::Backend)?;
            Ok(vec![Value::int(pos)])
        }),
    );

    table
}

/// An in-memory filesystem, suitable as a test fixture or a minimal
/// embedder default. Not a production backend — a flat `path -> bytes`
/// map with directories modeled as path prefixes, just enough to drive
/// the dispatch logic above.
pub struct InMemoryFilesystem {
    files: std::collections::HashMap<String, Vec<u8>>,
    directories: std::collections::HashSet<String>,
    label: Vec<u8>,
    readonly: bool,
    capacity: usize,
    open_files: std::collections::HashMap<usize, OpenFile>,
    next_fd: usize,
}

struct OpenFile {
    path: String,
    pos: usize,
    writable: bool,
}

impl InMemoryFilesystem {
    pub fn new(capacity: usize) -> Self {
        InMemoryFilesystem {
            files: std::collections::HashMap::new(),
            directories: std::collections::HashSet::new(),
            label: Vec::new(),
            readonly: false,
            capacity,
            open_files: std::collections::HashMap::new(),
            next_fd: 1,
        }
    }

    pub fn set_readonly(&mut self, readonly: bool) {
        self.readonly = readonly;
    }
}

impl FilesystemOps for InMemoryFilesystem {
    fn get_label(&self) -> Vec<u8> {
        self.label.clone()
    }

    fn set_label(&mut self, label: &[u8]) -> Vec<u8> {
        let mut label = label.to_vec();
        label.truncate(LABEL_SIZE);
        self.label = label.clone();
        label
    }

    fn space_used(&self) -> usize {
        self.files.values().map(|v| v.len()).sum()
    }

    fn space_total(&self) -> usize {
        self.capacity
    }

    fn is_readonly(&self) -> bool {
        self.readonly
    }

    fn size(&self, path: &str) -> usize {
        self.files.get(path).map(|v| v.len()).unwrap_or(0)
    }

    fn remove(&mut self, path: &str) -> bool {
        self.files.remove(path).is_some() || self.directories.remove(path)
    }

    fn last_modified(&self, _path: &str) -> u64 {
        0
    }

    fn rename(&mut self, from: &str, to: &str) -> usize {
        if let Some(data) = self.files.remove(from) {
            self.files.insert(to.to_string(), data);
            1
        } else {
            0
        }
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path) || self.directories.contains(path)
    }

    fn is_directory(&self, path: &str) -> bool {
        self.directories.contains(path)
    }

    fn make_directory(&mut self, path: &str) -> bool {
        self.directories.insert(path.to_string())
    }

    fn list(&self, path: &str) -> Option<Vec<String>> {
        if !path.is_empty() && !self.directories.contains(path) && path != "/" {
            return None;
        }
        let prefix = if path.is_empty() || path == "/" {
            String::new()
        } else {
            format!("{path}/")
        };
        let mut names: Vec<String> = self
            .files
            .keys()
            .filter(|p| p.starts_with(&prefix))
            .cloned()
            .collect();
        names.extend(
            self.directories
                .iter()
                .filter(|p| p.starts_with(&prefix))
                .map(|p| format!("{p}/")),
        );
        Some(names)
    }

    fn open(&mut self, path: &str, mode: &str) -> usize {
        let writable = mode.starts_with('w') || mode.starts_with('a');
        if writable && !self.files.contains_key(path) {
            self.files.insert(path.to_string(), Vec::new());
        }
        let pos = if mode.starts_with('a') {
            self.files.get(path).map(|v| v.len()).unwrap_or(0)
        } else {
            0
        };
        let fd = self.next_fd;
        self.next_fd += 1;
        self.open_files.insert(
            fd,
            OpenFile {
                path: path.to_string(),
                pos,
                writable,
            },
        );
        fd
    }

    fn close(&mut self, fd: usize) -> bool {
        self.open_files.remove(&fd).is_some()
    }

    fn write(&mut self, fd: usize, data: &[u8]) -> bool {
        let Some(open) = self.open_files.get_mut(&fd) else {
            return false;
        };
        if !open.writable {
            return false;
        }
        let entry = self.files.entry(open.path.clone()).or_default();
        let end = open.pos + data.len();
        if entry.len() < end {
            entry.resize(end, 0);
        }
        entry[open.pos..end].copy_from_slice(data);
        open.pos = end;
        true
    }

    fn read(&mut self, fd: usize, max_len: usize) -> Vec<u8> {
        let Some(open) = self.open_files.get_mut(&fd) else {
            return Vec::new();
        };
        let Some(contents) = self.files.get(&open.path) else {
            return Vec::new();
        };
        if open.pos >= contents.len() {
            return Vec::new();
        }
        let end = (open.pos + max_len).min(contents.len());
        let chunk = contents[open.pos..end].to_vec();
        open.pos = end;
        chunk
    }

    fn seek(&mut self, fd: usize, whence: &str, offset: i64) -> Result<i64, String> {
        let Some(open) = self.open_files.get_mut(&fd) else {
            return Err("bad file descriptor".to_string());
        };
        let len = self.files.get(&open.path).map(|v| v.len()).unwrap_or(0) as i64;
        let base = match whence {
            "set" => 0,
            "cur" => open.pos as i64,
            "end" => len,
            _ => return Err("bad whence".to_string()),
        };
        let pos = (base + offset).clamp(0, len);
        open.pos = pos as usize;
        Ok(pos)
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

    fn computer_with_fs(fs: InMemoryFilesystem) -> (Computer, String) {
        let universe = Arc::new(Universe::new(Arc::new(UnboundedAllocator::default())));
        let mut computer =
            Computer::new(universe, "computer-1", Box::new(StubArchitecture), Box::new(()), 0, 4).unwrap();
        let table = Arc::new(filesystem_component_table());
        let backend: SharedFilesystem = Shared::new(Box::new(fs));
        let component_userdata = (backend, FilesystemConfig::default());
        let address = computer
            .new_component(table, &(), &component_userdata, "fs-0")
            .unwrap();
        (computer, address)
    }

    #[test]
    fn space_total_is_not_space_used() {
        let mut fs = InMemoryFilesystem::new(4096);
        fs.files.insert("a".to_string(), vec![0u8; 10]);
        let (mut computer, address) = computer_with_fs(fs);

        let used = computer.invoke_component_method(&address, "spaceUsed").unwrap().unwrap();
        computer.reset_call();
        let total = computer.invoke_component_method(&address, "spaceTotal").unwrap().unwrap();

        assert_eq!(used[0].to_int(), 10);
        assert_eq!(total[0].to_int(), 4096);
    }

    #[test]
    fn rename_reads_distinct_from_and_to_arguments() {
        let mut fs = InMemoryFilesystem::new(4096);
        fs.files.insert("src".to_string(), b"hi".to_vec());
        let (mut computer, address) = computer_with_fs(fs);

        computer.add_argument(Value::string(b"src".to_vec()));
        computer.add_argument(Value::string(b"dst".to_vec()));
        let result = computer
            .invoke_component_method(&address, "rename")
            .unwrap()
            .unwrap();
        assert!(result[0].to_bool());
        computer.reset_call();

        computer.add_argument(Value::string(b"dst".to_vec()));
        let exists = computer
            .invoke_component_method(&address, "exists")
            .unwrap()
            .unwrap();
        assert!(exists[0].to_bool());
    }

    #[test]
    fn write_returns_exactly_one_value() {
        let (mut computer, address) = computer_with_fs(InMemoryFilesystem::new(4096));

        computer.add_argument(Value::string(b"out.txt".to_vec()));
        computer.add_argument(Value::string(b"w".to_vec()));
        let open = computer
            .invoke_component_method(&address, "open")
            .unwrap()
            .unwrap();
        let fd = open[0].to_int();
        computer.reset_call();

        computer.add_argument(Value::int(fd));
        computer.add_argument(Value::string(b"hello".to_vec()));
        let result = computer
            .invoke_component_method(&address, "write")
            .unwrap()
            .unwrap();
        assert_eq!(result.len(), 1);
        assert!(result[0].to_bool());
    }

    #[test]
    fn last_modified_is_rounded_to_the_nearest_thousand() {
        struct FixedTime(InMemoryFilesystem);
        impl FilesystemOps for FixedTime {
            fn get_label(&self) -> Vec<u8> {
                self.0.get_label()
            }
            fn set_label(&mut self, label: &[u8]) -> Vec<u8> {
                self.0.set_label(label)
            }
            fn space_used(&self) -> usize {
                self.0.space_used()
            }
            fn space_total(&self) -> usize {
                self.0.space_total()
            }
            fn is_readonly(&self) -> bool {
                self.0.is_readonly()
            }
            fn size(&self, path: &str) -> usize {
                self.0.size(path)
            }
            fn remove(&mut self, path: &str) -> bool {
                self.0.remove(path)
            }
            fn last_modified(&self, _path: &str) -> u64 {
                1_234_567
            }
            fn rename(&mut self, from: &str, to: &str) -> usize {
                self.0.rename(from, to)
            }
            fn exists(&self, path: &str) -> bool {
                self.0.exists(path)
            }
            fn is_directory(&self, path: &str) -> bool {
                self.0.is_directory(path)
            }
            fn make_directory(&mut self, path: &str) -> bool {
                self.0.make_directory(path)
            }
            fn list(&self, path: &str) -> Option<Vec<String>> {
                self.0.list(path)
            }
            fn open(&mut self, path: &str, mode: &str) -> usize {
                self.0.open(path, mode)
            }
            fn close(&mut self, fd: usize) -> bool {
                self.0.close(fd)
            }
            fn write(&mut self, fd: usize, data: &[u8]) -> bool {
                self.0.write(fd, data)
            }
            fn read(&mut self, fd: usize, max_len: usize) -> Vec<u8> {
                self.0.read(fd, max_len)
            }
            fn seek(&mut self, fd: usize, whence: &str, offset: i64) -> Result<i64, String> {
                self.0.seek(fd, whence, offset)
            }
        }

        let (mut computer, address) = computer_with_fs_generic(FixedTime(InMemoryFilesystem::new(4096)));
        computer.add_argument(Value::string(b"a".to_vec()));
        let result = computer
            .invoke_component_method(&address, "lastModified")
            .unwrap()
            .unwrap();
        assert_eq!(result[0].to_int(), 1_234_000);
    }

    fn computer_with_fs_generic(fs: impl FilesystemOps + 'static) -> (Computer, String) {
        let universe = Arc::new(Universe::new(Arc::new(UnboundedAllocator::default())));
        let mut computer =
            Computer::new(universe, "computer-1", Box::new(StubArchitecture), Box::new(()), 0, 4).unwrap();
        let table = Arc::new(filesystem_component_table());
        let backend: SharedFilesystem = Shared::new(Box::new(fs));
        let component_userdata = (backend, FilesystemConfig::default());
        let address = computer
            .new_component(table, &(), &component_userdata, "fs-0")
            .unwrap();
        (computer, address)
    }

    #[test]
    fn illegal_path_is_rejected_before_reaching_the_backend() {
        let (mut computer, address) = computer_with_fs(InMemoryFilesystem::new(4096));
        computer.add_argument(Value::string(b"a:b".to_vec()));
        let result = computer.invoke_component_method(&address, "size").unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn exceeding_buffered_indirect_budget_sets_busy_without_writing() {
        let universe = Arc::new(Universe::new(Arc::new(UnboundedAllocator::default())));
        let mut computer =
            Computer::new(universe, "computer-1", Box::new(StubArchitecture), Box::new(()), 0, 4).unwrap();
        let table = Arc::new(filesystem_component_table());
        let backend: SharedFilesystem = Shared::new(Box::new(InMemoryFilesystem::new(4096)));
        let config = FilesystemConfig {
            bytes_per_tick: 2.0,
            ..FilesystemConfig::default()
        };
        let component_userdata = (backend.clone(), config);
        let address = computer
            .new_component(table, &(), &component_userdata, "fs-0")
            .unwrap();
        computer.tick();

        computer.add_argument(Value::string(b"out.txt".to_vec()));
        computer.add_argument(Value::string(b"w".to_vec()));
        let open = computer
            .invoke_component_method(&address, "open")
            .unwrap()
            .unwrap();
        let fd = open[0].to_int();
        computer.reset_call();

        computer.add_argument(Value::int(fd));
        computer.add_argument(Value::string(b"hello".to_vec()));
        let result = computer.invoke_component_method(&address, "write").unwrap().unwrap();
        assert!(result.is_empty());
        assert_eq!(computer.state(), State::Busy);

        assert!(!backend.with_lock(|b| b.exists("out.txt")) || backend.with_lock(|b| b.size("out.txt")) == 0);
    }
}
