//! Fixed protocol limits, matching the `#define NN_MAX_*` block in the
//! original `neonucleus.h`.

pub const MAX_ARGS: usize = 32;
pub const MAX_RETS: usize = 32;
pub const MAX_METHODS: usize = 32;
pub const MAX_USERS: usize = 128;
pub const MAX_ARCHITECTURES: usize = 16;
pub const MAX_SIGNALS: usize = 128;
pub const MAX_SIGNAL_VALS: usize = 32;
pub const MAX_SIGNAL_SIZE: usize = 8192;
pub const MAX_USERDATA: usize = 1024;
pub const MAX_USER_SIZE: usize = 128;
pub const MAX_OPEN_FILES: usize = 128;
pub const MAX_SCREEN_KEYBOARDS: usize = 64;

pub const OVERHEAT_MIN: f64 = 100.0;
pub const CALL_HEAT: f64 = 0.05;
pub const CALL_COST: f64 = 1.0;
pub const LABEL_SIZE: usize = 128;
