//! Filesystem path validation, per §6: any of `"`, `\`, `:`, `*`, `?`,
//! `<`, `>`, `|` anywhere in a path is rejected.

use neonucleus_kernel::error::KernelError;

const ILLEGAL_BYTES: &[u8] = b"\"\\:*?<>|";

pub fn validate(path: &str) -> Result<(), KernelError> {
    if path.bytes().any(|b| ILLEGAL_BYTES.contains(&b)) {
        return Err(KernelError::Backend("bad path (illegal path)".to_string()));
    }
    Ok(())
}
