//! Hardened file output.
//!
//! - **Atomic writes**: write-to-temp then rename, so a crash never leaves a
//!   half-written stego image or message file behind
//! - **Permission hardening**: on Unix, sensitive files (decoded messages)
//!   are created 0o600 (owner read/write only)

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

fn temp_path(path: &Path) -> Result<PathBuf> {
    let suffix: String = crate::crypto::random_bytes(8)?
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".tmp.{suffix}"));
    Ok(PathBuf::from(name))
}

/// Write data to a file atomically.
///
/// When `sensitive` is true, on Unix the temp file is created with mode
/// 0o600 from the start, so there is no window where it is world-readable.
/// `create_new(true)` on the randomly named temp file prevents clobbering.
pub fn write_secure(path: impl AsRef<Path>, data: &[u8], sensitive: bool) -> Result<()> {
    let path = path.as_ref();
    let temp = temp_path(path)?;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if sensitive {
            options.mode(0o600);
        }
    }
    #[cfg(not(unix))]
    let _ = sensitive;

    let mut file = options.open(&temp)?;
    if let Err(e) = file.write_all(data).and_then(|_| file.sync_all()) {
        let _ = std::fs::remove_file(&temp);
        return Err(e.into());
    }
    drop(file);

    if let Err(e) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(e.into());
    }
    Ok(())
}
