//! Disk I/O helpers: bootstrap, full-file load, and atomic full-file overwrite.
//!
//! Writes go through a sibling temp file plus rename. Rename is atomic on the
//! common local filesystems; exotic targets (network mounts, FAT) may tear a
//! write anyway, and nothing here fsyncs, so "durable" means surviving a
//! process restart, not a power cut.

use crate::error::{Error, Result};
use crate::serializer::Serializer;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Create the backing file containing an empty object if nothing exists at
/// `path` yet. Idempotent; an existing file is left untouched.
pub fn ensure_file(path: &Path) -> Result<()> {
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
    {
        Ok(mut file) => file
            .write_all(b"{}")
            .map_err(|e| Error::Io(e.to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(Error::Io(e.to_string())),
    }
}

/// Blocking whole-file read and deserialization. A missing or empty file
/// loads as an empty mapping (not an error); anything else must be a single
/// JSON object or the result is [`Error::Corrupt`].
pub fn load<V, S>(path: &Path, serializer: &S) -> Result<HashMap<String, V>>
where
    V: DeserializeOwned,
    S: Serializer,
{
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(Error::Io(e.to_string())),
    };
    if raw.is_empty() {
        return Ok(HashMap::new());
    }
    serializer.deserialize(&raw)
}

/// Overwrite `path` with `bytes` by writing a sibling `<name>.tmp` and
/// renaming it over the target, so a crash mid-write never leaves a
/// half-written backing file.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, bytes).map_err(|e| Error::Io(e.to_string()))?;
    std::fs::rename(&tmp, path).map_err(|e| Error::Io(e.to_string()))?;
    Ok(())
}
