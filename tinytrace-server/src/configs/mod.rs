use std::io;
use std::path::{Path, PathBuf};

pub mod settings;

pub use settings::{Cctv, Logger, Monitor, Radio, RadioKind, Server, Settings, Simulation};

/// Resolves a configured path against the working directory.
pub fn normalize_path(path: impl AsRef<Path>) -> io::Result<PathBuf> {
    let path = path.as_ref();
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    Ok(std::env::current_dir()?.join(path))
}
