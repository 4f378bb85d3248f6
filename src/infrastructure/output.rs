//! Writing compiled output.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::infrastructure::{InfraError, InfraResult};

/// Write `content` to `path` atomically: a temp file in the same directory is
/// written and then renamed over the target, so readers never see a partial file.
pub fn write_atomic(path: &Path, content: &str) -> InfraResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| InfraError::write(path, e))?;
    temp.write_all(content.as_bytes())
        .map_err(|e| InfraError::write(path, e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| InfraError::write(path, e))?;
    temp.persist(path)
        .map_err(|e| InfraError::write(path, e.error))?;
    debug!("wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
