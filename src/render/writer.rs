use std::io::Write;
use std::path::Path;

use crate::render::error::RenderError;

#[cfg(unix)]
const DEFAULT_MODE: u32 = 0o644;

/// Replace `path` with `contents` without ever exposing a partial file.
///
/// The data goes to a temp file next to the destination, which is then renamed
/// into place. On failure the previous file (if any) is left as it was.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), RenderError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    #[cfg(unix)]
    file.as_file().set_permissions(page_permissions(path)?)?;
    file.as_file().sync_all()?;
    file.persist(path)?;

    log::info!("{} bytes saved to {}", contents.len(), path.display());
    Ok(())
}

/// Mode of the file being replaced, or world-readable 0644 for a new one.
/// Temp files start out owner-only.
#[cfg(unix)]
fn page_permissions(path: &Path) -> std::io::Result<std::fs::Permissions> {
    use std::fs::{self, Permissions};
    use std::io::ErrorKind;
    use std::os::unix::fs::PermissionsExt;

    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(meta.permissions()),
        Ok(_) => Ok(Permissions::from_mode(DEFAULT_MODE)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Permissions::from_mode(DEFAULT_MODE)),
        Err(e) => Err(e),
    }
}
