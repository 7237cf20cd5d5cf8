//! Persisting a finished report.
//!
//! Two independent outputs: the structured [`crate::document::Document`] as
//! a Word file ([`docx`]) and the untouched response text ([`text`]). Both
//! go through [`write_atomic`]: the bytes land in a temporary file next to
//! the destination, which is renamed into place only after a successful
//! write. A failed write never leaves a truncated file behind, and the
//! temporary file is removed on every exit path when it is dropped.

pub mod docx;
pub mod text;

use crate::error::ReportError;
use std::fs::File;
use std::path::Path;
use tempfile::Builder;
use tracing::debug;

/// Write `path` atomically through `write`.
pub(crate) fn write_atomic<F>(path: &Path, write: F) -> Result<(), ReportError>
where
    F: FnOnce(&mut File) -> std::io::Result<()>,
{
    let fail = |source: std::io::Error| ReportError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(fail)?;

    let mut tmp = temp_builder().tempfile_in(dir).map_err(fail)?;
    write(tmp.as_file_mut()).map_err(fail)?;
    tmp.as_file_mut().sync_all().map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;

    debug!("Wrote {}", path.display());
    Ok(())
}

/// Temp files are created `0666` so the persisted report honours the umask
/// like any other newly created file, not tempfile's owner-only `0600`.
fn temp_builder() -> Builder<'static, 'static> {
    let mut builder = Builder::new();
    builder.prefix(".cti-report-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder
}
