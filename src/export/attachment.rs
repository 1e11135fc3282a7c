//! Write extracted attachments to disk.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::attachment::ExtractedAttachment;

/// What [`write_attachment`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The payload was written (file created or replaced).
    Written,
    /// A file with that name already exists and overwriting is disabled.
    Skipped,
}

/// Write one attachment into `output_dir`.
///
/// With `overwrite` disabled the file is opened with exclusive create, so an
/// existing file is never touched and the existence check cannot race with
/// another writer. With `overwrite` enabled the file is created or
/// truncated.
pub fn write_attachment(
    attachment: &ExtractedAttachment<'_>,
    output_dir: &Path,
    overwrite: bool,
) -> Result<WriteOutcome> {
    let path = target_path(output_dir, &attachment.filename)?;

    if overwrite {
        std::fs::write(&path, &attachment.payload).map_err(|e| Error::write(&path, e))?;
    } else {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                tracing::info!(path = %path.display(), "Exists, skipping");
                return Ok(WriteOutcome::Skipped);
            }
            Err(e) => return Err(Error::write(&path, e)),
        };
        if let Err(e) = file.write_all(&attachment.payload) {
            drop(file);
            // A truncated file would otherwise block every later run.
            let _ = std::fs::remove_file(&path);
            return Err(Error::write(&path, e));
        }
    }

    tracing::info!(
        path = %path.display(),
        bytes = attachment.payload.len(),
        message = %attachment.message_id,
        "Saved attachment"
    );
    Ok(WriteOutcome::Written)
}

/// Join `filename` onto `output_dir`, refusing anything that is not a
/// single plain path component.
fn target_path(output_dir: &Path, filename: &str) -> Result<PathBuf> {
    if filename.contains(['/', '\\']) {
        return Err(Error::UnsafeFilename(filename.to_string()));
    }
    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(output_dir.join(filename)),
        _ => Err(Error::UnsafeFilename(filename.to_string())),
    }
}
