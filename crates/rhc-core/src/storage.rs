//! Download destination handling.
//!
//! A download streams into a uniquely named `*.part` temp file next to the
//! destination and is renamed over the final path only after the whole body
//! arrived and the attempt was judged successful. A failed or abandoned
//! attempt therefore never leaves a half-written file observable at the
//! destination. The name is unique per attempt: a timed-out attempt keeps
//! running in the background for a while, and must not clobber the part file
//! of the attempt that superseded it.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Suffix of in-progress download files.
pub const TEMP_SUFFIX: &str = ".part";

/// Write handle for an in-progress download. The temp file is removed on
/// drop unless `finalize` moved it into place.
#[derive(Debug)]
pub struct PartFile {
    temp: NamedTempFile,
    final_path: PathBuf,
}

impl PartFile {
    /// Create `<dest>.<random>.part` in the destination's directory, so the
    /// final rename stays on one filesystem.
    pub fn create(dest: &Path) -> io::Result<Self> {
        let name = dest
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("destination has no usable file name: {}", dest.display()),
                )
            })?;
        let dir = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let temp = tempfile::Builder::new()
            .prefix(&format!("{name}."))
            .suffix(TEMP_SUFFIX)
            .tempfile_in(dir)?;
        Ok(PartFile {
            temp,
            final_path: dest.to_path_buf(),
        })
    }

    /// Append a chunk of the response body.
    pub fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.temp.as_file_mut().write_all(data)
    }

    /// Flush, fsync, and atomically rename onto the destination path,
    /// replacing whatever was there.
    pub fn finalize(mut self) -> io::Result<()> {
        self.temp.as_file_mut().flush()?;
        self.temp.as_file().sync_all()?;
        self.temp.persist(&self.final_path).map_err(|e| e.error)?;
        Ok(())
    }
}
