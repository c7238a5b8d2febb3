//! Atomic local file writes
//!
//! Downloads stage through a temporary file in the destination directory
//! and rename into place only on full success, so a target path never
//! holds a partial file after a failed attempt.

use std::io::{Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use terrasync_domain::{Result, SyncError};

/// Stream `reader` into `path` atomically.
///
/// The temporary file lives in the same directory as `path` so the final
/// rename never crosses a filesystem boundary. On any read or write
/// error the temporary file is dropped and the destination is untouched.
pub fn write_atomic<R: Read>(path: &Path, mut reader: R) -> Result<u64> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let mut staged = NamedTempFile::new_in(parent)?;
    let written = std::io::copy(&mut reader, staged.as_file_mut())?;
    staged.as_file_mut().flush()?;
    staged
        .persist(path)
        .map_err(|e| SyncError::Io(format!("cannot persist {}: {}", path.display(), e.error)))?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    /// Reader that yields some bytes, then fails mid-stream.
    struct InterruptedReader {
        remaining: usize,
    }

    impl Read for InterruptedReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.remaining == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "transfer interrupted",
                ));
            }
            let n = self.remaining.min(buf.len());
            buf[..n].fill(b'x');
            self.remaining -= n;
            Ok(n)
        }
    }

    #[test]
    fn full_write_lands_at_the_destination() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("data.csv");

        let written = write_atomic(&target, Cursor::new(b"a,b\n1,2\n".to_vec())).unwrap();

        assert_eq!(written, 8);
        assert_eq!(std::fs::read(&target).unwrap(), b"a,b\n1,2\n");
    }

    #[test]
    fn interrupted_transfer_leaves_no_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("data.csv");

        let result = write_atomic(&target, InterruptedReader { remaining: 4096 });

        assert!(result.is_err());
        assert!(!target.exists());
        // No stray staging files either.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn interrupted_transfer_preserves_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("data.csv");
        std::fs::write(&target, b"previous,complete\n").unwrap();

        let result = write_atomic(&target, InterruptedReader { remaining: 1024 });

        assert!(result.is_err());
        assert_eq!(std::fs::read(&target).unwrap(), b"previous,complete\n");
    }
}
