//! The filesystem operations the overwrite engine needs.
//!
//! `OsStorage` is the real implementation. The trait exists so tests can stand
//! in storage that drops writes or records what each pass left on disk.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, Write};
use std::path::Path;

pub trait Storage {
    type Handle: Read + Write + Seek;

    /// Current length in bytes of the file at `path`.
    fn file_len(&self, path: &Path) -> io::Result<u64>;

    /// Opens an existing file for reading and writing without truncating it.
    fn open_rw(&self, path: &Path) -> io::Result<Self::Handle>;

    /// Flushes buffered data and forces it down to the storage device.
    fn sync(&self, handle: &mut Self::Handle) -> io::Result<()>;

    /// Removes the file's directory entry.
    fn remove(&self, path: &Path) -> io::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OsStorage;

impl Storage for OsStorage {
    type Handle = File;

    fn file_len(&self, path: &Path) -> io::Result<u64> {
        let metadata = fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            ));
        }
        Ok(metadata.len())
    }

    fn open_rw(&self, path: &Path) -> io::Result<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .append(false)
            .truncate(false)
            .open(path)
    }

    fn sync(&self, handle: &mut File) -> io::Result<()> {
        handle.flush()?;
        handle.sync_all()
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::SeekFrom;

    #[test]
    fn test_open_rw_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keep.bin");
        fs::write(&path, b"abcdef").unwrap();

        let storage = OsStorage;
        let mut handle = storage.open_rw(&path).unwrap();
        handle.seek(SeekFrom::Start(2)).unwrap();
        handle.write_all(b"XY").unwrap();
        storage.sync(&mut handle).unwrap();
        drop(handle);

        assert_eq!(fs::read(&path).unwrap(), b"abXYef");
        assert_eq!(storage.file_len(&path).unwrap(), 6);
    }

    #[test]
    fn test_file_len_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        let err = OsStorage.file_len(dir.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_open_rw_does_not_create() {
        let dir = tempfile::tempdir().unwrap();
        let err = OsStorage.open_rw(&dir.path().join("missing")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
