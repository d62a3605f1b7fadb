//! Compound container access.
//!
//! [`StructuredStorage`] is the capability the extractor needs from a
//! compound-file backend: open a file, ask whether a top-level stream exists
//! and how long it is, and read it. [`OleStorage`] implements it on top of
//! the crate's own [`OleFile`](crate::ole::OleFile) reader.
//!
//! # Example
//!
//! ```no_run
//! use designfile_info::container::{extract_stream, BASIC_FILE_INFO_STREAM};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = extract_stream("model.rvt", BASIC_FILE_INFO_STREAM)?;
//! println!("BasicFileInfo: {} bytes", bytes.len());
//! # Ok(())
//! # }
//! ```
use crate::error::{Error, Result};
use crate::ole::{consts::MAGIC, is_ole_file, OleFile};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Name of the metadata stream stored at the root of every Revit file
pub const BASIC_FILE_INFO_STREAM: &str = "BasicFileInfo";

/// Default sanity limit for a single stream (64 MiB)
pub const DEFAULT_MAX_STREAM_SIZE: u64 = 64 * 1024 * 1024;

/// Read-only access to the top-level streams of a compound container.
pub trait StructuredStorage: Sized {
    /// Open the container at `path` for shared reading.
    fn open(path: &Path) -> Result<Self>;

    /// Declared length of a top-level stream, or `None` when it is absent.
    fn stream_len(&mut self, name: &str) -> Result<Option<u64>>;

    /// Whether a top-level stream with this name exists.
    fn stream_exists(&mut self, name: &str) -> Result<bool> {
        Ok(self.stream_len(name)?.is_some())
    }

    /// Read the whole stream into memory.
    fn read_stream(&mut self, name: &str) -> Result<Vec<u8>>;
}

/// [`StructuredStorage`] backed by [`OleFile`] over a read-only file handle.
#[derive(Debug)]
pub struct OleStorage {
    path: PathBuf,
    ole: OleFile<File>,
}

impl StructuredStorage for OleStorage {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::from_io(e, path))?;
        let ole = OleFile::open(file).map_err(|e| Error::from_ole(e, path, ""))?;
        Ok(Self {
            path: path.to_path_buf(),
            ole,
        })
    }

    fn stream_len(&mut self, name: &str) -> Result<Option<u64>> {
        match self.ole.find_root_stream(name) {
            Ok(entry) => Ok(Some(entry.size)),
            Err(crate::ole::OleError::StreamNotFound) => Ok(None),
            Err(e) => Err(Error::from_ole(e, &self.path, name)),
        }
    }

    fn read_stream(&mut self, name: &str) -> Result<Vec<u8>> {
        self.ole
            .open_stream(name)
            .map_err(|e| Error::from_ole(e, &self.path, name))
    }
}

/// Extracts single named streams from compound containers.
#[derive(Debug, Clone)]
pub struct ContainerReader {
    max_stream_size: u64,
}

impl Default for ContainerReader {
    fn default() -> Self {
        Self {
            max_stream_size: DEFAULT_MAX_STREAM_SIZE,
        }
    }
}

impl ContainerReader {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the largest stream, in bytes, that will be read into memory.
    pub fn with_max_stream_size(mut self, limit: u64) -> Self {
        self.max_stream_size = limit;
        self
    }

    pub fn max_stream_size(&self) -> u64 {
        self.max_stream_size
    }

    /// Extract `stream_name` from the OLE container at `path`.
    pub fn extract(&self, path: &Path, stream_name: &str) -> Result<Vec<u8>> {
        self.extract_with::<OleStorage>(path, stream_name)
    }

    /// Extract `stream_name` using the storage backend `S`.
    ///
    /// The signature is checked before the backend is opened, so a file in
    /// another format always fails with [`Error::NotAContainer`]. The
    /// backend is dropped before this returns.
    pub fn extract_with<S: StructuredStorage>(&self, path: &Path, stream_name: &str) -> Result<Vec<u8>> {
        if !has_container_signature(path)? {
            return Err(Error::NotAContainer {
                path: path.to_path_buf(),
            });
        }

        let mut storage = S::open(path)?;
        let size = storage
            .stream_len(stream_name)?
            .ok_or_else(|| Error::StreamNotFound {
                path: path.to_path_buf(),
                stream: stream_name.to_string(),
            })?;

        if size > self.max_stream_size {
            return Err(Error::StreamTooLarge {
                path: path.to_path_buf(),
                stream: stream_name.to_string(),
                size,
                limit: self.max_stream_size,
            });
        }

        storage.read_stream(stream_name)
    }
}

/// Extract one top-level stream with the default size limit.
pub fn extract_stream(path: impl AsRef<Path>, stream_name: &str) -> Result<Vec<u8>> {
    ContainerReader::new().extract(path.as_ref(), stream_name)
}

/// Check whether the file at `path` starts with the compound-file signature.
pub fn has_container_signature(path: &Path) -> Result<bool> {
    let file = File::open(path).map_err(|e| Error::from_io(e, path))?;
    let mut leading = Vec::with_capacity(MAGIC.len());
    file.take(MAGIC.len() as u64)
        .read_to_end(&mut leading)
        .map_err(|e| Error::from_io(e, path))?;
    Ok(is_ole_file(&leading))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_container(path: &Path, streams: &[(&str, &[u8])]) {
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .expect("create fixture");
        let mut comp = cfb::CompoundFile::create(file).expect("create compound file");
        for (name, data) in streams {
            let mut stream = comp.create_stream(name).expect("create stream");
            stream.write_all(data).expect("write stream");
            stream.flush().expect("flush stream");
        }
        comp.flush().expect("flush compound file");
    }

    #[test]
    fn test_extract_basic_file_info() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("model.rvt");
        write_container(&path, &[("/BasicFileInfo", b"metadata bytes"), ("/Contents", b"x")]);

        let bytes = extract_stream(&path, BASIC_FILE_INFO_STREAM).unwrap();
        assert_eq!(bytes, b"metadata bytes");
    }

    #[test]
    fn test_foreign_file_is_not_a_container() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("model.rvt");
        std::fs::write(&path, b"<?xml version=\"1.0\"?><model/>").unwrap();

        let err = extract_stream(&path, BASIC_FILE_INFO_STREAM).unwrap_err();
        assert_eq!(err.kind(), FailureKind::NotAContainer);
    }

    #[test]
    fn test_tiny_file_is_not_a_container() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("empty.rvt");
        std::fs::write(&path, b"").unwrap();

        assert!(!has_container_signature(&path).unwrap());
        let err = extract_stream(&path, BASIC_FILE_INFO_STREAM).unwrap_err();
        assert!(matches!(err, Error::NotAContainer { .. }));
    }

    #[test]
    fn test_container_without_stream() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("old.rvt");
        write_container(&path, &[("/Contents", b"no metadata here")]);

        let err = extract_stream(&path, BASIC_FILE_INFO_STREAM).unwrap_err();
        match err {
            Error::StreamNotFound { stream, .. } => assert_eq!(stream, BASIC_FILE_INFO_STREAM),
            other => panic!("expected StreamNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_stream_over_limit() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("model.rvt");
        write_container(&path, &[("/BasicFileInfo", &[7u8; 100])]);

        let reader = ContainerReader::new().with_max_stream_size(64);
        let err = reader.extract(&path, BASIC_FILE_INFO_STREAM).unwrap_err();
        match err {
            Error::StreamTooLarge { size, limit, .. } => {
                assert_eq!(size, 100);
                assert_eq!(limit, 64);
            },
            other => panic!("expected StreamTooLarge, got {:?}", other),
        }

        let reader = ContainerReader::new().with_max_stream_size(100);
        assert_eq!(reader.extract(&path, BASIC_FILE_INFO_STREAM).unwrap().len(), 100);
    }

    #[test]
    fn test_missing_file_is_unexpected() {
        let dir = tempdir().expect("create temp dir");
        let err = extract_stream(dir.path().join("gone.rvt"), BASIC_FILE_INFO_STREAM).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Unexpected);
    }

    #[test]
    fn test_storage_capability() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("model.rvt");
        write_container(&path, &[("/BasicFileInfo", b"abc")]);

        let mut storage = OleStorage::open(&path).unwrap();
        assert!(storage.stream_exists("BasicFileInfo").unwrap());
        assert!(!storage.stream_exists("PartAtom").unwrap());
        assert_eq!(storage.stream_len("BasicFileInfo").unwrap(), Some(3));
        assert_eq!(storage.read_stream("BasicFileInfo").unwrap(), b"abc");
    }
}
