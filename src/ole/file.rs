use super::binary::{read_u16_le, read_u32_le, read_u32_table};
use super::consts::*;
use fixedbitset::FixedBitSet;
use std::io::{self, Read, Seek, SeekFrom};
use zerocopy::{FromBytes, LE, U16, U32, U64};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Raw OLE directory entry structure (128 bytes)
///
/// This represents the on-disk format of a directory entry.
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
#[allow(dead_code)]
struct RawDirectoryEntry {
    /// Entry name in UTF-16LE (64 bytes, null-padded)
    name: [u8; 64],
    /// Length of name in bytes (including null terminator)
    name_len: U16<LE>,
    /// Entry type (1 = storage, 2 = stream, 5 = root)
    entry_type: u8,
    /// Node color (0 = red, 1 = black)
    node_color: u8,
    /// Left sibling SID
    sid_left: U32<LE>,
    /// Right sibling SID
    sid_right: U32<LE>,
    /// Child SID
    sid_child: U32<LE>,
    /// CLSID (16 bytes)
    clsid: [u8; 16],
    /// State bits
    state_bits: U32<LE>,
    /// Creation time (FILETIME)
    creation_time: U64<LE>,
    /// Modified time (FILETIME)
    modified_time: U64<LE>,
    /// Starting sector
    start_sector: U32<LE>,
    /// Stream size
    stream_size: U64<LE>,
}

/// Read-only view of an OLE2 structured storage file.
///
/// Opening parses the header, the FAT (including DIFAT extensions) and the
/// MiniFAT, and keeps the raw directory stream. Directory entries are only
/// decoded when a lookup walks over them, and lookups never leave the root
/// storage: the only question this type answers is "which bytes belong to
/// the top-level stream called X".
#[derive(Debug)]
pub struct OleFile<R: Read + Seek> {
    /// File handle or reader
    reader: R,
    /// Total file size in bytes
    file_size: u64,
    /// Sector size (512 or 4096 bytes)
    sector_size: usize,
    /// Mini sector size (typically 64 bytes)
    mini_sector_size: usize,
    /// Mini stream cutoff size (typically 4096 bytes)
    mini_stream_cutoff: u32,
    /// File Allocation Table - maps sector to next sector in chain
    fat: Vec<u32>,
    /// Mini FAT - for streams smaller than cutoff size
    minifat: Vec<u32>,
    /// Raw directory stream, 128 bytes per entry
    directory: Vec<u8>,
    /// Root directory entry (SID 0)
    root: DirectoryEntry,
    /// Mini stream data (loaded on demand)
    ministream: Option<Vec<u8>>,
}

/// Represents an OLE directory entry (stream or storage)
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    /// Storage ID (index in directory)
    pub sid: u32,
    /// Entry name (UTF-16 decoded to UTF-8)
    pub name: String,
    /// Entry type (stream, storage, root, etc.)
    pub entry_type: u8,
    /// Index of left sibling in red-black tree
    pub sid_left: u32,
    /// Index of right sibling in red-black tree
    pub sid_right: u32,
    /// Index of child node in red-black tree
    pub sid_child: u32,
    /// First sector of the stream
    pub start_sector: u32,
    /// Size of the stream in bytes
    pub size: u64,
    /// Whether this stream is in MiniFAT
    pub is_minifat: bool,
}

impl DirectoryEntry {
    /// Whether this entry is a stream object
    pub fn is_stream(&self) -> bool {
        self.entry_type == STGTY_STREAM
    }
}

/// Error types for OLE file parsing
#[derive(Debug)]
pub enum OleError {
    Io(io::Error),
    InvalidFormat(String),
    InvalidData(String),
    NotOleFile,
    CorruptedFile(String),
    StreamNotFound,
}

impl From<io::Error> for OleError {
    fn from(err: io::Error) -> Self {
        OleError::Io(err)
    }
}

impl std::fmt::Display for OleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OleError::Io(e) => write!(f, "IO error: {}", e),
            OleError::InvalidFormat(s) => write!(f, "Invalid format: {}", s),
            OleError::InvalidData(s) => write!(f, "Invalid data: {}", s),
            OleError::NotOleFile => write!(f, "Not an OLE file"),
            OleError::CorruptedFile(s) => write!(f, "Corrupted file: {}", s),
            OleError::StreamNotFound => write!(f, "Stream not found"),
        }
    }
}

impl std::error::Error for OleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OleError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl<R: Read + Seek> OleFile<R> {
    /// Open and parse an OLE file from a reader
    ///
    /// Fails with [`OleError::NotOleFile`] when the first eight bytes are not
    /// the OLE signature, and with [`OleError::CorruptedFile`] or
    /// [`OleError::InvalidFormat`] when the signature is present but the
    /// header or allocation tables are unusable.
    pub fn open(mut reader: R) -> Result<Self, OleError> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        // Read as much of the 512-byte header as the file holds
        let mut header = [0u8; HEADER_SIZE];
        let available = file_size.min(HEADER_SIZE as u64) as usize;
        reader.read_exact(&mut header[..available])?;

        if available < MAGIC.len() || &header[0..8] != MAGIC {
            return Err(OleError::NotOleFile);
        }
        if file_size < MINIMAL_OLEFILE_SIZE {
            return Err(OleError::CorruptedFile(format!(
                "File is only {} bytes long",
                file_size
            )));
        }

        let dll_version = read_u16_le(&header, 0x1A)?;
        let byte_order = read_u16_le(&header, 0x1C)?;
        let sector_shift = read_u16_le(&header, 0x1E)?;
        let mini_sector_shift = read_u16_le(&header, 0x20)?;
        let num_fat_sectors = read_u32_le(&header, 0x2C)?;
        let first_dir_sector = read_u32_le(&header, 0x30)?;
        let mini_stream_cutoff = read_u32_le(&header, 0x38)?;
        let first_minifat_sector = read_u32_le(&header, 0x3C)?;
        let num_minifat_sectors = read_u32_le(&header, 0x40)?;
        let first_difat_sector = read_u32_le(&header, 0x44)?;
        let num_difat_sectors = read_u32_le(&header, 0x48)?;

        // Validate byte order (must be little-endian)
        if byte_order != BYTE_ORDER_LE {
            return Err(OleError::InvalidFormat("Invalid byte order".to_string()));
        }
        if !(7..=16).contains(&sector_shift) || mini_sector_shift >= sector_shift {
            return Err(OleError::InvalidFormat(format!(
                "Unsupported sector shift {} / mini sector shift {}",
                sector_shift, mini_sector_shift
            )));
        }

        let sector_size = 1usize << sector_shift;
        let mini_sector_size = 1usize << mini_sector_shift;

        // Validate sector size matches DLL version
        if (dll_version == 3 && sector_size != 512) || (dll_version == 4 && sector_size != 4096) {
            return Err(OleError::InvalidFormat("Sector size mismatch".to_string()));
        }

        let mut ole = OleFile {
            reader,
            file_size,
            sector_size,
            mini_sector_size,
            mini_stream_cutoff,
            fat: Vec::new(),
            minifat: Vec::new(),
            directory: Vec::new(),
            root: DirectoryEntry {
                sid: 0,
                name: String::new(),
                entry_type: STGTY_EMPTY,
                sid_left: NOSTREAM,
                sid_right: NOSTREAM,
                sid_child: NOSTREAM,
                start_sector: ENDOFCHAIN,
                size: 0,
                is_minifat: false,
            },
            ministream: None,
        };

        ole.load_fat(&header, num_fat_sectors, first_difat_sector, num_difat_sectors)?;
        ole.load_directory(first_dir_sector)?;

        if num_minifat_sectors > 0 {
            ole.load_minifat(first_minifat_sector)?;
        }

        Ok(ole)
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn sector_size(&self) -> usize {
        self.sector_size
    }

    /// The root storage entry (SID 0)
    pub fn root(&self) -> &DirectoryEntry {
        &self.root
    }

    /// Load the File Allocation Table (FAT)
    ///
    /// The first 109 FAT sector indexes are stored in the header, additional
    /// indexes are stored in a chain of DIFAT sectors.
    fn load_fat(
        &mut self,
        header: &[u8; HEADER_SIZE],
        num_fat_sectors: u32,
        first_difat_sector: u32,
        num_difat_sectors: u32,
    ) -> Result<(), OleError> {
        // Every FAT sector must fit inside the file
        let sector_count = self.file_size / self.sector_size as u64;
        if u64::from(num_fat_sectors) > sector_count {
            return Err(OleError::CorruptedFile(format!(
                "Header declares {} FAT sectors but the file holds only {} sectors",
                num_fat_sectors, sector_count
            )));
        }

        let wanted = num_fat_sectors as usize;
        let mut fat_sectors: Vec<u32> = read_u32_table(&header[0x4C..HEADER_SIZE])
            .into_iter()
            .take(HEADER_DIFAT_ENTRIES.min(wanted))
            .collect();

        if fat_sectors.len() < wanted && num_difat_sectors > 0 {
            // Last slot of each DIFAT sector points at the next DIFAT sector
            let entries_per_sector = (self.sector_size / 4) - 1;
            let mut visited = FixedBitSet::with_capacity(sector_count as usize);
            let mut difat_sector = first_difat_sector;

            for _ in 0..num_difat_sectors {
                if difat_sector == ENDOFCHAIN || difat_sector == FREESECT {
                    break;
                }
                if difat_sector as usize >= visited.len() {
                    return Err(OleError::CorruptedFile(format!(
                        "DIFAT sector {} lies beyond the end of the file",
                        difat_sector
                    )));
                }
                if visited.put(difat_sector as usize) {
                    return Err(OleError::CorruptedFile("Cycle in DIFAT chain".to_string()));
                }
                let table = read_u32_table(&self.read_sector(difat_sector)?);
                let remaining = wanted - fat_sectors.len();
                fat_sectors.extend(table[..entries_per_sector].iter().take(remaining));
                difat_sector = table[entries_per_sector];

                if fat_sectors.len() >= wanted {
                    break;
                }
            }
        }

        if fat_sectors.len() < wanted {
            return Err(OleError::CorruptedFile(format!(
                "Header declares {} FAT sectors but only {} are listed",
                wanted,
                fat_sectors.len()
            )));
        }

        let entries_per_sector = self.sector_size / 4;
        self.fat.reserve(fat_sectors.len() * entries_per_sector);
        for sector_id in fat_sectors {
            if sector_id == FREESECT || sector_id == ENDOFCHAIN {
                return Err(OleError::CorruptedFile(
                    "FAT sector list contains an unallocated entry".to_string(),
                ));
            }
            let sector_data = self.read_sector(sector_id)?;
            self.fat.extend(read_u32_table(&sector_data));
        }

        Ok(())
    }

    /// Load the Mini FAT (for small streams)
    fn load_minifat(&mut self, first_minifat_sector: u32) -> Result<(), OleError> {
        let minifat_data = self.read_chain(first_minifat_sector, usize::MAX)?;
        self.minifat = read_u32_table(&minifat_data);
        Ok(())
    }

    /// Read the directory stream and decode the root entry
    fn load_directory(&mut self, first_dir_sector: u32) -> Result<(), OleError> {
        self.directory = self.read_chain(first_dir_sector, usize::MAX)?;

        if self.entry_count() == 0 {
            return Err(OleError::CorruptedFile("Empty directory".to_string()));
        }

        let root = self.entry(0)?;
        if root.entry_type != STGTY_ROOT {
            return Err(OleError::CorruptedFile(
                "First directory entry is not the root storage".to_string(),
            ));
        }
        self.root = root;
        Ok(())
    }

    /// Number of directory entry slots in the directory stream
    fn entry_count(&self) -> usize {
        self.directory.len() / DIRENTRY_SIZE
    }

    /// Decode the directory entry stored at `sid`
    fn entry(&self, sid: u32) -> Result<DirectoryEntry, OleError> {
        let index = sid as usize;
        if index >= self.entry_count() {
            return Err(OleError::CorruptedFile(format!(
                "Invalid directory entry index {}",
                sid
            )));
        }

        let offset = index * DIRENTRY_SIZE;
        let raw = RawDirectoryEntry::read_from_bytes(&self.directory[offset..offset + DIRENTRY_SIZE])
            .map_err(|_| OleError::InvalidFormat("Failed to parse directory entry".to_string()))?;

        let name_len = raw.name_len.get() as usize;
        let name = decode_utf16le(&raw.name[0..name_len.saturating_sub(2).min(64)]);

        // 512-byte sector files only use the low 32 bits of the size
        let size = if self.sector_size == 512 {
            raw.stream_size.get() & 0xFFFFFFFF
        } else {
            raw.stream_size.get()
        };

        let is_minifat = size < self.mini_stream_cutoff as u64 && raw.entry_type == STGTY_STREAM;

        Ok(DirectoryEntry {
            sid,
            name,
            entry_type: raw.entry_type,
            sid_left: raw.sid_left.get(),
            sid_right: raw.sid_right.get(),
            sid_child: raw.sid_child.get(),
            start_sector: raw.start_sector.get(),
            size,
            is_minifat,
        })
    }

    /// Find a stream among the direct children of the root storage.
    ///
    /// Walks the root's sibling tree only; child storages are never entered.
    /// Names compare case-insensitively.
    pub fn find_root_stream(&self, name: &str) -> Result<DirectoryEntry, OleError> {
        let wanted = name.to_lowercase();
        let mut visited = FixedBitSet::with_capacity(self.entry_count());
        let mut pending = vec![self.root.sid_child];

        while let Some(sid) = pending.pop() {
            if sid == NOSTREAM {
                continue;
            }
            if sid as usize >= self.entry_count() {
                return Err(OleError::CorruptedFile(format!(
                    "Invalid directory entry index {}",
                    sid
                )));
            }
            if visited.put(sid as usize) {
                return Err(OleError::CorruptedFile(
                    "Cycle in directory sibling tree".to_string(),
                ));
            }

            let entry = self.entry(sid)?;
            if entry.name.to_lowercase() == wanted {
                return if entry.is_stream() {
                    Ok(entry)
                } else {
                    Err(OleError::StreamNotFound)
                };
            }

            pending.push(entry.sid_right);
            pending.push(entry.sid_left);
        }

        Err(OleError::StreamNotFound)
    }

    /// Check if a top-level stream exists
    pub fn exists(&self, name: &str) -> bool {
        self.find_root_stream(name).is_ok()
    }

    /// Read a top-level stream by name and return its contents
    pub fn open_stream(&mut self, name: &str) -> Result<Vec<u8>, OleError> {
        let entry = self.find_root_stream(name)?;
        self.read_entry(&entry)
    }

    /// Read the contents of a stream entry previously returned by a lookup
    pub fn read_entry(&mut self, entry: &DirectoryEntry) -> Result<Vec<u8>, OleError> {
        if !entry.is_stream() {
            return Err(OleError::InvalidFormat("Not a stream".to_string()));
        }

        let size = usize::try_from(entry.size).map_err(|_| {
            OleError::CorruptedFile(format!("Stream size {} does not fit in memory", entry.size))
        })?;

        let mut data = if entry.is_minifat {
            self.read_mini_chain(entry.start_sector, size)?
        } else {
            self.read_chain(entry.start_sector, size)?
        };

        if data.len() < size {
            return Err(OleError::CorruptedFile(format!(
                "Stream '{}' declares {} bytes but its chain holds {}",
                entry.name,
                size,
                data.len()
            )));
        }
        data.truncate(size);
        Ok(data)
    }

    /// Read a single sector from the file
    fn read_sector(&mut self, sector_id: u32) -> Result<Vec<u8>, OleError> {
        // Sector position in file: (sector_id + 1) * sector_size
        let position = ((sector_id as u64) + 1) * (self.sector_size as u64);
        if position + self.sector_size as u64 > self.file_size {
            return Err(OleError::CorruptedFile(format!(
                "Sector {} lies beyond the end of the file",
                sector_id
            )));
        }
        self.reader.seek(SeekFrom::Start(position))?;

        let mut buffer = vec![0u8; self.sector_size];
        self.reader.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    /// Follow a FAT chain, stopping once `max_len` bytes have been collected
    fn read_chain(&mut self, start_sector: u32, max_len: usize) -> Result<Vec<u8>, OleError> {
        let mut data = Vec::new();
        let mut visited = FixedBitSet::with_capacity(self.fat.len());
        let mut sector = start_sector;

        while sector != ENDOFCHAIN && data.len() < max_len {
            let index = sector as usize;
            if index >= self.fat.len() {
                return Err(OleError::CorruptedFile(
                    "Invalid sector index in FAT".to_string(),
                ));
            }
            if visited.put(index) {
                return Err(OleError::CorruptedFile("Cycle in FAT chain".to_string()));
            }

            let sector_data = self.read_sector(sector)?;
            data.extend_from_slice(&sector_data);
            sector = self.fat[index];
        }

        Ok(data)
    }

    /// Follow a MiniFAT chain inside the mini stream
    fn read_mini_chain(&mut self, start_sector: u32, max_len: usize) -> Result<Vec<u8>, OleError> {
        if self.ministream.is_none() {
            let root_size = usize::try_from(self.root.size).unwrap_or(usize::MAX);
            let mut ministream = self.read_chain(self.root.start_sector, root_size)?;
            ministream.truncate(root_size);
            self.ministream = Some(ministream);
        }
        let ministream = self.ministream.as_deref().unwrap_or_default();

        let mut data = Vec::new();
        let mut visited = FixedBitSet::with_capacity(self.minifat.len());
        let mut sector = start_sector;

        while sector != ENDOFCHAIN && data.len() < max_len {
            let index = sector as usize;
            if index >= self.minifat.len() {
                return Err(OleError::CorruptedFile(
                    "Invalid sector index in MiniFAT".to_string(),
                ));
            }
            if visited.put(index) {
                return Err(OleError::CorruptedFile("Cycle in MiniFAT chain".to_string()));
            }

            let position = index * self.mini_sector_size;
            if position + self.mini_sector_size > ministream.len() {
                return Err(OleError::CorruptedFile(
                    "Mini sector out of bounds".to_string(),
                ));
            }

            data.extend_from_slice(&ministream[position..position + self.mini_sector_size]);
            sector = self.minifat[index];
        }

        Ok(data)
    }
}

/// Decode UTF-16LE bytes to String
fn decode_utf16le(bytes: &[u8]) -> String {
    let utf16_chars: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| {
            U16::<LE>::read_from_bytes(chunk)
                .map(|v| v.get())
                .unwrap_or(0)
        })
        .collect();

    // Decode UTF-16 to String, replacing invalid sequences
    String::from_utf16_lossy(&utf16_chars)
        .trim_end_matches('\0')
        .to_string()
}

/// Check if a file/data is an OLE file by checking magic bytes
pub fn is_ole_file(data: &[u8]) -> bool {
    data.len() >= MAGIC.len() && &data[0..8] == MAGIC
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn build(version: cfb::Version, streams: &[(&str, &[u8])], storages: &[&str]) -> Vec<u8> {
        let mut comp = cfb::CompoundFile::create_with_version(version, Cursor::new(Vec::new()))
            .expect("create compound file");
        for storage in storages {
            comp.create_storage(storage).expect("create storage");
        }
        for (path, data) in streams {
            let mut stream = comp.create_stream(path).expect("create stream");
            stream.write_all(data).expect("write stream");
            stream.flush().expect("flush stream");
        }
        comp.flush().expect("flush compound file");
        comp.into_inner().into_inner()
    }

    #[test]
    fn test_open_rejects_foreign_signature() {
        let data = b"PK\x03\x04 this is a zip, not an OLE container".to_vec();
        let err = OleFile::open(Cursor::new(data)).unwrap_err();
        assert!(matches!(err, OleError::NotOleFile));
    }

    #[test]
    fn test_open_rejects_empty_input() {
        let err = OleFile::open(Cursor::new(Vec::new())).unwrap_err();
        assert!(matches!(err, OleError::NotOleFile));
    }

    #[test]
    fn test_truncated_container_is_corrupted_not_foreign() {
        let mut data = MAGIC.to_vec();
        data.extend_from_slice(&[0u8; 100]);
        let err = OleFile::open(Cursor::new(data)).unwrap_err();
        assert!(matches!(err, OleError::CorruptedFile(_)));
    }

    #[test]
    fn test_read_mini_stream_v3() {
        let payload = b"small payload stored in the mini stream";
        let data = build(cfb::Version::V3, &[("/BasicFileInfo", payload)], &[]);

        let mut ole = OleFile::open(Cursor::new(data)).unwrap();
        assert_eq!(ole.sector_size(), 512);

        let entry = ole.find_root_stream("BasicFileInfo").unwrap();
        assert!(entry.is_minifat);
        assert_eq!(ole.read_entry(&entry).unwrap(), payload);
    }

    #[test]
    fn test_read_regular_stream_v4() {
        let payload: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        let data = build(cfb::Version::V4, &[("/BasicFileInfo", &payload)], &[]);

        let mut ole = OleFile::open(Cursor::new(data)).unwrap();
        assert_eq!(ole.sector_size(), 4096);

        let entry = ole.find_root_stream("BasicFileInfo").unwrap();
        assert!(!entry.is_minifat);
        assert_eq!(entry.size, payload.len() as u64);
        assert_eq!(ole.open_stream("BasicFileInfo").unwrap(), payload);
    }

    #[test]
    fn test_lookup_among_many_siblings_is_case_insensitive() {
        let data = build(
            cfb::Version::V3,
            &[
                ("/Alpha", b"a"),
                ("/Contents", b"c"),
                ("/BasicFileInfo", b"basic"),
                ("/PartAtom", b"p"),
                ("/Zulu", b"z"),
            ],
            &[],
        );

        let mut ole = OleFile::open(Cursor::new(data)).unwrap();
        assert!(ole.exists("basicfileinfo"));
        assert_eq!(ole.open_stream("BASICFILEINFO").unwrap(), b"basic");
        assert_eq!(ole.open_stream("Zulu").unwrap(), b"z");
    }

    #[test]
    fn test_missing_stream_reports_stream_not_found() {
        let data = build(cfb::Version::V3, &[("/Contents", b"c")], &[]);
        let mut ole = OleFile::open(Cursor::new(data)).unwrap();

        assert!(!ole.exists("BasicFileInfo"));
        assert!(matches!(
            ole.open_stream("BasicFileInfo"),
            Err(OleError::StreamNotFound)
        ));
    }

    #[test]
    fn test_lookup_does_not_descend_into_storages() {
        let data = build(
            cfb::Version::V3,
            &[("/Nested/BasicFileInfo", b"hidden")],
            &["/Nested"],
        );
        let ole = OleFile::open(Cursor::new(data)).unwrap();

        assert!(matches!(
            ole.find_root_stream("BasicFileInfo"),
            Err(OleError::StreamNotFound)
        ));
        // A storage with the requested name is not a stream either
        assert!(matches!(
            ole.find_root_stream("Nested"),
            Err(OleError::StreamNotFound)
        ));
    }

    #[test]
    fn test_empty_stream_reads_as_empty() {
        let data = build(cfb::Version::V3, &[("/BasicFileInfo", b"")], &[]);
        let mut ole = OleFile::open(Cursor::new(data)).unwrap();
        assert!(ole.open_stream("BasicFileInfo").unwrap().is_empty());
    }

    /// Version 3 header with `sectors` zeroed sectors behind it, every header
    /// DIFAT slot naming sector 1 and a DIFAT chain starting at sector 0.
    fn looping_difat_file(sectors: usize, num_fat_sectors: u32) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_SIZE + sectors * 512];
        data[0..8].copy_from_slice(MAGIC);
        data[0x18..0x1A].copy_from_slice(&0x3Eu16.to_le_bytes());
        data[0x1A..0x1C].copy_from_slice(&3u16.to_le_bytes());
        data[0x1C..0x1E].copy_from_slice(&BYTE_ORDER_LE.to_le_bytes());
        data[0x1E..0x20].copy_from_slice(&9u16.to_le_bytes());
        data[0x20..0x22].copy_from_slice(&6u16.to_le_bytes());
        data[0x2C..0x30].copy_from_slice(&num_fat_sectors.to_le_bytes());
        data[0x30..0x34].copy_from_slice(&2u32.to_le_bytes());
        data[0x38..0x3C].copy_from_slice(&4096u32.to_le_bytes());
        data[0x3C..0x40].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
        data[0x44..0x48].copy_from_slice(&0u32.to_le_bytes());
        data[0x48..0x4C].copy_from_slice(&u32::MAX.to_le_bytes());
        for slot in 0..HEADER_DIFAT_ENTRIES {
            let offset = 0x4C + slot * 4;
            data[offset..offset + 4].copy_from_slice(&1u32.to_le_bytes());
        }

        // DIFAT sector 0: FAT ids naming sector 1, last slot pointing at itself
        let difat = HEADER_SIZE;
        for slot in 0..127 {
            let offset = difat + slot * 4;
            data[offset..offset + 4].copy_from_slice(&1u32.to_le_bytes());
        }
        data[difat + 508..difat + 512].copy_from_slice(&0u32.to_le_bytes());
        data
    }

    #[test]
    fn test_self_referencing_difat_sector_is_corrupted() {
        let data = looping_difat_file(300, 300);
        let err = OleFile::open(Cursor::new(data)).unwrap_err();
        match err {
            OleError::CorruptedFile(message) => assert!(message.contains("Cycle in DIFAT")),
            other => panic!("expected CorruptedFile, got {:?}", other),
        }
    }

    #[test]
    fn test_fat_sector_count_is_bounded_by_file_size() {
        let data = looping_difat_file(3, 500_000);
        let err = OleFile::open(Cursor::new(data)).unwrap_err();
        match err {
            OleError::CorruptedFile(message) => assert!(message.contains("500000 FAT sectors")),
            other => panic!("expected CorruptedFile, got {:?}", other),
        }
    }

    #[test]
    fn test_is_ole_file() {
        assert!(is_ole_file(MAGIC));
        assert!(!is_ole_file(b"AC1027"));
        assert!(!is_ole_file(&MAGIC[..4]));
    }
}
