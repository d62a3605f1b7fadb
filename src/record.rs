//! Per-file inventory records.
use crate::container::{ContainerReader, BASIC_FILE_INFO_STREAM};
use crate::decoder::{decode_fields, MetadataFields};
use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Category of a cross-file reference reported by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LinkKind {
    /// External CAD drawing reference
    #[serde(rename = "CADLink")]
    CadLink,
    /// DWF markup reference
    #[serde(rename = "DWFMarkup")]
    DwfMarkup,
    /// Linked sub-model
    #[serde(rename = "RevitLink")]
    RevitLink,
}

impl LinkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkKind::CadLink => "CADLink",
            LinkKind::DwfMarkup => "DWFMarkup",
            LinkKind::RevitLink => "RevitLink",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference from one design file to another, as reported by the host.
///
/// Paths are carried through exactly as supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedFileReference {
    pub link_kind: LinkKind,
    pub relative_path: String,
    pub absolute_path: String,
}

impl LinkedFileReference {
    pub fn new(
        link_kind: LinkKind,
        relative_path: impl Into<String>,
        absolute_path: impl Into<String>,
    ) -> Self {
        Self {
            link_kind,
            relative_path: relative_path.into(),
            absolute_path: absolute_path.into(),
        }
    }
}

/// Metadata extracted from one design file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    file_path: String,
    pub software_version: String,
    pub is_central: bool,
    pub central_file_name: String,
    pub raw_text: String,
    pub links: Vec<LinkedFileReference>,
}

impl FileRecord {
    /// Empty record for `file_path`.
    pub fn new(file_path: impl Into<String>) -> Self {
        Self::from_fields(file_path, MetadataFields::default())
    }

    /// Record for `file_path` carrying decoded stream fields and no links.
    pub fn from_fields(file_path: impl Into<String>, fields: MetadataFields) -> Self {
        Self {
            file_path: file_path.into(),
            software_version: fields.software_version,
            is_central: fields.is_central,
            central_file_name: fields.central_file_name,
            raw_text: fields.raw_text,
            links: Vec::new(),
        }
    }

    pub fn with_links(mut self, links: Vec<LinkedFileReference>) -> Self {
        self.links = links;
        self
    }

    /// Absolute path of the file this record describes
    pub fn file_path(&self) -> &str {
        &self.file_path
    }
}

/// Read and decode the `BasicFileInfo` stream of the design file at `path`.
pub fn extract_record(path: impl AsRef<Path>) -> Result<FileRecord> {
    extract_record_with(&ContainerReader::new(), path.as_ref())
}

/// [`extract_record`] with an explicitly configured reader.
///
/// Either the stream is read and a complete record is returned, or an error
/// is returned and nothing is produced.
pub fn extract_record_with(reader: &ContainerReader, path: &Path) -> Result<FileRecord> {
    let absolute = std::path::absolute(path).map_err(|e| Error::from_io(e, path))?;
    let raw = reader.extract(&absolute, BASIC_FILE_INFO_STREAM)?;
    let fields = decode_fields(&raw);
    Ok(FileRecord::from_fields(
        absolute.to_string_lossy().into_owned(),
        fields,
    ))
}
