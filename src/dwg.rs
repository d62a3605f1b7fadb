//! AutoCAD drawing version probe.
//!
//! A DWG file starts with a six-byte ASCII release tag such as `AC1027`.
use crate::error::{Error, Result};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Length of the release tag at the start of a DWG file
pub const VERSION_TAG_LEN: usize = 6;

/// Version information for one drawing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawingRecord {
    pub file_path: String,
    pub version: String,
}

/// Map a DWG release tag to a product label.
pub fn version_label(tag: &[u8]) -> &'static str {
    match tag {
        b"AC1032" => "AutoCAD 2018",
        b"AC1027" => "AutoCAD 2013",
        b"AC1024" => "AutoCAD 2010",
        b"AC1021" => "AutoCAD 2007",
        b"AC1018" => "AutoCAD 2004",
        b"AC1015" => "AutoCAD 2000",
        b"AC1014" => "AutoCAD R14",
        _ => "Prior AutoCAD R14",
    }
}

/// Read the release tag of the drawing at `path`.
pub fn detect_version(path: impl AsRef<Path>) -> Result<DrawingRecord> {
    let path = path.as_ref();
    let absolute = std::path::absolute(path).map_err(|e| Error::from_io(e, path))?;
    let file = File::open(&absolute).map_err(|e| Error::from_io(e, path))?;

    let mut tag = Vec::with_capacity(VERSION_TAG_LEN);
    file.take(VERSION_TAG_LEN as u64)
        .read_to_end(&mut tag)
        .map_err(|e| Error::from_io(e, path))?;
    if tag.len() < VERSION_TAG_LEN {
        return Err(Error::Unexpected(format!(
            "{} is too short to carry a DWG version tag",
            path.display()
        )));
    }

    Ok(DrawingRecord {
        file_path: absolute.to_string_lossy().into_owned(),
        version: version_label(&tag).to_string(),
    })
}
