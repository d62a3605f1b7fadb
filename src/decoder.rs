//! Decoding of the `BasicFileInfo` stream.
//!
//! The stream has no schema. It mixes binary padding with text written in
//! UTF-16LE by some writers and UTF-16BE by others, and its text records are
//! only separated by NUL characters and CR/LF pairs. The decoder therefore
//! decodes the whole buffer twice, once per byte order, and scans every
//! record of both decodings for three markers:
//!
//! | Marker               | Field               | Value                          |
//! |----------------------|---------------------|--------------------------------|
//! | `sharing:`           | `is_central`        | text after `sharing: ` == `Central` |
//! | `Central Model Path` | `central_file_name` | record from UTF-16 unit 19     |
//! | `Revit Build:`       | `software_version`  | record from UTF-16 unit 13     |
//!
//! Both passes write into the same [`MetadataFields`], little-endian first,
//! so a marker found by the big-endian pass always replaces the value found
//! by the little-endian one. Archived ledgers were produced with exactly this
//! order and these offsets. Offsets count UTF-16 code units, so a character
//! outside the Basic Multilingual Plane occupies two positions.
//!
//! # Example
//!
//! ```
//! use designfile_info::decoder::decode_fields;
//!
//! let bytes: Vec<u8> = "Revit Build: 20250101_1515"
//!     .encode_utf16()
//!     .flat_map(|unit| unit.to_le_bytes())
//!     .collect();
//!
//! let fields = decode_fields(&bytes);
//! assert_eq!(fields.software_version, "20250101_1515");
//! assert!(!fields.is_central);
//! ```
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};
use serde::Serialize;
use std::borrow::Cow;

const SHARING_MARKER: &str = "sharing:";
const SHARING_VALUE_PREFIX: &str = "sharing: ";
/// Start of the sharing value when the record has `sharing:` without a space
const SHARING_FALLBACK_OFFSET: usize = 8;
const CENTRAL_VALUE: &str = "Central";

const CENTRAL_PATH_MARKER: &str = "Central Model Path";
const CENTRAL_PATH_OFFSET: usize = 19;

const BUILD_MARKER: &str = "Revit Build:";
const BUILD_OFFSET: usize = 13;

/// Byte order used by one decoding pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextPass {
    LittleEndian,
    BigEndian,
}

impl TextPass {
    /// Passes in the order they are applied; the last one wins.
    pub const ORDER: [TextPass; 2] = [TextPass::LittleEndian, TextPass::BigEndian];

    fn encoding(self) -> &'static Encoding {
        match self {
            TextPass::LittleEndian => UTF_16LE,
            TextPass::BigEndian => UTF_16BE,
        }
    }

    /// Decode the whole buffer as 16-bit code units in this byte order.
    ///
    /// An odd trailing byte is dropped and unpaired surrogates become
    /// U+FFFD. A byte order mark is kept as text.
    pub fn decode(self, bytes: &[u8]) -> String {
        let even = &bytes[..bytes.len() & !1];
        let (text, _had_errors) = self.encoding().decode_without_bom_handling(even);
        text.into_owned()
    }
}

/// Fields recovered from one `BasicFileInfo` stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetadataFields {
    /// Build identifier following `Revit Build: `, empty when absent
    pub software_version: String,
    /// Whether the sharing value is exactly `Central`
    pub is_central: bool,
    /// Path of the central model this file was saved from, empty when absent
    pub central_file_name: String,
    /// Every record of both passes, concatenated without separators
    pub raw_text: String,
}

impl MetadataFields {
    /// Apply one text record: update any field whose marker it carries and
    /// append it to the raw text.
    pub fn apply_record(&mut self, record: &str) {
        if record.contains(SHARING_MARKER) {
            let value = match record.find(SHARING_VALUE_PREFIX) {
                Some(start) => Cow::Borrowed(&record[start + SHARING_VALUE_PREFIX.len()..]),
                None => tail_from(record, SHARING_FALLBACK_OFFSET),
            };
            self.is_central = value == CENTRAL_VALUE;
        }

        if record.contains(CENTRAL_PATH_MARKER) {
            self.central_file_name = tail_from(record, CENTRAL_PATH_OFFSET).into_owned();
        }

        if record.contains(BUILD_MARKER) {
            self.software_version = tail_from(record, BUILD_OFFSET).into_owned();
        }

        self.raw_text.push_str(record);
    }
}

/// Decode a raw `BasicFileInfo` stream. Never fails.
pub fn decode_fields(raw: &[u8]) -> MetadataFields {
    let mut fields = MetadataFields::default();
    for pass in TextPass::ORDER {
        let text = pass.decode(raw);
        for record in split_records(&text) {
            fields.apply_record(record);
        }
    }
    fields
}

/// Split decoded text on NUL and CR/LF, skipping empty records.
pub fn split_records(text: &str) -> impl Iterator<Item = &str> {
    text.split('\0')
        .flat_map(|part| part.split("\r\n"))
        .filter(|record| !record.is_empty())
}

/// Suffix of `record` starting at UTF-16 code unit `offset`; empty when the
/// record is not longer than that.
///
/// An offset that splits a surrogate pair leaves the orphaned low surrogate,
/// which is rendered as U+FFFD.
fn tail_from(record: &str, offset: usize) -> Cow<'_, str> {
    let mut units = 0;
    for (start, ch) in record.char_indices() {
        if units == offset {
            return Cow::Borrowed(&record[start..]);
        }
        units += ch.len_utf16();
        if units > offset {
            let rest = &record[start + ch.len_utf8()..];
            return Cow::Owned(format!("{}{}", char::REPLACEMENT_CHARACTER, rest));
        }
    }
    Cow::Borrowed("")
}
