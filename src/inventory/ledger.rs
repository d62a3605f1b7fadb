//! Output side of an inventory run.
//!
//! [`InventorySink`] receives records, drawings and failures as the walk
//! produces them. [`CsvLedger`] is the on-disk implementation: a quoted CSV
//! ledger, a sibling `_Errors.txt` log and, when drawings are inventoried, a
//! sibling `_AutoCADFiles.csv`.
use crate::dwg::DrawingRecord;
use crate::error::{FailureKind, Result};
use crate::record::FileRecord;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::Serialize;
use std::ffi::OsString;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Suffix appended to the ledger path to name the error log
pub const ERRORS_SUFFIX: &str = "_Errors.txt";

/// Suffix appended to the ledger path to name the drawing ledger
pub const DRAWINGS_SUFFIX: &str = "_AutoCADFiles.csv";

const LINE_END: &str = "\r\n";

const FILE_HEADER: [&str; 4] = ["File Name", "Version", "Is Central", "Central File Name"];
const LINK_HEADER: [&str; 3] = ["Link Type", "Path", "Absolute Path"];
const DRAWING_HEADER: [&str; 2] = ["File Name", "Version"];

/// One failed entry of a walk, rendered as one line of the error log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub path: PathBuf,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Destination of inventory results.
pub trait InventorySink {
    /// Append one design file record.
    fn record(&mut self, record: &FileRecord) -> Result<()>;

    /// Append one AutoCAD drawing.
    fn drawing(&mut self, drawing: &DrawingRecord) -> Result<()>;

    /// Log one failure. An error here aborts the walk.
    fn failure(&mut self, failure: &Failure) -> Result<()>;

    /// Flush buffered output at the end of a walk.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Serialize)]
struct FileRow<'a> {
    file_name: &'a str,
    version: &'a str,
    is_central: &'static str,
    central_file_name: &'a str,
}

#[derive(Serialize)]
struct LinkedFileRow<'a> {
    file_name: &'a str,
    version: &'a str,
    is_central: &'static str,
    central_file_name: &'a str,
    link_type: &'static str,
    path: &'a str,
    absolute_path: &'a str,
}

#[derive(Serialize)]
struct DrawingRow<'a> {
    file_name: &'a str,
    version: &'a str,
}

/// CSV ledger with sibling error log.
///
/// Every field is quoted. Data rows end with a trailing comma before the line
/// break, header rows do not, matching ledgers written by earlier tooling.
pub struct CsvLedger {
    csv_path: PathBuf,
    with_links: bool,
    rows: File,
    errors: Option<File>,
    drawings: Option<File>,
}

impl fmt::Debug for CsvLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsvLedger")
            .field("csv_path", &self.csv_path)
            .field("with_links", &self.with_links)
            .finish_non_exhaustive()
    }
}

impl CsvLedger {
    /// Create (or truncate) the ledger at `csv_path` and write its timestamp
    /// and header lines. With `with_links`, the header carries the three link
    /// columns and files with links produce one row per link.
    pub fn create(csv_path: impl AsRef<Path>, with_links: bool) -> Result<Self> {
        let csv_path = csv_path.as_ref().to_path_buf();
        let rows = if with_links {
            create_csv(&csv_path, FILE_HEADER.iter().chain(LINK_HEADER.iter()))?
        } else {
            create_csv(&csv_path, FILE_HEADER)?
        };

        Ok(Self {
            csv_path,
            with_links,
            rows,
            errors: None,
            drawings: None,
        })
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    /// Path of the error log: the ledger path followed by `_Errors.txt`.
    pub fn errors_path(&self) -> PathBuf {
        sibling_path(&self.csv_path, ERRORS_SUFFIX)
    }

    /// Path of the drawing ledger: the ledger path followed by `_AutoCADFiles.csv`.
    pub fn drawings_path(&self) -> PathBuf {
        sibling_path(&self.csv_path, DRAWINGS_SUFFIX)
    }
}

impl InventorySink for CsvLedger {
    fn record(&mut self, record: &FileRecord) -> Result<()> {
        let is_central = if record.is_central { "True" } else { "False" };

        if self.with_links && !record.links.is_empty() {
            for link in &record.links {
                write_row(
                    &mut self.rows,
                    LinkedFileRow {
                        file_name: record.file_path(),
                        version: &record.software_version,
                        is_central,
                        central_file_name: &record.central_file_name,
                        link_type: link.link_kind.as_str(),
                        path: &link.relative_path,
                        absolute_path: &link.absolute_path,
                    },
                )?;
            }
        } else {
            write_row(
                &mut self.rows,
                FileRow {
                    file_name: record.file_path(),
                    version: &record.software_version,
                    is_central,
                    central_file_name: &record.central_file_name,
                },
            )?;
        }
        Ok(())
    }

    fn drawing(&mut self, drawing: &DrawingRecord) -> Result<()> {
        if self.drawings.is_none() {
            self.drawings = Some(create_csv(&self.drawings_path(), DRAWING_HEADER)?);
        }

        if let Some(file) = self.drawings.as_mut() {
            write_row(
                file,
                DrawingRow {
                    file_name: &drawing.file_path,
                    version: &drawing.version,
                },
            )?;
        }
        Ok(())
    }

    fn failure(&mut self, failure: &Failure) -> Result<()> {
        if self.errors.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.errors_path())?;
            self.errors = Some(file);
        }

        if let Some(file) = self.errors.as_mut() {
            write!(file, "{}{}", failure, LINE_END)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.rows.flush()?;
        if let Some(file) = self.drawings.as_mut() {
            file.flush()?;
        }
        if let Some(file) = self.errors.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

/// Truncate `path` and write the timestamp and header lines.
fn create_csv<I>(path: &Path, header: I) -> Result<File>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let mut file = File::create(path)?;
    write!(
        file,
        "{}{}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        LINE_END
    )?;

    let mut writer = quoting_writer(Terminator::CRLF).from_writer(Vec::new());
    writer.write_record(header)?;
    file.write_all(&into_bytes(writer)?)?;
    Ok(file)
}

/// Append one quoted data row followed by `,` and the line break.
fn write_row<S: Serialize>(out: &mut File, row: S) -> Result<()> {
    let mut writer = quoting_writer(Terminator::Any(b',')).from_writer(Vec::new());
    writer.serialize(row)?;
    let mut line = into_bytes(writer)?;
    line.extend_from_slice(LINE_END.as_bytes());
    out.write_all(&line)?;
    Ok(())
}

fn quoting_writer(terminator: Terminator) -> WriterBuilder {
    let mut builder = WriterBuilder::new();
    builder
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .terminator(terminator);
    builder
}

fn into_bytes(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{LinkKind, LinkedFileReference};
    use tempfile::tempdir;

    fn sample_record() -> FileRecord {
        let mut record = FileRecord::new("/models/Tower.rvt");
        record.software_version = "20230301_1515".to_string();
        record.is_central = true;
        record.central_file_name = " \\\\fs01\\Tower.rvt".to_string();
        record
    }

    #[test]
    fn test_ledger_layout() {
        let dir = tempdir().expect("create temp dir");
        let csv_path = dir.path().join("inventory.csv");

        let mut ledger = CsvLedger::create(&csv_path, false).unwrap();
        ledger.record(&sample_record()).unwrap();
        ledger.record(&FileRecord::new("/models/Blank.rvt")).unwrap();
        ledger.finish().unwrap();

        let text = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(!lines[0].starts_with('"'));
        assert_eq!(
            lines[1],
            "\"File Name\",\"Version\",\"Is Central\",\"Central File Name\""
        );
        assert_eq!(
            lines[2],
            "\"/models/Tower.rvt\",\"20230301_1515\",\"True\",\" \\\\fs01\\Tower.rvt\","
        );
        assert_eq!(lines[3], "\"/models/Blank.rvt\",\"\",\"False\",\"\",");
        assert!(text.ends_with("\r\n"));
        assert!(!ledger.errors_path().exists());
    }

    #[test]
    fn test_one_row_per_link() {
        let dir = tempdir().expect("create temp dir");
        let csv_path = dir.path().join("links.csv");

        let record = sample_record().with_links(vec![
            LinkedFileReference::new(LinkKind::CadLink, "site.dwg", "C:\\site.dwg"),
            LinkedFileReference::new(LinkKind::RevitLink, "..\\mep.rvt", "C:\\mep.rvt"),
        ]);

        let mut ledger = CsvLedger::create(&csv_path, true).unwrap();
        ledger.record(&record).unwrap();
        ledger.record(&FileRecord::new("/models/Solo.rvt")).unwrap();
        ledger.finish().unwrap();

        let text = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[1].ends_with("\"Link Type\",\"Path\",\"Absolute Path\""));
        assert!(lines[2].ends_with("\"CADLink\",\"site.dwg\",\"C:\\site.dwg\","));
        assert!(lines[3].ends_with("\"RevitLink\",\"..\\mep.rvt\",\"C:\\mep.rvt\","));
        assert_eq!(lines[4], "\"/models/Solo.rvt\",\"\",\"False\",\"\",");
    }

    #[test]
    fn test_error_log_is_appended_next_to_ledger() {
        let dir = tempdir().expect("create temp dir");
        let csv_path = dir.path().join("inventory.csv");
        let errors_path = dir.path().join("inventory.csv_Errors.txt");
        std::fs::write(&errors_path, "earlier run\r\n").unwrap();

        let mut ledger = CsvLedger::create(&csv_path, false).unwrap();
        assert_eq!(ledger.errors_path(), errors_path);
        ledger
            .failure(&Failure::new(
                FailureKind::StreamNotFound,
                "/models/Old.rvt",
                "Error getting Revit File Info for: /models/Old.rvt - missing",
            ))
            .unwrap();
        ledger.finish().unwrap();

        let log = std::fs::read_to_string(&errors_path).unwrap();
        assert_eq!(
            log,
            "earlier run\r\nError getting Revit File Info for: /models/Old.rvt - missing\r\n"
        );
    }

    #[test]
    fn test_drawing_ledger_created_on_first_use() {
        let dir = tempdir().expect("create temp dir");
        let csv_path = dir.path().join("inventory.csv");

        let mut ledger = CsvLedger::create(&csv_path, false).unwrap();
        assert!(!ledger.drawings_path().exists());

        ledger
            .drawing(&DrawingRecord {
                file_path: "/cad/site.dwg".to_string(),
                version: "AutoCAD 2013".to_string(),
            })
            .unwrap();
        ledger.finish().unwrap();

        let text = std::fs::read_to_string(dir.path().join("inventory.csv_AutoCADFiles.csv")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "\"File Name\",\"Version\"");
        assert_eq!(lines[2], "\"/cad/site.dwg\",\"AutoCAD 2013\",");
    }
}
