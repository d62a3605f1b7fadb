//! designfile-info - metadata inventory for Revit design files
//!
//! Revit models (`.rvt`) are OLE2 compound files. Each one carries a
//! `BasicFileInfo` stream holding the build that last saved it and its
//! worksharing state. This crate reads that stream without the host
//! application and turns it into one ledger row per file.
//!
//! # Layers
//!
//! - [`ole`]: read-only compound file parser
//! - [`container`]: signature check and single-stream extraction
//! - [`decoder`]: dual UTF-16 decoding and field extraction
//! - [`record`]: the per-file [`FileRecord`]
//! - [`inventory`]: directory walk, CSV ledger and error log
//!
//! # Example - Reading one file
//!
//! ```no_run
//! use designfile_info::extract_record;
//!
//! # fn main() -> designfile_info::Result<()> {
//! let record = extract_record("Tower.rvt")?;
//! println!("{} saved by build {}", record.file_path(), record.software_version);
//! if record.is_central {
//!     println!("central model");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Inventorying a tree
//!
//! ```no_run
//! use designfile_info::{CsvLedger, Inventory, InventoryConfig};
//!
//! # fn main() -> designfile_info::Result<()> {
//! let mut ledger = CsvLedger::create("inventory.csv", false)?;
//! let summary = Inventory::new(InventoryConfig::new("/projects")).run(&mut ledger)?;
//! println!("{} files written", summary.records_written);
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod container;
pub mod decoder;
pub mod dwg;
pub mod error;
pub mod inventory;
pub mod links;
pub mod ole;
pub mod record;

pub use config::InventoryConfig;
pub use container::{extract_stream, ContainerReader};
pub use decoder::{decode_fields, MetadataFields};
pub use error::{Error, FailureKind, Result};
pub use inventory::{CsvLedger, Inventory, InventorySink, WalkSummary};
pub use links::LinkResolver;
pub use record::{extract_record, FileRecord, LinkKind, LinkedFileReference};
