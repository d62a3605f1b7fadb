//! Recursive inventory of design files.
//!
//! [`Inventory`] walks a directory tree and hands each result to an
//! [`InventorySink`]. [`CsvLedger`] is the sink used by the command-line tool.
mod ledger;
mod walker;

pub use ledger::{CsvLedger, Failure, InventorySink, DRAWINGS_SUFFIX, ERRORS_SUFFIX};
pub use walker::{Inventory, SkippedEntry, WalkSummary};
