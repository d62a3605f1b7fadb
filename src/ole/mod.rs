/// Constants for OLE file format
pub mod consts;

/// Little-endian field readers shared by the header and table parsers
mod binary;

/// Main OLE file parsing implementation
mod file;

// Re-export public types for convenient access
pub use file::{is_ole_file, DirectoryEntry, OleError, OleFile};
