use super::ledger::{Failure, InventorySink};
use crate::config::InventoryConfig;
use crate::container::ContainerReader;
use crate::dwg;
use crate::error::{Error, FailureKind, Result};
use crate::links::LinkResolver;
use crate::record::extract_record_with;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// An entry the walk could not inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub kind: FailureKind,
}

/// Outcome counters of one walk.
#[derive(Debug, Clone, Default)]
pub struct WalkSummary {
    pub directories_visited: usize,
    pub records_written: usize,
    pub drawings_written: usize,
    pub skipped: Vec<SkippedEntry>,
}

impl WalkSummary {
    /// Number of skipped entries of the given kind.
    pub fn skipped_count(&self, kind: FailureKind) -> usize {
        self.skipped.iter().filter(|entry| entry.kind == kind).count()
    }

    fn skip(&mut self, path: &Path, kind: FailureKind) {
        self.skipped.push(SkippedEntry {
            path: path.to_path_buf(),
            kind,
        });
    }
}

/// Directory walk that inventories every design file below a root.
///
/// Directories are processed from an explicit work list, so the depth of the
/// tree does not grow the call stack. Within a directory, design files are
/// read first (in name order), then drawings, then subdirectories are queued
/// so that they are visited in name order. A failure on one file or one
/// directory is logged and the walk moves on.
pub struct Inventory {
    config: InventoryConfig,
    reader: ContainerReader,
    links: Option<Box<dyn LinkResolver>>,
}

impl fmt::Debug for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inventory")
            .field("config", &self.config)
            .field("reader", &self.reader)
            .field("links", &self.links.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Directory,
    Other,
}

#[derive(Debug, Default)]
struct Listing {
    files: Vec<PathBuf>,
    directories: Vec<PathBuf>,
    /// Entries that could not be read, each reported on its own
    unreadable: Vec<Error>,
}

impl Inventory {
    pub fn new(config: InventoryConfig) -> Self {
        let reader = ContainerReader::new().with_max_stream_size(config.max_stream_size);
        Self {
            config,
            reader,
            links: None,
        }
    }

    /// Fill each record's links from a host-provided resolver.
    pub fn with_link_resolver(mut self, resolver: impl LinkResolver + 'static) -> Self {
        self.links = Some(Box::new(resolver));
        self
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    /// Walk the configured root, sending results to `sink`.
    ///
    /// Only a failure of the sink to log a failure ends the walk early.
    pub fn run(&self, sink: &mut dyn InventorySink) -> Result<WalkSummary> {
        let mut summary = WalkSummary::default();
        let mut pending = Vec::new();

        let root = &self.config.root;
        if self.config.exceeds_path_limit(root) {
            summary.skip(root, FailureKind::PathTooLong);
            let message = format!(
                "The folder path or name of a file is too long ({}+ characters) in: {}",
                self.config.max_path_len + 1,
                root.parent().unwrap_or(root).display()
            );
            self.report(sink, Failure::new(FailureKind::PathTooLong, root, message))?;
        } else {
            pending.push(root.clone());
        }

        while let Some(directory) = pending.pop() {
            summary.directories_visited += 1;
            info!(directory = %directory.display(), "scanning directory");

            let listing = match list_directory(&directory) {
                Ok(listing) => listing,
                Err(err) => {
                    let kind = err.kind();
                    let message = match &err {
                        Error::PathTooLong { path } => format!(
                            "The folder path or name of a file is too long ({}+ characters) in: {}",
                            self.config.max_path_len + 1,
                            path.display()
                        ),
                        _ => format!(
                            "Error traversing subfolders of: {} - {}",
                            directory.display(),
                            err
                        ),
                    };
                    summary.skip(&directory, kind);
                    self.report(sink, Failure::new(kind, &directory, message))?;
                    continue;
                },
            };

            for err in listing.unreadable {
                let kind = err.kind();
                let message = match &err {
                    Error::PathTooLong { .. } => format!(
                        "The path or name of a file is too long ({}+ characters) in: {}",
                        self.config.max_path_len + 1,
                        directory.display()
                    ),
                    _ => format!(
                        "Error traversing subfolders of: {} - {}",
                        directory.display(),
                        err
                    ),
                };
                summary.skip(&directory, kind);
                self.report(sink, Failure::new(kind, &directory, message))?;
            }

            for file in &listing.files {
                if self.config.is_design_file(file) {
                    self.process_design_file(file, &directory, sink, &mut summary)?;
                }
            }

            if self.config.include_drawings {
                for file in &listing.files {
                    if self.config.is_drawing_file(file) {
                        self.process_drawing(file, &directory, sink, &mut summary)?;
                    }
                }
            }

            // Reverse so the first subdirectory is popped first
            for subdirectory in listing.directories.iter().rev() {
                if self.config.exceeds_path_limit(subdirectory) {
                    summary.skip(subdirectory, FailureKind::PathTooLong);
                    let message = format!(
                        "The folder path or name of a file is too long ({}+ characters) in: {}",
                        self.config.max_path_len + 1,
                        directory.display()
                    );
                    self.report(
                        sink,
                        Failure::new(FailureKind::PathTooLong, subdirectory, message),
                    )?;
                    continue;
                }
                pending.push(subdirectory.clone());
            }
        }

        sink.finish()?;
        info!(
            directories = summary.directories_visited,
            records = summary.records_written,
            drawings = summary.drawings_written,
            skipped = summary.skipped.len(),
            "inventory complete"
        );
        Ok(summary)
    }

    fn process_design_file(
        &self,
        file: &Path,
        directory: &Path,
        sink: &mut dyn InventorySink,
        summary: &mut WalkSummary,
    ) -> Result<()> {
        if self.config.exceeds_path_limit(file) {
            return self.skip_long_file(file, directory, sink, summary);
        }

        debug!(file = %file.display(), "reading design file");
        let mut record = match extract_record_with(&self.reader, file) {
            Ok(record) => record,
            Err(Error::NotAContainer { .. }) => {
                info!(file = %file.display(), "not a structured storage file, skipping");
                summary.skip(file, FailureKind::NotAContainer);
                return Ok(());
            },
            Err(Error::PathTooLong { .. }) => {
                return self.skip_long_file(file, directory, sink, summary);
            },
            Err(err) => {
                let kind = err.kind();
                summary.skip(file, kind);
                let message = format!(
                    "Error getting Revit File Info for: {} - {}",
                    file.display(),
                    err
                );
                return self.report(sink, Failure::new(kind, file, message));
            },
        };

        if let Some(resolver) = &self.links {
            match resolver.resolve(file) {
                Ok(links) => record.links = links,
                Err(err) => {
                    let message =
                        format!("Error resolving links for: {} - {}", file.display(), err);
                    self.report(sink, Failure::new(err.kind(), file, message))?;
                },
            }
        }

        match sink.record(&record) {
            Ok(()) => summary.records_written += 1,
            Err(err) => {
                summary.skip(file, FailureKind::Unexpected);
                let message = format!(
                    "Error writing the file information for: {} - {}",
                    file.display(),
                    err
                );
                self.report(sink, Failure::new(FailureKind::Unexpected, file, message))?;
            },
        }
        Ok(())
    }

    fn process_drawing(
        &self,
        file: &Path,
        directory: &Path,
        sink: &mut dyn InventorySink,
        summary: &mut WalkSummary,
    ) -> Result<()> {
        if self.config.exceeds_path_limit(file) {
            return self.skip_long_file(file, directory, sink, summary);
        }

        debug!(file = %file.display(), "probing drawing");
        let outcome = dwg::detect_version(file).and_then(|drawing| sink.drawing(&drawing));
        match outcome {
            Ok(()) => summary.drawings_written += 1,
            Err(err) => {
                let kind = err.kind();
                summary.skip(file, kind);
                let message = format!(
                    "Error getting AutoCAD File Info for: {} - {}",
                    file.display(),
                    err
                );
                self.report(sink, Failure::new(kind, file, message))?;
            },
        }
        Ok(())
    }

    fn skip_long_file(
        &self,
        file: &Path,
        directory: &Path,
        sink: &mut dyn InventorySink,
        summary: &mut WalkSummary,
    ) -> Result<()> {
        summary.skip(file, FailureKind::PathTooLong);
        let message = format!(
            "The path or name of a file is too long ({}+ characters) in: {}",
            self.config.max_path_len + 1,
            directory.display()
        );
        self.report(sink, Failure::new(FailureKind::PathTooLong, file, message))
    }

    fn report(&self, sink: &mut dyn InventorySink, failure: Failure) -> Result<()> {
        warn!(kind = ?failure.kind, path = %failure.path.display(), "{}", failure.message);
        sink.failure(&failure)
    }
}

/// List one directory: regular files and real subdirectories, each sorted by
/// name. Symbolic links are not followed.
///
/// Only a failure to open the directory fails the listing. An entry that
/// cannot be read is kept in [`Listing::unreadable`] and its siblings are
/// still listed.
fn list_directory(directory: &Path) -> Result<Listing> {
    let entries = fs::read_dir(directory).map_err(|e| Error::from_io(e, directory))?;

    Ok(sort_entries(entries.map(|entry| -> Result<(PathBuf, EntryKind)> {
        let entry = entry.map_err(|e| Error::from_io(e, directory))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| Error::from_io(e, &path))?;

        let kind = if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        };
        Ok((path, kind))
    })))
}

fn sort_entries<I>(entries: I) -> Listing
where
    I: IntoIterator<Item = Result<(PathBuf, EntryKind)>>,
{
    let mut listing = Listing::default();
    for entry in entries {
        match entry {
            Ok((path, EntryKind::Directory)) => listing.directories.push(path),
            Ok((path, EntryKind::File)) => listing.files.push(path),
            Ok((path, EntryKind::Other)) => {
                debug!(path = %path.display(), "skipping non-regular entry");
            },
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory entry");
                listing.unreadable.push(err);
            },
        }
    }

    listing.files.sort();
    listing.directories.sort();
    listing
}
