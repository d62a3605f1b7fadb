//! Host-provided link resolution.
//!
//! Cross-file references cannot be recovered from the `BasicFileInfo` bytes;
//! only a running host application can report them. An embedding host plugs
//! its resolver into [`Inventory::with_link_resolver`](crate::inventory::Inventory::with_link_resolver).
//! Without one, records carry an empty link list.
use crate::error::Result;
use crate::record::LinkedFileReference;
use std::path::Path;

/// Supplies the linked-file references of a design file.
pub trait LinkResolver {
    fn resolve(&self, path: &Path) -> Result<Vec<LinkedFileReference>>;
}

/// Resolver for environments without a host: never reports links.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLinks;

impl LinkResolver for NoLinks {
    fn resolve(&self, _path: &Path) -> Result<Vec<LinkedFileReference>> {
        Ok(Vec::new())
    }
}

impl<F> LinkResolver for F
where
    F: Fn(&Path) -> Result<Vec<LinkedFileReference>>,
{
    fn resolve(&self, path: &Path) -> Result<Vec<LinkedFileReference>> {
        self(path)
    }
}
