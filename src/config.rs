//! Inventory run configuration.
use crate::container::DEFAULT_MAX_STREAM_SIZE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Longest accepted path, one below the legacy 260-character MAX_PATH
pub const DEFAULT_MAX_PATH_LEN: usize = 259;

/// Configuration for an inventory run.
///
/// # Examples
///
/// ```rust
/// use designfile_info::InventoryConfig;
///
/// let config = InventoryConfig::new("/projects")
///     .with_design_extensions(["rvt", "rfa"])
///     .with_drawings(true)
///     .with_max_path_len(400);
/// assert!(config.is_design_file("/projects/Tower.RVT".as_ref()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Directory the walk starts from
    pub root: PathBuf,
    /// Extensions (without dot, case-insensitive) of files read for `BasicFileInfo`
    pub design_extensions: Vec<String>,
    /// Extensions of AutoCAD drawings probed when `include_drawings` is set
    pub drawing_extensions: Vec<String>,
    /// Whether AutoCAD drawings are inventoried as well
    pub include_drawings: bool,
    /// Longest path, in characters, that is visited
    pub max_path_len: usize,
    /// Largest `BasicFileInfo` stream read into memory
    pub max_stream_size: u64,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            design_extensions: vec!["rvt".to_string()],
            drawing_extensions: vec!["dwg".to_string()],
            include_drawings: false,
            max_path_len: DEFAULT_MAX_PATH_LEN,
            max_stream_size: DEFAULT_MAX_STREAM_SIZE,
        }
    }
}

impl InventoryConfig {
    /// Default configuration rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn with_design_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.design_extensions = normalize_extensions(extensions);
        self
    }

    pub fn with_drawing_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.drawing_extensions = normalize_extensions(extensions);
        self
    }

    pub fn with_drawings(mut self, include: bool) -> Self {
        self.include_drawings = include;
        self
    }

    pub fn with_max_path_len(mut self, max_path_len: usize) -> Self {
        self.max_path_len = max_path_len;
        self
    }

    pub fn with_max_stream_size(mut self, max_stream_size: u64) -> Self {
        self.max_stream_size = max_stream_size;
        self
    }

    /// Whether `path` has one of the design file extensions.
    pub fn is_design_file(&self, path: &Path) -> bool {
        has_extension(path, &self.design_extensions)
    }

    /// Whether `path` should be probed as an AutoCAD drawing.
    pub fn is_drawing_file(&self, path: &Path) -> bool {
        self.include_drawings && has_extension(path, &self.drawing_extensions)
    }

    /// Whether `path` is longer than the configured limit.
    pub fn exceeds_path_limit(&self, path: &Path) -> bool {
        path.as_os_str().to_string_lossy().chars().count() > self.max_path_len
    }
}

fn normalize_extensions<I, S>(extensions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    extensions
        .into_iter()
        .map(|ext| ext.as_ref().trim_start_matches('.').to_string())
        .filter(|ext| !ext.is_empty())
        .collect()
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(ext)))
}
