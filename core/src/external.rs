//! Interfaces to external collaborators
//!
//! The core never decodes binary formats, globs the filesystem, or owns the
//! project's indexed file database; hosts implement these traits and the
//! resolver consumes them. Every method is total: "don't know" is `None` or
//! an empty collection, never a panic.

use crate::error::Result;
use crate::header::DecodedHeader;
use crate::record::Acquisition;
use crate::types::MetadataValue;
use glam::DVec3;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Decodes one image file into a header object and its description map
///
/// A failed decode returns `None` (implementations log their own
/// diagnostics); the cache layer remembers the failure.
pub trait HeaderDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Option<DecodedHeader>;
}

/// The project's indexed file database
pub trait Database: Send + Sync {
    /// Value of one entity tag for a path
    fn tagval(&self, path: &Path, key: &str) -> Option<String>;

    /// Paths associated with this one, restricted to a suffix kind
    fn associations(&self, path: &Path, suffix: &str) -> Vec<PathBuf>;

    /// The registered record for a path
    fn fileobj(&self, path: &Path) -> Option<Arc<Acquisition>>;

    /// Explicit per-file metadata overrides from the project specification
    fn spec_metadata(&self, path: &Path) -> Option<BTreeMap<String, MetadataValue>>;

    /// Paths sharing this acquisition's geometry (expansions of the same
    /// indexed pattern); the database owns this relation because the core
    /// performs no globbing
    fn geometry_group(&self, path: &Path) -> Vec<PathBuf> {
        vec![path.to_path_buf()]
    }
}

/// Reads the companion descriptor for an image path, already decoded
pub trait SidecarReader: Send + Sync {
    fn read(&self, path: &Path) -> Option<serde_json::Value>;
}

/// Reads a spreadsheet file into a 2D numeric table
pub trait SpreadsheetReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<Vec<Vec<f64>>>;
}

/// Registered reference-image origins for standard template spaces
pub trait TemplateRegistry: Send + Sync {
    fn origins(&self, template: &str) -> Vec<DVec3>;
}
