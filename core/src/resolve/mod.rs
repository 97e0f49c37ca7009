//! Metadata resolution: loaders and their orchestration
//!
//! Three source loaders each try to fill one key for one record; the
//! [`Resolver`] runs them in a fixed priority order with memoization and
//! per-key special cases.

pub mod direction;
mod header;
mod overrides;
mod sidecar;
pub mod slice_order;

pub use direction::{canonicalize_direction_code, direction_code_str, orientation_set};
pub use header::HeaderLoader;
pub use overrides::OverrideLoader;
pub use sidecar::SidecarLoader;
pub use slice_order::{classify, timings_for, SliceOrder};

use crate::external::{Database, SidecarReader, SpreadsheetReader, TemplateRegistry};
use crate::header::HeaderCache;
use crate::record::Acquisition;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// One metadata source
///
/// `fill` writes the key into the record's map and reports `true`, or
/// leaves the record untouched and reports `false`; "not found" is never an
/// error. The resolver is passed in explicitly so a loader can resolve
/// prerequisite keys, on this record or another.
pub trait Loader {
    fn fill(&self, resolver: &Resolver, record: &Acquisition, key: &str) -> bool;
}

/// Orchestrates the source loaders for a resolution session
///
/// Resolution is memoized through the record's metadata map: a key already
/// present is never recomputed. Failures are not cached, so a later call
/// can succeed once new overrides exist.
pub struct Resolver {
    database: Arc<dyn Database>,
    headers: Arc<HeaderCache>,
    sidecar_loader: SidecarLoader,
    header_loader: HeaderLoader,
    override_loader: OverrideLoader,
    in_progress: Mutex<HashSet<(PathBuf, String)>>,
}

impl Resolver {
    pub fn new(
        database: Arc<dyn Database>,
        headers: Arc<HeaderCache>,
        sidecars: Arc<dyn SidecarReader>,
        spreadsheets: Arc<dyn SpreadsheetReader>,
        templates: Arc<dyn TemplateRegistry>,
    ) -> Self {
        Self {
            database,
            sidecar_loader: SidecarLoader::new(sidecars),
            header_loader: HeaderLoader::new(headers.clone(), templates),
            override_loader: OverrideLoader::new(spreadsheets),
            headers,
            in_progress: Mutex::new(HashSet::new()),
        }
    }

    pub fn database(&self) -> &dyn Database {
        self.database.as_ref()
    }

    pub fn headers(&self) -> &HeaderCache {
        &self.headers
    }

    /// Resolves one key for one record
    ///
    /// Returns `true` once the key is in the record's metadata map. A
    /// request for a (record, key) pair whose resolution is already in
    /// progress reports `false`, which bounds the recursive call graph.
    pub fn fill(&self, record: &Acquisition, key: &str) -> bool {
        if record.has_metadata(key) {
            return true;
        }

        let token = (record.path().to_path_buf(), key.to_string());
        if !self.in_progress.lock().insert(token.clone()) {
            return false;
        }
        let filled = self.fill_inner(record, key);
        self.in_progress.lock().remove(&token);
        filled
    }

    fn fill_inner(&self, record: &Acquisition, key: &str) -> bool {
        // A named slice order can only be expanded by the header loader,
        // which knows the slice count and duration; try it first then
        if key == "slice_timing" && record.has_metadata("slice_timing_code") {
            if self.header_loader.fill(self, record, key) {
                return true;
            }
        }

        let loaders: [&dyn Loader; 3] = [
            &self.sidecar_loader,
            &self.header_loader,
            &self.override_loader,
        ];
        loaders.iter().any(|loader| loader.fill(self, record, key))
    }
}
