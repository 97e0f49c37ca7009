//! In-memory implementations of the external interfaces for tests
//!
//! Nothing here touches the filesystem; every collaborator is a small map
//! the test assembles by hand.

use crate::error::{NeurometaError, Result};
use crate::external::{
    Database, HeaderDecoder, SidecarReader, SpreadsheetReader, TemplateRegistry,
};
use crate::header::{DecodedHeader, DescripMap, HeaderCache, ImageHeader, TimeUnit};
use crate::record::Acquisition;
use crate::resolve::slice_order::{timings_for, SliceOrder};
use crate::resolve::Resolver;
use crate::types::MetadataValue;
use glam::{DMat4, DVec3};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A decoded header assembled field by field
///
/// Slice times are modeled the way real headers store them, as an
/// acquisition order plus the current slice duration, so duration
/// overwrites show up in re-reads; `explicit_slice_times` short-circuits
/// that for tests that need a literal vector.
#[derive(Debug, Clone, Default)]
pub struct StubHeader {
    pub zooms: Vec<f64>,
    pub shape: Vec<usize>,
    pub slice_axis: Option<usize>,
    pub slice_duration_ms: f64,
    pub slice_order: Option<SliceOrder>,
    pub explicit_slice_times: Option<Vec<f64>>,
    pub qform: Option<DMat4>,
    pub sform: Option<DMat4>,
    pub best: Option<DMat4>,
    pub time_units: Option<TimeUnit>,
    pub descrip: DescripMap,
}

impl ImageHeader for StubHeader {
    fn zooms(&self) -> Result<Vec<f64>> {
        Ok(self.zooms.clone())
    }

    fn data_shape(&self) -> Result<Vec<usize>> {
        Ok(self.shape.clone())
    }

    fn slice_axis(&self) -> Result<Option<usize>> {
        Ok(self.slice_axis)
    }

    fn set_slice_axis(&mut self, axis: usize) -> Result<()> {
        self.slice_axis = Some(axis);
        Ok(())
    }

    fn slice_duration(&self) -> Result<f64> {
        Ok(self.slice_duration_ms)
    }

    fn set_slice_duration(&mut self, duration_ms: f64) -> Result<()> {
        self.slice_duration_ms = duration_ms;
        Ok(())
    }

    fn slice_times(&self) -> Result<Vec<f64>> {
        if let Some(times) = &self.explicit_slice_times {
            return Ok(times.clone());
        }
        let order = self
            .slice_order
            .ok_or_else(|| NeurometaError::Header("no slice order".into()))?;
        let axis = self
            .slice_axis
            .ok_or_else(|| NeurometaError::Header("no slice axis".into()))?;
        let n_slices = *self
            .shape
            .get(axis)
            .ok_or_else(|| NeurometaError::Header("slice axis out of range".into()))?;
        Ok(timings_for(order, n_slices, self.slice_duration_ms))
    }

    fn qform(&self) -> Result<DMat4> {
        self.qform
            .ok_or_else(|| NeurometaError::Header("no qform".into()))
    }

    fn sform(&self) -> Result<DMat4> {
        self.sform
            .ok_or_else(|| NeurometaError::Header("no sform".into()))
    }

    fn best_affine(&self) -> Result<DMat4> {
        self.best
            .or(self.sform)
            .or(self.qform)
            .ok_or_else(|| NeurometaError::Header("no affine".into()))
    }

    fn time_units(&self) -> Result<Option<TimeUnit>> {
        Ok(self.time_units.clone())
    }
}

/// Decoder backed by a path → header map
#[derive(Debug, Clone, Default)]
pub struct StubDecoder {
    headers: HashMap<PathBuf, StubHeader>,
}

impl StubDecoder {
    pub fn with_header(mut self, path: impl Into<PathBuf>, header: StubHeader) -> Self {
        self.headers.insert(path.into(), header);
        self
    }
}

impl HeaderDecoder for StubDecoder {
    fn decode(&self, path: &Path) -> Option<DecodedHeader> {
        let header = self.headers.get(path)?.clone();
        let descrip = header.descrip.clone();
        Some(DecodedHeader {
            header: Box::new(header),
            descrip,
        })
    }
}

/// A cache over a single stubbed path
pub fn cache_with(path: impl Into<PathBuf>, header: StubHeader) -> HeaderCache {
    HeaderCache::new(Box::new(StubDecoder::default().with_header(path, header)))
}

/// Decoder that counts its decode calls
pub struct CountingDecoder {
    header: Option<StubHeader>,
    calls: Arc<AtomicUsize>,
}

impl CountingDecoder {
    pub fn new(header: StubHeader) -> Self {
        Self {
            header: Some(header),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            header: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl HeaderDecoder for CountingDecoder {
    fn decode(&self, _path: &Path) -> Option<DecodedHeader> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let header = self.header.clone()?;
        let descrip = header.descrip.clone();
        Some(DecodedHeader {
            header: Box::new(header),
            descrip,
        })
    }
}

/// Project database backed by plain maps
#[derive(Default)]
pub struct StubDatabase {
    pub records: HashMap<PathBuf, Arc<Acquisition>>,
    pub associations: HashMap<(PathBuf, String), Vec<PathBuf>>,
    pub spec: HashMap<PathBuf, BTreeMap<String, MetadataValue>>,
    pub geometry_groups: HashMap<PathBuf, Vec<PathBuf>>,
}

impl StubDatabase {
    pub fn insert_record(&mut self, record: Acquisition) -> Arc<Acquisition> {
        let record = Arc::new(record);
        self.records
            .insert(record.path().to_path_buf(), record.clone());
        record
    }
}

impl Database for StubDatabase {
    fn tagval(&self, path: &Path, key: &str) -> Option<String> {
        self.records
            .get(path)
            .and_then(|record| record.tag(key).map(str::to_string))
    }

    fn associations(&self, path: &Path, suffix: &str) -> Vec<PathBuf> {
        self.associations
            .get(&(path.to_path_buf(), suffix.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    fn fileobj(&self, path: &Path) -> Option<Arc<Acquisition>> {
        self.records.get(path).cloned()
    }

    fn spec_metadata(&self, path: &Path) -> Option<BTreeMap<String, MetadataValue>> {
        self.spec.get(path).cloned()
    }

    fn geometry_group(&self, path: &Path) -> Vec<PathBuf> {
        self.geometry_groups
            .get(path)
            .cloned()
            .unwrap_or_else(|| vec![path.to_path_buf()])
    }
}

/// Sidecar store backed by a path → document map
#[derive(Debug, Clone, Default)]
pub struct StubSidecars {
    pub documents: HashMap<PathBuf, serde_json::Value>,
}

impl SidecarReader for StubSidecars {
    fn read(&self, path: &Path) -> Option<serde_json::Value> {
        self.documents.get(path).cloned()
    }
}

/// Spreadsheet store backed by a path → table map
#[derive(Debug, Clone, Default)]
pub struct StubSpreadsheets {
    pub tables: HashMap<PathBuf, Vec<Vec<f64>>>,
}

impl SpreadsheetReader for StubSpreadsheets {
    fn read(&self, path: &Path) -> Result<Vec<Vec<f64>>> {
        self.tables
            .get(path)
            .cloned()
            .ok_or_else(|| NeurometaError::MalformedSource(path.display().to_string()))
    }
}

/// Template registry backed by a name → origins map
#[derive(Debug, Clone, Default)]
pub struct StubTemplates {
    pub origins: HashMap<String, Vec<DVec3>>,
}

impl StubTemplates {
    pub fn with_origin(template: &str, origin: DVec3) -> Self {
        let mut registry = Self::default();
        registry.origins.insert(template.to_string(), vec![origin]);
        registry
    }
}

impl TemplateRegistry for StubTemplates {
    fn origins(&self, template: &str) -> Vec<DVec3> {
        self.origins.get(template).cloned().unwrap_or_default()
    }
}

/// A resolver over stubbed collaborators
pub fn resolver_with_parts(
    database: StubDatabase,
    decoder: StubDecoder,
    sidecars: StubSidecars,
    spreadsheets: StubSpreadsheets,
    templates: StubTemplates,
) -> Resolver {
    Resolver::new(
        Arc::new(database),
        Arc::new(HeaderCache::new(Box::new(decoder))),
        Arc::new(sidecars),
        Arc::new(spreadsheets),
        Arc::new(templates),
    )
}
