use crate::types::{Datatype, MetadataValue};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One acquisition file registered with the project database
///
/// Identity fields (path, datatype, suffix, tags) are fixed at creation;
/// the metadata map is appended to lazily by resolution and never retracted.
/// The map is guarded so a multi-threaded host can share records, but no
/// lock is ever held across a recursive resolution call.
#[derive(Debug)]
pub struct Acquisition {
    path: PathBuf,
    datatype: Datatype,
    suffix: String,
    tags: BTreeMap<String, String>,
    metadata: Mutex<BTreeMap<String, MetadataValue>>,
}

impl Acquisition {
    pub fn new(path: impl Into<PathBuf>, datatype: Datatype, suffix: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            datatype,
            suffix: suffix.into(),
            tags: BTreeMap::new(),
            metadata: Mutex::new(BTreeMap::new()),
        }
    }

    /// Adds an entity tag (builder style, registration time only)
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Seeds a metadata value at registration time (builder style)
    pub fn with_metadata(self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.lock().insert(key.into(), value.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Whether a metadata key has been resolved already
    pub fn has_metadata(&self, key: &str) -> bool {
        self.metadata.lock().contains_key(key)
    }

    /// Clone of one resolved metadata value
    pub fn metadata(&self, key: &str) -> Option<MetadataValue> {
        self.metadata.lock().get(key).cloned()
    }

    /// Float content of one resolved metadata value
    pub fn metadata_f64(&self, key: &str) -> Option<f64> {
        self.metadata.lock().get(key).and_then(MetadataValue::as_f64)
    }

    /// String content of one resolved metadata value
    pub fn metadata_str(&self, key: &str) -> Option<String> {
        self.metadata
            .lock()
            .get(key)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    /// Records a resolved value
    pub fn insert_metadata(&self, key: impl Into<String>, value: impl Into<MetadataValue>) {
        self.metadata.lock().insert(key.into(), value.into());
    }
}
