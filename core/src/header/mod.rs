//! Cached access to decoded image headers
//!
//! The binary format itself is decoded by an external collaborator behind
//! [`crate::external::HeaderDecoder`]; this module owns the header contract
//! ([`ImageHeader`]) and the session-scoped per-path cache ([`HeaderCache`]).

mod descrip;

pub use descrip::parse_descrip;

use crate::error::Result;
use crate::external::HeaderDecoder;
use glam::DMat4;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Free-form description values, normalized to seconds
pub type DescripMap = BTreeMap<String, f64>;

/// Temporal unit declared by an image header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
    Microseconds,
    Unknown(String),
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeUnit::Seconds => f.write_str("sec"),
            TimeUnit::Milliseconds => f.write_str("msec"),
            TimeUnit::Microseconds => f.write_str("usec"),
            TimeUnit::Unknown(s) => f.write_str(s),
        }
    }
}

/// One already-decoded image header
///
/// Every accessor is independently fallible; a failure means "value
/// unavailable" to callers, never a fatal condition. Durations and slice
/// times are in the header's own millisecond convention; `slice_times` must
/// reflect a preceding `set_slice_duration`, since slice timing is stored as
/// an ordering plus a duration, not as literal offsets.
pub trait ImageHeader: Send {
    /// Grid spacings, one per data axis; the 4th entry is the volume spacing
    fn zooms(&self) -> Result<Vec<f64>>;

    /// Data array extents
    fn data_shape(&self) -> Result<Vec<usize>>;

    /// Declared slice-encoding data axis, if any
    fn slice_axis(&self) -> Result<Option<usize>>;

    fn set_slice_axis(&mut self, axis: usize) -> Result<()>;

    /// Stored per-slice acquisition duration in milliseconds
    fn slice_duration(&self) -> Result<f64>;

    fn set_slice_duration(&mut self, duration_ms: f64) -> Result<()>;

    /// Per-slice acquisition offsets in milliseconds
    fn slice_times(&self) -> Result<Vec<f64>>;

    /// Quaternion-derived voxel-to-world affine
    fn qform(&self) -> Result<DMat4>;

    /// Directly stored voxel-to-world affine
    fn sform(&self) -> Result<DMat4>;

    /// The header's preferred voxel-to-world affine
    fn best_affine(&self) -> Result<DMat4>;

    /// Declared temporal unit, if any
    fn time_units(&self) -> Result<Option<TimeUnit>>;
}

/// A decoded header together with its parsed description map
pub struct DecodedHeader {
    pub header: Box<dyn ImageHeader>,
    pub descrip: DescripMap,
}

impl fmt::Debug for DecodedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedHeader")
            .field("descrip", &self.descrip)
            .finish_non_exhaustive()
    }
}

/// Session-scoped per-path header cache
///
/// Decodes each path at most once, caching failures too. Entries carry their
/// own lock so the slice-timing self-heal can write back through the cache;
/// the map lock is never held during a decode.
pub struct HeaderCache {
    decoder: Box<dyn HeaderDecoder>,
    entries: Mutex<HashMap<PathBuf, Option<Arc<Mutex<DecodedHeader>>>>>,
}

impl HeaderCache {
    pub fn new(decoder: Box<dyn HeaderDecoder>) -> Self {
        Self {
            decoder,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The cached decode result for a path, decoding on first use
    pub fn load(&self, path: &Path) -> Option<Arc<Mutex<DecodedHeader>>> {
        if let Some(entry) = self.entries.lock().get(path) {
            return entry.clone();
        }

        let decoded = self.decoder.decode(path).map(|d| Arc::new(Mutex::new(d)));
        if decoded.is_none() {
            log::debug!("No decodable image header for \"{}\"", path.display());
        }

        self.entries
            .lock()
            .entry(path.to_path_buf())
            .or_insert(decoded)
            .clone()
    }
}

impl fmt::Debug for HeaderCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderCache").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingDecoder, StubHeader};

    #[test]
    fn test_decodes_each_path_once() {
        let decoder = CountingDecoder::new(StubHeader::default());
        let calls = decoder.calls();
        let cache = HeaderCache::new(Box::new(decoder));

        assert!(cache.load(Path::new("/data/a.nii.gz")).is_some());
        assert!(cache.load(Path::new("/data/a.nii.gz")).is_some());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_caches_decode_failures() {
        let decoder = CountingDecoder::failing();
        let calls = decoder.calls();
        let cache = HeaderCache::new(Box::new(decoder));

        assert!(cache.load(Path::new("/data/broken.nii.gz")).is_none());
        assert!(cache.load(Path::new("/data/broken.nii.gz")).is_none());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
