use crate::external::SidecarReader;
use crate::record::Acquisition;
use crate::resolve::{Loader, Resolver};
use crate::types::MetadataValue;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Fills metadata keys from the companion descriptor file
///
/// The descriptor carries scanner-exported parameters under camel-case
/// names; they are normalized to the schema's snake-case names once per
/// path and cached for the session. Lookup is literal: the loader computes
/// nothing.
pub struct SidecarLoader {
    reader: Arc<dyn SidecarReader>,
    cache: Mutex<HashMap<PathBuf, Option<Arc<BTreeMap<String, MetadataValue>>>>>,
}

impl SidecarLoader {
    pub fn new(reader: Arc<dyn SidecarReader>) -> Self {
        Self {
            reader,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn load(&self, path: &Path) -> Option<Arc<BTreeMap<String, MetadataValue>>> {
        if let Some(entry) = self.cache.lock().get(path) {
            return entry.clone();
        }

        let sidecar = self.reader.read(path).map(|value| Arc::new(convert(value)));

        self.cache
            .lock()
            .entry(path.to_path_buf())
            .or_insert(sidecar)
            .clone()
    }
}

impl Loader for SidecarLoader {
    fn fill(&self, _resolver: &Resolver, record: &Acquisition, key: &str) -> bool {
        let Some(sidecar) = self.load(record.path()) else {
            return false;
        };
        let Some(value) = sidecar.get(key) else {
            return false;
        };
        record.insert_metadata(key, value.clone());
        true
    }
}

/// Converts a decoded sidecar document into normalized metadata values
///
/// Scalars, strings and all-numeric arrays are kept; nested objects, mixed
/// arrays and other shapes are ignored.
fn convert(value: serde_json::Value) -> BTreeMap<String, MetadataValue> {
    let mut converted = BTreeMap::new();

    let serde_json::Value::Object(map) = value else {
        return converted;
    };

    for (name, value) in map {
        let key = snake_case(&name);
        let value = match value {
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(MetadataValue::Int(i))
                } else {
                    n.as_f64().map(MetadataValue::Float)
                }
            }
            serde_json::Value::String(s) => Some(MetadataValue::Str(s)),
            serde_json::Value::Array(items) => {
                let floats: Option<Vec<f64>> =
                    items.iter().map(serde_json::Value::as_f64).collect();
                floats.map(MetadataValue::Floats)
            }
            _ => None,
        };
        if let Some(value) = value {
            converted.insert(key, value);
        }
    }

    converted
}

/// Converts an exported camel-case name to a schema snake-case name
///
/// Acronym runs keep a single boundary: `EPIFactor` becomes `epi_factor`.
/// Names already in snake case pass through unchanged.
fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let after_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let before_lower =
                i > 0 && i + 1 < chars.len() && chars[i - 1].is_uppercase() && chars[i + 1].is_lowercase();
            if after_lower || before_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(*c);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("RepetitionTime"), "repetition_time");
        assert_eq!(snake_case("EchoTime"), "echo_time");
        assert_eq!(snake_case("EPIFactor"), "epi_factor");
        assert_eq!(snake_case("SliceTiming"), "slice_timing");
        assert_eq!(snake_case("slice_timing"), "slice_timing");
        assert_eq!(snake_case("PhaseEncodingDirection"), "phase_encoding_direction");
    }

    #[test]
    fn test_convert_shapes() {
        let sidecar = convert(json!({
            "RepetitionTime": 2.5,
            "EchoTime": 0.03,
            "SliceTiming": [0.0, 1.25],
            "PhaseEncodingDirection": "j-",
            "NumberOfAverages": 1,
            "NestedIgnored": {"a": 1},
            "MixedIgnored": [1.0, "x"],
        }));

        assert_eq!(
            sidecar.get("repetition_time"),
            Some(&MetadataValue::Float(2.5))
        );
        assert_eq!(
            sidecar.get("slice_timing"),
            Some(&MetadataValue::Floats(vec![0.0, 1.25]))
        );
        assert_eq!(
            sidecar.get("phase_encoding_direction"),
            Some(&MetadataValue::Str("j-".into()))
        );
        assert_eq!(
            sidecar.get("number_of_averages"),
            Some(&MetadataValue::Int(1))
        );
        assert!(!sidecar.contains_key("nested_ignored"));
        assert!(!sidecar.contains_key("mixed_ignored"));
    }
}
