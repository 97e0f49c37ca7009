use crate::external::SpreadsheetReader;
use crate::record::Acquisition;
use crate::resolve::direction::canonicalize_direction_code;
use crate::resolve::{Loader, Resolver};
use crate::types::{parse_direction_str, Datatype, MetadataValue};
use std::path::Path;
use std::sync::Arc;

/// Fills metadata keys from project-level overrides and file relationships
///
/// Runs last in the loader order, so a plain spec override only takes
/// effect when no earlier loader answered. The key-specific branches below
/// recompute their value on every call regardless, which makes them
/// out-rank the earlier loaders whenever resolution reaches this point;
/// the tag-derived phase encoding even replaces a stored override. That
/// precedence is long-standing behavior and is kept as is.
pub struct OverrideLoader {
    spreadsheets: Arc<dyn SpreadsheetReader>,
}

impl OverrideLoader {
    pub(crate) fn new(spreadsheets: Arc<dyn SpreadsheetReader>) -> Self {
        Self { spreadsheets }
    }
}

impl Loader for OverrideLoader {
    fn fill(&self, resolver: &Resolver, record: &Acquisition, key: &str) -> bool {
        let database = resolver.database();
        let path = record.path();

        // Explicit spec override, when the project declares one
        let mut value: Option<MetadataValue> = database
            .spec_metadata(path)
            .and_then(|metadata| metadata.get(key).cloned());

        match key {
            "phase_encoding_direction" => {
                if let Some(direction) = record.tag("dir") {
                    let parsed = parse_direction_str(direction).and_then(|code| {
                        canonicalize_direction_code(code, path, resolver.headers(), database)
                    });
                    match parsed {
                        Ok(axis) => value = Some(axis.as_str().into()),
                        Err(e) => log::warn!(
                            "Ignored exception when loading phase_encoding_direction: {}",
                            e
                        ),
                    }
                }
            }

            // Derived from the two associated magnitude files
            "echo_time_difference" => {
                if record.datatype() == Datatype::Fmap && record.suffix() == "phasediff" {
                    let magnitude1 = database.associations(path, "magnitude1");
                    let magnitude2 = database.associations(path, "magnitude2");
                    if let (Some(first), Some(second)) = (magnitude1.first(), magnitude2.first())
                    {
                        if let (Some(first), Some(second)) =
                            (database.fileobj(first), database.fileobj(second))
                        {
                            if resolver.fill(&first, "echo_time")
                                && resolver.fill(&second, "echo_time")
                            {
                                if let (Some(e1), Some(e2)) = (
                                    first.metadata_f64("echo_time"),
                                    second.metadata_f64("echo_time"),
                                ) {
                                    value = Some((e1 - e2).abs().into());
                                }
                            }
                        }
                    }
                }
            }

            // Copied from the matching magnitude file
            "echo_time" => {
                if record.datatype() == Datatype::Fmap && record.suffix().starts_with("phase") {
                    let magnitude_suffix = match record.suffix() {
                        "phase1" => Some("magnitude1"),
                        "phase2" => Some("magnitude2"),
                        _ => None,
                    };
                    if let Some(suffix) = magnitude_suffix {
                        if let Some(first) = database.associations(path, suffix).first() {
                            if let Some(magnitude) = database.fileobj(first) {
                                if resolver.fill(&magnitude, "echo_time") {
                                    value = magnitude.metadata("echo_time");
                                }
                            }
                        }
                    }
                }
            }

            // Imported from an external timing table, flattened in file order
            "slice_timing" => {
                if let Some(timing_file) = record.metadata_str("slice_timing_file") {
                    match self.spreadsheets.read(Path::new(&timing_file)) {
                        Ok(table) => {
                            let times: Vec<f64> = table.into_iter().flatten().collect();
                            value = Some(times.into());
                        }
                        Err(e) => log::warn!(
                            "Ignored exception when loading slice_timing_file \"{}\": {}",
                            timing_file,
                            e
                        ),
                    }
                }
            }

            _ => {}
        }

        match value {
            Some(value) => {
                record.insert_metadata(key, value);
                true
            }
            None => false,
        }
    }
}
