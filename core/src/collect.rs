use crate::error::{NeurometaError, Result};
use crate::record::Acquisition;
use crate::resolve::direction::{canonicalize_direction_code, orientation_set};
use crate::resolve::Resolver;
use crate::types::{
    is_collected_field, metadata_fields, CollectedMetadata, Datatype, DirectionCode,
    MetadataValue,
};
use std::path::Path;

/// Collects every declared metadata field for one acquisition
///
/// Drives the resolver across the record's schema-declared key set, then
/// adds header-derived ground truth (voxel size, volume shape, volume
/// count, orientation) that no override can shadow, and finally validates
/// the whole map against the collected-field allow-list in one pass.
///
/// # Errors
///
/// Returns `UnknownFile` when the database has no record for the path and
/// `SchemaViolation` naming every offending key when validation fails. A
/// failing record keeps the keys already written; disposition is the
/// caller's call.
pub fn collect_metadata(
    resolver: &Resolver,
    path: &Path,
    setting: Option<serde_json::Value>,
) -> Result<CollectedMetadata> {
    let mut metadata = CollectedMetadata::new();

    if let Some(setting) = setting {
        metadata.insert("setting", setting);
    }

    let database = resolver.database();
    let record = database
        .fileobj(path)
        .ok_or_else(|| NeurometaError::UnknownFile(path.display().to_string()))?;

    let fields = metadata_fields(record.datatype(), record.suffix());
    if !fields.is_empty() {
        // Manual conversion
        if record.datatype() == Datatype::Func {
            if let Some(task) = database.tagval(path, "task") {
                metadata.insert("task_name", task);
            }
        }

        // Automated conversion
        for &field in fields {
            resolver.fill(&record, field);
            let Some(value) = record.metadata(field) else {
                continue;
            };

            let mut key = field;
            let mut value = value;

            if field.ends_with("direction") {
                match canonicalize_metadata_direction(resolver, &record, &value) {
                    Ok(canonical) => value = canonical,
                    Err(e) => {
                        log::warn!("Cannot find \"{}\" for \"{}\": {}", field, path.display(), e);
                        continue;
                    }
                }
            }

            if field == "slice_timing_code" {
                if !resolver.fill(&record, "slice_timing") {
                    continue;
                }
                key = "slice_timing";
                let Some(slice_timing) = record.metadata(key) else {
                    continue;
                };
                value = slice_timing;
            }

            metadata.insert(key, value);
        }
    }

    // Ground truth straight from the header, never overridden
    if let Some(entry) = resolver.headers().load(path) {
        let guard = entry.lock();

        if let Ok(zooms) = guard.header.zooms() {
            if zooms.len() >= 3 {
                metadata.insert("acquisition_voxel_size", zooms[..3].to_vec());
            }
        }

        if let Ok(shape) = guard.header.data_shape() {
            if shape.len() >= 3 {
                let extents: Vec<i64> = shape[..3].iter().map(|&d| d as i64).collect();
                metadata.insert("acquisition_volume_shape", extents);
            }
            if shape.len() == 4 {
                metadata.insert("number_of_volumes", shape[3] as i64);
            }
        }
    }

    let group = database.geometry_group(path);
    let orientations = orientation_set(resolver.headers(), &group);
    if orientations.len() == 1 {
        let orientation = orientations.into_iter().next().unwrap();
        metadata.insert("acquisition_orientation", orientation.to_string());
    }

    validate_collected(&metadata)?;

    Ok(metadata)
}

/// Canonicalizes one direction-valued metadata entry against its record
fn canonicalize_metadata_direction(
    resolver: &Resolver,
    record: &Acquisition,
    value: &MetadataValue,
) -> Result<MetadataValue> {
    let code = value
        .as_str()
        .ok_or_else(|| NeurometaError::UnknownDirectionCode(value.to_string()))?
        .parse::<DirectionCode>()?;
    let canonical = canonicalize_direction_code(
        code,
        record.path(),
        resolver.headers(),
        resolver.database(),
    )?;
    Ok(canonical.as_str().into())
}

/// Checks a collected map against the allow-list, naming every stray key
pub fn validate_collected(metadata: &CollectedMetadata) -> Result<()> {
    let mut unknown: Vec<&str> = metadata
        .keys()
        .filter(|key| !is_collected_field(key))
        .collect();

    if unknown.is_empty() {
        return Ok(());
    }

    unknown.sort_unstable();
    Err(NeurometaError::SchemaViolation(join_quoted(&unknown)))
}

/// Joins key names for one combined message: `"a", "b" and "c"`
fn join_quoted(keys: &[&str]) -> String {
    let quoted: Vec<String> = keys.iter().map(|key| format!("\"{}\"", key)).collect();
    match quoted.as_slice() {
        [] => String::new(),
        [single] => single.clone(),
        [head @ .., last] => format!("{} and {}", head.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::SliceOrder;
    use crate::testing::{resolver_with_parts, StubDatabase, StubDecoder, StubHeader};
    use crate::types::Datatype;
    use glam::DMat4;
    use serde_json::json;

    fn bold_database() -> (StubDatabase, StubDecoder) {
        let mut database = StubDatabase::default();
        database.insert_record(
            Acquisition::new("/data/sub-01_task-rest_bold.nii.gz", Datatype::Func, "bold")
                .with_tag("task", "rest"),
        );

        let header = StubHeader {
            zooms: vec![2.0, 2.0, 2.0, 2.5],
            shape: vec![64, 64, 4, 220],
            slice_axis: Some(2),
            slice_order: Some(SliceOrder::SequentialIncreasing),
            qform: Some(DMat4::IDENTITY),
            ..StubHeader::default()
        };
        let decoder =
            StubDecoder::default().with_header("/data/sub-01_task-rest_bold.nii.gz", header);
        (database, decoder)
    }

    #[test]
    fn test_collects_functional_record() {
        let (database, decoder) = bold_database();
        let resolver = resolver_with_parts(
            database,
            decoder,
            Default::default(),
            Default::default(),
            Default::default(),
        );

        let metadata = collect_metadata(
            &resolver,
            Path::new("/data/sub-01_task-rest_bold.nii.gz"),
            Some(json!({"grand_mean_scaling": true})),
        )
        .unwrap();

        assert!(metadata.contains_key("setting"));
        assert_eq!(
            metadata.get("task_name"),
            Some(&MetadataValue::Str("rest".into()))
        );
        assert_eq!(
            metadata.get("repetition_time"),
            Some(&MetadataValue::Float(2.5))
        );
        assert_eq!(
            metadata.get("slice_encoding_direction"),
            Some(&MetadataValue::Str("k".into()))
        );
        assert_eq!(
            metadata.get("acquisition_voxel_size"),
            Some(&MetadataValue::Floats(vec![2.0, 2.0, 2.0]))
        );
        assert_eq!(
            metadata.get("acquisition_volume_shape"),
            Some(&MetadataValue::Ints(vec![64, 64, 4]))
        );
        assert_eq!(metadata.get("number_of_volumes"), Some(&MetadataValue::Int(220)));
        assert_eq!(
            metadata.get("acquisition_orientation"),
            Some(&MetadataValue::Str("RAS".into()))
        );

        // The settings payload leads, ground truth trails
        let keys: Vec<&str> = metadata.keys().collect();
        assert_eq!(keys.first(), Some(&"setting"));
        assert_eq!(keys.last(), Some(&"acquisition_orientation"));
    }

    #[test]
    fn test_unknown_path_is_an_error() {
        let resolver = resolver_with_parts(
            StubDatabase::default(),
            StubDecoder::default(),
            Default::default(),
            Default::default(),
            Default::default(),
        );

        let result = collect_metadata(&resolver, Path::new("/data/nowhere.nii.gz"), None);
        assert!(matches!(result, Err(NeurometaError::UnknownFile(_))));
    }

    #[test]
    fn test_slice_timing_code_substitutes_slice_timing() {
        let mut database = StubDatabase::default();
        database.insert_record(
            Acquisition::new("/data/sub-01_task-rest_bold.nii.gz", Datatype::Func, "bold")
                .with_metadata("slice_timing_code", "sequential increasing"),
        );
        let header = StubHeader {
            zooms: vec![2.0, 2.0, 2.0, 2.5],
            shape: vec![64, 64, 4, 220],
            slice_axis: Some(2),
            ..StubHeader::default()
        };
        let decoder =
            StubDecoder::default().with_header("/data/sub-01_task-rest_bold.nii.gz", header);

        let resolver = resolver_with_parts(
            database,
            decoder,
            Default::default(),
            Default::default(),
            Default::default(),
        );
        let metadata = collect_metadata(
            &resolver,
            Path::new("/data/sub-01_task-rest_bold.nii.gz"),
            None,
        )
        .unwrap();

        assert!(!metadata.contains_key("slice_timing_code"));
        assert_eq!(
            metadata.get("slice_timing"),
            Some(&MetadataValue::Floats(vec![0.0, 0.625, 1.25, 1.875]))
        );
    }

    #[test]
    fn test_inconsistent_orientation_omits_field_only() {
        // qform and sform disagree; the rest of the record is unaffected
        let mut database = StubDatabase::default();
        database.insert_record(Acquisition::new(
            "/data/sub-01_task-rest_bold.nii.gz",
            Datatype::Func,
            "bold",
        ));

        let mut flipped = DMat4::IDENTITY;
        flipped.x_axis.x = -1.0;
        let header = StubHeader {
            zooms: vec![2.0, 2.0, 2.0, 2.5],
            shape: vec![64, 64, 4, 220],
            qform: Some(DMat4::IDENTITY),
            sform: Some(flipped),
            ..StubHeader::default()
        };
        let decoder =
            StubDecoder::default().with_header("/data/sub-01_task-rest_bold.nii.gz", header);

        let resolver = resolver_with_parts(
            database,
            decoder,
            Default::default(),
            Default::default(),
            Default::default(),
        );
        let metadata = collect_metadata(
            &resolver,
            Path::new("/data/sub-01_task-rest_bold.nii.gz"),
            None,
        )
        .unwrap();

        assert!(!metadata.contains_key("acquisition_orientation"));
        assert_eq!(
            metadata.get("repetition_time"),
            Some(&MetadataValue::Float(2.5))
        );
    }

    #[test]
    fn test_direction_canonicalization_skips_on_failure() {
        // A space-coded direction with no usable affine is skipped with a
        // warning, not fatal
        let mut database = StubDatabase::default();
        database.insert_record(
            Acquisition::new("/data/sub-01_task-rest_bold.nii.gz", Datatype::Func, "bold")
                .with_metadata("phase_encoding_direction", "ap"),
        );
        let header = StubHeader {
            zooms: vec![2.0, 2.0, 2.0, 2.5],
            shape: vec![64, 64, 4, 220],
            ..StubHeader::default()
        };
        let decoder =
            StubDecoder::default().with_header("/data/sub-01_task-rest_bold.nii.gz", header);

        let resolver = resolver_with_parts(
            database,
            decoder,
            Default::default(),
            Default::default(),
            Default::default(),
        );
        let metadata = collect_metadata(
            &resolver,
            Path::new("/data/sub-01_task-rest_bold.nii.gz"),
            None,
        )
        .unwrap();

        assert!(!metadata.contains_key("phase_encoding_direction"));
        assert!(metadata.contains_key("repetition_time"));
    }

    #[test]
    fn test_direction_canonicalization_rewrites_space_code() {
        let mut database = StubDatabase::default();
        database.insert_record(
            Acquisition::new("/data/sub-01_task-rest_bold.nii.gz", Datatype::Func, "bold")
                .with_metadata("phase_encoding_direction", "ap"),
        );
        let header = StubHeader {
            zooms: vec![2.0, 2.0, 2.0, 2.5],
            shape: vec![64, 64, 4, 220],
            qform: Some(DMat4::IDENTITY),
            ..StubHeader::default()
        };
        let decoder =
            StubDecoder::default().with_header("/data/sub-01_task-rest_bold.nii.gz", header);

        let resolver = resolver_with_parts(
            database,
            decoder,
            Default::default(),
            Default::default(),
            Default::default(),
        );
        let metadata = collect_metadata(
            &resolver,
            Path::new("/data/sub-01_task-rest_bold.nii.gz"),
            None,
        )
        .unwrap();

        assert_eq!(
            metadata.get("phase_encoding_direction"),
            Some(&MetadataValue::Str("j-".into()))
        );
    }

    #[test]
    fn test_validation_names_every_stray_key() {
        let mut metadata = CollectedMetadata::new();
        metadata.insert("repetition_time", 2.5);
        metadata.insert("flip_angle", 90.0);
        metadata.insert("coil_elements", 32.0);

        let error = validate_collected(&metadata).unwrap_err();
        match error {
            NeurometaError::SchemaViolation(message) => {
                assert_eq!(message, "\"coil_elements\" and \"flip_angle\"");
            }
            other => panic!("expected SchemaViolation, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_single_stray_key() {
        let mut metadata = CollectedMetadata::new();
        metadata.insert("flip_angle", 90.0);

        let error = validate_collected(&metadata).unwrap_err();
        assert_eq!(
            error.to_string(),
            "collected unknown metadata keys \"flip_angle\""
        );
    }

    #[test]
    fn test_join_quoted() {
        assert_eq!(join_quoted(&[]), "");
        assert_eq!(join_quoted(&["a"]), "\"a\"");
        assert_eq!(join_quoted(&["a", "b"]), "\"a\" and \"b\"");
        assert_eq!(join_quoted(&["a", "b", "c"]), "\"a\", \"b\" and \"c\"");
    }
}
