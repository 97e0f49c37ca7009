use crate::error::{NeurometaError, Result};
use crate::external::Database;
use crate::header::HeaderCache;
use crate::types::{
    affine_orientation, invert_location, AxisCode, DirectionCode, Orientation, SpaceCode,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Orientation triples derivable from a set of acquisition files
///
/// Per file, both the qform and the sform contribute independently when
/// valid; unreadable headers and degenerate affines contribute nothing.
pub fn orientation_set(headers: &HeaderCache, paths: &[PathBuf]) -> BTreeSet<Orientation> {
    let mut orientations = BTreeSet::new();

    for path in paths {
        let Some(entry) = headers.load(path) else {
            continue;
        };
        let guard = entry.lock();
        for affine in [guard.header.qform(), guard.header.sform()] {
            if let Ok(affine) = affine {
                if let Some(orientation) = affine_orientation(&affine) {
                    orientations.insert(orientation);
                }
            }
        }
    }

    orientations
}

/// The single orientation triple of a record's geometry group
///
/// # Errors
///
/// Returns `InconsistentOrientation` unless exactly one triple is derivable
/// across every geometry-sharing file.
fn record_orientation(
    headers: &HeaderCache,
    database: &dyn Database,
    path: &Path,
) -> Result<Orientation> {
    let group = database.geometry_group(path);
    let orientations = orientation_set(headers, &group);
    if orientations.len() != 1 {
        return Err(NeurometaError::InconsistentOrientation(
            path.display().to_string(),
        ));
    }
    Ok(orientations.into_iter().next().unwrap())
}

/// Rewrites a direction code into its canonical axis form
///
/// Axis codes pass through unchanged. A space code is resolved against the
/// record's orientation triple: the axis whose anatomical letter belongs to
/// the code becomes the axis digit, negated when the code's leading letter
/// is that axis's own letter (the traversal runs against the axis).
pub fn canonicalize_direction_code(
    code: DirectionCode,
    path: &Path,
    headers: &HeaderCache,
    database: &dyn Database,
) -> Result<AxisCode> {
    let space = match code {
        DirectionCode::Axis(axis) => return Ok(axis),
        DirectionCode::Space(space) => space,
    };

    let orientation = record_orientation(headers, database, path)?;

    for axis in 0..3 {
        let letter = orientation.letter(axis).to_ascii_lowercase();
        if letter == space.location_from() || letter == space.location_to() {
            let negative = space.location_from() == letter;
            return AxisCode::from_parts(axis, negative)
                .ok_or_else(|| NeurometaError::UnknownDirectionCode(space.to_string()));
        }
    }

    Err(NeurometaError::UnknownDirectionCode(space.to_string()))
}

/// Renders a direction code as a human-readable phrase
///
/// The inverse of [`canonicalize_direction_code`]: an axis code is mapped
/// back to a space code through the record's orientation triple, then both
/// forms go through the fixed phrase table.
pub fn direction_code_str(
    code: DirectionCode,
    path: &Path,
    headers: &HeaderCache,
    database: &dyn Database,
) -> Result<&'static str> {
    let space = match code {
        DirectionCode::Space(space) => space,
        DirectionCode::Axis(axis) => {
            let orientation = record_orientation(headers, database, path)?;

            let mut location_to = orientation.letter(axis.axis()).to_ascii_lowercase();
            if axis.is_negative() {
                location_to = invert_location(location_to)
                    .ok_or_else(|| NeurometaError::UnknownDirectionCode(axis.to_string()))?;
            }
            let location_from = invert_location(location_to)
                .ok_or_else(|| NeurometaError::UnknownDirectionCode(axis.to_string()))?;

            SpaceCode::from_locations(location_from, location_to)
                .ok_or_else(|| NeurometaError::UnknownDirectionCode(axis.to_string()))?
        }
    };

    Ok(space.phrase())
}
