use glam::DMat4;
use std::fmt;

/// Anatomical axis labels in world order, negative letter first.
///
/// World coordinates follow the RAS+ convention: +x toward the subject's
/// right, +y toward anterior, +z toward superior.
const AXIS_LABELS: [(char, char); 3] = [('L', 'R'), ('P', 'A'), ('I', 'S')];

/// Three-letter anatomical orientation of a voxel grid, e.g. "RAS"
///
/// Letter `n` names the anatomical direction a step along data axis `n`
/// moves toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Orientation([char; 3]);

impl Orientation {
    pub fn new(letters: [char; 3]) -> Self {
        Orientation(letters)
    }

    pub fn letters(&self) -> [char; 3] {
        self.0
    }

    /// Letter for one zero-based data axis
    pub fn letter(&self, axis: usize) -> char {
        self.0[axis]
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0 {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// Derives the orientation triple from a voxel-to-world affine
///
/// Each data axis (column of the rotational part) is assigned to the world
/// axis it dominates, greedily by magnitude so no world axis is claimed
/// twice; the sign of the winning entry picks the letter. Returns `None`
/// for degenerate affines that leave an axis unassignable.
pub fn affine_orientation(affine: &DMat4) -> Option<Orientation> {
    let mut letters = [' '; 3];
    let mut row_used = [false; 3];
    let mut col_used = [false; 3];

    for _ in 0..3 {
        let mut best: Option<(usize, usize, f64)> = None;
        for row in 0..3 {
            if row_used[row] {
                continue;
            }
            for col in 0..3 {
                if col_used[col] {
                    continue;
                }
                let value = affine.col(col)[row];
                if best.map_or(true, |(_, _, b)| value.abs() > b.abs()) {
                    best = Some((row, col, value));
                }
            }
        }

        let (row, col, value) = best?;
        if value == 0.0 || !value.is_finite() {
            return None;
        }
        letters[col] = if value > 0.0 {
            AXIS_LABELS[row].1
        } else {
            AXIS_LABELS[row].0
        };
        row_used[row] = true;
        col_used[col] = true;
    }

    Some(Orientation(letters))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{DMat4, DVec4};

    #[test]
    fn test_identity_is_ras() {
        let orientation = affine_orientation(&DMat4::IDENTITY).unwrap();
        assert_eq!(orientation.to_string(), "RAS");
    }

    #[test]
    fn test_flipped_first_axis_is_las() {
        let mut affine = DMat4::IDENTITY;
        affine.x_axis = DVec4::new(-1.0, 0.0, 0.0, 0.0);
        let orientation = affine_orientation(&affine).unwrap();
        assert_eq!(orientation.to_string(), "LAS");
    }

    #[test]
    fn test_swapped_axes() {
        // Data axis 0 runs anterior, data axis 1 runs right
        let affine = DMat4::from_cols(
            DVec4::new(0.0, 2.0, 0.0, 0.0),
            DVec4::new(2.0, 0.0, 0.0, 0.0),
            DVec4::new(0.0, 0.0, 2.0, 0.0),
            DVec4::new(0.0, 0.0, 0.0, 1.0),
        );
        let orientation = affine_orientation(&affine).unwrap();
        assert_eq!(orientation.to_string(), "ARS");
    }

    #[test]
    fn test_oblique_affine_resolves_to_dominant_axes() {
        // Slightly rotated around z, still closest to RAS
        let affine = DMat4::from_cols(
            DVec4::new(0.9, 0.1, 0.0, 0.0),
            DVec4::new(-0.1, 0.9, 0.0, 0.0),
            DVec4::new(0.0, 0.0, 1.0, 0.0),
            DVec4::new(0.0, 0.0, 0.0, 1.0),
        );
        let orientation = affine_orientation(&affine).unwrap();
        assert_eq!(orientation.to_string(), "RAS");
    }

    #[test]
    fn test_degenerate_affine_has_no_orientation() {
        let affine = DMat4::from_cols(
            DVec4::new(0.0, 0.0, 0.0, 0.0),
            DVec4::new(0.0, 1.0, 0.0, 0.0),
            DVec4::new(0.0, 0.0, 1.0, 0.0),
            DVec4::new(0.0, 0.0, 0.0, 1.0),
        );
        assert!(affine_orientation(&affine).is_none());
    }
}
