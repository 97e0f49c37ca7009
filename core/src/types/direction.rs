use crate::error::{NeurometaError, Result};
use std::fmt;
use std::str::FromStr;

/// Voxel-space axis designator with sign: i, i-, j, j-, k, k-
///
/// The letters i, j, k correspond to the first, second and third axis of the
/// data array. A trailing "-" flips the traversal sense along that axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisCode {
    I,
    INeg,
    J,
    JNeg,
    K,
    KNeg,
}

impl AxisCode {
    /// Zero-based data axis this code refers to
    pub fn axis(&self) -> usize {
        match self {
            AxisCode::I | AxisCode::INeg => 0,
            AxisCode::J | AxisCode::JNeg => 1,
            AxisCode::K | AxisCode::KNeg => 2,
        }
    }

    /// Whether the traversal sense is flipped
    pub fn is_negative(&self) -> bool {
        matches!(self, AxisCode::INeg | AxisCode::JNeg | AxisCode::KNeg)
    }

    /// Builds a code from a zero-based axis index and a sign
    pub fn from_parts(axis: usize, negative: bool) -> Option<AxisCode> {
        match (axis, negative) {
            (0, false) => Some(AxisCode::I),
            (0, true) => Some(AxisCode::INeg),
            (1, false) => Some(AxisCode::J),
            (1, true) => Some(AxisCode::JNeg),
            (2, false) => Some(AxisCode::K),
            (2, true) => Some(AxisCode::KNeg),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AxisCode::I => "i",
            AxisCode::INeg => "i-",
            AxisCode::J => "j",
            AxisCode::JNeg => "j-",
            AxisCode::K => "k",
            AxisCode::KNeg => "k-",
        }
    }
}

impl fmt::Display for AxisCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AxisCode {
    type Err = NeurometaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "i" => Ok(AxisCode::I),
            "i-" => Ok(AxisCode::INeg),
            "j" => Ok(AxisCode::J),
            "j-" => Ok(AxisCode::JNeg),
            "k" => Ok(AxisCode::K),
            "k-" => Ok(AxisCode::KNeg),
            _ => Err(NeurometaError::UnknownDirectionCode(s.to_string())),
        }
    }
}

/// Anatomical direction-pair designator: rl, lr, pa, ap, si, is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpaceCode {
    Rl,
    Lr,
    Pa,
    Ap,
    Si,
    Is,
}

impl SpaceCode {
    /// Anatomical location the traversal starts from
    pub fn location_from(&self) -> char {
        match self {
            SpaceCode::Rl => 'r',
            SpaceCode::Lr => 'l',
            SpaceCode::Pa => 'p',
            SpaceCode::Ap => 'a',
            SpaceCode::Si => 's',
            SpaceCode::Is => 'i',
        }
    }

    /// Anatomical location the traversal ends at
    pub fn location_to(&self) -> char {
        match self {
            SpaceCode::Rl => 'l',
            SpaceCode::Lr => 'r',
            SpaceCode::Pa => 'a',
            SpaceCode::Ap => 'p',
            SpaceCode::Si => 'i',
            SpaceCode::Is => 's',
        }
    }

    /// Builds a code from start and end locations
    pub fn from_locations(from: char, to: char) -> Option<SpaceCode> {
        match (from, to) {
            ('r', 'l') => Some(SpaceCode::Rl),
            ('l', 'r') => Some(SpaceCode::Lr),
            ('p', 'a') => Some(SpaceCode::Pa),
            ('a', 'p') => Some(SpaceCode::Ap),
            ('s', 'i') => Some(SpaceCode::Si),
            ('i', 's') => Some(SpaceCode::Is),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpaceCode::Rl => "rl",
            SpaceCode::Lr => "lr",
            SpaceCode::Pa => "pa",
            SpaceCode::Ap => "ap",
            SpaceCode::Si => "si",
            SpaceCode::Is => "is",
        }
    }

    /// Human-readable phrase for display
    pub fn phrase(&self) -> &'static str {
        match self {
            SpaceCode::Rl => "right to left",
            SpaceCode::Lr => "left to right",
            SpaceCode::Pa => "posterior to anterior",
            SpaceCode::Ap => "anterior to posterior",
            SpaceCode::Si => "superior to inferior",
            SpaceCode::Is => "inferior to superior",
        }
    }
}

impl fmt::Display for SpaceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpaceCode {
    type Err = NeurometaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rl" => Ok(SpaceCode::Rl),
            "lr" => Ok(SpaceCode::Lr),
            "pa" => Ok(SpaceCode::Pa),
            "ap" => Ok(SpaceCode::Ap),
            "si" => Ok(SpaceCode::Si),
            "is" => Ok(SpaceCode::Is),
            _ => Err(NeurometaError::UnknownDirectionCode(s.to_string())),
        }
    }
}

/// Either encoding of a direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectionCode {
    Axis(AxisCode),
    Space(SpaceCode),
}

impl DirectionCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectionCode::Axis(a) => a.as_str(),
            DirectionCode::Space(s) => s.as_str(),
        }
    }
}

impl fmt::Display for DirectionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DirectionCode {
    type Err = NeurometaError;

    fn from_str(s: &str) -> Result<Self> {
        if let Ok(axis) = s.parse::<AxisCode>() {
            return Ok(DirectionCode::Axis(axis));
        }
        if let Ok(space) = s.parse::<SpaceCode>() {
            return Ok(DirectionCode::Space(space));
        }
        Err(NeurometaError::UnknownDirectionCode(s.to_string()))
    }
}

/// Parses a free-text direction string into a direction code
///
/// Accepts the codes themselves, then a lower-cased, letters-only rendition,
/// then the six spelled-out phrases ("right to left", "AnteriorToPosterior",
/// ...).
///
/// # Errors
///
/// Returns `InvalidDirectionCode` if nothing matches.
pub fn parse_direction_str(s: &str) -> Result<DirectionCode> {
    if let Ok(code) = s.parse::<DirectionCode>() {
        return Ok(code);
    }

    // Keep only letters
    let normalized: String = s
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect();

    if let Ok(code) = normalized.parse::<DirectionCode>() {
        return Ok(code);
    }

    let space = match normalized.as_str() {
        "righttoleft" => Some(SpaceCode::Rl),
        "lefttoright" => Some(SpaceCode::Lr),
        "posteriortoanterior" => Some(SpaceCode::Pa),
        "anteriortoposterior" => Some(SpaceCode::Ap),
        "superiortoinferior" => Some(SpaceCode::Si),
        "inferiortosuperior" => Some(SpaceCode::Is),
        _ => None,
    };

    space
        .map(DirectionCode::Space)
        .ok_or_else(|| NeurometaError::InvalidDirectionCode(s.to_string()))
}

/// Flips an anatomical location letter to its opposite
pub fn invert_location(location: char) -> Option<char> {
    match location {
        'r' => Some('l'),
        'l' => Some('r'),
        'p' => Some('a'),
        'a' => Some('p'),
        's' => Some('i'),
        'i' => Some('s'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("i", DirectionCode::Axis(AxisCode::I))]
    #[case("k-", DirectionCode::Axis(AxisCode::KNeg))]
    #[case("ap", DirectionCode::Space(SpaceCode::Ap))]
    #[case("right to left", DirectionCode::Space(SpaceCode::Rl))]
    #[case("AnteriorToPosterior", DirectionCode::Space(SpaceCode::Ap))]
    #[case("inferior-to-superior", DirectionCode::Space(SpaceCode::Is))]
    fn test_parse_direction_str(#[case] input: &str, #[case] expected: DirectionCode) {
        assert_eq!(parse_direction_str(input).unwrap(), expected);
    }

    #[test]
    fn test_parse_direction_str_rejects_garbage() {
        assert!(matches!(
            parse_direction_str("sideways"),
            Err(NeurometaError::InvalidDirectionCode(_))
        ));
    }

    #[test]
    fn test_axis_code_parts_roundtrip() {
        for axis in 0..3 {
            for negative in [false, true] {
                let code = AxisCode::from_parts(axis, negative).unwrap();
                assert_eq!(code.axis(), axis);
                assert_eq!(code.is_negative(), negative);
                assert_eq!(code.as_str().parse::<AxisCode>().unwrap(), code);
            }
        }
        assert!(AxisCode::from_parts(3, false).is_none());
    }

    #[test]
    fn test_invert_location_is_involution() {
        for c in ['r', 'l', 'p', 'a', 's', 'i'] {
            let inverted = invert_location(c).unwrap();
            assert_ne!(c, inverted);
            assert_eq!(invert_location(inverted), Some(c));
        }
        assert_eq!(invert_location('x'), None);
    }

    #[test]
    fn test_space_code_locations() {
        let code = SpaceCode::Pa;
        assert_eq!(code.location_from(), 'p');
        assert_eq!(code.location_to(), 'a');
        assert_eq!(SpaceCode::from_locations('p', 'a'), Some(SpaceCode::Pa));
        assert_eq!(SpaceCode::from_locations('p', 'l'), None);
    }
}
