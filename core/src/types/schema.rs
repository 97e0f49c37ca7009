use std::fmt;
use std::str::FromStr;

/// Broad kind of an acquisition file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Datatype {
    /// Functional time series
    Func,
    /// Anatomical image
    Anat,
    /// Field map
    Fmap,
    /// Reference image in a standard space
    Ref,
    /// Event table
    Events,
}

impl Datatype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Datatype::Func => "func",
            Datatype::Anat => "anat",
            Datatype::Fmap => "fmap",
            Datatype::Ref => "ref",
            Datatype::Events => "events",
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Datatype {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "func" => Ok(Datatype::Func),
            "anat" => Ok(Datatype::Anat),
            "fmap" => Ok(Datatype::Fmap),
            "ref" => Ok(Datatype::Ref),
            "events" => Ok(Datatype::Events),
            other => Err(format!("Unknown datatype \"{}\"", other)),
        }
    }
}

/// Standard template spaces with registered reference origins
pub const TEMPLATES: &[&str] = &["MNI152NLin2009cAsym", "MNI152NLin6Asym"];

const BOLD_FIELDS: &[&str] = &[
    "repetition_time",
    "echo_time",
    "effective_echo_spacing",
    "phase_encoding_direction",
    "slice_encoding_direction",
    "slice_timing",
    "slice_timing_code",
    "slice_timing_file",
];

const PEPOLAR_FIELDS: &[&str] = &["phase_encoding_direction", "effective_echo_spacing"];

/// Declared metadata keys for one (datatype, suffix) classification
///
/// The returned set is closed: the resolver only fills these keys, and the
/// collector's allow-list is derived from their union.
pub fn metadata_fields(datatype: Datatype, suffix: &str) -> &'static [&'static str] {
    match datatype {
        Datatype::Func => BOLD_FIELDS,
        Datatype::Fmap => match suffix {
            "phasediff" => &["echo_time_difference"],
            "phase1" | "phase2" | "magnitude1" | "magnitude2" => &["echo_time"],
            "epi" => PEPOLAR_FIELDS,
            _ => &[],
        },
        Datatype::Ref => &["space"],
        Datatype::Anat | Datatype::Events => &[],
    }
}

/// Every key a collected record may legally carry
///
/// Union of all declared metadata keys plus the header-derived ground-truth
/// fields and the collector's own additions.
pub const COLLECTED_FIELDS: &[&str] = &[
    "repetition_time",
    "echo_time",
    "echo_time_difference",
    "effective_echo_spacing",
    "phase_encoding_direction",
    "slice_encoding_direction",
    "slice_timing",
    "slice_timing_code",
    "slice_timing_file",
    "space",
    "acquisition_voxel_size",
    "acquisition_volume_shape",
    "number_of_volumes",
    "acquisition_orientation",
    "setting",
    "task_name",
];

/// Whether a key may appear in a collected record
pub fn is_collected_field(key: &str) -> bool {
    COLLECTED_FIELDS.contains(&key)
}
