use thiserror::Error;

/// Result type for neurometa operations
pub type Result<T> = std::result::Result<T, NeurometaError>;

/// Error types for neurometa operations
#[derive(Error, Debug)]
pub enum NeurometaError {
    /// Image header accessor failure
    #[error("header error: {0}")]
    Header(String),

    /// A direction string could not be parsed into a known code
    #[error("unknown direction string \"{0}\"")]
    InvalidDirectionCode(String),

    /// A direction code could not be canonicalized
    #[error("unknown direction code \"{0}\"")]
    UnknownDirectionCode(String),

    /// The affines of a geometry group do not agree on one orientation
    #[error("inconsistent axis orientations for \"{0}\"")]
    InconsistentOrientation(String),

    /// A source file exists but its content could not be interpreted
    #[error("malformed source: {0}")]
    MalformedSource(String),

    /// Collected metadata carries keys outside the declared schema
    #[error("collected unknown metadata keys {0}")]
    SchemaViolation(String),

    /// The database has no record for a path
    #[error("unknown file \"{0}\"")]
    UnknownFile(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// Helper conversions
impl From<String> for NeurometaError {
    fn from(s: String) -> Self {
        NeurometaError::MalformedSource(s)
    }
}

impl From<&str> for NeurometaError {
    fn from(s: &str) -> Self {
        NeurometaError::MalformedSource(s.to_string())
    }
}
