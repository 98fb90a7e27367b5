//! Error types for sphere tiling and relaxation

use std::fmt;

/// Errors that can occur while building or relaxing a tiled sphere
#[derive(Debug)]
pub enum RelaxError {
    /// Configuration validation failed
    InvalidConfig(String),
    /// Mesh input is structurally unusable (empty, inconsistent)
    InvalidMesh(String),
    /// A tile references a vertex id that is not in the vertex list
    UnknownVertex {
        /// Tile id containing the dangling reference
        tile: u32,
        /// The unresolved vertex id
        vertex: u32,
    },
    /// A text-encoded vector or tangent could not be parsed
    ParseFailed(String),
    /// Underlying file I/O failure
    Io(std::io::Error),
    /// JSON (de)serialization failure
    Json(serde_json::Error),
}

impl fmt::Display for RelaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelaxError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            RelaxError::InvalidMesh(msg) => write!(f, "invalid mesh: {}", msg),
            RelaxError::UnknownVertex { tile, vertex } => {
                write!(f, "unknown vertex id in tile {}: {}", tile, vertex)
            }
            RelaxError::ParseFailed(msg) => write!(f, "parse failed: {}", msg),
            RelaxError::Io(err) => write!(f, "i/o error: {}", err),
            RelaxError::Json(err) => write!(f, "json error: {}", err),
        }
    }
}

impl std::error::Error for RelaxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RelaxError::Io(err) => Some(err),
            RelaxError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RelaxError {
    fn from(err: std::io::Error) -> Self {
        RelaxError::Io(err)
    }
}

impl From<serde_json::Error> for RelaxError {
    fn from(err: serde_json::Error) -> Self {
        RelaxError::Json(err)
    }
}

/// Result type alias for tiling and relaxation operations
pub type Result<T> = std::result::Result<T, RelaxError>;
