//! Error types for coil set parsing and geometry

use thiserror::Error;

/// Errors produced by coil set construction, parsing and geometry operations.
#[derive(Error, Debug)]
pub enum CoilError {
    /// A required header line of the coils file is missing or malformed.
    #[error("Bad syntax on line {line} of coils file: expected `{expected}`")]
    MissingHeader {
        /// 1-based line number.
        line: usize,
        /// Marker that was expected on that line.
        expected: &'static str,
    },

    /// A data line could not be parsed.
    #[error("Failed to parse line {line} of coils file: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// A coil group stream cannot be split into coils.
    #[error("Malformed coil group {group}: {reason}")]
    MalformedGroup {
        /// Group name.
        group: String,
        /// Reason for failure.
        reason: String,
    },

    /// Group ids are not contiguous from 1.
    #[error("Coil group id {0} is never defined")]
    MissingGroup(usize),

    /// Not enough points for the requested operation.
    #[error("Need at least {needed} points, found {found}")]
    TooFewPoints {
        /// Minimum number of points.
        needed: usize,
        /// Number of points supplied.
        found: usize,
    },

    #[error("Unsupported spline degree {0} (expected 1..=5)")]
    UnsupportedSplineOrder(usize),

    #[error("Unsupported derivative order {0} (expected 1 or 2)")]
    UnsupportedDerivative(usize),

    /// Frame selector not one of `centroid`, `frenet`, `parallel`.
    #[error("Unknown finite-build frame: {0}. Use: centroid, frenet, or parallel")]
    UnknownFrame(String),

    #[error("Invalid {name}: {value}")]
    InvalidDimension {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// Per-group current override has the wrong length.
    #[error("Expected {expected} group currents, found {found}")]
    CurrentOverrideLength {
        /// Number of coil groups.
        expected: usize,
        /// Length of the supplied array.
        found: usize,
    },

    #[error("Surface point cloud is empty")]
    EmptySurface,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, CoilError>;
