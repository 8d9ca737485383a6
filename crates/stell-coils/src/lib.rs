//! stell-coils: filament coil sets for stellarator design
//!
//! This crate provides:
//! - Biot-Savart magnetic field and vector potential of polyline coils
//! - Finite-build (rectangular cross-section) coil geometry in centroid,
//!   Frenet and parallel-transport frames
//! - Coil groups split from sentinel-terminated point streams
//! - Coil-set aggregation, offset surfaces and coil-surface distances
//! - Reading and writing the `coils` text format
//!
//! Lengths are in meters, currents in amperes, fields in tesla.

pub mod coil;
pub mod coilset;
pub mod error;
pub mod format;
pub mod frame;
pub mod group;
pub mod mesh;
pub mod spline;

pub use coil::{Coil, CurveDerivatives, Point, MU0_OVER_4PI};
pub use coilset::{
    Bounds, CoilPoint, CoilSet, GroupDistances, OffsetRow, OffsetSurface, SurfaceDistances,
};
pub use error::{CoilError, Result};
pub use format::{parse_coils, read_coils_file, write_coils, write_coils_file};
pub use frame::{FiniteBuild, Frame};
pub use group::{split_by_sentinel, CoilGroup};
pub use mesh::FiniteBuildMesh;

/// Cross-section and frame used to thicken filaments
#[derive(Debug, Clone, PartialEq)]
pub struct FiniteBuildConfig {
    /// Extent along the binormal (m)
    pub width: f64,
    /// Extent along the normal (m)
    pub height: f64,
    pub frame: Frame,
}

impl Default for FiniteBuildConfig {
    fn default() -> Self {
        Self {
            width: 0.1,
            height: 0.1,
            frame: Frame::Centroid,
        }
    }
}
