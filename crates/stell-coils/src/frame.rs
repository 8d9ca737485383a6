//! Finite-build coil frames
//!
//! A finite-build coil sweeps a `width × height` rectangle along the
//! filament. The rectangle is oriented by an orthonormal frame `(T, N, B)` at
//! every point:
//! - **Tangent** `T`: normalized spline derivative
//! - **Normal** `N`: chosen by [`Frame`]
//! - **Binormal** `B`: `T × N`, normalized

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::coil::{Coil, CurveDerivatives, Point};
use crate::error::{CoilError, Result};

/// Strategy for the normal vector field along a coil.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Frame {
    /// Radial direction from the coil's geometric center, with the tangent
    /// component removed. Follows the coil's overall axis with little twist.
    #[default]
    Centroid,
    /// Normalized second derivative. Undefined where curvature vanishes.
    Frenet,
    /// Parallel transport of a seed normal (Hanson & Ma, 1995).
    Parallel {
        /// `(x, y)` components of the seed normal; `z` is solved so the seed
        /// is perpendicular to the first tangent. Defaults to the in-plane
        /// offset of the first point from the mean of the other points.
        reference: Option<(f64, f64)>,
    },
}

impl Frame {
    pub fn parallel() -> Self {
        Frame::Parallel { reference: None }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Frame::Centroid => "centroid",
            Frame::Frenet => "frenet",
            Frame::Parallel { .. } => "parallel",
        }
    }

    /// Unit normals at every coil point, given unit tangents.
    fn normals(&self, coil: &Coil, tangents: &[Point]) -> Result<Vec<Point>> {
        match self {
            Frame::Centroid => {
                let center = coil.geom_center();
                Ok(coil
                    .points()
                    .iter()
                    .zip(tangents)
                    .map(|(p, t)| {
                        let radial = p - center;
                        (radial - radial.dot(t) * t).normalize()
                    })
                    .collect())
            }
            Frame::Frenet => frenet_normals(coil.derivatives()?),
            Frame::Parallel { reference } => {
                let reference = reference.unwrap_or_else(|| default_reference(coil.points()));
                let seed = seed_normal(reference, &tangents[0]);
                Ok(parallel_transport(tangents, seed))
            }
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Frame {
    type Err = CoilError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "centroid" => Ok(Frame::Centroid),
            "frenet" => Ok(Frame::Frenet),
            "parallel" => Ok(Frame::parallel()),
            _ => Err(CoilError::UnknownFrame(s.to_string())),
        }
    }
}

/// Finite-build geometry of one coil.
///
/// `corners[c][i]` is corner `c` of the cross-section at coil point `i`:
/// 0: `-w/2 B + h/2 N`, 1: `+w/2 B + h/2 N`, 2: `+w/2 B - h/2 N`,
/// 3: `-w/2 B - h/2 N`.
#[derive(Debug, Clone, Serialize)]
pub struct FiniteBuild {
    pub corners: [Vec<Point>; 4],
    pub tangent: Vec<Point>,
    pub normal: Vec<Point>,
    pub binormal: Vec<Point>,
}

impl FiniteBuild {
    /// Number of stations along the coil.
    pub fn len(&self) -> usize {
        self.tangent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tangent.is_empty()
    }
}

pub(crate) fn finite_build(coil: &Coil, width: f64, height: f64, frame: &Frame) -> Result<FiniteBuild> {
    for (name, value) in [("width", width), ("height", height)] {
        if !value.is_finite() || value < 0.0 {
            return Err(CoilError::InvalidDimension { name, value });
        }
    }

    let tangent: Vec<Point> = coil
        .derivatives()?
        .tangent
        .iter()
        .map(|t| t.normalize())
        .collect();
    let normal = frame.normals(coil, &tangent)?;
    let binormal: Vec<Point> = tangent
        .iter()
        .zip(&normal)
        .map(|(t, n)| t.cross(n).normalize())
        .collect();

    let (hw, hh) = (0.5 * width, 0.5 * height);
    let corner = |sb: f64, sn: f64| -> Vec<Point> {
        coil.points()
            .iter()
            .zip(&binormal)
            .zip(&normal)
            .map(|((p, b), n)| p + sb * hw * b + sn * hh * n)
            .collect()
    };
    let corners = [corner(-1.0, 1.0), corner(1.0, 1.0), corner(1.0, -1.0), corner(-1.0, -1.0)];

    tracing::debug!(npts = coil.npts(), width, height, frame = %frame, "built finite-build coil");
    Ok(FiniteBuild {
        corners,
        tangent,
        normal,
        binormal,
    })
}

fn frenet_normals(derivs: &CurveDerivatives) -> Result<Vec<Point>> {
    let curvature = derivs
        .curvature
        .as_ref()
        .ok_or(CoilError::UnsupportedDerivative(2))?;
    Ok(curvature.iter().map(|k| k.normalize()).collect())
}

/// `(x, y)` of `p[0] - mean(p[0..n-1])`
fn default_reference(points: &[Point]) -> (f64, f64) {
    let head = &points[..points.len() - 1];
    let offset = points[0] - head.iter().sum::<Point>() / head.len() as f64;
    (offset.x, offset.y)
}

/// Seed normal `(vx, vy, vz)` with `vz = -(vx Tx + vy Ty) / Tz`, normalized.
///
/// When `Tz` vanishes the in-plane vector `(vx, vy, 0)` is projected onto the
/// plane normal to `tangent` instead; an arbitrary perpendicular is used if
/// that projection vanishes too.
fn seed_normal((vx, vy): (f64, f64), tangent: &Point) -> Point {
    const TOLERANCE: f64 = 1e-9;
    let scale = vx.hypot(vy).max(1e-300);
    if tangent.z.abs() > TOLERANCE {
        let v = Point::new(vx, vy, -(vx * tangent.x + vy * tangent.y) / tangent.z);
        if v.norm() > TOLERANCE * scale {
            return v.normalize();
        }
    } else {
        let v = Point::new(vx, vy, 0.0);
        let projected = v - v.dot(tangent) * tangent;
        if projected.norm() > TOLERANCE * scale {
            return projected.normalize();
        }
    }
    let arbitrary = if tangent.x.abs() < 0.9 {
        Point::x()
    } else {
        Point::y()
    };
    arbitrary.cross(tangent).normalize()
}

/// Rotate `v` about unit `axis` by `angle` (Rodrigues' formula).
fn rodrigues(v: &Point, axis: &Point, angle: f64) -> Point {
    let (sin_a, cos_a) = angle.sin_cos();
    v * cos_a + axis.cross(v) * sin_a + axis * (axis.dot(v) * (1.0 - cos_a))
}

/// Propagate `seed` along unit `tangents`: each step rotates the normal about
/// `T_i × T_{i+1}` by the angle between the tangents.
fn parallel_transport(tangents: &[Point], seed: Point) -> Vec<Point> {
    let mut normals = Vec::with_capacity(tangents.len());
    let mut current = seed;
    normals.push(current);

    for pair in tangents.windows(2) {
        let axis = pair[0].cross(&pair[1]);
        let rotated = if axis.norm() > 1e-12 {
            let theta = pair[0].dot(&pair[1]).clamp(-1.0, 1.0).acos();
            rodrigues(&current, &axis.normalize(), theta)
        } else {
            current
        };
        // re-project onto the plane normal to T_{i+1}
        current = (rotated - rotated.dot(&pair[1]) * pair[1]).normalize();
        normals.push(current);
    }

    normals
}
