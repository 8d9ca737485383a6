//! Single filament coil: Biot-Savart kernel and spline derivatives

use std::sync::OnceLock;

use nalgebra::Vector3;
use serde::Serialize;

use crate::error::{CoilError, Result};
use crate::frame::{self, FiniteBuild, Frame};
use crate::spline::{self, BSpline};

/// Cartesian point or vector (m).
pub type Point = Vector3<f64>;

/// μ0 / 4π (H/m)
pub const MU0_OVER_4PI: f64 = 1.0e-7;

/// Spline degree used for coil tangents unless asked otherwise.
pub const DEFAULT_SPLINE_DEGREE: usize = 3;

/// Spline derivatives sampled at the coil points.
#[derive(Debug, Clone, Serialize)]
pub struct CurveDerivatives {
    /// Spline parameter of each point, `linspace(0, 2π, n)`.
    pub parameter: Vec<f64>,
    /// First derivative (unnormalized tangent).
    pub tangent: Vec<Point>,
    /// Second derivative, when requested.
    pub curvature: Option<Vec<Point>>,
}

/// A current filament described as a polyline.
///
/// Segment vectors `d[i] = p[i+1] - p[i]` and moments `v[i] = p[i] × d[i]`
/// are computed once at construction.
#[derive(Debug, Clone)]
pub struct Coil {
    points: Vec<Point>,
    segments: Vec<Point>,
    moments: Vec<Point>,
    derivatives: OnceLock<CurveDerivatives>,
}

impl PartialEq for Coil {
    fn eq(&self, other: &Self) -> bool {
        self.points == other.points
    }
}

impl Coil {
    /// Build a coil from at least two points.
    pub fn new(points: Vec<Point>) -> Result<Self> {
        if points.len() < 2 {
            return Err(CoilError::TooFewPoints {
                needed: 2,
                found: points.len(),
            });
        }
        let segments: Vec<Point> = points.windows(2).map(|w| w[1] - w[0]).collect();
        let moments = points
            .iter()
            .zip(&segments)
            .map(|(p, d)| p.cross(d))
            .collect();
        Ok(Self {
            points,
            segments,
            moments,
            derivatives: OnceLock::new(),
        })
    }

    /// Build a coil from separate coordinate slices.
    pub fn from_xyz(x: &[f64], y: &[f64], z: &[f64]) -> Result<Self> {
        let points = x
            .iter()
            .zip(y)
            .zip(z)
            .map(|((&x, &y), &z)| Point::new(x, y, z))
            .collect();
        Self::new(points)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn npts(&self) -> usize {
        self.points.len()
    }

    /// Segment vectors, length `npts - 1`.
    pub fn segments(&self) -> &[Point] {
        &self.segments
    }

    /// Total filament length (m).
    pub fn length(&self) -> f64 {
        self.segments.iter().map(|d| d.norm()).sum()
    }

    /// True when the last point repeats the first.
    pub fn is_closed(&self) -> bool {
        let gap = (self.points[self.points.len() - 1] - self.points[0]).norm();
        gap <= 1e-12 * self.length().max(1.0)
    }

    /// Arithmetic mean of the coil points.
    pub fn geom_center(&self) -> Point {
        self.points.iter().sum::<Point>() / self.points.len() as f64
    }

    /// Per-segment kernel sums `(Σ f_i d_i, Σ f_i v_i)` at `point`.
    ///
    /// `f_i = (w0 + w1) / (w0 w1 (w0 w1 + r0·r1))` is the closed-form integral
    /// over a straight segment. A probe on a vertex gives `w = 0` and a
    /// non-finite result; callers must keep probes off the filament.
    fn kernel_sums(&self, point: &Point) -> (Point, Point) {
        let mut potential = Point::zeros();
        let mut moment = Point::zeros();
        for (i, (d, v)) in self.segments.iter().zip(&self.moments).enumerate() {
            let r0 = point - self.points[i];
            let r1 = point - self.points[i + 1];
            let w0 = r0.norm();
            let w1 = r1.norm();
            let f = (w0 + w1) / (w0 * w1 * (w0 * w1 + r0.dot(&r1)));
            potential += f * d;
            moment += f * v;
        }
        (potential, moment)
    }

    /// Vector potential at `point` for `current` (A), in kernel units
    /// (multiply by μ0/4π for T·m).
    pub fn vector_potential(&self, point: &Point, current: f64) -> Point {
        let (potential, _) = self.kernel_sums(point);
        potential * current
    }

    /// Magnetic field (T) at `point` for `current` (A).
    ///
    /// `B = μ0/4π (I Σ f_i v_i - x × A)`, which reduces to the finite-segment
    /// Biot-Savart sum `Σ f_i d_i × r0_i`.
    pub fn b_field(&self, point: &Point, current: f64) -> Point {
        let (potential, moment) = self.kernel_sums(point);
        let a = potential * current;
        MU0_OVER_4PI * (moment * current - point.cross(&a))
    }

    /// Distance from every coil point to the nearest surface point (m).
    pub fn surface_distance(&self, surface: &[Point]) -> Result<Vec<f64>> {
        if surface.is_empty() {
            return Err(CoilError::EmptySurface);
        }
        Ok(self
            .points
            .iter()
            .map(|p| {
                surface
                    .iter()
                    .map(|s| (p - s).norm_squared())
                    .fold(f64::INFINITY, f64::min)
                    .sqrt()
            })
            .collect())
    }

    /// Fit a spline of `degree` to x(t), y(t), z(t) over `t = linspace(0, 2π, n)`
    /// and sample its first derivative, plus the second when `derivative == 2`.
    pub fn spline_tangent(&self, degree: usize, derivative: usize) -> Result<CurveDerivatives> {
        if !(1..=2).contains(&derivative) || derivative > degree {
            return Err(CoilError::UnsupportedDerivative(derivative));
        }
        let n = self.points.len();
        let t = spline::linspace(0.0, 2.0 * std::f64::consts::PI, n);
        let x: Vec<f64> = self.points.iter().map(|p| p.x).collect();
        let y: Vec<f64> = self.points.iter().map(|p| p.y).collect();
        let z: Vec<f64> = self.points.iter().map(|p| p.z).collect();
        let fits = BSpline::interpolate_many(&t, &[&x, &y, &z], degree)?;

        let sample = |order: usize| -> Vec<Point> {
            let dx = fits[0].eval_derivative(&t, order);
            let dy = fits[1].eval_derivative(&t, order);
            let dz = fits[2].eval_derivative(&t, order);
            (0..n).map(|i| Point::new(dx[i], dy[i], dz[i])).collect()
        };

        let tangent = sample(1);
        let curvature = (derivative == 2).then(|| sample(2));
        tracing::debug!(npts = n, degree, derivative, "fitted coil spline");
        Ok(CurveDerivatives {
            parameter: t,
            tangent,
            curvature,
        })
    }

    /// Cubic spline tangent and curvature, computed on first use and shared
    /// by every later geometry request.
    pub fn derivatives(&self) -> Result<&CurveDerivatives> {
        if let Some(cached) = self.derivatives.get() {
            return Ok(cached);
        }
        let computed = self.spline_tangent(DEFAULT_SPLINE_DEGREE, 2)?;
        Ok(self.derivatives.get_or_init(|| computed))
    }

    /// Expand the filament into a rectangular-section finite-build coil.
    ///
    /// `width` is measured along the binormal, `height` along the normal.
    pub fn finite_build(&self, width: f64, height: f64, frame: &Frame) -> Result<FiniteBuild> {
        frame::finite_build(self, width, height, frame)
    }

    /// Linearly resample onto `count` evenly spaced values of a normalized
    /// parameter `l ∈ [0, 1]`, with the points placed at `linspace(0, 1, n)`.
    pub fn resample(&self, count: usize) -> Vec<Point> {
        let last = self.points.len() - 1;
        spline::linspace(0.0, 1.0, count)
            .into_iter()
            .map(|l| {
                let s = l * last as f64;
                let i = (s.floor() as usize).min(last - 1);
                let frac = s - i as f64;
                self.points[i] + frac * (self.points[i + 1] - self.points[i])
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::f64::consts::PI;

    /// Regular polygon of `sides` segments, closed (last point repeats the first).
    pub(crate) fn circle(radius: f64, z: f64, sides: usize) -> Coil {
        let points = (0..=sides)
            .map(|i| {
                let theta = 2.0 * PI * (i % sides) as f64 / sides as f64;
                Point::new(radius * theta.cos(), radius * theta.sin(), z)
            })
            .collect();
        Coil::new(points).unwrap()
    }

    #[test]
    fn test_segments_and_moments() {
        let coil = Coil::from_xyz(&[1.0, 2.0, 2.0], &[0.0, 1.0, 3.0], &[0.0, 0.0, 1.0]).unwrap();
        assert_eq!(coil.npts(), 3);
        assert_eq!(coil.segments().len(), 2);
        assert_eq!(coil.segments()[1], Point::new(0.0, 2.0, 1.0));
        assert_eq!(coil.moments[0], Point::new(1.0, 0.0, 0.0).cross(&Point::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn test_too_few_points() {
        let err = Coil::new(vec![Point::zeros()]).unwrap_err();
        assert!(matches!(err, CoilError::TooFewPoints { needed: 2, found: 1 }));
    }

    #[test]
    fn test_straight_wire_matches_analytic() {
        let coil = Coil::new(vec![Point::new(0.0, 0.0, -1.0), Point::new(0.0, 0.0, 2.0)]).unwrap();
        let current = 250.0;
        let probe = Point::new(0.5, 0.0, 0.3);
        let b = coil.b_field(&probe, current);

        // B = μ0 I / (4π ρ) (cos α1 - cos α2), azimuthal (+y at +x)
        let rho = 0.5_f64;
        let (z1, z2) = (-1.0 - 0.3, 2.0 - 0.3);
        let expected = MU0_OVER_4PI * current / rho
            * (z2 / (rho * rho + z2 * z2).sqrt() - z1 / (rho * rho + z1 * z1).sqrt());

        assert!(b.x.abs() < 1e-15);
        assert!(b.z.abs() < 1e-15);
        assert!(((b.y - expected) / expected).abs() < 1e-9, "{} vs {}", b.y, expected);
    }

    #[test]
    fn test_circular_loop_center_field() {
        let (radius, current, sides) = (1.5, 1000.0, 1000);
        let coil = circle(radius, 0.0, sides);
        let b = coil.b_field(&Point::zeros(), current);
        let expected = 2.0e-7 * PI * current / radius;
        assert!(b.x.abs() < 1e-12 && b.y.abs() < 1e-12);
        assert!(((b.z - expected) / expected).abs() < 1.0 / sides as f64);
    }

    #[test]
    fn test_field_and_potential_scale_with_current() {
        let coil = circle(1.0, 0.0, 64);
        let probe = Point::new(0.2, -0.1, 0.4);
        let a1 = coil.vector_potential(&probe, 1.0);
        let a3 = coil.vector_potential(&probe, 3.0);
        let b1 = coil.b_field(&probe, 1.0);
        let b3 = coil.b_field(&probe, -3.0);
        assert!((a3 - 3.0 * a1).norm() < 1e-12 * a3.norm());
        assert!((b3 + 3.0 * b1).norm() < 1e-12 * b3.norm());
    }

    #[test]
    fn test_vector_potential_is_azimuthal_for_loop() {
        let coil = circle(1.0, 0.0, 360);
        let probe = Point::new(0.5, 0.0, 0.2);
        let a = coil.vector_potential(&probe, 1.0);
        // Counter-clockwise current: A points along +y at +x.
        assert!(a.y > 0.0);
        assert!(a.x.abs() < 1e-9 * a.y && a.z.abs() < 1e-12);
    }

    #[test]
    fn test_geom_center_and_length() {
        let coil = Coil::from_xyz(&[0.0, 2.0, 2.0, 0.0], &[0.0, 0.0, 2.0, 2.0], &[1.0; 4]).unwrap();
        assert_eq!(coil.geom_center(), Point::new(1.0, 1.0, 1.0));
        assert!((coil.length() - 6.0).abs() < 1e-12);
        assert!(!coil.is_closed());
        assert!(circle(1.0, 0.0, 12).is_closed());
    }

    #[test]
    fn test_surface_distance_on_surface_is_zero() {
        let coil = circle(2.0, 0.5, 40);
        let mut surface: Vec<Point> = coil.points().to_vec();
        surface.push(Point::new(10.0, 0.0, 0.0));
        let dist = coil.surface_distance(&surface).unwrap();
        assert_eq!(dist.len(), coil.npts());
        assert!(dist.iter().all(|&d| d == 0.0));

        let shifted: Vec<Point> = coil.points().iter().map(|p| p + Point::new(0.0, 0.0, 0.25)).collect();
        let dist = coil.surface_distance(&shifted).unwrap();
        assert!(dist.iter().all(|&d| (d - 0.25).abs() < 1e-12));

        assert!(matches!(coil.surface_distance(&[]), Err(CoilError::EmptySurface)));
    }

    #[test]
    fn test_spline_tangent_of_circle() {
        let coil = circle(1.0, 0.0, 90);
        let derivs = coil.spline_tangent(3, 2).unwrap();
        assert_eq!(derivs.tangent.len(), coil.npts());
        // t runs 0..2π over one turn, so the tangent is dp/dθ.
        for (p, t) in coil.points().iter().zip(&derivs.tangent).skip(1).take(88) {
            let expected = Point::new(-p.y, p.x, 0.0);
            assert!((t - expected).norm() < 1e-3);
        }
        let curvature = derivs.curvature.unwrap();
        assert!((curvature[45] + coil.points()[45]).norm() < 1e-2);
    }

    #[test]
    fn test_spline_tangent_rejects_bad_derivative() {
        let coil = circle(1.0, 0.0, 10);
        assert!(matches!(coil.spline_tangent(3, 3), Err(CoilError::UnsupportedDerivative(3))));
        assert!(matches!(coil.spline_tangent(1, 2), Err(CoilError::UnsupportedDerivative(2))));
        assert!(coil.spline_tangent(3, 1).unwrap().curvature.is_none());
    }

    #[test]
    fn test_derivatives_are_memoized() {
        let coil = circle(1.0, 0.0, 20);
        let first = coil.derivatives().unwrap();
        let second = coil.derivatives().unwrap();
        assert!(std::ptr::eq(first, second));
        assert!(first.curvature.is_some());
    }

    #[test]
    fn test_resample_endpoints() {
        let coil = Coil::from_xyz(&[0.0, 1.0, 3.0], &[0.0; 3], &[0.0; 3]).unwrap();
        let samples = coil.resample(5);
        assert_eq!(samples.len(), 5);
        assert_eq!(samples[0], Point::zeros());
        assert_eq!(samples[2], Point::new(1.0, 0.0, 0.0));
        assert_eq!(samples[3], Point::new(2.0, 0.0, 0.0));
        assert_eq!(samples[4], Point::new(3.0, 0.0, 0.0));
    }
}
