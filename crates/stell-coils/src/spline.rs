//! Interpolating B-splines used to differentiate coil filaments
//!
//! A spline of degree `k` through `n` samples uses a clamped knot vector
//! with `n - k - 1` interior knots. Odd degrees place interior knots on the
//! data sites, even degrees halfway between them. The collocation matrix is
//! banded and totally positive, so it is factored without pivoting.

use crate::error::{CoilError, Result};

/// Highest supported spline degree.
pub const MAX_DEGREE: usize = 5;

/// A scalar B-spline `s(t) = Σ c_i N_{i,k}(t)`.
#[derive(Debug, Clone)]
pub struct BSpline {
    knots: Vec<f64>,
    coeffs: Vec<f64>,
    degree: usize,
}

impl BSpline {
    /// Interpolate `y` at strictly increasing sites `t`.
    pub fn interpolate(t: &[f64], y: &[f64], degree: usize) -> Result<Self> {
        let mut fitted = Self::interpolate_many(t, &[y], degree)?;
        Ok(fitted.remove(0))
    }

    /// Interpolate several series sampled at the same sites.
    ///
    /// The collocation matrix only depends on `t`, so it is factored once and
    /// every series is solved against the same elimination.
    pub fn interpolate_many(t: &[f64], series: &[&[f64]], degree: usize) -> Result<Vec<Self>> {
        if degree == 0 || degree > MAX_DEGREE {
            return Err(CoilError::UnsupportedSplineOrder(degree));
        }
        let n = t.len();
        if n < degree + 1 {
            return Err(CoilError::TooFewPoints {
                needed: degree + 1,
                found: n,
            });
        }
        debug_assert!(t.windows(2).all(|w| w[0] < w[1]), "sites must increase");
        debug_assert!(series.iter().all(|s| s.len() == n));

        let knots = interpolation_knots(t, degree);
        let mut band = Band::new(n, degree);
        for (row, &site) in t.iter().enumerate() {
            let span = find_span(&knots, n - 1, degree, site);
            let basis = basis_functions(&knots, span, degree, site);
            for (r, value) in basis.into_iter().enumerate() {
                band.set(row, span - degree + r, value);
            }
        }

        let mut rhs: Vec<Vec<f64>> = series.iter().map(|s| s.to_vec()).collect();
        band.solve(&mut rhs);

        Ok(rhs
            .into_iter()
            .map(|coeffs| Self {
                knots: knots.clone(),
                coeffs,
                degree,
            })
            .collect())
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Evaluate the spline at `t` (clamped to the parameter domain).
    pub fn eval(&self, t: f64) -> f64 {
        let n = self.coeffs.len() - 1;
        let t = t.clamp(self.knots[self.degree], self.knots[n + 1]);
        let span = find_span(&self.knots, n, self.degree, t);
        basis_functions(&self.knots, span, self.degree, t)
            .iter()
            .enumerate()
            .map(|(r, b)| b * self.coeffs[span - self.degree + r])
            .sum()
    }

    /// The derivative spline, one degree lower.
    ///
    /// `c'_i = k (c_{i+1} - c_i) / (u_{i+k+1} - u_{i+1})` on the knot vector
    /// with its first and last knots removed.
    pub fn derivative(&self) -> Self {
        let k = self.degree;
        if k == 0 {
            return Self {
                knots: self.knots.clone(),
                coeffs: vec![0.0; self.coeffs.len()],
                degree: 0,
            };
        }
        let coeffs = self
            .coeffs
            .windows(2)
            .enumerate()
            .map(|(i, c)| {
                let span = self.knots[i + k + 1] - self.knots[i + 1];
                if span > 0.0 {
                    k as f64 * (c[1] - c[0]) / span
                } else {
                    0.0
                }
            })
            .collect();
        Self {
            knots: self.knots[1..self.knots.len() - 1].to_vec(),
            coeffs,
            degree: k - 1,
        }
    }

    /// Evaluate the `order`-th derivative at every site in `t`.
    pub fn eval_derivative(&self, t: &[f64], order: usize) -> Vec<f64> {
        let mut spline = self.clone();
        for _ in 0..order {
            spline = spline.derivative();
        }
        t.iter().map(|&x| spline.eval(x)).collect()
    }
}

/// Evenly spaced samples over `[start, end]`, both ends included.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| if i + 1 == count { end } else { start + i as f64 * step })
                .collect()
        }
    }
}

/// Clamped knot vector for interpolation at sites `t`.
fn interpolation_knots(t: &[f64], degree: usize) -> Vec<f64> {
    let n = t.len();
    let mut knots = Vec::with_capacity(n + degree + 1);
    knots.extend(std::iter::repeat(t[0]).take(degree + 1));
    let interior = n - degree - 1;
    if degree % 2 == 1 {
        let offset = (degree + 1) / 2;
        knots.extend_from_slice(&t[offset..offset + interior]);
    } else {
        let offset = degree / 2;
        knots.extend((0..interior).map(|j| 0.5 * (t[offset + j] + t[offset + j + 1])));
    }
    knots.extend(std::iter::repeat(t[n - 1]).take(degree + 1));
    knots
}

/// Knot span `i` with `knots[i] <= t < knots[i+1]`; `n` is the last
/// coefficient index. The right end of the domain maps to the last span.
fn find_span(knots: &[f64], n: usize, degree: usize, t: f64) -> usize {
    if t >= knots[n + 1] {
        return n;
    }
    if t <= knots[degree] {
        return degree;
    }
    let mut low = degree;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;
    while t < knots[mid] || t >= knots[mid + 1] {
        if t < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// Non-zero basis values `N_{span-degree..=span}` at `t` (Cox-de Boor).
fn basis_functions(knots: &[f64], span: usize, degree: usize, t: f64) -> Vec<f64> {
    let mut n = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];
    n[0] = 1.0;

    for j in 1..=degree {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            if denom.abs() < 1e-300 {
                n[r] = saved;
                saved = 0.0;
                continue;
            }
            let temp = n[r] / denom;
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n[j] = saved;
    }

    n
}

/// Square band matrix with equal lower and upper bandwidth.
struct Band {
    n: usize,
    width: usize,
    rows: Vec<Vec<f64>>,
}

impl Band {
    fn new(n: usize, width: usize) -> Self {
        Self {
            n,
            width,
            rows: vec![vec![0.0; 2 * width + 1]; n],
        }
    }

    fn set(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(col + self.width >= row && col <= row + self.width);
        self.rows[row][col + self.width - row] = value;
    }

    fn get(&self, row: usize, col: usize) -> f64 {
        self.rows[row][col + self.width - row]
    }

    /// Gaussian elimination without pivoting, then back substitution.
    /// Overwrites every right-hand side with its solution.
    fn solve(&mut self, rhs: &mut [Vec<f64>]) {
        let (n, w) = (self.n, self.width);
        for col in 0..n {
            let pivot = self.get(col, col);
            for row in col + 1..n.min(col + w + 1) {
                let factor = self.get(row, col) / pivot;
                if factor == 0.0 {
                    continue;
                }
                for j in col..n.min(col + w + 1) {
                    let value = self.get(row, j) - factor * self.get(col, j);
                    self.set(row, j, value);
                }
                for b in rhs.iter_mut() {
                    b[row] -= factor * b[col];
                }
            }
        }
        for b in rhs.iter_mut() {
            for row in (0..n).rev() {
                let mut acc = b[row];
                for j in row + 1..n.min(row + w + 1) {
                    acc -= self.get(row, j) * b[j];
                }
                b[row] = acc / self.get(row, row);
            }
        }
    }
}
