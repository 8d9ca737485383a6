//! Coil groups and sentinel-based coil splitting

use crate::coil::{Coil, Point};
use crate::error::{CoilError, Result};

/// Coils driven by one circuit current.
#[derive(Debug, Clone, PartialEq)]
pub struct CoilGroup {
    name: String,
    current: f64,
    coils: Vec<Coil>,
}

impl CoilGroup {
    /// Split a flat point/current stream into coils.
    ///
    /// The group current is the first non-zero sample of the stream.
    pub fn new(name: impl Into<String>, points: &[Point], currents: &[f64]) -> Result<Self> {
        let name = name.into();
        let current = reference_current(&name, currents)?;
        let coils = split_by_sentinel(&name, points, currents, current)?;
        tracing::debug!(group = %name, coils = coils.len(), current, "split coil group");
        Ok(Self { name, current, coils })
    }

    /// Assemble a group from already built coils.
    pub fn from_coils(name: impl Into<String>, current: f64, coils: Vec<Coil>) -> Result<Self> {
        let name = name.into();
        if coils.is_empty() {
            return Err(CoilError::MalformedGroup {
                group: name,
                reason: "group has no coils".to_string(),
            });
        }
        Ok(Self { name, current, coils })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reference current (A).
    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn coils(&self) -> &[Coil] {
        &self.coils
    }

    pub fn ncoils(&self) -> usize {
        self.coils.len()
    }

    /// Field (T) of every coil in the group, each carrying `current`.
    pub fn b_field(&self, point: &Point, current: f64) -> Point {
        self.coils.iter().map(|c| c.b_field(point, current)).sum()
    }

    /// Vector potential of every coil in the group, each carrying `current`.
    pub fn vector_potential(&self, point: &Point, current: f64) -> Point {
        self.coils.iter().map(|c| c.vector_potential(point, current)).sum()
    }
}

fn reference_current(name: &str, currents: &[f64]) -> Result<f64> {
    currents
        .iter()
        .copied()
        .find(|&c| c != 0.0)
        .ok_or_else(|| CoilError::MalformedGroup {
            group: name.to_string(),
            reason: "no non-zero current sample".to_string(),
        })
}

/// Split a group stream into coils at every zero-current sample.
///
/// A zero current marks the end of a coil and its point is kept as that
/// coil's last point. A coil whose current before the marker has the opposite
/// sign to `reference` is stored reversed, so all coils of a group share one
/// current direction. Points after the last marker are dropped.
pub fn split_by_sentinel(
    group: &str,
    points: &[Point],
    currents: &[f64],
    reference: f64,
) -> Result<Vec<Coil>> {
    let malformed = |reason: String| CoilError::MalformedGroup {
        group: group.to_string(),
        reason,
    };
    if points.len() != currents.len() {
        return Err(malformed(format!(
            "{} points but {} current samples",
            points.len(),
            currents.len()
        )));
    }

    let mut coils = Vec::new();
    let mut start = 0;
    for (end, _) in currents.iter().enumerate().filter(|(_, c)| **c == 0.0) {
        let slice = &points[start..=end];
        if slice.len() < 2 {
            return Err(malformed(format!("coil ending at sample {end} has a single point")));
        }
        let mut coil_points = slice.to_vec();
        if currents[end - 1].signum() != reference.signum() {
            coil_points.reverse();
        }
        coils.push(Coil::new(coil_points)?);
        start = end + 1;
    }

    if coils.is_empty() {
        return Err(malformed("no zero-current coil terminator".to_string()));
    }
    if start < points.len() {
        tracing::warn!(
            group,
            dropped = points.len() - start,
            "points after the last coil terminator ignored"
        );
    }
    Ok(coils)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize, offset: f64) -> Vec<Point> {
        (0..n).map(|i| Point::new(i as f64, offset, 0.0)).collect()
    }

    #[test]
    fn test_split_counts() {
        let points = line(9, 0.0);
        let currents = [5.0, 5.0, 0.0, 5.0, 5.0, 5.0, 0.0, 5.0, 0.0];
        let group = CoilGroup::new("A", &points, &currents).unwrap();

        let zeros = currents.iter().filter(|&&c| c == 0.0).count();
        assert_eq!(group.ncoils(), zeros);
        let total: usize = group.coils().iter().map(|c| c.npts()).sum();
        assert_eq!(total, points.len());
        assert_eq!(group.coils()[1].points()[0], points[3]);
        assert_eq!(group.coils()[1].points()[3], points[6]);
        assert_eq!(group.current(), 5.0);
        assert_eq!(group.name(), "A");
    }

    #[test]
    fn test_reverses_opposite_current() {
        let points = line(6, 1.0);
        let currents = [2.0, 2.0, 0.0, -2.0, -2.0, 0.0];
        let group = CoilGroup::new("B", &points, &currents).unwrap();
        assert_eq!(group.coils()[0].points(), &points[0..3]);
        let reversed: Vec<Point> = points[3..6].iter().rev().copied().collect();
        assert_eq!(group.coils()[1].points(), reversed.as_slice());
    }

    #[test]
    fn test_same_sign_coil_kept_in_order() {
        let points = line(6, 2.0);
        let currents = [2.0, 2.0, 0.0, 7.0, 7.0, 0.0];
        let group = CoilGroup::new("B2", &points, &currents).unwrap();
        assert_eq!(group.current(), 2.0);
        assert_eq!(group.coils()[1].points(), &points[3..6]);
    }

    #[test]
    fn test_reference_is_first_nonzero_current() {
        let points = line(4, 0.0);
        let currents = [-3.0, -3.0, -3.0, 0.0];
        let group = CoilGroup::new("C", &points, &currents).unwrap();
        assert_eq!(group.current(), -3.0);
        assert_eq!(group.coils()[0].points(), points.as_slice());
    }

    #[test]
    fn test_trailing_points_dropped() {
        let points = line(5, 0.0);
        let currents = [1.0, 1.0, 0.0, 1.0, 1.0];
        let group = CoilGroup::new("D", &points, &currents).unwrap();
        assert_eq!(group.ncoils(), 1);
        assert_eq!(group.coils()[0].npts(), 3);
    }

    #[test]
    fn test_malformed_streams() {
        let points = line(3, 0.0);
        assert!(matches!(
            CoilGroup::new("E", &points, &[1.0, 1.0, 1.0]),
            Err(CoilError::MalformedGroup { .. })
        ));
        assert!(matches!(
            CoilGroup::new("E", &points, &[1.0, 0.0, 0.0]),
            Err(CoilError::MalformedGroup { .. })
        ));
        assert!(matches!(
            CoilGroup::new("E", &points, &[0.0, 0.0, 0.0]),
            Err(CoilError::MalformedGroup { .. })
        ));
        assert!(matches!(
            CoilGroup::new("E", &points, &[1.0, 0.0]),
            Err(CoilError::MalformedGroup { .. })
        ));
        assert!(CoilGroup::from_coils("E", 1.0, Vec::new()).is_err());
    }

    #[test]
    fn test_group_field_sums_coils() {
        let points = line(6, 0.0);
        let currents = [1.0, 1.0, 0.0, 1.0, 1.0, 0.0];
        let group = CoilGroup::new("F", &points, &currents).unwrap();
        let probe = Point::new(1.5, 2.0, 0.5);
        let expected: Point = group.coils().iter().map(|c| c.b_field(&probe, 4.0)).sum();
        assert_eq!(group.b_field(&probe, 4.0), expected);
        assert!(group.vector_potential(&probe, 4.0).x > 0.0);
    }
}
