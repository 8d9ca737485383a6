//! Coil sets: aggregation of groups, offset surfaces and set-level geometry

use serde::Serialize;

use crate::coil::Point;
use crate::error::{CoilError, Result};
use crate::group::CoilGroup;
use crate::mesh::FiniteBuildMesh;
use crate::FiniteBuildConfig;

/// Samples of the normalized coil parameter used by [`CoilSet::offset_surface`].
/// The duplicated end sample is dropped, leaving `OFFSET_NTHETA - 1` vertices.
pub const OFFSET_NTHETA: usize = 64;

/// One point of the flat coil stream, as stored in a coils file.
#[derive(Debug, Clone, PartialEq)]
pub struct CoilPoint {
    pub position: Point,
    /// Current (A); zero marks the end of a coil.
    pub current: f64,
    /// Group id (1-based) and name, present on group-closing points only.
    pub group: Option<(usize, String)>,
}

/// Axis-aligned bounding box of every coil point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

/// Offset vertices of one representative coil.
#[derive(Debug, Clone, Serialize)]
pub struct OffsetRow {
    /// Index of the group the coil belongs to (0-based).
    pub group: usize,
    /// Toroidal angle of the coil's geometric center.
    pub phi: f64,
    pub vertices: Vec<Point>,
}

/// Coarse offset surface, rows ordered by toroidal angle.
#[derive(Debug, Clone, Serialize)]
pub struct OffsetSurface {
    pub distance: f64,
    pub rows: Vec<OffsetRow>,
}

/// Coil-to-surface distances of one group, per coil and per point.
#[derive(Debug, Clone, Serialize)]
pub struct GroupDistances {
    pub name: String,
    pub coils: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SurfaceDistances {
    pub groups: Vec<GroupDistances>,
    pub min: f64,
    pub max: f64,
}

/// A complete coil set: field periods and coil groups.
#[derive(Debug, Clone, PartialEq)]
pub struct CoilSet {
    nfp: usize,
    groups: Vec<CoilGroup>,
}

impl CoilSet {
    pub fn new(nfp: usize, groups: Vec<CoilGroup>) -> Result<Self> {
        if nfp == 0 {
            return Err(CoilError::InvalidDimension {
                name: "nfp",
                value: 0.0,
            });
        }
        Ok(Self { nfp, groups })
    }

    /// Build a coil set from the flat point stream.
    ///
    /// A point carrying a group annotation closes that group: every point since
    /// the previous annotated point belongs to it. Group names come from the
    /// first annotation of each id. Ids must cover `1..=max`.
    pub fn from_points(nfp: usize, points: &[CoilPoint]) -> Result<Self> {
        let mut assignment: Vec<usize> = vec![0; points.len()];
        let mut names: Vec<Option<String>> = Vec::new();
        let mut last = 0;

        for (i, point) in points.iter().enumerate() {
            let Some((id, name)) = &point.group else {
                continue;
            };
            if *id == 0 {
                return Err(CoilError::MalformedGroup {
                    group: name.clone(),
                    reason: "group ids start at 1".to_string(),
                });
            }
            if names.len() < *id {
                names.resize(*id, None);
            }
            names[id - 1].get_or_insert_with(|| name.clone());
            assignment[last..=i].fill(*id);
            last = i + 1;
        }
        if last < points.len() {
            tracing::warn!(
                dropped = points.len() - last,
                "points after the last group annotation ignored"
            );
        }

        let mut groups = Vec::with_capacity(names.len());
        for (index, name) in names.into_iter().enumerate() {
            let id = index + 1;
            let name = name.ok_or(CoilError::MissingGroup(id))?;
            let (positions, currents): (Vec<Point>, Vec<f64>) = points
                .iter()
                .zip(&assignment)
                .filter(|(_, g)| **g == id)
                .map(|(p, _)| (p.position, p.current))
                .unzip();
            groups.push(CoilGroup::new(name, &positions, &currents)?);
        }

        tracing::debug!(nfp, ngroups = groups.len(), "assembled coil set");
        Self::new(nfp, groups)
    }

    /// Inverse of [`CoilSet::from_points`]: each coil's points carry the group
    /// current except its last point, which carries zero. The final point of
    /// each group is annotated with the group id and name.
    pub fn to_points(&self) -> Vec<CoilPoint> {
        let mut out = Vec::new();
        for (gi, group) in self.groups.iter().enumerate() {
            let ncoils = group.ncoils();
            for (ci, coil) in group.coils().iter().enumerate() {
                let npts = coil.npts();
                for (k, position) in coil.points().iter().enumerate() {
                    let terminator = k + 1 == npts;
                    out.push(CoilPoint {
                        position: *position,
                        current: if terminator { 0.0 } else { group.current() },
                        group: (terminator && ci + 1 == ncoils)
                            .then(|| (gi + 1, group.name().to_string())),
                    });
                }
            }
        }
        out
    }

    /// Number of field periods.
    pub fn nfp(&self) -> usize {
        self.nfp
    }

    pub fn groups(&self) -> &[CoilGroup] {
        &self.groups
    }

    pub fn ngroups(&self) -> usize {
        self.groups.len()
    }

    /// Total number of coils over all groups.
    pub fn ncoils(&self) -> usize {
        self.groups.iter().map(|g| g.ncoils()).sum()
    }

    /// Look a group up by name.
    pub fn group(&self, name: &str) -> Option<&CoilGroup> {
        self.groups.iter().find(|g| g.name() == name)
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let mut points = self
            .groups
            .iter()
            .flat_map(|g| g.coils())
            .flat_map(|c| c.points());
        let first = *points.next()?;
        Some(points.fold(Bounds { min: first, max: first }, |b, p| Bounds {
            min: b.min.inf(p),
            max: b.max.sup(p),
        }))
    }

    /// Current of every group: the override when given, else the stored one.
    fn group_currents(&self, overrides: Option<&[f64]>) -> Result<Vec<f64>> {
        match overrides {
            Some(currents) if currents.len() != self.groups.len() => {
                Err(CoilError::CurrentOverrideLength {
                    expected: self.groups.len(),
                    found: currents.len(),
                })
            }
            Some(currents) => Ok(currents.to_vec()),
            None => Ok(self.groups.iter().map(|g| g.current()).collect()),
        }
    }

    /// Total magnetic field (T) at `point`.
    ///
    /// `overrides`, when given, holds one current per group and replaces the
    /// groups' stored currents.
    pub fn total_field(&self, point: &Point, overrides: Option<&[f64]>) -> Result<Point> {
        let currents = self.group_currents(overrides)?;
        Ok(self
            .groups
            .iter()
            .zip(currents)
            .map(|(g, current)| g.b_field(point, current))
            .sum())
    }

    /// Total vector potential at `point` (kernel units, see
    /// [`Coil::vector_potential`](crate::Coil::vector_potential)).
    pub fn total_potential(&self, point: &Point, overrides: Option<&[f64]>) -> Result<Point> {
        let currents = self.group_currents(overrides)?;
        Ok(self
            .groups
            .iter()
            .zip(currents)
            .map(|(g, current)| g.vector_potential(point, current))
            .sum())
    }

    /// Offset the first coil of each group by `distance` (m) in its RZ plane.
    ///
    /// Each resampled point moves along the direction from the coil's
    /// geometric center `(R0, z0)`; negative distances move toward it. A point
    /// exactly at `(R0, z0)` has no direction and yields NaN. Rows are
    /// stable-sorted by the toroidal angle of the coil's center, so equal
    /// angles keep group order.
    pub fn offset_surface(&self, distance: f64) -> OffsetSurface {
        let mut rows: Vec<OffsetRow> = self
            .groups
            .iter()
            .enumerate()
            .map(|(index, group)| {
                let coil = &group.coils()[0];
                let center = coil.geom_center();
                let r0 = center.x.hypot(center.y);
                let phi = center.y.atan2(center.x);

                let mut samples = coil.resample(OFFSET_NTHETA);
                samples.pop();
                let vertices = samples
                    .iter()
                    .map(|p| {
                        let r = p.x.hypot(p.y);
                        let angle = p.y.atan2(p.x);
                        let dr = r - r0;
                        let dz = p.z - center.z;
                        let d = dr.hypot(dz);
                        let r2 = r + dr * distance / d;
                        let z2 = p.z + dz * distance / d;
                        Point::new(r2 * angle.cos(), r2 * angle.sin(), z2)
                    })
                    .collect();
                OffsetRow {
                    group: index,
                    phi,
                    vertices,
                }
            })
            .collect();

        rows.sort_by(|a, b| a.phi.total_cmp(&b.phi));
        OffsetSurface { distance, rows }
    }

    /// Distance from every coil point to the nearest surface point.
    pub fn surface_distance(&self, surface: &[Point]) -> Result<SurfaceDistances> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut groups = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            let mut coils = Vec::with_capacity(group.ncoils());
            for coil in group.coils() {
                let dist = coil.surface_distance(surface)?;
                for &d in &dist {
                    min = min.min(d);
                    max = max.max(d);
                }
                coils.push(dist);
            }
            groups.push(GroupDistances {
                name: group.name().to_string(),
                coils,
            });
        }
        Ok(SurfaceDistances { groups, min, max })
    }

    /// Finite-build mesh of every coil in the set.
    pub fn finite_build_mesh(&self, config: &FiniteBuildConfig) -> Result<FiniteBuildMesh> {
        let mut mesh = FiniteBuildMesh::new();
        for group in &self.groups {
            for coil in group.coils() {
                let build = coil.finite_build(config.width, config.height, &config.frame)?;
                mesh.merge(&FiniteBuildMesh::from_finite_build(&build));
            }
        }
        tracing::debug!(
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "built finite-build mesh"
        );
        Ok(mesh)
    }
}
