//! # Geometry Collaborators
//!
//! Line geometry plus the two narrow interfaces the cross-section core
//! consumes from the outside world:
//!
//! - [`NetworkProvider`]: branch geometry and chainage mapping
//! - [`GeometryProjection`]: YZ projection of 3D lines and perpendicular cuts
//!
//! [`PlanarProjection`] is the reference projection working in the XY plane.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// Identifier of a branch in the hydraulic network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchId(pub u64);

/// An ordered polyline in world coordinates.
///
/// `x`/`y` are plan coordinates, `z` is the elevation.
///
/// # Example
///
/// ```rust
/// use hydro_xsection::geometry::LineString;
/// use glam::DVec3;
///
/// let line = LineString::new(vec![DVec3::ZERO, DVec3::new(3.0, 4.0, 1.0)]);
/// assert_eq!(line.len(), 2);
/// assert_eq!(line.planar_length(), 5.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineString {
    points: Vec<DVec3>,
}

impl LineString {
    /// Creates a line from its points.
    pub fn new(points: Vec<DVec3>) -> Self {
        Self { points }
    }

    /// Returns the number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the line has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the points.
    #[inline]
    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    /// Returns the points for in-place editing.
    #[inline]
    pub fn points_mut(&mut self) -> &mut [DVec3] {
        &mut self.points
    }

    /// Returns the point at `index`, if any.
    pub fn point(&self, index: usize) -> Option<DVec3> {
        self.points.get(index).copied()
    }

    /// Returns true if a point with exactly these coordinates exists.
    pub fn contains(&self, point: DVec3) -> bool {
        self.points.iter().any(|p| *p == point)
    }

    /// Returns a copy with every point moved by `offset`.
    pub fn translated(&self, offset: DVec3) -> Self {
        Self::new(self.points.iter().map(|p| *p + offset).collect())
    }

    /// Length of the line measured in the XY plane.
    pub fn planar_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].truncate().distance(w[1].truncate()))
            .sum()
    }
}

impl From<Vec<DVec3>> for LineString {
    fn from(points: Vec<DVec3>) -> Self {
        Self::new(points)
    }
}

/// Supplies branch geometry and chainage mapping from the network model.
pub trait NetworkProvider {
    /// Returns the plan geometry of a branch, if the branch is known.
    fn branch_geometry(&self, branch: BranchId) -> Option<LineString>;

    /// Maps a user chainage onto a distance along the branch geometry.
    fn map_chainage(&self, branch: BranchId, chainage: f64) -> f64;
}

/// Projects 3D lines onto a profile plane and cuts branches perpendicularly.
pub trait GeometryProjection {
    /// Projects a 3D line to `(y, z)` profile points, one per line point and
    /// in line order. `x` of the result is the lateral offset, `y` the elevation.
    fn project_to_yz(&self, line: &LineString) -> Vec<DVec2>;

    /// Builds a line perpendicular to `branch` at `chainage`.
    ///
    /// The branch crosses the cut where the profile offset equals `thalweg`;
    /// the cut runs from profile offset `left_offset` to `right_offset`.
    fn perpendicular_cut(
        &self,
        branch: &LineString,
        chainage: f64,
        left_offset: f64,
        right_offset: f64,
        thalweg: f64,
    ) -> LineString;
}

/// Projection working in the XY plane.
///
/// Profile offsets are measured along the straight line from the first to the
/// last point, so moving an interior point only changes its own offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanarProjection;

impl PlanarProjection {
    /// Locates the point and unit tangent at a distance along the line.
    ///
    /// The distance is clamped to the line. Returns `None` for lines without
    /// planar extent.
    fn locate(line: &LineString, distance: f64) -> Option<(DVec2, DVec2)> {
        let points = line.points();
        let mut remaining = distance.max(0.0);
        let mut last = None;

        for w in points.windows(2) {
            let (a, b) = (w[0].truncate(), w[1].truncate());
            let length = a.distance(b);
            if length == 0.0 {
                continue;
            }
            let tangent = (b - a) / length;
            if remaining <= length {
                return Some((a + tangent * remaining, tangent));
            }
            remaining -= length;
            last = Some((b, tangent));
        }

        last
    }
}

impl GeometryProjection for PlanarProjection {
    fn project_to_yz(&self, line: &LineString) -> Vec<DVec2> {
        let points = line.points();
        let (first, last) = match (points.first(), points.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Vec::new(),
        };

        let axis = (last - first).truncate();
        if axis.length() == 0.0 {
            // Degenerate chord: fall back to the walked distance.
            let mut walked = 0.0;
            let mut previous = first.truncate();
            return points
                .iter()
                .map(|p| {
                    walked += previous.distance(p.truncate());
                    previous = p.truncate();
                    DVec2::new(walked, p.z)
                })
                .collect();
        }

        let direction = axis.normalize();
        points
            .iter()
            .map(|p| DVec2::new((*p - first).truncate().dot(direction), p.z))
            .collect()
    }

    fn perpendicular_cut(
        &self,
        branch: &LineString,
        chainage: f64,
        left_offset: f64,
        right_offset: f64,
        thalweg: f64,
    ) -> LineString {
        let Some((center, tangent)) = Self::locate(branch, chainage) else {
            return LineString::default();
        };

        // Left of the flow direction; profile offsets grow towards the right bank.
        let normal = tangent.perp();
        let at = |offset: f64| {
            let p = center + normal * (thalweg - offset);
            DVec3::new(p.x, p.y, 0.0)
        };

        LineString::new(vec![at(left_offset), at(right_offset)])
    }
}
