//! # Geometry-Based (XYZ) Profiles
//!
//! The authoritative storage is a 3D line; the table mirrors the projected
//! points index by index and adds a storage depth per point.
//!
//! Line geometry carries no change tracking, so every new geometry is
//! compared against a snapshot of the previous one to find out what moved:
//!
//! | Edit | Table update |
//! |------|--------------|
//! | nothing moved | none |
//! | one point moved | that row |
//! | several points moved (translation, replacement) | every row, storage kept |
//! | one point inserted | new row at the point's index |
//! | one point removed | row at the point's old index removed |
//! | anything else | table rebuilt, storage reset |

use super::ProfileSource;
use crate::error::{CrossSectionError, CrossSectionResult};
use crate::geometry::{GeometryProjection, LineString, PlanarProjection};
use crate::profile::sorted_by_offset;
use crate::table::{ProfileTable, XyzRow};
use glam::{DVec2, DVec3};
use std::fmt;
use std::rc::Rc;

/// Classification of a geometry replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryEdit {
    /// Same points as before.
    Unchanged,
    /// More than one point moved, the point count is unchanged.
    Moved,
    /// Exactly the point at this index moved.
    PointMoved(usize),
    /// A point was inserted at this index.
    PointInserted(usize),
    /// The point at this index of the old geometry was removed.
    PointRemoved(usize),
    /// Unrecognized change.
    Rebuild,
}

/// Classifies the change from `old` to `new`.
///
/// Points are matched by coordinate equality.
pub fn classify_edit(old: &LineString, new: &LineString) -> GeometryEdit {
    if old.is_empty() {
        return if new.is_empty() {
            GeometryEdit::Unchanged
        } else {
            GeometryEdit::Rebuild
        };
    }

    let added: Vec<usize> = (0..new.len())
        .filter(|&i| !old.contains(new.points()[i]))
        .collect();

    if old.len() == new.len() {
        return match added.len() {
            0 => GeometryEdit::Unchanged,
            1 => GeometryEdit::PointMoved(added[0]),
            _ => GeometryEdit::Moved,
        };
    }

    let removed: Vec<usize> = (0..old.len())
        .filter(|&i| !new.contains(old.points()[i]))
        .collect();

    match (added.as_slice(), removed.as_slice()) {
        ([index], []) if new.len() == old.len() + 1 => GeometryEdit::PointInserted(*index),
        ([], [index]) if old.len() == new.len() + 1 => GeometryEdit::PointRemoved(*index),
        _ => GeometryEdit::Rebuild,
    }
}

/// Profile projected from a 3D line.
#[derive(Clone)]
pub struct XyzProfile {
    geometry: LineString,
    snapshot: LineString,
    table: ProfileTable<XyzRow>,
    projection: Rc<dyn GeometryProjection>,
}

impl fmt::Debug for XyzProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XyzProfile")
            .field("geometry", &self.geometry)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl XyzProfile {
    /// Creates a profile using the planar projection.
    pub fn new(geometry: LineString) -> Self {
        Self::with_projection(geometry, Rc::new(PlanarProjection))
    }

    /// Creates a profile using a custom projection.
    pub fn with_projection(geometry: LineString, projection: Rc<dyn GeometryProjection>) -> Self {
        let mut profile = Self {
            geometry: LineString::default(),
            snapshot: LineString::default(),
            table: ProfileTable::new(),
            projection,
        };
        profile.set_geometry(geometry);
        profile
    }

    /// The 3D line.
    pub fn geometry(&self) -> &LineString {
        &self.geometry
    }

    /// The row table, index-aligned with the geometry points.
    pub fn table(&self) -> &ProfileTable<XyzRow> {
        &self.table
    }

    fn projected(&self) -> Vec<DVec2> {
        self.projection.project_to_yz(&self.geometry)
    }

    /// Replaces the geometry and reconciles the table against the previous
    /// snapshot.
    pub(crate) fn set_geometry(&mut self, geometry: LineString) -> GeometryEdit {
        let edit = classify_edit(&self.snapshot, &geometry);
        tracing::debug!(?edit, points = geometry.len(), "reconciling XYZ table with geometry");

        self.geometry = geometry;
        self.fix_profile(edit);
        self.snapshot = self.geometry.clone();
        edit
    }

    fn fix_profile(&mut self, edit: GeometryEdit) {
        let projected = self.projected();
        let sync = |table: &mut ProfileTable<XyzRow>, index: usize| {
            if let (Some(row), Some(point)) = (table.row_mut_unchecked(index), projected.get(index)) {
                row.y = point.x;
                row.z = point.y;
            }
        };

        match edit {
            GeometryEdit::Unchanged => {}
            GeometryEdit::Moved => {
                for index in 0..self.table.len() {
                    sync(&mut self.table, index);
                }
            }
            GeometryEdit::PointMoved(index) => sync(&mut self.table, index),
            GeometryEdit::PointInserted(index) => {
                if let Some(point) = projected.get(index) {
                    self.table.insert_unchecked(index, XyzRow::new(point.x, point.y, 0.0));
                }
            }
            GeometryEdit::PointRemoved(index) => {
                // The index comes from the snapshot, which the table mirrors.
                if let Err(error) = self.table.remove(index) {
                    tracing::warn!(%error, index, "XYZ table out of step with geometry snapshot");
                }
            }
            GeometryEdit::Rebuild => {
                self.table.clear();
                for (index, point) in projected.iter().enumerate() {
                    self.table.insert_unchecked(index, XyzRow::new(point.x, point.y, 0.0));
                }
            }
        }
    }

    /// Sets one table cell; column 1 also moves the geometry point.
    pub(crate) fn set_cell(&mut self, row: usize, column: usize, value: f64) -> CrossSectionResult<()> {
        self.table.set_cell(row, column, value)?;
        if column == 1 {
            let len = self.geometry.len();
            let point = self
                .geometry
                .points_mut()
                .get_mut(row)
                .ok_or_else(|| CrossSectionError::out_of_range(row, len))?;
            point.z = value;
            // Keep the snapshot in step so the next reconciliation sees no move.
            self.snapshot = self.geometry.clone();
        }
        Ok(())
    }

    pub(crate) fn resume_constraints(&mut self) {
        self.table.resume_constraints();
    }
}

impl ProfileSource for XyzProfile {
    fn profile(&self) -> Vec<DVec2> {
        sorted_by_offset(&self.projected())
    }

    fn flow_profile(&self) -> Vec<DVec2> {
        let rows = self.table.rows();
        let raised: Vec<DVec2> = self
            .projected()
            .into_iter()
            .enumerate()
            .map(|(index, p)| {
                let storage = rows.get(index).map_or(0.0, |r| r.storage_depth);
                DVec2::new(p.x, p.y + storage)
            })
            .collect();
        sorted_by_offset(&raised)
    }

    fn shift_level(&mut self, delta: f64) -> CrossSectionResult<()> {
        self.geometry = self.geometry.translated(DVec3::new(0.0, 0.0, delta));
        for index in 0..self.table.len() {
            if let Some(row) = self.table.row_mut_unchecked(index) {
                row.z += delta;
            }
        }
        self.snapshot = self.geometry.clone();
        Ok(())
    }

    fn is_geometry_based(&self) -> bool {
        true
    }

    fn calculate_geometry(
        &self,
        _projection: &dyn GeometryProjection,
        _branch: &LineString,
        _chainage: f64,
        _thalweg: f64,
    ) -> LineString {
        self.geometry.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    #[test]
    fn test_removal_past_table_end_leaves_rows() {
        let mut profile = XyzProfile::new(LineString::new(vec![
            DVec3::new(0.0, 0.0, 2.0),
            DVec3::new(1.0, 0.0, 0.0),
        ]));
        let rows = profile.table().rows().to_vec();

        profile.fix_profile(GeometryEdit::PointRemoved(5));

        assert_eq!(profile.table().rows(), rows.as_slice());
    }
}
