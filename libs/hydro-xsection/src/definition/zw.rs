//! # ZW Profiles
//!
//! Symmetric profiles tabulated as elevation against total and storage
//! width. The profile polygon is rebuilt by mirroring half widths around
//! `y = 0`.

use super::{shifted_levels, ProfileSource};
use crate::error::{CrossSectionError, CrossSectionResult};
use crate::summer_dike::SummerDike;
use crate::table::{ProfileTable, ZwRow};
use config::constants::ZW_SECTION_WIDTH_FACTOR;
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Mirrors `(z, width)` levels into a symmetric profile.
///
/// Levels are ordered from the highest to the lowest elevation; the left half
/// runs top to bottom at `-width / 2`, the right half is its mirror image
/// bottom to top. With `apex` set the bottom level is shared by both halves
/// and is emitted once.
pub(crate) fn mirror_levels(levels: &[(f64, f64)], apex: bool) -> Vec<DVec2> {
    let mut levels = levels.to_vec();
    levels.sort_by(|a, b| b.0.total_cmp(&a.0));

    let left: Vec<DVec2> = levels
        .iter()
        .map(|&(z, width)| DVec2::new(-width / 2.0, z))
        .collect();

    let right = left
        .iter()
        .rev()
        .skip(usize::from(apex && !left.is_empty()))
        .map(|p| DVec2::new(-p.x, p.y));

    left.iter().copied().chain(right).collect()
}

/// True when the lowest level has zero width.
pub(crate) fn ends_in_apex(levels: &[(f64, f64)]) -> bool {
    levels
        .iter()
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .is_some_and(|&(_, width)| width == 0.0)
}

/// Profile tabulated as elevation against width.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZwProfile {
    table: ProfileTable<ZwRow>,
    summer_dike: Option<SummerDike>,
    is_closed: bool,
}

impl ZwProfile {
    /// Creates an empty profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// The row table.
    pub fn table(&self) -> &ProfileTable<ZwRow> {
        &self.table
    }

    pub(crate) fn table_mut(&mut self) -> &mut ProfileTable<ZwRow> {
        &mut self.table
    }

    /// Attached summer dike.
    pub fn summer_dike(&self) -> Option<&SummerDike> {
        self.summer_dike.as_ref()
    }

    pub(crate) fn set_summer_dike(&mut self, dike: Option<SummerDike>) {
        self.summer_dike = dike;
    }

    /// True for closed (pipe-like) profiles.
    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    pub(crate) fn set_closed(&mut self, closed: bool) {
        self.is_closed = closed;
    }

    fn levels(&self, with_storage: bool) -> Vec<(f64, f64)> {
        self.table
            .rows()
            .iter()
            .map(|r| {
                let adjust = if with_storage { r.storage_width } else { 0.0 };
                (r.z, r.total_width - adjust)
            })
            .collect()
    }

    /// Replaces the rows with a rectangle.
    pub(crate) fn set_as_rectangle(&mut self, bed_level: f64, width: f64, height: f64) -> CrossSectionResult<()> {
        self.set_as_trapezium(bed_level, width, width, height)
    }

    /// Replaces the rows with a trapezium.
    pub(crate) fn set_as_trapezium(
        &mut self,
        bed_level: f64,
        bottom_width: f64,
        top_width: f64,
        height: f64,
    ) -> CrossSectionResult<()> {
        if height <= 0.0 || !height.is_finite() {
            return Err(CrossSectionError::InvalidShape(format!(
                "height must be positive: {height}"
            )));
        }
        let rows = [
            ZwRow::new(bed_level, bottom_width, 0.0),
            ZwRow::new(bed_level + height, top_width, 0.0),
        ];
        for row in &rows {
            ProfileTable::<ZwRow>::new().validate_new_row(row)?;
        }

        self.table.clear();
        for row in rows {
            self.table.insert_sorted(row)?;
        }
        Ok(())
    }
}

impl ProfileSource for ZwProfile {
    fn profile(&self) -> Vec<DVec2> {
        let levels = self.levels(false);
        mirror_levels(&levels, ends_in_apex(&levels))
    }

    // The apex follows the total width, so storage never changes the point count.
    fn flow_profile(&self) -> Vec<DVec2> {
        mirror_levels(&self.levels(true), ends_in_apex(&self.levels(false)))
    }

    fn shift_level(&mut self, delta: f64) -> CrossSectionResult<()> {
        let levels = shifted_levels(self.table.rows().iter().map(|r| r.z), delta, 0)?;
        // Rows pass each other's elevation while shifting one by one.
        self.table.suspend_constraints();
        for (index, z) in levels.into_iter().enumerate() {
            self.table.set_cell(index, 0, z)?;
        }
        if let Some(dike) = self.summer_dike.as_mut() {
            dike.shift_level(delta);
        }
        Ok(())
    }

    fn sections_domain(&self) -> (f64, f64) {
        let width = crate::profile::lateral_extent(&self.profile()).map_or(0.0, |(min, max)| max - min);
        (0.0, width / 2.0)
    }

    fn section_width_factor(&self) -> f64 {
        ZW_SECTION_WIDTH_FACTOR
    }
}
