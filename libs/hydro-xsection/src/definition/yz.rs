//! # YZ Profiles
//!
//! Free-form profiles stored as `(y, z, storage depth)` rows.

use super::{shifted_levels, ProfileSource};
use crate::error::CrossSectionResult;
use crate::table::{ProfileTable, YzRow};
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Profile tabulated as lateral offset against elevation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YzProfile {
    table: ProfileTable<YzRow>,
}

impl YzProfile {
    /// Creates an empty profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a profile from rows, kept in the given order.
    pub fn from_rows(rows: Vec<YzRow>) -> Self {
        Self {
            table: ProfileTable::from_rows(rows),
        }
    }

    /// The row table.
    pub fn table(&self) -> &ProfileTable<YzRow> {
        &self.table
    }

    pub(crate) fn table_mut(&mut self) -> &mut ProfileTable<YzRow> {
        &mut self.table
    }

    fn sorted_rows(&self) -> Vec<YzRow> {
        let mut rows = self.table.rows().to_vec();
        rows.sort_by(|a, b| a.y.total_cmp(&b.y));
        rows
    }
}

impl ProfileSource for YzProfile {
    fn profile(&self) -> Vec<DVec2> {
        self.sorted_rows()
            .iter()
            .map(|r| DVec2::new(r.y, r.z))
            .collect()
    }

    fn flow_profile(&self) -> Vec<DVec2> {
        self.sorted_rows()
            .iter()
            .map(|r| DVec2::new(r.y, r.z + r.storage_depth))
            .collect()
    }

    fn shift_level(&mut self, delta: f64) -> CrossSectionResult<()> {
        let levels = shifted_levels(self.table.rows().iter().map(|r| r.z), delta, 1)?;
        for (index, z) in levels.into_iter().enumerate() {
            self.table.set_cell(index, 1, z)?;
        }
        Ok(())
    }
}
