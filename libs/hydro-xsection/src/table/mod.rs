//! # Profile Tables
//!
//! Typed row storage for the tabular profile representations.
//!
//! ## Row Kinds
//!
//! | Kind | Column 0 | Column 1 | Column 2 |
//! |------|----------|----------|----------|
//! | [`YzRow`] | `y` | `z` | storage depth (>= 0) |
//! | [`ZwRow`] | `z` (unique) | total width (>= 0) | storage width (0..=total) |
//! | [`XyzRow`] | `y` (read-only) | `z` | storage depth (>= 0) |
//!
//! Every mutation validates the affected cells first and fails without
//! writing anything when a value is rejected.

use crate::error::{CrossSectionError, CrossSectionResult};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Number of columns of every profile table.
pub const COLUMN_COUNT: usize = 3;

/// A row with three numeric columns and its validation rules.
pub trait TableRow: Copy + Debug + PartialEq {
    /// Column captions, used in validation messages.
    const COLUMNS: [&'static str; COLUMN_COUNT];

    /// Builds a row from its cells.
    fn from_cells(cells: [f64; COLUMN_COUNT]) -> Self;

    /// Returns the cells in column order.
    fn cells(&self) -> [f64; COLUMN_COUNT];

    /// Key used for sorted insertion (ascending).
    fn sort_key(&self) -> f64;

    /// Validates `candidate[column]` against the committed `rows`.
    ///
    /// `row` is the index of the edited row, or `None` for a row that is not
    /// yet part of the table.
    fn validate(rows: &[Self], row: Option<usize>, column: usize, candidate: &Self) -> Result<(), String>;

    /// Returns the cell at `column`.
    fn cell(&self, column: usize) -> f64 {
        self.cells()[column]
    }

    /// Returns a copy with `column` replaced.
    fn with_cell(&self, column: usize, value: f64) -> Self {
        let mut cells = self.cells();
        cells[column] = value;
        Self::from_cells(cells)
    }
}

fn require_finite(column: &str, value: f64) -> Result<(), String> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(format!("{column} must be a finite number"))
    }
}

fn require_non_negative(column: &str, value: f64) -> Result<(), String> {
    require_finite(column, value)?;
    if value < 0.0 {
        return Err(format!("{column} must be >= 0"));
    }
    Ok(())
}

// =============================================================================
// ROW KINDS
// =============================================================================

/// Row of a YZ table: lateral offset, elevation and storage depth.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct YzRow {
    /// Lateral offset
    pub y: f64,
    /// Bed elevation
    pub z: f64,
    /// Depth of the storage area above the bed
    pub storage_depth: f64,
}

impl YzRow {
    /// Creates a row.
    pub fn new(y: f64, z: f64, storage_depth: f64) -> Self {
        Self { y, z, storage_depth }
    }
}

impl TableRow for YzRow {
    const COLUMNS: [&'static str; COLUMN_COUNT] = ["Y", "Z", "Storage depth"];

    fn from_cells([y, z, storage_depth]: [f64; COLUMN_COUNT]) -> Self {
        Self { y, z, storage_depth }
    }

    fn cells(&self) -> [f64; COLUMN_COUNT] {
        [self.y, self.z, self.storage_depth]
    }

    fn sort_key(&self) -> f64 {
        self.y
    }

    fn validate(_rows: &[Self], _row: Option<usize>, column: usize, candidate: &Self) -> Result<(), String> {
        let value = candidate.cell(column);
        match column {
            2 => require_non_negative(Self::COLUMNS[2], value),
            _ => require_finite(Self::COLUMNS[column], value),
        }
    }
}

/// Row of a ZW table: elevation with total and storage width.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ZwRow {
    /// Elevation
    pub z: f64,
    /// Total width at this elevation
    pub total_width: f64,
    /// Part of the total width that only stores water
    pub storage_width: f64,
}

impl ZwRow {
    /// Creates a row.
    pub fn new(z: f64, total_width: f64, storage_width: f64) -> Self {
        Self {
            z,
            total_width,
            storage_width,
        }
    }

    /// Width that conveys flow.
    pub fn flow_width(&self) -> f64 {
        self.total_width - self.storage_width
    }
}

impl TableRow for ZwRow {
    const COLUMNS: [&'static str; COLUMN_COUNT] = ["Z", "Total width", "Storage width"];

    fn from_cells([z, total_width, storage_width]: [f64; COLUMN_COUNT]) -> Self {
        Self {
            z,
            total_width,
            storage_width,
        }
    }

    fn cells(&self) -> [f64; COLUMN_COUNT] {
        [self.z, self.total_width, self.storage_width]
    }

    fn sort_key(&self) -> f64 {
        self.z
    }

    fn validate(rows: &[Self], row: Option<usize>, column: usize, candidate: &Self) -> Result<(), String> {
        let value = candidate.cell(column);
        match column {
            0 => {
                require_finite(Self::COLUMNS[0], value)?;
                let duplicate = rows
                    .iter()
                    .enumerate()
                    .any(|(index, other)| Some(index) != row && other.z == value);
                if duplicate {
                    return Err(format!("Z value {value} already exists; Z must be unique"));
                }
                Ok(())
            }
            1 => {
                require_non_negative(Self::COLUMNS[1], value)?;
                if candidate.storage_width > value {
                    return Err("Total width can not be smaller than storage width".to_string());
                }
                Ok(())
            }
            _ => {
                require_non_negative(Self::COLUMNS[2], value)?;
                // New rows have no committed width yet, compare against the candidate.
                let total_width = match row {
                    Some(index) => rows.get(index).map_or(candidate.total_width, |r| r.total_width),
                    None => candidate.total_width,
                };
                if value > total_width {
                    return Err("Storage width can not be larger than total width".to_string());
                }
                Ok(())
            }
        }
    }
}

/// Row of an XYZ table: projected offset, elevation and storage depth.
///
/// The offset follows the geometry and can not be edited.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct XyzRow {
    /// Projected lateral offset (derived from geometry)
    pub y: f64,
    /// Elevation
    pub z: f64,
    /// Storage depth added on top of the geometry
    pub storage_depth: f64,
}

impl XyzRow {
    /// Creates a row.
    pub fn new(y: f64, z: f64, storage_depth: f64) -> Self {
        Self { y, z, storage_depth }
    }
}

impl TableRow for XyzRow {
    const COLUMNS: [&'static str; COLUMN_COUNT] = ["Y'", "Z", "Storage depth"];

    fn from_cells([y, z, storage_depth]: [f64; COLUMN_COUNT]) -> Self {
        Self { y, z, storage_depth }
    }

    fn cells(&self) -> [f64; COLUMN_COUNT] {
        [self.y, self.z, self.storage_depth]
    }

    fn sort_key(&self) -> f64 {
        self.y
    }

    fn validate(_rows: &[Self], row: Option<usize>, column: usize, candidate: &Self) -> Result<(), String> {
        let value = candidate.cell(column);
        match column {
            0 if row.is_some() => Err("Y' is derived from the geometry and can not be edited".to_string()),
            2 => require_non_negative(Self::COLUMNS[2], value),
            _ => require_finite(Self::COLUMNS[column], value),
        }
    }
}

// =============================================================================
// TABLE
// =============================================================================

/// Row storage with per-cell validation.
///
/// Validation can be suspended during bulk edits (for example a uniform
/// level shift that temporarily makes two ZW elevations equal); the owning
/// definition re-enables it when the outermost edit closes.
///
/// # Example
///
/// ```rust
/// use hydro_xsection::table::{ProfileTable, ZwRow};
///
/// let table = ProfileTable::from_rows(vec![ZwRow::new(0.0, 10.0, 0.0)]);
/// assert!(table.validate_cell_value(0, 2, 4.0).is_ok());
/// assert!(table.validate_cell_value(0, 2, 12.0).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileTable<R> {
    rows: Vec<R>,
    #[serde(skip, default = "enabled")]
    constraints_enabled: bool,
}

fn enabled() -> bool {
    true
}

impl<R: TableRow> Default for ProfileTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: TableRow> ProfileTable<R> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            constraints_enabled: true,
        }
    }

    /// Creates a table holding `rows` as given.
    pub fn from_rows(rows: Vec<R>) -> Self {
        Self {
            rows,
            constraints_enabled: true,
        }
    }

    /// Returns the rows.
    #[inline]
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// Returns the number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns true unless validation is suspended.
    #[inline]
    pub fn constraints_enabled(&self) -> bool {
        self.constraints_enabled
    }

    /// Checks a new value for a committed cell.
    ///
    /// `Err` carries the message to show the user.
    pub fn validate_cell_value(&self, row: usize, column: usize, value: f64) -> Result<(), String> {
        if column >= COLUMN_COUNT {
            return Err(format!("Column {column} does not exist"));
        }
        let current = self
            .rows
            .get(row)
            .ok_or_else(|| format!("Row {row} does not exist"))?;
        R::validate(&self.rows, Some(row), column, &current.with_cell(column, value))
    }

    /// Checks every cell of a row that is not yet part of the table.
    pub fn validate_new_row(&self, candidate: &R) -> CrossSectionResult<()> {
        if !self.constraints_enabled {
            return Ok(());
        }
        for column in 0..COLUMN_COUNT {
            R::validate(&self.rows, None, column, candidate)
                .map_err(|message| CrossSectionError::invalid_cell(None, column, message))?;
        }
        Ok(())
    }

    pub(crate) fn set_cell(&mut self, row: usize, column: usize, value: f64) -> CrossSectionResult<()> {
        let len = self.rows.len();
        if row >= len {
            return Err(CrossSectionError::out_of_range(row, len));
        }
        if column >= COLUMN_COUNT {
            return Err(CrossSectionError::out_of_range(column, COLUMN_COUNT));
        }
        if self.constraints_enabled {
            self.validate_cell_value(row, column, value)
                .map_err(|message| CrossSectionError::invalid_cell(Some(row), column, message))?;
        }
        self.rows[row] = self.rows[row].with_cell(column, value);
        Ok(())
    }

    pub(crate) fn push(&mut self, row: R) -> CrossSectionResult<usize> {
        self.validate_new_row(&row)?;
        self.rows.push(row);
        Ok(self.rows.len() - 1)
    }

    pub(crate) fn insert_sorted(&mut self, row: R) -> CrossSectionResult<usize> {
        self.validate_new_row(&row)?;
        let key = row.sort_key();
        let index = self.rows.partition_point(|r| r.sort_key() <= key);
        self.rows.insert(index, row);
        Ok(index)
    }

    pub(crate) fn remove(&mut self, index: usize) -> CrossSectionResult<R> {
        if index >= self.rows.len() {
            return Err(CrossSectionError::out_of_range(index, self.rows.len()));
        }
        Ok(self.rows.remove(index))
    }

    pub(crate) fn clear(&mut self) {
        self.rows.clear();
    }

    pub(crate) fn suspend_constraints(&mut self) {
        self.constraints_enabled = false;
    }

    pub(crate) fn resume_constraints(&mut self) {
        self.constraints_enabled = true;
    }

    // Bypass validation; used where the values come from geometry.
    pub(crate) fn insert_unchecked(&mut self, index: usize, row: R) {
        self.rows.insert(index, row);
    }

    pub(crate) fn row_mut_unchecked(&mut self, index: usize) -> Option<&mut R> {
        self.rows.get_mut(index)
    }
}

/// Object-safe view over any [`ProfileTable`], used for dispatch from the
/// definition.
pub(crate) trait CellTable {
    fn len(&self) -> usize;
    fn cells(&self, row: usize) -> Option<[f64; COLUMN_COUNT]>;
    fn validate_cell_value(&self, row: usize, column: usize, value: f64) -> Result<(), String>;
    fn set_cell(&mut self, row: usize, column: usize, value: f64) -> CrossSectionResult<()>;
    fn push_cells(&mut self, cells: [f64; COLUMN_COUNT]) -> CrossSectionResult<usize>;
    fn insert_cells_sorted(&mut self, cells: [f64; COLUMN_COUNT]) -> CrossSectionResult<usize>;
    fn remove_row(&mut self, index: usize) -> CrossSectionResult<()>;
    fn clear_rows(&mut self);
    fn suspend_constraints(&mut self);
    fn resume_constraints(&mut self);
}

impl<R: TableRow> CellTable for ProfileTable<R> {
    fn len(&self) -> usize {
        self.rows.len()
    }

    fn cells(&self, row: usize) -> Option<[f64; COLUMN_COUNT]> {
        self.rows.get(row).map(TableRow::cells)
    }

    fn validate_cell_value(&self, row: usize, column: usize, value: f64) -> Result<(), String> {
        ProfileTable::validate_cell_value(self, row, column, value)
    }

    fn set_cell(&mut self, row: usize, column: usize, value: f64) -> CrossSectionResult<()> {
        ProfileTable::set_cell(self, row, column, value)
    }

    fn push_cells(&mut self, cells: [f64; COLUMN_COUNT]) -> CrossSectionResult<usize> {
        self.push(R::from_cells(cells))
    }

    fn insert_cells_sorted(&mut self, cells: [f64; COLUMN_COUNT]) -> CrossSectionResult<usize> {
        self.insert_sorted(R::from_cells(cells))
    }

    fn remove_row(&mut self, index: usize) -> CrossSectionResult<()> {
        self.remove(index).map(|_| ())
    }

    fn clear_rows(&mut self) {
        self.clear();
    }

    fn suspend_constraints(&mut self) {
        ProfileTable::suspend_constraints(self);
    }

    fn resume_constraints(&mut self) {
        ProfileTable::resume_constraints(self);
    }
}
