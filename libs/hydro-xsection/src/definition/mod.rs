//! # Cross-Section Definitions
//!
//! A definition describes how flow width varies with elevation. Four
//! interchangeable representations exist:
//!
//! | Kind | Authoritative storage | Profile |
//! |------|-----------------------|---------|
//! | [`YzProfile`] | `(y, z, storage depth)` rows | rows sorted by `y` |
//! | [`ZwProfile`] | `(z, total, storage)` width rows | mirrored half widths |
//! | [`StandardProfile`] | shape parameters + level | canonical shape points |
//! | [`XyzProfile`] | 3D line + storage rows | YZ projection of the line |
//!
//! All mutation runs inside an edit (see [`crate::edit`]); when the
//! outermost edit closes the definition repairs its invariants:
//!
//! 1. cell validation is re-enabled
//! 2. the thalweg is clamped into the profile's offset range
//! 3. with `force_sections_span_full_width`, the bands are redistributed and
//!    clamped to the section domain
//! 4. a fresh revision invalidates cached geometry

mod standard;
mod xyz;
mod yz;
mod zw;

pub use standard::{StandardProfile, StandardShape};
pub use xyz::{classify_edit, GeometryEdit, XyzProfile};
pub use yz::YzProfile;
pub use zw::ZwProfile;

use crate::edit::{EditGuard, EditOutcome, EditSession, EditState, Transactional};
use crate::error::{CrossSectionError, CrossSectionResult};
use crate::geometry::{GeometryProjection, LineString};
use crate::profile::{lateral_extent, ProfileView};
use crate::sections::{Boundary, SectionBand, SectionBands, SectionKind};
use crate::summer_dike::SummerDike;
use crate::table::{CellTable, TableRow, XyzRow, YzRow, ZwRow, COLUMN_COUNT};
use config::constants::{ProfileConfig, DEFAULT_SECTION_WIDTH_FACTOR, MAIN_SECTION_NAME};
use glam::DVec2;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

/// Returns a revision number never handed out before.
pub(crate) fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}

/// Elevations moved by `delta`; fails before anything is written if one
/// of them leaves the finite range.
fn shifted_levels(
    levels: impl Iterator<Item = f64>,
    delta: f64,
    column: usize,
) -> CrossSectionResult<Vec<f64>> {
    levels
        .enumerate()
        .map(|(row, z)| {
            let shifted = z + delta;
            if shifted.is_finite() {
                Ok(shifted)
            } else {
                Err(CrossSectionError::invalid_cell(
                    Some(row),
                    column,
                    format!("shifted level is not finite: {shifted}"),
                ))
            }
        })
        .collect()
}

/// Common capability of the profile representations.
pub trait ProfileSource {
    /// Profile points sorted by offset (or in canonical shape order).
    fn profile(&self) -> Vec<DVec2>;

    /// Profile adjusted for storage.
    fn flow_profile(&self) -> Vec<DVec2>;

    /// Moves every authoritative elevation by `delta`.
    fn shift_level(&mut self, delta: f64) -> CrossSectionResult<()>;

    /// Offset range the section bands must cover.
    fn sections_domain(&self) -> (f64, f64) {
        lateral_extent(&self.profile()).unwrap_or((0.0, 0.0))
    }

    /// Factor converting band spans into widths.
    fn section_width_factor(&self) -> f64 {
        DEFAULT_SECTION_WIDTH_FACTOR
    }

    /// True when the profile is projected from a 3D geometry.
    fn is_geometry_based(&self) -> bool {
        false
    }

    /// Plan geometry of the cross section on `branch` at `chainage`.
    fn calculate_geometry(
        &self,
        projection: &dyn GeometryProjection,
        branch: &LineString,
        chainage: f64,
        thalweg: f64,
    ) -> LineString {
        let (left, right) = lateral_extent(&self.profile()).unwrap_or((0.0, 0.0));
        projection.perpendicular_cut(branch, chainage, left, right, thalweg)
    }
}

/// The profile representation of a definition.
#[derive(Debug, Clone)]
pub enum DefinitionKind {
    /// Tabulated offset/elevation.
    Yz(YzProfile),
    /// Tabulated elevation/width.
    Zw(ZwProfile),
    /// Parametric shape.
    Standard(StandardProfile),
    /// Projected 3D line.
    Xyz(XyzProfile),
}

impl DefinitionKind {
    fn source(&self) -> &dyn ProfileSource {
        match self {
            Self::Yz(p) => p,
            Self::Zw(p) => p,
            Self::Standard(p) => p,
            Self::Xyz(p) => p,
        }
    }

    fn source_mut(&mut self) -> &mut dyn ProfileSource {
        match self {
            Self::Yz(p) => p,
            Self::Zw(p) => p,
            Self::Standard(p) => p,
            Self::Xyz(p) => p,
        }
    }

    fn table(&self) -> Option<&dyn CellTable> {
        match self {
            Self::Yz(p) => Some(p.table()),
            Self::Zw(p) => Some(p.table()),
            Self::Xyz(p) => Some(p.table()),
            Self::Standard(_) => None,
        }
    }

    // Tables whose rows may be added and removed freely.
    fn editable_table(&mut self) -> CrossSectionResult<&mut dyn CellTable> {
        match self {
            Self::Yz(p) => Ok(p.table_mut()),
            Self::Zw(p) => Ok(p.table_mut()),
            Self::Xyz(_) => Err(CrossSectionError::invalid_operation(
                "rows of a geometry-based profile follow the geometry points",
            )),
            Self::Standard(_) => Err(CrossSectionError::invalid_operation(
                "a standard shape has no profile table",
            )),
        }
    }

    fn resume_constraints(&mut self) {
        match self {
            Self::Yz(p) => p.table_mut().resume_constraints(),
            Self::Zw(p) => p.table_mut().resume_constraints(),
            Self::Xyz(p) => p.resume_constraints(),
            Self::Standard(_) => {}
        }
    }

    /// Short name of the representation.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Yz(_) => "YZ",
            Self::Zw(_) => "ZW",
            Self::Standard(_) => "Standard",
            Self::Xyz(_) => "XYZ",
        }
    }
}

/// A cross-section definition owning its profile and section bands.
///
/// # Example
///
/// ```rust
/// use hydro_xsection::definition::CrossSectionDefinition;
/// use hydro_xsection::profile::ProfileView;
///
/// let mut definition = CrossSectionDefinition::zw("culvert");
/// definition.set_as_rectangle(0.0, 10.0, 2.0).unwrap();
/// assert_eq!(definition.width(), 10.0);
/// assert_eq!(definition.profile().len(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct CrossSectionDefinition {
    name: String,
    description: String,
    thalweg: f64,
    force_sections_span_full_width: bool,
    sections: SectionBands,
    kind: DefinitionKind,
    config: ProfileConfig,
    main_section_name: String,
    session: EditSession,
    revision: u64,
}

impl CrossSectionDefinition {
    /// Creates a definition around an existing representation.
    pub fn new(name: impl Into<String>, kind: DefinitionKind) -> Self {
        let mut definition = Self {
            name: name.into(),
            description: String::new(),
            thalweg: 0.0,
            force_sections_span_full_width: false,
            sections: SectionBands::new(),
            kind,
            config: ProfileConfig::default(),
            main_section_name: MAIN_SECTION_NAME.to_string(),
            session: EditSession::new(),
            revision: next_revision(),
        };
        definition.clamp_thalweg();
        definition
    }

    /// Creates an empty YZ definition.
    pub fn yz(name: impl Into<String>) -> Self {
        Self::new(name, DefinitionKind::Yz(YzProfile::new()))
    }

    /// Creates a YZ definition from `(y, z)` points without storage.
    pub fn from_yz_points(name: impl Into<String>, points: &[(f64, f64)]) -> Self {
        let rows = points.iter().map(|&(y, z)| YzRow::new(y, z, 0.0)).collect();
        Self::new(name, DefinitionKind::Yz(YzProfile::from_rows(rows)))
    }

    /// Creates an empty ZW definition.
    pub fn zw(name: impl Into<String>) -> Self {
        Self::new(name, DefinitionKind::Zw(ZwProfile::new()))
    }

    /// Creates a ZW definition from validated rows.
    pub fn from_zw_rows(name: impl Into<String>, rows: &[ZwRow]) -> CrossSectionResult<Self> {
        let mut definition = Self::zw(name);
        {
            let mut edit = definition.begin_edit("Create ZW profile");
            for row in rows {
                edit.insert_row(row.cells())?;
            }
        }
        Ok(definition)
    }

    /// Creates a standard-shape definition.
    pub fn standard(name: impl Into<String>, shape: StandardShape) -> CrossSectionResult<Self> {
        Ok(Self::new(name, DefinitionKind::Standard(StandardProfile::new(shape)?)))
    }

    /// Creates a geometry-based definition using the planar projection.
    pub fn xyz(name: impl Into<String>, geometry: LineString) -> Self {
        Self::new(name, DefinitionKind::Xyz(XyzProfile::new(geometry)))
    }

    /// Creates a geometry-based definition using a custom projection.
    pub fn xyz_with_projection(
        name: impl Into<String>,
        geometry: LineString,
        projection: Rc<dyn GeometryProjection>,
    ) -> Self {
        Self::new(
            name,
            DefinitionKind::Xyz(XyzProfile::with_projection(geometry, projection)),
        )
    }

    /// Replaces the numeric configuration.
    pub fn with_config(mut self, config: ProfileConfig) -> Self {
        self.config = config;
        if let DefinitionKind::Standard(p) = &mut self.kind {
            p.set_segments(config.shape_segments);
        }
        self
    }

    /// Replaces the name of the section kind anchoring width adjustment.
    pub fn with_main_section_name(mut self, name: impl Into<String>) -> Self {
        self.main_section_name = name.into();
        self
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// The profile representation.
    pub fn kind(&self) -> &DefinitionKind {
        &self.kind
    }

    /// Numeric configuration.
    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    /// Revision of the last committed edit.
    ///
    /// Revisions are unique across definitions.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The section band collection.
    pub fn section_bands(&self) -> &SectionBands {
        &self.sections
    }

    /// YZ rows, for YZ definitions.
    pub fn yz_rows(&self) -> Option<&[YzRow]> {
        match &self.kind {
            DefinitionKind::Yz(p) => Some(p.table().rows()),
            _ => None,
        }
    }

    /// ZW rows, for ZW definitions.
    pub fn zw_rows(&self) -> Option<&[ZwRow]> {
        match &self.kind {
            DefinitionKind::Zw(p) => Some(p.table().rows()),
            _ => None,
        }
    }

    /// XYZ rows, for geometry-based definitions.
    pub fn xyz_rows(&self) -> Option<&[XyzRow]> {
        match &self.kind {
            DefinitionKind::Xyz(p) => Some(p.table().rows()),
            _ => None,
        }
    }

    /// The 3D geometry, for geometry-based definitions.
    pub fn geometry(&self) -> Option<&LineString> {
        match &self.kind {
            DefinitionKind::Xyz(p) => Some(p.geometry()),
            _ => None,
        }
    }

    /// The shape, for standard definitions.
    pub fn shape(&self) -> Option<&StandardShape> {
        match &self.kind {
            DefinitionKind::Standard(p) => Some(p.shape()),
            _ => None,
        }
    }

    /// True for closed ZW profiles and closed standard shapes.
    pub fn is_closed(&self) -> bool {
        match &self.kind {
            DefinitionKind::Zw(p) => p.is_closed(),
            DefinitionKind::Standard(p) => p.shape().is_closed(),
            _ => false,
        }
    }

    /// Offset range the section bands must cover.
    pub fn sections_domain(&self) -> (f64, f64) {
        self.kind.source().sections_domain()
    }

    /// Plan geometry of this definition on `branch` at `chainage`.
    pub fn calculate_geometry(
        &self,
        projection: &dyn GeometryProjection,
        branch: &LineString,
        chainage: f64,
    ) -> LineString {
        self.kind
            .source()
            .calculate_geometry(projection, branch, chainage, self.thalweg)
    }

    // =========================================================================
    // EDITING
    // =========================================================================

    /// Opens an edit; the returned guard closes it when dropped.
    pub fn begin_edit(&mut self, description: impl Into<String>) -> EditGuard<'_, Self> {
        EditGuard::begin(self, description)
    }

    /// True while an edit is open.
    pub fn is_editing(&self) -> bool {
        self.session.is_editing()
    }

    /// State of the edit session.
    pub fn edit_state(&self) -> EditState {
        self.session.state()
    }

    /// Suspends cell validation until the outermost edit closes.
    ///
    /// Fails outside an edit.
    pub fn suspend_cell_constraints(&mut self) -> CrossSectionResult<()> {
        if !self.session.is_editing() {
            return Err(CrossSectionError::invalid_operation(
                "cell constraints can only be suspended inside an edit",
            ));
        }
        match &mut self.kind {
            DefinitionKind::Yz(p) => p.table_mut().suspend_constraints(),
            DefinitionKind::Zw(p) => p.table_mut().suspend_constraints(),
            DefinitionKind::Xyz(_) | DefinitionKind::Standard(_) => {}
        }
        Ok(())
    }

    /// Sets the name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Sets the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Sets the thalweg, clamped into the profile's offset range.
    pub fn set_thalweg(&mut self, thalweg: f64) -> CrossSectionResult<()> {
        if !thalweg.is_finite() {
            return Err(CrossSectionError::invalid_operation(format!(
                "thalweg must be finite: {thalweg}"
            )));
        }
        // The thalweg positions the plan cut, so it needs a fresh revision.
        let mut edit = self.begin_edit("Set thalweg");
        edit.thalweg = thalweg;
        edit.clamp_thalweg();
        Ok(())
    }

    /// Requires the bands to cover the full section domain.
    pub fn set_force_sections_span_full_width(&mut self, force: bool) {
        let mut edit = self.begin_edit("Force sections to span full width");
        edit.force_sections_span_full_width = force;
    }

    /// Moves every elevation of the profile by `delta`.
    pub fn shift_level(&mut self, delta: f64) -> CrossSectionResult<()> {
        if !delta.is_finite() {
            return Err(CrossSectionError::invalid_operation(format!(
                "level shift must be finite: {delta}"
            )));
        }
        let mut edit = self.begin_edit(format!("Shift level by {delta}"));
        edit.kind.source_mut().shift_level(delta)
    }

    fn clamp_thalweg(&mut self) {
        if let Some((left, right)) = lateral_extent(&self.kind.source().profile()) {
            self.thalweg = self.thalweg.clamp(left, right);
        }
    }

    // =========================================================================
    // TABLE
    // =========================================================================

    /// Number of table rows (`0` for standard shapes).
    pub fn row_count(&self) -> usize {
        self.kind.table().map_or(0, |table| table.len())
    }

    /// Cells of one table row.
    pub fn row_cells(&self, row: usize) -> Option<[f64; COLUMN_COUNT]> {
        self.kind.table().and_then(|t| t.cells(row))
    }

    /// Checks a new value for a committed cell without writing it.
    ///
    /// `Err` carries the message to show the user.
    pub fn validate_cell_value(&self, row: usize, column: usize, value: f64) -> Result<(), String> {
        match self.kind.table() {
            Some(table) => table.validate_cell_value(row, column, value),
            None => Err("a standard shape has no profile table".to_string()),
        }
    }

    /// Writes one cell after validation.
    pub fn set_cell_value(&mut self, row: usize, column: usize, value: f64) -> CrossSectionResult<()> {
        let mut edit = self.begin_edit("Row changed");
        match &mut edit.kind {
            DefinitionKind::Xyz(p) => p.set_cell(row, column, value),
            kind => kind.editable_table()?.set_cell(row, column, value),
        }
    }

    /// Appends a row after validation; returns its index.
    pub fn add_row(&mut self, cells: [f64; COLUMN_COUNT]) -> CrossSectionResult<usize> {
        self.kind.editable_table()?;
        let mut edit = self.begin_edit("Row added");
        edit.kind.editable_table()?.push_cells(cells)
    }

    /// Inserts a row at its sorted position after validation; returns its index.
    pub fn insert_row(&mut self, cells: [f64; COLUMN_COUNT]) -> CrossSectionResult<usize> {
        self.kind.editable_table()?;
        let mut edit = self.begin_edit("Row inserted");
        edit.kind.editable_table()?.insert_cells_sorted(cells)
    }

    /// Removes one row.
    pub fn remove_row(&mut self, index: usize) -> CrossSectionResult<()> {
        self.kind.editable_table()?;
        let mut edit = self.begin_edit("Row removed");
        edit.kind.editable_table()?.remove_row(index)
    }

    /// Removes all rows.
    pub fn clear_rows(&mut self) -> CrossSectionResult<()> {
        self.kind.editable_table()?;
        let mut edit = self.begin_edit("Rows cleared");
        edit.kind.editable_table()?.clear_rows();
        Ok(())
    }

    // =========================================================================
    // KIND-SPECIFIC EDITS
    // =========================================================================

    fn zw_mut(&mut self) -> CrossSectionResult<&mut ZwProfile> {
        match &mut self.kind {
            DefinitionKind::Zw(p) => Ok(p),
            other => Err(CrossSectionError::invalid_operation(format!(
                "{} definitions are not tabulated by width",
                other.label()
            ))),
        }
    }

    /// Replaces the ZW table with a rectangle.
    pub fn set_as_rectangle(&mut self, bed_level: f64, width: f64, height: f64) -> CrossSectionResult<()> {
        self.zw_mut()?;
        let mut edit = self.begin_edit("Set as rectangle");
        edit.zw_mut()?.set_as_rectangle(bed_level, width, height)
    }

    /// Replaces the ZW table with a trapezium.
    pub fn set_as_trapezium(
        &mut self,
        bed_level: f64,
        bottom_width: f64,
        top_width: f64,
        height: f64,
    ) -> CrossSectionResult<()> {
        self.zw_mut()?;
        let mut edit = self.begin_edit("Set as trapezium");
        edit.zw_mut()?
            .set_as_trapezium(bed_level, bottom_width, top_width, height)
    }

    /// Attaches or removes the summer dike of a ZW definition.
    pub fn set_summer_dike(&mut self, dike: Option<SummerDike>) -> CrossSectionResult<()> {
        self.zw_mut()?.set_summer_dike(dike);
        Ok(())
    }

    /// Marks a ZW definition as closed.
    pub fn set_closed(&mut self, closed: bool) -> CrossSectionResult<()> {
        self.zw_mut()?.set_closed(closed);
        Ok(())
    }

    /// Replaces the shape of a standard definition.
    pub fn set_shape(&mut self, shape: StandardShape) -> CrossSectionResult<()> {
        if !matches!(self.kind, DefinitionKind::Standard(_)) {
            return Err(CrossSectionError::invalid_operation(format!(
                "{} definitions have no shape",
                self.kind.label()
            )));
        }
        shape.validate()?;
        let mut edit = self.begin_edit("Shape changed");
        match &mut edit.kind {
            DefinitionKind::Standard(p) => p.set_shape(shape),
            _ => Ok(()),
        }
    }

    /// Replaces the geometry of a geometry-based definition and reconciles
    /// its table.
    pub fn set_geometry(&mut self, geometry: LineString) -> CrossSectionResult<GeometryEdit> {
        if !matches!(self.kind, DefinitionKind::Xyz(_)) {
            return Err(CrossSectionError::invalid_operation(format!(
                "the geometry of {} definitions is derived",
                self.kind.label()
            )));
        }
        let mut edit = self.begin_edit("Geometry changed");
        match &mut edit.kind {
            DefinitionKind::Xyz(p) => Ok(p.set_geometry(geometry)),
            _ => Ok(GeometryEdit::Unchanged),
        }
    }

    // =========================================================================
    // SECTIONS
    // =========================================================================

    /// Appends a band of `desired_width`; rejected bands are logged and
    /// return `None`.
    pub fn add_section(&mut self, kind: SectionKind, desired_width: f64) -> Option<usize> {
        let factor = self.kind.source().section_width_factor();
        self.sections.add(kind, desired_width, factor)
    }

    /// Appends a band without checks.
    pub fn push_section(&mut self, band: SectionBand) {
        self.sections.push(band);
    }

    /// Removes the band at `index`.
    pub fn remove_section(&mut self, index: usize) -> CrossSectionResult<SectionBand> {
        let len = self.sections.len();
        self.sections
            .remove(index)
            .ok_or_else(|| CrossSectionError::out_of_range(index, len))
    }

    /// Removes every band.
    pub fn clear_sections(&mut self) {
        self.sections.clear();
    }

    /// Index of the first band of the named kind.
    pub fn section_index(&self, kind_name: &str) -> Option<usize> {
        self.sections.index_of(kind_name)
    }

    /// Sets `min_y` of a band and cascades it to the left neighbours.
    pub fn set_section_min_y(&mut self, index: usize, value: f64) -> CrossSectionResult<()> {
        self.set_section_boundary(index, Boundary::Min, value)
    }

    /// Sets `max_y` of a band and cascades it to the right neighbours.
    pub fn set_section_max_y(&mut self, index: usize, value: f64) -> CrossSectionResult<()> {
        self.set_section_boundary(index, Boundary::Max, value)
    }

    fn set_section_boundary(&mut self, index: usize, boundary: Boundary, value: f64) -> CrossSectionResult<()> {
        if !self.sections.set_boundary(index, boundary, value) {
            return Err(CrossSectionError::out_of_range(index, self.sections.len()));
        }
        self.fix_min_max_of_sections();
        Ok(())
    }

    /// Clamps the bands into the section domain; no-op unless
    /// `force_sections_span_full_width` is set.
    pub fn fix_min_max_of_sections(&mut self) {
        if !self.force_sections_span_full_width {
            return;
        }
        let (min, max) = self.sections_domain();
        self.sections.fix_min_max(min, max);
    }

    /// Redistributes a changed profile width over the bands, anchored on the
    /// main section. Returns true when the bands changed.
    pub fn adjust_section_widths(&mut self) -> bool {
        let (min, max) = self.sections_domain();
        let factor = self.kind.source().section_width_factor();
        self.sections.adjust_widths(
            min,
            max,
            factor,
            &self.main_section_name,
            self.config.width_tolerance,
        )
    }
}

impl Transactional for CrossSectionDefinition {
    fn edit_session(&mut self) -> &mut EditSession {
        &mut self.session
    }

    fn finish_edit(&mut self, outcome: EditOutcome) {
        self.kind.resume_constraints();
        if outcome == EditOutcome::Commit {
            self.clamp_thalweg();
            if self.force_sections_span_full_width {
                self.adjust_section_widths();
                self.fix_min_max_of_sections();
            }
        }
        self.revision = next_revision();
    }
}

impl ProfileView for CrossSectionDefinition {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn profile(&self) -> Vec<DVec2> {
        self.kind.source().profile()
    }

    fn flow_profile(&self) -> Vec<DVec2> {
        self.kind.source().flow_profile()
    }

    fn thalweg(&self) -> f64 {
        self.thalweg
    }

    fn sections(&self) -> Vec<SectionBand> {
        self.sections.bands().to_vec()
    }

    fn section_width_factor(&self) -> f64 {
        self.kind.source().section_width_factor()
    }

    fn summer_dike(&self) -> Option<SummerDike> {
        match &self.kind {
            DefinitionKind::Zw(p) => p.summer_dike().copied(),
            _ => None,
        }
    }

    fn is_geometry_based(&self) -> bool {
        self.kind.source().is_geometry_based()
    }

    fn force_sections_span_full_width(&self) -> bool {
        self.force_sections_span_full_width
    }
}
