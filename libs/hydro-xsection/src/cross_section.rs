//! # Cross Sections
//!
//! A [`CrossSection`] places a definition on a branch at a chainage. The
//! definition is either owned ("local", editable in place) or a proxy onto
//! a shared definition ("shared", read-only with its own level shift).
//! Switching between the two is always an explicit call:
//!
//! | Call | From | To |
//! |------|------|----|
//! | [`CrossSection::make_definition_local`] | shared | local copy, shift baked in |
//! | [`CrossSection::use_shared_definition`] | any | shared |
//! | [`CrossSection::share_definition_and_change_to_proxy`] | local | shared |

use crate::definition::{CrossSectionDefinition, DefinitionKind};
use crate::error::{CrossSectionError, CrossSectionResult};
use crate::geometry::{BranchId, GeometryProjection, LineString, NetworkProvider};
use crate::profile::ProfileView;
use crate::projector::GeometryProjector;
use crate::proxy::{DefinitionProxy, SharedDefinition};
use crate::sections::SectionBand;
use crate::summer_dike::SummerDike;
use glam::DVec2;
use std::cell::RefCell;
use std::rc::Rc;

/// Definition of a cross section: owned, or shared through a proxy.
#[derive(Debug, Clone)]
pub enum DefinitionHandle {
    /// Owned by the cross section.
    Local(CrossSectionDefinition),
    /// Read through a proxy.
    Shared(DefinitionProxy),
}

impl DefinitionHandle {
    /// Revision of the underlying definition.
    pub fn revision(&self) -> u64 {
        match self {
            Self::Local(definition) => definition.revision(),
            Self::Shared(proxy) => proxy.revision(),
        }
    }

    /// Level shift of the proxy, `0.0` for local definitions.
    pub fn level_shift(&self) -> f64 {
        match self {
            Self::Local(_) => 0.0,
            Self::Shared(proxy) => proxy.level_shift(),
        }
    }

    /// True for proxies.
    pub fn is_shared(&self) -> bool {
        matches!(self, Self::Shared(_))
    }

    /// Plan geometry on `branch` at `chainage`.
    pub fn calculate_geometry(
        &self,
        projection: &dyn GeometryProjection,
        branch: &LineString,
        chainage: f64,
    ) -> LineString {
        match self {
            Self::Local(definition) => definition.calculate_geometry(projection, branch, chainage),
            Self::Shared(proxy) => proxy.calculate_geometry(projection, branch, chainage),
        }
    }

    fn view(&self) -> &dyn ProfileView {
        match self {
            Self::Local(definition) => definition,
            Self::Shared(proxy) => proxy,
        }
    }
}

impl ProfileView for DefinitionHandle {
    fn name(&self) -> String {
        self.view().name()
    }

    fn description(&self) -> String {
        self.view().description()
    }

    fn profile(&self) -> Vec<DVec2> {
        self.view().profile()
    }

    fn flow_profile(&self) -> Vec<DVec2> {
        self.view().flow_profile()
    }

    fn thalweg(&self) -> f64 {
        self.view().thalweg()
    }

    fn sections(&self) -> Vec<SectionBand> {
        self.view().sections()
    }

    fn section_width_factor(&self) -> f64 {
        self.view().section_width_factor()
    }

    fn summer_dike(&self) -> Option<SummerDike> {
        self.view().summer_dike()
    }

    fn is_geometry_based(&self) -> bool {
        self.view().is_geometry_based()
    }

    fn force_sections_span_full_width(&self) -> bool {
        self.view().force_sections_span_full_width()
    }
}

/// A definition placed on a branch.
#[derive(Debug, Clone)]
pub struct CrossSection {
    name: String,
    branch: BranchId,
    chainage: f64,
    definition: DefinitionHandle,
    projector: GeometryProjector,
}

impl CrossSection {
    /// Creates a cross section owning `definition`.
    pub fn new(name: impl Into<String>, branch: BranchId, chainage: f64, definition: CrossSectionDefinition) -> Self {
        Self {
            name: name.into(),
            branch,
            chainage,
            definition: DefinitionHandle::Local(definition),
            projector: GeometryProjector::new(),
        }
    }

    /// Creates a cross section reading a shared definition.
    pub fn shared(
        name: impl Into<String>,
        branch: BranchId,
        chainage: f64,
        inner: SharedDefinition,
        level_shift: f64,
    ) -> Self {
        Self {
            name: name.into(),
            branch,
            chainage,
            definition: DefinitionHandle::Shared(DefinitionProxy::new(inner, level_shift)),
            projector: GeometryProjector::new(),
        }
    }

    /// Cross-section name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Branch the cross section lies on.
    pub fn branch(&self) -> BranchId {
        self.branch
    }

    /// Distance along the branch.
    pub fn chainage(&self) -> f64 {
        self.chainage
    }

    /// The definition, owned or shared.
    pub fn definition(&self) -> &DefinitionHandle {
        &self.definition
    }

    /// True when the definition is shared through a proxy.
    pub fn is_shared(&self) -> bool {
        self.definition.is_shared()
    }

    /// The owned definition.
    ///
    /// # Errors
    ///
    /// [`CrossSectionError::InvalidOperation`] for shared definitions.
    pub fn definition_mut(&mut self) -> CrossSectionResult<&mut CrossSectionDefinition> {
        match &mut self.definition {
            DefinitionHandle::Local(definition) => Ok(definition),
            DefinitionHandle::Shared(_) => Err(CrossSectionError::invalid_operation(
                "a shared definition can not be edited through a cross section",
            )),
        }
    }

    /// Moves the cross section along its branch.
    pub fn set_chainage(&mut self, chainage: f64) {
        self.chainage = chainage;
        self.projector.invalidate();
    }

    /// Moves the cross section to another branch.
    pub fn set_branch(&mut self, branch: BranchId) {
        self.branch = branch;
        self.projector.invalidate();
    }

    /// Shifts the owned definition, or the proxy's own level.
    pub fn shift_level(&mut self, delta: f64) -> CrossSectionResult<()> {
        match &mut self.definition {
            DefinitionHandle::Local(definition) => definition.shift_level(delta),
            DefinitionHandle::Shared(proxy) => proxy.shift_level(delta),
        }
    }

    /// Plan geometry, cached until the definition, chainage or branch
    /// changes.
    pub fn geometry(
        &mut self,
        network: &dyn NetworkProvider,
        projection: &dyn GeometryProjection,
    ) -> CrossSectionResult<LineString> {
        self.projector
            .geometry(&self.definition, self.branch, self.chainage, network, projection)
    }

    /// Sets or clears the geometry.
    ///
    /// `None` only drops the cache. For XYZ definitions the line is the
    /// authoritative input and is reconciled with the table; for the other
    /// kinds the geometry is derived, so only the cache is dropped.
    ///
    /// # Errors
    ///
    /// [`CrossSectionError::InvalidOperation`] when the line would have to
    /// be written into a shared XYZ definition.
    pub fn set_geometry(&mut self, geometry: Option<LineString>) -> CrossSectionResult<()> {
        self.projector.invalidate();
        let Some(geometry) = geometry else {
            return Ok(());
        };
        match &mut self.definition {
            DefinitionHandle::Local(definition) => {
                if matches!(definition.kind(), DefinitionKind::Xyz(_)) {
                    definition.set_geometry(geometry)?;
                }
                Ok(())
            }
            DefinitionHandle::Shared(proxy) if proxy.is_geometry_based() => Err(CrossSectionError::invalid_operation(
                "the geometry of a shared definition can not be set through a proxy",
            )),
            DefinitionHandle::Shared(_) => Ok(()),
        }
    }

    /// True when a geometry is cached.
    pub fn has_cached_geometry(&self) -> bool {
        self.projector.is_cached()
    }

    // =========================================================================
    // MODE SWITCHES
    // =========================================================================

    /// Replaces the proxy with an owned copy of the shared definition, with
    /// the proxy's level shift applied to the copy.
    ///
    /// # Errors
    ///
    /// [`CrossSectionError::InvalidOperation`] when the definition is
    /// already local.
    pub fn make_definition_local(&mut self) -> CrossSectionResult<()> {
        let DefinitionHandle::Shared(proxy) = &self.definition else {
            return Err(CrossSectionError::invalid_operation(format!(
                "definition of cross section {} is already local",
                self.name
            )));
        };

        let level_shift = proxy.level_shift();
        let mut local = proxy.inner().borrow().clone();
        if level_shift != 0.0 {
            local.shift_level(level_shift)?;
        }

        tracing::debug!(cross_section = %self.name, level_shift, "made shared definition local");
        self.definition = DefinitionHandle::Local(local);
        self.projector.invalidate();
        Ok(())
    }

    /// Reads `inner` through a proxy with `level_shift`, dropping any owned
    /// definition.
    pub fn use_shared_definition(&mut self, inner: SharedDefinition, level_shift: f64) -> CrossSectionResult<()> {
        if !level_shift.is_finite() {
            return Err(CrossSectionError::invalid_operation(format!(
                "level shift must be finite: {level_shift}"
            )));
        }
        tracing::debug!(cross_section = %self.name, level_shift, "using shared definition");
        self.definition = DefinitionHandle::Shared(DefinitionProxy::new(inner, level_shift));
        self.projector.invalidate();
        Ok(())
    }

    /// Moves the owned definition into a shared one and reads it through a
    /// proxy with no level shift. Returns the shared definition so other
    /// cross sections can use it.
    ///
    /// # Errors
    ///
    /// [`CrossSectionError::InvalidOperation`] when the definition is
    /// already shared.
    pub fn share_definition_and_change_to_proxy(&mut self) -> CrossSectionResult<SharedDefinition> {
        let DefinitionHandle::Local(definition) = &self.definition else {
            return Err(CrossSectionError::invalid_operation(format!(
                "definition of cross section {} is already shared",
                self.name
            )));
        };

        let shared = Rc::new(RefCell::new(definition.clone()));
        tracing::debug!(cross_section = %self.name, "shared local definition");
        self.definition = DefinitionHandle::Shared(DefinitionProxy::new(Rc::clone(&shared), 0.0));
        self.projector.invalidate();
        Ok(shared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PlanarProjection;
    use glam::DVec3;

    struct Network;

    impl NetworkProvider for Network {
        fn branch_geometry(&self, _branch: BranchId) -> Option<LineString> {
            Some(LineString::new(vec![DVec3::ZERO, DVec3::new(100.0, 0.0, 0.0)]))
        }

        fn map_chainage(&self, _branch: BranchId, chainage: f64) -> f64 {
            chainage
        }
    }

    fn valley() -> CrossSectionDefinition {
        CrossSectionDefinition::from_yz_points("valley", &[(0.0, 5.0), (5.0, 0.0), (10.0, 5.0)])
    }

    fn line() -> LineString {
        LineString::new(vec![
            DVec3::new(0.0, 0.0, 2.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 2.0),
        ])
    }

    #[test]
    fn test_make_local_bakes_in_level_shift() {
        let inner = Rc::new(RefCell::new(valley()));
        let mut section = CrossSection::shared("cs", BranchId(1), 10.0, Rc::clone(&inner), 2.0);

        section.make_definition_local().unwrap();

        assert!(!section.is_shared());
        assert_eq!(section.definition().lowest_point(), 2.0);
        assert_eq!(inner.borrow().lowest_point(), 0.0);

        section.definition_mut().unwrap().set_cell_value(1, 1, -3.0).unwrap();
        assert_eq!(inner.borrow().lowest_point(), 0.0);
    }

    #[test]
    fn test_thalweg_change_refreshes_geometry() {
        let mut section = CrossSection::new("cs", BranchId(1), 50.0, valley());
        let before = section.geometry(&Network, &PlanarProjection).unwrap();

        section.definition_mut().unwrap().set_thalweg(8.0).unwrap();
        let after = section.geometry(&Network, &PlanarProjection).unwrap();

        let branch = Network.branch_geometry(BranchId(1)).unwrap();
        let fresh = section
            .definition()
            .calculate_geometry(&PlanarProjection, &branch, 50.0);
        assert_ne!(after, before);
        assert_eq!(after, fresh);
    }

    #[test]
    fn test_thalweg_change_on_shared_definition_refreshes_geometry() {
        let inner = Rc::new(RefCell::new(valley()));
        let mut section = CrossSection::shared("cs", BranchId(1), 50.0, Rc::clone(&inner), 0.0);
        let before = section.geometry(&Network, &PlanarProjection).unwrap();

        inner.borrow_mut().set_thalweg(8.0).unwrap();
        let after = section.geometry(&Network, &PlanarProjection).unwrap();

        let branch = Network.branch_geometry(BranchId(1)).unwrap();
        let fresh = inner.borrow().calculate_geometry(&PlanarProjection, &branch, 50.0);
        assert_ne!(after, before);
        assert_eq!(after, fresh);
    }

    #[test]
    fn test_make_local_twice_fails() {
        let mut section = CrossSection::new("cs", BranchId(1), 0.0, valley());
        assert!(matches!(
            section.make_definition_local(),
            Err(CrossSectionError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_share_and_reuse() {
        let mut first = CrossSection::new("a", BranchId(1), 0.0, valley());
        let shared = first.share_definition_and_change_to_proxy().unwrap();
        assert!(first.is_shared());
        assert!(first.share_definition_and_change_to_proxy().is_err());
        assert!(first.definition_mut().is_err());

        let mut second = CrossSection::new("b", BranchId(1), 50.0, valley());
        second.use_shared_definition(Rc::clone(&shared), 1.0).unwrap();

        shared.borrow_mut().set_cell_value(1, 1, -1.0).unwrap();
        assert_eq!(first.definition().lowest_point(), -1.0);
        assert_eq!(second.definition().lowest_point(), 0.0);
    }

    #[test]
    fn test_shift_level_on_shared_moves_proxy_only() {
        let inner = Rc::new(RefCell::new(valley()));
        let mut section = CrossSection::shared("cs", BranchId(1), 0.0, Rc::clone(&inner), 0.0);
        section.shift_level(1.5).unwrap();

        assert_eq!(section.definition().level_shift(), 1.5);
        assert_eq!(section.definition().lowest_point(), 1.5);
        assert_eq!(inner.borrow().lowest_point(), 0.0);
    }

    #[test]
    fn test_geometry_cache_follows_chainage() {
        let mut section = CrossSection::new("cs", BranchId(1), 20.0, valley());
        let geometry = section.geometry(&Network, &PlanarProjection).unwrap();
        assert_eq!(geometry.point(0).map(|p| p.x), Some(20.0));
        assert!(section.has_cached_geometry());

        section.set_chainage(30.0);
        assert!(!section.has_cached_geometry());
        let geometry = section.geometry(&Network, &PlanarProjection).unwrap();
        assert_eq!(geometry.point(0).map(|p| p.x), Some(30.0));

        section.set_branch(BranchId(2));
        assert!(!section.has_cached_geometry());
    }

    #[test]
    fn test_set_geometry_is_authoritative_for_xyz_only() {
        let mut xyz = CrossSection::new("xyz", BranchId(1), 0.0, CrossSectionDefinition::xyz("xyz", line()));
        let mut moved = line();
        moved.points_mut()[1] = DVec3::new(1.0, 0.0, -1.0);
        xyz.set_geometry(Some(moved)).unwrap();
        assert_eq!(xyz.definition().lowest_point(), -1.0);

        let mut yz = CrossSection::new("yz", BranchId(1), 0.0, valley());
        yz.geometry(&Network, &PlanarProjection).unwrap();
        yz.set_geometry(Some(line())).unwrap();
        assert!(!yz.has_cached_geometry());
        assert_eq!(yz.definition().lowest_point(), 0.0);

        yz.geometry(&Network, &PlanarProjection).unwrap();
        yz.set_geometry(None).unwrap();
        assert!(!yz.has_cached_geometry());
    }

    #[test]
    fn test_set_geometry_on_shared_xyz_fails() {
        let inner = Rc::new(RefCell::new(CrossSectionDefinition::xyz("xyz", line())));
        let mut section = CrossSection::shared("cs", BranchId(1), 0.0, inner, 0.0);
        assert!(matches!(
            section.set_geometry(Some(line())),
            Err(CrossSectionError::InvalidOperation(_))
        ));
    }
}
