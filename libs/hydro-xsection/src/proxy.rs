//! # Shared Definitions
//!
//! A [`DefinitionProxy`] lets many cross sections read one definition, each
//! with its own additive level shift. The proxy never owns profile data:
//! reads go through to the shared definition with the shift applied to
//! every elevation, and the only mutation it allows is changing its own
//! shift.

use crate::definition::CrossSectionDefinition;
use crate::error::{CrossSectionError, CrossSectionResult};
use crate::geometry::{GeometryProjection, LineString};
use crate::profile::ProfileView;
use crate::sections::SectionBand;
use crate::summer_dike::SummerDike;
use glam::{DVec2, DVec3};
use std::cell::RefCell;
use std::rc::Rc;

/// Definition shared between cross sections.
pub type SharedDefinition = Rc<RefCell<CrossSectionDefinition>>;

/// Read-through view of a shared definition with a level shift.
#[derive(Debug, Clone)]
pub struct DefinitionProxy {
    inner: SharedDefinition,
    level_shift: f64,
}

impl DefinitionProxy {
    /// Wraps `inner` with an additive level shift.
    pub fn new(inner: SharedDefinition, level_shift: f64) -> Self {
        Self { inner, level_shift }
    }

    /// The shared definition.
    pub fn inner(&self) -> &SharedDefinition {
        &self.inner
    }

    /// Level shift applied to every elevation.
    pub fn level_shift(&self) -> f64 {
        self.level_shift
    }

    /// Raises the view by `delta`; the shared definition is untouched.
    pub fn shift_level(&mut self, delta: f64) -> CrossSectionResult<()> {
        if !delta.is_finite() {
            return Err(CrossSectionError::invalid_operation(format!(
                "level shift must be finite: {delta}"
            )));
        }
        self.level_shift += delta;
        Ok(())
    }

    /// Proxies can not be renamed.
    pub fn set_name(&mut self, _name: impl Into<String>) -> CrossSectionResult<()> {
        Err(read_only("name"))
    }

    /// Proxies can not change the description.
    pub fn set_description(&mut self, _description: impl Into<String>) -> CrossSectionResult<()> {
        Err(read_only("description"))
    }

    /// Proxies can not move the thalweg.
    pub fn set_thalweg(&mut self, _thalweg: f64) -> CrossSectionResult<()> {
        Err(read_only("thalweg"))
    }

    /// Revision of the shared definition.
    pub fn revision(&self) -> u64 {
        self.inner.borrow().revision()
    }

    /// Plan geometry; XYZ geometry is raised by the level shift.
    pub fn calculate_geometry(
        &self,
        projection: &dyn GeometryProjection,
        branch: &LineString,
        chainage: f64,
    ) -> LineString {
        let inner = self.inner.borrow();
        let geometry = inner.calculate_geometry(projection, branch, chainage);
        if inner.is_geometry_based() {
            geometry.translated(DVec3::new(0.0, 0.0, self.level_shift))
        } else {
            geometry
        }
    }

    fn shifted(&self, points: Vec<DVec2>) -> Vec<DVec2> {
        points
            .into_iter()
            .map(|p| DVec2::new(p.x, p.y + self.level_shift))
            .collect()
    }
}

fn read_only(property: &str) -> CrossSectionError {
    CrossSectionError::invalid_operation(format!(
        "{property} of a shared definition can not be changed through a proxy"
    ))
}

impl ProfileView for DefinitionProxy {
    fn name(&self) -> String {
        self.inner.borrow().name()
    }

    fn description(&self) -> String {
        self.inner.borrow().description()
    }

    fn profile(&self) -> Vec<DVec2> {
        let profile = self.inner.borrow().profile();
        self.shifted(profile)
    }

    fn flow_profile(&self) -> Vec<DVec2> {
        let profile = self.inner.borrow().flow_profile();
        self.shifted(profile)
    }

    fn thalweg(&self) -> f64 {
        self.inner.borrow().thalweg()
    }

    fn sections(&self) -> Vec<SectionBand> {
        self.inner.borrow().sections()
    }

    fn section_width_factor(&self) -> f64 {
        self.inner.borrow().section_width_factor()
    }

    fn summer_dike(&self) -> Option<SummerDike> {
        self.inner
            .borrow()
            .summer_dike()
            .map(|dike| dike.shifted(self.level_shift))
    }

    fn is_geometry_based(&self) -> bool {
        self.inner.borrow().is_geometry_based()
    }

    fn force_sections_span_full_width(&self) -> bool {
        self.inner.borrow().force_sections_span_full_width()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PlanarProjection;
    use crate::table::ZwRow;

    fn shared_valley() -> SharedDefinition {
        Rc::new(RefCell::new(CrossSectionDefinition::from_yz_points(
            "valley",
            &[(0.0, 5.0), (5.0, 0.0), (10.0, 5.0)],
        )))
    }

    #[test]
    fn test_reads_apply_level_shift() {
        let inner = shared_valley();
        let proxy = DefinitionProxy::new(Rc::clone(&inner), 2.0);
        let definition = inner.borrow();

        assert_eq!(proxy.name(), "valley");
        assert_eq!(proxy.width(), definition.width());
        assert_eq!(proxy.thalweg(), definition.thalweg());
        assert_eq!(proxy.lowest_point(), definition.lowest_point() + 2.0);
        assert_eq!(proxy.highest_point(), definition.highest_point() + 2.0);
        assert_eq!(proxy.left_embankment(), definition.left_embankment() + 2.0);
        assert_eq!(proxy.right_embankment(), definition.right_embankment() + 2.0);
        assert_eq!(proxy.profile()[1], DVec2::new(5.0, 2.0));
        assert_eq!(proxy.flow_profile()[1], DVec2::new(5.0, 2.0));
    }

    #[test]
    fn test_mutations_fail() {
        let inner = shared_valley();
        let mut proxy = DefinitionProxy::new(Rc::clone(&inner), 0.0);

        assert!(matches!(proxy.set_name("other"), Err(CrossSectionError::InvalidOperation(_))));
        assert!(proxy.set_description("text").is_err());
        assert!(proxy.set_thalweg(1.0).is_err());
        assert_eq!(inner.borrow().name(), "valley");
    }

    #[test]
    fn test_shift_level_only_moves_proxy() {
        let inner = shared_valley();
        let mut proxy = DefinitionProxy::new(Rc::clone(&inner), 1.0);
        proxy.shift_level(0.5).unwrap();

        assert_eq!(proxy.level_shift(), 1.5);
        assert_eq!(proxy.lowest_point(), 1.5);
        assert_eq!(inner.borrow().lowest_point(), 0.0);
        assert!(proxy.shift_level(f64::NAN).is_err());
    }

    #[test]
    fn test_edits_to_shared_definition_are_visible() {
        let inner = shared_valley();
        let a = DefinitionProxy::new(Rc::clone(&inner), 0.0);
        let b = DefinitionProxy::new(Rc::clone(&inner), 10.0);

        inner.borrow_mut().set_cell_value(1, 1, -1.0).unwrap();

        assert_eq!(a.lowest_point(), -1.0);
        assert_eq!(b.lowest_point(), 9.0);
        assert_eq!(a.revision(), b.revision());
    }

    #[test]
    fn test_dropping_proxy_keeps_definition() {
        let inner = shared_valley();
        let proxy = DefinitionProxy::new(Rc::clone(&inner), 0.0);
        assert_eq!(Rc::strong_count(&inner), 2);
        drop(proxy);
        assert_eq!(Rc::strong_count(&inner), 1);
        assert_eq!(inner.borrow().width(), 10.0);
    }

    #[test]
    fn test_summer_dike_is_shifted() {
        let mut definition =
            CrossSectionDefinition::from_zw_rows("zw", &[ZwRow::new(0.0, 10.0, 0.0)]).unwrap();
        definition
            .set_summer_dike(Some(SummerDike::new(4.0, 2.0, 100.0, 150.0)))
            .unwrap();
        let proxy = DefinitionProxy::new(Rc::new(RefCell::new(definition)), 3.0);

        let dike = proxy.summer_dike().unwrap();
        assert_eq!(dike.crest_level, 7.0);
        assert_eq!(dike.floodplain_level, 5.0);
        assert_eq!(proxy.section_width_factor(), 2.0);
    }

    #[test]
    fn test_xyz_geometry_is_raised() {
        let line = LineString::new(vec![DVec3::new(0.0, 0.0, 1.0), DVec3::new(4.0, 0.0, 1.0)]);
        let inner = Rc::new(RefCell::new(CrossSectionDefinition::xyz("xyz", line)));
        let proxy = DefinitionProxy::new(inner, 2.0);

        let branch = LineString::new(vec![DVec3::ZERO, DVec3::new(10.0, 0.0, 0.0)]);
        let geometry = proxy.calculate_geometry(&PlanarProjection, &branch, 5.0);
        assert_eq!(geometry.point(0), Some(DVec3::new(0.0, 0.0, 3.0)));
        assert!(proxy.is_geometry_based());
    }
}
