//! # Geometry Projector
//!
//! Derives the plan geometry of a cross section as a perpendicular cut of
//! its branch at its chainage, and memoizes the last result.
//!
//! ## Cache Keys
//!
//! The cache is keyed by everything the geometry depends on:
//!
//! - definition revision (a fresh value on every committed edit)
//! - proxy level shift
//! - chainage
//! - branch
//!
//! so a stale hit is impossible even without explicit invalidation.
//! [`GeometryProjector::invalidate`] is still offered for callers that know
//! the network itself changed.

use crate::cross_section::DefinitionHandle;
use crate::error::{CrossSectionError, CrossSectionResult};
use crate::geometry::{BranchId, GeometryProjection, LineString, NetworkProvider};
use crate::profile::ProfileView;

/// Identity of one computed geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryKey {
    revision: u64,
    level_shift: u64,
    chainage: u64,
    branch: BranchId,
}

impl GeometryKey {
    /// Creates the key for `definition` placed on `branch` at `chainage`.
    pub fn new(definition: &DefinitionHandle, branch: BranchId, chainage: f64) -> Self {
        Self {
            revision: definition.revision(),
            level_shift: definition.level_shift().to_bits(),
            chainage: chainage.to_bits(),
            branch,
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups served from the cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Memoized perpendicular-cut geometry of one cross section.
#[derive(Debug, Clone, Default)]
pub struct GeometryProjector {
    cached: Option<(GeometryKey, LineString)>,
    stats: CacheStats,
}

impl GeometryProjector {
    /// Creates an empty projector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the geometry, computing it when the key changed.
    ///
    /// Geometry-based definitions carry their own line and never consult
    /// the network.
    ///
    /// # Errors
    ///
    /// [`CrossSectionError::MissingBranchGeometry`] when the network has no
    /// line for `branch`.
    pub fn geometry(
        &mut self,
        definition: &DefinitionHandle,
        branch: BranchId,
        chainage: f64,
        network: &dyn NetworkProvider,
        projection: &dyn GeometryProjection,
    ) -> CrossSectionResult<LineString> {
        let key = GeometryKey::new(definition, branch, chainage);
        if let Some((cached_key, geometry)) = &self.cached {
            if *cached_key == key {
                self.stats.hits += 1;
                return Ok(geometry.clone());
            }
        }
        self.stats.misses += 1;

        let geometry = if definition.is_geometry_based() {
            definition.calculate_geometry(projection, &LineString::default(), chainage)
        } else {
            let line = network
                .branch_geometry(branch)
                .ok_or(CrossSectionError::MissingBranchGeometry(branch))?;
            let mapped = network.map_chainage(branch, chainage);
            definition.calculate_geometry(projection, &line, mapped)
        };

        tracing::debug!(
            definition = %definition.name(),
            branch = branch.0,
            chainage,
            points = geometry.len(),
            "recomputed cross-section geometry"
        );
        self.cached = Some((key, geometry.clone()));
        Ok(geometry)
    }

    /// Drops the cached geometry.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// True when a geometry is cached.
    pub fn is_cached(&self) -> bool {
        self.cached.is_some()
    }

    /// Lookup statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::CrossSectionDefinition;
    use crate::geometry::PlanarProjection;
    use glam::DVec3;
    use std::cell::Cell;

    struct StraightNetwork {
        lookups: Cell<usize>,
    }

    impl StraightNetwork {
        fn new() -> Self {
            Self { lookups: Cell::new(0) }
        }
    }

    impl NetworkProvider for StraightNetwork {
        fn branch_geometry(&self, branch: BranchId) -> Option<LineString> {
            self.lookups.set(self.lookups.get() + 1);
            (branch == BranchId(1))
                .then(|| LineString::new(vec![DVec3::ZERO, DVec3::new(100.0, 0.0, 0.0)]))
        }

        fn map_chainage(&self, _branch: BranchId, chainage: f64) -> f64 {
            chainage
        }
    }

    fn local_valley() -> DefinitionHandle {
        DefinitionHandle::Local(CrossSectionDefinition::from_yz_points(
            "valley",
            &[(0.0, 5.0), (10.0, 5.0)],
        ))
    }

    #[test]
    fn test_geometry_is_cached_per_key() {
        let network = StraightNetwork::new();
        let definition = local_valley();
        let mut projector = GeometryProjector::new();

        let first = projector
            .geometry(&definition, BranchId(1), 50.0, &network, &PlanarProjection)
            .unwrap();
        let second = projector
            .geometry(&definition, BranchId(1), 50.0, &network, &PlanarProjection)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(network.lookups.get(), 1);
        assert_eq!(projector.stats().hits, 1);
        assert_eq!(projector.stats().misses, 1);
        assert_eq!(projector.stats().hit_rate(), 0.5);
    }

    #[test]
    fn test_chainage_change_recomputes() {
        let network = StraightNetwork::new();
        let definition = local_valley();
        let mut projector = GeometryProjector::new();

        let at_50 = projector
            .geometry(&definition, BranchId(1), 50.0, &network, &PlanarProjection)
            .unwrap();
        let at_60 = projector
            .geometry(&definition, BranchId(1), 60.0, &network, &PlanarProjection)
            .unwrap();

        assert_ne!(at_50, at_60);
        assert_eq!(network.lookups.get(), 2);
    }

    #[test]
    fn test_committed_edit_recomputes() {
        let network = StraightNetwork::new();
        let mut definition = local_valley();
        let mut projector = GeometryProjector::new();

        projector
            .geometry(&definition, BranchId(1), 50.0, &network, &PlanarProjection)
            .unwrap();
        if let DefinitionHandle::Local(local) = &mut definition {
            local.set_cell_value(1, 0, 20.0).unwrap();
        }
        let geometry = projector
            .geometry(&definition, BranchId(1), 50.0, &network, &PlanarProjection)
            .unwrap();

        assert_eq!(network.lookups.get(), 2);
        assert_eq!(geometry.len(), 2);
    }

    #[test]
    fn test_missing_branch_is_an_error() {
        let network = StraightNetwork::new();
        let mut projector = GeometryProjector::new();

        let err = projector
            .geometry(&local_valley(), BranchId(7), 0.0, &network, &PlanarProjection)
            .unwrap_err();
        assert_eq!(err, CrossSectionError::MissingBranchGeometry(BranchId(7)));
        assert!(!projector.is_cached());
    }

    #[test]
    fn test_geometry_based_definition_skips_network() {
        let network = StraightNetwork::new();
        let line = LineString::new(vec![DVec3::new(0.0, 0.0, 1.0), DVec3::new(4.0, 0.0, 1.0)]);
        let definition = DefinitionHandle::Local(CrossSectionDefinition::xyz("xyz", line.clone()));
        let mut projector = GeometryProjector::new();

        let geometry = projector
            .geometry(&definition, BranchId(7), 0.0, &network, &PlanarProjection)
            .unwrap();
        assert_eq!(geometry, line);
        assert_eq!(network.lookups.get(), 0);
    }

    #[test]
    fn test_invalidate() {
        let network = StraightNetwork::new();
        let definition = local_valley();
        let mut projector = GeometryProjector::new();

        projector
            .geometry(&definition, BranchId(1), 50.0, &network, &PlanarProjection)
            .unwrap();
        assert!(projector.is_cached());
        projector.invalidate();
        assert!(!projector.is_cached());
        projector
            .geometry(&definition, BranchId(1), 50.0, &network, &PlanarProjection)
            .unwrap();
        assert_eq!(network.lookups.get(), 2);
    }
}
