//! # Hydro Cross Sections
//!
//! Cross-section definitions and profile derivation for 1D hydraulic
//! networks (rivers, canals, sewer pipes).
//!
//! ## Architecture
//!
//! ```text
//! table ──► definition (YZ | ZW | Standard | XYZ) ──► proxy ──► cross_section
//!               │            │                                     │
//!             edit        sections                             projector
//! ```
//!
//! - [`table`]: typed rows with per-cell validation
//! - [`definition`]: the four profile representations behind one definition
//! - [`sections`]: roughness bands over the profile width
//! - [`edit`]: nested edit sessions with repair on the outermost close
//! - [`proxy`]: shared definitions read with a per-instance level shift
//! - [`projector`]: cached perpendicular-cut geometry
//! - [`cross_section`]: a definition placed on a branch
//!
//! Profile points are `glam::DVec2` with `x` the lateral offset and `y` the
//! elevation.
//!
//! ## Usage
//!
//! ```rust
//! use hydro_xsection::{CrossSectionDefinition, ProfileView, SectionKind};
//!
//! let mut definition = CrossSectionDefinition::from_yz_points(
//!     "river",
//!     &[(0.0, 5.0), (4.0, 0.0), (10.0, 5.0)],
//! );
//! definition.add_section(SectionKind::new("Main"), 10.0);
//!
//! assert_eq!(definition.width(), 10.0);
//! assert_eq!(definition.lowest_point(), 0.0);
//! assert_eq!(definition.section_width("Main"), 10.0);
//! ```

pub mod cross_section;
pub mod definition;
pub mod edit;
pub mod error;
pub mod geometry;
pub mod profile;
pub mod projector;
pub mod proxy;
pub mod sections;
pub mod summer_dike;
pub mod table;

pub use cross_section::{CrossSection, DefinitionHandle};
pub use definition::{
    CrossSectionDefinition, DefinitionKind, GeometryEdit, ProfileSource, StandardShape,
};
pub use edit::{EditGuard, EditState};
pub use error::{CrossSectionError, CrossSectionResult};
pub use geometry::{BranchId, GeometryProjection, LineString, NetworkProvider, PlanarProjection};
pub use profile::ProfileView;
pub use projector::GeometryProjector;
pub use proxy::{DefinitionProxy, SharedDefinition};
pub use sections::{SectionBand, SectionKind};
pub use summer_dike::SummerDike;
pub use table::{XyzRow, YzRow, ZwRow};
