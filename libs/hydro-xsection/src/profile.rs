//! # Profile Read Access
//!
//! [`ProfileView`] is the read-only surface shared by owned definitions,
//! proxies and cross sections. Derived quantities (width, embankments, ...)
//! are computed from [`ProfileView::profile`] on every call and are never
//! stored.
//!
//! Profile points are `DVec2` with `x` the lateral offset and `y` the
//! elevation.

use crate::sections::SectionBand;
use crate::summer_dike::SummerDike;
use glam::DVec2;

/// Lateral extent `(min offset, max offset)` of a profile.
pub fn lateral_extent(profile: &[DVec2]) -> Option<(f64, f64)> {
    profile.iter().fold(None, |extent, p| match extent {
        None => Some((p.x, p.x)),
        Some((min, max)) => Some((min.min(p.x), max.max(p.x))),
    })
}

/// Elevation range `(lowest, highest)` of a profile.
pub fn elevation_range(profile: &[DVec2]) -> Option<(f64, f64)> {
    profile.iter().fold(None, |range, p| match range {
        None => Some((p.y, p.y)),
        Some((low, high)) => Some((low.min(p.y), high.max(p.y))),
    })
}

/// Returns the profile sorted by offset; equal offsets keep their order.
pub fn sorted_by_offset(profile: &[DVec2]) -> Vec<DVec2> {
    let mut sorted = profile.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x));
    sorted
}

/// Read access to a cross-section definition.
pub trait ProfileView {
    /// Definition name.
    fn name(&self) -> String;

    /// Free-text description.
    fn description(&self) -> String;

    /// Profile points, recomputed from authoritative storage.
    fn profile(&self) -> Vec<DVec2>;

    /// Profile raised by the storage depth per point.
    fn flow_profile(&self) -> Vec<DVec2>;

    /// Offset where the branch crosses the profile.
    fn thalweg(&self) -> f64;

    /// Roughness bands, left to right.
    fn sections(&self) -> Vec<SectionBand>;

    /// Factor converting band spans into reported widths.
    fn section_width_factor(&self) -> f64;

    /// Summer dike, for definitions that support one.
    fn summer_dike(&self) -> Option<SummerDike>;

    /// True when the profile is projected from a 3D geometry.
    fn is_geometry_based(&self) -> bool;

    /// True when the bands must cover the full profile width.
    fn force_sections_span_full_width(&self) -> bool;

    /// `max(y) - min(y)`, `0.0` for an empty profile.
    fn width(&self) -> f64 {
        lateral_extent(&self.profile()).map_or(0.0, |(min, max)| max - min)
    }

    /// Smallest offset, `0.0` for an empty profile.
    fn left(&self) -> f64 {
        lateral_extent(&self.profile()).map_or(0.0, |(min, _)| min)
    }

    /// Largest offset, `0.0` for an empty profile.
    fn right(&self) -> f64 {
        lateral_extent(&self.profile()).map_or(0.0, |(_, max)| max)
    }

    /// Lowest elevation, `NaN` for an empty profile.
    fn lowest_point(&self) -> f64 {
        elevation_range(&self.profile()).map_or(f64::NAN, |(low, _)| low)
    }

    /// Highest elevation, `NaN` for an empty profile.
    fn highest_point(&self) -> f64 {
        elevation_range(&self.profile()).map_or(f64::NAN, |(_, high)| high)
    }

    /// Elevation of the leftmost point, `NaN` for an empty profile.
    fn left_embankment(&self) -> f64 {
        sorted_by_offset(&self.profile()).first().map_or(f64::NAN, |p| p.y)
    }

    /// Elevation of the rightmost point, `NaN` for an empty profile.
    fn right_embankment(&self) -> f64 {
        sorted_by_offset(&self.profile()).last().map_or(f64::NAN, |p| p.y)
    }

    /// Width of the first band of the named kind, `0.0` if there is none.
    fn section_width(&self, kind_name: &str) -> f64 {
        self.sections()
            .iter()
            .find(|b| b.kind.is_named(kind_name))
            .map_or(0.0, |b| b.span() * self.section_width_factor())
    }

    /// Sum of all band widths.
    fn sections_total_width(&self) -> f64 {
        let factor = self.section_width_factor();
        self.sections().iter().map(|b| b.span() * factor).sum()
    }
}
