//! # Roughness Section Bands
//!
//! Ordered, named bands partitioning the width of a profile into roughness
//! zones ("Main", "FloodPlain1", ...).
//!
//! The band list is owned by a definition; this module holds the band
//! algorithms, parameterized by the owner's width domain and width factor:
//!
//! - **Boundary cascade**: moving one band boundary drags the adjacent
//!   boundary (and zero-width bands sitting on it) along
//! - **Bounds repair**: clamp bands into the domain, pin the outer ends
//! - **Width redistribution**: absorb a changed profile width in the bands
//!   between the main band and the domain edges

use serde::{Deserialize, Serialize};

/// Named, reusable roughness-zone classifier.
///
/// Identity is the name, compared case-insensitively.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct SectionKind {
    name: String,
}

impl SectionKind {
    /// Creates a kind.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-insensitive name match.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl PartialEq for SectionKind {
    fn eq(&self, other: &Self) -> bool {
        self.is_named(&other.name)
    }
}

/// One band `[min_y, max_y]` of the profile width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionBand {
    /// Left boundary
    pub min_y: f64,
    /// Right boundary
    pub max_y: f64,
    /// Roughness zone of this band
    pub kind: SectionKind,
    /// Marks the band created for the default channel
    pub is_default_channel_section: bool,
}

impl SectionBand {
    /// Creates a band.
    pub fn new(kind: SectionKind, min_y: f64, max_y: f64) -> Self {
        Self {
            min_y,
            max_y,
            kind,
            is_default_channel_section: false,
        }
    }

    /// Raw width `max_y - min_y`, without width factor.
    #[inline]
    pub fn span(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Which boundary of a band was set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// `min_y`
    Min,
    /// `max_y`
    Max,
}

/// Ordered band collection; insertion order is the left-to-right order.
///
/// # Example
///
/// ```rust
/// use hydro_xsection::sections::{SectionBands, SectionKind};
///
/// let mut bands = SectionBands::new();
/// bands.add(SectionKind::new("Main"), 10.0, 1.0);
/// bands.add(SectionKind::new("FloodPlain1"), 4.0, 1.0);
/// assert_eq!(bands.total_width(1.0), 14.0);
/// assert_eq!(bands.width_of("floodplain1", 1.0), 4.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionBands {
    bands: Vec<SectionBand>,
}

impl SectionBands {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bands in left-to-right order.
    #[inline]
    pub fn bands(&self) -> &[SectionBand] {
        &self.bands
    }

    /// Number of bands.
    #[inline]
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    /// Returns true if there are no bands.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Index of the first band of the named kind.
    pub fn index_of(&self, kind_name: &str) -> Option<usize> {
        self.bands.iter().position(|b| b.kind.is_named(kind_name))
    }

    /// Appends a band of `desired_width` right of the existing bands.
    ///
    /// Rejected (logged, nothing added) for a negative width or a kind that
    /// is already present. Returns the index of the new band.
    pub fn add(&mut self, kind: SectionKind, desired_width: f64, width_factor: f64) -> Option<usize> {
        if desired_width < 0.0 {
            tracing::warn!(
                section = kind.name(),
                width = desired_width,
                "section not added: width can not be negative"
            );
            return None;
        }
        if self.bands.iter().any(|b| b.kind == kind) {
            tracing::warn!(section = kind.name(), "section not added: type already in use");
            return None;
        }

        let min_y = self
            .bands
            .iter()
            .map(|b| b.max_y)
            .reduce(f64::max)
            .unwrap_or(0.0);
        let max_y = min_y + desired_width / width_factor;
        self.bands.push(SectionBand::new(kind, min_y, max_y));
        Some(self.bands.len() - 1)
    }

    /// Appends a band as given, without any checks.
    pub fn push(&mut self, band: SectionBand) {
        self.bands.push(band);
    }

    /// Removes the band at `index`.
    pub fn remove(&mut self, index: usize) -> Option<SectionBand> {
        (index < self.bands.len()).then(|| self.bands.remove(index))
    }

    /// Removes all bands.
    pub fn clear(&mut self) {
        self.bands.clear();
    }

    /// Sets one boundary of band `index` and cascades it to the neighbours.
    ///
    /// The cascade writes the neighbour fields directly, so it can not
    /// trigger itself again.
    pub fn set_boundary(&mut self, index: usize, boundary: Boundary, value: f64) -> bool {
        let Some(band) = self.bands.get_mut(index) else {
            return false;
        };
        match boundary {
            Boundary::Min => {
                band.min_y = value;
                self.cascade_left(index, value);
            }
            Boundary::Max => {
                band.max_y = value;
                self.cascade_right(index, value);
            }
        }
        true
    }

    /// Moves the boundary left of band `index` to `value`.
    fn cascade_left(&mut self, index: usize, value: f64) {
        if index == 0 {
            return;
        }
        let mut j = index - 1;
        let old = self.bands[j].max_y;
        self.bands[j].max_y = value;

        // Zero-width bands on the old boundary travel with it.
        while j > 0 && self.bands[j].min_y == old && self.bands[j - 1].max_y == old {
            self.bands[j].min_y = value;
            j -= 1;
            self.bands[j].max_y = value;
        }
    }

    /// Moves the boundary right of band `index` to `value`.
    fn cascade_right(&mut self, index: usize, value: f64) {
        let count = self.bands.len();
        if index + 1 >= count {
            return;
        }
        let mut j = index + 1;
        let old = self.bands[j].min_y;
        self.bands[j].min_y = value;

        while j + 1 < count && self.bands[j].max_y == old && self.bands[j + 1].min_y == old {
            self.bands[j].max_y = value;
            j += 1;
            self.bands[j].min_y = value;
        }
    }

    /// Clamps every band into `[domain_min, domain_max]`.
    ///
    /// The first band always starts at `domain_min` and the last band always
    /// ends at `domain_max`. A band left with `min_y > max_y` collapses to
    /// zero width at its `max_y`.
    pub fn fix_min_max(&mut self, domain_min: f64, domain_max: f64) {
        let last = self.bands.len().saturating_sub(1);
        for (index, band) in self.bands.iter_mut().enumerate() {
            if band.min_y < domain_min || index == 0 {
                band.min_y = domain_min;
            }
            if band.max_y > domain_max || index == last {
                band.max_y = domain_max;
            }
            if band.min_y > band.max_y {
                band.min_y = band.max_y;
            }
        }
    }

    /// Redistributes a changed profile width over the bands.
    ///
    /// The anchor band (kind named `main_section_name`, or the first band)
    /// keeps its position; the bands towards each domain edge are re-chained
    /// from that edge. Returns true when anything changed.
    pub fn adjust_widths(
        &mut self,
        domain_min: f64,
        domain_max: f64,
        width_factor: f64,
        main_section_name: &str,
        tolerance: f64,
    ) -> bool {
        if self.bands.is_empty() {
            return false;
        }
        let profile_width = (domain_max - domain_min) * width_factor;
        if (profile_width - self.total_width(width_factor)).abs() <= tolerance {
            return false;
        }

        let anchor = self.index_of(main_section_name).unwrap_or(0);
        let old_width = self.bands[anchor].span() * width_factor;

        let mut edge = domain_min;
        for band in &mut self.bands[..=anchor] {
            band.min_y = edge;
            edge = band.max_y;
        }

        let mut edge = domain_max;
        for band in self.bands[anchor..].iter_mut().rev() {
            band.max_y = edge;
            edge = band.min_y;
        }

        let anchor_band = &self.bands[anchor];
        tracing::info!(
            section = anchor_band.kind.name(),
            old_width,
            new_width = anchor_band.span() * width_factor,
            "adjusted section widths to profile width {profile_width}"
        );
        true
    }

    /// Width of the first band of the named kind, or `0.0`.
    pub fn width_of(&self, kind_name: &str, width_factor: f64) -> f64 {
        self.index_of(kind_name)
            .map_or(0.0, |index| self.bands[index].span() * width_factor)
    }

    /// Sum of all band widths.
    pub fn total_width(&self, width_factor: f64) -> f64 {
        self.bands.iter().map(|b| b.span() * width_factor).sum()
    }
}
