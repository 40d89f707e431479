//! # Standard Shapes
//!
//! Parametric profiles (rectangle, circle, egg, ...). Every shape is
//! tabulated as `(z, width)` levels with its bottom at `z = 0` and mirrored
//! into a profile centered on `y = 0`.
//!
//! | Shape | Parameters | Height |
//! |-------|------------|--------|
//! | Rectangle | width, height | height |
//! | Circle | diameter | diameter |
//! | Egg | width | 1.5 x width |
//! | Elliptical | width, height | height |
//! | Arch | width, height, arc height | height |
//! | Trapezium | slope, bottom width, max flow width | (max - bottom) / (2 x slope) |

use super::zw::{ends_in_apex, mirror_levels};
use super::ProfileSource;
use crate::error::{CrossSectionError, CrossSectionResult};
use config::constants::DEFAULT_SHAPE_SEGMENTS;
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

/// Parametric profile shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StandardShape {
    /// Rectangular channel or box culvert.
    Rectangle {
        /// Width
        width: f64,
        /// Height
        height: f64,
        /// Closed at the top
        closed: bool,
    },
    /// Circular pipe.
    Circle {
        /// Diameter
        diameter: f64,
    },
    /// Egg-shaped sewer: half-circle roof over a half-ellipse invert.
    Egg {
        /// Largest width
        width: f64,
    },
    /// Elliptical pipe.
    Elliptical {
        /// Horizontal axis
        width: f64,
        /// Vertical axis
        height: f64,
    },
    /// Vertical walls with an elliptical roof.
    Arch {
        /// Width
        width: f64,
        /// Total height
        height: f64,
        /// Height of the roof part
        arc_height: f64,
    },
    /// Open trapezoidal channel.
    Trapezium {
        /// Horizontal run per unit rise of the banks
        slope: f64,
        /// Bed width
        bottom_width: f64,
        /// Width at the top of the banks
        max_flow_width: f64,
    },
}

fn require_positive(name: &str, value: f64) -> CrossSectionResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(CrossSectionError::InvalidShape(format!("{name} must be positive: {value}")))
    }
}

/// Levels of a quarter ellipse from its equator (`base`, full `width`) up to
/// its apex at `base + rise`. The apex width is exactly zero.
fn quarter_ellipse(base: f64, rise: f64, width: f64, segments: u32) -> impl Iterator<Item = (f64, f64)> {
    (0..=segments).map(move |i| {
        let angle = FRAC_PI_2 * f64::from(i) / f64::from(segments);
        let w = if i == segments { 0.0 } else { width * angle.cos() };
        (base + rise * angle.sin(), w)
    })
}

impl StandardShape {
    /// Checks the shape dimensions.
    pub fn validate(&self) -> CrossSectionResult<()> {
        match *self {
            Self::Rectangle { width, height, .. } => {
                require_positive("width", width)?;
                require_positive("height", height)
            }
            Self::Circle { diameter } => require_positive("diameter", diameter),
            Self::Egg { width } => require_positive("width", width),
            Self::Elliptical { width, height } => {
                require_positive("width", width)?;
                require_positive("height", height)
            }
            Self::Arch {
                width,
                height,
                arc_height,
            } => {
                require_positive("width", width)?;
                require_positive("height", height)?;
                require_positive("arc height", arc_height)?;
                if arc_height > height {
                    return Err(CrossSectionError::InvalidShape(format!(
                        "arc height {arc_height} exceeds height {height}"
                    )));
                }
                Ok(())
            }
            Self::Trapezium {
                slope,
                bottom_width,
                max_flow_width,
            } => {
                require_positive("slope", slope)?;
                require_positive("bottom width", bottom_width)?;
                if max_flow_width < bottom_width || !max_flow_width.is_finite() {
                    return Err(CrossSectionError::InvalidShape(format!(
                        "max flow width {max_flow_width} is smaller than bottom width {bottom_width}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// True for shapes closed at the top.
    pub fn is_closed(&self) -> bool {
        match self {
            Self::Rectangle { closed, .. } => *closed,
            Self::Trapezium { .. } => false,
            _ => true,
        }
    }

    /// Total height of the shape.
    pub fn height(&self) -> f64 {
        match *self {
            Self::Rectangle { height, .. } | Self::Elliptical { height, .. } | Self::Arch { height, .. } => height,
            Self::Circle { diameter } => diameter,
            Self::Egg { width } => 1.5 * width,
            Self::Trapezium {
                slope,
                bottom_width,
                max_flow_width,
            } => (max_flow_width - bottom_width) / (2.0 * slope),
        }
    }

    /// Tabulates the shape as `(z, width)` levels, bottom at `z = 0`.
    ///
    /// Curved parts use `segments` steps per half turn.
    pub fn levels(&self, segments: u32) -> Vec<(f64, f64)> {
        let segments = segments.max(2);
        match *self {
            Self::Rectangle { width, height, .. } => vec![(0.0, width), (height, width)],
            Self::Circle { diameter } => half_turn(diameter, diameter, segments),
            Self::Elliptical { width, height } => half_turn(width, height, segments),
            Self::Egg { width } => {
                let quarter = (segments / 2).max(1);
                // Invert: lower half of an ellipse with vertical semi-axis `width`.
                let mut levels: Vec<(f64, f64)> = quarter_ellipse(width, -width, width, quarter).collect();
                levels.reverse();
                levels.extend(quarter_ellipse(width, width / 2.0, width, quarter).skip(1));
                levels
            }
            Self::Arch {
                width,
                height,
                arc_height,
            } => {
                let spring = height - arc_height;
                let mut levels = Vec::new();
                if spring > 0.0 {
                    levels.push((0.0, width));
                }
                levels.extend(quarter_ellipse(spring, arc_height, width, (segments / 2).max(1)));
                levels
            }
            Self::Trapezium {
                bottom_width,
                max_flow_width,
                ..
            } => vec![(0.0, bottom_width), (self.height(), max_flow_width)],
        }
    }

    /// Canonical profile of the shape, centered on `y = 0`.
    pub fn canonical_profile(&self, segments: u32) -> Vec<DVec2> {
        let levels = self.levels(segments);
        mirror_levels(&levels, ends_in_apex(&levels))
    }
}

/// Levels of a full ellipse `width x height` standing on `z = 0`.
fn half_turn(width: f64, height: f64, segments: u32) -> Vec<(f64, f64)> {
    let radius = height / 2.0;
    (0..=segments)
        .map(|i| {
            let angle = PI * f64::from(i) / f64::from(segments);
            let w = if i == 0 || i == segments {
                0.0
            } else {
                width * angle.sin()
            };
            (radius - radius * angle.cos(), w)
        })
        .collect()
}

/// Standard shape placed at a level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardProfile {
    shape: StandardShape,
    level_shift: f64,
    segments: u32,
}

impl StandardProfile {
    /// Creates a profile with its bottom at `z = 0`.
    pub fn new(shape: StandardShape) -> CrossSectionResult<Self> {
        shape.validate()?;
        Ok(Self {
            shape,
            level_shift: 0.0,
            segments: DEFAULT_SHAPE_SEGMENTS,
        })
    }

    /// The shape.
    pub fn shape(&self) -> &StandardShape {
        &self.shape
    }

    /// Elevation of the shape bottom.
    pub fn level_shift(&self) -> f64 {
        self.level_shift
    }

    pub(crate) fn set_shape(&mut self, shape: StandardShape) -> CrossSectionResult<()> {
        shape.validate()?;
        self.shape = shape;
        Ok(())
    }

    pub(crate) fn set_segments(&mut self, segments: u32) {
        self.segments = segments;
    }
}

impl ProfileSource for StandardProfile {
    fn profile(&self) -> Vec<DVec2> {
        self.shape
            .canonical_profile(self.segments)
            .into_iter()
            .map(|p| DVec2::new(p.x, p.y + self.level_shift))
            .collect()
    }

    fn flow_profile(&self) -> Vec<DVec2> {
        self.profile()
    }

    fn shift_level(&mut self, delta: f64) -> CrossSectionResult<()> {
        self.level_shift += delta;
        Ok(())
    }

    fn sections_domain(&self) -> (f64, f64) {
        let width = crate::profile::lateral_extent(&self.profile()).map_or(0.0, |(min, max)| max - min);
        (-width / 2.0, width / 2.0)
    }
}
