//! Centralized configuration values shared across the cross-section crates.
//!
//! Each public item in this module documents its purpose and provides a minimal
//! usage example so that downstream crates can remain declarative and avoid
//! scattering literals.

use std::fmt;

// =============================================================================
// PRECISION CONSTANTS
// =============================================================================

/// Tolerance below which the profile width and the summed section widths are
/// considered equal.
///
/// Width adjustment of the roughness sections only runs when the mismatch
/// exceeds this value.
///
/// # Examples
/// ```
/// use config::constants::WIDTH_TOLERANCE;
/// assert_eq!(WIDTH_TOLERANCE, 1.0e-4);
/// ```
pub const WIDTH_TOLERANCE: f64 = 1.0e-4;

// =============================================================================
// SECTION CONSTANTS
// =============================================================================

/// Width factor of sections on tabulated (ZW) definitions.
///
/// ZW sections span `[0, width / 2]`, a section width is reported as the full
/// width across the symmetry axis.
///
/// # Examples
/// ```
/// use config::constants::ZW_SECTION_WIDTH_FACTOR;
/// let half_width = 5.0;
/// assert_eq!(half_width * ZW_SECTION_WIDTH_FACTOR, 10.0);
/// ```
pub const ZW_SECTION_WIDTH_FACTOR: f64 = 2.0;

/// Width factor of sections on every non-ZW definition.
///
/// # Examples
/// ```
/// use config::constants::DEFAULT_SECTION_WIDTH_FACTOR;
/// assert_eq!(DEFAULT_SECTION_WIDTH_FACTOR, 1.0);
/// ```
pub const DEFAULT_SECTION_WIDTH_FACTOR: f64 = 1.0;

/// Name of the main channel section kind.
///
/// The band carrying this kind anchors section width adjustment. Comparison
/// is case-insensitive.
///
/// # Examples
/// ```
/// use config::constants::MAIN_SECTION_NAME;
/// assert!("main".eq_ignore_ascii_case(MAIN_SECTION_NAME));
/// ```
pub const MAIN_SECTION_NAME: &str = "Main";

// =============================================================================
// SHAPE CONSTANTS
// =============================================================================

/// Number of elevation steps used to tabulate curved standard shapes
/// (circle, egg, ellipse, arch roof).
///
/// # Examples
/// ```
/// use config::constants::DEFAULT_SHAPE_SEGMENTS;
/// assert!(DEFAULT_SHAPE_SEGMENTS >= 2);
/// ```
pub const DEFAULT_SHAPE_SEGMENTS: u32 = 16;

/// Smallest tabulation resolution that still describes a curve.
///
/// # Examples
/// ```
/// use config::constants::MIN_SHAPE_SEGMENTS;
/// assert_eq!(MIN_SHAPE_SEGMENTS, 2);
/// ```
pub const MIN_SHAPE_SEGMENTS: u32 = 2;

/// Immutable snapshot of the numeric settings a cross-section definition
/// works with.
///
/// # Examples
/// ```
/// use config::constants::ProfileConfig;
/// let config = ProfileConfig::default();
/// assert!(config.width_tolerance > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileConfig {
    /// Tolerance used when comparing profile and section widths.
    pub width_tolerance: f64,
    /// Tabulation resolution of curved standard shapes.
    pub shape_segments: u32,
}

impl ProfileConfig {
    /// Builds a configuration enforcing strict validation of the supplied
    /// tolerance and shape resolution.
    ///
    /// # Examples
    /// ```
    /// use config::constants::ProfileConfig;
    /// let cfg = ProfileConfig::new(1.0e-6, 24).expect("valid config");
    /// assert_eq!(cfg.shape_segments, 24);
    /// ```
    pub fn new(width_tolerance: f64, shape_segments: u32) -> Result<Self, ConfigError> {
        if width_tolerance <= 0.0 || width_tolerance.is_nan() {
            return Err(ConfigError::InvalidTolerance(width_tolerance));
        }
        if shape_segments < MIN_SHAPE_SEGMENTS {
            return Err(ConfigError::InvalidSegments(shape_segments));
        }
        Ok(Self {
            width_tolerance,
            shape_segments,
        })
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            width_tolerance: WIDTH_TOLERANCE,
            shape_segments: DEFAULT_SHAPE_SEGMENTS,
        }
    }
}

/// Error returned when invalid configuration values are provided.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Raised when the tolerance is zero, negative or NaN.
    InvalidTolerance(f64),
    /// Raised when the shape resolution is too small to describe a curve.
    InvalidSegments(u32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidTolerance(value) => {
                write!(f, "width tolerance must be positive: {value}")
            }
            ConfigError::InvalidSegments(value) => {
                write!(f, "shape_segments must be >= {MIN_SHAPE_SEGMENTS}: {value}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
