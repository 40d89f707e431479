//! # Config Crate
//!
//! Centralized configuration constants for the cross-section profile engine.
//! Tolerances, width factors and tabulation resolutions are defined here so
//! the geometry crates never carry magic numbers of their own.
//!
//! ## Usage
//!
//! ```rust
//! use config::constants::{WIDTH_TOLERANCE, ZW_SECTION_WIDTH_FACTOR};
//!
//! // Section widths that differ by less than the tolerance are equal.
//! let profile_width: f64 = 12.0;
//! let sections_width: f64 = 12.00001;
//! assert!((profile_width - sections_width).abs() < WIDTH_TOLERANCE);
//!
//! // ZW sections are stored as half widths.
//! assert_eq!(ZW_SECTION_WIDTH_FACTOR, 2.0);
//! ```
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All constants defined once, used everywhere
//! - **Exact Tolerances**: Tolerances are compared as-is, never rescaled
//! - **Well-Documented**: Every constant has clear documentation

pub mod constants;
