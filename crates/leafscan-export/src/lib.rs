//! leafscan-export: Pure report serializers (sans-IO)
//!
//! Turns an analysis into documents a grower can read: a plain-text
//! report, an SVG overlay with the diagnosis caption, and a comparison
//! against healthy-leaf reference values. Every function returns a
//! `String` or plain data; writing files is the caller's job.

pub mod compare;
pub mod report;
pub mod svg;

pub use compare::{ComparisonRow, compare_to_healthy, comparison_table};
pub use report::{ReportMetadata, text_report};
pub use svg::{SvgMetadata, build_contour_data, to_svg};
