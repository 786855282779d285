//! Side-by-side comparison of a leaf's features with healthy-leaf
//! reference values.

use std::fmt::Write;

use leafscan_pipeline::FeatureSet;

/// Lesion area ratio above which a leaf is flagged.
pub const HEALTHY_MAX_AREA_RATIO: f64 = 0.01;

/// Lesion hue entropy above which a leaf is flagged.
pub const HEALTHY_MAX_ENTROPY: f64 = 0.2;

/// One metric of the comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRow {
    /// Metric name.
    pub metric: &'static str,
    /// This leaf's value, formatted for display.
    pub actual: String,
    /// Reference range for a healthy leaf.
    pub healthy: &'static str,
    /// Whether the actual value falls outside the healthy range.
    pub abnormal: bool,
}

/// Compare `features` with the healthy-leaf reference.
///
/// Only lesion area, entropy, and lesion count can be abnormal;
/// circularity and hue are shown for context.
#[must_use]
pub fn compare_to_healthy(features: &FeatureSet) -> Vec<ComparisonRow> {
    let circularity = if features.num_lesions > 0 {
        format!("{:.2}", features.avg_circularity)
    } else {
        "n/a".to_string()
    };
    vec![
        ComparisonRow {
            metric: "Lesion / leaf area",
            actual: format!("{:.1}%", features.lesion_area_ratio * 100.0),
            healthy: "< 0.01 (1%)",
            abnormal: features.lesion_area_ratio > HEALTHY_MAX_AREA_RATIO,
        },
        ComparisonRow {
            metric: "Lesion hue entropy",
            actual: format!("{:.2}", features.entropy),
            healthy: "< 0.20",
            abnormal: features.entropy > HEALTHY_MAX_ENTROPY,
        },
        ComparisonRow {
            metric: "Lesion count",
            actual: features.num_lesions.to_string(),
            healthy: "0",
            abnormal: features.num_lesions > 0,
        },
        ComparisonRow {
            metric: "Average circularity",
            actual: circularity,
            healthy: "n/a",
            abnormal: false,
        },
        ComparisonRow {
            metric: "Median lesion hue",
            actual: format!("{:.1}", features.median_hue),
            healthy: "40-70 (leaf green)",
            abnormal: false,
        },
    ]
}

/// Render comparison rows as a fixed-width table. Abnormal rows are
/// marked with `!`.
#[must_use]
pub fn comparison_table(rows: &[ComparisonRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  {:<22} {:>12}  {}", "Metric", "This leaf", "Healthy");
    let _ = writeln!(out, "{}", "-".repeat(60));
    for row in rows {
        let flag = if row.abnormal { '!' } else { ' ' };
        let _ = writeln!(
            out,
            "{flag} {:<22} {:>12}  {}",
            row.metric, row.actual, row.healthy
        );
    }
    out
}
