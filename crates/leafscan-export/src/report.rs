//! Plain-text diagnosis report.
//!
//! Lays out the diagnosis, the recommendation as one bullet per
//! sentence, and a dump of the five features. Pure function, returns a
//! `String`.

use std::fmt::Write;

use leafscan_pipeline::{AnalysisSummary, FeatureSet};

/// Heading used when [`ReportMetadata::title`] is `None`.
pub const DEFAULT_TITLE: &str = "Leaf Disease Analysis Report";

/// Optional header lines for [`text_report`].
///
/// Timestamps are supplied by the caller so report generation stays
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct ReportMetadata<'a> {
    /// Report heading. Defaults to [`DEFAULT_TITLE`].
    pub title: Option<&'a str>,
    /// Name of the analyzed image, emitted as `Source:`.
    pub source: Option<&'a str>,
    /// Free-form generation note (typically a date), emitted as
    /// `Generated:`.
    pub generated: Option<&'a str>,
}

/// Render an analysis summary as a plain-text report.
///
/// # Examples
///
/// ```
/// use leafscan_export::{ReportMetadata, text_report};
/// use leafscan_pipeline::{AnalysisSummary, Classifier, Dimensions, FeatureSet, RuleProfile};
///
/// let features = FeatureSet::default();
/// let summary = AnalysisSummary {
///     dimensions: Dimensions { width: 10, height: 10 },
///     leaf_found: true,
///     leaf_area: 50,
///     lesion_area: 0,
///     profile: RuleProfile::General,
///     features,
///     diagnosis: RuleProfile::General.classify(&features),
/// };
/// let report = text_report(&summary, &ReportMetadata::default());
/// assert!(report.contains("Diagnosis: Healthy"));
/// assert!(report.contains("Confidence: 100%"));
/// ```
#[must_use]
pub fn text_report(summary: &AnalysisSummary, metadata: &ReportMetadata<'_>) -> String {
    let mut out = String::new();
    let title = metadata.title.unwrap_or(DEFAULT_TITLE);

    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "=".repeat(title.chars().count()));
    if let Some(source) = metadata.source {
        let _ = writeln!(out, "Source: {source}");
    }
    if let Some(generated) = metadata.generated {
        let _ = writeln!(out, "Generated: {generated}");
    }
    let _ = writeln!(
        out,
        "Image: {} ({} leaf pixels, {} lesion pixels)",
        summary.dimensions, summary.leaf_area, summary.lesion_area
    );
    if !summary.leaf_found {
        let _ = writeln!(out, "Note: no leaf was found in the image.");
    }
    out.push('\n');

    let diagnosis = &summary.diagnosis;
    let _ = writeln!(out, "Diagnosis: {}", diagnosis.label);
    let _ = writeln!(out, "Confidence: {}", percent(diagnosis.confidence));
    let _ = writeln!(out, "Profile: {}", summary.profile);
    out.push('\n');

    let _ = writeln!(out, "Recommendation:");
    for sentence in sentences(&diagnosis.recommendation) {
        let _ = writeln!(out, "  - {sentence}");
    }
    out.push('\n');

    let _ = writeln!(out, "Features:");
    for (name, value) in feature_lines(&summary.features) {
        let _ = writeln!(out, "  {name:<22} : {value}");
    }

    out
}

/// `0.85` -> `"85%"`.
fn percent(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}

/// Split prose on `". "` into sentences that each end with a period.
fn sentences(text: &str) -> Vec<String> {
    text.split(". ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("{}.", s.trim_end_matches('.')))
        .collect()
}

/// Title-cased feature names with floats to four decimals.
fn feature_lines(features: &FeatureSet) -> [(&'static str, String); 5] {
    [
        ("Median Hue", format!("{:.4}", features.median_hue)),
        ("Entropy", format!("{:.4}", features.entropy)),
        ("Lesion Area Ratio", format!("{:.4}", features.lesion_area_ratio)),
        ("Num Lesions", features.num_lesions.to_string()),
        ("Avg Circularity", format!("{:.4}", features.avg_circularity)),
    ]
}
