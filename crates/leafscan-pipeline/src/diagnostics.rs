//! Pipeline diagnostics: timing and counts for each stage.
//!
//! Timestamps come from an injected [`Clock`], so this crate never
//! reads the system clock itself. Hosts pass a clock backed by
//! `std::time::Instant`; tests pass a deterministic one.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::features::FeatureSet;
use crate::pipeline::Pipeline;
use crate::types::{AnalysisResult, Dimensions, PipelineConfig};

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: leaf segmentation.
    pub segment: StageDiagnostics,
    /// Stage 2: lesion detection.
    pub lesions: StageDiagnostics,
    /// Stage 3: feature extraction.
    pub features: StageDiagnostics,
    /// Stage 4: classification.
    pub classify: StageDiagnostics,
    /// Wall-clock duration of the whole analysis (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Leaf segmentation metrics.
    Segment {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Whether a leaf contour was selected.
        leaf_found: bool,
        /// Points on the leaf contour (0 when none).
        contour_points: usize,
        /// Leaf mask pixel count.
        leaf_area: u64,
    },
    /// Lesion detection metrics.
    Lesions {
        /// Candidate strategy name.
        strategy: String,
        /// Minimum contour area in effect.
        min_area: f64,
        /// Lesions kept after the area filter.
        lesion_count: usize,
        /// Lesion mask pixel count.
        lesion_area: u64,
    },
    /// Feature extraction metrics.
    Features {
        /// The extracted feature set.
        features: FeatureSet,
    },
    /// Classification metrics.
    Classify {
        /// Rule profile name.
        profile: String,
        /// Resulting label.
        label: String,
        /// Resulting confidence.
        confidence: f64,
    },
}

/// High-level summary counts for the whole analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Leaf mask pixel count.
    pub leaf_area: u64,
    /// Number of lesions.
    pub lesion_count: usize,
}

impl PipelineSummary {
    fn of(result: &AnalysisResult) -> Self {
        let Dimensions { width, height } = result.dimensions;
        Self {
            image_width: width,
            image_height: height,
            pixel_count: result.dimensions.area(),
            leaf_area: result.leaf.leaf_area(),
            lesion_count: result.lesions.count(),
        }
    }
}

/// Run all four stages, timing each with `clock`.
#[must_use]
pub fn analyze_with_diagnostics<C: Clock>(
    image: RgbImage,
    config: PipelineConfig,
    clock: &C,
) -> (AnalysisResult, PipelineDiagnostics) {
    let start = clock.now();

    let t = clock.now();
    let segmented = Pipeline::new(image, config).segment();
    let segment = stage(clock, &t, || segmented.measure());

    let t = clock.now();
    let detected = segmented.detect_lesions();
    let lesions = stage(clock, &t, || detected.measure());

    let t = clock.now();
    let extracted = detected.extract_features();
    let features = stage(clock, &t, || extracted.measure());

    let t = clock.now();
    let classified = extracted.classify();
    let classify = stage(clock, &t, || classified.measure());

    let total_duration = clock.elapsed(&start);
    let result = classified.into_result();

    let diagnostics = PipelineDiagnostics {
        segment,
        lesions,
        features,
        classify,
        total_duration,
        summary: PipelineSummary::of(&result),
    };
    (result, diagnostics)
}

/// Read the clock before computing metrics so counting pixels is not
/// billed to the stage.
fn stage<C: Clock>(
    clock: &C,
    since: &C::Instant,
    metrics: impl FnOnce() -> StageMetrics,
) -> StageDiagnostics {
    let duration = clock.elapsed(since);
    StageDiagnostics {
        duration,
        metrics: metrics(),
    }
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Segmentation", &self.segment),
            ("Lesion Detection", &self.lesions),
            ("Feature Extraction", &self.features),
            ("Classification", &self.classify),
        ];

        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Leaf area: {} px  |  Lesions: {}",
            self.summary.leaf_area, self.summary.lesion_count,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Segment {
            width,
            height,
            leaf_found,
            contour_points,
            leaf_area,
        } => {
            if *leaf_found {
                format!("{width}x{height} leaf={leaf_area}px contour={contour_points} pts")
            } else {
                format!("{width}x{height} no leaf")
            }
        }
        StageMetrics::Lesions {
            strategy,
            min_area,
            lesion_count,
            lesion_area,
        } => format!("{strategy} min_area={min_area:.0} lesions={lesion_count} ({lesion_area}px)"),
        StageMetrics::Features { features } => format!(
            "hue={:.1} entropy={:.3} ratio={:.4} circ={:.3}",
            features.median_hue,
            features.entropy,
            features.lesion_area_ratio,
            features.avg_circularity,
        ),
        StageMetrics::Classify {
            profile,
            label,
            confidence,
        } => format!("{profile}: {label} ({:.0}%)", confidence * 100.0),
    }
}
