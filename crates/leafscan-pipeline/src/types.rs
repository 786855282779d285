//! Shared types for the leafscan analysis pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::{Diagnosis, RuleProfile};
use crate::features::FeatureSet;
use crate::lesion::{LesionConfig, LesionDetection};
use crate::segment::{LeafSegmentation, SegmentConfig};

/// Re-export `GrayImage` so downstream crates can reference binary
/// masks without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can reference the source
/// photograph and overlays without depending on `image` directly.
pub use image::RgbImage;

/// Highest hue value in the half-circle convention (`0..=179`).
pub const HUE_MAX: u8 = 179;

/// A 2D point on the pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Column (pixels from left edge).
    pub x: i32,
    /// Row (pixels from top edge).
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        dx.hypot(dy)
    }
}

impl From<imageproc::point::Point<i32>> for Point {
    fn from(p: imageproc::point::Point<i32>) -> Self {
        Self::new(p.x, p.y)
    }
}

impl From<Point> for imageproc::point::Point<i32> {
    fn from(p: Point) -> Self {
        Self::new(p.x, p.y)
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of any image buffer.
    #[must_use]
    pub fn of<P: image::Pixel>(image: &image::ImageBuffer<P, Vec<P::Subpixel>>) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Total pixel count (`width * height`).
    #[must_use]
    pub const fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Configuration for a single analysis run.
///
/// Every tunable is a per-call numeric parameter; there is no config
/// file format. Hosts that need to pass a whole configuration around
/// can serialize this struct as JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Leaf segmentation thresholds.
    pub segmentation: SegmentConfig,

    /// Lesion detection strategy and thresholds.
    pub lesion: LesionConfig,

    /// Which decision-tree variant classifies the extracted features.
    pub profile: RuleProfile,
}

impl PipelineConfig {
    /// Check every field for values outside its meaningful range.
    ///
    /// The pipeline itself is total over any configuration (an inverted
    /// hue band simply selects nothing), so this is meant for hosts
    /// that accept user input and want to reject typos early.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] naming the first
    /// offending field.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let seg = &self.segmentation;
        check_hue("segmentation.hue_min", seg.hue_min)?;
        check_hue("segmentation.hue_max", seg.hue_max)?;
        if !seg.min_area_ratio.is_finite() || !(0.0..=1.0).contains(&seg.min_area_ratio) {
            return Err(PipelineError::InvalidConfig(format!(
                "segmentation.min_area_ratio must be within [0, 1], got {}",
                seg.min_area_ratio
            )));
        }

        let lesion = &self.lesion;
        check_hue("lesion.hue_min", lesion.hue_min)?;
        check_hue("lesion.hue_max", lesion.hue_max)?;
        if !lesion.a_star_min.is_finite() {
            return Err(PipelineError::InvalidConfig(format!(
                "lesion.a_star_min must be finite, got {}",
                lesion.a_star_min
            )));
        }
        if !lesion.min_area.is_finite() || lesion.min_area < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "lesion.min_area must be a non-negative number, got {}",
                lesion.min_area
            )));
        }
        Ok(())
    }
}

fn check_hue(field: &str, value: u8) -> Result<(), PipelineError> {
    if value > HUE_MAX {
        return Err(PipelineError::InvalidConfig(format!(
            "{field} must be within 0..={HUE_MAX}, got {value}"
        )));
    }
    Ok(())
}

/// Errors that can leave the pipeline crate.
///
/// Degenerate geometry (no leaf, no lesions, zero perimeter) is never
/// an error: every such case has a defined empty or zero result.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("could not read image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// A mask handed to a stage does not match the source image.
    #[error("{what} is {actual} but the image is {expected}")]
    DimensionMismatch {
        /// Which input was mismatched.
        what: &'static str,
        /// Dimensions of the source image.
        expected: Dimensions,
        /// Dimensions of the offending mask.
        actual: Dimensions,
    },
}

/// Return [`PipelineError::DimensionMismatch`] unless `mask` matches `expected`.
pub(crate) fn ensure_same_dimensions(
    what: &'static str,
    expected: Dimensions,
    mask: &GrayImage,
) -> Result<(), PipelineError> {
    let actual = Dimensions::of(mask);
    if actual == expected {
        Ok(())
    } else {
        Err(PipelineError::DimensionMismatch {
            what,
            expected,
            actual,
        })
    }
}

/// Everything one analysis produced.
///
/// Keeps every intermediate a presentation layer needs: the source
/// photograph, both masks and overlays, the contours, the features, and
/// the diagnosis.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// The analyzed photograph.
    pub image: RgbImage,
    /// Leaf segmentation output.
    pub leaf: LeafSegmentation,
    /// Lesion detection output.
    pub lesions: LesionDetection,
    /// Extracted features.
    pub features: FeatureSet,
    /// Classifier verdict.
    pub diagnosis: Diagnosis,
    /// Profile that produced the diagnosis.
    pub profile: RuleProfile,
    /// Image dimensions.
    pub dimensions: Dimensions,
}

impl AnalysisResult {
    /// Leaf overlay with lesion markers drawn on top.
    #[must_use]
    pub fn combined_overlay(&self) -> RgbImage {
        crate::overlay::compose(&self.leaf.overlay, &self.lesions.contours)
    }

    /// Serializable digest without any raster data.
    #[must_use]
    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            dimensions: self.dimensions,
            leaf_found: !self.leaf.is_empty(),
            leaf_area: self.leaf.leaf_area(),
            lesion_area: self.lesions.lesion_area(),
            profile: self.profile,
            features: self.features,
            diagnosis: self.diagnosis.clone(),
        }
    }
}

/// Raster-free digest of an [`AnalysisResult`], for JSON output and
/// reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Image dimensions.
    pub dimensions: Dimensions,
    /// Whether a leaf contour was found.
    pub leaf_found: bool,
    /// Leaf mask pixel count.
    pub leaf_area: u64,
    /// Lesion mask pixel count.
    pub lesion_area: u64,
    /// Profile that produced the diagnosis.
    pub profile: RuleProfile,
    /// Extracted features.
    pub features: FeatureSet,
    /// Classifier verdict.
    pub diagnosis: Diagnosis,
}
