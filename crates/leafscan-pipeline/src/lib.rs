//! leafscan-pipeline: rule-based leaf disease screening (sans-IO).
//!
//! Analyzes one photograph of a single leaf through four stages:
//! segment the leaf -> detect lesions -> extract features -> classify.
//!
//! This crate has **no I/O dependencies**. It operates on in-memory
//! images (or byte slices via [`decode`]) and returns structured data.
//! Reading files, writing overlays, and rendering reports live in the
//! `leafscan` CLI and `leafscan-export`.

pub mod classify;
pub mod color;
pub mod contour;
pub mod diagnostics;
pub mod features;
pub mod geometry;
pub mod lesion;
pub mod mask;
pub mod overlay;
pub mod pipeline;
pub mod segment;
pub mod types;
pub mod validate;

pub use classify::{Classifier, ConditionLabel, Diagnosis, RuleProfile};
pub use contour::Contour;
pub use features::FeatureSet;
pub use lesion::{LesionConfig, LesionDetection, LesionStrategy, LesionStrategyKind};
pub use pipeline::Pipeline;
pub use segment::{LeafSegmentation, SegmentConfig};
pub use types::{
    AnalysisResult, AnalysisSummary, Dimensions, GrayImage, PipelineConfig, PipelineError, Point,
    RgbImage,
};

/// Run all four stages on a decoded photograph.
///
/// Total over every image: a photo with no leaf, or a leaf with no
/// lesions, still yields a diagnosis.
///
/// # Pipeline steps
///
/// 1. Segment the leaf (HSV band, morphology, contour selection)
/// 2. Detect lesions inside it (pluggable candidate strategy)
/// 3. Extract the five features
/// 4. Classify with the configured rule profile
#[must_use]
pub fn analyze(image: RgbImage, config: &PipelineConfig) -> AnalysisResult {
    Pipeline::new(image, config.clone())
        .segment()
        .detect_lesions()
        .extract_features()
        .classify()
        .into_result()
}

/// Decode an in-memory image (PNG, JPEG, BMP, WebP) to 8-bit RGB.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the format is unrecognized
/// or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    let image = image::load_from_memory(bytes)?;
    log::debug!("decoded {}x{} image", image.width(), image.height());
    Ok(image.to_rgb8())
}
