//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::analyze`] which runs all four stages in one call,
//! [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use leafscan_pipeline::{Pipeline, PipelineConfig, RgbImage};
//! # fn run(image: RgbImage) {
//! let result = Pipeline::new(image, PipelineConfig::default())
//!     .segment()
//!     .detect_lesions()
//!     .extract_features()
//!     .classify()
//!     .into_result();
//! println!("{}", result.diagnosis.label);
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline
//! state, carrying all previously computed intermediates. No stage can
//! fail: every degenerate case (no leaf, no lesions) has a defined empty
//! result, and the masks handed between stages always match the image.

use image::RgbImage;

use crate::classify::{Classifier, Diagnosis};
use crate::contour::Contour;
use crate::diagnostics::StageMetrics;
use crate::features::FeatureSet;
use crate::lesion::LesionDetection;
use crate::segment::LeafSegmentation;
use crate::types::{AnalysisResult, Dimensions, PipelineConfig};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// Call [`segment`](Self::segment) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing, call .segment() to continue"]
pub struct Pending {
    config: PipelineConfig,
    image: RgbImage,
}

impl Pending {
    /// The photograph to analyze.
    #[must_use]
    pub const fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Segment the leaf and advance to the [`Segmented`] stage.
    pub fn segment(self) -> Segmented {
        let leaf = crate::segment::segment(&self.image, &self.config.segmentation);
        Segmented {
            dimensions: Dimensions::of(&self.image),
            config: self.config,
            image: self.image,
            leaf,
        }
    }
}

// ───────────────────────── Stage 1: Segmented ────────────────────────

/// Pipeline state after leaf segmentation.
///
/// Call [`detect_lesions`](Self::detect_lesions) to advance.
#[must_use = "pipeline stages are consumed by advancing, call .detect_lesions() to continue"]
pub struct Segmented {
    config: PipelineConfig,
    image: RgbImage,
    leaf: LeafSegmentation,
    dimensions: Dimensions,
}

impl Segmented {
    /// The leaf mask, contour, and outline overlay.
    #[must_use]
    pub const fn leaf(&self) -> &LeafSegmentation {
        &self.leaf
    }

    pub(crate) fn measure(&self) -> StageMetrics {
        let contour = self.leaf.contour.as_ref();
        StageMetrics::Segment {
            width: self.dimensions.width,
            height: self.dimensions.height,
            leaf_found: contour.is_some(),
            contour_points: contour.map_or(0, Contour::len),
            leaf_area: self.leaf.leaf_area(),
        }
    }

    /// Detect lesions inside the leaf and advance to [`LesionsDetected`].
    pub fn detect_lesions(self) -> LesionsDetected {
        let lesions =
            crate::lesion::detect_unchecked(&self.image, &self.leaf.mask, &self.config.lesion);
        LesionsDetected {
            config: self.config,
            image: self.image,
            leaf: self.leaf,
            lesions,
            dimensions: self.dimensions,
        }
    }
}

// ───────────────────────── Stage 2: LesionsDetected ──────────────────

/// Pipeline state after lesion detection.
///
/// Call [`extract_features`](Self::extract_features) to advance.
#[must_use = "pipeline stages are consumed by advancing, call .extract_features() to continue"]
pub struct LesionsDetected {
    config: PipelineConfig,
    image: RgbImage,
    leaf: LeafSegmentation,
    lesions: LesionDetection,
    dimensions: Dimensions,
}

impl LesionsDetected {
    /// The lesion mask, contours, and marker overlay.
    #[must_use]
    pub const fn lesions(&self) -> &LesionDetection {
        &self.lesions
    }

    pub(crate) fn measure(&self) -> StageMetrics {
        StageMetrics::Lesions {
            strategy: self.config.lesion.strategy.name().to_string(),
            min_area: self.config.lesion.min_area,
            lesion_count: self.lesions.count(),
            lesion_area: self.lesions.lesion_area(),
        }
    }

    /// Compute the feature set and advance to [`FeaturesExtracted`].
    pub fn extract_features(self) -> FeaturesExtracted {
        let features = crate::features::extract_unchecked(
            &self.image,
            &self.leaf.mask,
            &self.lesions.mask,
            &self.lesions.contours,
        );
        FeaturesExtracted {
            config: self.config,
            image: self.image,
            leaf: self.leaf,
            lesions: self.lesions,
            features,
            dimensions: self.dimensions,
        }
    }
}

// ───────────────────────── Stage 3: FeaturesExtracted ────────────────

/// Pipeline state after feature extraction.
///
/// Call [`classify`](Self::classify) to advance to the final stage.
#[must_use = "pipeline stages are consumed by advancing, call .classify() to continue"]
pub struct FeaturesExtracted {
    config: PipelineConfig,
    image: RgbImage,
    leaf: LeafSegmentation,
    lesions: LesionDetection,
    features: FeatureSet,
    dimensions: Dimensions,
}

impl FeaturesExtracted {
    /// The extracted features.
    #[must_use]
    pub const fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub(crate) const fn measure(&self) -> StageMetrics {
        StageMetrics::Features {
            features: self.features,
        }
    }

    /// Classify the features with the configured profile.
    pub fn classify(self) -> Classified {
        let diagnosis = self.config.profile.classify(&self.features);
        Classified {
            config: self.config,
            image: self.image,
            leaf: self.leaf,
            lesions: self.lesions,
            features: self.features,
            diagnosis,
            dimensions: self.dimensions,
        }
    }
}

// ───────────────────────── Stage 4: Classified ───────────────────────

/// Final pipeline state.
///
/// Call [`into_result`](Self::into_result) to take ownership of every
/// intermediate.
#[must_use = "call .into_result() to obtain the analysis"]
pub struct Classified {
    config: PipelineConfig,
    image: RgbImage,
    leaf: LeafSegmentation,
    lesions: LesionDetection,
    features: FeatureSet,
    diagnosis: Diagnosis,
    dimensions: Dimensions,
}

impl Classified {
    /// The classifier verdict.
    #[must_use]
    pub const fn diagnosis(&self) -> &Diagnosis {
        &self.diagnosis
    }

    /// Image dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub(crate) fn measure(&self) -> StageMetrics {
        StageMetrics::Classify {
            profile: self.config.profile.name().to_string(),
            label: self.diagnosis.label.name().to_string(),
            confidence: self.diagnosis.confidence,
        }
    }

    /// Consume the pipeline and return the full [`AnalysisResult`].
    #[must_use]
    pub fn into_result(self) -> AnalysisResult {
        AnalysisResult {
            image: self.image,
            leaf: self.leaf,
            lesions: self.lesions,
            features: self.features,
            diagnosis: self.diagnosis,
            profile: self.config.profile,
            dimensions: self.dimensions,
        }
    }
}

// ──────────────────── PipelineStage trait + Stage enum ────────────────

/// Total number of stages in the pipeline, including [`Pending`].
pub const STAGE_COUNT: usize = 5;

/// The output produced by a single pipeline stage.
///
/// Each variant borrows the data that the corresponding stage computed.
#[must_use]
pub enum StageOutput<'a> {
    /// The photograph, not yet processed.
    Source {
        /// The source image.
        image: &'a RgbImage,
    },
    /// Leaf segmentation result.
    Segmented {
        /// Leaf mask, contour, and overlay.
        leaf: &'a LeafSegmentation,
    },
    /// Lesion detection result.
    LesionsDetected {
        /// Lesion mask, contours, and overlay.
        lesions: &'a LesionDetection,
    },
    /// Feature extraction result.
    FeaturesExtracted {
        /// The feature set.
        features: &'a FeatureSet,
    },
    /// Classification result.
    Classified {
        /// The diagnosis.
        diagnosis: &'a Diagnosis,
        /// Image dimensions.
        dimensions: Dimensions,
    },
}

/// Trait implemented by every pipeline stage, enabling uniform iteration.
///
/// Each stage struct implements it, and [`Stage`] delegates to
/// whichever variant it holds.
pub trait PipelineStage: Sized {
    /// Human-readable name of this stage (e.g. `"source"`, `"lesions"`).
    const NAME: &str;

    /// Zero-based index of this stage (`0` for Pending through `4` for
    /// Classified).
    const INDEX: usize;

    /// The output this stage produced.
    fn output(&self) -> StageOutput<'_>;

    /// Stage-specific metrics for diagnostics.
    ///
    /// `None` for [`Pending`], which has not done any work yet.
    fn metrics(&self) -> Option<StageMetrics>;

    /// Advance to the next stage, or `None` if already at the final one.
    fn next(self) -> Option<Stage>;

    /// Run all remaining stages and return the final [`AnalysisResult`].
    fn complete(self) -> AnalysisResult;
}

impl PipelineStage for Pending {
    const NAME: &str = "source";
    const INDEX: usize = 0;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Source { image: &self.image }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        None
    }

    fn next(self) -> Option<Stage> {
        Some(Stage::Segmented(self.segment()))
    }

    fn complete(self) -> AnalysisResult {
        self.segment().complete()
    }
}

impl PipelineStage for Segmented {
    const NAME: &str = "segment";
    const INDEX: usize = 1;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Segmented { leaf: &self.leaf }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.measure())
    }

    fn next(self) -> Option<Stage> {
        Some(Stage::LesionsDetected(self.detect_lesions()))
    }

    fn complete(self) -> AnalysisResult {
        self.detect_lesions().complete()
    }
}

impl PipelineStage for LesionsDetected {
    const NAME: &str = "lesions";
    const INDEX: usize = 2;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::LesionsDetected {
            lesions: &self.lesions,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.measure())
    }

    fn next(self) -> Option<Stage> {
        Some(Stage::FeaturesExtracted(self.extract_features()))
    }

    fn complete(self) -> AnalysisResult {
        self.extract_features().complete()
    }
}

impl PipelineStage for FeaturesExtracted {
    const NAME: &str = "features";
    const INDEX: usize = 3;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::FeaturesExtracted {
            features: &self.features,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.measure())
    }

    fn next(self) -> Option<Stage> {
        Some(Stage::Classified(self.classify()))
    }

    fn complete(self) -> AnalysisResult {
        self.classify().into_result()
    }
}

impl PipelineStage for Classified {
    const NAME: &str = "classify";
    const INDEX: usize = 4;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Classified {
            diagnosis: &self.diagnosis,
            dimensions: self.dimensions,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.measure())
    }

    fn next(self) -> Option<Stage> {
        None
    }

    fn complete(self) -> AnalysisResult {
        self.into_result()
    }
}

/// Enum wrapping all pipeline stages for uniform, loopable access.
///
/// ```rust
/// # use leafscan_pipeline::{Pipeline, PipelineConfig, RgbImage};
/// # use leafscan_pipeline::pipeline::{Advance, Stage};
/// # fn run(image: RgbImage) {
/// let mut stage: Stage = Pipeline::new(image, PipelineConfig::default()).into();
/// loop {
///     println!("at {}", stage.name());
///     match stage.advance() {
///         Advance::Next(next) => stage = next,
///         Advance::Complete(done) => { stage = done; break; }
///     }
/// }
/// let result = stage.complete();
/// # }
/// ```
#[must_use]
pub enum Stage {
    /// See [`Pending`].
    Pending(Pending),
    /// See [`Segmented`].
    Segmented(Segmented),
    /// See [`LesionsDetected`].
    LesionsDetected(LesionsDetected),
    /// See [`FeaturesExtracted`].
    FeaturesExtracted(FeaturesExtracted),
    /// See [`Classified`].
    Classified(Classified),
}

/// Compile-time guard: adding a [`Stage`] variant makes this match
/// non-exhaustive until [`STAGE_COUNT`] is revisited.
#[allow(dead_code, clippy::match_same_arms)]
const fn _stage_count_guard(s: &Stage) {
    match s {
        Stage::Pending(_)
        | Stage::Segmented(_)
        | Stage::LesionsDetected(_)
        | Stage::FeaturesExtracted(_)
        | Stage::Classified(_) => {}
    }
}

/// Result of [`Stage::advance`]: either the next stage or the
/// completed final stage returned unchanged.
#[must_use]
pub enum Advance {
    /// The pipeline advanced to this next stage.
    Next(Stage),
    /// The pipeline was already at the final stage.
    Complete(Stage),
}

/// Delegate a method call to whichever `Stage` variant is active.
macro_rules! delegate {
    ($self:ident, $method:ident $(, $arg:expr)*) => {
        match $self {
            Self::Pending(s) => s.$method($($arg),*),
            Self::Segmented(s) => s.$method($($arg),*),
            Self::LesionsDetected(s) => s.$method($($arg),*),
            Self::FeaturesExtracted(s) => s.$method($($arg),*),
            Self::Classified(s) => s.$method($($arg),*),
        }
    };
}

impl Stage {
    /// Human-readable name of the current stage.
    #[must_use]
    pub fn name(&self) -> &'static str {
        delegate!(self, name)
    }

    /// Zero-based index of the current stage.
    #[must_use]
    pub fn index(&self) -> usize {
        delegate!(self, index)
    }

    /// The output this stage produced.
    pub fn output(&self) -> StageOutput<'_> {
        delegate!(self, output)
    }

    /// Stage-specific metrics, `None` for `Pending`.
    #[must_use]
    pub fn metrics(&self) -> Option<StageMetrics> {
        delegate!(self, metrics)
    }

    /// Whether the pipeline is at the final stage.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Classified(_))
    }

    /// Advance to the next stage; `None` consumes the final stage.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        delegate!(self, next)
    }

    /// Advance to the next stage, returning `self` unchanged if
    /// already complete.
    ///
    /// Unlike [`next`](Self::next), the final stage is handed back in
    /// [`Advance::Complete`] so [`complete`](Self::complete) can still
    /// be called on it.
    pub fn advance(self) -> Advance {
        if self.is_complete() {
            return Advance::Complete(self);
        }
        match self.next() {
            Some(next) => Advance::Next(next),
            // Only the final stage returns None, and it was handled above.
            #[allow(clippy::unreachable)]
            None => unreachable!("non-final stage returned None from next()"),
        }
    }

    /// Run all remaining stages to completion.
    pub fn complete(self) -> AnalysisResult {
        delegate!(self, complete)
    }
}

// The trait's associated constants aren't reachable as `self.NAME`, so
// the macro goes through this helper.
trait StageMetadata {
    fn name(&self) -> &'static str;
    fn index(&self) -> usize;
}

impl<T: PipelineStage> StageMetadata for T {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn index(&self) -> usize {
        T::INDEX
    }
}

impl From<Pending> for Stage {
    fn from(s: Pending) -> Self {
        Self::Pending(s)
    }
}

impl From<Segmented> for Stage {
    fn from(s: Segmented) -> Self {
        Self::Segmented(s)
    }
}

impl From<LesionsDetected> for Stage {
    fn from(s: LesionsDetected) -> Self {
        Self::LesionsDetected(s)
    }
}

impl From<FeaturesExtracted> for Stage {
    fn from(s: FeaturesExtracted) -> Self {
        Self::FeaturesExtracted(s)
    }
}

impl From<Classified> for Stage {
    fn from(s: Classified) -> Self {
        Self::Classified(s)
    }
}

// ───────────────────── Pipeline entry point ──────────────────────────

/// Incremental leaf analysis pipeline.
///
/// Created via [`Pipeline::new`], which stores the image and config
/// without doing any processing.
pub struct Pipeline;

impl Pipeline {
    /// Create a new pipeline over a decoded photograph.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(image: RgbImage, config: PipelineConfig) -> Pending {
        Pending { config, image }
    }
}
