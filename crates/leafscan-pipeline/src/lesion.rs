//! Lesion detection: find discolored regions inside the leaf.
//!
//! This module defines the [`LesionStrategy`] trait for pluggable
//! candidate-pixel selection and the [`LesionStrategyKind`] enum for
//! choosing one at runtime. Both strategies share the rest of the
//! stage: restrict to the leaf, open to remove specks, trace external
//! contours, drop contours below a minimum area, and mark the survivors
//! on an overlay.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::color::{a_star_plane, hue_plane};
use crate::contour::{Contour, find_external_contours};
use crate::mask;
use crate::overlay;
use crate::types::{Dimensions, GrayImage, PipelineError, ensure_same_dimensions};

/// Default lower hue bound for lesion pixels (half-degrees).
pub const DEFAULT_LESION_HUE_MIN: u8 = 0;

/// Default upper hue bound for lesion pixels (half-degrees).
pub const DEFAULT_LESION_HUE_MAX: u8 = 40;

/// Default a\* threshold for the Lab strategy (CIE units).
pub const DEFAULT_A_STAR_MIN: f64 = 10.0;

/// Default opening radius applied to the candidate mask.
pub const DEFAULT_OPEN_RADIUS: u8 = 2;

/// Selects how candidate lesion pixels are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LesionStrategyKind {
    /// Pixels whose HSV hue lies in `[hue_min, hue_max]`.
    ///
    /// The default band catches brown, yellow, and black tissue.
    #[default]
    HueThreshold,

    /// Pixels whose CIE L\*a\*b\* a\* component exceeds `a_star_min`,
    /// i.e. that lean red rather than green.
    LabAStar,
}

impl LesionStrategyKind {
    /// Minimum lesion contour area each strategy was calibrated with.
    #[must_use]
    pub const fn default_min_area(self) -> f64 {
        match self {
            Self::HueThreshold => 150.0,
            Self::LabAStar => 200.0,
        }
    }

    /// Short name for logs and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HueThreshold => "hue threshold",
            Self::LabAStar => "Lab a*",
        }
    }
}

/// Trait for lesion candidate strategies.
///
/// Input: the source image and the lesion configuration.
/// Output: a binary mask of candidate pixels over the whole image. The
/// caller restricts it to the leaf.
pub trait LesionStrategy {
    /// Select candidate lesion pixels.
    fn candidates(&self, image: &RgbImage, config: &LesionConfig) -> GrayImage;
}

impl LesionStrategy for LesionStrategyKind {
    fn candidates(&self, image: &RgbImage, config: &LesionConfig) -> GrayImage {
        match *self {
            Self::HueThreshold => {
                mask::hue_in_range(&hue_plane(image), config.hue_min, config.hue_max)
            }
            Self::LabAStar => {
                #[allow(clippy::cast_possible_truncation)]
                let threshold = config.a_star_min as f32;
                mask::above(&a_star_plane(image), threshold)
            }
        }
    }
}

/// Lesion detection parameters.
///
/// Fields missing from serialized input take the defaults of the
/// selected strategy, so `{"strategy": "lab_a_star"}` keeps the Lab
/// minimum area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PartialLesionConfig")]
pub struct LesionConfig {
    /// Candidate selection strategy.
    pub strategy: LesionStrategyKind,
    /// Lower hue bound, inclusive (hue strategy).
    pub hue_min: u8,
    /// Upper hue bound, inclusive (hue strategy).
    pub hue_max: u8,
    /// a\* must exceed this value (Lab strategy).
    pub a_star_min: f64,
    /// Contours enclosing less area than this are discarded.
    pub min_area: f64,
    /// Disk radius of the denoising opening.
    pub open_radius: u8,
}

impl LesionConfig {
    /// Defaults for the given strategy, including its calibrated
    /// minimum area.
    #[must_use]
    pub const fn for_strategy(strategy: LesionStrategyKind) -> Self {
        Self {
            strategy,
            hue_min: DEFAULT_LESION_HUE_MIN,
            hue_max: DEFAULT_LESION_HUE_MAX,
            a_star_min: DEFAULT_A_STAR_MIN,
            min_area: strategy.default_min_area(),
            open_radius: DEFAULT_OPEN_RADIUS,
        }
    }
}

impl Default for LesionConfig {
    fn default() -> Self {
        Self::for_strategy(LesionStrategyKind::default())
    }
}

/// Deserialization shape of [`LesionConfig`]: every field but the
/// strategy is optional.
#[derive(Default, Deserialize)]
#[serde(default)]
struct PartialLesionConfig {
    strategy: LesionStrategyKind,
    hue_min: Option<u8>,
    hue_max: Option<u8>,
    a_star_min: Option<f64>,
    min_area: Option<f64>,
    open_radius: Option<u8>,
}

impl From<PartialLesionConfig> for LesionConfig {
    fn from(partial: PartialLesionConfig) -> Self {
        let defaults = Self::for_strategy(partial.strategy);
        Self {
            strategy: partial.strategy,
            hue_min: partial.hue_min.unwrap_or(defaults.hue_min),
            hue_max: partial.hue_max.unwrap_or(defaults.hue_max),
            a_star_min: partial.a_star_min.unwrap_or(defaults.a_star_min),
            min_area: partial.min_area.unwrap_or(defaults.min_area),
            open_radius: partial.open_radius.unwrap_or(defaults.open_radius),
        }
    }
}

/// Output of [`detect`].
#[derive(Debug, Clone)]
pub struct LesionDetection {
    /// Lesion mask, same dimensions as the image.
    pub mask: GrayImage,
    /// Lesion contours that passed the area filter.
    pub contours: Vec<Contour>,
    /// Copy of the image with a marker around each lesion.
    pub overlay: RgbImage,
}

impl LesionDetection {
    fn empty(image: &RgbImage) -> Self {
        Self {
            mask: GrayImage::new(image.width(), image.height()),
            contours: Vec::new(),
            overlay: image.clone(),
        }
    }

    /// Number of lesions.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.contours.len()
    }

    /// Number of lesion-mask pixels.
    #[must_use]
    pub fn lesion_area(&self) -> u64 {
        mask::count_set(&self.mask)
    }
}

/// Detect lesions inside the leaf.
///
/// An empty leaf mask short-circuits to an empty mask, no contours,
/// and an unmodified overlay.
///
/// # Errors
///
/// Returns [`PipelineError::DimensionMismatch`] if `leaf_mask` does not
/// match the image.
pub fn detect(
    image: &RgbImage,
    leaf_mask: &GrayImage,
    config: &LesionConfig,
) -> Result<LesionDetection, PipelineError> {
    ensure_same_dimensions("leaf mask", Dimensions::of(image), leaf_mask)?;
    Ok(detect_unchecked(image, leaf_mask, config))
}

/// [`detect`] for callers that already guarantee matching dimensions.
pub(crate) fn detect_unchecked(
    image: &RgbImage,
    leaf_mask: &GrayImage,
    config: &LesionConfig,
) -> LesionDetection {
    if mask::is_empty(leaf_mask) {
        log::debug!("lesion: empty leaf mask, skipping detection");
        return LesionDetection::empty(image);
    }

    let candidates = config.strategy.candidates(image, config);
    let inside = mask::intersect(&candidates, leaf_mask);
    let lesion_mask = mask::open(&inside, config.open_radius);

    let all = find_external_contours(&lesion_mask);
    let traced = all.len();
    let contours: Vec<Contour> = all
        .into_iter()
        .filter(|c| {
            let keep = c.area() >= config.min_area;
            if !keep {
                log::trace!("lesion: dropping contour of area {:.1}", c.area());
            }
            keep
        })
        .collect();

    log::debug!(
        "lesion: {} strategy, {} candidate pixels in leaf, {} contours, {} kept (min area {})",
        config.strategy.name(),
        mask::count_set(&inside),
        traced,
        contours.len(),
        config.min_area
    );

    let overlay = overlay::lesion_markers(image, &contours);
    LesionDetection {
        mask: lesion_mask,
        contours,
        overlay,
    }
}
