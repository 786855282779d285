//! Feature extraction: five scalar statistics of the detected lesions.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::color::hue_plane;
use crate::contour::Contour;
use crate::mask::{self, UNSET};
use crate::types::{Dimensions, GrayImage, PipelineError, ensure_same_dimensions};

/// Number of bins in the lesion hue histogram.
pub const HUE_BINS: usize = 32;

/// Exclusive upper end of the hue histogram range.
const HUE_RANGE: usize = 180;

/// Added to the histogram total before normalizing.
const SUM_EPSILON: f64 = 1e-6;

/// Added to each probability inside the logarithm.
const LOG_EPSILON: f64 = 1e-10;

/// Diagnostic features of one analyzed leaf.
///
/// All values are finite. `median_hue` is 0 when there are no lesion
/// pixels; check `num_lesions` or `lesion_area_ratio` to tell that
/// apart from a genuinely red lesion.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureSet {
    /// Median hue of lesion pixels (`0..=179`).
    pub median_hue: f64,
    /// Shannon entropy in bits of the 32-bin lesion hue histogram.
    pub entropy: f64,
    /// Lesion pixels divided by leaf pixels.
    pub lesion_area_ratio: f64,
    /// Number of lesion contours.
    pub num_lesions: usize,
    /// Mean circularity of lesion contours with nonzero perimeter.
    pub avg_circularity: f64,
}

impl FeatureSet {
    /// Whether every floating-point feature is finite.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.median_hue.is_finite()
            && self.entropy.is_finite()
            && self.lesion_area_ratio.is_finite()
            && self.avg_circularity.is_finite()
    }
}

/// Compute the feature set.
///
/// `num_lesions` is always `lesion_contours.len()`; the contours passed
/// here should be the same ones that produced `lesion_mask`.
///
/// # Errors
///
/// Returns [`PipelineError::DimensionMismatch`] if either mask does not
/// match the image.
pub fn extract(
    image: &RgbImage,
    leaf_mask: &GrayImage,
    lesion_mask: &GrayImage,
    lesion_contours: &[Contour],
) -> Result<FeatureSet, PipelineError> {
    let expected = Dimensions::of(image);
    ensure_same_dimensions("leaf mask", expected, leaf_mask)?;
    ensure_same_dimensions("lesion mask", expected, lesion_mask)?;
    Ok(extract_unchecked(
        image,
        leaf_mask,
        lesion_mask,
        lesion_contours,
    ))
}

/// [`extract`] for callers that already guarantee matching dimensions.
pub(crate) fn extract_unchecked(
    image: &RgbImage,
    leaf_mask: &GrayImage,
    lesion_mask: &GrayImage,
    lesion_contours: &[Contour],
) -> FeatureSet {
    let histogram = lesion_hue_histogram(image, lesion_mask);

    let features = FeatureSet {
        median_hue: median(&histogram),
        entropy: hue_entropy(&histogram),
        lesion_area_ratio: area_ratio(mask::count_set(lesion_mask), mask::count_set(leaf_mask)),
        num_lesions: lesion_contours.len(),
        avg_circularity: average_circularity(lesion_contours),
    };
    log::debug!("features: {features:?}");
    features
}

/// Per-hue pixel counts under the lesion mask.
fn lesion_hue_histogram(image: &RgbImage, lesion_mask: &GrayImage) -> [u64; 256] {
    let mut histogram = [0_u64; 256];
    if mask::is_empty(lesion_mask) {
        return histogram;
    }
    let hue = hue_plane(image);
    for (h, m) in hue.pixels().zip(lesion_mask.pixels()) {
        if m.0[0] != UNSET {
            histogram[usize::from(h.0[0])] += 1;
        }
    }
    histogram
}

/// Median of the values counted in `histogram`; the mean of the two
/// middle values for an even count. 0 for an empty histogram.
#[must_use]
pub fn median(histogram: &[u64; 256]) -> f64 {
    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 0.0;
    }
    // 0-based ranks of the lower and upper middle values.
    let lower_rank = (total - 1) / 2;
    let upper_rank = total / 2;
    let value_at = |rank: u64| -> f64 {
        let mut seen = 0;
        for (value, &count) in histogram.iter().enumerate() {
            seen += count;
            if seen > rank {
                return u8::try_from(value).map_or(0.0, f64::from);
            }
        }
        0.0
    };
    f64::midpoint(value_at(lower_rank), value_at(upper_rank))
}

/// Shannon entropy (bits) of `histogram` regrouped into [`HUE_BINS`]
/// equal-width bins over `0..180`. 0 for an empty histogram; never
/// negative.
#[must_use]
pub fn hue_entropy(histogram: &[u64; 256]) -> f64 {
    let mut bins = [0_u64; HUE_BINS];
    for (hue, &count) in histogram.iter().enumerate().take(HUE_RANGE) {
        bins[hue * HUE_BINS / HUE_RANGE] += count;
    }
    let total: u64 = bins.iter().sum();
    if total == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let denominator = total as f64 + SUM_EPSILON;
    let entropy: f64 = bins
        .iter()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / denominator;
            -p * (p + LOG_EPSILON).log2()
        })
        .sum();
    entropy.max(0.0)
}

/// `lesion / leaf`, or 0 when the leaf is empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn area_ratio(lesion_pixels: u64, leaf_pixels: u64) -> f64 {
    if leaf_pixels == 0 {
        return 0.0;
    }
    lesion_pixels as f64 / leaf_pixels as f64
}

/// Mean circularity over contours with nonzero perimeter, or 0.
#[must_use]
pub fn average_circularity(contours: &[Contour]) -> f64 {
    let values: Vec<f64> = contours.iter().filter_map(Contour::circularity).collect();
    if values.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    values.iter().sum::<f64>() / n
}
