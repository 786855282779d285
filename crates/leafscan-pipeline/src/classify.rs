//! Condition classification: ordered threshold rules over a
//! [`FeatureSet`].
//!
//! This module defines the [`Classifier`] trait and the [`RuleProfile`]
//! enum that implements it. Each profile is a decision list: a table of
//! outcomes (label, confidence, recommendation) and an ordered list of
//! rules pointing into it. Rules are tried top to bottom; the first
//! match wins and the last rule of every profile always matches.
//!
//! The thresholds are calibration constants with no derivation behind
//! them. They are reproduced as-is, including the general profile's
//! overlapping hue bands.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::features::FeatureSet;

/// Condition categories across all profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionLabel {
    /// No significant lesions.
    Healthy,
    /// Fungal infection.
    Fungal,
    /// Bacterial infection.
    Bacterial,
    /// Pest damage or nutrient deficiency.
    PestOrDeficiency,
    /// Bacterial infection with strong evidence.
    BacterialConfirmed,
    /// Bacterial infection with weak evidence.
    BacterialProbable,
    /// Nothing detected.
    Undetected,
}

impl ConditionLabel {
    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Healthy => "Healthy",
            Self::Fungal => "Fungal",
            Self::Bacterial => "Bacterial",
            Self::PestOrDeficiency => "Pest/Deficiency",
            Self::BacterialConfirmed => "Bacterial (confirmed)",
            Self::BacterialProbable => "Bacterial (probable)",
            Self::Undetected => "Undetected",
        }
    }
}

impl fmt::Display for ConditionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The classifier's verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    /// Condition category.
    pub label: ConditionLabel,
    /// Fixed confidence of the matched rule, in `(0, 1]`.
    pub confidence: f64,
    /// Advice for the grower.
    pub recommendation: String,
}

/// One row of a profile's outcome table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    /// Condition category.
    pub label: ConditionLabel,
    /// Confidence reported with this label.
    pub confidence: f64,
    /// Advice reported with this label.
    pub recommendation: &'static str,
}

impl Outcome {
    fn diagnosis(&self) -> Diagnosis {
        Diagnosis {
            label: self.label,
            confidence: self.confidence,
            recommendation: self.recommendation.to_owned(),
        }
    }
}

/// One step of a decision list.
#[derive(Clone, Copy)]
pub struct Rule {
    /// Short description of the condition, for logs.
    pub description: &'static str,
    /// Whether the rule fires.
    pub matches: fn(&FeatureSet) -> bool,
    /// Index into the profile's outcome table.
    pub outcome: usize,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("description", &self.description)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

/// Trait for condition classifiers.
///
/// Implementations are total and deterministic: every feature set gets
/// a diagnosis, and the same features always get the same one.
pub trait Classifier {
    /// Classify one feature set.
    fn classify(&self, features: &FeatureSet) -> Diagnosis;
}

/// Selects which decision list classifies the features.
///
/// The profiles target different plant/disease scopes and are
/// alternatives, not layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleProfile {
    /// Healthy / fungal / bacterial / pest-or-deficiency.
    #[default]
    General,

    /// Mango, bacterial disease only: healthy / confirmed / probable.
    MangoBacterial,

    /// Mango, fungal versus bacterial: undetected / fungal / bacterial.
    MangoFungalBacterial,
}

impl RuleProfile {
    /// Every profile, in declaration order.
    pub const ALL: [Self; 3] = [
        Self::General,
        Self::MangoBacterial,
        Self::MangoFungalBacterial,
    ];

    /// Outcome table of this profile.
    #[must_use]
    pub fn outcomes(self) -> &'static [Outcome] {
        match self {
            Self::General => &GENERAL_OUTCOMES,
            Self::MangoBacterial => &MANGO_BACTERIAL_OUTCOMES,
            Self::MangoFungalBacterial => &MANGO_FUNGAL_BACTERIAL_OUTCOMES,
        }
    }

    /// Ordered decision list of this profile.
    #[must_use]
    pub fn rules(self) -> &'static [Rule] {
        match self {
            Self::General => &GENERAL_RULES,
            Self::MangoBacterial => &MANGO_BACTERIAL_RULES,
            Self::MangoFungalBacterial => &MANGO_FUNGAL_BACTERIAL_RULES,
        }
    }

    /// Short name, as accepted on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::MangoBacterial => "mango-bacterial",
            Self::MangoFungalBacterial => "mango-fungal-bacterial",
        }
    }
}

impl fmt::Display for RuleProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Classifier for RuleProfile {
    fn classify(&self, features: &FeatureSet) -> Diagnosis {
        let outcomes = self.outcomes();
        for rule in self.rules() {
            if (rule.matches)(features) {
                log::debug!("classify: {self} rule \"{}\" matched", rule.description);
                if let Some(outcome) = outcomes.get(rule.outcome) {
                    return outcome.diagnosis();
                }
            }
        }
        // Every table ends with a catch-all, so this is only reached if
        // a table is malformed.
        log::warn!("classify: no {self} rule matched");
        outcomes
            .last()
            .map_or_else(|| FALLBACK.diagnosis(), Outcome::diagnosis)
    }
}

const FALLBACK: Outcome = Outcome {
    label: ConditionLabel::Undetected,
    confidence: 0.5,
    recommendation: "No rule applied. Inspect the leaf manually.",
};

const fn always(_: &FeatureSet) -> bool {
    true
}

// General profile.

static GENERAL_OUTCOMES: [Outcome; 4] = [
    Outcome {
        label: ConditionLabel::Healthy,
        confidence: 1.0,
        recommendation: "The leaf is in good condition. Keep up routine care.",
    },
    Outcome {
        label: ConditionLabel::Fungal,
        confidence: 0.85,
        recommendation: "Apply a copper-based or chlorothalonil fungicide. Prune the diseased leaves.",
    },
    Outcome {
        label: ConditionLabel::Bacterial,
        confidence: 0.80,
        recommendation: "Avoid wetting the foliage. Apply a bactericide such as streptomycin. Improve air circulation.",
    },
    Outcome {
        label: ConditionLabel::PestOrDeficiency,
        confidence: 0.75,
        recommendation: "Check for insects. Apply a balanced NPK fertilizer, or calcium if the leaf tips are drying out.",
    },
];

fn general_healthy(f: &FeatureSet) -> bool {
    f.lesion_area_ratio < 0.02 || f.num_lesions == 0
}

fn general_fungal(f: &FeatureSet) -> bool {
    f.entropy > 0.7 && f.median_hue < 35.0 && f.lesion_area_ratio > 0.05
}

fn general_bacterial(f: &FeatureSet) -> bool {
    f.median_hue > 40.0
        && f.median_hue < 70.0
        && f.avg_circularity < 0.6
        && f.lesion_area_ratio > 0.03
}

static GENERAL_RULES: [Rule; 4] = [
    Rule {
        description: "area < 0.02 or no lesions",
        matches: general_healthy,
        outcome: 0,
    },
    Rule {
        description: "entropy > 0.7, hue < 35, area > 0.05",
        matches: general_fungal,
        outcome: 1,
    },
    Rule {
        description: "40 < hue < 70, circularity < 0.6, area > 0.03",
        matches: general_bacterial,
        outcome: 2,
    },
    Rule {
        description: "otherwise",
        matches: always,
        outcome: 3,
    },
];

// Mango, bacterial only.

static MANGO_BACTERIAL_OUTCOMES: [Outcome; 3] = [
    Outcome {
        label: ConditionLabel::Healthy,
        confidence: 0.95,
        recommendation: "No bacterial lesions found. Keep up routine care.",
    },
    Outcome {
        label: ConditionLabel::BacterialConfirmed,
        confidence: 0.85,
        recommendation: "Bacterial black spot is likely. Remove infected leaves and spray a copper-based bactericide.",
    },
    Outcome {
        label: ConditionLabel::BacterialProbable,
        confidence: 0.75,
        recommendation: "Early bacterial infection is possible. Monitor the tree and avoid overhead watering.",
    },
];

fn no_lesions_or_area_below_one_percent(f: &FeatureSet) -> bool {
    f.num_lesions == 0 || f.lesion_area_ratio < 0.01
}

fn mango_bacterial_confirmed(f: &FeatureSet) -> bool {
    f.median_hue < 40.0 && f.avg_circularity < 0.6 && f.lesion_area_ratio > 0.015
}

static MANGO_BACTERIAL_RULES: [Rule; 3] = [
    Rule {
        description: "no lesions or area < 0.01",
        matches: no_lesions_or_area_below_one_percent,
        outcome: 0,
    },
    Rule {
        description: "hue < 40, circularity < 0.6, area > 0.015",
        matches: mango_bacterial_confirmed,
        outcome: 1,
    },
    Rule {
        description: "otherwise",
        matches: always,
        outcome: 2,
    },
];

// Mango, fungal versus bacterial.

static MANGO_FUNGAL_BACTERIAL_OUTCOMES: [Outcome; 3] = [
    Outcome {
        label: ConditionLabel::Undetected,
        confidence: 0.5,
        recommendation: "No lesions detected. Retake the photo if symptoms are visible.",
    },
    Outcome {
        label: ConditionLabel::Fungal,
        confidence: 0.85,
        recommendation: "Anthracnose is likely. Prune infected parts and apply a fungicide such as mancozeb.",
    },
    Outcome {
        label: ConditionLabel::Bacterial,
        confidence: 0.75,
        recommendation: "Bacterial black spot is likely. Remove infected leaves and apply a copper-based bactericide.",
    },
];

fn mango_fungal(f: &FeatureSet) -> bool {
    f.median_hue < 30.0 && f.entropy > 0.3 && f.avg_circularity < 0.5
}

static MANGO_FUNGAL_BACTERIAL_RULES: [Rule; 3] = [
    Rule {
        description: "no lesions or area < 0.01",
        matches: no_lesions_or_area_below_one_percent,
        outcome: 0,
    },
    Rule {
        description: "hue < 30, entropy > 0.3, circularity < 0.5",
        matches: mango_fungal,
        outcome: 1,
    },
    Rule {
        description: "otherwise",
        matches: always,
        outcome: 2,
    },
];
