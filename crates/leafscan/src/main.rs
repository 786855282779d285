//! leafscan: screen a single leaf photograph for disease.
//!
//! Runs the four-stage pipeline (segment, lesions, features, classify)
//! on one image and prints the diagnosis. Optional outputs:
//!
//! - `--overlay`: annotated PNG (leaf outline plus lesion markers)
//! - `--svg`: the same annotations as a vector document
//! - `--report`: plain-text report file
//! - `--compare`: feature comparison with a healthy leaf
//! - `--diagnostics`: per-stage timings and counts
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin leafscan -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use leafscan_export::{ComparisonRow, ReportMetadata, SvgMetadata};
use leafscan_pipeline::diagnostics::{Clock, PipelineDiagnostics};
use leafscan_pipeline::lesion::{DEFAULT_A_STAR_MIN, DEFAULT_LESION_HUE_MAX, DEFAULT_LESION_HUE_MIN};
use leafscan_pipeline::segment::{
    DEFAULT_LEAF_HUE_MAX, DEFAULT_LEAF_HUE_MIN, DEFAULT_MIN_AREA_RATIO, DEFAULT_SAT_MIN,
    DEFAULT_VAL_MIN,
};
use leafscan_pipeline::{
    AnalysisResult, LesionConfig, LesionStrategyKind, PipelineConfig, RuleProfile, SegmentConfig,
};

/// Rule-based leaf disease screening from a single photograph.
///
/// Segments the leaf, finds lesions on it, measures five features, and
/// classifies them with a rule profile.
#[derive(Parser)]
#[command(name = "leafscan", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Lower leaf hue bound (0-179).
    #[arg(long, default_value_t = DEFAULT_LEAF_HUE_MIN)]
    leaf_hue_min: u8,

    /// Upper leaf hue bound (0-179).
    #[arg(long, default_value_t = DEFAULT_LEAF_HUE_MAX)]
    leaf_hue_max: u8,

    /// Minimum leaf saturation (0-255).
    #[arg(long, default_value_t = DEFAULT_SAT_MIN)]
    sat_min: u8,

    /// Minimum leaf value (0-255).
    #[arg(long, default_value_t = DEFAULT_VAL_MIN)]
    val_min: u8,

    /// Minimum leaf area as a fraction of the image (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_MIN_AREA_RATIO)]
    min_area_ratio: f64,

    /// Lesion candidate strategy.
    #[arg(long, value_enum, default_value_t = Strategy::Hue)]
    lesion_strategy: Strategy,

    /// Lower lesion hue bound (hue strategy).
    #[arg(long, default_value_t = DEFAULT_LESION_HUE_MIN)]
    lesion_hue_min: u8,

    /// Upper lesion hue bound (hue strategy).
    #[arg(long, default_value_t = DEFAULT_LESION_HUE_MAX)]
    lesion_hue_max: u8,

    /// a* threshold (lab strategy).
    #[arg(long, default_value_t = DEFAULT_A_STAR_MIN)]
    a_star_min: f64,

    /// Minimum lesion area in pixels.
    ///
    /// Defaults to the value the chosen strategy was calibrated with
    /// (150 for hue, 200 for lab).
    #[arg(long)]
    min_lesion_area: Option<f64>,

    /// Classification rule profile.
    #[arg(long, value_enum, default_value_t = Profile::General)]
    profile: Profile,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `PipelineConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Output the analysis summary as JSON instead of a text report.
    #[arg(long)]
    json: bool,

    /// Write the annotated overlay to a PNG file.
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Write the annotations as an SVG file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write the text report to a file.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Include a comparison with healthy-leaf reference values (a
    /// `comparison` array under `--json`).
    #[arg(long)]
    compare: bool,

    /// Print per-stage timings and counts.
    #[arg(long)]
    diagnostics: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Lesion strategy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    /// Hue band in HSV space.
    Hue,
    /// Red-leaning a* in CIE L*a*b*.
    Lab,
}

impl From<Strategy> for LesionStrategyKind {
    fn from(s: Strategy) -> Self {
        match s {
            Strategy::Hue => Self::HueThreshold,
            Strategy::Lab => Self::LabAStar,
        }
    }
}

/// Rule profile selection.
#[derive(Clone, Copy, ValueEnum)]
enum Profile {
    /// Healthy, fungal, bacterial, or pest/deficiency.
    General,
    /// Mango bacterial black spot, confirmed or probable.
    MangoBacterial,
    /// Mango fungal and bacterial diseases.
    MangoFungalBacterial,
}

impl From<Profile> for RuleProfile {
    fn from(p: Profile) -> Self {
        match p {
            Profile::General => Self::General,
            Profile::MangoBacterial => Self::MangoBacterial,
            Profile::MangoFungalBacterial => Self::MangoFungalBacterial,
        }
    }
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Either way the result is
/// validated before use.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, String> {
    let config = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        let strategy = LesionStrategyKind::from(cli.lesion_strategy);
        PipelineConfig {
            segmentation: SegmentConfig {
                hue_min: cli.leaf_hue_min,
                hue_max: cli.leaf_hue_max,
                sat_min: cli.sat_min,
                val_min: cli.val_min,
                min_area_ratio: cli.min_area_ratio,
            },
            lesion: LesionConfig {
                hue_min: cli.lesion_hue_min,
                hue_max: cli.lesion_hue_max,
                a_star_min: cli.a_star_min,
                min_area: cli
                    .min_lesion_area
                    .unwrap_or_else(|| strategy.default_min_area()),
                ..LesionConfig::for_strategy(strategy)
            },
            profile: cli.profile.into(),
        }
    };
    config
        .validate()
        .map_err(|e| format!("Invalid configuration: {e}"))?;
    Ok(config)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image = match std::fs::read(&cli.image_path)
        .map_err(|e| e.to_string())
        .and_then(|bytes| leafscan_pipeline::decode(&bytes).map_err(|e| e.to_string()))
    {
        Ok(image) => image,
        Err(e) => {
            eprintln!("could not read image {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    log::info!(
        "analyzing {} ({}x{}), profile {}",
        cli.image_path.display(),
        image.width(),
        image.height(),
        config.profile,
    );
    if !leafscan_pipeline::validate::looks_like_leaf(&image) {
        log::warn!(
            "{} has little green in it; the photo may not show a leaf",
            cli.image_path.display()
        );
    }

    let config_json = serde_json::to_string(&config).ok();
    let (result, diagnostics) = if cli.diagnostics {
        let (result, diagnostics) =
            leafscan_pipeline::diagnostics::analyze_with_diagnostics(image, config, &StdClock);
        (result, Some(diagnostics))
    } else {
        (leafscan_pipeline::analyze(image, &config), None)
    };

    let summary = result.summary();
    let source = file_name(&cli.image_path);
    let report = leafscan_export::text_report(
        &summary,
        &ReportMetadata {
            source: Some(&source),
            ..ReportMetadata::default()
        },
    );

    if cli.json {
        let mut value = match serde_json::to_value(&summary) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("Error serializing summary: {e}");
                return ExitCode::FAILURE;
            }
        };
        if let Some(obj) = value.as_object_mut() {
            if let Some(ref d) = diagnostics {
                match serde_json::to_value(d) {
                    Ok(v) => {
                        obj.insert("diagnostics".to_string(), v);
                    }
                    Err(e) => {
                        eprintln!("Error serializing diagnostics: {e}");
                        return ExitCode::FAILURE;
                    }
                }
            }
            if cli.compare {
                obj.insert(
                    "comparison".to_string(),
                    comparison_json(&leafscan_export::compare_to_healthy(&summary.features)),
                );
            }
        }
        match serde_json::to_string_pretty(&value) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing summary: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{report}");
        if cli.compare {
            println!();
            println!("Comparison with a healthy leaf");
            print!(
                "{}",
                leafscan_export::comparison_table(&leafscan_export::compare_to_healthy(
                    &summary.features
                ))
            );
        }
        if let Some(ref d) = diagnostics {
            println!();
            println!("{}", d.report());
        }
    }

    let mut ok = true;
    if let Some(ref path) = cli.overlay {
        ok &= write_overlay(&result, path);
    }
    if let Some(ref path) = cli.svg {
        ok &= write_svg(&result, path, &source, config_json.as_deref());
    }
    if let Some(ref path) = cli.report {
        ok &= write_text(path, &report, "Report");
    }

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Healthy-leaf comparison rows as a JSON array.
fn comparison_json(rows: &[ComparisonRow]) -> serde_json::Value {
    rows.iter()
        .map(|row| {
            serde_json::json!({
                "metric": row.metric,
                "actual": row.actual,
                "healthy": row.healthy,
                "abnormal": row.abnormal,
            })
        })
        .collect()
}

/// File name of `path` for report headers, falling back to the full path.
fn file_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

fn write_overlay(result: &AnalysisResult, path: &Path) -> bool {
    match result
        .combined_overlay()
        .save_with_format(path, image::ImageFormat::Png)
    {
        Ok(()) => {
            eprintln!("Overlay written to {}", path.display());
            true
        }
        Err(e) => {
            eprintln!("Error writing overlay to {}: {e}", path.display());
            false
        }
    }
}

fn write_svg(result: &AnalysisResult, path: &Path, source: &str, config_json: Option<&str>) -> bool {
    let title = Path::new(source)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("leafscan");
    let desc = format!(
        "{} ({:.0}% confidence, {} profile)",
        result.diagnosis.label,
        result.diagnosis.confidence * 100.0,
        result.profile,
    );
    let metadata = SvgMetadata {
        title: Some(title),
        description: Some(&desc),
        config_json,
    };
    let svg = leafscan_export::to_svg(result, &metadata);
    write_text(path, &svg, "SVG")
}

fn write_text(path: &Path, contents: &str, what: &str) -> bool {
    match std::fs::write(path, contents) {
        Ok(()) => {
            eprintln!(
                "{what} written to {} ({} bytes)",
                path.display(),
                contents.len(),
            );
            true
        }
        Err(e) => {
            eprintln!("Error writing {what} to {}: {e}", path.display());
            false
        }
    }
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
