//! Integration test: encode a synthetic spotted leaf, run it through the
//! full pipeline, and export every report format.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use image::{ImageEncoder, Rgb};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_ellipse_mut};
use leafscan_export::{ReportMetadata, SvgMetadata};
use leafscan_pipeline::{ConditionLabel, PipelineConfig, RgbImage};

fn spotted_leaf_png() -> Vec<u8> {
    let mut image = RgbImage::from_pixel(200, 300, Rgb([255, 255, 255]));
    draw_filled_ellipse_mut(&mut image, (100, 150), 50, 110, Rgb([40, 160, 40]));
    draw_filled_circle_mut(&mut image, (100, 100), 10, Rgb([120, 60, 20]));
    draw_filled_circle_mut(&mut image, (90, 200), 10, Rgb([120, 60, 20]));

    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
    buf
}

#[test]
fn synthetic_leaf_pipeline_to_reports() {
    let bytes = spotted_leaf_png();
    let image = leafscan_pipeline::decode(&bytes).expect("synthetic PNG should decode");

    let config = PipelineConfig::default();
    let result = leafscan_pipeline::analyze(image, &config);
    eprintln!(
        "Pipeline found {} lesions on {} leaf pixels, diagnosis {}",
        result.lesions.count(),
        result.leaf.leaf_area(),
        result.diagnosis.label,
    );
    assert_eq!(result.diagnosis.label, ConditionLabel::PestOrDeficiency);

    // SVG.
    let config_json = serde_json::to_string(&config).unwrap();
    let svg = leafscan_export::to_svg(
        &result,
        &SvgMetadata {
            title: Some("spotted-leaf"),
            description: None,
            config_json: Some(&config_json),
        },
    );
    assert!(svg.contains("<svg"));
    assert!(svg.contains("</svg>"));
    assert_eq!(svg.matches("<path").count(), 1);
    assert_eq!(svg.matches("<circle").count(), 2);
    assert!(svg.contains("<title>spotted-leaf</title>"));

    // Text report.
    let summary = result.summary();
    let report = leafscan_export::text_report(
        &summary,
        &ReportMetadata {
            source: Some("spotted-leaf.png"),
            ..ReportMetadata::default()
        },
    );
    assert!(report.contains("Source: spotted-leaf.png"));
    assert!(report.contains("Diagnosis: Pest/Deficiency"));
    assert!(report.contains("Confidence: 75%"));
    assert!(report.contains("Num Lesions            : 2"));

    // Healthy comparison: two spots covering a few percent of the leaf.
    let rows = leafscan_export::compare_to_healthy(&summary.features);
    let flagged: Vec<&str> = rows.iter().filter(|r| r.abnormal).map(|r| r.metric).collect();
    assert_eq!(flagged, vec!["Lesion / leaf area", "Lesion count"]);
    let table = leafscan_export::comparison_table(&rows);
    assert_eq!(table.lines().filter(|l| l.starts_with('!')).count(), 2);
}

#[test]
fn bare_background_exports_cleanly() {
    let image = RgbImage::from_pixel(64, 48, Rgb([250, 250, 250]));
    let result = leafscan_pipeline::analyze(image, &PipelineConfig::default());
    assert!(result.leaf.is_empty());

    let svg = leafscan_export::to_svg(&result, &SvgMetadata::default());
    assert!(!svg.contains("<path"));
    assert!(svg.contains("Healthy (100%)"));

    let report = leafscan_export::text_report(&result.summary(), &ReportMetadata::default());
    assert!(report.contains("no leaf was found"));
    assert!(report.contains("Diagnosis: Healthy"));
}
