//! SVG export serializer.
//!
//! Renders an analysis as a vector overlay in image pixel coordinates
//! using the [`svg`] crate for document construction, XML escaping, and
//! path data formatting:
//!
//! - `<g id="leaf">`: the leaf contour as one closed `<path>`
//! - `<g id="lesions">`: one hollow `<circle>` per lesion, at the same
//!   place the raster overlay marks it
//! - `<text id="diagnosis">`: label and confidence caption
//!
//! Optional [`SvgMetadata`] embeds `<title>`, `<desc>`, and the
//! configuration JSON.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Description, Element, Group, Path, Title};
use svg::node::{Node, Text, Value};

use leafscan_pipeline::overlay::{
    LEAF_OUTLINE_COLOR, LEAF_OUTLINE_THICKNESS, LESION_MARKER_COLOR, LESION_MARKER_THICKNESS,
    marker_geometry,
};
use leafscan_pipeline::{AnalysisResult, Contour};

/// Namespace of the `<leafscan:analysis>` metadata element.
const METADATA_NAMESPACE: &str = "https://github.com/altendky/leafscan/ns/1";

/// Caption font size in pixels.
const CAPTION_FONT_SIZE: u32 = 14;

/// Caption distance from the bottom-left corner in pixels.
const CAPTION_MARGIN: u32 = 8;

/// Metadata to embed in the SVG document.
///
/// All fields are optional. Text values are XML-escaped automatically
/// by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source image filename (without extension).
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized pipeline configuration, emitted inside `<metadata>`
    /// wrapped in a namespaced `<leafscan:analysis>` element so the
    /// file records how it was produced.
    pub config_json: Option<&'a str>,
}

/// Build a closed SVG path `d` attribute from a contour.
///
/// Uses `M` for the first point, `L` for the rest, and `Z` to close.
/// Returns an empty string for contours with fewer than 2 points.
///
/// # Examples
///
/// ```
/// use leafscan_pipeline::{Contour, Point};
/// use leafscan_export::build_contour_data;
///
/// let contour = Contour::new(vec![
///     Point::new(10, 20),
///     Point::new(30, 20),
///     Point::new(30, 40),
/// ]);
/// let d = build_contour_data(&contour);
/// assert!(d.starts_with("M10,20 L30,20 L30,40"));
/// ```
#[must_use]
pub fn build_contour_data(contour: &Contour) -> String {
    let points = contour.points();
    let Some((first, rest)) = points.split_first() else {
        return String::new();
    };
    if rest.is_empty() {
        return String::new();
    }

    let mut data = Data::new().move_to((f64::from(first.x), f64::from(first.y)));
    for p in rest {
        data = data.line_to((f64::from(p.x), f64::from(p.y)));
    }
    String::from(Value::from(data.close()))
}

/// `#rrggbb` for an overlay color.
fn hex([r, g, b]: [u8; 3]) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Serialize an analysis into an SVG document.
///
/// The document is sized to the image (`width`, `height`, and
/// `viewBox` in pixels), so it can be laid over the photograph.
#[must_use]
pub fn to_svg(result: &AnalysisResult, metadata: &SvgMetadata<'_>) -> String {
    let w = result.dimensions.width;
    let h = result.dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut analysis_el = Element::new("leafscan:analysis");
        analysis_el.assign("xmlns:leafscan", METADATA_NAMESPACE);
        analysis_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(analysis_el);
        doc = doc.add(metadata_el);
    }

    let mut leaf = Group::new().set("id", "leaf");
    if let Some(contour) = &result.leaf.contour {
        let d = build_contour_data(contour);
        if !d.is_empty() {
            leaf = leaf.add(
                Path::new()
                    .set("d", d)
                    .set("fill", "none")
                    .set("stroke", hex(LEAF_OUTLINE_COLOR.0))
                    .set("stroke-width", LEAF_OUTLINE_THICKNESS),
            );
        }
    }
    doc = doc.add(leaf);

    let mut lesions = Group::new()
        .set("id", "lesions")
        .set("fill", "none")
        .set("stroke", hex(LESION_MARKER_COLOR.0))
        .set("stroke-width", LESION_MARKER_THICKNESS);
    for ((cx, cy), r) in result.lesions.contours.iter().filter_map(marker_geometry) {
        lesions = lesions.add(Circle::new().set("cx", cx).set("cy", cy).set("r", r));
    }
    doc = doc.add(lesions);

    let diagnosis = &result.diagnosis;
    let caption = format!(
        "{} ({:.0}%)",
        diagnosis.label,
        diagnosis.confidence * 100.0
    );
    let mut text_el = Element::new("text");
    text_el.assign("id", "diagnosis");
    text_el.assign("x", CAPTION_MARGIN);
    text_el.assign("y", h.saturating_sub(CAPTION_MARGIN));
    text_el.assign("font-family", "sans-serif");
    text_el.assign("font-size", CAPTION_FONT_SIZE);
    text_el.append(Text::new(caption));
    doc = doc.add(text_el);

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Rgb;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_ellipse_mut};
    use leafscan_pipeline::{PipelineConfig, Point, RgbImage, analyze};

    use super::*;

    fn no_meta() -> SvgMetadata<'static> {
        SvgMetadata::default()
    }

    fn spotted_leaf() -> AnalysisResult {
        let mut image = RgbImage::from_pixel(200, 300, Rgb([255, 255, 255]));
        draw_filled_ellipse_mut(&mut image, (100, 150), 50, 110, Rgb([40, 160, 40]));
        draw_filled_circle_mut(&mut image, (100, 100), 10, Rgb([120, 60, 20]));
        draw_filled_circle_mut(&mut image, (90, 200), 10, Rgb([120, 60, 20]));
        analyze(image, &PipelineConfig::default())
    }

    fn blank() -> AnalysisResult {
        analyze(
            RgbImage::from_pixel(100, 50, Rgb([255, 255, 255])),
            &PipelineConfig::default(),
        )
    }

    #[test]
    fn contour_data_degenerate() {
        assert_eq!(build_contour_data(&Contour::new(vec![])), "");
        assert_eq!(build_contour_data(&Contour::new(vec![Point::new(1, 1)])), "");
    }

    #[test]
    fn contour_data_two_points() {
        let c = Contour::new(vec![Point::new(5, 10), Point::new(15, 20)]);
        let d = build_contour_data(&c);
        assert!(d.starts_with("M5,10 L15,20"));
        assert!(d.to_lowercase().ends_with('z'), "path not closed: {d}");
    }

    #[test]
    fn hex_formats_overlay_colors() {
        assert_eq!(hex(LEAF_OUTLINE_COLOR.0), "#00ff00");
        assert_eq!(hex(LESION_MARKER_COLOR.0), "#ff0000");
    }

    #[test]
    fn blank_image_has_empty_layers_and_caption() {
        let svg = to_svg(&blank(), &no_meta());
        assert!(svg.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(svg.contains(r#"width="100""#));
        assert!(svg.contains(r#"height="50""#));
        assert!(svg.contains(r#"viewBox="0 0 100 50""#));
        assert!(!svg.contains("<path"));
        assert!(!svg.contains("<circle"));
        assert!(svg.contains("Healthy (100%)"));
        assert!(svg.contains(r#"y="42""#));
    }

    #[test]
    fn leaf_and_lesions_are_drawn() {
        let svg = to_svg(&spotted_leaf(), &no_meta());
        assert_eq!(svg.matches("<path").count(), 1);
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.contains(r##"stroke="#00ff00""##));
        assert!(svg.contains(r##"stroke="#ff0000""##));
        assert!(svg.contains("Pest/Deficiency (75%)"));
    }

    #[test]
    fn leaf_layer_precedes_lesions_and_caption() {
        let svg = to_svg(&spotted_leaf(), &no_meta());
        let leaf = svg.find(r#"id="leaf""#).unwrap();
        let lesions = svg.find(r#"id="lesions""#).unwrap();
        let caption = svg.find(r#"id="diagnosis""#).unwrap();
        assert!(leaf < lesions);
        assert!(lesions < caption);
    }

    #[test]
    fn title_and_desc_emitted_when_present() {
        let meta = SvgMetadata {
            title: Some("leaf-07"),
            description: Some("profile=general"),
            ..SvgMetadata::default()
        };
        let svg = to_svg(&blank(), &meta);
        assert!(svg.contains("<title>leaf-07</title>"));
        assert!(svg.contains("<desc>profile=general</desc>"));
        assert!(!svg.contains("<metadata>"));
    }

    #[test]
    fn title_and_desc_omitted_when_none() {
        let svg = to_svg(&blank(), &no_meta());
        assert!(!svg.contains("<title>"));
        assert!(!svg.contains("<desc>"));
    }

    #[test]
    fn special_characters_in_title_are_escaped() {
        let meta = SvgMetadata {
            title: Some("A <B> & C"),
            ..SvgMetadata::default()
        };
        let svg = to_svg(&blank(), &meta);
        assert!(svg.contains("<title>A &lt;B&gt; &amp; C</title>"));
    }

    #[test]
    fn config_json_is_embedded() {
        let meta = SvgMetadata {
            config_json: Some(r#"{"profile":"general"}"#),
            ..SvgMetadata::default()
        };
        let svg = to_svg(&blank(), &meta);
        assert!(svg.contains("<metadata>"));
        assert!(svg.contains("</metadata>"));
        assert!(svg.contains(
            r#"<leafscan:analysis xmlns:leafscan="https://github.com/altendky/leafscan/ns/1">"#
        ));
        assert!(svg.contains("</leafscan:analysis>"));
    }
}
