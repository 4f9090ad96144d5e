//! Page display scaling and raster export.
//!
//! The on-screen stage renders the page at a display scale while every
//! element keeps native-unit geometry; export inverts that scale so
//! the output bitmap always has the page's native dimensions. The
//! raster pipeline goes through an SVG intermediate rasterized with
//! resvg/tiny-skia.

use std::fmt::Write;

use collage_core::{ElementKind, Page, TextAlign};

use crate::cache::SharedPreviewCache;
use crate::error::{RenderError, RenderResult};
use crate::texture::to_png_data_uri;

/// Largest on-screen extent of the stage, in native units.
pub const MAX_DISPLAY_DIM: f32 = 600.0;

/// Compute the display scale for a page: the stage shows
/// `page · scale` on screen, never upscaling beyond 1.
///
/// Degenerate page dimensions yield 1.0; export rejects them
/// separately.
#[must_use]
pub fn display_scale(page_width: f32, page_height: f32) -> f32 {
    if page_width <= 0.0 || page_height <= 0.0 {
        return 1.0;
    }
    1.0_f32
        .min(MAX_DISPLAY_DIM / page_width)
        .min(MAX_DISPLAY_DIM / page_height)
}

/// Configuration for page export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// The display scale currently applied to the on-screen stage.
    /// Export rasterizes at pixel ratio `1/display_scale`, so the
    /// output always lands at native page resolution.
    pub display_scale: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { display_scale: 1.0 }
    }
}

/// Exports a [`Page`] to a PNG at native resolution.
///
/// Export never mutates the page; media pixels come from the shared
/// preview cache and assets without a cached texture render as
/// placeholders.
pub struct PageExporter {
    config: ExportConfig,
}

impl PageExporter {
    /// Create a new exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }

    /// Export the page to PNG bytes at `page.width x page.height`
    /// pixels, regardless of the current display scale.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Export`] if the stage is not ready
    /// (degenerate page dimensions) or rasterization/encoding fails.
    /// Callers treat the error as a no-op; the editor keeps running.
    pub fn export_png(&self, page: &Page, cache: &SharedPreviewCache) -> RenderResult<Vec<u8>> {
        let svg_string = self.render_to_svg(page, cache)?;
        let pixmap = rasterize_svg(&svg_string)?;
        pixmap
            .encode_png()
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))
    }

    /// Render the page to an SVG string sized at native resolution.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Export`] if the page has degenerate
    /// dimensions.
    pub fn render_to_svg(&self, page: &Page, cache: &SharedPreviewCache) -> RenderResult<String> {
        let (out_w, out_h) = self.output_dimensions(page)?;

        let mut svg = String::with_capacity(4096);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {} {}\">",
            page.width, page.height,
        );

        let background = escape_xml(&page.background);
        let _ = write!(
            svg,
            "<rect width=\"100%\" height=\"100%\" fill=\"{background}\"/>",
        );

        for element in page.elements() {
            render_element_svg(&mut svg, element, cache);
        }

        svg.push_str("</svg>");
        Ok(svg)
    }

    /// Output dimensions in pixels: the scaled stage rasterized at
    /// pixel ratio `1/scale`, which lands back on the native size.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn output_dimensions(&self, page: &Page) -> RenderResult<(u32, u32)> {
        if page.width < 1.0 || page.height < 1.0 {
            return Err(RenderError::Export(format!(
                "stage not ready: page is {}x{}",
                page.width, page.height
            )));
        }
        let scale = self.config.display_scale;
        if scale <= 0.0 {
            return Err(RenderError::Export(format!("invalid display scale {scale}")));
        }

        let pixel_ratio = 1.0 / scale;
        let out_w = (page.width * scale * pixel_ratio).round() as u32;
        let out_h = (page.height * scale * pixel_ratio).round() as u32;
        Ok((out_w.max(1), out_h.max(1)))
    }
}

/// Render a single element to SVG, switching exhaustively over the
/// element kind.
fn render_element_svg(
    svg: &mut String,
    element: &collage_core::Element,
    cache: &SharedPreviewCache,
) {
    let g = &element.geometry;

    let rotated = g.rotation != 0.0;
    if rotated {
        let _ = write!(
            svg,
            "<g transform=\"rotate({} {} {})\">",
            g.rotation, g.x, g.y,
        );
    }

    match &element.kind {
        ElementKind::Text {
            content,
            font_size,
            font_family,
            color,
            align,
        } => {
            let fill = escape_xml(color);
            let family = font_family.as_css();
            let (anchor, text_x) = match align {
                TextAlign::Left => ("start", g.x),
                TextAlign::Center => ("middle", g.x + g.width / 2.0),
                TextAlign::Right => ("end", g.x + g.width),
            };
            let line_height = font_size * 1.2;
            for (i, line) in content.split('\n').enumerate() {
                #[allow(clippy::cast_precision_loss)]
                let line_y = g.y + font_size + i as f32 * line_height;
                let escaped = escape_xml(line);
                let _ = write!(
                    svg,
                    "<text x=\"{text_x}\" y=\"{line_y}\" font-size=\"{font_size}\" fill=\"{fill}\" font-family=\"{family}\" text-anchor=\"{anchor}\">{escaped}</text>",
                );
            }
        }

        ElementKind::Image { asset_id, .. } | ElementKind::Video { asset_id, .. } => {
            let data_uri = cache
                .get(asset_id)
                .and_then(|texture| to_png_data_uri(&texture).ok());
            match data_uri {
                Some(href) => {
                    let _ = write!(
                        svg,
                        "<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"none\" href=\"{href}\"/>",
                        g.x, g.y, g.width, g.height,
                    );
                }
                None => {
                    // Not yet available is not an error; draw a
                    // neutral placeholder.
                    let _ = write!(
                        svg,
                        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#e0e0e0\" stroke=\"#999\" stroke-width=\"1\"/>",
                        g.x, g.y, g.width, g.height,
                    );
                }
            }
        }
    }

    if rotated {
        svg.push_str("</g>");
    }
}

/// Rasterize an SVG string to a tiny-skia Pixmap.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn rasterize_svg(svg_string: &str) -> RenderResult<tiny_skia::Pixmap> {
    let mut opt = usvg::Options::default();
    // Text nodes need a populated font database or they are dropped
    // during conversion.
    opt.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(svg_string, &opt)
        .map_err(|e| RenderError::Export(format!("SVG parsing failed: {e}")))?;

    let px_w = tree.size().width() as u32;
    let px_h = tree.size().height() as u32;

    let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
        .ok_or_else(|| RenderError::Export("Failed to create pixmap".to_string()))?;

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    Ok(pixmap)
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::create_solid_color;
    use collage_core::{Asset, AssetKind, Element, ElementKind, FontFamily, Geometry};
    use image::GenericImageView;

    fn photo_asset(id: &str) -> Asset {
        Asset {
            id: id.to_string(),
            kind: AssetKind::Photo,
            storage_path: format!("uploads/{id}.jpg"),
            original_filename: None,
        }
    }

    fn page_with_text(content: &str) -> Page {
        let mut page = Page::new(200.0, 100.0);
        page.add_element(
            ElementKind::Text {
                content: content.to_string(),
                font_size: 16.0,
                font_family: FontFamily::SansSerif,
                color: "#1e293b".to_string(),
                align: TextAlign::Left,
            },
            120.0,
            30.0,
        );
        page
    }

    fn png_dimensions(png: &[u8]) -> (u32, u32) {
        image::load_from_memory(png).expect("decode png").dimensions()
    }

    #[test]
    fn test_display_scale() {
        assert_eq!(display_scale(600.0, 600.0), 1.0);
        assert_eq!(display_scale(400.0, 300.0), 1.0);
        assert_eq!(display_scale(1200.0, 600.0), 0.5);
        assert_eq!(display_scale(1080.0, 1920.0), 600.0 / 1920.0);
        assert_eq!(display_scale(0.0, 100.0), 1.0);
    }

    #[test]
    fn test_export_native_dimensions_at_full_scale() {
        let page = page_with_text("Test");
        let exporter = PageExporter::with_defaults();
        let png = exporter
            .export_png(&page, &SharedPreviewCache::new())
            .expect("export");
        assert_eq!(png_dimensions(&png), (200, 100));
    }

    #[test]
    fn test_export_native_dimensions_at_half_scale() {
        let page = page_with_text("Test");
        let exporter = PageExporter::new(ExportConfig {
            display_scale: 0.5,
        });
        let png = exporter
            .export_png(&page, &SharedPreviewCache::new())
            .expect("export");
        // Display scale is a view transform only.
        assert_eq!(png_dimensions(&png), (200, 100));
    }

    #[test]
    fn test_export_rasterizes_text_glyphs() {
        let mut page = Page::new(100.0, 60.0);
        let id = page.add_element(
            ElementKind::Text {
                content: "MMMMMMMM".to_string(),
                font_size: 40.0,
                font_family: FontFamily::SansSerif,
                color: "#000000".to_string(),
                align: TextAlign::Left,
            },
            90.0,
            50.0,
        );
        page.update_element(id, |el| {
            el.geometry.x = 5.0;
            el.geometry.y = 5.0;
        })
        .expect("update");

        let exporter = PageExporter::with_defaults();
        let png = exporter
            .export_png(&page, &SharedPreviewCache::new())
            .expect("export");

        // Black glyphs on the white background must leave dark pixels.
        let img = image::load_from_memory(&png).expect("decode png").to_rgba8();
        let dark = img.pixels().filter(|p| p.0[0] < 128).count();
        assert!(dark > 0, "text did not rasterize: no dark pixels in export");
    }

    #[test]
    fn test_export_empty_page() {
        let page = Page::new(50.0, 50.0);
        let exporter = PageExporter::with_defaults();
        let png = exporter
            .export_png(&page, &SharedPreviewCache::new())
            .expect("export");
        assert_eq!(&png[0..4], &[137, 80, 78, 71]);
    }

    #[test]
    fn test_export_rejects_degenerate_page() {
        let page = Page::new(0.0, 100.0);
        let exporter = PageExporter::with_defaults();
        let result = exporter.export_png(&page, &SharedPreviewCache::new());
        assert!(matches!(result, Err(RenderError::Export(_))));
    }

    #[test]
    fn test_svg_contains_background_and_text() {
        let mut page = page_with_text("A < B & C");
        page.background = "#abcdef".to_string();

        let exporter = PageExporter::with_defaults();
        let svg = exporter
            .render_to_svg(&page, &SharedPreviewCache::new())
            .expect("svg");
        assert!(svg.contains("fill=\"#abcdef\""));
        assert!(svg.contains("A &lt; B &amp; C"));
        assert!(svg.contains("font-family=\"sans-serif\""));
        assert!(svg.contains("text-anchor=\"start\""));
    }

    #[test]
    fn test_svg_multiline_text_alignment() {
        let mut page = Page::new(400.0, 400.0);
        page.add_element(
            ElementKind::Text {
                content: "one\ntwo".to_string(),
                font_size: 20.0,
                font_family: FontFamily::Serif,
                color: "#000000".to_string(),
                align: TextAlign::Center,
            },
            100.0,
            60.0,
        );
        let exporter = PageExporter::with_defaults();
        let svg = exporter
            .render_to_svg(&page, &SharedPreviewCache::new())
            .expect("svg");
        assert_eq!(svg.matches("<text").count(), 2);
        assert!(svg.contains("text-anchor=\"middle\""));
    }

    #[test]
    fn test_svg_uncached_media_renders_placeholder() {
        let mut page = Page::new(400.0, 400.0);
        page.add_media_element(&photo_asset("p1"), None, None)
            .expect("add media");

        let exporter = PageExporter::with_defaults();
        let svg = exporter
            .render_to_svg(&page, &SharedPreviewCache::new())
            .expect("svg");
        assert!(svg.contains("fill=\"#e0e0e0\""));
        assert!(!svg.contains("<image"));
    }

    #[test]
    fn test_svg_cached_media_embeds_data_uri() {
        let mut page = Page::new(400.0, 400.0);
        page.add_media_element(&photo_asset("p1"), None, Some((40, 30)))
            .expect("add media");

        let cache = SharedPreviewCache::new();
        let texture = create_solid_color(40, 30, 10, 20, 30, 255);
        let uri = to_png_data_uri(&texture).expect("uri");
        // Seed through the decode path the preloader uses.
        let b64 = uri.trim_start_matches("data:image/png;base64,");
        use base64::Engine;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(b64)
            .expect("b64");
        cache.insert_decoded("p1", &bytes).expect("insert");

        let exporter = PageExporter::with_defaults();
        let svg = exporter.render_to_svg(&page, &cache).expect("svg");
        assert!(svg.contains("href=\"data:image/png;base64,"));
        assert!(svg.contains("preserveAspectRatio=\"none\""));
    }

    #[test]
    fn test_svg_rotated_element_wrapped_in_group() {
        let el = Element::new(ElementKind::Text {
            content: "tilted".to_string(),
            font_size: 14.0,
            font_family: FontFamily::Monospace,
            color: "#333333".to_string(),
            align: TextAlign::Right,
        })
        .with_geometry(Geometry {
            x: 50.0,
            y: 60.0,
            width: 100.0,
            height: 40.0,
            rotation: 30.0,
        });
        let mut svg = String::new();
        render_element_svg(&mut svg, &el, &SharedPreviewCache::new());
        assert!(svg.starts_with("<g transform=\"rotate(30 50 60)\">"));
        assert!(svg.ends_with("</g>"));
        assert!(svg.contains("text-anchor=\"end\""));
    }

    #[test]
    fn test_export_does_not_mutate_page() {
        let page = page_with_text("unchanged");
        let before = page.elements().to_vec();

        let exporter = PageExporter::with_defaults();
        let _ = exporter
            .export_png(&page, &SharedPreviewCache::new())
            .expect("export");

        assert_eq!(page.elements().len(), before.len());
        assert_eq!(page.elements()[0].geometry, before[0].geometry);
    }
}
