//! The page scene graph: a fixed-size canvas holding ordered elements.
//!
//! Paint order equals vector order; `add_*` appends at the end (top of
//! the paint order) and `update_element` never moves an element within
//! the sequence.

use crate::asset::{Asset, AssetKind};
use crate::element::{Element, ElementId, ElementKind, FontFamily, Geometry, TextAlign};
use crate::error::{CollageError, CollageResult};

/// Default page width in native units.
pub const DEFAULT_PAGE_WIDTH: f32 = 1080.0;

/// Default page height in native units.
pub const DEFAULT_PAGE_HEIGHT: f32 = 1920.0;

/// Default page background color.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// Newly added media is scaled down so its larger axis fits this bound.
pub const MEDIA_FIT_BOUND: f32 = 320.0;

/// Fallback media size when the dimension probe fails.
pub const DEFAULT_MEDIA_SIZE: (f32, f32) = (280.0, 210.0);

/// Default fill color for new text elements.
pub const DEFAULT_TEXT_COLOR: &str = "#1e293b";

/// Per-line height used when sizing an imported text note.
const NOTE_LINE_HEIGHT: f32 = 28.0;

/// A fixed-size page holding ordered elements.
///
/// Dimensions are fixed at creation; the renderer scales for display
/// but geometry always stays in native units.
#[derive(Debug, Clone)]
pub struct Page {
    /// Store-assigned identifier. `None` until the first save.
    pub id: Option<String>,
    /// Page width in native units.
    pub width: f32,
    /// Page height in native units.
    pub height: f32,
    /// Background color as a hex string.
    pub background: String,
    elements: Vec<Element>,
}

impl Page {
    /// Create a new empty page with the given dimensions.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            id: None,
            width,
            height,
            background: DEFAULT_BACKGROUND.to_string(),
            elements: Vec::new(),
        }
    }

    /// Rebuild a page from previously loaded parts.
    ///
    /// Any preview URLs on the elements are discarded; stored URL
    /// values are never trusted and must be re-resolved each session.
    #[must_use]
    pub fn from_parts(
        id: Option<String>,
        width: f32,
        height: f32,
        background: String,
        mut elements: Vec<Element>,
    ) -> Self {
        for el in &mut elements {
            el.set_preview_url(None);
        }
        Self {
            id,
            width,
            height,
            background,
            elements,
        }
    }

    /// Append an element with the given kind at the cascading offset
    /// `(40 + 20·n, 40 + 20·n)` where `n` is the current element count,
    /// so successive additions do not fully overlap.
    ///
    /// Returns the new element's id. The element lands at the top of
    /// the paint order.
    pub fn add_element(&mut self, kind: ElementKind, width: f32, height: f32) -> ElementId {
        #[allow(clippy::cast_precision_loss)]
        let n = self.elements.len() as f32;
        let element = Element::new(kind).with_geometry(Geometry {
            x: 40.0 + n * 20.0,
            y: 40.0 + n * 20.0,
            width,
            height,
            rotation: 0.0,
        });
        let id = element.id;
        self.elements.push(element);
        id
    }

    /// Add a media element for an asset.
    ///
    /// `preview_url` is the resolved preview-tier URL, if any.
    /// `natural_size` is the probed pixel size of that preview; when
    /// absent (probe failed or never ran) the element falls back to
    /// the fixed default size. Probe failure is non-fatal by design.
    ///
    /// # Errors
    ///
    /// Returns [`CollageError::InvalidOperation`] for audio assets,
    /// which cannot appear on a page.
    pub fn add_media_element(
        &mut self,
        asset: &Asset,
        preview_url: Option<String>,
        natural_size: Option<(u32, u32)>,
    ) -> CollageResult<ElementId> {
        let kind = match asset.kind {
            AssetKind::Photo => ElementKind::Image {
                asset_id: asset.id.clone(),
                preview_url,
            },
            AssetKind::Video => ElementKind::Video {
                asset_id: asset.id.clone(),
                preview_url,
            },
            AssetKind::Audio => {
                return Err(CollageError::InvalidOperation(format!(
                    "audio asset {} cannot be placed on a page",
                    asset.id
                )))
            }
        };

        let (width, height) = natural_size.map_or(DEFAULT_MEDIA_SIZE, fit_media_size);
        Ok(self.add_element(kind, width, height))
    }

    /// Add a blank text element with placeholder content at a fixed
    /// default position.
    pub fn add_blank_text(&mut self) -> ElementId {
        let element = Element::new(ElementKind::Text {
            content: "Your story here".to_string(),
            font_size: 20.0,
            font_family: FontFamily::SansSerif,
            color: DEFAULT_TEXT_COLOR.to_string(),
            align: TextAlign::Left,
        })
        .with_geometry(Geometry {
            x: 60.0,
            y: 60.0,
            width: 260.0,
            height: 80.0,
            rotation: 0.0,
        });
        let id = element.id;
        self.elements.push(element);
        id
    }

    /// Import a journal note as a text element.
    ///
    /// Height is derived from the line count, clamped to `[60, 400]`;
    /// width is fixed at 280. Successive imports cascade by 15 units.
    pub fn add_text_from_note(&mut self, content: &str) -> ElementId {
        #[allow(clippy::cast_precision_loss)]
        let n = self.elements.len() as f32;
        #[allow(clippy::cast_precision_loss)]
        let line_count = content.split('\n').count() as f32;
        let height = (line_count * NOTE_LINE_HEIGHT).clamp(60.0, 400.0);

        let element = Element::new(ElementKind::Text {
            content: content.to_string(),
            font_size: 18.0,
            font_family: FontFamily::SansSerif,
            color: DEFAULT_TEXT_COLOR.to_string(),
            align: TextAlign::Left,
        })
        .with_geometry(Geometry {
            x: 60.0 + n * 15.0,
            y: 60.0 + n * 15.0,
            width: 280.0,
            height,
            rotation: 0.0,
        });
        let id = element.id;
        self.elements.push(element);
        id
    }

    /// Update an element in place using a closure.
    ///
    /// The element keeps its position in the paint-order sequence.
    ///
    /// # Errors
    ///
    /// Returns [`CollageError::ElementNotFound`] if no element has the
    /// given id.
    pub fn update_element<F>(&mut self, id: ElementId, f: F) -> CollageResult<()>
    where
        F: FnOnce(&mut Element),
    {
        let element = self
            .elements
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| CollageError::ElementNotFound(id.to_string()))?;
        f(element);
        Ok(())
    }

    /// Remove an element from the page.
    ///
    /// # Errors
    ///
    /// Returns [`CollageError::ElementNotFound`] if no element has the
    /// given id.
    pub fn remove_element(&mut self, id: ElementId) -> CollageResult<Element> {
        let idx = self
            .elements
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| CollageError::ElementNotFound(id.to_string()))?;
        Ok(self.elements.remove(idx))
    }

    /// Get an element by id.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// All elements in paint order (first = bottom).
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Number of elements on the page.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Check if the page has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Find the topmost element containing the given page coordinates.
    #[must_use]
    pub fn element_at(&self, x: f32, y: f32) -> Option<ElementId> {
        self.elements
            .iter()
            .rev()
            .find(|e| e.contains_point(x, y))
            .map(|e| e.id)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_WIDTH, DEFAULT_PAGE_HEIGHT)
    }
}

/// Scale probed media dimensions to fit within [`MEDIA_FIT_BOUND`],
/// preserving aspect ratio and rounding. Dimensions already within the
/// bound are kept as-is.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn fit_media_size(natural: (u32, u32)) -> (f32, f32) {
    let (w, h) = (natural.0 as f32, natural.1 as f32);
    if w > MEDIA_FIT_BOUND || h > MEDIA_FIT_BOUND {
        let r = (MEDIA_FIT_BOUND / w).min(MEDIA_FIT_BOUND / h);
        ((w * r).round(), (h * r).round())
    } else {
        (w, h)
    }
}
