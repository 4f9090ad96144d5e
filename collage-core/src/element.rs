//! Page elements - the building blocks of a collage.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum element width and height in page units.
///
/// Transform commits clamp to this so an element can never collapse
/// below a grabbable size.
pub const MIN_ELEMENT_SIZE: f32 = 20.0;

/// Unique identifier for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position, size, and rotation of an element in native page units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// X position (page units from left).
    pub x: f32,
    /// Y position (page units from top).
    pub y: f32,
    /// Width in page units. Invariant: `>= MIN_ELEMENT_SIZE`.
    pub width: f32,
    /// Height in page units. Invariant: `>= MIN_ELEMENT_SIZE`.
    pub height: f32,
    /// Rotation in degrees around the element's top-left corner.
    /// Unconstrained range; normalized when hit-testing.
    pub rotation: f32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            rotation: 0.0,
        }
    }
}

/// Font families available for text elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontFamily {
    /// Generic sans-serif.
    SansSerif,
    /// Generic serif.
    Serif,
    /// Generic monospace.
    Monospace,
}

impl FontFamily {
    /// CSS font-family name.
    #[must_use]
    pub fn as_css(self) -> &'static str {
        match self {
            Self::SansSerif => "sans-serif",
            Self::Serif => "serif",
            Self::Monospace => "monospace",
        }
    }
}

/// Horizontal alignment for text elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Left-aligned.
    Left,
    /// Centered.
    Center,
    /// Right-aligned.
    Right,
}

/// The content an element carries.
///
/// Closed union: rendering and property editing switch exhaustively
/// over this tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    /// A photo, referencing an externally stored asset.
    Image {
        /// Asset this element displays. Lookup-only; the element never
        /// owns the asset's lifecycle.
        asset_id: String,
        /// Resolved preview URL for the current session. Signed URLs
        /// expire, so this is never serialized; it is re-resolved on
        /// every load.
        #[serde(skip)]
        preview_url: Option<String>,
    },

    /// A video, displayed via its full-resolution URL.
    Video {
        /// Asset this element displays.
        asset_id: String,
        /// Resolved display URL, ephemeral as for images.
        #[serde(skip)]
        preview_url: Option<String>,
    },

    /// A text note.
    Text {
        /// Text content.
        content: String,
        /// Font size in page units.
        font_size: f32,
        /// Font family.
        font_family: FontFamily,
        /// Fill color as a hex string.
        color: String,
        /// Horizontal alignment.
        align: TextAlign,
    },
}

/// One visual item on a page, with geometry and kind-specific content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    /// Unique identifier, stable across edits until deletion.
    pub id: ElementId,
    /// Position, size, and rotation in native page units.
    pub geometry: Geometry,
    /// Kind-specific content.
    pub kind: ElementKind,
}

impl Element {
    /// Create a new element with the given kind and default geometry.
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        Self {
            id: ElementId::new(),
            geometry: Geometry::default(),
            kind,
        }
    }

    /// Set the geometry.
    #[must_use]
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// The asset this element references, if it is a media element.
    #[must_use]
    pub fn asset_id(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Image { asset_id, .. } | ElementKind::Video { asset_id, .. } => {
                Some(asset_id)
            }
            ElementKind::Text { .. } => None,
        }
    }

    /// The resolved display URL, if this is a media element with one.
    #[must_use]
    pub fn preview_url(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Image { preview_url, .. } | ElementKind::Video { preview_url, .. } => {
                preview_url.as_deref()
            }
            ElementKind::Text { .. } => None,
        }
    }

    /// Set the resolved display URL. No-op for text elements.
    pub fn set_preview_url(&mut self, url: Option<String>) {
        match &mut self.kind {
            ElementKind::Image { preview_url, .. } | ElementKind::Video { preview_url, .. } => {
                *preview_url = url;
            }
            ElementKind::Text { .. } => {}
        }
    }

    /// Check whether a point (in page coordinates) falls inside this
    /// element, honoring its rotation.
    ///
    /// The point is mapped into the element's local frame by rotating
    /// it back around the element origin, so any rotation value works.
    #[must_use]
    pub fn contains_point(&self, px: f32, py: f32) -> bool {
        let g = &self.geometry;
        let (dx, dy) = (px - g.x, py - g.y);
        let theta = -g.rotation.to_radians();
        let (sin, cos) = theta.sin_cos();
        let local_x = dx * cos - dy * sin;
        let local_y = dx * sin + dy * cos;
        local_x >= 0.0 && local_x <= g.width && local_y >= 0.0 && local_y <= g.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_kind() -> ElementKind {
        ElementKind::Text {
            content: "Hello".to_string(),
            font_size: 18.0,
            font_family: FontFamily::SansSerif,
            color: "#1e293b".to_string(),
            align: TextAlign::Left,
        }
    }

    #[test]
    fn test_contains_point_axis_aligned() {
        let el = Element::new(text_kind()).with_geometry(Geometry {
            x: 100.0,
            y: 100.0,
            width: 200.0,
            height: 50.0,
            rotation: 0.0,
        });

        assert!(el.contains_point(150.0, 125.0));
        assert!(!el.contains_point(50.0, 50.0));
        assert!(!el.contains_point(150.0, 160.0));
    }

    #[test]
    fn test_contains_point_rotated() {
        // 90 degrees around (100, 100): the box now extends up-right
        // from the origin along (-y, +x).
        let el = Element::new(text_kind()).with_geometry(Geometry {
            x: 100.0,
            y: 100.0,
            width: 200.0,
            height: 50.0,
            rotation: 90.0,
        });

        // A point that was inside the unrotated box is now outside.
        assert!(!el.contains_point(250.0, 125.0));
        // Rotated position of the old box center.
        assert!(el.contains_point(80.0, 200.0));
    }

    #[test]
    fn test_contains_point_rotation_normalized() {
        let mut el = Element::new(text_kind()).with_geometry(Geometry {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            rotation: 450.0, // same as 90
        });
        let hit_450 = el.contains_point(-50.0, 50.0);
        el.geometry.rotation = 90.0;
        let hit_90 = el.contains_point(-50.0, 50.0);
        assert_eq!(hit_450, hit_90);
    }

    #[test]
    fn test_preview_url_not_serialized() {
        let mut el = Element::new(ElementKind::Image {
            asset_id: "asset-1".to_string(),
            preview_url: None,
        });
        el.set_preview_url(Some("https://signed.example/preview".to_string()));

        let json = serde_json::to_string(&el).expect("serialize");
        assert!(!json.contains("signed.example"));

        let back: Element = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.preview_url(), None);
        assert_eq!(back.asset_id(), Some("asset-1"));
    }

    #[test]
    fn test_text_element_round_trip() {
        let el = Element::new(text_kind());
        let json = serde_json::to_string(&el).expect("serialize");
        assert!(json.contains("\"type\":\"text\""));
        assert!(json.contains("sans-serif"));

        let back: Element = serde_json::from_str(&json).expect("deserialize");
        match back.kind {
            ElementKind::Text { align, .. } => assert_eq!(align, TextAlign::Left),
            _ => panic!("expected text element"),
        }
    }
}
