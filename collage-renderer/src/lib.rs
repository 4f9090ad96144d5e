//! # Collage Renderer
//!
//! Raster pipeline for collage pages: decoded-preview caching, display
//! scaling, and native-resolution PNG export via an SVG intermediate.
//!
//! ## Export Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              PageExporter                   │
//! ├───────────────┬─────────────────────────────┤
//! │ Page + cache  │  SVG string                 │
//! │  (collage-core│   → resvg/tiny-skia raster  │
//! │   scene graph)│   → PNG bytes               │
//! └───────────────┴─────────────────────────────┘
//! ```
//!
//! The on-screen stage displays the page at [`display_scale`]; export
//! inverts that scale, so output is always native page resolution.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod error;
pub mod export;
pub mod texture;

pub use cache::{PreviewCache, PreviewCacheConfig, SharedPreviewCache};
pub use error::{RenderError, RenderResult};
pub use export::{display_scale, ExportConfig, PageExporter, MAX_DISPLAY_DIM};
pub use texture::{
    create_solid_color, decode_preview, probe_dimensions, to_png_data_uri, TextureData,
    TextureFormat,
};
