//! # Collage Core
//!
//! Core logic for composing a fixed-size photo-journal page: the scene
//! graph, the selection/transform engine, asset URL resolution, the
//! preview preload pipeline, and the persistence adapter.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                collage-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Page scene graph │  Interaction engine     │
//! │  - Elements       │  - Selection            │
//! │  - Paint order    │  - Grid-snapped drags   │
//! │  - Media sizing   │  - Transform commits    │
//! ├─────────────────────────────────────────────┤
//! │  Asset pipeline   │  Persistence adapter    │
//! │  - Tiered URLs    │  - Page upsert/load     │
//! │  - Preload + ETA  │  - Injected stores      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! External collaborators (asset storage, page records, journal notes)
//! are injected through the [`AssetStore`], [`PageStore`], and
//! [`NoteSource`] traits; display URLs they hand out are treated as
//! expiring and re-resolved every session.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod asset;
pub mod element;
pub mod error;
pub mod interact;
pub mod page;
pub mod persist;
pub mod preload;

pub use asset::{
    apply_preview_urls, resolve_display_urls, Asset, AssetKind, AssetStore, ResizeFit,
    ResolvedUrls, UrlTransform,
};
pub use element::{
    Element, ElementId, ElementKind, FontFamily, Geometry, TextAlign, MIN_ELEMENT_SIZE,
};
pub use error::{CollageError, CollageResult};
pub use interact::{snap, Interaction, Key, TransformHandle, GRID};
pub use page::{fit_media_size, Page};
pub use persist::{load_page, save_page, JsonPageStore, Note, NoteSource, PageRecord, PageStore};
pub use preload::{eta_seconds, probe_media_size, PreloadProgress, Preloader, PreviewLoader};

/// Collage core version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
