//! Asset resolution: mapping stored media to tiered display URLs.
//!
//! Assets live in an external store and are read-only from the core's
//! perspective; the core only resolves them to expiring signed URLs at
//! the thumbnail, preview, and full tiers.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::error::CollageResult;
use crate::page::Page;

/// Side of the square cover-fit thumbnail transform.
pub const THUMBNAIL_SIZE: u32 = 200;

/// Bound on both axes of the contained preview transform.
pub const PREVIEW_MAX_SIZE: u32 = 1200;

/// Lifetime requested for signed URLs, in seconds.
pub const SIGNED_URL_TTL_SECS: u64 = 3600;

/// Kind of an externally stored media file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Still photo; server-side transforms are available.
    Photo,
    /// Video; only the full-resolution URL exists.
    Video,
    /// Audio recording; never placed on a page.
    Audio,
}

/// An externally stored media file referenced by id from a media
/// element. The core never mutates assets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    /// Store-assigned identifier.
    pub id: String,
    /// Media kind.
    pub kind: AssetKind,
    /// Opaque locator inside the storage backend.
    pub storage_path: String,
    /// Filename at upload time, if recorded.
    pub original_filename: Option<String>,
}

/// How a server-side transform fits the source into the requested box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeFit {
    /// Fill the box, cropping overflow.
    Cover,
    /// Fit inside the box, preserving aspect.
    Contain,
}

/// A server-side transform request attached to a URL resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlTransform {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Fit mode.
    pub fit: ResizeFit,
}

/// External asset store collaborator.
///
/// Injected explicitly; the core never reaches for an ambient client.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// List the photo and video assets of a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn list_media_assets(&self, collection_id: &str) -> CollageResult<Vec<Asset>>;

    /// Resolve a storage locator to a time-limited URL, optionally
    /// applying a server-side transform.
    ///
    /// Returns `None` when the URL cannot be produced; absence is
    /// "not yet available", never an error.
    async fn resolve_url(
        &self,
        storage_path: &str,
        transform: Option<UrlTransform>,
        ttl_secs: u64,
    ) -> Option<String>;
}

/// Display URLs resolved for a set of assets, keyed by asset id.
///
/// An asset missing from a map simply has no URL at that tier yet.
#[derive(Debug, Clone, Default)]
pub struct ResolvedUrls {
    /// Thumbnail-tier URLs.
    pub thumbnails: HashMap<String, String>,
    /// Preview-tier URLs.
    pub previews: HashMap<String, String>,
}

impl ResolvedUrls {
    /// Check whether nothing resolved at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.thumbnails.is_empty() && self.previews.is_empty()
    }
}

/// Resolve thumbnail- and preview-tier URLs for a set of assets,
/// fanning out one resolution per asset concurrently.
///
/// Photos request a cover-fit thumbnail and a contained preview; if a
/// transform request fails the untransformed full URL stands in, and
/// if that also fails the tier stays unresolved. Videos use the full
/// URL for both tiers. Audio assets are skipped.
pub async fn resolve_display_urls(store: &dyn AssetStore, assets: &[Asset]) -> ResolvedUrls {
    let per_asset = assets
        .iter()
        .filter(|a| a.kind != AssetKind::Audio)
        .map(|asset| async move {
            let full = store
                .resolve_url(&asset.storage_path, None, SIGNED_URL_TTL_SECS)
                .await;

            let (thumbnail, preview) = if asset.kind == AssetKind::Photo {
                let thumb = store
                    .resolve_url(
                        &asset.storage_path,
                        Some(UrlTransform {
                            width: THUMBNAIL_SIZE,
                            height: THUMBNAIL_SIZE,
                            fit: ResizeFit::Cover,
                        }),
                        SIGNED_URL_TTL_SECS,
                    )
                    .await;
                let preview = store
                    .resolve_url(
                        &asset.storage_path,
                        Some(UrlTransform {
                            width: PREVIEW_MAX_SIZE,
                            height: PREVIEW_MAX_SIZE,
                            fit: ResizeFit::Contain,
                        }),
                        SIGNED_URL_TTL_SECS,
                    )
                    .await;
                if thumb.is_none() || preview.is_none() {
                    tracing::warn!(
                        "transform resolution failed for asset {}, falling back to full URL",
                        asset.id
                    );
                }
                (thumb.or_else(|| full.clone()), preview.or_else(|| full.clone()))
            } else {
                (full.clone(), full.clone())
            };

            (asset.id.clone(), thumbnail, preview)
        });

    let mut resolved = ResolvedUrls::default();
    for (id, thumbnail, preview) in join_all(per_asset).await {
        if let Some(url) = thumbnail {
            resolved.thumbnails.insert(id.clone(), url);
        }
        if let Some(url) = preview {
            resolved.previews.insert(id, url);
        }
    }
    resolved
}

/// Push freshly resolved preview URLs onto the page's media elements.
///
/// Elements whose asset has no preview URL yet are left untouched.
pub fn apply_preview_urls(page: &mut Page, urls: &ResolvedUrls) {
    let ids: Vec<_> = page.elements().iter().map(|e| e.id).collect();
    for id in ids {
        let url = page
            .element(id)
            .and_then(|el| el.asset_id())
            .and_then(|asset_id| urls.previews.get(asset_id))
            .cloned();
        if let Some(url) = url {
            // Ids were just read off the page, so this cannot fail.
            let _ = page.update_element(id, |el| el.set_preview_url(Some(url)));
        }
    }
}
