//! Persistence adapter: saving and loading the page through an
//! injected store.
//!
//! A collection holds at most one page, identified by a fixed name;
//! saving is an upsert keyed on the store-assigned id, generated on
//! first save. Resolved display URLs are transient and never round-trip
//! through storage.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::element::Element;
use crate::error::{CollageError, CollageResult};
use crate::page::Page;

/// Fixed name of the single page each collection owns.
pub const PAGE_NAME: &str = "Main";

/// Serialized form of a page, as exchanged with the page store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    /// Store-assigned identifier; `None` on first insert.
    pub id: Option<String>,
    /// Owning collection.
    pub collection_id: String,
    /// Page name; always [`PAGE_NAME`].
    pub name: String,
    /// Page width in native units.
    pub width: f32,
    /// Page height in native units.
    pub height: f32,
    /// Background color as a hex string.
    pub background: String,
    /// Elements in paint order. Ephemeral URL state is excluded at the
    /// serde level.
    pub elements: Vec<Element>,
}

/// A raw journal text body supplied by the text-import collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    /// Store-assigned identifier.
    pub id: String,
    /// Text content.
    pub content: String,
    /// Creation timestamp, RFC 3339.
    pub created_at: String,
}

/// External page store collaborator.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Fetch the single page of a collection, if one was ever saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn load_page(&self, collection_id: &str) -> CollageResult<Option<PageRecord>>;

    /// Insert or update a page record, returning its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write.
    async fn upsert_page(&self, record: &PageRecord) -> CollageResult<String>;
}

/// Supplies journal text bodies that can become text elements.
#[async_trait]
pub trait NoteSource: Send + Sync {
    /// List a collection's notes, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be queried.
    async fn list_notes(&self, collection_id: &str) -> CollageResult<Vec<Note>>;
}

/// Save a page snapshot to the store.
///
/// The record carries the page's full state minus display URLs. On
/// first save the store-generated id is adopted onto the page, so
/// later saves update in place.
///
/// # Errors
///
/// Propagates store failures; the caller surfaces them once and does
/// not retry automatically.
pub async fn save_page(
    store: &dyn PageStore,
    collection_id: &str,
    page: &mut Page,
) -> CollageResult<String> {
    let mut elements = page.elements().to_vec();
    for el in &mut elements {
        el.set_preview_url(None);
    }
    let record = PageRecord {
        id: page.id.clone(),
        collection_id: collection_id.to_string(),
        name: PAGE_NAME.to_string(),
        width: page.width,
        height: page.height,
        background: page.background.clone(),
        elements,
    };

    let id = store.upsert_page(&record).await?;
    tracing::info!("saved page {id} for collection {collection_id}");
    page.id = Some(id.clone());
    Ok(id)
}

/// Load a collection's page from the store.
///
/// Returns `None` when the collection has no saved page yet. Any URL
/// state embedded in the stored elements is discarded; URLs are
/// re-resolved fresh through the asset pipeline after load.
///
/// # Errors
///
/// Propagates store failures.
pub async fn load_page(
    store: &dyn PageStore,
    collection_id: &str,
) -> CollageResult<Option<Page>> {
    let Some(record) = store.load_page(collection_id).await? else {
        return Ok(None);
    };
    Ok(Some(Page::from_parts(
        record.id,
        record.width,
        record.height,
        record.background,
        record.elements,
    )))
}

/// Filesystem-backed [`PageStore`] keeping one JSON file per
/// collection. Suitable for tests and local single-user use.
#[derive(Debug, Clone)]
pub struct JsonPageStore {
    data_dir: PathBuf,
}

impl JsonPageStore {
    /// Create a store rooted at `data_dir`, creating the directory if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(data_dir: impl Into<PathBuf>) -> CollageResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    fn path_for(&self, collection_id: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}.json", sanitize_filename(collection_id)))
    }
}

#[async_trait]
impl PageStore for JsonPageStore {
    async fn load_page(&self, collection_id: &str) -> CollageResult<Option<PageRecord>> {
        let path = self.path_for(collection_id);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        let record: PageRecord = serde_json::from_str(&contents)?;
        Ok(Some(record))
    }

    async fn upsert_page(&self, record: &PageRecord) -> CollageResult<String> {
        let id = record
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let stored = PageRecord {
            id: Some(id.clone()),
            ..record.clone()
        };
        let json = serde_json::to_string_pretty(&stored)?;
        let path = self.path_for(&record.collection_id);
        std::fs::write(&path, json).map_err(|e| {
            CollageError::Storage(format!("failed to write {}: {e}", path.display()))
        })?;
        Ok(id)
    }
}

/// Sanitize a collection id for use as a filename.
///
/// Replaces any character that is not alphanumeric, `-`, or `_`.
fn sanitize_filename(collection_id: &str) -> String {
    collection_id
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
