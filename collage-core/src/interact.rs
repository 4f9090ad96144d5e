//! Selection and transform engine.
//!
//! Tracks at most one selected element, performs hit-testing-driven
//! selection, and commits drag/resize/rotate gestures into element
//! geometry with grid snapping and minimum-size clamping.

use std::collections::HashMap;

use crate::element::{ElementId, Geometry, MIN_ELEMENT_SIZE};
use crate::error::{CollageError, CollageResult};
use crate::page::Page;

/// Grid unit for drag snapping, in native page units.
pub const GRID: f32 = 10.0;

/// Snap a coordinate to the nearest grid multiple.
#[must_use]
pub fn snap(v: f32) -> f32 {
    (v / GRID).round() * GRID
}

/// In-flight gesture state attached to a selected element.
///
/// Resize gestures accumulate a multiplicative scale here; every
/// commit converts it to absolute width/height and resets it to 1, so
/// scale never compounds across transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformHandle {
    /// Pending X position of the gesture, in page units.
    pub x: f32,
    /// Pending Y position of the gesture, in page units.
    pub y: f32,
    /// Accumulated horizontal scale factor.
    pub scale_x: f32,
    /// Accumulated vertical scale factor.
    pub scale_y: f32,
    /// Pending rotation in degrees.
    pub rotation: f32,
}

impl TransformHandle {
    fn for_element(geometry: &Geometry) -> Self {
        Self {
            x: geometry.x,
            y: geometry.y,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: geometry.rotation,
        }
    }
}

/// Keys the engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Forward delete.
    Delete,
    /// Backspace.
    Backspace,
}

/// Selection state machine plus transform commit logic.
///
/// At most one element is selected. Transform handles live in an
/// explicit registry keyed by element id, refreshed whenever the
/// selection changes.
#[derive(Debug, Default)]
pub struct Interaction {
    selected: Option<ElementId>,
    handles: HashMap<ElementId, TransformHandle>,
}

impl Interaction {
    /// Create a new engine with nothing selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently selected element, if any.
    #[must_use]
    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    /// The transform handle attached to an element, if it is selected.
    #[must_use]
    pub fn handle(&self, id: ElementId) -> Option<&TransformHandle> {
        self.handles.get(&id)
    }

    /// Mutable access to the selected element's handle, for gesture
    /// updates between commits.
    pub fn handle_mut(&mut self, id: ElementId) -> Option<&mut TransformHandle> {
        self.handles.get_mut(&id)
    }

    /// Select the element under the given page coordinates, or clear
    /// the selection on a background click.
    ///
    /// Returns the new selection.
    pub fn select_at(&mut self, page: &Page, x: f32, y: f32) -> Option<ElementId> {
        match page.element_at(x, y) {
            Some(id) => {
                self.select(page, id);
                Some(id)
            }
            None => {
                self.clear();
                None
            }
        }
    }

    /// Select an element directly, attaching a fresh transform handle.
    ///
    /// Selecting an id not present on the page clears the selection.
    pub fn select(&mut self, page: &Page, id: ElementId) {
        let Some(element) = page.element(id) else {
            self.clear();
            return;
        };
        self.handles.clear();
        self.handles
            .insert(id, TransformHandle::for_element(&element.geometry));
        self.selected = Some(id);
    }

    /// Clear the selection and drop any attached handles.
    pub fn clear(&mut self) {
        self.selected = None;
        self.handles.clear();
    }

    /// Commit a drag gesture: the final position is snapped to the
    /// grid independently per axis.
    ///
    /// Returns the applied geometry.
    ///
    /// # Errors
    ///
    /// Returns [`CollageError::ElementNotFound`] if the element is not
    /// on the page.
    pub fn commit_drag(
        &mut self,
        page: &mut Page,
        id: ElementId,
        x: f32,
        y: f32,
    ) -> CollageResult<Geometry> {
        let mut applied = Geometry::default();
        page.update_element(id, |el| {
            el.geometry.x = snap(x);
            el.geometry.y = snap(y);
            applied = el.geometry;
        })?;
        if let Some(handle) = self.handles.get_mut(&id) {
            handle.x = applied.x;
            handle.y = applied.y;
        }
        tracing::debug!("drag commit on {id}: ({}, {})", applied.x, applied.y);
        Ok(applied)
    }

    /// Commit a resize/rotate gesture from the element's transform
    /// handle.
    ///
    /// The accumulated scale is converted into absolute width/height
    /// (clamped to [`MIN_ELEMENT_SIZE`]), rotation is stored directly
    /// in degrees, and the handle's scale resets to 1 - all within a
    /// single element update, so no intermediate state is observable.
    ///
    /// Returns the applied geometry.
    ///
    /// # Errors
    ///
    /// Returns [`CollageError::InvalidOperation`] if the element has
    /// no attached handle (it is not selected), or
    /// [`CollageError::ElementNotFound`] if it is not on the page.
    pub fn commit_transform(&mut self, page: &mut Page, id: ElementId) -> CollageResult<Geometry> {
        let handle = self
            .handles
            .get_mut(&id)
            .ok_or_else(|| CollageError::InvalidOperation(format!("no handle for {id}")))?;

        let pending = *handle;
        let mut applied = Geometry::default();
        page.update_element(id, |el| {
            el.geometry.x = pending.x;
            el.geometry.y = pending.y;
            el.geometry.width = (el.geometry.width * pending.scale_x).max(MIN_ELEMENT_SIZE);
            el.geometry.height = (el.geometry.height * pending.scale_y).max(MIN_ELEMENT_SIZE);
            el.geometry.rotation = pending.rotation;
            applied = el.geometry;
        })?;

        // Scale is consumed: absolute size now carries it.
        handle.scale_x = 1.0;
        handle.scale_y = 1.0;
        tracing::debug!(
            "transform commit on {id}: {}x{} at {} deg",
            applied.width,
            applied.height,
            applied.rotation
        );
        Ok(applied)
    }

    /// Delete the selected element and clear the selection.
    ///
    /// Returns the removed element, or `None` when nothing was
    /// selected.
    ///
    /// # Errors
    ///
    /// Returns [`CollageError::ElementNotFound`] if the selected id is
    /// no longer on the page; the selection is cleared either way.
    pub fn delete_selected(&mut self, page: &mut Page) -> CollageResult<Option<crate::Element>> {
        let Some(id) = self.selected.take() else {
            return Ok(None);
        };
        self.handles.clear();
        let removed = page.remove_element(id)?;
        tracing::debug!("deleted element {id}");
        Ok(Some(removed))
    }

    /// Handle a key press.
    ///
    /// Delete/Backspace removes the current selection, but only when
    /// the canvas owns keyboard focus; while a text input elsewhere is
    /// focused the key must pass through untouched.
    ///
    /// Returns `true` if an element was deleted.
    ///
    /// # Errors
    ///
    /// Propagates deletion errors from the page.
    pub fn handle_key(
        &mut self,
        page: &mut Page,
        key: Key,
        text_input_focused: bool,
    ) -> CollageResult<bool> {
        if text_input_focused {
            return Ok(false);
        }
        match key {
            Key::Delete | Key::Backspace => Ok(self.delete_selected(page)?.is_some()),
        }
    }
}
