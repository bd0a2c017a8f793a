//! In-memory page document shared by the cart controllers.
//!
//! The page is modeled as a flat set of mount regions keyed by the selector that
//! addresses them. Each region has an identity (`ElementId`) that survives
//! markup replacement and is dropped only when the region is removed, so
//! callers can hold non-owning references to it (focus restoration, trigger
//! elements).

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use parking_lot::Mutex;

use crate::error::{CartError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

#[derive(Debug, Clone)]
struct Element {
    id: ElementId,
    markup: String,
    classes: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct DocumentState {
    elements: HashMap<String, Element>,
    body_classes: BTreeSet<String>,
    focused: Option<ElementId>,
    next_id: u64,
}

impl DocumentState {
    fn allocate_id(&mut self) -> ElementId {
        self.next_id += 1;
        ElementId(self.next_id)
    }
}

/// Cloneable handle to one page document. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct Document {
    inner: Arc<Mutex<DocumentState>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or recreates, with a fresh identity) the region at `selector`.
    pub fn insert(&self, selector: &str, markup: impl Into<String>) -> ElementId {
        let mut guard = self.inner.lock();
        let id = guard.allocate_id();
        guard.elements.insert(
            selector.to_string(),
            Element {
                id,
                markup: markup.into(),
                classes: BTreeSet::new(),
            },
        );
        id
    }

    pub fn remove(&self, selector: &str) -> bool {
        let mut guard = self.inner.lock();
        let Some(removed) = guard.elements.remove(selector) else {
            return false;
        };
        if guard.focused == Some(removed.id) {
            guard.focused = None;
        }
        true
    }

    pub fn contains(&self, selector: &str) -> bool {
        self.inner.lock().elements.contains_key(selector)
    }

    pub fn element_id(&self, selector: &str) -> Option<ElementId> {
        self.inner.lock().elements.get(selector).map(|el| el.id)
    }

    pub fn is_attached(&self, id: ElementId) -> bool {
        self.inner.lock().elements.values().any(|el| el.id == id)
    }

    pub fn markup(&self, selector: &str) -> Option<String> {
        self.inner
            .lock()
            .elements
            .get(selector)
            .map(|el| el.markup.clone())
    }

    /// Replaces the inner markup of an existing region, keeping its identity.
    pub fn set_markup(&self, selector: &str, markup: impl Into<String>) -> Result<()> {
        let mut guard = self.inner.lock();
        let element = guard
            .elements
            .get_mut(selector)
            .ok_or_else(|| CartError::MountMissing {
                selector: selector.to_string(),
            })?;
        element.markup = markup.into();
        Ok(())
    }

    pub fn has_class(&self, selector: &str, class: &str) -> bool {
        self.inner
            .lock()
            .elements
            .get(selector)
            .is_some_and(|el| el.classes.contains(class))
    }

    /// Returns `false` when the region does not exist.
    pub fn toggle_class(&self, selector: &str, class: &str, on: bool) -> bool {
        let mut guard = self.inner.lock();
        let Some(element) = guard.elements.get_mut(selector) else {
            return false;
        };
        if on {
            element.classes.insert(class.to_string());
        } else {
            element.classes.remove(class);
        }
        true
    }

    pub fn toggle_body_class(&self, class: &str, on: bool) {
        let mut guard = self.inner.lock();
        if on {
            guard.body_classes.insert(class.to_string());
        } else {
            guard.body_classes.remove(class);
        }
    }

    pub fn body_has_class(&self, class: &str) -> bool {
        self.inner.lock().body_classes.contains(class)
    }

    /// Moves focus to `id` if it is attached; otherwise focus is left as is.
    pub fn focus(&self, id: ElementId) -> bool {
        let mut guard = self.inner.lock();
        if !guard.elements.values().any(|el| el.id == id) {
            return false;
        }
        guard.focused = Some(id);
        true
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.inner.lock().focused
    }
}
