use crate::dom::{Document, ElementId};

/// Scoped focus containment held by a modal-like panel while it is open.
pub trait FocusTrap: Send + Sync {
    /// Contains focus within `container`, initially focusing `initial_focus`
    /// (falling back to the container itself).
    fn engage(&self, container: &str, initial_focus: &str);
    /// Lifts the containment and, when given, returns focus to `restore_to`.
    fn release(&self, restore_to: Option<ElementId>);
}

/// Focus trap over the page [`Document`]'s focus pointer.
pub struct DocumentFocusTrap {
    document: Document,
}

impl DocumentFocusTrap {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

impl FocusTrap for DocumentFocusTrap {
    fn engage(&self, container: &str, initial_focus: &str) {
        let target = self
            .document
            .element_id(initial_focus)
            .or_else(|| self.document.element_id(container));
        if let Some(target) = target {
            self.document.focus(target);
        }
    }

    fn release(&self, restore_to: Option<ElementId>) {
        if let Some(element) = restore_to {
            self.document.focus(element);
        }
    }
}
