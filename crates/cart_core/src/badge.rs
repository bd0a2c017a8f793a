//! Header item-count indicator, kept in step with the canonical cart summary.

use std::sync::Arc;

use tracing::debug;

use crate::{client::StorefrontApi, dom::Document, error::Result, fragment};

pub const CART_ICON: &str = "#cart-icon-bubble";
pub const COUNT_BUBBLE: &str = "#cart-icon-bubble .cart-count-bubble";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeChange {
    Created(u32),
    Updated(u32),
    Removed,
    Unchanged,
}

pub struct CartBadge {
    api: Arc<dyn StorefrontApi>,
    document: Document,
}

impl CartBadge {
    pub fn new(api: Arc<dyn StorefrontApi>, document: Document) -> Self {
        Self { api, document }
    }

    /// Re-derives the indicator from the summary endpoint. Independent of the
    /// drawer: the count stays right even if the panel was never opened.
    pub async fn refresh(&self) -> Result<BadgeChange> {
        let summary = self.api.fetch_cart_summary().await?;
        Ok(self.reconcile(summary.item_count))
    }

    pub fn reconcile(&self, item_count: u32) -> BadgeChange {
        if !self.document.contains(CART_ICON) {
            debug!("cart icon not on page; badge left alone");
            return BadgeChange::Unchanged;
        }

        let existing = self.document.contains(COUNT_BUBBLE);
        let change = match (item_count, existing) {
            (0, false) => BadgeChange::Unchanged,
            (0, true) => {
                self.document.remove(COUNT_BUBBLE);
                BadgeChange::Removed
            }
            (count, true) if self.rendered_count() == Some(count) => BadgeChange::Unchanged,
            (count, true) => match self.document.set_markup(COUNT_BUBBLE, bubble_markup(count)) {
                Ok(()) => BadgeChange::Updated(count),
                Err(_) => BadgeChange::Unchanged,
            },
            (count, false) => {
                self.document.insert(COUNT_BUBBLE, bubble_markup(count));
                BadgeChange::Created(count)
            }
        };
        debug!(item_count, ?change, "badge reconciled");
        change
    }

    pub fn rendered_count(&self) -> Option<u32> {
        let markup = self.document.markup(COUNT_BUBBLE)?;
        fragment::extract(&markup, "span[aria-hidden=\"true\"]")
            .ok()?
            .inner_html
            .trim()
            .parse()
            .ok()
    }
}

fn bubble_markup(count: u32) -> String {
    format!(
        "<span aria-hidden=\"true\">{count}</span><span class=\"visually-hidden\">{count} items</span>"
    )
}

#[cfg(test)]
#[path = "tests/badge_tests.rs"]
mod tests;
