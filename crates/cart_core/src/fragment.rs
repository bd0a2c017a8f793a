use scraper::{Html, Selector};
use tracing::warn;

use crate::{
    dom::Document,
    error::{CartError, Result},
};

pub const EMPTY_CLASS: &str = "is-empty";

/// Subtree extracted from a server-rendered section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub inner_html: String,
    /// Whether the matched root carries the `is-empty` class.
    pub is_empty: bool,
}

/// Extracts the first element matching `selector`. A selector that matches
/// nothing is a contract violation by the server, not an empty fragment.
pub fn extract(markup: &str, selector: &str) -> Result<Fragment> {
    let parsed_selector = Selector::parse(selector).map_err(|err| CartError::InvalidSelector {
        selector: selector.to_string(),
        reason: err.to_string(),
    })?;
    let document = Html::parse_document(markup);
    let element = document
        .select(&parsed_selector)
        .next()
        .ok_or_else(|| CartError::FragmentNotFound {
            selector: selector.to_string(),
        })?;
    Ok(Fragment {
        inner_html: element.inner_html(),
        is_empty: element.value().classes().any(|class| class == EMPTY_CLASS),
    })
}

#[derive(Debug, Clone)]
pub struct FragmentRenderer {
    document: Document,
}

impl FragmentRenderer {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// Swaps `fragment` into `mount`. Content is often replaced between
    /// scheduling and application, so a vanished mount is logged, not raised.
    pub fn apply(&self, mount: &str, fragment: &Fragment) -> bool {
        match self.document.set_markup(mount, fragment.inner_html.clone()) {
            Ok(()) => true,
            Err(error) => {
                warn!(mount, %error, "fragment mount point disappeared; skipping update");
                false
            }
        }
    }

    /// Extracts `selector` from `markup` and applies it to `mount`.
    pub fn render(&self, markup: &str, selector: &str, mount: &str) -> Result<Fragment> {
        let fragment = extract(markup, selector)?;
        if !self.apply(mount, &fragment) {
            return Err(CartError::MountMissing {
                selector: mount.to_string(),
            });
        }
        Ok(fragment)
    }
}

#[cfg(test)]
#[path = "tests/fragment_tests.rs"]
mod tests;
