use std::sync::Arc;

use tracing::info;

pub mod badge;
pub mod client;
pub mod config;
pub mod dom;
pub mod drawer;
pub mod error;
pub mod events;
pub mod focus;
pub mod fragment;
pub mod scheduler;
pub mod submission;

pub use badge::{BadgeChange, CartBadge};
pub use client::{HttpStorefront, StorefrontApi};
pub use config::{load_settings, Settings};
pub use dom::{Document, ElementId};
pub use drawer::{CartView, DrawerController, Key, PanelState, TriggerActivation};
pub use error::{CartError, Result};
pub use events::{ChannelSubscription, EventBus};
pub use focus::{DocumentFocusTrap, FocusTrap};
pub use fragment::{Fragment, FragmentRenderer};
pub use scheduler::{ReconciliationScheduler, RefreshOutcome, RefreshTarget};
pub use submission::{FormOptions, FormState, ProductForm, SubmissionController, SubmissionOutcome};

/// Every cart component for one page, wired together.
pub struct CartEngine {
    pub document: Document,
    pub bus: EventBus,
    pub badge: Arc<CartBadge>,
    pub drawer: Arc<DrawerController>,
    pub scheduler: Arc<ReconciliationScheduler>,
    pub submissions: Arc<SubmissionController>,
}

impl CartEngine {
    /// Talks to the storefront named in `settings` over HTTP.
    pub fn connect(settings: &Settings, document: Document, options: FormOptions) -> Result<Self> {
        let api: Arc<dyn StorefrontApi> = Arc::new(HttpStorefront::new(settings)?);
        Ok(Self::with_api(api, settings, document, options))
    }

    /// The drawer registers itself as the cart view only when the page
    /// carries its markup; otherwise adds update the badge and events alone.
    pub fn with_api(
        api: Arc<dyn StorefrontApi>,
        settings: &Settings,
        document: Document,
        options: FormOptions,
    ) -> Self {
        let bus = EventBus::default();
        let badge = Arc::new(CartBadge::new(api.clone(), document.clone()));
        let drawer = DrawerController::create(
            document.clone(),
            Arc::new(DocumentFocusTrap::new(document.clone())),
        );
        let scheduler = ReconciliationScheduler::new(api.clone(), drawer.clone());

        let mut submissions =
            SubmissionController::new(api, bus.clone(), badge.clone(), scheduler.clone(), settings)
                .with_options(options);
        let drawer_on_page = document.contains(drawer::CART_DRAWER);
        if drawer_on_page {
            submissions = submissions.with_cart_view(drawer.clone());
        }
        info!(drawer_on_page, "cart engine ready");

        Self {
            document,
            bus,
            badge,
            drawer,
            scheduler,
            submissions: Arc::new(submissions),
        }
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod tests_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
