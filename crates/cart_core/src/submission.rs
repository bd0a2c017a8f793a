//! Add-to-cart orchestration: one guarded mutation, then badge, event and
//! panel follow-ups issued in that order.

use std::{sync::Arc, time::Duration};

use futures::future::join_all;
use shared::{
    domain::{VariantId, PRODUCT_FORM_SOURCE},
    error::CartRejection,
    protocol::{AddItemRequest, CartErrorEvent, CartEvent, CartSnapshot, CartUpdate, MutationResponse},
};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::{
    badge::CartBadge,
    client::StorefrontApi,
    config::Settings,
    dom::ElementId,
    drawer::{CartView, DrawerController},
    events::EventBus,
    scheduler::{ReconciliationScheduler, RefreshTarget},
};

/// What the user submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductForm {
    pub variant_id: VariantId,
    pub quantity: u32,
    /// Element focused when the form was submitted.
    pub trigger: Option<ElementId>,
}

impl ProductForm {
    pub fn new(variant_id: VariantId, quantity: u32) -> Self {
        Self {
            variant_id,
            quantity,
            trigger: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormOptions {
    /// Suppresses the inline error region; events are still published.
    pub hide_errors: bool,
    /// The submit control has a sold-out label: rejections disable it for good.
    pub sold_out_marker: bool,
}

/// Visible state of the product form's submit control and error region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub in_flight: bool,
    pub loading: bool,
    pub disabled: bool,
    pub sold_out_visible: bool,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Added { item_count: u32 },
    Rejected { message: String, terminal: bool },
    /// Network or parse failure; logged, nothing published.
    TransportFailed,
}

pub struct SubmissionController {
    api: Arc<dyn StorefrontApi>,
    bus: EventBus,
    badge: Arc<CartBadge>,
    scheduler: Arc<ReconciliationScheduler>,
    cart_view: Option<Arc<dyn CartView>>,
    drawer: Option<Arc<DrawerController>>,
    page_path: String,
    settle_delay: Duration,
    options: FormOptions,
    state: Mutex<FormState>,
}

impl SubmissionController {
    pub fn new(
        api: Arc<dyn StorefrontApi>,
        bus: EventBus,
        badge: Arc<CartBadge>,
        scheduler: Arc<ReconciliationScheduler>,
        settings: &Settings,
    ) -> Self {
        Self {
            api,
            bus,
            badge,
            scheduler,
            cart_view: None,
            drawer: None,
            page_path: settings.page_path.clone(),
            settle_delay: settings.settle_delay(),
            options: FormOptions::default(),
            state: Mutex::new(FormState::default()),
        }
    }

    /// Registers the owner of the rendered cart view.
    pub fn with_cart_view(mut self, cart_view: Arc<dyn CartView>) -> Self {
        self.cart_view = Some(cart_view);
        self
    }

    /// Drawer opened directly when no cart view owner is registered.
    pub fn with_drawer(mut self, drawer: Arc<DrawerController>) -> Self {
        self.drawer = Some(drawer);
        self
    }

    pub fn with_options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    pub async fn form_state(&self) -> FormState {
        self.state.lock().await.clone()
    }

    /// Starts a submission unless one is already in flight or the control is
    /// disabled, in which case nothing is sent and `None` is returned. The
    /// handle resolves once every follow-up the submission issued has settled.
    pub async fn submit(self: &Arc<Self>, form: ProductForm) -> Option<JoinHandle<SubmissionOutcome>> {
        {
            let mut state = self.state.lock().await;
            if state.in_flight || state.disabled {
                debug!(
                    variant_id = form.variant_id.0,
                    in_flight = state.in_flight,
                    disabled = state.disabled,
                    "ignoring add to cart while control is busy"
                );
                return None;
            }
            state.in_flight = true;
            state.loading = true;
            if !self.options.hide_errors {
                state.error_message = None;
            }
        }

        let controller = Arc::clone(self);
        Some(tokio::spawn(async move { controller.run(form).await }))
    }

    async fn run(&self, form: ProductForm) -> SubmissionOutcome {
        let mut request = AddItemRequest::new(form.variant_id, form.quantity);
        if let Some(cart_view) = &self.cart_view {
            request = request.with_sections(cart_view.section_ids(), self.page_path.clone());
            cart_view.set_active_element(form.trigger);
        }

        let (outcome, follow_ups) = match self.api.add_item(&request).await {
            Ok(MutationResponse::Added(snapshot)) => {
                let item_count = snapshot.item_count;
                let follow_ups = self.on_added(form.variant_id, snapshot);
                (SubmissionOutcome::Added { item_count }, follow_ups)
            }
            Ok(MutationResponse::Rejected(rejection)) => {
                (self.on_rejected(form.variant_id, rejection).await, Vec::new())
            }
            Err(error) => {
                error!(
                    variant_id = form.variant_id.0,
                    %error,
                    "add to cart failed; keeping previous cart state"
                );
                (SubmissionOutcome::TransportFailed, Vec::new())
            }
        };

        {
            let mut state = self.state.lock().await;
            state.loading = false;
            if !state.disabled {
                state.in_flight = false;
            }
        }

        join_all(follow_ups).await;
        outcome
    }

    fn on_added(&self, variant_id: VariantId, snapshot: CartSnapshot) -> Vec<JoinHandle<()>> {
        let mut follow_ups = Vec::new();

        let badge = Arc::clone(&self.badge);
        follow_ups.push(tokio::spawn(async move {
            if let Err(error) = badge.refresh().await {
                warn!(%error, "cart badge refresh failed");
            }
        }));

        self.bus.publish(CartEvent::Update(CartUpdate {
            source: PRODUCT_FORM_SOURCE.to_string(),
            product_variant_id: variant_id,
            cart_data: snapshot.clone(),
        }));

        if let Some(cart_view) = &self.cart_view {
            // Older refreshes must be stale before the snapshot lands.
            let request = self.scheduler.issue(RefreshTarget::DrawerContent);
            cart_view.render_contents(&snapshot);
            let refresh = self.scheduler.fetch_after(request, self.settle_delay);
            follow_ups.push(tokio::spawn(async move {
                if let Ok(outcome) = refresh.await {
                    debug!(?outcome, "post-add drawer reconciliation finished");
                }
            }));
        } else if let Some(drawer) = &self.drawer {
            let request = self.scheduler.issue(RefreshTarget::DrawerContent);
            drawer.mark_non_empty();
            let refresh = self.scheduler.fetch_after(request, self.settle_delay);
            let drawer = Arc::clone(drawer);
            follow_ups.push(tokio::spawn(async move {
                if let Ok(outcome) = refresh.await {
                    debug!(?outcome, "drawer refreshed before opening");
                }
                drawer.open(None);
            }));
        } else {
            info!(variant_id = variant_id.0, "no cart view on page; item added without opening a panel");
        }

        follow_ups
    }

    async fn on_rejected(&self, variant_id: VariantId, rejection: CartRejection) -> SubmissionOutcome {
        self.bus.publish(CartEvent::Error(CartErrorEvent {
            source: PRODUCT_FORM_SOURCE.to_string(),
            product_variant_id: variant_id,
            errors: rejection.detail(),
            message: rejection.message.clone(),
        }));

        let message = rejection.user_message().to_string();
        let terminal = self.options.sold_out_marker;
        let mut state = self.state.lock().await;
        if !self.options.hide_errors {
            state.error_message = Some(message.clone());
        }
        if terminal {
            state.disabled = true;
            state.sold_out_visible = true;
        }
        info!(variant_id = variant_id.0, terminal, %message, "add to cart rejected");

        SubmissionOutcome::Rejected { message, terminal }
    }
}

#[cfg(test)]
#[path = "tests/submission_tests.rs"]
mod tests;
