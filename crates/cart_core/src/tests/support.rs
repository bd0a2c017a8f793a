//! Shared test doubles for the cart controllers.

use std::{
    collections::{HashMap, VecDeque},
    sync::atomic::{AtomicU32, Ordering},
};

use async_trait::async_trait;
use shared::protocol::{AddItemRequest, CartSnapshot, CartSummary, MutationResponse};
use tokio::sync::{oneshot, Mutex};

use crate::{
    client::StorefrontApi,
    dom::Document,
    error::{CartError, Result},
};

pub(crate) const DRAWER_SECTION_FULL: &str = r#"
<div id="shopify-section-cart-drawer" class="shopify-section">
  <cart-drawer class="drawer">
    <div id="CartDrawer" class="cart-drawer">
      <div id="CartDrawer-Overlay" class="cart-drawer__overlay"></div>
      <div class="drawer__inner"><ul><li>Mug x1</li></ul></div>
    </div>
  </cart-drawer>
</div>
"#;

pub(crate) const DRAWER_SECTION_EMPTY: &str = r#"
<div id="shopify-section-cart-drawer" class="shopify-section">
  <cart-drawer class="drawer is-empty">
    <div id="CartDrawer" class="cart-drawer">
      <div id="CartDrawer-Overlay" class="cart-drawer__overlay"></div>
      <div class="drawer__inner-empty"><p>Your cart is empty</p></div>
    </div>
  </cart-drawer>
</div>
"#;

pub(crate) const ICON_SECTION: &str = r#"
<div id="shopify-section-cart-icon-bubble" class="shopify-section"><svg class="icon-cart"></svg></div>
"#;

/// Storefront double with scripted mutation responses.
#[derive(Default)]
pub(crate) struct FakeStorefront {
    pub(crate) add_responses: Mutex<VecDeque<Result<MutationResponse>>>,
    pub(crate) add_calls: Mutex<Vec<AddItemRequest>>,
    pub(crate) add_gate: Mutex<Option<oneshot::Receiver<()>>>,
    pub(crate) sections: Mutex<HashMap<String, String>>,
    pub(crate) section_fetches: AtomicU32,
    pub(crate) summary_count: AtomicU32,
    pub(crate) summary_fetches: AtomicU32,
}

impl FakeStorefront {
    pub(crate) async fn respond_with(&self, response: Result<MutationResponse>) {
        self.add_responses.lock().await.push_back(response);
    }

    pub(crate) async fn set_section(&self, section_id: &str, markup: &str) {
        self.sections
            .lock()
            .await
            .insert(section_id.to_string(), markup.to_string());
    }

    /// Holds the next mutation until the returned sender fires.
    pub(crate) async fn gate_next_add(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.add_gate.lock().await = Some(rx);
        tx
    }

    pub(crate) fn set_summary_count(&self, count: u32) {
        self.summary_count.store(count, Ordering::SeqCst);
    }

    pub(crate) async fn add_call_count(&self) -> usize {
        self.add_calls.lock().await.len()
    }
}

#[async_trait]
impl StorefrontApi for FakeStorefront {
    async fn add_item(&self, request: &AddItemRequest) -> Result<MutationResponse> {
        self.add_calls.lock().await.push(request.clone());
        let gate = self.add_gate.lock().await.take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.add_responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(MutationResponse::Added(CartSnapshot::default())))
    }

    async fn fetch_section(&self, section_id: &str) -> Result<String> {
        self.section_fetches.fetch_add(1, Ordering::SeqCst);
        self.sections
            .lock()
            .await
            .get(section_id)
            .cloned()
            .ok_or_else(|| CartError::Status {
                status: 404,
                url: format!("/?section_id={section_id}"),
            })
    }

    async fn fetch_cart_summary(&self) -> Result<CartSummary> {
        self.summary_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(CartSummary {
            item_count: self.summary_count.load(Ordering::SeqCst),
            ..CartSummary::default()
        })
    }
}

pub(crate) fn transport_error() -> CartError {
    CartError::Status {
        status: 502,
        url: "/cart/add.js".into(),
    }
}

/// Page skeleton with an empty drawer, header icon and a focused add button.
pub(crate) fn page_document() -> Document {
    let document = Document::new();
    document.insert("cart-drawer", "");
    document.toggle_class("cart-drawer", "is-empty", true);
    document.insert("#CartDrawer", "");
    document.insert("#CartDrawer-Overlay", "");
    document.insert(".drawer__inner", "");
    document.insert(".drawer__inner-empty", "<p>Your cart is empty</p>");
    document.insert(".drawer__close", "");
    document.insert("#cart-icon-bubble", "");
    let button = document.insert("#product-form-submit", "Add to cart");
    document.focus(button);
    document
}
