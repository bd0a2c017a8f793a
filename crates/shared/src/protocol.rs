use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{ProductId, VariantId},
    error::CartRejection,
};

pub const CART_UPDATE_CHANNEL: &str = "cart:update";
pub const CART_ERROR_CHANNEL: &str = "cart:error";

/// Payload posted to the mutation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddItemRequest {
    pub id: VariantId,
    pub quantity: u32,
    /// Comma separated section ids the storefront should render into the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections_url: Option<String>,
}

impl AddItemRequest {
    pub fn new(id: VariantId, quantity: u32) -> Self {
        Self {
            id,
            quantity,
            sections: None,
            sections_url: None,
        }
    }

    pub fn with_sections<'a>(
        mut self,
        section_ids: impl IntoIterator<Item = &'a str>,
        sections_url: impl Into<String>,
    ) -> Self {
        let joined = section_ids.into_iter().collect::<Vec<_>>().join(",");
        if !joined.is_empty() {
            self.sections = Some(joined);
            self.sections_url = Some(sections_url.into());
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: VariantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub title: String,
    pub quantity: u32,
    #[serde(default)]
    pub final_line_price: i64,
}

/// Server-authoritative cart state as returned by a successful mutation.
///
/// Each fetch yields an independent copy; nothing on the client writes back
/// into it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    #[serde(default)]
    pub item_count: u32,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub total_price: i64,
    /// Rendered section markup keyed by section id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sections: BTreeMap<String, String>,
}

impl CartSnapshot {
    pub fn section(&self, section_id: &str) -> Option<&str> {
        self.sections.get(section_id).map(String::as_str)
    }
}

/// Body of the cheaper cart summary endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartSummary {
    pub item_count: u32,
    #[serde(default)]
    pub total_price: i64,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

/// Either side of the mutation endpoint's contract. Rejections are recognised
/// by their `status` field, so that variant is tried first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MutationResponse {
    Rejected(CartRejection),
    Added(CartSnapshot),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartUpdate {
    pub source: String,
    pub product_variant_id: VariantId,
    pub cart_data: CartSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartErrorEvent {
    pub source: String,
    pub product_variant_id: VariantId,
    pub errors: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Events fanned out to cart subscribers. Payload shapes are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum CartEvent {
    #[serde(rename = "cart:update")]
    Update(CartUpdate),
    #[serde(rename = "cart:error")]
    Error(CartErrorEvent),
}

impl CartEvent {
    pub fn channel(&self) -> &'static str {
        match self {
            CartEvent::Update(_) => CART_UPDATE_CHANNEL,
            CartEvent::Error(_) => CART_ERROR_CHANNEL,
        }
    }

    pub fn product_variant_id(&self) -> VariantId {
        match self {
            CartEvent::Update(update) => update.product_variant_id,
            CartEvent::Error(error) => error.product_variant_id,
        }
    }
}
