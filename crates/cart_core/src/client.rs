//! Storefront endpoints: cart mutation, section fragments and the cart summary.

use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::{AddItemRequest, CartSummary, MutationResponse};
use tracing::debug;
use url::Url;

use crate::{
    config::Settings,
    error::{CartError, Result},
};

#[async_trait]
pub trait StorefrontApi: Send + Sync {
    /// Posts an add-to-cart mutation. Domain rejections come back as
    /// `Ok(MutationResponse::Rejected)`; only transport problems are errors.
    async fn add_item(&self, request: &AddItemRequest) -> Result<MutationResponse>;
    /// Raw markup of one section rendered against the current page.
    async fn fetch_section(&self, section_id: &str) -> Result<String>;
    async fn fetch_cart_summary(&self) -> Result<CartSummary>;
}

pub struct HttpStorefront {
    http: Client,
    base: Url,
    cart_add_path: String,
    cart_summary_path: String,
    page_path: String,
}

impl HttpStorefront {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            http: Client::new(),
            base: settings.storefront_base()?,
            cart_add_path: settings.cart_add_path.clone(),
            cart_summary_path: settings.cart_summary_path.clone(),
            page_path: settings.page_path.clone(),
        })
    }

    pub fn page_path(&self) -> &str {
        &self.page_path
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|err| CartError::Config(format!("invalid endpoint path '{path}': {err}")))
    }
}

#[async_trait]
impl StorefrontApi for HttpStorefront {
    async fn add_item(&self, request: &AddItemRequest) -> Result<MutationResponse> {
        let url = self.endpoint(&self.cart_add_path)?;
        debug!(%url, variant_id = request.id.0, quantity = request.quantity, "posting cart mutation");
        let response = self
            .http
            .post(url.clone())
            .header("X-Requested-With", "XMLHttpRequest")
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        // Rejections arrive with 4xx codes, so the body decides before the status does.
        match serde_json::from_str::<MutationResponse>(&body) {
            Ok(MutationResponse::Added(_)) | Err(_) if !status.is_success() => {
                Err(CartError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                })
            }
            Ok(parsed) => Ok(parsed),
            Err(err) => Err(CartError::Decode(err)),
        }
    }

    async fn fetch_section(&self, section_id: &str) -> Result<String> {
        let mut url = self.endpoint(&self.page_path)?;
        url.query_pairs_mut().append_pair("section_id", section_id);
        let markup = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(markup)
    }

    async fn fetch_cart_summary(&self) -> Result<CartSummary> {
        let url = self.endpoint(&self.cart_summary_path)?;
        let body = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
