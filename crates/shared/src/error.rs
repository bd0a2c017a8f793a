use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body returned by the mutation endpoint when the storefront refuses an add.
///
/// `status` is present on every rejection; storefronts send it either as the
/// HTTP code (`422`) or as a short string (`"bad_request"`), so it is kept as a
/// raw JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartRejection {
    pub status: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
}

impl CartRejection {
    pub fn new(status: impl Into<Value>, description: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            message: None,
            description: Some(description.into()),
            errors: None,
        }
    }

    /// Text shown in the inline error region of the product form.
    pub fn user_message(&self) -> &str {
        self.description
            .as_deref()
            .or(self.message.as_deref())
            .unwrap_or("Unable to add item to cart")
    }

    /// Error detail carried by `cart:error`: structured `errors` when present,
    /// falling back to the description.
    pub fn detail(&self) -> Value {
        match (&self.errors, &self.description) {
            (Some(errors), _) => errors.clone(),
            (None, Some(description)) => Value::String(description.clone()),
            (None, None) => Value::Null,
        }
    }
}
