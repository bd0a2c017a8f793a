use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(VariantId);
id_newtype!(ProductId);

/// Identifies the component that originated a cart event.
pub const PRODUCT_FORM_SOURCE: &str = "product-form";

/// Section ids rendered by the storefront's section endpoint.
pub mod sections {
    pub const CART_DRAWER: &str = "cart-drawer";
    pub const CART_ICON_BUBBLE: &str = "cart-icon-bubble";
}
