//! Wellness-shop order model.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::lenient;
use super::non_empty;
use super::timestamp::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(into = "String")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Other(String),
    #[default]
    Unknown,
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Other(label) => label,
            Self::Unknown => "unknown",
        }
    }

    pub fn is_assignable(&self) -> bool {
        !matches!(self, Self::Other(_) | Self::Unknown)
    }
}

impl From<Option<String>> for OrderStatus {
    fn from(raw: Option<String>) -> Self {
        match raw.as_deref() {
            None | Some("") => Self::Unknown,
            Some("pending") => Self::Pending,
            Some("confirmed") => Self::Confirmed,
            Some("processing") => Self::Processing,
            Some("shipped") => Self::Shipped,
            Some("delivered") => Self::Delivered,
            Some("cancelled") => Self::Cancelled,
            Some(other) => Self::Other(other.to_string()),
        }
    }
}

/// Non-string values decode to `Unknown` instead of failing the record.
impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient::label(deserializer).map(Self::from)
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Product snapshot embedded in a cart line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductRef {
    #[serde(deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One order line. Older orders carry `productName`/`name`, newer ones a
/// nested `product` snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderItem {
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductRef>,
    #[serde(deserialize_with = "lenient::optional_number")]
    pub quantity: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OrderItem {
    pub fn display_name(&self) -> &str {
        non_empty(&self.product_name)
            .or_else(|| non_empty(&self.name))
            .or_else(|| self.product.as_ref().and_then(|p| non_empty(&p.name)))
            .unwrap_or("Unknown Product")
    }

    /// Ordered quantity; a missing or zero quantity counts as one unit.
    pub fn units(&self) -> f64 {
        self.quantity.filter(|q| *q != 0.0).unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShopOrder {
    #[serde(deserialize_with = "lenient::id")]
    pub order_id: String,
    #[serde(deserialize_with = "lenient::list")]
    pub items: Vec<OrderItem>,
    #[serde(deserialize_with = "lenient::number")]
    pub subtotal: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub discount: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub tax: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub total: f64,
    pub created_at: Timestamp,
    pub status: OrderStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatus {
    pub status: OrderStatus,
}
