//! Wellness-shop product model and validated admin input.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use super::lenient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShopCategory {
    Mind,
    Body,
    Sleep,
    Digital,
    GiftKit,
}

impl ShopCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mind => "mind",
            Self::Body => "body",
            Self::Sleep => "sleep",
            Self::Digital => "digital",
            Self::GiftKit => "giftKit",
        }
    }
}

/// Stored product. `category` stays a plain string on read so legacy
/// values never break listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub price: f64,
    #[serde(deserialize_with = "lenient::string")]
    pub image_url: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient::integer")]
    pub stock: i64,
    #[serde(deserialize_with = "lenient::number")]
    pub rating: f64,
    #[serde(deserialize_with = "lenient::integer")]
    pub review_count: i64,
    #[serde(deserialize_with = "lenient::flag")]
    pub is_therapist_recommended: bool,
    #[serde(deserialize_with = "lenient::list")]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Product form submitted by an administrator.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 1000, message = "Description is required"))]
    pub description: String,
    #[validate(range(exclusive_min = 0.0, message = "Price must be positive"))]
    pub price: f64,
    #[validate(url(message = "Must be a valid URL"))]
    pub image_url: String,
    pub category: ShopCategory,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i64,
    /// Comma-separated tag list as typed into the form.
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub is_therapist_recommended: bool,
}

/// Partial product update; only present fields are validated and written.
#[derive(Debug, Clone, Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 1000, message = "Description is required"))]
    pub description: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "Price must be positive"))]
    pub price: Option<f64>,
    #[validate(url(message = "Must be a valid URL"))]
    pub image_url: Option<String>,
    pub category: Option<ShopCategory>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: Option<i64>,
    pub tags: Option<String>,
    pub is_therapist_recommended: Option<bool>,
}

/// Split a comma-separated tag string, dropping blanks.
pub fn parse_product_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

impl ProductInput {
    /// Document payload for a new product; ratings start at zero.
    pub fn into_document(self) -> Map<String, Value> {
        let mut doc = Map::new();
        doc.insert("name".into(), Value::String(self.name));
        doc.insert("description".into(), Value::String(self.description));
        doc.insert("price".into(), Value::from(self.price));
        doc.insert("imageUrl".into(), Value::String(self.image_url));
        doc.insert("category".into(), Value::String(self.category.as_str().to_string()));
        doc.insert("stock".into(), Value::from(self.stock));
        doc.insert("tags".into(), Value::from(parse_product_tags(&self.tags)));
        doc.insert(
            "isTherapistRecommended".into(),
            Value::Bool(self.is_therapist_recommended),
        );
        doc.insert("rating".into(), Value::from(0));
        doc.insert("reviewCount".into(), Value::from(0));
        doc
    }
}

impl ProductUpdate {
    pub fn into_fields(self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(name) = self.name {
            fields.insert("name".into(), Value::String(name));
        }
        if let Some(description) = self.description {
            fields.insert("description".into(), Value::String(description));
        }
        if let Some(price) = self.price {
            fields.insert("price".into(), Value::from(price));
        }
        if let Some(image_url) = self.image_url {
            fields.insert("imageUrl".into(), Value::String(image_url));
        }
        if let Some(category) = self.category {
            fields.insert("category".into(), Value::String(category.as_str().to_string()));
        }
        if let Some(stock) = self.stock {
            fields.insert("stock".into(), Value::from(stock));
        }
        if let Some(tags) = self.tags {
            fields.insert("tags".into(), Value::from(parse_product_tags(&tags)));
        }
        if let Some(flag) = self.is_therapist_recommended {
            fields.insert("isTherapistRecommended".into(), Value::Bool(flag));
        }
        fields
    }
}
