//! Review moderation.
//!
//! Reviews live inside their therapist's document. [`TherapistReviews`] owns
//! that embedded array for one read-modify-write cycle and keeps the
//! `reviewsCount` counter in step with it.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use validator::Validate;

use crate::db::{collections, new_document_id, DocumentStore};
use crate::errors::AppError;
use crate::models::pagination::{PagedResult, Pagination};
use crate::models::therapist::{CreateReview, Review, ReviewListing, Therapist};
use crate::models::timestamp::{iso_string, normalize_document};
use crate::services::page_cache::PageCache;
use crate::services::therapist::therapist_paths;
use crate::services::{decode_all, sort_newest_first};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewFilters {
    pub flagged: Option<bool>,
}

/// Every therapist's reviews, flattened and newest first.
pub async fn list(
    store: &dyn DocumentStore,
    filters: &ReviewFilters,
    pagination: &Pagination,
) -> Result<PagedResult<ReviewListing>, AppError> {
    let docs = store.list_all(collections::THERAPISTS).await?;
    let therapists: Vec<Therapist> = decode_all(collections::THERAPISTS, "id", &docs);

    let mut reviews: Vec<ReviewListing> = therapists
        .into_iter()
        .flat_map(|therapist| {
            let therapist_id = therapist.id.clone();
            let therapist_name = therapist.display_name().to_string();
            therapist.reviews.into_iter().map(move |review| ReviewListing {
                review,
                therapist_id: therapist_id.clone(),
                therapist_name: therapist_name.clone(),
            })
        })
        .filter(|listing| filters.flagged.map_or(true, |f| listing.review.flagged == f))
        .collect();
    sort_newest_first(&mut reviews, |listing| listing.review.date.get());
    Ok(PagedResult::paginate(reviews, pagination))
}

fn entry_id(review: &Value) -> Option<&str> {
    review.get("id").and_then(Value::as_str)
}

/// The embedded review list of one therapist.
///
/// Entries are kept as stored so fields this service does not know about
/// survive a rewrite.
#[derive(Debug, Clone)]
pub struct TherapistReviews {
    therapist_id: String,
    reviews: Vec<Value>,
    reviews_count: i64,
}

impl TherapistReviews {
    pub async fn load(store: &dyn DocumentStore, therapist_id: &str) -> Result<Self, AppError> {
        let doc = store
            .get_by_id(collections::THERAPISTS, therapist_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Therapist not found".to_string()))?;

        let reviews = match doc.data.get("reviews") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        let reviews_count = doc
            .data
            .get("reviewsCount")
            .and_then(Value::as_f64)
            .map(|n| n as i64)
            .unwrap_or(0);

        Ok(Self {
            therapist_id: therapist_id.to_string(),
            reviews,
            reviews_count,
        })
    }

    pub fn therapist_id(&self) -> &str {
        &self.therapist_id
    }

    pub fn reviews_count(&self) -> i64 {
        self.reviews_count
    }

    /// Decoded view of the current entries; undecodable ones are skipped.
    pub fn reviews(&self) -> Vec<Review> {
        self.reviews
            .iter()
            .filter_map(|r| serde_json::from_value(normalize_document(r.clone())).ok())
            .collect()
    }

    /// Append a validated review and return its id.
    pub fn add_review(&mut self, input: CreateReview, now: DateTime<Utc>) -> Result<String, AppError> {
        input.validate()?;
        let id = new_document_id();
        self.reviews.push(json!({
            "id": id,
            "reviewerName": input.reviewer_name,
            "rating": input.rating,
            "comment": input.comment,
            "date": iso_string(now),
            "isVerified": input.is_verified,
            "helpfulCount": 0,
            "flagged": false,
        }));
        self.reviews_count += 1;
        Ok(id)
    }

    /// Set the moderation flag on every entry with `review_id`.
    pub fn set_flag(&mut self, review_id: &str, flagged: bool) -> Result<(), AppError> {
        let mut matched = false;
        for review in self
            .reviews
            .iter_mut()
            .filter(|r| entry_id(r) == Some(review_id))
        {
            if let Value::Object(fields) = review {
                fields.insert("flagged".into(), Value::Bool(flagged));
                matched = true;
            }
        }
        if !matched {
            return Err(AppError::NotFound("Review not found".to_string()));
        }
        Ok(())
    }

    /// Drop every entry with `review_id`, returning how many were removed.
    /// The counter never drops below zero.
    pub fn remove(&mut self, review_id: &str) -> Result<usize, AppError> {
        let before = self.reviews.len();
        self.reviews.retain(|r| entry_id(r) != Some(review_id));
        let removed = before - self.reviews.len();
        if removed == 0 {
            return Err(AppError::NotFound("Review not found".to_string()));
        }
        self.reviews_count = (self.reviews_count - removed as i64).max(0);
        Ok(removed)
    }

    /// Write the list and counter back and drop the affected cached pages.
    pub async fn save(self, store: &dyn DocumentStore, cache: &PageCache) -> Result<(), AppError> {
        let mut fields = Map::new();
        fields.insert("reviews".into(), Value::Array(self.reviews));
        fields.insert("reviewsCount".into(), json!(self.reviews_count));
        store
            .merge(collections::THERAPISTS, &self.therapist_id, fields)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => AppError::NotFound("Therapist not found".to_string()),
                other => other,
            })?;

        let mut paths = therapist_paths(&self.therapist_id);
        paths.push("/reviews".to_string());
        cache.invalidate(&paths).await;
        Ok(())
    }
}

/// Post a review on a therapist and return the stored entry.
pub async fn add_review(
    store: &dyn DocumentStore,
    cache: &PageCache,
    therapist_id: &str,
    input: CreateReview,
    now: DateTime<Utc>,
) -> Result<Review, AppError> {
    let mut aggregate = TherapistReviews::load(store, therapist_id).await?;
    let id = aggregate.add_review(input, now)?;
    let review = aggregate
        .reviews()
        .into_iter()
        .find(|r| r.has_id(&id))
        .ok_or_else(|| AppError::Internal(format!("Review {id} could not be decoded")))?;
    aggregate.save(store, cache).await?;
    tracing::info!(therapist_id, review_id = %id, "Review added");
    Ok(review)
}

pub async fn set_flag(
    store: &dyn DocumentStore,
    cache: &PageCache,
    therapist_id: &str,
    review_id: &str,
    flagged: bool,
) -> Result<(), AppError> {
    let mut aggregate = TherapistReviews::load(store, therapist_id).await?;
    aggregate.set_flag(review_id, flagged)?;
    aggregate.save(store, cache).await?;
    tracing::info!(therapist_id, review_id, flagged, "Review moderation flag changed");
    Ok(())
}

pub async fn remove(
    store: &dyn DocumentStore,
    cache: &PageCache,
    therapist_id: &str,
    review_id: &str,
) -> Result<usize, AppError> {
    let mut aggregate = TherapistReviews::load(store, therapist_id).await?;
    let removed = aggregate.remove(review_id)?;
    aggregate.save(store, cache).await?;
    tracing::info!(therapist_id, review_id, removed, "Review removed");
    Ok(removed)
}
