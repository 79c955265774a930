//! Saved-rate records and the history store boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::filter::HistoryFilter;
use crate::error::Result;

/// A persisted rate record. Immutable once created: the store assigns `id`
/// and `created_at` at insert time and rows are never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedRate {
    pub id: i64,
    pub from_currency: String,
    pub to_currency: String,
    pub rate: f64,
    pub note: Option<String>,
    pub user_id: String,
    pub user_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload; the store fills in the system-assigned fields.
#[derive(Debug, Clone, Serialize)]
pub struct NewSavedRate {
    pub from_currency: String,
    pub to_currency: String,
    pub rate: f64,
    pub note: Option<String>,
    pub user_id: String,
    pub user_name: Option<String>,
}

/// Boundary to the opaque relational store. Any backend that can apply the
/// filter predicate, order by `created_at` descending, and cap the row count
/// satisfies it.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Persists a record, assigning `id` and `created_at`, and returns the
    /// full stored row.
    async fn insert(&self, record: NewSavedRate) -> Result<SavedRate>;

    /// Runs a filtered, ordered, limited read. Returns an empty vec (never an
    /// error) when nothing matches.
    async fn query(&self, filter: &HistoryFilter) -> Result<Vec<SavedRate>>;
}
