//! In-process history store.
//!
//! Backs the test suites and the `memory` config backend. Applies the same
//! predicate, ordering, and limit contract as the relational backend.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::core::filter::HistoryFilter;
use crate::core::history::{HistoryStore, NewSavedRate, SavedRate};
use crate::error::Result;

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    rows: Vec<SavedRate>,
    next_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn insert(&self, record: NewSavedRate) -> Result<SavedRate> {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let row = SavedRate {
            id: inner.next_id,
            from_currency: record.from_currency,
            to_currency: record.to_currency,
            rate: record.rate,
            note: record.note,
            user_id: record.user_id,
            user_name: record.user_name,
            created_at: Utc::now(),
        };
        inner.rows.push(row.clone());
        Ok(row)
    }

    async fn query(&self, filter: &HistoryFilter) -> Result<Vec<SavedRate>> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<SavedRate> = inner
            .rows
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect();
        // Newest first; id breaks ties between rows created in the same instant.
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(filter.limit as usize);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user_id: &str, from: &str, to: &str) -> NewSavedRate {
        NewSavedRate {
            from_currency: from.to_string(),
            to_currency: to.to_string(),
            rate: 190.5,
            note: None,
            user_id: user_id.to_string(),
            user_name: None,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamp() {
        let store = MemoryStore::new();
        let before = Utc::now();

        let first = store.insert(record("u1", "JPY", "VND")).await.unwrap();
        let second = store.insert(record("u1", "JPY", "PHP")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert!(first.created_at >= before);
        assert!(second.created_at >= first.created_at);
    }

    #[tokio::test]
    async fn test_query_returns_newest_first() {
        let store = MemoryStore::new();
        store.insert(record("u1", "JPY", "VND")).await.unwrap();
        store.insert(record("u1", "JPY", "PHP")).await.unwrap();
        store.insert(record("u2", "USD", "SGD")).await.unwrap();

        let rows = store.query(&HistoryFilter::default()).await.unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_query_applies_limit() {
        let store = MemoryStore::new();
        for _ in 0..5 {
            store.insert(record("u1", "JPY", "VND")).await.unwrap();
        }

        let filter = HistoryFilter {
            limit: 2,
            ..HistoryFilter::default()
        };
        let rows = store.query(&filter).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 5);
    }

    #[tokio::test]
    async fn test_query_scopes_to_user() {
        let store = MemoryStore::new();
        store.insert(record("u1", "JPY", "VND")).await.unwrap();
        store.insert(record("u2", "JPY", "VND")).await.unwrap();

        let filter = HistoryFilter {
            user_id: Some("u2".to_string()),
            ..HistoryFilter::default()
        };
        let rows = store.query(&filter).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, "u2");
    }

    #[tokio::test]
    async fn test_query_for_unknown_user_is_empty_not_an_error() {
        let store = MemoryStore::new();
        store.insert(record("u1", "JPY", "VND")).await.unwrap();

        let filter = HistoryFilter {
            user_id: Some("nobody".to_string()),
            ..HistoryFilter::default()
        };
        let rows = store.query(&filter).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_query_filters_by_currency_leg() {
        let store = MemoryStore::new();
        store.insert(record("u1", "JPY", "VND")).await.unwrap();
        store.insert(record("u1", "USD", "VND")).await.unwrap();

        let filter = HistoryFilter {
            from_currency: Some("USD".to_string()),
            ..HistoryFilter::default()
        };
        let rows = store.query(&filter).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].from_currency, "USD");
    }

    #[tokio::test]
    async fn test_same_currency_save_is_permitted() {
        // The provider short-circuits same-currency quotes, but the store
        // does not enforce from != to.
        let store = MemoryStore::new();
        let row = store.insert(record("u1", "JPY", "JPY")).await.unwrap();
        assert_eq!(row.from_currency, row.to_currency);
    }
}
