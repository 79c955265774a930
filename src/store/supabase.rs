//! History store backed by Supabase's PostgREST interface.
//!
//! The store stays opaque behind the `HistoryStore` trait: this module only
//! renders the filter predicate into PostgREST query parameters and maps
//! transport or backend failures to `StoreUnavailable`.

use async_trait::async_trait;
use chrono::SecondsFormat;
use tracing::debug;

use crate::core::filter::HistoryFilter;
use crate::core::history::{HistoryStore, NewSavedRate, SavedRate};
use crate::error::{Error, Result};

const SELECT_COLUMNS: &str =
    "id,from_currency,to_currency,rate,note,user_id,user_name,created_at";

pub struct SupabaseStore {
    base_url: String,
    // Service-role key; backend only, never exposed to clients.
    api_key: String,
    table: String,
    client: reqwest::Client,
}

impl SupabaseStore {
    pub fn new(base_url: &str, api_key: &str, table: &str) -> Self {
        SupabaseStore {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            table: table.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

/// Renders the filter into PostgREST query parameters. Repeated `created_at`
/// keys are ANDed by PostgREST, which is how both bounds of a window apply.
fn query_params(filter: &HistoryFilter) -> Vec<(String, String)> {
    let mut params = vec![
        ("select".to_string(), SELECT_COLUMNS.to_string()),
        ("order".to_string(), "created_at.desc".to_string()),
        ("limit".to_string(), filter.limit.to_string()),
    ];
    if let Some(user_id) = &filter.user_id {
        params.push(("user_id".to_string(), format!("eq.{user_id}")));
    }
    if let Some(since) = filter.since {
        params.push((
            "created_at".to_string(),
            format!("gte.{}", since.to_rfc3339_opts(SecondsFormat::Millis, true)),
        ));
    }
    if let Some(until) = filter.until {
        params.push((
            "created_at".to_string(),
            format!("lte.{}", until.to_rfc3339_opts(SecondsFormat::Millis, true)),
        ));
    }
    if let Some(code) = &filter.from_currency {
        params.push(("from_currency".to_string(), format!("eq.{code}")));
    }
    if let Some(code) = &filter.to_currency {
        params.push(("to_currency".to_string(), format!("eq.{code}")));
    }
    params
}

#[async_trait]
impl HistoryStore for SupabaseStore {
    async fn insert(&self, record: NewSavedRate) -> Result<SavedRate> {
        let response = self
            .authed(self.client.post(self.table_url()))
            .header("Prefer", "return=representation")
            // PostgREST inserts take an array of rows.
            .json(&[&record])
            .send()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("insert request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::StoreUnavailable(format!(
                "insert returned HTTP {status}: {body}"
            )));
        }

        let rows: Vec<SavedRate> = response.json().await.map_err(|e| {
            Error::StoreUnavailable(format!("insert returned unexpected body: {e}"))
        })?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::StoreUnavailable("insert returned no rows".to_string()))
    }

    async fn query(&self, filter: &HistoryFilter) -> Result<Vec<SavedRate>> {
        let params = query_params(filter);
        debug!(?params, "Querying saved rates");

        let response = self
            .authed(self.client.get(self.table_url()))
            .query(&params)
            .send()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("query request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::StoreUnavailable(format!(
                "query returned HTTP {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("query returned unexpected body: {e}")))
    }
}
