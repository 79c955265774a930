use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Json;
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::core::currency;

#[derive(Debug, Deserialize)]
pub struct RateParams {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// GET /rate?from=JPY&to=VND
///
/// Live per-unit rate for a currency pair. `from` defaults to JPY.
pub async fn get_rate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RateParams>,
) -> Result<Json<Value>, ApiError> {
    let from = params
        .from
        .unwrap_or_else(|| currency::DEFAULT_FROM.to_string());
    let to = params
        .to
        .ok_or_else(|| ApiError::bad_request("Missing query param: to"))?;

    let quote = state
        .provider
        .fetch_rate(&from, &to)
        .await
        .map_err(|e| ApiError::from_core(e, "Failed to fetch exchange rate"))?;

    Ok(Json(json!({
        "from": quote.from,
        "to": quote.to,
        "rate": quote.rate,
        "provider": state.provider.name(),
        "fetchedAt": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })))
}
