use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::core::currency;
use crate::core::filter::{FilterParams, Scope, build_filter};
use crate::core::history::{NewSavedRate, SavedRate};
use crate::error::Error;

const REQUIRED_FIELDS: &str = "Missing or invalid fields. Required: to, rate(number), userId";

/// POST /history
///
/// Saves a rate to the shared history. The body is parsed leniently: a
/// missing or non-JSON body fails the required-field check below rather than
/// content negotiation, so every bad request gets the same 400 shape.
pub async fn save_rate(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<(StatusCode, Json<SavedRate>), ApiError> {
    let body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    let record =
        parse_save_request(&body).map_err(|e| ApiError::from_core(e, "Failed to save rate"))?;

    let row = state
        .store
        .insert(record)
        .await
        .map_err(|e| ApiError::from_core(e, "Failed to save rate"))?;

    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /history/public
///
/// Latest saved rates across all users, newest first.
pub async fn public_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> Result<Json<Vec<SavedRate>>, ApiError> {
    let filter = build_filter(&params, Scope::Public)
        .map_err(|e| ApiError::from_core(e, "Failed to load public history"))?;

    let rows = state
        .store
        .query(&filter)
        .await
        .map_err(|e| ApiError::from_core(e, "Failed to load public history"))?;

    Ok(Json(rows))
}

/// GET /history/me?userId=...
///
/// Saved rates scoped to one user, newest first.
pub async fn personal_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> Result<Json<Vec<SavedRate>>, ApiError> {
    let filter = build_filter(&params, Scope::Personal)
        .map_err(|e| ApiError::from_core(e, "Failed to load user history"))?;

    let rows = state
        .store
        .query(&filter)
        .await
        .map_err(|e| ApiError::from_core(e, "Failed to load user history"))?;

    Ok(Json(rows))
}

/// Validates the save body: `to`, a positive numeric `rate`, and `userId` are
/// required, `from` defaults to JPY, and both currency legs must pass the
/// whitelist. All checks run before the store is touched.
fn parse_save_request(body: &Value) -> Result<NewSavedRate, Error> {
    let to = body.get("to").and_then(Value::as_str);
    let rate = body.get("rate").and_then(Value::as_f64);
    let user_id = body.get("userId").and_then(Value::as_str);

    let (Some(to), Some(rate), Some(user_id)) = (to, rate, user_id) else {
        return Err(Error::Validation(REQUIRED_FIELDS.to_string()));
    };
    if !rate.is_finite() || rate <= 0.0 || user_id.trim().is_empty() {
        return Err(Error::Validation(REQUIRED_FIELDS.to_string()));
    }

    let from = body
        .get("from")
        .and_then(Value::as_str)
        .unwrap_or(currency::DEFAULT_FROM);
    let from_currency = currency::ensure_supported(from)?;
    let to_currency = currency::ensure_supported(to)?;

    Ok(NewSavedRate {
        from_currency,
        to_currency,
        rate,
        note: body.get("note").and_then(Value::as_str).map(str::to_string),
        user_id: user_id.to_string(),
        user_name: body
            .get("userName")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn save_request_requires_to_rate_and_user() {
        for body in [
            json!({}),
            json!({ "to": "VND", "rate": 190.5 }),
            json!({ "to": "VND", "userId": "u1" }),
            json!({ "rate": 190.5, "userId": "u1" }),
            json!({ "to": "VND", "rate": "190.5", "userId": "u1" }),
            json!({ "to": "VND", "rate": 190.5, "userId": "" }),
            Value::Null,
        ] {
            let err = parse_save_request(&body).unwrap_err();
            assert!(
                matches!(err, Error::Validation(ref m) if m == REQUIRED_FIELDS),
                "accepted {body}"
            );
        }
    }

    #[test]
    fn save_request_rejects_non_positive_rate() {
        for rate in [0.0, -1.5] {
            let body = json!({ "to": "VND", "rate": rate, "userId": "u1" });
            assert!(parse_save_request(&body).is_err());
        }
    }

    #[test]
    fn save_request_defaults_from_to_jpy() {
        let body = json!({ "to": "VND", "rate": 190.5, "userId": "u1" });
        let record = parse_save_request(&body).unwrap();
        assert_eq!(record.from_currency, "JPY");
        assert_eq!(record.to_currency, "VND");
    }

    #[test]
    fn save_request_normalizes_currency_case() {
        let body = json!({ "from": "usd", "to": "sgd", "rate": 1.35, "userId": "u1" });
        let record = parse_save_request(&body).unwrap();
        assert_eq!(record.from_currency, "USD");
        assert_eq!(record.to_currency, "SGD");
    }

    #[test]
    fn save_request_rejects_unsupported_currency_on_either_leg() {
        let body = json!({ "from": "EUR", "to": "VND", "rate": 27000.0, "userId": "u1" });
        assert!(matches!(
            parse_save_request(&body).unwrap_err(),
            Error::UnsupportedCurrency(ref c) if c == "EUR"
        ));

        let body = json!({ "from": "JPY", "to": "GBP", "rate": 0.005, "userId": "u1" });
        assert!(matches!(
            parse_save_request(&body).unwrap_err(),
            Error::UnsupportedCurrency(ref c) if c == "GBP"
        ));
    }

    #[test]
    fn save_request_carries_optional_fields() {
        let body = json!({
            "to": "PHP",
            "rate": 0.38,
            "userId": "u1",
            "note": "payday transfer",
            "userName": "Aki"
        });
        let record = parse_save_request(&body).unwrap();
        assert_eq!(record.note.as_deref(), Some("payday transfer"));
        assert_eq!(record.user_name.as_deref(), Some("Aki"));
    }
}
