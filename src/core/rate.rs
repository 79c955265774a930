//! Quote abstractions and core types

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// A single per-unit conversion rate, produced per-request and never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct RateQuote {
    pub from: String,
    pub to: String,
    pub rate: f64,
    /// Raw provider payload, kept for server-side debugging only.
    #[serde(skip)]
    pub raw: Option<serde_json::Value>,
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Short identifier echoed in rate responses (e.g. "revolut").
    fn name(&self) -> &'static str;

    /// Fetches the per-unit rate for a currency pair. Codes are normalized
    /// and whitelist-checked before any upstream call; a same-currency pair
    /// short-circuits to rate 1 without touching the network.
    async fn fetch_rate(&self, from: &str, to: &str) -> Result<RateQuote>;
}
