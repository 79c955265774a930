//! History query filtering.
//!
//! Translates raw, optional, partially-overlapping query parameters (explicit
//! date, date range, currency codes, limit, userId) into a single unambiguous
//! predicate. All validation happens here, before any store access.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::Deserialize;

use crate::core::currency;
use crate::core::history::SavedRate;
use crate::error::{Error, Result};

pub const DEFAULT_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 200;

/// Raw query parameters as they arrive on the wire.
#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    pub limit: Option<String>,
    #[serde(rename = "fromDate")]
    pub from_date: Option<String>,
    #[serde(rename = "toDate")]
    pub to_date: Option<String>,
    pub date: Option<String>,
    pub from_currency: Option<String>,
    pub to_currency: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// Whether a history query is constrained to one user or unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Public,
    Personal,
}

/// Fully resolved history predicate.
///
/// Both time bounds are inclusive. Rows are always returned newest-first
/// (`created_at` descending); the ordering is part of the contract, not a
/// default callers can override.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryFilter {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub from_currency: Option<String>,
    pub to_currency: Option<String>,
    pub user_id: Option<String>,
    pub limit: u32,
}

impl Default for HistoryFilter {
    fn default() -> Self {
        Self {
            since: None,
            until: None,
            from_currency: None,
            to_currency: None,
            user_id: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl HistoryFilter {
    /// Applies the predicate (not the ordering or limit) to a single row.
    pub fn matches(&self, row: &SavedRate) -> bool {
        if let Some(since) = self.since {
            if row.created_at < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if row.created_at > until {
                return false;
            }
        }
        if let Some(code) = &self.from_currency {
            if row.from_currency != *code {
                return false;
            }
        }
        if let Some(code) = &self.to_currency {
            if row.to_currency != *code {
                return false;
            }
        }
        if let Some(user_id) = &self.user_id {
            if row.user_id != *user_id {
                return false;
            }
        }
        true
    }
}

/// Builds the filter for a history read.
///
/// Personal scope requires a non-empty `userId`, checked before anything else
/// is parsed. An exact `date` takes exclusive precedence over `fromDate` /
/// `toDate`: the range parameters are still validated but ignored, not
/// merged. Currency codes are uppercased without whitelist rejection, so an
/// unsupported code filters to an empty result instead of failing.
pub fn build_filter(params: &FilterParams, scope: Scope) -> Result<HistoryFilter> {
    let user_id = match scope {
        Scope::Personal => match params.user_id.as_deref() {
            Some(id) if !id.trim().is_empty() => Some(id.to_string()),
            _ => return Err(Error::MissingUserId),
        },
        Scope::Public => None,
    };

    let day = params.date.as_deref().map(parse_day).transpose()?;
    let from_ts = parse_range_bound(params.from_date.as_deref(), "fromDate")?;
    let to_ts = parse_range_bound(params.to_date.as_deref(), "toDate")?;

    let (since, until) = match day {
        Some(day) => {
            let (start, end) = day_window(day);
            (Some(start), Some(end))
        }
        None => (from_ts, to_ts),
    };

    Ok(HistoryFilter {
        since,
        until,
        from_currency: params.from_currency.as_deref().map(currency::normalize),
        to_currency: params.to_currency.as_deref().map(currency::normalize),
        user_id,
        limit: parse_limit(params.limit.as_deref()),
    })
}

/// Accepts only the literal `YYYY-MM-DD` shape naming a real calendar day.
fn parse_day(raw: &str) -> Result<NaiveDate> {
    let bytes = raw.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shape_ok {
        return Err(Error::InvalidDateFormat);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| Error::InvalidDateFormat)
}

fn parse_range_bound(raw: Option<&str>, param: &str) -> Result<Option<DateTime<Utc>>> {
    match raw {
        None => Ok(None),
        Some(s) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| Error::InvalidDateRange(param.to_string())),
    }
}

/// Lenient date-time parsing: RFC 3339, a naive date-time taken as UTC, or a
/// bare date taken as UTC midnight.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)))
}

/// Inclusive UTC window [00:00:00.000, 23:59:59.999] for a calendar day.
fn day_window(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN));
    let end = start + Duration::days(1) - Duration::milliseconds(1);
    (start, end)
}

/// Defaults to 50 when absent or unparsable, capped at 200 regardless of what
/// was requested.
fn parse_limit(raw: Option<&str>) -> u32 {
    match raw.and_then(|s| s.trim().parse::<u32>().ok()) {
        None | Some(0) => DEFAULT_LIMIT,
        Some(n) => n.min(MAX_LIMIT),
    }
}
