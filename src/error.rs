//! Service-wide error taxonomy.
//!
//! Variants split into two families: request problems (rejected before any
//! external call, rendered as 400s) and backend problems (upstream quote
//! source or history store, rendered as opaque 500s).

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("Unsupported currency code: {0}")]
    UnsupportedCurrency(String),

    #[error("Invalid date format; expected YYYY-MM-DD")]
    InvalidDateFormat,

    /// Carries the offending parameter name ("fromDate" or "toDate").
    #[error("Invalid {0}")]
    InvalidDateRange(String),

    #[error("Missing query param: userId")]
    MissingUserId,

    #[error("Quote source unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Unexpected response from quote source: {0}")]
    UpstreamFormat(String),

    #[error("History store unavailable: {0}")]
    StoreUnavailable(String),
}

impl Error {
    /// True for errors caused by the request itself rather than a backend.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::UnsupportedCurrency(_)
                | Error::InvalidDateFormat
                | Error::InvalidDateRange(_)
                | Error::MissingUserId
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
