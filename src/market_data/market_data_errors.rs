use thiserror::Error;

/// Failures surfaced by external market-data providers.
///
/// Providers never leak raw transport errors: every failure is normalized to
/// one of these variants so callers can decide retry behavior.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// Network failure, timeout or 5xx. Transient; safe to retry later.
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Explicit provider rate limit (HTTP 429). Behaves like an outage but
    /// is kept distinct for logging.
    #[error("Provider rate limit exceeded")]
    RateLimited,

    /// Successful response with a malformed or unexpected payload. Schema
    /// drift; do not retry aggressively.
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// Successful call that returned no meaningful data. Not an outage.
    #[error("Provider returned no data: {0}")]
    EmptyResult(String),
}
