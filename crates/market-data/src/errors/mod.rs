//! Error types for the market data crate.
//!
//! Provider internals return [`MarketDataError`] so failures keep their
//! cause for logging. The provider traits collapse every error into "no
//! data" at their boundary; only [`MarketDataError::InvalidInput`] is meant
//! to reach an HTTP caller.

use thiserror::Error;

/// Result alias used by the service layer.
pub type Result<T> = std::result::Result<T, MarketDataError>;

/// Errors that can occur during market data operations.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The provider does not know the requested symbol.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The symbol exists but the provider returned no usable data.
    #[error("No data: {provider} - {symbol}")]
    NoData {
        /// The provider that returned nothing
        provider: String,
        /// The symbol that was requested
        symbol: String,
    },

    /// The provider rate limited the request (HTTP 429 or an in-band note).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// A provider-specific error occurred (non-2xx status, API error body).
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider answered with a payload we could not interpret.
    #[error("Invalid payload from {provider}: {message}")]
    InvalidPayload {
        /// The provider that sent the payload
        provider: String,
        /// What was wrong with it
        message: String,
    },

    /// Caller input was rejected before any provider was contacted.
    #[error("{0}")]
    InvalidInput(String),

    /// The symbol universe could not be loaded.
    #[error("Universe load failed: {0}")]
    Universe(String),
}

impl MarketDataError {
    /// Whether the failure is likely to clear up on its own.
    ///
    /// Transient failures are logged at `warn`, the rest at `debug`: an
    /// unknown symbol on one provider is routine during fallback.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Timeout { .. })
    }

    /// Shorthand for rejecting caller input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_is_transient() {
        let error = MarketDataError::RateLimited {
            provider: "FINNHUB".to_string(),
        };
        assert!(error.is_transient());
    }

    #[test]
    fn test_timeout_is_transient() {
        let error = MarketDataError::Timeout {
            provider: "ALPHA_VANTAGE".to_string(),
        };
        assert!(error.is_transient());
    }

    #[test]
    fn test_symbol_not_found_is_not_transient() {
        let error = MarketDataError::SymbolNotFound("NOPE.NS".to_string());
        assert!(!error.is_transient());
    }

    #[test]
    fn test_invalid_payload_is_not_transient() {
        let error = MarketDataError::InvalidPayload {
            provider: "TWELVE_DATA".to_string(),
            message: "missing price".to_string(),
        };
        assert!(!error.is_transient());
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::SymbolNotFound("INVALID".to_string());
        assert_eq!(format!("{}", error), "Symbol not found: INVALID");

        let error = MarketDataError::ProviderError {
            provider: "ALPHA_VANTAGE".to_string(),
            message: "API key invalid".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Provider error: ALPHA_VANTAGE - API key invalid"
        );

        let error = MarketDataError::invalid_input("No valid symbols provided.");
        assert_eq!(format!("{}", error), "No valid symbols provided.");
    }
}
