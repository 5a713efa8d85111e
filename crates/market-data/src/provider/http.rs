//! Shared outbound HTTP for the key-authenticated JSON providers.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::MarketDataError;

/// Per-request timeout applied to every provider call.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Build a client with the given per-request timeout.
///
/// Fails rather than falling back to a client without a timeout.
pub(crate) fn build_client(provider: &str, timeout: Duration) -> Result<Client, MarketDataError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| MarketDataError::ProviderError {
            provider: provider.to_string(),
            message: format!("Failed to build HTTP client: {}", e),
        })
}

/// GET `base_url` with query `params` and return the body text.
///
/// The API key travels as a query parameter; it is redacted from logs.
pub(crate) async fn get_text(
    client: &Client,
    provider: &str,
    base_url: &str,
    params: &[(&str, &str)],
    api_key: &str,
) -> Result<String, MarketDataError> {
    let url =
        Url::parse_with_params(base_url, params).map_err(|e| MarketDataError::ProviderError {
            provider: provider.to_string(),
            message: format!("Failed to build URL: {}", e),
        })?;

    debug!("{} request: {}", provider, redact(url.as_str(), api_key));

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            MarketDataError::Timeout {
                provider: provider.to_string(),
            }
        } else {
            MarketDataError::ProviderError {
                provider: provider.to_string(),
                message: redact(&e.to_string(), api_key),
            }
        }
    })?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(MarketDataError::RateLimited {
            provider: provider.to_string(),
        });
    }

    if !status.is_success() {
        return Err(MarketDataError::ProviderError {
            provider: provider.to_string(),
            message: format!("HTTP {}", status),
        });
    }

    response.text().await.map_err(|e| {
        if e.is_timeout() {
            MarketDataError::Timeout {
                provider: provider.to_string(),
            }
        } else {
            MarketDataError::ProviderError {
                provider: provider.to_string(),
                message: format!("Failed to read response: {}", e),
            }
        }
    })
}

/// Deserialize a provider body, mapping failures to `InvalidPayload`.
pub(crate) fn parse_json<T: DeserializeOwned>(
    provider: &str,
    body: &str,
) -> Result<T, MarketDataError> {
    serde_json::from_str(body).map_err(|e| MarketDataError::InvalidPayload {
        provider: provider.to_string(),
        message: format!("Failed to parse response: {}", e),
    })
}

fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        text.to_string()
    } else {
        text.replace(secret, "***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_redact_hides_key() {
        let url = "https://example.test/quote?symbol=FOO&apikey=s3cret";
        assert_eq!(
            redact(url, "s3cret"),
            "https://example.test/quote?symbol=FOO&apikey=***"
        );
        assert_eq!(redact(url, ""), url);
    }

    #[test]
    fn test_build_client_with_timeout() {
        assert!(build_client("TEST", Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn test_parse_json_maps_errors() {
        #[derive(Debug, Deserialize)]
        struct Body {
            #[allow(dead_code)]
            price: f64,
        }

        let err = parse_json::<Body>("TEST", "not json").unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidPayload { .. }));
        assert!(parse_json::<Body>("TEST", r#"{"price": 1.5}"#).is_ok());
    }
}
