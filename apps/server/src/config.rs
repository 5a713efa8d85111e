use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{anyhow, Context};
use stockdash_market_data::{
    DEFAULT_CACHE_TTL, DEFAULT_FETCH_CONCURRENCY, DEFAULT_MARKET_SUFFIX, DEFAULT_PROVIDER_TIMEOUT,
};

/// Log output format selected by `STOCKDASH_LOG_FORMAT`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(anyhow!("expected 'text' or 'json', got '{}'", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub resolve_deadline: Duration,
    pub log_format: LogFormat,
    pub universe_path: PathBuf,
    pub market_suffix: String,
    pub cache_ttl: Duration,
    pub fetch_concurrency: usize,
    pub provider_timeout: Duration,
    pub alpha_vantage_api_key: Option<String>,
    pub twelve_data_api_key: Option<String>,
    pub finnhub_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            cors_allow: vec!["*".to_string()],
            request_timeout: Duration::from_millis(30_000),
            resolve_deadline: Duration::from_millis(25_000),
            log_format: LogFormat::Text,
            universe_path: PathBuf::from("data/nse_all_stocks.json"),
            market_suffix: DEFAULT_MARKET_SUFFIX.to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            alpha_vantage_api_key: None,
            twelve_data_api_key: None,
            finnhub_api_key: None,
        }
    }
}

impl Config {
    /// Read configuration from the process environment (after `.env`).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Unset or blank variables take their defaults; malformed ones are an
    /// error.
    pub fn from_vars<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let listen_addr = parse_or(&var, "STOCKDASH_LISTEN_ADDR", defaults.listen_addr)?;
        let cors_allow = match var("STOCKDASH_CORS_ALLOW_ORIGINS") {
            Some(origins) => origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.cors_allow,
        };
        let timeout_ms: u64 = parse_or(
            &var,
            "STOCKDASH_REQUEST_TIMEOUT_MS",
            defaults.request_timeout.as_millis() as u64,
        )?;
        let deadline_ms: u64 = parse_or(
            &var,
            "STOCKDASH_RESOLVE_DEADLINE_MS",
            defaults.resolve_deadline.as_millis() as u64,
        )?;
        // The service has to answer before the HTTP backstop fires.
        if deadline_ms == 0 || deadline_ms >= timeout_ms {
            return Err(anyhow!(
                "STOCKDASH_RESOLVE_DEADLINE_MS ({}) must be between 1 and STOCKDASH_REQUEST_TIMEOUT_MS ({})",
                deadline_ms,
                timeout_ms
            ));
        }
        let log_format = parse_or(&var, "STOCKDASH_LOG_FORMAT", defaults.log_format)?;
        let universe_path = var("STOCKDASH_UNIVERSE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.universe_path);
        let market_suffix = var("STOCKDASH_MARKET_SUFFIX").unwrap_or(defaults.market_suffix);
        let cache_ttl_secs: u64 =
            parse_or(&var, "LIVE_CACHE_TTL", defaults.cache_ttl.as_secs())?;
        let fetch_concurrency: usize =
            parse_or(&var, "LIVE_FETCH_CONCURRENCY", defaults.fetch_concurrency)?;
        if fetch_concurrency == 0 {
            return Err(anyhow!("LIVE_FETCH_CONCURRENCY must be at least 1"));
        }
        let provider_timeout_secs: u64 = parse_or(
            &var,
            "STOCKDASH_PROVIDER_TIMEOUT_SECS",
            defaults.provider_timeout.as_secs(),
        )?;

        Ok(Self {
            listen_addr,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            resolve_deadline: Duration::from_millis(deadline_ms),
            log_format,
            universe_path,
            market_suffix,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            fetch_concurrency,
            provider_timeout: Duration::from_secs(provider_timeout_secs),
            alpha_vantage_api_key: var("ALPHA_VANTAGE_API_KEY"),
            twelve_data_api_key: var("TWELVE_DATA_API_KEY"),
            finnhub_api_key: var("FINNHUB_API_KEY"),
        })
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e: T::Err| anyhow!("{}", e))
            .with_context(|| format!("Invalid {}: '{}'", key, raw)),
        None => Ok(default),
    }
}
