use std::sync::Arc;

use stockdash_market_data::{
    AlphaVantageProvider, FanOut, FinnhubProvider, HistoryProvider, HistoryResolver,
    QuoteCache, QuoteProvider, QuoteResolver, StockService, StockServiceTrait, SymbolNormalizer,
    TwelveDataProvider, Universe, YahooProvider,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, LogFormat};

pub struct AppState {
    pub stock_service: Arc<dyn StockServiceTrait + Send + Sync>,
}

impl AppState {
    pub fn new(stock_service: Arc<dyn StockServiceTrait + Send + Sync>) -> Self {
        Self { stock_service }
    }
}

pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry.with(fmt::layer()).init(),
    }
}

/// Providers with keys, in fallback order: Alpha Vantage, Twelve Data,
/// Finnhub, then Yahoo (keyless) last.
fn quote_providers(
    config: &Config,
    twelve_data: Option<Arc<TwelveDataProvider>>,
    yahoo: Option<Arc<YahooProvider>>,
) -> anyhow::Result<Vec<Arc<dyn QuoteProvider>>> {
    let mut providers: Vec<Arc<dyn QuoteProvider>> = Vec::new();

    match &config.alpha_vantage_api_key {
        Some(key) => providers.push(Arc::new(AlphaVantageProvider::with_timeout(
            key.clone(),
            config.provider_timeout,
        )?)),
        None => tracing::warn!("ALPHA_VANTAGE_API_KEY not set; Alpha Vantage disabled"),
    }
    if let Some(provider) = twelve_data {
        providers.push(provider);
    }
    match &config.finnhub_api_key {
        Some(key) => providers.push(Arc::new(FinnhubProvider::with_timeout(
            key.clone(),
            config.provider_timeout,
        )?)),
        None => tracing::warn!("FINNHUB_API_KEY not set; Finnhub disabled"),
    }
    if let Some(provider) = yahoo {
        providers.push(provider);
    }

    Ok(providers)
}

pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let normalizer = SymbolNormalizer::new(&config.market_suffix);

    let twelve_data = match &config.twelve_data_api_key {
        Some(key) => Some(Arc::new(TwelveDataProvider::with_timeout(
            key.clone(),
            normalizer.clone(),
            config.provider_timeout,
        )?)),
        None => {
            tracing::warn!("TWELVE_DATA_API_KEY not set; Twelve Data disabled");
            None
        }
    };
    let yahoo = match YahooProvider::with_timeout(config.provider_timeout) {
        Ok(provider) => Some(Arc::new(provider)),
        Err(e) => {
            tracing::warn!("Yahoo Finance disabled: {}", e);
            None
        }
    };

    let mut history_providers: Vec<Arc<dyn HistoryProvider>> = Vec::new();
    if let Some(provider) = &yahoo {
        history_providers.push(provider.clone());
    }
    if let Some(provider) = &twelve_data {
        history_providers.push(provider.clone());
    }

    let quote_providers = quote_providers(config, twelve_data, yahoo)?;
    if quote_providers.is_empty() {
        tracing::warn!("No quote providers available; every quote will be empty");
    }

    let cache = Arc::new(QuoteCache::new(config.cache_ttl));
    let resolver = Arc::new(QuoteResolver::new(quote_providers, cache));
    tracing::info!(
        "Quote providers: {}",
        resolver.provider_ids().join(" -> ")
    );
    let fan_out =
        FanOut::new(resolver, config.fetch_concurrency).with_deadline(config.resolve_deadline);
    let universe = Universe::load(&config.universe_path, &normalizer);

    tracing::info!(
        "Stock service ready: {} universe symbols, cache TTL {}s, concurrency {}, deadline {}ms",
        universe.len(),
        config.cache_ttl.as_secs(),
        fan_out.limit(),
        config.resolve_deadline.as_millis()
    );

    let service = StockService::new(
        normalizer,
        fan_out,
        HistoryResolver::new(history_providers).with_deadline(config.resolve_deadline),
        universe,
    );
    Ok(Arc::new(AppState::new(Arc::new(service))))
}
