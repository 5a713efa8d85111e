use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use stockdash_market_data::{
    FanOut, HistoryResolver, LiveQuote, QuoteCache, QuoteProvider, QuoteResolver, StockService,
    SymbolNormalizer, Universe, UniverseEntry,
};
use stockdash_server::{api::app_router, config::Config, AppState};
use tower::ServiceExt;

/// Prices only the symbols it knows, with a percent change.
struct KnownProvider {
    known: HashMap<&'static str, (Decimal, Decimal)>,
}

#[async_trait]
impl QuoteProvider for KnownProvider {
    fn id(&self) -> &'static str {
        "KNOWN"
    }

    async fn fetch_quote(&self, symbol: &str) -> Option<LiveQuote> {
        let (price, pct) = self.known.get(symbol)?;
        let mut quote = LiveQuote::new(symbol, *price);
        quote.percent_change = Some(*pct);
        Some(quote)
    }
}

/// Sits on every request for `delay`, then has nothing.
struct StalledProvider {
    delay: Duration,
}

#[async_trait]
impl QuoteProvider for StalledProvider {
    fn id(&self) -> &'static str {
        "STALLED"
    }

    async fn fetch_quote(&self, _symbol: &str) -> Option<LiveQuote> {
        tokio::time::sleep(self.delay).await;
        None
    }
}

fn test_router() -> Router {
    let provider = KnownProvider {
        known: HashMap::from([
            ("FOO.NS", (dec!(123.45), dec!(2.5))),
            ("BAZ.NS", (dec!(10), dec!(-1.25))),
            ("TCS.NS", (dec!(3900), dec!(0.4))),
        ]),
    };
    router_with(vec![Arc::new(provider)])
}

fn router_with(providers: Vec<Arc<dyn QuoteProvider>>) -> Router {
    let config = Config::default();
    let resolver = Arc::new(QuoteResolver::new(
        providers,
        Arc::new(QuoteCache::default()),
    ));
    let universe = Universe::from_entries(vec![
        UniverseEntry::new("TCS.NS", "Tata Consultancy Services", "IT"),
        UniverseEntry::new("MYSTERY.NS", "Mystery Ltd", "UNKNOWN"),
    ]);
    let service = StockService::new(
        SymbolNormalizer::default(),
        FanOut::new(resolver, 4).with_deadline(config.resolve_deadline),
        HistoryResolver::new(Vec::new()).with_deadline(config.resolve_deadline),
        universe,
    );
    let state = Arc::new(AppState::new(Arc::new(service)));
    app_router(state, &config)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(app, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn batch_returns_resolved_and_empty_quotes_in_order() {
    let app = test_router();
    let (status, body) = get_json(&app, "/stocks/live/batch?symbols=FOO,BAR").await;

    assert_eq!(status, StatusCode::OK);
    let quotes = body.as_array().unwrap();
    assert_eq!(quotes.len(), 2);

    assert_eq!(quotes[0]["symbol"], "FOO.NS");
    assert_eq!(quotes[0]["price"].as_f64(), Some(123.45));

    assert_eq!(quotes[1]["symbol"], "BAR.NS");
    assert!(quotes[1]["price"].is_null());
    assert_eq!(quotes[1]["sector"], "UNKNOWN");
    assert_eq!(quotes[1]["name"], "BAR.NS");
    for key in ["change", "percentChange", "volume", "marketCap", "peRatio", "eps"] {
        assert!(quotes[1][key].is_null(), "{} should be null", key);
    }
}

#[tokio::test(start_paused = true)]
async fn stalled_providers_still_answer_before_request_timeout() {
    // Six slow windows add up to well past the HTTP timeout.
    let providers: Vec<Arc<dyn QuoteProvider>> = (0..6)
        .map(|_| {
            Arc::new(StalledProvider {
                delay: Duration::from_secs(10),
            }) as Arc<dyn QuoteProvider>
        })
        .collect();
    let app = router_with(providers);

    let (status, body) = get_json(&app, "/stocks/live/batch?symbols=FOO").await;
    assert_eq!(status, StatusCode::OK);
    let quotes = body.as_array().unwrap();
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0]["symbol"], "FOO.NS");
    assert!(quotes[0]["price"].is_null());
    assert_eq!(quotes[0]["sector"], "UNKNOWN");

    let (status, body) = get_json(&app, "/stocks/live?symbol=FOO").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["price"].is_null());
}

#[tokio::test]
async fn batch_without_symbols_is_bad_request() {
    let app = test_router();
    let (status, body) = get_json(&app, "/stocks/live/batch?symbols=,%20,").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
    assert_eq!(body["message"], "No valid symbols provided.");
}

#[tokio::test]
async fn live_normalizes_single_symbol() {
    let app = test_router();
    let (status, body) = get_json(&app, "/stocks/live?symbol=%20foo%20").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "FOO.NS");
    assert_eq!(body["percentChange"].as_f64(), Some(2.5));
}

#[tokio::test]
async fn live_without_symbol_param_is_bad_request() {
    let app = test_router();
    let (status, _) = get(&app, "/stocks/live").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn live_all_filters_universe_and_applies_hints() {
    let app = test_router();

    let (status, body) =
        get_json(&app, "/stocks/live/all?sector=it&include_unknown_sector=false").await;
    assert_eq!(status, StatusCode::OK);
    let quotes = body.as_array().unwrap();
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0]["symbol"], "TCS.NS");
    assert_eq!(quotes[0]["name"], "Tata Consultancy Services");
    assert_eq!(quotes[0]["sector"], "IT");

    let (_, body) = get_json(&app, "/stocks/live/all?sector=IT").await;
    let quotes = body.as_array().unwrap();
    assert_eq!(quotes.len(), 2);
    assert_eq!(quotes[1]["symbol"], "MYSTERY.NS");
    assert_eq!(quotes[1]["name"], "Mystery Ltd");
    assert!(quotes[1]["price"].is_null());
}

#[tokio::test]
async fn live_all_rejects_bad_input() {
    let app = test_router();
    for uri in [
        "/stocks/live/all?limit=0",
        "/stocks/live/all?limit=2001",
        "/stocks/live/all?limit=abc",
        "/stocks/live/all?sector=Banking",
        "/stocks/live/all?sector=%20",
    ] {
        let (status, _) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
    }
}

#[tokio::test]
async fn history_validates_and_returns_empty_data() {
    let app = test_router();

    let (status, body) = get_json(&app, "/stocks/history?symbol=foo&period=7y").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("period"));

    let (status, body) =
        get_json(&app, "/stocks/history?symbol=foo&period=1mo&interval=1wk").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "FOO.NS");
    assert_eq!(body["data"], Value::Array(Vec::new()));
}

#[tokio::test]
async fn gainers_losers_reads_cached_quotes_only() {
    let app = test_router();

    let (status, body) = get_json(&app, "/stocks/gainers-losers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gainers"], Value::Array(Vec::new()));
    assert_eq!(body["losers"], Value::Array(Vec::new()));

    get(&app, "/stocks/live/batch?symbols=FOO,BAZ,NOPE").await;

    let (_, body) = get_json(&app, "/stocks/gainers-losers").await;
    let gainers = body["gainers"].as_array().unwrap();
    let losers = body["losers"].as_array().unwrap();
    assert_eq!(gainers.len(), 2);
    assert_eq!(gainers[0]["symbol"], "FOO.NS");
    assert_eq!(losers.last().unwrap()["symbol"], "BAZ.NS");
}

#[tokio::test]
async fn health_and_openapi() {
    let app = test_router();

    let (status, body) = get(&app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");

    let (status, _) = get(&app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get_json(&app, "/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/stocks/live/batch"].is_object());
}
