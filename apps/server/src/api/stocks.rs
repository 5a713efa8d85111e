use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use stockdash_market_data::{
    HistorySeries, LiveQuote, MarketMovers, UniverseQuery, DEFAULT_UNIVERSE_LIMIT,
};
use utoipa::IntoParams;

use crate::{error::ApiResult, main_lib::AppState};

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LiveQuery {
    /// Stock symbol, e.g. `RELIANCE` or `RELIANCE.NS`
    symbol: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BatchQuery {
    /// Comma-separated symbols, e.g. `RELIANCE,TCS,INFY.NS`
    symbols: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UniverseParams {
    /// Sector filter (exact match, case-insensitive)
    sector: Option<String>,
    /// Maximum number of stocks, 1 to 2000 (default 50)
    limit: Option<u32>,
    /// Include stocks with an unknown sector (default true)
    include_unknown_sector: Option<bool>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryParams {
    symbol: String,
    /// Lookback period (default `6mo`)
    period: Option<String>,
    /// Bar interval (default `1d`)
    interval: Option<String>,
}

impl From<UniverseParams> for UniverseQuery {
    fn from(params: UniverseParams) -> Self {
        Self {
            sector: params.sector,
            limit: params
                .limit
                .map_or(DEFAULT_UNIVERSE_LIMIT, |limit| limit as usize),
            include_unknown: params.include_unknown_sector.unwrap_or(true),
        }
    }
}

/// Live quote for a single symbol.
#[utoipa::path(
    get,
    path = "/stocks/live",
    params(LiveQuery),
    responses(
        (status = 200, description = "Live quote; price is null when no provider resolved it"),
        (status = 400, description = "Missing symbol")
    ),
    tag = "stocks"
)]
pub async fn live_quote(
    State(state): State<Arc<AppState>>,
    Query(q): Query<LiveQuery>,
) -> ApiResult<Json<LiveQuote>> {
    let quote = state.stock_service.live_quote(&q.symbol).await?;
    Ok(Json(quote))
}

/// Live quotes for comma-separated symbols, in request order.
#[utoipa::path(
    get,
    path = "/stocks/live/batch",
    params(BatchQuery),
    responses(
        (status = 200, description = "Live quotes in request order"),
        (status = 400, description = "No valid symbols provided")
    ),
    tag = "stocks"
)]
pub async fn live_quotes_batch(
    State(state): State<Arc<AppState>>,
    Query(q): Query<BatchQuery>,
) -> ApiResult<Json<Vec<LiveQuote>>> {
    let quotes = state.stock_service.live_quotes(&q.symbols).await?;
    Ok(Json(quotes))
}

/// Live quotes for the symbol universe, optionally filtered by sector.
#[utoipa::path(
    get,
    path = "/stocks/live/all",
    params(UniverseParams),
    responses(
        (status = 200, description = "Live quotes for the filtered universe"),
        (status = 400, description = "Invalid sector or limit")
    ),
    tag = "stocks"
)]
pub async fn live_quotes_all(
    State(state): State<Arc<AppState>>,
    Query(q): Query<UniverseParams>,
) -> ApiResult<Json<Vec<LiveQuote>>> {
    let quotes = state.stock_service.universe_quotes(q.into()).await?;
    Ok(Json(quotes))
}

/// Historical OHLCV bars; `data` is empty when nothing is available.
#[utoipa::path(
    get,
    path = "/stocks/history",
    params(HistoryParams),
    responses(
        (status = 200, description = "Historical bars"),
        (status = 400, description = "Invalid symbol, period or interval")
    ),
    tag = "stocks"
)]
pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(q): Query<HistoryParams>,
) -> ApiResult<Json<HistorySeries>> {
    let series = state
        .stock_service
        .history(&q.symbol, q.period.as_deref(), q.interval.as_deref())
        .await?;
    Ok(Json(series))
}

/// Top gainers and losers among currently cached quotes.
#[utoipa::path(
    get,
    path = "/stocks/gainers-losers",
    responses((status = 200, description = "Gainers and losers")),
    tag = "stocks"
)]
pub async fn gainers_losers(State(state): State<Arc<AppState>>) -> Json<MarketMovers> {
    Json(state.stock_service.gainers_losers())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stocks/live", get(live_quote))
        .route("/stocks/live/batch", get(live_quotes_batch))
        .route("/stocks/live/all", get(live_quotes_all))
        .route("/stocks/history", get(history))
        .route("/stocks/gainers-losers", get(gainers_losers))
}
