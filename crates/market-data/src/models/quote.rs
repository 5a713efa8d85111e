use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sector assigned when no provider or universe entry knows better.
pub const UNKNOWN_SECTOR: &str = "UNKNOWN";

/// Live market quote for one symbol.
///
/// Every field is always serialized, unknown values as `null`, so dashboard
/// consumers never branch on missing keys. `price == null` means no provider
/// could resolve the symbol; it is never coerced to zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveQuote {
    /// Normalized symbol (e.g. `RELIANCE.NS`)
    pub symbol: String,

    /// Display name, defaults to the symbol
    pub name: String,

    /// Last traded price
    pub price: Option<Decimal>,

    /// Price delta since previous close
    pub change: Option<Decimal>,

    /// Percent delta since previous close
    pub percent_change: Option<Decimal>,

    /// Traded volume for the session
    pub volume: Option<u64>,

    /// Sector, defaults to [`UNKNOWN_SECTOR`]
    pub sector: String,

    /// Market capitalization
    pub market_cap: Option<Decimal>,

    /// Price to earnings ratio
    pub pe_ratio: Option<Decimal>,

    /// Earnings per share
    pub eps: Option<Decimal>,
}

impl LiveQuote {
    /// Create a quote carrying only a price; everything else unknown.
    pub fn new(symbol: impl Into<String>, price: Decimal) -> Self {
        Self {
            price: Some(price),
            ..Self::empty(symbol)
        }
    }

    /// The in-band "nothing resolved" quote: symbol filled in, numbers null.
    pub fn empty(symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        Self {
            name: symbol.clone(),
            symbol,
            price: None,
            change: None,
            percent_change: None,
            volume: None,
            sector: UNKNOWN_SECTOR.to_string(),
            market_cap: None,
            pe_ratio: None,
            eps: None,
        }
    }

    /// Whether a provider actually priced this symbol.
    ///
    /// A zero price is treated the same as a missing one.
    pub fn has_price(&self) -> bool {
        matches!(self.price, Some(p) if !p.is_zero())
    }

    /// Whether the sector is still the placeholder.
    pub fn has_unknown_sector(&self) -> bool {
        self.sector.is_empty() || self.sector.eq_ignore_ascii_case(UNKNOWN_SECTOR)
    }

    /// Apply universe-provided name/sector.
    ///
    /// The hinted name always wins; the hinted sector only fills an unknown one.
    pub fn apply_hint(&mut self, hint: &QuoteHint) {
        if let Some(name) = hint.name.as_deref().filter(|n| !n.is_empty()) {
            self.name = name.to_string();
        }
        if let Some(sector) = hint.sector.as_deref().filter(|s| !s.is_empty()) {
            if self.has_unknown_sector() {
                self.sector = sector.to_string();
            }
        }
    }

    /// Builder-style variant of [`apply_hint`](Self::apply_hint).
    pub fn with_hint(mut self, hint: &QuoteHint) -> Self {
        self.apply_hint(hint);
        self
    }
}

/// Reference data passed alongside a symbol when the caller already knows
/// its name or sector (the universe endpoint does).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuoteHint {
    pub name: Option<String>,
    pub sector: Option<String>,
}

impl QuoteHint {
    pub fn new(name: Option<String>, sector: Option<String>) -> Self {
        Self { name, sector }
    }
}
