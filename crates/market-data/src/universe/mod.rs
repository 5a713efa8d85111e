//! Static symbol universe and its sector filter.
//!
//! The universe is a JSON array of `{symbol, name, sector}` objects read once
//! at startup. Entries are normalized on load so the rest of the pipeline
//! only ever sees suffixed, upper-case symbols.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::MarketDataError;
use crate::models::{UniverseEntry, UNKNOWN_SECTOR};
use crate::symbol::SymbolNormalizer;

/// Default number of entries returned by [`Universe::filter`].
pub const DEFAULT_UNIVERSE_LIMIT: usize = 50;

/// Largest accepted `limit`.
pub const MAX_UNIVERSE_LIMIT: usize = 2000;

/// One row as stored on disk; every field is optional.
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    sector: Option<String>,
}

/// Selection applied to the universe by the `/stocks/live/all` endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniverseQuery {
    /// Case-insensitive exact sector; `None` selects every entry.
    pub sector: Option<String>,
    /// Maximum number of entries, applied after filtering.
    pub limit: usize,
    /// Whether `UNKNOWN`-sector entries are included.
    pub include_unknown: bool,
}

impl Default for UniverseQuery {
    fn default() -> Self {
        Self {
            sector: None,
            limit: DEFAULT_UNIVERSE_LIMIT,
            include_unknown: true,
        }
    }
}

/// The known symbol universe.
#[derive(Clone, Debug, Default)]
pub struct Universe {
    entries: Vec<UniverseEntry>,
}

impl Universe {
    /// Load the universe, falling back to an empty one if the file is
    /// missing or malformed.
    pub fn load(path: &Path, normalizer: &SymbolNormalizer) -> Self {
        match Self::try_load(path, normalizer) {
            Ok(universe) => {
                info!(
                    "Loaded {} universe entries from {}",
                    universe.len(),
                    path.display()
                );
                universe
            }
            Err(e) => {
                warn!("{}; continuing with an empty universe", e);
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path, normalizer: &SymbolNormalizer) -> Result<Self, MarketDataError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            MarketDataError::Universe(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text, normalizer)
    }

    pub fn from_json(text: &str, normalizer: &SymbolNormalizer) -> Result<Self, MarketDataError> {
        let raw: Vec<RawEntry> = serde_json::from_str(text)
            .map_err(|e| MarketDataError::Universe(format!("invalid universe JSON: {}", e)))?;

        let entries = raw
            .into_iter()
            .filter_map(|row| {
                let symbol = normalizer.normalize(row.symbol.as_deref().unwrap_or_default());
                if symbol.is_empty() {
                    return None;
                }
                let name = non_blank(row.name).unwrap_or_else(|| symbol.clone());
                let sector = non_blank(row.sector).unwrap_or_else(|| UNKNOWN_SECTOR.to_string());
                Some(UniverseEntry::new(symbol, name, sector))
            })
            .collect();

        Ok(Self { entries })
    }

    /// Build a universe from entries that are already normalized.
    pub fn from_entries(entries: Vec<UniverseEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[UniverseEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct sectors, in their stored spelling.
    pub fn sectors(&self) -> BTreeSet<&str> {
        self.entries.iter().map(|e| e.sector.as_str()).collect()
    }

    pub fn has_sector(&self, sector: &str) -> bool {
        self.entries.iter().any(|e| e.in_sector(sector))
    }

    /// Select entries for `query`.
    ///
    /// With a sector, the matching entries come first; if `include_unknown`
    /// is set, every `UNKNOWN` entry is appended after them. Without a
    /// sector, all entries are taken and `include_unknown == false` drops
    /// the `UNKNOWN` ones. The result is truncated to `query.limit`.
    pub fn filter(&self, query: &UniverseQuery) -> Vec<UniverseEntry> {
        let mut selected: Vec<&UniverseEntry> = match query.sector.as_deref() {
            Some(sector) => {
                let mut matched: Vec<_> =
                    self.entries.iter().filter(|e| e.in_sector(sector)).collect();
                if query.include_unknown && !sector.trim().eq_ignore_ascii_case(UNKNOWN_SECTOR) {
                    matched.extend(self.entries.iter().filter(|e| e.has_unknown_sector()));
                }
                matched
            }
            None => self
                .entries
                .iter()
                .filter(|e| query.include_unknown || !e.has_unknown_sector())
                .collect(),
        };

        selected.truncate(query.limit);
        selected.into_iter().cloned().collect()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn universe() -> Universe {
        Universe::from_entries(vec![
            UniverseEntry::new("TCS.NS", "Tata Consultancy Services", "IT"),
            UniverseEntry::new("RELIANCE.NS", "Reliance Industries", "Energy"),
            UniverseEntry::new("MYSTERY.NS", "MYSTERY.NS", "UNKNOWN"),
            UniverseEntry::new("INFY.NS", "Infosys", "IT"),
        ])
    }

    fn symbols(entries: &[UniverseEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.symbol.as_str()).collect()
    }

    fn query(sector: Option<&str>, limit: usize, include_unknown: bool) -> UniverseQuery {
        UniverseQuery {
            sector: sector.map(str::to_string),
            limit,
            include_unknown,
        }
    }

    #[test]
    fn test_sector_match_is_case_insensitive() {
        let selected = universe().filter(&query(Some(" it "), 50, false));
        assert_eq!(symbols(&selected), ["TCS.NS", "INFY.NS"]);
    }

    #[test]
    fn test_sector_with_unknown_appends_unknown_entries() {
        let selected = universe().filter(&query(Some("Energy"), 50, true));
        assert_eq!(symbols(&selected), ["RELIANCE.NS", "MYSTERY.NS"]);
    }

    #[test]
    fn test_unknown_sector_is_not_duplicated() {
        let selected = universe().filter(&query(Some("unknown"), 50, true));
        assert_eq!(symbols(&selected), ["MYSTERY.NS"]);
    }

    #[test]
    fn test_no_sector_drops_unknown_when_asked() {
        let all = universe().filter(&query(None, 50, true));
        assert_eq!(all.len(), 4);

        let known = universe().filter(&query(None, 50, false));
        assert_eq!(symbols(&known), ["TCS.NS", "RELIANCE.NS", "INFY.NS"]);
    }

    #[test]
    fn test_limit_applies_after_filtering() {
        let selected = universe().filter(&query(Some("IT"), 1, true));
        assert_eq!(symbols(&selected), ["TCS.NS"]);
    }

    #[test]
    fn test_has_sector() {
        let universe = universe();
        assert!(universe.has_sector("energy"));
        assert!(!universe.has_sector("Banking"));
        assert_eq!(
            universe.sectors().into_iter().collect::<Vec<_>>(),
            ["Energy", "IT", "UNKNOWN"]
        );
    }

    #[test]
    fn test_load_normalizes_entries() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"symbol": " reliance ", "name": "Reliance Industries", "sector": "Energy"}},
                {{"symbol": "TCS.NS"}},
                {{"symbol": "  ", "name": "blank"}},
                {{"symbol": "sbin.bo", "name": "", "sector": null}}
            ]"#
        )
        .unwrap();

        let universe = Universe::load(file.path(), &SymbolNormalizer::default());
        assert_eq!(
            universe.entries(),
            [
                UniverseEntry::new("RELIANCE.NS", "Reliance Industries", "Energy"),
                UniverseEntry::new("TCS.NS", "TCS.NS", "UNKNOWN"),
                UniverseEntry::new("SBIN.BO", "SBIN.BO", "UNKNOWN"),
            ]
        );
    }

    #[test]
    fn test_missing_file_yields_empty_universe() {
        let dir = tempfile::tempdir().unwrap();
        let universe = Universe::load(&dir.path().join("absent.json"), &SymbolNormalizer::default());
        assert!(universe.is_empty());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let err = Universe::from_json("{not json", &SymbolNormalizer::default()).unwrap_err();
        assert!(matches!(err, MarketDataError::Universe(_)));
    }
}
