use serde::{Deserialize, Serialize};

use super::quote::UNKNOWN_SECTOR;

/// One symbol of the static universe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseEntry {
    pub symbol: String,
    pub name: String,
    pub sector: String,
}

impl UniverseEntry {
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        sector: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            sector: sector.into(),
        }
    }

    pub fn has_unknown_sector(&self) -> bool {
        self.sector.is_empty() || self.sector.eq_ignore_ascii_case(UNKNOWN_SECTOR)
    }

    /// Case-insensitive exact sector match.
    pub fn in_sector(&self, sector: &str) -> bool {
        let own = if self.sector.is_empty() {
            UNKNOWN_SECTOR
        } else {
            self.sector.as_str()
        };
        own.eq_ignore_ascii_case(sector.trim())
    }
}
