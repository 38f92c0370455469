//! Quote lookup seam.
//!
//! The engine never fetches prices itself; a [`QuoteProvider`] is injected
//! at construction time. Providers collapse *every* failure — unknown
//! symbol, network error, malformed response, non-numeric price — into
//! `None`, so the engine cannot (and does not try to) distinguish "symbol
//! does not exist" from "lookup failed".

use async_trait::async_trait;

use crate::MoneyCents;

/// A point-in-time price for a tradable instrument.
///
/// Fetched fresh per request and never persisted. The symbol is normalized
/// to uppercase by the provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: MoneyCents,
}

/// Source of current instrument quotes.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Looks up the current quote for `symbol`.
    ///
    /// Returns `None` both when the symbol does not exist and when the
    /// lookup itself fails; callers cannot tell the two apart.
    async fn lookup(&self, symbol: &str) -> Option<Quote>;
}

/// Returns `true` when `symbol` is structurally valid for a market lookup.
///
/// Symbols with a caret prefix or an embedded comma are never valid and
/// must be rejected before any network access. The reserved cash sentinel
/// fails this check, which is what keeps it untradable.
pub fn symbol_is_well_formed(symbol: &str) -> bool {
    !symbol.is_empty() && !symbol.starts_with('^') && !symbol.contains(',')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_accepts_plain_symbols() {
        assert!(symbol_is_well_formed("AAPL"));
        assert!(symbol_is_well_formed("brk.b"));
    }

    #[test]
    fn well_formed_rejects_structurally_invalid_symbols() {
        assert!(!symbol_is_well_formed(""));
        assert!(!symbol_is_well_formed("^GSPC"));
        assert!(!symbol_is_well_formed("AAPL,MSFT"));
        assert!(!symbol_is_well_formed(crate::CASH_SYMBOL));
    }
}
