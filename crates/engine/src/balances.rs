//! Derived balance views over the ledger.

use uuid::Uuid;

use crate::{CASH_SYMBOL, Engine, Holding, MoneyCents, Movement, ResultEngine, ledger};

impl Engine {
    /// Current cash balance, derived by summation.
    pub async fn cash_balance(&self, account_id: Uuid) -> ResultEngine<MoneyCents> {
        let cents = ledger::balance(&self.database, account_id, CASH_SYMBOL).await?;
        Ok(MoneyCents::new(cents))
    }

    /// Current position in one instrument, in units.
    pub async fn instrument_balance(&self, account_id: Uuid, symbol: &str) -> ResultEngine<i64> {
        let symbol = symbol.trim().to_ascii_uppercase();
        ledger::balance(&self.database, account_id, &symbol).await
    }

    /// All instruments with a nonzero aggregate balance, cash included.
    pub async fn holdings_summary(&self, account_id: Uuid) -> ResultEngine<Vec<Holding>> {
        ledger::holdings(&self.database, account_id).await
    }

    /// Full movement history, newest first.
    pub async fn history(&self, account_id: Uuid) -> ResultEngine<Vec<Movement>> {
        ledger::history(&self.database, account_id).await
    }
}
