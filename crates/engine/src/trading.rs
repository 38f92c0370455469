//! The buy/sell transaction engine.
//!
//! Each call is stateless request/response and runs its gates in order:
//! validate the input, quote the instrument, check the relevant balance,
//! then commit. A commit appends exactly two movements — one cash, one
//! instrument, economically opposite — inside a single DB transaction, so
//! a trade can never half-apply.

use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{CASH_SYMBOL, Engine, EngineError, MoneyCents, ResultEngine, ledger, with_tx};

/// How many units a sell should move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SellAmount {
    Units(i64),
    /// Liquidate the full current position.
    All,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TradeAction {
    Bought,
    Sold,
}

impl TradeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bought => "bought",
            Self::Sold => "sold",
        }
    }
}

/// Successful outcome of a buy or sell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub action: TradeAction,
    pub symbol: String,
    pub name: String,
    /// Quoted price per unit at execution time.
    pub price: MoneyCents,
    pub units: i64,
    /// Cash moved by the trade: `price × units`.
    pub value: MoneyCents,
}

fn normalize_symbol(symbol: &str) -> ResultEngine<String> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(
            "symbol must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_ascii_uppercase())
}

fn trade_value(price: MoneyCents, units: i64) -> ResultEngine<MoneyCents> {
    price
        .checked_mul_units(units)
        .ok_or_else(|| EngineError::InvalidInput("amount too large".to_string()))
}

impl Engine {
    /// Buys `units` of `symbol` at the currently quoted price.
    ///
    /// The cash debit and the instrument credit are appended in one DB
    /// transaction; the trade is serialized against other trades of the
    /// same account.
    pub async fn buy(&self, account_id: Uuid, symbol: &str, units: i64) -> ResultEngine<Receipt> {
        let symbol = normalize_symbol(symbol)?;
        if units <= 0 {
            return Err(EngineError::InvalidInput("units must be > 0".to_string()));
        }

        let lock = self.account_lock(account_id).await;
        let _guard = lock.lock().await;

        let quote = self
            .quotes
            .lookup(&symbol)
            .await
            .ok_or_else(|| EngineError::SymbolNotFound(symbol.clone()))?;

        let cash = MoneyCents::new(self.balance_gate(account_id, CASH_SYMBOL).await?);
        let value = trade_value(quote.price, units)?;
        if cash < value {
            return Err(EngineError::InsufficientFunds(format!(
                "{value} needed, {cash} available"
            )));
        }

        with_tx!(self, |db_tx| {
            ledger::append(&db_tx, account_id, CASH_SYMBOL, -value.cents()).await?;
            ledger::append(&db_tx, account_id, &quote.symbol, units).await?;
            Ok(())
        })?;

        Ok(Receipt {
            action: TradeAction::Bought,
            symbol: quote.symbol,
            name: quote.name,
            price: quote.price,
            units,
            value,
        })
    }

    /// Sells from an existing position; [`SellAmount::All`] liquidates it.
    ///
    /// A sell of more units than currently held is rejected. Partial sells
    /// are allowed.
    pub async fn sell(
        &self,
        account_id: Uuid,
        symbol: &str,
        amount: SellAmount,
    ) -> ResultEngine<Receipt> {
        let symbol = normalize_symbol(symbol)?;
        if let SellAmount::Units(units) = amount
            && units <= 0
        {
            return Err(EngineError::InvalidInput("units must be > 0".to_string()));
        }

        let lock = self.account_lock(account_id).await;
        let _guard = lock.lock().await;

        let quote = self
            .quotes
            .lookup(&symbol)
            .await
            .ok_or_else(|| EngineError::SymbolNotFound(symbol.clone()))?;

        let held = self.balance_gate(account_id, &quote.symbol).await?;
        let units = match amount {
            SellAmount::All => held,
            SellAmount::Units(units) => units,
        };
        // Selling all of an empty position resolves to 0 units and lands
        // here as well.
        if units <= 0 || units > held {
            return Err(EngineError::InsufficientStock(format!(
                "{units} of {} requested, {held} held",
                quote.symbol
            )));
        }

        let value = trade_value(quote.price, units)?;
        with_tx!(self, |db_tx| {
            ledger::append(&db_tx, account_id, CASH_SYMBOL, value.cents()).await?;
            ledger::append(&db_tx, account_id, &quote.symbol, -units).await?;
            Ok(())
        })?;

        Ok(Receipt {
            action: TradeAction::Sold,
            symbol: quote.symbol,
            name: quote.name,
            price: quote.price,
            units,
            value,
        })
    }

    /// Balance read used inside the trade gates.
    ///
    /// A storage fault here is a [`EngineError::BalanceUnavailable`]
    /// rejection of the trade, distinct from a legitimate zero balance.
    async fn balance_gate(&self, account_id: Uuid, symbol: &str) -> ResultEngine<i64> {
        ledger::balance(&self.database, account_id, symbol)
            .await
            .map_err(|err| EngineError::BalanceUnavailable(format!("{symbol}: {err}")))
    }
}
