use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod account {
    use super::*;

    /// Request body for creating an account.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RegisterNew {
        pub username: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountCreated {
        /// Account id (UUID).
        ///
        /// This is serialized as a string in JSON.
        pub account_id: Uuid,
    }

    /// Request body for changing the caller's password.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PasswordChange {
        pub old_password: String,
        pub new_password: String,
    }
}

pub mod quote {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct QuoteGet {
        pub symbol: String,
        /// Units to price in the cost preview.
        pub units: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct QuoteView {
        pub symbol: String,
        pub name: String,
        /// Price per unit, in cents.
        pub price_cents: i64,
        pub units: i64,
        /// Cost preview: `price_cents × units`.
        pub value_cents: i64,
        /// Caller's cash balance in cents, present when it could be read.
        pub cash_cents: Option<i64>,
    }
}

pub mod trade {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TradeAction {
        Bought,
        Sold,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BuyNew {
        pub symbol: String,
        pub units: i64,
    }

    /// Request body for a sell.
    ///
    /// With `sell_all` set the whole position is liquidated and `units` is
    /// ignored; otherwise `units` is required.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SellNew {
        pub symbol: String,
        pub units: Option<i64>,
        #[serde(default)]
        pub sell_all: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReceiptView {
        pub action: TradeAction,
        pub symbol: String,
        pub name: String,
        /// Quoted price per unit at execution time, in cents.
        pub price_cents: i64,
        pub units: i64,
        /// Cash moved by the trade, in cents.
        pub value_cents: i64,
    }
}

pub mod portfolio {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub cash_cents: i64,
    }

    /// One row of the holdings view.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct HoldingView {
        pub symbol: String,
        pub name: String,
        /// Position size in the instrument's minor units: cents for the
        /// cash row, whole shares otherwise.
        pub quantity_minor: i64,
        /// Price per major unit, in cents (the cash row prices a dollar at
        /// 100).
        pub price_cents: i64,
        /// Current position value, in cents. Zero when the quote could not
        /// be resolved.
        pub value_cents: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct HoldingsResponse {
        pub holdings: Vec<HoldingView>,
        pub total_cents: i64,
    }
}

pub mod history {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MovementView {
        pub id: i64,
        pub symbol: String,
        /// Signed quantity in the instrument's minor units.
        pub quantity_minor: i64,
        /// RFC3339 timestamp.
        pub created_at: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct HistoryResponse {
        pub movements: Vec<MovementView>,
    }
}
