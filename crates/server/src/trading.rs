//! Trading API endpoints

use api_types::{
    quote::{QuoteGet, QuoteView},
    trade::{BuyNew, ReceiptView, SellNew, TradeAction as ApiAction},
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::{Account, EngineError, SellAmount};

use crate::{ServerError, server::ServerState};

fn map_action(action: engine::TradeAction) -> ApiAction {
    match action {
        engine::TradeAction::Bought => ApiAction::Bought,
        engine::TradeAction::Sold => ApiAction::Sold,
    }
}

fn map_receipt(receipt: engine::Receipt) -> ReceiptView {
    ReceiptView {
        action: map_action(receipt.action),
        symbol: receipt.symbol,
        name: receipt.name,
        price_cents: receipt.price.cents(),
        units: receipt.units,
        value_cents: receipt.value.cents(),
    }
}

/// Prices `units` of a symbol without trading.
pub async fn quote(
    Extension(account): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<QuoteGet>,
) -> Result<Json<QuoteView>, ServerError> {
    if payload.units <= 0 {
        return Err(ServerError::Generic("units must be > 0".to_string()));
    }

    let quote = state.quotes.lookup(&payload.symbol).await.ok_or_else(|| {
        ServerError::Engine(EngineError::SymbolNotFound(payload.symbol.clone()))
    })?;

    let value = quote
        .price
        .checked_mul_units(payload.units)
        .ok_or_else(|| ServerError::Generic("amount too large".to_string()))?;

    // The preview stays useful even when the cash balance cannot be read.
    let cash_cents = state
        .engine
        .cash_balance(account.id)
        .await
        .ok()
        .map(|cash| cash.cents());

    Ok(Json(QuoteView {
        symbol: quote.symbol,
        name: quote.name,
        price_cents: quote.price.cents(),
        units: payload.units,
        value_cents: value.cents(),
        cash_cents,
    }))
}

pub async fn buy(
    Extension(account): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<BuyNew>,
) -> Result<(StatusCode, Json<ReceiptView>), ServerError> {
    let receipt = state
        .engine
        .buy(account.id, &payload.symbol, payload.units)
        .await?;

    Ok((StatusCode::CREATED, Json(map_receipt(receipt))))
}

pub async fn sell(
    Extension(account): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<SellNew>,
) -> Result<(StatusCode, Json<ReceiptView>), ServerError> {
    let amount = if payload.sell_all {
        SellAmount::All
    } else {
        match payload.units {
            Some(units) => SellAmount::Units(units),
            None => {
                return Err(ServerError::Generic(
                    "units or sell_all is required".to_string(),
                ));
            }
        }
    };

    let receipt = state
        .engine
        .sell(account.id, &payload.symbol, amount)
        .await?;

    Ok((StatusCode::CREATED, Json(map_receipt(receipt))))
}
