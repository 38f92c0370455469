//! Portfolio view endpoints

use api_types::{
    history::{HistoryResponse, MovementView},
    portfolio::{BalanceView, HoldingView, HoldingsResponse},
};
use axum::{Extension, Json, extract::State};
use chrono::FixedOffset;
use engine::{Account, CASH_SYMBOL, MoneyCents};

use crate::{ServerError, server::ServerState};

pub async fn balance(
    Extension(account): Extension<Account>,
    State(state): State<ServerState>,
) -> Result<Json<BalanceView>, ServerError> {
    let cash = state.engine.cash_balance(account.id).await?;
    Ok(Json(BalanceView {
        cash_cents: cash.cents(),
    }))
}

/// Holdings summary priced at current quotes.
///
/// The cash row is synthesized as "US Dollars" at $1.00 per unit. A symbol
/// the provider cannot resolve degrades to "Unknown Stock" at $0.00 rather
/// than failing the whole view.
pub async fn holdings(
    Extension(account): Extension<Account>,
    State(state): State<ServerState>,
) -> Result<Json<HoldingsResponse>, ServerError> {
    let holdings = state.engine.holdings_summary(account.id).await?;

    let mut rows = Vec::with_capacity(holdings.len());
    let mut total_cents: i64 = 0;
    for holding in holdings {
        let row = if holding.symbol == CASH_SYMBOL {
            HoldingView {
                symbol: holding.symbol,
                name: "US Dollars".to_string(),
                quantity_minor: holding.quantity,
                price_cents: 100,
                value_cents: holding.quantity,
            }
        } else if let Some(quote) = state.quotes.lookup(&holding.symbol).await {
            let value = quote
                .price
                .checked_mul_units(holding.quantity)
                .unwrap_or(MoneyCents::ZERO);
            HoldingView {
                symbol: holding.symbol,
                name: quote.name,
                quantity_minor: holding.quantity,
                price_cents: quote.price.cents(),
                value_cents: value.cents(),
            }
        } else {
            HoldingView {
                symbol: holding.symbol,
                name: "Unknown Stock".to_string(),
                quantity_minor: holding.quantity,
                price_cents: 0,
                value_cents: 0,
            }
        };
        total_cents += row.value_cents;
        rows.push(row);
    }

    Ok(Json(HoldingsResponse {
        holdings: rows,
        total_cents,
    }))
}

pub async fn history(
    Extension(account): Extension<Account>,
    State(state): State<ServerState>,
) -> Result<Json<HistoryResponse>, ServerError> {
    let movements = state.engine.history(account.id).await?;

    let utc = FixedOffset::east_opt(0)
        .ok_or_else(|| ServerError::Generic("invalid UTC offset".to_string()))?;
    let movements = movements
        .into_iter()
        .map(|movement| MovementView {
            id: movement.id,
            symbol: movement.symbol,
            quantity_minor: movement.quantity,
            created_at: movement.created_at.with_timezone(&utc),
        })
        .collect();

    Ok(Json(HistoryResponse { movements }))
}
