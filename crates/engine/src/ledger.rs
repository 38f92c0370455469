//! Append-only ledger store.
//!
//! The ledger is the only source of balances: there are no mutable
//! counters anywhere, every read aggregates over movement rows server-side.
//! Functions are generic over the connection so appends can run inside an
//! open database transaction alongside other writes.

use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, Statement, prelude::*};
use uuid::Uuid;

use crate::{Holding, Movement, ResultEngine, movements};

/// Appends one movement and returns the store-assigned id.
pub(crate) async fn append<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
    symbol: &str,
    quantity: i64,
) -> ResultEngine<i64> {
    let model = movements::ActiveModel {
        id: ActiveValue::NotSet,
        account_id: ActiveValue::Set(account_id.to_string()),
        symbol: ActiveValue::Set(symbol.to_string()),
        quantity: ActiveValue::Set(quantity),
        created_at: ActiveValue::Set(Utc::now()),
    };
    let inserted = model.insert(db).await?;
    Ok(inserted.id)
}

/// Sum of quantities for one (account, symbol) pair.
///
/// An account with no movements for the symbol legitimately sums to 0;
/// only a storage fault is an error.
pub(crate) async fn balance<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
    symbol: &str,
) -> ResultEngine<i64> {
    let stmt = Statement::from_sql_and_values(
        db.get_database_backend(),
        "SELECT COALESCE(SUM(quantity), 0) AS balance \
         FROM movements \
         WHERE account_id = ? AND symbol = ?",
        vec![account_id.to_string().into(), symbol.into()],
    );
    let row = db.query_one(stmt).await?;
    Ok(row.and_then(|r| r.try_get("", "balance").ok()).unwrap_or(0))
}

/// All symbols with a nonzero aggregate balance for the account, grouped
/// in SQL rather than by iterating movements in application code.
pub(crate) async fn holdings<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
) -> ResultEngine<Vec<Holding>> {
    let stmt = Statement::from_sql_and_values(
        db.get_database_backend(),
        "SELECT symbol, SUM(quantity) AS quantity \
         FROM movements \
         WHERE account_id = ? \
         GROUP BY symbol \
         HAVING SUM(quantity) != 0 \
         ORDER BY symbol",
        vec![account_id.to_string().into()],
    );
    let rows = db.query_all(stmt).await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(Holding {
            symbol: row.try_get("", "symbol")?,
            quantity: row.try_get("", "quantity")?,
        });
    }
    Ok(out)
}

/// Full movement sequence for the account, newest first.
pub(crate) async fn history<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
) -> ResultEngine<Vec<Movement>> {
    let models = movements::Entity::find()
        .filter(movements::Column::AccountId.eq(account_id.to_string()))
        .order_by_desc(movements::Column::Id)
        .all(db)
        .await?;

    let mut out = Vec::with_capacity(models.len());
    for model in models {
        out.push(Movement::try_from(model)?);
    }
    Ok(out)
}
