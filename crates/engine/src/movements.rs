//! Ledger movements.
//!
//! A [`Movement`] is one signed quantity change for one (account, instrument)
//! pair. Quantities are stored as signed integer **minor units**:
//! - cents for the cash pseudo-instrument
//! - whole shares for market instruments
//!
//! Positive values credit the account, negative values debit it. Movements
//! are immutable once written; the store exposes no update or delete, and
//! every balance in the system is a sum over them.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::EngineError;

/// One ledger entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Movement {
    /// Store-assigned monotonic id; the ledger's ordering key.
    pub id: i64,
    pub account_id: Uuid,
    pub symbol: String,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

/// Derived nonzero position of one instrument for one account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Holding {
    pub symbol: String,
    pub quantity: i64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub account_id: String,
    pub symbol: String,
    pub quantity: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AccountId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Movement {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            account_id: Uuid::parse_str(&model.account_id)
                .map_err(|_| EngineError::KeyNotFound("account not exists".to_string()))?,
            symbol: model.symbol,
            quantity: model.quantity,
            created_at: model.created_at,
        })
    }
}
