use std::{collections::HashMap, sync::Arc};

use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;
use uuid::Uuid;

pub use error::EngineError;
pub use money::MoneyCents;
pub use movements::{Holding, Movement};
pub use quotes::{Quote, QuoteProvider, symbol_is_well_formed};
pub use trading::{Receipt, SellAmount, TradeAction};
pub use users::Account;

mod accounts;
mod balances;
mod error;
mod ledger;
mod money;
mod movements;
mod quotes;
mod trading;
mod users;

type ResultEngine<T> = Result<T, EngineError>;

/// Reserved pseudo-instrument holding the account's cash.
///
/// The caret prefix is structurally invalid for market lookups (see
/// [`symbol_is_well_formed`]), so the sentinel can never collide with a
/// real symbol.
pub const CASH_SYMBOL: &str = "^USD";

/// Cash seeded for every new account at registration.
pub const STARTING_CASH: MoneyCents = MoneyCents::new(1_000_000);

/// Run a block inside a DB transaction, committing on success. A
/// transaction dropped on the error path rolls back.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result: crate::ResultEngine<_> = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

pub struct Engine {
    database: DatabaseConnection,
    quotes: Arc<dyn QuoteProvider>,
    account_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Lock serializing trades for one account.
    ///
    /// Trades read a balance, decide, then append; without this lock two
    /// concurrent trades on the same account could both pass the balance
    /// check. Distinct accounts never contend.
    pub(crate) async fn account_lock(&self, account_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.account_locks.lock().await;
        locks.entry(account_id).or_default().clone()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    quotes: Option<Arc<dyn QuoteProvider>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Pass the required quote provider
    pub fn quotes(mut self, quotes: Arc<dyn QuoteProvider>) -> EngineBuilder {
        self.quotes = Some(quotes);
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> ResultEngine<Engine> {
        let quotes = self.quotes.ok_or_else(|| {
            EngineError::InvalidInput("quote provider is required".to_string())
        })?;

        Ok(Engine {
            database: self.database,
            quotes,
            account_locks: Mutex::new(HashMap::new()),
        })
    }
}
