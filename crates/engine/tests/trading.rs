use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use migration::MigratorTrait;
use sea_orm::Database;

use engine::{
    Account, CASH_SYMBOL, Engine, EngineError, MoneyCents, Quote, QuoteProvider, STARTING_CASH,
    SellAmount, TradeAction, symbol_is_well_formed,
};

/// In-memory quote source with settable prices, standing in for the
/// network-backed provider.
struct StaticQuotes {
    quotes: std::sync::Mutex<HashMap<String, Quote>>,
}

impl StaticQuotes {
    fn new(pairs: &[(&str, &str, i64)]) -> Arc<Self> {
        let provider = Arc::new(Self {
            quotes: std::sync::Mutex::new(HashMap::new()),
        });
        for (symbol, name, price_cents) in pairs {
            provider.set(symbol, name, *price_cents);
        }
        provider
    }

    fn set(&self, symbol: &str, name: &str, price_cents: i64) {
        self.quotes.lock().unwrap().insert(
            symbol.to_string(),
            Quote {
                symbol: symbol.to_string(),
                name: name.to_string(),
                price: MoneyCents::new(price_cents),
            },
        );
    }
}

#[async_trait]
impl QuoteProvider for StaticQuotes {
    async fn lookup(&self, symbol: &str) -> Option<Quote> {
        let symbol = symbol.trim();
        if !symbol_is_well_formed(symbol) {
            return None;
        }
        self.quotes
            .lock()
            .unwrap()
            .get(&symbol.to_ascii_uppercase())
            .cloned()
    }
}

async fn engine_with_quotes(pairs: &[(&str, &str, i64)]) -> (Engine, Arc<StaticQuotes>) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    let provider = StaticQuotes::new(pairs);
    let engine = Engine::builder()
        .database(db)
        .quotes(provider.clone())
        .build()
        .unwrap();
    (engine, provider)
}

async fn registered(engine: &Engine) -> Account {
    engine.register("alice", "password").await.unwrap()
}

#[tokio::test]
async fn registration_seeds_starting_cash() {
    let (engine, _quotes) = engine_with_quotes(&[]).await;

    let account = registered(&engine).await;

    assert_eq!(engine.cash_balance(account.id).await.unwrap(), STARTING_CASH);

    let history = engine.history(account.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].symbol, CASH_SYMBOL);
    assert_eq!(history[0].quantity, STARTING_CASH.cents());
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let (engine, _quotes) = engine_with_quotes(&[]).await;

    registered(&engine).await;
    let err = engine.register("alice", "other").await.unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("alice".to_string()));
}

#[tokio::test]
async fn buy_moves_cash_and_stock_in_step() {
    let (engine, _quotes) = engine_with_quotes(&[("AAPL", "Apple Inc.", 5000)]).await;
    let account = registered(&engine).await;

    let receipt = engine.buy(account.id, "aapl", 10).await.unwrap();
    assert_eq!(receipt.action, TradeAction::Bought);
    assert_eq!(receipt.action.as_str(), "bought");
    assert_eq!(receipt.symbol, "AAPL");
    assert_eq!(receipt.name, "Apple Inc.");
    assert_eq!(receipt.price, MoneyCents::new(5000));
    assert_eq!(receipt.units, 10);
    assert_eq!(receipt.value, MoneyCents::new(50_000));

    assert_eq!(
        engine.cash_balance(account.id).await.unwrap(),
        MoneyCents::new(950_000)
    );
    assert_eq!(
        engine.instrument_balance(account.id, "AAPL").await.unwrap(),
        10
    );

    // Exactly two movements beyond the seed, paired and opposite in effect.
    let history = engine.history(account.id).await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].symbol, "AAPL");
    assert_eq!(history[0].quantity, 10);
    assert_eq!(history[1].symbol, CASH_SYMBOL);
    assert_eq!(history[1].quantity, -50_000);
}

#[tokio::test]
async fn buy_with_insufficient_funds_leaves_ledger_untouched() {
    let (engine, _quotes) = engine_with_quotes(&[("AAPL", "Apple Inc.", 5000)]).await;
    let account = registered(&engine).await;

    // 201 units at $50.00 costs $10,050.00 against $10,000.00 of cash.
    let err = engine.buy(account.id, "AAPL", 201).await.unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    assert_eq!(engine.cash_balance(account.id).await.unwrap(), STARTING_CASH);
    assert_eq!(engine.history(account.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn buy_of_unknown_symbol_is_rejected_before_the_ledger() {
    let (engine, _quotes) = engine_with_quotes(&[]).await;
    let account = registered(&engine).await;

    let err = engine.buy(account.id, "ZZZZ", 1).await.unwrap_err();
    assert_eq!(err, EngineError::SymbolNotFound("ZZZZ".to_string()));
    assert_eq!(engine.history(account.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn cash_sentinel_is_untradable() {
    let (engine, _quotes) = engine_with_quotes(&[]).await;
    let account = registered(&engine).await;

    let err = engine.buy(account.id, CASH_SYMBOL, 1).await.unwrap_err();
    assert_eq!(err, EngineError::SymbolNotFound(CASH_SYMBOL.to_string()));
}

#[tokio::test]
async fn buy_validates_units_and_symbol() {
    let (engine, _quotes) = engine_with_quotes(&[("AAPL", "Apple Inc.", 5000)]).await;
    let account = registered(&engine).await;

    let err = engine.buy(account.id, "AAPL", 0).await.unwrap_err();
    assert_eq!(err, EngineError::InvalidInput("units must be > 0".to_string()));

    let err = engine.buy(account.id, "AAPL", -3).await.unwrap_err();
    assert_eq!(err, EngineError::InvalidInput("units must be > 0".to_string()));

    let err = engine.buy(account.id, "  ", 1).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidInput("symbol must not be empty".to_string())
    );
}

#[tokio::test]
async fn sell_mirrors_buy() {
    let (engine, _quotes) = engine_with_quotes(&[("AAPL", "Apple Inc.", 5000)]).await;
    let account = registered(&engine).await;

    engine.buy(account.id, "AAPL", 10).await.unwrap();

    let receipt = engine
        .sell(account.id, "AAPL", SellAmount::Units(4))
        .await
        .unwrap();
    assert_eq!(receipt.action, TradeAction::Sold);
    assert_eq!(receipt.action.as_str(), "sold");
    assert_eq!(receipt.units, 4);
    assert_eq!(receipt.value, MoneyCents::new(20_000));

    assert_eq!(
        engine.cash_balance(account.id).await.unwrap(),
        MoneyCents::new(970_000)
    );
    assert_eq!(
        engine.instrument_balance(account.id, "AAPL").await.unwrap(),
        6
    );
}

#[tokio::test]
async fn buy_then_sell_all_round_trip() {
    // Start with $10,000; buy 10 units at $50.00; sell everything at
    // $60.00: cash lands at $10,100.00 and the position disappears.
    let (engine, quotes) = engine_with_quotes(&[("AAPL", "Apple Inc.", 5000)]).await;
    let account = registered(&engine).await;

    engine.buy(account.id, "AAPL", 10).await.unwrap();
    assert_eq!(
        engine.cash_balance(account.id).await.unwrap(),
        MoneyCents::new(950_000)
    );

    quotes.set("AAPL", "Apple Inc.", 6000);
    let receipt = engine
        .sell(account.id, "AAPL", SellAmount::All)
        .await
        .unwrap();
    assert_eq!(receipt.units, 10);
    assert_eq!(receipt.value, MoneyCents::new(60_000));

    assert_eq!(
        engine.cash_balance(account.id).await.unwrap(),
        MoneyCents::new(1_010_000)
    );
    assert_eq!(
        engine.instrument_balance(account.id, "AAPL").await.unwrap(),
        0
    );

    // A zeroed position drops out of the holdings view entirely.
    let holdings = engine.holdings_summary(account.id).await.unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].symbol, CASH_SYMBOL);
    assert_eq!(holdings[0].quantity, 1_010_000);
}

#[tokio::test]
async fn overselling_is_rejected_without_movements() {
    let (engine, _quotes) = engine_with_quotes(&[("AAPL", "Apple Inc.", 5000)]).await;
    let account = registered(&engine).await;

    engine.buy(account.id, "AAPL", 10).await.unwrap();

    let err = engine
        .sell(account.id, "AAPL", SellAmount::Units(11))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientStock(_)));

    assert_eq!(engine.history(account.id).await.unwrap().len(), 3);
    assert_eq!(
        engine.instrument_balance(account.id, "AAPL").await.unwrap(),
        10
    );
}

#[tokio::test]
async fn partial_sells_are_allowed() {
    let (engine, _quotes) = engine_with_quotes(&[("AAPL", "Apple Inc.", 5000)]).await;
    let account = registered(&engine).await;

    engine.buy(account.id, "AAPL", 10).await.unwrap();

    engine
        .sell(account.id, "AAPL", SellAmount::Units(1))
        .await
        .unwrap();
    assert_eq!(
        engine.instrument_balance(account.id, "AAPL").await.unwrap(),
        9
    );
}

#[tokio::test]
async fn selling_all_of_an_empty_position_is_rejected() {
    let (engine, _quotes) = engine_with_quotes(&[("AAPL", "Apple Inc.", 5000)]).await;
    let account = registered(&engine).await;

    let err = engine
        .sell(account.id, "AAPL", SellAmount::All)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientStock(_)));
}

#[tokio::test]
async fn sell_validates_units() {
    let (engine, _quotes) = engine_with_quotes(&[("AAPL", "Apple Inc.", 5000)]).await;
    let account = registered(&engine).await;

    for units in [0, -5] {
        let err = engine
            .sell(account.id, "AAPL", SellAmount::Units(units))
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::InvalidInput("units must be > 0".to_string()));
    }
}

#[tokio::test]
async fn concurrent_buys_cannot_overspend() {
    // Cash covers one of the two buys, not both; the per-account lock
    // serializes them so the loser sees the reduced balance.
    let (engine, _quotes) = engine_with_quotes(&[("AAPL", "Apple Inc.", 6000)]).await;
    let engine = Arc::new(engine);
    let account = registered(&engine).await;

    let (first, second) = tokio::join!(
        engine.buy(account.id, "AAPL", 100),
        engine.buy(account.id, "AAPL", 100),
    );

    let succeeded = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);

    assert_eq!(
        engine.cash_balance(account.id).await.unwrap(),
        MoneyCents::new(400_000)
    );
    assert_eq!(
        engine.instrument_balance(account.id, "AAPL").await.unwrap(),
        100
    );
}

#[tokio::test]
async fn accounts_do_not_share_ledgers() {
    let (engine, _quotes) = engine_with_quotes(&[("AAPL", "Apple Inc.", 5000)]).await;
    let alice = engine.register("alice", "password").await.unwrap();
    let bob = engine.register("bob", "password").await.unwrap();

    engine.buy(alice.id, "AAPL", 5).await.unwrap();

    assert_eq!(engine.cash_balance(bob.id).await.unwrap(), STARTING_CASH);
    let holdings = engine.holdings_summary(bob.id).await.unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].symbol, CASH_SYMBOL);
}

#[tokio::test]
async fn credentials_verify_and_rotate() {
    let (engine, _quotes) = engine_with_quotes(&[]).await;
    let account = registered(&engine).await;

    let verified = engine.verify_credentials("alice", "password").await.unwrap();
    assert_eq!(verified, account);

    let err = engine
        .verify_credentials("alice", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Credential(_)));

    // Unknown users fail the same way as wrong passwords.
    let err = engine
        .verify_credentials("mallory", "password")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Credential(_)));

    let err = engine
        .update_credential(account.id, "wrong", "rotated")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Credential(_)));

    engine
        .update_credential(account.id, "password", "rotated")
        .await
        .unwrap();

    assert!(engine.verify_credentials("alice", "password").await.is_err());
    assert!(engine.verify_credentials("alice", "rotated").await.is_ok());
}

#[tokio::test]
async fn history_is_ordered_newest_first() {
    let (engine, _quotes) = engine_with_quotes(&[("AAPL", "Apple Inc.", 5000)]).await;
    let account = registered(&engine).await;

    engine.buy(account.id, "AAPL", 2).await.unwrap();
    engine
        .sell(account.id, "AAPL", SellAmount::Units(1))
        .await
        .unwrap();

    let history = engine.history(account.id).await.unwrap();
    assert_eq!(history.len(), 5);
    assert!(history.windows(2).all(|pair| pair[0].id > pair[1].id));
    assert_eq!(history[0].symbol, "AAPL");
    assert_eq!(history[0].quantity, -1);
    assert_eq!(history[1].symbol, CASH_SYMBOL);
    assert_eq!(history[1].quantity, 5000);
}
