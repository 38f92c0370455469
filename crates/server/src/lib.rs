use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{ServerState, run, run_with_listener, spawn_with_listener};

mod account;
mod portfolio;
mod server;
mod trading;

pub mod types {
    pub mod account {
        pub use api_types::account::{AccountCreated, PasswordChange, RegisterNew};
    }

    pub mod quote {
        pub use api_types::quote::{QuoteGet, QuoteView};
    }

    pub mod trade {
        pub use api_types::trade::{BuyNew, ReceiptView, SellNew, TradeAction};
    }

    pub mod portfolio {
        pub use api_types::portfolio::{BalanceView, HoldingView, HoldingsResponse};
    }

    pub mod history {
        pub use api_types::history::{HistoryResponse, MovementView};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

/// JSON error body: a stable machine `reason` plus a human message.
#[derive(Serialize)]
struct Error {
    error: String,
    reason: &'static str,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) | EngineError::SymbolNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Credential(_) => StatusCode::UNAUTHORIZED,
        EngineError::BalanceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidInput(_)
        | EngineError::InsufficientFunds(_)
        | EngineError::InsufficientStock(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn reason_for_engine_error(err: &EngineError) -> &'static str {
    match err {
        EngineError::InvalidInput(_) => "invalid_input",
        EngineError::SymbolNotFound(_) => "symbol_not_found",
        EngineError::InsufficientFunds(_) => "insufficient_funds",
        EngineError::InsufficientStock(_) => "insufficient_stock",
        EngineError::BalanceUnavailable(_) => "balance_unavailable",
        EngineError::KeyNotFound(_) => "not_found",
        EngineError::ExistingKey(_) => "already_exists",
        EngineError::Credential(_) => "invalid_credentials",
        EngineError::Database(_) => "storage_error",
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, reason, error) = match self {
            ServerError::Engine(err) => {
                let status = status_for_engine_error(&err);
                let reason = reason_for_engine_error(&err);
                (status, reason, message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, "bad_request", err),
        };

        (status, Json(Error { error, reason })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_symbol_not_found_maps_to_404() {
        let res =
            ServerError::from(EngineError::SymbolNotFound("FOO".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::ExistingKey("alice".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_rejections_map_to_422() {
        for err in [
            EngineError::InvalidInput("x".to_string()),
            EngineError::InsufficientFunds("x".to_string()),
            EngineError::InsufficientStock("x".to_string()),
        ] {
            let res = ServerError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn engine_balance_unavailable_maps_to_503() {
        let res =
            ServerError::from(EngineError::BalanceUnavailable("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn engine_credential_maps_to_401() {
        let res = ServerError::from(EngineError::Credential("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
