//! Account API endpoints

use api_types::account::{AccountCreated, PasswordChange, RegisterNew};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::Account;

use crate::{ServerError, server::ServerState};

/// Creates an account seeded with the starting cash.
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<RegisterNew>,
) -> Result<(StatusCode, Json<AccountCreated>), ServerError> {
    let account = state
        .engine
        .register(&payload.username, &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AccountCreated {
            account_id: account.id,
        }),
    ))
}

/// Replaces the caller's password after verifying the current one.
pub async fn change_password(
    Extension(account): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<PasswordChange>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .update_credential(account.id, &payload.old_password, &payload.new_password)
        .await?;

    Ok(StatusCode::OK)
}
