//! Account directory: registration, credential verification, password
//! change.
//!
//! Only identity lives here; the trading side needs nothing but the opaque
//! account id. Credentials are stored as argon2 hashes.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Account, CASH_SYMBOL, Engine, EngineError, ResultEngine, STARTING_CASH, ledger, users, with_tx,
};

fn hash_password(password: &str) -> ResultEngine<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| EngineError::Credential(format!("failed to hash password: {err}")))
}

fn verify_password(password: &str, stored_hash: &str) -> ResultEngine<()> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|err| EngineError::Credential(format!("stored hash unreadable: {err}")))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| EngineError::Credential("invalid username or password".to_string()))
}

impl Engine {
    /// Registers a new account and seeds its starting cash.
    ///
    /// The user row and the seed movement are written in one DB
    /// transaction: an account either exists with its starting cash or not
    /// at all.
    pub async fn register(&self, username: &str, password: &str) -> ResultEngine<Account> {
        let username = username.trim();
        if username.is_empty() {
            return Err(EngineError::InvalidInput(
                "username must not be empty".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(EngineError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }

        let existing = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.database)
            .await?;
        if existing.is_some() {
            return Err(EngineError::ExistingKey(username.to_string()));
        }

        let id = Uuid::new_v4();
        let user = users::ActiveModel {
            id: ActiveValue::Set(id.to_string()),
            username: ActiveValue::Set(username.to_string()),
            password_hash: ActiveValue::Set(hash_password(password)?),
        };

        with_tx!(self, |db_tx| {
            user.insert(&db_tx).await?;
            ledger::append(&db_tx, id, CASH_SYMBOL, STARTING_CASH.cents()).await?;
            Ok(())
        })?;

        Ok(Account {
            id,
            username: username.to_string(),
        })
    }

    /// Checks a username/password pair.
    ///
    /// Unknown user and wrong password are indistinguishable to the caller.
    pub async fn verify_credentials(&self, username: &str, password: &str) -> ResultEngine<Account> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::Credential("invalid username or password".to_string()))?;

        verify_password(password, &user.password_hash)?;
        Account::try_from(&user)
    }

    /// Replaces the credential after verifying the current one.
    pub async fn update_credential(
        &self,
        account_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> ResultEngine<()> {
        if new_password.is_empty() {
            return Err(EngineError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }

        let user = users::Entity::find_by_id(account_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
        verify_password(old_password, &user.password_hash)?;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = ActiveValue::Set(hash_password(new_password)?);
        active.update(&self.database).await?;
        Ok(())
    }
}
