use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::contract::model::User;
use crate::domain::error::DomainError;
use crate::domain::password::{hash_password, verify_password};
use crate::domain::repo::{InsertUserError, NewUser, UserCredentials, UsersRepository};
use crate::domain::token::TokenCodec;

/// Issues and resolves bearer tokens; creates accounts on first login.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UsersRepository>,
    tokens: TokenCodec,
    initial_balance: i64,
}

impl AuthService {
    pub fn new(users: Arc<dyn UsersRepository>, tokens: TokenCodec, initial_balance: i64) -> Self {
        Self {
            users,
            tokens,
            initial_balance,
        }
    }

    #[instrument(
        name = "company_store.auth.authenticate",
        skip(self, password),
        fields(username = %username)
    )]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String, DomainError> {
        if username.trim().is_empty() {
            return Err(DomainError::validation("username", "must not be empty"));
        }
        if password.is_empty() {
            return Err(DomainError::validation("password", "must not be empty"));
        }

        let existing = self
            .users
            .find_by_username(username)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        let user = match existing {
            Some(creds) => self.check_password(creds, password).await?,
            None => self.sign_up(username, password).await?,
        };

        debug!(user_id = user.id, "issuing token");
        self.tokens.issue(user.id)
    }

    #[instrument(name = "company_store.auth.resolve", skip_all)]
    pub async fn resolve(&self, token: &str) -> Result<User, DomainError> {
        let claims = self.tokens.verify(token)?;
        self.users
            .find_by_id(claims.user_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| {
                debug!(user_id = claims.user_id, "token refers to a missing user");
                DomainError::Unauthorized
            })
    }

    async fn check_password(
        &self,
        creds: UserCredentials,
        password: &str,
    ) -> Result<User, DomainError> {
        let ok = verify_password(password.to_owned(), creds.password_hash)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !ok {
            warn!(user_id = creds.user.id, "password mismatch");
            return Err(DomainError::Unauthorized);
        }
        Ok(creds.user)
    }

    async fn sign_up(&self, username: &str, password: &str) -> Result<User, DomainError> {
        let password_hash = hash_password(password.to_owned())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        let new_user = NewUser {
            username: username.to_owned(),
            password_hash,
            coin_balance: self.initial_balance,
            created_at: Utc::now(),
        };

        match self.users.insert(new_user).await {
            Ok(user) => {
                info!(user_id = user.id, balance = user.coin_balance, "created user on first login");
                Ok(user)
            }
            Err(InsertUserError::UsernameTaken) => {
                // A concurrent first login won the insert; authenticate against its row.
                debug!("username taken concurrently, re-reading");
                let creds = self
                    .users
                    .find_by_username(username)
                    .await
                    .map_err(|e| DomainError::database(e.to_string()))?
                    .ok_or_else(|| DomainError::user_not_found(username))?;
                self.check_password(creds, password).await
            }
            Err(InsertUserError::Storage(e)) => Err(DomainError::database(e.to_string())),
        }
    }
}
