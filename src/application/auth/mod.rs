//! Registration, login and token lifecycle.

pub mod passwords;
pub mod tokens;

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{CreateUserParams, RepoError, UsersRepo};
use crate::domain::entities::UserRecord;
use crate::domain::types::Role;

pub use passwords::PasswordError;
pub use tokens::{IssuedToken, Principal, TokenError, TokenService};

#[derive(Debug, Error)]
pub enum AuthError {
    /// Covers both an unknown email and a wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("username or email is already registered")]
    Conflict,
    #[error("token subject no longer exists")]
    UnknownSubject,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error("password hashing task failed: {0}")]
    Blocking(String),
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for AuthError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Duplicate { .. } => Self::Conflict,
            other => Self::Repo(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

/// Credentials for the administrator ensured at startup.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UsersRepo>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(users: Arc<dyn UsersRepo>, tokens: TokenService) -> Self {
        Self { users, tokens }
    }

    /// New accounts always get [`Role::User`].
    pub async fn register_user(&self, command: RegisterCommand) -> Result<UserRecord, AuthError> {
        self.create_user(command.username, command.email, command.password, Role::User)
            .await
    }

    pub async fn login_user(&self, command: LoginCommand) -> Result<IssuedToken, AuthError> {
        let Some(user) = self.users.find_user_by_email(&command.email).await? else {
            let password = command.password;
            // Outcome is irrelevant; only the cost must match a real verification.
            let _ = run_blocking(move || passwords::verify_dummy(&password)).await;
            return Err(AuthError::InvalidCredentials);
        };

        let hash = user.password_hash.clone();
        let password = command.password;
        let matches = run_blocking(move || passwords::verify_password(&password, &hash)).await?;
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(self.tokens.issue(&user)?)
    }

    /// Exchange a valid token for a fresh one. The user is reloaded so that
    /// role changes and deletions take effect.
    pub async fn refresh_token(&self, token: &str) -> Result<IssuedToken, AuthError> {
        let principal = self.tokens.verify(token)?;
        let user = self
            .users
            .find_user_by_id(principal.user_id)
            .await?
            .ok_or(AuthError::UnknownSubject)?;

        Ok(self.tokens.issue(&user)?)
    }

    pub fn verify_token(&self, token: &str) -> Result<Principal, AuthError> {
        Ok(self.tokens.verify(token)?)
    }

    /// Create the configured administrator unless an account with that email
    /// exists. Returns whether a user was created.
    pub async fn ensure_admin(&self, seed: AdminSeed) -> Result<bool, AuthError> {
        if self.users.find_user_by_email(&seed.email).await?.is_some() {
            return Ok(false);
        }

        let user = self
            .create_user(seed.username, seed.email, seed.password, Role::Admin)
            .await?;
        info!(
            target = "libris::auth",
            user_id = user.id,
            username = %user.username,
            "administrator account created"
        );
        Ok(true)
    }

    async fn create_user(
        &self,
        username: String,
        email: String,
        password: String,
        role: Role,
    ) -> Result<UserRecord, AuthError> {
        let password_hash = run_blocking(move || passwords::hash_password(&password)).await?;

        let user = self
            .users
            .create_user(CreateUserParams {
                username,
                email,
                password_hash,
                role,
            })
            .await?;
        Ok(user)
    }
}

/// Argon2 is deliberately slow; keep it off the async workers.
async fn run_blocking<T, F>(work: F) -> Result<T, AuthError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PasswordError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| AuthError::Blocking(err.to_string()))?
        .map_err(AuthError::from)
}
