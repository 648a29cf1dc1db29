use thiserror::Error;

use crate::client::auth::AuthError;
use crate::client::local_db::StoreError;
use crate::shared::{ConfigError, GatewayError, SharedError};

/// Errors surfaced by the dashboard controller
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration missing: {0}")]
    Config(#[from] ConfigError),

    #[error("local storage error: {0}")]
    Store(#[from] StoreError),

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("not logged in")]
    NotLoggedIn,

    #[error(transparent)]
    Shared(#[from] SharedError),
}

pub type AppResult<T> = Result<T, AppError>;
