use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;

/// Failures while reading or writing the credential file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("credential store could not be parsed: {0}")]
    Parse(String),

    #[error("value for {key} cannot be stored: {reason}")]
    InvalidValue { key: String, reason: &'static str },
}

impl From<dotenvy::Error> for StoreError {
    fn from(err: dotenvy::Error) -> Self {
        match err {
            dotenvy::Error::Io(e) => StoreError::Io(e),
            other => StoreError::Parse(other.to_string()),
        }
    }
}

/// Everything that can end an authorization attempt.
///
/// None of these are retried by the authorizer itself; recoverable states
/// (missing or expired token, missing refresh token) are handled by switching
/// to another flow before an error is ever produced.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{key} is not defined in {}", .path.display())]
    Configuration { key: String, path: PathBuf },

    #[error("authorization callback did not contain a code")]
    AuthCallback,

    #[error("no authorization callback received within {0:?}")]
    CallbackTimeout(Duration),

    #[error("unable to convert authorization code into access token (status {status})")]
    TokenExchange { status: u16 },

    #[error("unable to refresh access token (status {status})")]
    TokenRefresh { status: u16 },

    #[error("token lifetime of {0} seconds cannot be turned into an expiry time")]
    InvalidExpiry(u64),

    #[error("token endpoint returned an unexpected body: {0}")]
    MalformedTokenResponse(#[source] reqwest::Error),

    #[error("invalid authorization URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures of the Web API "currently playing" request.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("player endpoint answered with status {0}")]
    Status(u16),
}
