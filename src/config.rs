//! Configuration for the Spotify authorization flow.
//!
//! All endpoints, credential keys and the callback bind address live in
//! [`AuthConfig`], which is handed to the authorizer at construction. Nothing
//! here is global, so tests and hosts can run several isolated instances
//! side by side, each pointed at its own credential file and servers.
//!
//! The credential file location is resolved in this order:
//! 1. `TERMIFY_ENV_PATH` environment variable
//! 2. `~/.termify/.env`
//! 3. `./.termify/.env` when no home directory can be determined

use std::{
    env,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    path::PathBuf,
    time::Duration,
};

use url::Url;

/// Environment variable overriding the credential file location.
pub const ENV_PATH_VAR: &str = "TERMIFY_ENV_PATH";

pub const CLIENT_ID_KEY: &str = "TFY_CLIENT_ID";
pub const ACCESS_TOKEN_KEY: &str = "TFY_ACCESS_TOKEN";
pub const REFRESH_TOKEN_KEY: &str = "TFY_REFRESH_TOKEN";
pub const TOKEN_EXPIRATION_KEY: &str = "TFY_TOKEN_EXPIRATION";

pub const SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";

pub const REDIRECT_URI: &str = "http://localhost:8888/callback";
pub const CALLBACK_PORT: u16 = 8888;

/// Scopes needed to read and control playback.
pub const DEFAULT_SCOPES: [&str; 2] = ["user-read-playback-state", "user-modify-playback-state"];

/// Settings for one [`Authorizer`](crate::spotify::auth::Authorizer) instance.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Credential file backing the default store.
    pub store_path: PathBuf,
    pub client_id_key: String,
    pub access_token_key: String,
    pub refresh_token_key: String,
    pub expiration_key: String,
    /// Spotify authorize endpoint opened in the browser.
    pub auth_url: String,
    /// Spotify token endpoint for code exchange and refresh.
    pub token_url: String,
    /// Must match a redirect URI registered for the Spotify application.
    pub redirect_uri: String,
    /// Where the one-shot callback server listens. Its port has to match
    /// the port of `redirect_uri`.
    pub callback_addr: SocketAddr,
    pub scopes: Vec<String>,
    /// `None` waits for the browser callback indefinitely.
    pub callback_timeout: Option<Duration>,
}

impl AuthConfig {
    /// Creates a configuration with Spotify's endpoints and the `TFY_*` keys,
    /// persisting credentials to `store_path`.
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            client_id_key: CLIENT_ID_KEY.to_string(),
            access_token_key: ACCESS_TOKEN_KEY.to_string(),
            refresh_token_key: REFRESH_TOKEN_KEY.to_string(),
            expiration_key: TOKEN_EXPIRATION_KEY.to_string(),
            auth_url: SPOTIFY_AUTH_URL.to_string(),
            token_url: SPOTIFY_TOKEN_URL.to_string(),
            redirect_uri: REDIRECT_URI.to_string(),
            callback_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, CALLBACK_PORT)),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            callback_timeout: None,
        }
    }

    /// Same as [`AuthConfig::new`] with the credential file from [`store_path`].
    pub fn from_env() -> Self {
        Self::new(store_path())
    }

    /// Gives up on the browser callback after `timeout`.
    ///
    /// # Example
    ///
    /// ```
    /// let config = AuthConfig::from_env().with_callback_timeout(Duration::from_secs(120));
    /// ```
    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = Some(timeout);
        self
    }

    /// Path component of the redirect URI, served by the callback server.
    pub fn callback_path(&self) -> Result<String, url::ParseError> {
        let uri = Url::parse(&self.redirect_uri)?;
        Ok(uri.path().to_string())
    }

    /// Space-delimited scope string sent to the authorize endpoint.
    pub fn scope(&self) -> String {
        self.scopes.join(" ")
    }
}

/// Returns the credential file location.
///
/// Honors `TERMIFY_ENV_PATH`, otherwise falls back to `.termify/.env` in
/// the user's home directory.
///
/// # Example
///
/// ```
/// let path = store_path(); // e.g., "/home/user/.termify/.env"
/// ```
pub fn store_path() -> PathBuf {
    if let Some(path) = env::var_os(ENV_PATH_VAR) {
        return PathBuf::from(path);
    }

    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".termify/.env");
    path
}

