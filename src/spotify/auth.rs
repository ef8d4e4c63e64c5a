use std::io;

use reqwest::{Client, StatusCode};
use url::Url;

use crate::{
    config::AuthConfig,
    error::AuthError,
    info,
    management::CredentialStore,
    server::CallbackServer,
    types::{PkceChallenge, TokenResponse},
    utils, warning,
};

/// Opens the Spotify consent page for the user.
pub trait BrowserLauncher: Send + Sync {
    fn open(&self, url: &str) -> io::Result<()>;
}

/// Launches the user's default browser.
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        webbrowser::open(url)
    }
}

/// Obtains and keeps fresh a Spotify bearer token using Authorization Code
/// with PKCE.
///
/// Credentials live in the [`CredentialStore`]; the authorizer only caches
/// the access token between calls. Each [`refresh_token`] call walks the
/// same decision chain:
///
/// 1. **No access token**: run the interactive browser flow
/// 2. **Expired token**: exchange the refresh token, or fall back to the
///    interactive flow when none is stored
/// 3. **Valid token**: nothing to do, no network I/O
///
/// Failures are returned to the caller as-is; nothing is retried.
///
/// [`refresh_token`]: Authorizer::refresh_token
pub struct Authorizer<S: CredentialStore> {
    config: AuthConfig,
    store: S,
    browser: Box<dyn BrowserLauncher>,
    http: Client,
    client_id: String,
    token: Option<String>,
}

impl<S: CredentialStore> Authorizer<S> {
    /// Creates an authorizer, reading the client id from `store`.
    ///
    /// # Errors
    ///
    /// [`AuthError::Configuration`] when the client id key is not present.
    pub async fn new(config: AuthConfig, store: S) -> Result<Self, AuthError> {
        let client_id = store.get(&config.client_id_key).await?.ok_or_else(|| {
            AuthError::Configuration {
                key: config.client_id_key.clone(),
                path: config.store_path.clone(),
            }
        })?;

        Ok(Self {
            config,
            store,
            browser: Box::new(SystemBrowser),
            http: Client::new(),
            client_id,
            token: None,
        })
    }

    /// Replaces the browser used for the consent page.
    ///
    /// # Arguments
    ///
    /// * `browser` - Launcher invoked with the authorization URL
    ///
    /// # Example
    ///
    /// ```
    /// let authorizer = Authorizer::new(config, store).await?.with_browser(SystemBrowser);
    /// ```
    pub fn with_browser(mut self, browser: impl BrowserLauncher + 'static) -> Self {
        self.browser = Box::new(browser);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Access token cached by the last [`refresh_token`](Self::refresh_token).
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Makes sure a usable access token is stored and cached.
    ///
    /// # Errors
    ///
    /// Whatever the chosen flow fails with: store errors, callback errors,
    /// or a non-200 answer from the token endpoint.
    pub async fn refresh_token(&mut self) -> Result<(), AuthError> {
        if self.get_token().await?.is_none() {
            tracing::debug!("no stored access token, starting interactive authorization");
            self.request_auth().await?;
        } else if self.token_expired().await {
            tracing::debug!("stored access token expired, refreshing");
            self.refresh_access_token().await?;
        }

        self.token = self.get_token().await?;
        Ok(())
    }

    /// Runs the interactive PKCE flow: browser consent, one callback, code
    /// exchange, persistence.
    ///
    /// Blocks until the browser hits the callback (or the configured
    /// callback timeout elapses).
    ///
    /// # Errors
    ///
    /// - [`AuthError::AuthCallback`] if the callback carried no code
    /// - [`AuthError::CallbackTimeout`] if the timeout elapsed first
    /// - [`AuthError::TokenExchange`] if the code exchange was rejected
    pub async fn request_auth(&mut self) -> Result<(), AuthError> {
        let pkce = PkceChallenge::generate();

        let server =
            CallbackServer::bind(self.config.callback_addr, &self.config.callback_path()?).await?;
        let auth_url = self.authorization_url(&pkce.code_challenge)?;

        if self.browser.open(auth_url.as_str()).is_err() {
            warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                auth_url
            )
        }
        info!("Waiting for authorization callback on {}", self.config.redirect_uri);

        let code = server.wait_for_code(self.config.callback_timeout).await?;
        let token = self.exchange_code(&code, &pkce.code_verifier).await?;
        self.save_token(&token).await
    }

    /// `true` unless a stored expiration exists, parses, and lies in the
    /// future. Any failure to tell counts as expired.
    pub async fn token_expired(&self) -> bool {
        let expiration = match self.store.get(&self.config.expiration_key).await {
            Ok(Some(value)) => value,
            Ok(None) => return true,
            Err(e) => {
                tracing::debug!("cannot read token expiration: {}", e);
                return true;
            }
        };

        match expiration.trim().parse::<i64>() {
            Ok(expires_at) => utils::now_epoch() >= expires_at,
            Err(_) => true,
        }
    }

    /// Stored expiration as epoch seconds, if present and well formed.
    pub async fn expires_at(&self) -> Option<i64> {
        let value = self.store.get(&self.config.expiration_key).await.ok()??;
        value.trim().parse().ok()
    }

    /// Access token currently in the store.
    pub async fn get_token(&self) -> Result<Option<String>, AuthError> {
        Ok(self.store.get(&self.config.access_token_key).await?)
    }

    /// Persists a token endpoint response with an absolute expiration.
    ///
    /// Access token, refresh token and expiration go to the store in a
    /// single write. A response without a refresh token keeps the stored
    /// one.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidExpiry`] when `expires_in` is too large to add to
    /// the current time; nothing is written in that case.
    pub async fn save_token(&self, token: &TokenResponse) -> Result<(), AuthError> {
        let expires_at = i64::try_from(token.expires_in)
            .ok()
            .and_then(|secs| utils::now_epoch().checked_add(secs))
            .ok_or(AuthError::InvalidExpiry(token.expires_in))?
            .to_string();

        let refresh_token = match &token.refresh_token {
            Some(refresh) => Some(refresh.clone()),
            None => self.store.get(&self.config.refresh_token_key).await?,
        };

        let mut entries = vec![
            (self.config.access_token_key.as_str(), token.access_token.as_str()),
            (self.config.expiration_key.as_str(), expires_at.as_str()),
        ];
        if let Some(refresh) = refresh_token.as_deref() {
            entries.push((self.config.refresh_token_key.as_str(), refresh));
        }

        self.store.set_many(&entries).await?;
        Ok(())
    }

    fn authorization_url(&self, code_challenge: &str) -> Result<Url, AuthError> {
        let url = Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("code_challenge_method", "S256"),
                ("code_challenge", code_challenge),
                ("scope", self.config.scope().as_str()),
            ],
        )?;
        Ok(url)
    }

    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<TokenResponse, AuthError> {
        let res = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("code_verifier", verifier),
            ])
            .send()
            .await?;

        if res.status() != StatusCode::OK {
            return Err(AuthError::TokenExchange {
                status: res.status().as_u16(),
            });
        }

        res.json::<TokenResponse>()
            .await
            .map_err(AuthError::MalformedTokenResponse)
    }

    async fn refresh_access_token(&mut self) -> Result<(), AuthError> {
        let Some(refresh_token) = self.store.get(&self.config.refresh_token_key).await? else {
            tracing::debug!("no stored refresh token, falling back to interactive authorization");
            return self.request_auth().await;
        };

        let res = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", self.client_id.as_str()),
            ])
            .send()
            .await?;

        if res.status() != StatusCode::OK {
            return Err(AuthError::TokenRefresh {
                status: res.status().as_u16(),
            });
        }

        let token = res
            .json::<TokenResponse>()
            .await
            .map_err(AuthError::MalformedTokenResponse)?;
        self.save_token(&token).await
    }
}
