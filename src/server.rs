use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{Extension, Router, routing::get};
use tokio::{
    net::TcpListener,
    sync::{Mutex, Notify, oneshot},
};

use crate::{
    api::{self, CallbackSlot},
    error::AuthError,
};

/// Local HTTP listener that accepts a single OAuth callback and then stops.
///
/// Binding happens up front so the port is ready before the browser is
/// sent to Spotify.
pub struct CallbackServer {
    listener: TcpListener,
    path: String,
}

impl CallbackServer {
    /// Binds the listener and remembers which path to serve.
    ///
    /// # Arguments
    ///
    /// * `addr` - Socket address to listen on; port `0` picks a free one
    /// * `path` - Route that receives the redirect, e.g. `/callback`
    ///
    /// # Errors
    ///
    /// [`AuthError::Io`] if the address cannot be bound.
    ///
    /// # Example
    ///
    /// ```
    /// let server = CallbackServer::bind(config.callback_addr, "/callback").await?;
    /// let code = server.wait_for_code(None).await?;
    /// ```
    pub async fn bind(addr: SocketAddr, path: &str) -> Result<Self, AuthError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            path: path.to_string(),
        })
    }

    /// Address actually bound, useful after binding port `0`.
    pub fn local_addr(&self) -> Result<SocketAddr, AuthError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves until one request reaches the callback path, then shuts down.
    ///
    /// Returns the `code` query parameter of that request. A request
    /// without one ends the attempt with [`AuthError::AuthCallback`]. With
    /// `timeout` set to `None` this waits forever.
    ///
    /// # Errors
    ///
    /// - [`AuthError::AuthCallback`] if the callback had no usable code
    /// - [`AuthError::CallbackTimeout`] if `timeout` elapsed first
    pub async fn wait_for_code(self, timeout: Option<Duration>) -> Result<String, AuthError> {
        let (sender, receiver) = oneshot::channel();
        let slot: CallbackSlot = Arc::new(Mutex::new(Some(sender)));
        let shutdown = Arc::new(Notify::new());

        let app = Router::new()
            .route(&self.path, get(api::callback))
            .layer(Extension(slot));

        let signal = Arc::clone(&shutdown);
        let server = tokio::spawn(async move {
            axum::serve(self.listener, app)
                .with_graceful_shutdown(async move { signal.notified().await })
                .await
        });

        let received = match timeout {
            Some(limit) => tokio::time::timeout(limit, receiver)
                .await
                .map_err(|_| AuthError::CallbackTimeout(limit)),
            None => Ok(receiver.await),
        };

        shutdown.notify_one();
        match server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!("callback server stopped with error: {}", e),
            Err(e) => tracing::debug!("callback server task failed: {}", e),
        }

        match received? {
            Ok(Some(code)) => Ok(code),
            Ok(None) | Err(_) => Err(AuthError::AuthCallback),
        }
    }
}
