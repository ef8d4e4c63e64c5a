#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    io,
    net::SocketAddr,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Form, Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};
use serde_json::{Value, json};
use termify::{config::AuthConfig, spotify::auth::BrowserLauncher};
use tokio::net::TcpListener;
use url::Url;

/// Unique credential file path under the system temp directory.
pub fn temp_env_path() -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "termify-test-{}-{:016x}/.env",
        std::process::id(),
        rand::random::<u64>()
    ));
    path
}

pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .map(|a| a.port())
        .expect("no free port")
}

/// Config pointing at a local token endpoint and a free callback port.
pub fn test_config(token_url: &str) -> AuthConfig {
    let port = free_port();
    let mut config = AuthConfig::new(temp_env_path());
    config.token_url = token_url.to_string();
    config.redirect_uri = format!("http://127.0.0.1:{port}/callback");
    config.callback_addr = SocketAddr::from(([127, 0, 0, 1], port));
    config.callback_timeout = Some(Duration::from_secs(10));
    config
}

pub fn token_body(access: &str, refresh: Option<&str>, expires_in: u64) -> Value {
    match refresh {
        Some(refresh) => json!({
            "access_token": access,
            "token_type": "Bearer",
            "refresh_token": refresh,
            "expires_in": expires_in,
            "scope": "user-read-playback-state user-modify-playback-state",
        }),
        None => json!({
            "access_token": access,
            "token_type": "Bearer",
            "expires_in": expires_in,
        }),
    }
}

/// Stand-in for Spotify's token endpoint. Replies with the queued
/// responses in order and records every form it receives.
#[derive(Clone, Default)]
pub struct TokenEndpoint {
    requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
    responses: Arc<Mutex<VecDeque<(StatusCode, Value)>>>,
}

impl TokenEndpoint {
    pub async fn spawn(responses: Vec<(StatusCode, Value)>) -> (Self, String) {
        let endpoint = Self {
            requests: Arc::default(),
            responses: Arc::new(Mutex::new(responses.into())),
        };

        let app = Router::new()
            .route("/api/token", post(token_handler))
            .with_state(endpoint.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        (endpoint, format!("http://{addr}/api/token"))
    }

    pub fn requests(&self) -> Vec<HashMap<String, String>> {
        self.requests.lock().unwrap().clone()
    }
}

async fn token_handler(
    State(endpoint): State<TokenEndpoint>,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    endpoint.requests.lock().unwrap().push(form);
    let next = endpoint.responses.lock().unwrap().pop_front();
    match next {
        Some((status, body)) => (status, Json(body)),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "unexpected request" })),
        ),
    }
}

/// Plays the user's browser: records the consent URL and immediately
/// follows the redirect with the configured query string.
#[derive(Clone)]
pub struct ScriptedBrowser {
    opened: Arc<Mutex<Vec<String>>>,
    callback_query: String,
}

impl ScriptedBrowser {
    pub fn redirecting_with(callback_query: &str) -> Self {
        Self {
            opened: Arc::default(),
            callback_query: callback_query.to_string(),
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl BrowserLauncher for ScriptedBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        self.opened.lock().unwrap().push(url.to_string());

        let parsed = Url::parse(url).map_err(io::Error::other)?;
        let redirect = parsed
            .query_pairs()
            .find(|(k, _)| k == "redirect_uri")
            .map(|(_, v)| v.into_owned())
            .ok_or_else(|| io::Error::other("no redirect_uri"))?;

        let target = format!("{redirect}?{}", self.callback_query);
        tokio::spawn(async move {
            let _ = reqwest::get(target).await;
        });
        Ok(())
    }
}

pub fn query_param(url: &str, name: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}
