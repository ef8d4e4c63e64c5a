mod common;

use axum::http::StatusCode;
use common::{ScriptedBrowser, TokenEndpoint, query_param, test_config, token_body};
use termify::{
    config::{ACCESS_TOKEN_KEY, CLIENT_ID_KEY, REFRESH_TOKEN_KEY, TOKEN_EXPIRATION_KEY},
    error::AuthError,
    management::{CredentialStore, EnvFileStore, MemoryStore},
    spotify::auth::Authorizer,
    types::TokenResponse,
    utils::{generate_code_challenge, now_epoch},
};

fn store_with(entries: &[(&str, String)]) -> MemoryStore {
    let mut values = vec![(CLIENT_ID_KEY.to_string(), "client-123".to_string())];
    values.extend(entries.iter().map(|(k, v)| (k.to_string(), v.clone())));
    MemoryStore::with_values(values)
}

#[tokio::test]
async fn test_missing_client_id_is_configuration_error() {
    let config = test_config("http://127.0.0.1:9/api/token");
    let result = Authorizer::new(config, MemoryStore::new()).await;

    match result {
        Err(AuthError::Configuration { key, .. }) => assert_eq!(key, CLIENT_ID_KEY),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("authorizer created without a client id"),
    }
}

#[tokio::test]
async fn test_interactive_flow_stores_tokens() {
    let (endpoint, token_url) =
        TokenEndpoint::spawn(vec![(StatusCode::OK, token_body("AT1", Some("RT1"), 3600))]).await;
    let config = test_config(&token_url);
    let redirect_uri = config.redirect_uri.clone();

    let store = EnvFileStore::new(config.store_path.clone());
    store.set(CLIENT_ID_KEY, "client-123").await.unwrap();

    let browser = ScriptedBrowser::redirecting_with("code=xyz");
    let mut authorizer = Authorizer::new(config, store)
        .await
        .unwrap()
        .with_browser(browser.clone());

    let before = now_epoch();
    authorizer.refresh_token().await.unwrap();
    let after = now_epoch();

    assert_eq!(authorizer.get_token().await.unwrap().as_deref(), Some("AT1"));
    assert_eq!(authorizer.token(), Some("AT1"));

    let store = authorizer.store();
    assert_eq!(
        store.get(REFRESH_TOKEN_KEY).await.unwrap().as_deref(),
        Some("RT1")
    );
    let expires_at: i64 = store
        .get(TOKEN_EXPIRATION_KEY)
        .await
        .unwrap()
        .unwrap()
        .parse()
        .unwrap();
    assert!(expires_at >= before + 3600 && expires_at <= after + 3600);

    // Consent URL carries everything Spotify needs
    let opened = browser.opened();
    assert_eq!(opened.len(), 1);
    let url = &opened[0];
    assert!(url.starts_with("https://accounts.spotify.com/authorize?"));
    assert_eq!(query_param(url, "client_id").as_deref(), Some("client-123"));
    assert_eq!(query_param(url, "response_type").as_deref(), Some("code"));
    assert_eq!(query_param(url, "redirect_uri"), Some(redirect_uri.clone()));
    assert_eq!(
        query_param(url, "code_challenge_method").as_deref(),
        Some("S256")
    );
    assert_eq!(
        query_param(url, "scope").as_deref(),
        Some("user-read-playback-state user-modify-playback-state")
    );

    // The verifier sent to the token endpoint matches the challenge in the URL
    let requests = endpoint.requests();
    assert_eq!(requests.len(), 1);
    let form = &requests[0];
    assert_eq!(form["grant_type"], "authorization_code");
    assert_eq!(form["code"], "xyz");
    assert_eq!(form["client_id"], "client-123");
    assert_eq!(form["redirect_uri"], redirect_uri);
    assert_eq!(
        query_param(url, "code_challenge"),
        Some(generate_code_challenge(&form["code_verifier"]))
    );
}

#[tokio::test]
async fn test_valid_token_is_left_alone() {
    let (endpoint, token_url) = TokenEndpoint::spawn(vec![]).await;
    let store = store_with(&[
        (ACCESS_TOKEN_KEY, "AT0".to_string()),
        (REFRESH_TOKEN_KEY, "RT0".to_string()),
        (TOKEN_EXPIRATION_KEY, (now_epoch() + 3600).to_string()),
    ]);
    let browser = ScriptedBrowser::redirecting_with("code=unused");
    let mut authorizer = Authorizer::new(test_config(&token_url), store)
        .await
        .unwrap()
        .with_browser(browser.clone());

    let initial = authorizer.store().snapshot().await;
    authorizer.refresh_token().await.unwrap();
    authorizer.refresh_token().await.unwrap();

    assert_eq!(authorizer.token(), Some("AT0"));
    assert!(endpoint.requests().is_empty());
    assert!(browser.opened().is_empty());
    assert_eq!(authorizer.store().snapshot().await, initial);
}

#[tokio::test]
async fn test_expired_token_uses_refresh_grant_only() {
    let (endpoint, token_url) =
        TokenEndpoint::spawn(vec![(StatusCode::OK, token_body("AT2", Some("RT2"), 3600))]).await;
    let store = store_with(&[
        (ACCESS_TOKEN_KEY, "AT1".to_string()),
        (REFRESH_TOKEN_KEY, "RT1".to_string()),
        (TOKEN_EXPIRATION_KEY, (now_epoch() - 10).to_string()),
    ]);
    let browser = ScriptedBrowser::redirecting_with("code=unused");
    let mut authorizer = Authorizer::new(test_config(&token_url), store)
        .await
        .unwrap()
        .with_browser(browser.clone());

    authorizer.refresh_token().await.unwrap();

    assert!(browser.opened().is_empty());
    assert_eq!(authorizer.token(), Some("AT2"));
    assert!(!authorizer.token_expired().await);

    let requests = endpoint.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["grant_type"], "refresh_token");
    assert_eq!(requests[0]["refresh_token"], "RT1");
    assert_eq!(requests[0]["client_id"], "client-123");

    let values = authorizer.store().snapshot().await;
    assert_eq!(values[ACCESS_TOKEN_KEY], "AT2");
    assert_eq!(values[REFRESH_TOKEN_KEY], "RT2");
}

#[tokio::test]
async fn test_refresh_without_new_refresh_token_keeps_old_one() {
    let (_endpoint, token_url) =
        TokenEndpoint::spawn(vec![(StatusCode::OK, token_body("AT2", None, 3600))]).await;
    let store = store_with(&[
        (ACCESS_TOKEN_KEY, "AT1".to_string()),
        (REFRESH_TOKEN_KEY, "RT1".to_string()),
        (TOKEN_EXPIRATION_KEY, "0".to_string()),
    ]);
    let mut authorizer = Authorizer::new(test_config(&token_url), store)
        .await
        .unwrap()
        .with_browser(ScriptedBrowser::redirecting_with("code=unused"));

    authorizer.refresh_token().await.unwrap();

    let values = authorizer.store().snapshot().await;
    assert_eq!(values[ACCESS_TOKEN_KEY], "AT2");
    assert_eq!(values[REFRESH_TOKEN_KEY], "RT1");
}

#[tokio::test]
async fn test_expired_without_refresh_token_falls_back_to_browser() {
    let (endpoint, token_url) =
        TokenEndpoint::spawn(vec![(StatusCode::OK, token_body("AT3", Some("RT3"), 3600))]).await;
    let store = store_with(&[
        (ACCESS_TOKEN_KEY, "AT1".to_string()),
        (TOKEN_EXPIRATION_KEY, (now_epoch() - 10).to_string()),
    ]);
    let browser = ScriptedBrowser::redirecting_with("code=fresh");
    let mut authorizer = Authorizer::new(test_config(&token_url), store)
        .await
        .unwrap()
        .with_browser(browser.clone());

    authorizer.refresh_token().await.unwrap();

    assert_eq!(browser.opened().len(), 1);
    assert_eq!(authorizer.token(), Some("AT3"));
    let requests = endpoint.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["grant_type"], "authorization_code");
    assert_eq!(requests[0]["code"], "fresh");
}

#[tokio::test]
async fn test_refresh_failure_surfaces_status_and_keeps_store() {
    let (_endpoint, token_url) = TokenEndpoint::spawn(vec![(
        StatusCode::BAD_REQUEST,
        serde_json::json!({ "error": "invalid_grant" }),
    )])
    .await;
    let store = store_with(&[
        (ACCESS_TOKEN_KEY, "AT1".to_string()),
        (REFRESH_TOKEN_KEY, "RT1".to_string()),
        (TOKEN_EXPIRATION_KEY, "0".to_string()),
    ]);
    let mut authorizer = Authorizer::new(test_config(&token_url), store)
        .await
        .unwrap()
        .with_browser(ScriptedBrowser::redirecting_with("code=unused"));
    let initial = authorizer.store().snapshot().await;

    let err = authorizer.refresh_token().await.unwrap_err();

    assert!(matches!(err, AuthError::TokenRefresh { status: 400 }));
    assert_eq!(authorizer.store().snapshot().await, initial);
    assert_eq!(authorizer.token(), None);
}

#[tokio::test]
async fn test_code_exchange_failure_surfaces_status() {
    let (_endpoint, token_url) = TokenEndpoint::spawn(vec![(
        StatusCode::INTERNAL_SERVER_ERROR,
        serde_json::json!({ "error": "server_error" }),
    )])
    .await;
    let mut authorizer = Authorizer::new(test_config(&token_url), store_with(&[]))
        .await
        .unwrap()
        .with_browser(ScriptedBrowser::redirecting_with("code=xyz"));

    let err = authorizer.refresh_token().await.unwrap_err();

    assert!(matches!(err, AuthError::TokenExchange { status: 500 }));
    assert_eq!(authorizer.get_token().await.unwrap(), None);
}

#[tokio::test]
async fn test_callback_without_code_ends_attempt() {
    let (endpoint, token_url) = TokenEndpoint::spawn(vec![]).await;
    let mut authorizer = Authorizer::new(test_config(&token_url), store_with(&[]))
        .await
        .unwrap()
        .with_browser(ScriptedBrowser::redirecting_with("error=access_denied"));

    let err = authorizer.refresh_token().await.unwrap_err();

    assert!(matches!(err, AuthError::AuthCallback));
    assert!(endpoint.requests().is_empty());
    assert_eq!(authorizer.get_token().await.unwrap(), None);
}

#[tokio::test]
async fn test_token_expired_fail_safe() {
    let config = test_config("http://127.0.0.1:9/api/token");
    let authorizer = Authorizer::new(config, store_with(&[])).await.unwrap();
    let store = authorizer.store();

    // missing key
    assert!(authorizer.token_expired().await);

    store.set(TOKEN_EXPIRATION_KEY, "not-a-number").await.unwrap();
    assert!(authorizer.token_expired().await);

    store.set(TOKEN_EXPIRATION_KEY, "").await.unwrap();
    assert!(authorizer.token_expired().await);

    // expiry is inclusive
    store
        .set(TOKEN_EXPIRATION_KEY, &now_epoch().to_string())
        .await
        .unwrap();
    assert!(authorizer.token_expired().await);

    store
        .set(TOKEN_EXPIRATION_KEY, &(now_epoch() + 60).to_string())
        .await
        .unwrap();
    assert!(!authorizer.token_expired().await);
}

#[tokio::test]
async fn test_save_token_writes_all_fields() {
    let config = test_config("http://127.0.0.1:9/api/token");
    let authorizer = Authorizer::new(config, store_with(&[])).await.unwrap();
    let token = TokenResponse {
        access_token: "A".to_string(),
        refresh_token: Some("R".to_string()),
        expires_in: 3600,
        scope: None,
        token_type: None,
    };

    let before = now_epoch();
    authorizer.save_token(&token).await.unwrap();
    let after = now_epoch();

    let values = authorizer.store().snapshot().await;
    assert_eq!(values[ACCESS_TOKEN_KEY], "A");
    assert_eq!(values[REFRESH_TOKEN_KEY], "R");
    let expires_at: i64 = values[TOKEN_EXPIRATION_KEY].parse().unwrap();
    assert!(expires_at >= before + 3600 && expires_at <= after + 3600);
}

#[tokio::test]
async fn test_save_token_rejects_unrepresentable_lifetime() {
    let config = test_config("http://127.0.0.1:9/api/token");
    let store = store_with(&[
        (ACCESS_TOKEN_KEY, "old".to_string()),
        (TOKEN_EXPIRATION_KEY, "123".to_string()),
    ]);
    let authorizer = Authorizer::new(config, store).await.unwrap();

    for expires_in in [u64::MAX, i64::MAX as u64] {
        let token = TokenResponse {
            access_token: "A".to_string(),
            refresh_token: Some("R".to_string()),
            expires_in,
            scope: None,
            token_type: None,
        };

        let err = authorizer.save_token(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidExpiry(secs) if secs == expires_in));
    }

    let values = authorizer.store().snapshot().await;
    assert_eq!(values[ACCESS_TOKEN_KEY], "old");
    assert_eq!(values[TOKEN_EXPIRATION_KEY], "123");
    assert!(!values.contains_key(REFRESH_TOKEN_KEY));
}
