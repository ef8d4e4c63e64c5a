use crate::{
    config::AuthConfig, error, management::EnvFileStore, spotify::auth::Authorizer, success,
    utils,
};

/// Authorizes with Spotify, reusing stored credentials when they are valid.
///
/// Forces the interactive flow when `force` is set, even if a valid token
/// is already stored.
pub async fn auth(config: AuthConfig, force: bool) {
    let store = EnvFileStore::new(config.store_path.clone());
    let mut authorizer = match Authorizer::new(config, store).await {
        Ok(a) => a,
        Err(e) => error!("Authorization setup failed: {}", e),
    };

    let result = if force {
        authorizer.request_auth().await
    } else {
        authorizer.refresh_token().await
    };

    if let Err(e) = result {
        error!("Authentication failed: {}", e);
    }

    match authorizer.expires_at().await {
        Some(expires_at) => success!(
            "Authentication successful! Token valid until {}",
            utils::format_epoch(expires_at)
        ),
        None => success!("Authentication successful!"),
    }
}
