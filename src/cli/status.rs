use crate::{
    config::AuthConfig, error, info, management::EnvFileStore, spotify::auth::Authorizer,
    success, utils, warning,
};

/// Reports the stored credential state without touching the network.
pub async fn status(config: AuthConfig) {
    info!("Credential file: {}", config.store_path.display());

    let store = EnvFileStore::new(config.store_path.clone());
    let authorizer = match Authorizer::new(config, store).await {
        Ok(a) => a,
        Err(e) => error!("{}", e),
    };

    match authorizer.get_token().await {
        Ok(Some(_)) => {}
        Ok(None) => {
            warning!("Not authorized yet. Run `termify auth` first.");
            return;
        }
        Err(e) => error!("Cannot read credential file: {}", e),
    }

    match (authorizer.expires_at().await, authorizer.token_expired().await) {
        (Some(expires_at), false) => success!(
            "Access token valid until {}",
            utils::format_epoch(expires_at)
        ),
        (Some(expires_at), true) => warning!(
            "Access token expired at {}; it will be refreshed on next use",
            utils::format_epoch(expires_at)
        ),
        (None, _) => warning!("Access token has no readable expiration; it will be refreshed on next use"),
    }
}
