use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::{
    Res, config, error::PlaybackError, management::PlaybackSource, types::CurrentlyPlaying,
};

/// Minimal Web API client for the player endpoints.
pub struct SpotifyClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl SpotifyClient {
    /// Client for `https://api.spotify.com/v1` using `access_token` as bearer.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(config::SPOTIFY_API_URL, access_token)
    }

    /// Client against another API root, e.g. a local stand-in.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root; a trailing slash is ignored
    /// * `access_token` - Bearer token sent with every request
    pub fn with_base_url(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    /// Fetches the user's currently playing item.
    ///
    /// Returns `None` when Spotify answers `204 No Content`, i.e. nothing is
    /// playing on any device.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::Status`] for any other status, e.g. `401` once the
    ///   token has expired
    /// - [`PlaybackError::Http`] for transport or decoding failures
    pub async fn get_current_song(&self) -> Result<Option<CurrentlyPlaying>, PlaybackError> {
        let res = self
            .http
            .get(format!("{}/me/player/currently-playing", self.base_url))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        match res.status() {
            StatusCode::NO_CONTENT => Ok(None),
            StatusCode::OK => Ok(Some(res.json::<CurrentlyPlaying>().await?)),
            other => Err(PlaybackError::Status(other.as_u16())),
        }
    }
}

#[async_trait]
impl PlaybackSource for SpotifyClient {
    type Snapshot = Option<CurrentlyPlaying>;

    async fn current_song(&self) -> Res<Self::Snapshot> {
        Ok(self.get_current_song().await?)
    }
}
