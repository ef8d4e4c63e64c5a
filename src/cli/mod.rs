//! # CLI Module
//!
//! User-facing commands of the `termify` binary. Each command builds its
//! own [`AuthConfig`](crate::config::AuthConfig)-driven authorizer, reports
//! progress through the `info!`/`success!`/`warning!` macros, and exits
//! through `error!` on failure.
//!
//! - [`auth`] - Authorize with Spotify or reuse valid stored credentials
//! - [`status`] - Show the stored token state without network access
//! - [`now_playing`] - Poll and print the currently playing track
//!
//! ## Usage
//!
//! ```bash
//! termify auth                         # Authorize (browser opens if needed)
//! termify status                       # Check stored token expiry
//! termify now-playing --interval-ms 500
//! ```

mod auth;
mod now_playing;
mod status;

pub use auth::auth;
pub use now_playing::{now_playing, watch_playback};
pub use status::status;
