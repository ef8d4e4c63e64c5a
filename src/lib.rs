//! Termify Spotify Library
//!
//! This library authorizes a terminal client against the Spotify Web API using
//! the OAuth 2.0 Authorization Code flow with PKCE, keeps the resulting
//! credentials fresh in a dotenv-style credential file, and polls the
//! "currently playing" endpoint in the background so other parts of an
//! application can read the latest playback state at any time.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the local callback server
//! - `cli` - Command-line interface implementations
//! - `config` - Authorization settings and credential file location
//! - `error` - Typed errors for authorization, storage and playback
//! - `management` - Credential storage and the playback monitor
//! - `server` - One-shot local HTTP server for OAuth callbacks
//! - `spotify` - Authorizer and Web API client
//! - `types` - Data structures and type definitions
//! - `utils` - PKCE and time helpers
//!
//! # Example
//!
//! ```
//! use termify::{config::AuthConfig, management::EnvFileStore, spotify::auth::Authorizer};
//!
//! #[tokio::main]
//! async fn main() -> termify::Res<()> {
//!     let config = AuthConfig::from_env();
//!     let store = EnvFileStore::new(config.store_path.clone());
//!     let mut authorizer = Authorizer::new(config, store).await?;
//!     authorizer.refresh_token().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// Boxed-error result used at the application edges.
///
/// Library operations with a closed set of failures return the typed errors
/// from [`error`]; this alias covers the binary and the [`management::PlaybackSource`]
/// seam, where the concrete error comes from the host's API client.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational line prefixed with a blue `o`.
///
/// ```
/// info!("Waiting for authorization callback on {}", addr);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success line prefixed with a green checkmark.
///
/// ```
/// success!("Token valid until {}", expiry);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a red error line and exits the process with status 1.
///
/// Only the binary uses this; library code returns errors instead.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning line prefixed with a yellow `!`.
///
/// ```
/// warning!("Failed to open browser, please visit {}", url);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
