//! # Spotify Integration Module
//!
//! Talks to Spotify's accounts service and Web API.
//!
//! ## Modules
//!
//! - [`auth`] - [`auth::Authorizer`], the OAuth 2.0 Authorization Code flow
//!   with PKCE:
//!   1. **Code Verifier Generation**: 40 random bytes, URL-safe base64
//!   2. **Challenge Creation**: SHA-256 of the verifier, URL-safe base64
//!   3. **Authorization Request**: opens the consent page in the browser
//!   4. **Local Callback**: one-shot server captures the authorization code
//!   5. **Token Exchange**: code + verifier are traded for tokens
//!   6. **Token Storage**: tokens and absolute expiry go to the credential
//!      store in one write
//!
//!   Expired tokens are renewed with the stored refresh token; when that is
//!   missing the interactive flow runs again.
//!
//! - [`player`] - [`player::SpotifyClient`], a small Web API client for the
//!   "currently playing" endpoint. It implements
//!   [`PlaybackSource`](crate::management::PlaybackSource) so it can feed a
//!   [`PlaybackMonitor`](crate::management::PlaybackMonitor).
//!
//! ## Token Lifetime
//!
//! The authorizer and the API client never call each other. A host obtains
//! a token from the authorizer, builds a client from it, and re-authorizes
//! the client itself when the token runs out mid-session.

pub mod auth;
pub mod player;
