//! # API Module
//!
//! HTTP handlers mounted by the one-shot callback server in
//! [`crate::server`].
//!
//! - [`callback`] - Receives Spotify's redirect after the user grants
//!   consent and hands the `code` query parameter to the waiting
//!   authorizer. Answers `200` with a plain-text confirmation when the code
//!   is present and `400` otherwise.

mod callback;

pub use callback::CallbackSlot;
pub use callback::FAILURE_BODY;
pub use callback::SUCCESS_BODY;
pub use callback::callback;
