use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Local, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};

/// Number of random bytes behind each code verifier.
pub const CODE_VERIFIER_BYTES: usize = 40;

/// Generates a PKCE code verifier: 40 random bytes, URL-safe base64, no padding.
pub fn generate_code_verifier() -> String {
    let mut bytes = [0u8; CODE_VERIFIER_BYTES];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Current time in whole seconds since the Unix epoch.
pub fn now_epoch() -> i64 {
    Utc::now().timestamp()
}

/// Renders an epoch-seconds value in local time, e.g. for `status` output.
pub fn format_epoch(epoch: i64) -> String {
    match DateTime::<Utc>::from_timestamp(epoch, 0) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => epoch.to_string(),
    }
}

/// Formats a millisecond duration as `m:ss`.
pub fn format_duration_ms(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}
