mod playback;
mod store;

pub use playback::DEFAULT_POLL_INTERVAL;
pub use playback::PlaybackMonitor;
pub use playback::PlaybackSource;
pub use store::CredentialStore;
pub use store::EnvFileStore;
pub use store::MemoryStore;
