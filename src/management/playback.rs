use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::Res;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Anything that can report what is currently playing.
#[async_trait]
pub trait PlaybackSource: Send + Sync + 'static {
    /// Snapshot type handed to readers. `Default` is what readers see
    /// before the first successful fetch.
    type Snapshot: Clone + Default + Send + Sync + 'static;

    /// Fetches a fresh snapshot.
    async fn current_song(&self) -> Res<Self::Snapshot>;
}

/// Keeps the latest "now playing" snapshot fresh in a background task.
///
/// One writer (the polling task, or a direct [`fetch_current_song`] call)
/// and any number of readers share a single mutex, so a reader observes
/// either the previous snapshot or the new one, never a mix.
///
/// [`fetch_current_song`]: PlaybackMonitor::fetch_current_song
pub struct PlaybackMonitor<P: PlaybackSource> {
    source: Arc<P>,
    current: Arc<Mutex<P::Snapshot>>,
    interval: Duration,
}

impl<P: PlaybackSource> Clone for PlaybackMonitor<P> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            current: Arc::clone(&self.current),
            interval: self.interval,
        }
    }
}

impl<P: PlaybackSource> PlaybackMonitor<P> {
    /// Wraps `source` with an empty snapshot and the default 200ms interval.
    ///
    /// Nothing is fetched until [`start`](Self::start) or
    /// [`fetch_current_song`](Self::fetch_current_song) is called.
    ///
    /// # Example
    ///
    /// ```
    /// let monitor = PlaybackMonitor::new(SpotifyClient::new(token))
    ///     .with_interval(Duration::from_millis(500));
    /// let handle = monitor.start();
    /// ```
    pub fn new(source: P) -> Self {
        Self {
            source: Arc::new(source),
            current: Arc::new(Mutex::new(P::Snapshot::default())),
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets the delay between two polls.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawns the polling loop and returns without waiting for a fetch.
    ///
    /// Failed fetches are logged and the loop keeps going with the previous
    /// snapshot.
    ///
    /// The loop has no exit condition; it ends with the runtime or when the
    /// returned handle is aborted.
    pub fn start(&self) -> JoinHandle<()> {
        self.start_with_cancellation(CancellationToken::new())
    }

    /// Like [`start`](Self::start), but the loop returns once `cancel` fires.
    pub fn start_with_cancellation(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(async move { monitor.run(cancel).await })
    }

    /// Returns a copy of the latest snapshot.
    pub async fn get_current_song(&self) -> P::Snapshot {
        self.current.lock().await.clone()
    }

    /// Fetches from the source and stores the result as the new snapshot.
    ///
    /// The lock is held for the whole fetch so concurrent readers wait for
    /// the new value instead of racing it. On failure the previous snapshot
    /// is kept.
    pub async fn fetch_current_song(&self) -> Res<P::Snapshot> {
        let mut current = self.current.lock().await;
        let snapshot = self.source.current_song().await?;
        *current = snapshot.clone();
        Ok(snapshot)
    }

    async fn run(&self, cancel: CancellationToken) {
        tracing::debug!(interval = ?self.interval, "playback polling started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.fetch_current_song() => {
                    if let Err(e) = result {
                        tracing::warn!("playback fetch failed: {}", e);
                    }
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::debug!("playback polling stopped");
    }
}
