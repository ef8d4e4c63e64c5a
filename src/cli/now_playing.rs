use std::{future::Future, time::Duration};

use tokio_util::sync::CancellationToken;

use crate::{
    config::AuthConfig,
    error, info,
    management::{EnvFileStore, PlaybackMonitor, PlaybackSource},
    spotify::{auth::Authorizer, player::SpotifyClient},
    types::CurrentlyPlaying,
    utils,
};

/// Prints the currently playing track whenever it changes, until Ctrl-C.
///
/// With `once` set, fetches a single snapshot and exits.
pub async fn now_playing(config: AuthConfig, interval: Duration, once: bool) {
    let store = EnvFileStore::new(config.store_path.clone());
    let mut authorizer = match Authorizer::new(config, store).await {
        Ok(a) => a,
        Err(e) => error!("Authorization setup failed: {}", e),
    };
    if let Err(e) = authorizer.refresh_token().await {
        error!("Authentication failed: {}", e);
    }
    let Some(token) = authorizer.token() else {
        error!("No access token available after authorization");
    };

    let monitor = PlaybackMonitor::new(SpotifyClient::new(token)).with_interval(interval);

    if once {
        match monitor.fetch_current_song().await {
            Ok(song) => print_song(&song),
            Err(e) => error!("Failed to fetch current song: {}", e),
        }
        return;
    }

    let cancel = CancellationToken::new();
    let handle = monitor.start_with_cancellation(cancel.clone());
    info!("Watching playback every {:?}, press Ctrl-C to stop", interval);

    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    watch_playback(&monitor, interval, ctrl_c, print_song).await;

    cancel.cancel();
    let _ = handle.await;
}

/// Reads the monitor's snapshot every `interval` and hands each changed
/// value to `on_change` until `shutdown` completes.
///
/// The snapshot starts out as `Default`, so nothing is reported until the
/// first value that differs from it. The poll loop itself is not started
/// here; pair this with [`PlaybackMonitor::start_with_cancellation`].
///
/// # Arguments
///
/// * `monitor` - Monitor whose snapshot is read
/// * `interval` - Delay between two reads
/// * `shutdown` - Future that ends the watch when it resolves
/// * `on_change` - Called with every snapshot that differs from the last one
///
/// # Returns
///
/// Number of changes reported.
pub async fn watch_playback<P, F>(
    monitor: &PlaybackMonitor<P>,
    interval: Duration,
    shutdown: impl Future<Output = ()>,
    mut on_change: F,
) -> usize
where
    P: PlaybackSource,
    P::Snapshot: PartialEq,
    F: FnMut(&P::Snapshot),
{
    // polled across iterations, so a signal during a tick is not lost
    tokio::pin!(shutdown);

    let mut last = P::Snapshot::default();
    let mut changes = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(interval) => {
                let song = monitor.get_current_song().await;
                if song != last {
                    on_change(&song);
                    last = song;
                    changes += 1;
                }
            }
        }
    }
    changes
}

fn print_song(song: &Option<CurrentlyPlaying>) {
    match song.as_ref().and_then(|s| s.item.as_ref().map(|t| (s, t))) {
        Some((state, track)) => {
            let marker = if state.is_playing { ">" } else { "||" };
            let progress = state.progress_ms.map(utils::format_duration_ms);
            info!(
                "{} {} - {} ({}) [{}/{}]",
                marker,
                track.artist_names(),
                track.name,
                track.album.name,
                progress.as_deref().unwrap_or("-"),
                utils::format_duration_ms(track.duration_ms)
            );
        }
        None => info!("Nothing playing"),
    }
}
