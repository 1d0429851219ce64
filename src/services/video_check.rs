//! Start confirmation: decides whether a freshly started playback is a real,
//! settled video worth tracking, then arms the tracker for it.
//!
//! A start may be superseded while it waits. Each call captures the value of
//! the `starting` counter it produced and only proceeds if the counter still
//! holds that value after the settle wait.

use crate::constants::{START_SETTLE_SECS, TICK_INTERVAL};
use crate::models::{AddonData, MediaType};
use crate::services::session::Session;
use crate::state::CurrentItem;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Another confirmation is already in flight
    Busy,
    Shutdown,
    NotPlaying,
    /// A newer start or a stop replaced this one
    Superseded,
    NotEligible,
    Tracking,
}

/// Run one start confirmation. `data` is plugin-supplied next-item data
/// delivered with this start, if any.
pub async fn track_playback(session: Session, data: Option<AddonData>) -> StartOutcome {
    let start_num = {
        let mut state = session.state.write().await;
        if state.starting != 0 && data.is_none() {
            trace!("Start confirmation already in progress");
            return StartOutcome::Busy;
        }
        state.starting += 1;
        state.starting
    };
    debug!(start_num, "Start confirmation waiting to settle");

    if !settle(&session, start_num).await {
        return StartOutcome::Shutdown;
    }

    let player = session.refresh_player().await;
    if !player.playing {
        debug!(start_num, "Start confirmation: nothing playing");
        let mut state = session.state.write().await;
        if state.starting == start_num {
            state.starting = 0;
        }
        return StartOutcome::NotPlaying;
    }

    let (was_tracking, settings) = {
        let mut state = session.state.write().await;
        if state.starting == 0 || state.starting != start_num {
            trace!(
                start_num,
                starting = state.starting,
                "Start confirmation superseded"
            );
            return StartOutcome::Superseded;
        }
        state.starting = 0;
        state.playing_next = false;
        state.ended = false;
        (state.is_tracking(), state.settings.clone())
    };

    let in_playlist = if settings.enable_playlist {
        match session.library.get_playlist_position().await {
            Ok(position) => position.is_some(),
            Err(e) => {
                warn!("Failed to read playlist position: {:#}", e);
                false
            }
        }
    } else {
        false
    };
    let episodic = player.media_type == MediaType::Episode;

    let eligible = settings.enabled && (in_playlist || data.is_some() || episodic);
    if !eligible {
        debug!(
            file = player.playing_file.as_str(),
            "Start confirmation: not an eligible video"
        );
        if was_tracking {
            session.tracker().stop().await;
            session.state.write().await.reset();
        }
        return StartOutcome::NotEligible;
    }

    let current = match &data {
        Some(addon) => addon_current(addon),
        None => session
            .player
            .now_playing()
            .await
            .map(CurrentItem::from_item)
            .unwrap_or_default(),
    };
    let cue = detection_cue(&session, data.as_ref(), &current, player.total).await;

    let pending = {
        let mut state = session.state.write().await;
        // Starting without plugin data drops data from an earlier playback
        state.addon_data = data;
        state.start_tracking(&player.playing_file);
        state.mark_played(&player.playing_file);
        let mut pending = state.reset_queue();
        pending.retain(|entry| entry.file != player.playing_file);
        state.current_item = current;
        state.set_popup_time(player.total, cue);
        pending
    };

    // Highest position first so earlier positions stay valid
    for entry in pending.iter().rev() {
        if let Err(e) = session.library.dequeue_item(entry.position).await {
            warn!("Failed to dequeue {}: {:#}", entry.file, e);
        }
    }

    info!(
        file = player.playing_file.as_str(),
        total = ?player.total,
        "Tracking enabled"
    );
    session.tracker().start(&session).await;
    StartOutcome::Tracking
}

/// Wait `START_SETTLE_SECS * start_num` in one-tick steps. Returns false if
/// shutdown was requested meanwhile.
async fn settle(session: &Session, start_num: u32) -> bool {
    let shutdown = session.shutdown_token();
    let steps = START_SETTLE_SECS * u64::from(start_num);

    for _ in 0..steps {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!(start_num, "Start confirmation aborted by shutdown");
                return false;
            }
            _ = tokio::time::sleep(TICK_INTERVAL) => {}
        }
    }
    true
}

/// Early detection point: plugin cue first, then the library credits marker
async fn detection_cue(
    session: &Session,
    data: Option<&AddonData>,
    current: &CurrentItem,
    total: Duration,
) -> Option<Duration> {
    if let Some(cue) = data.and_then(|addon| addon.cue_point(total)) {
        return Some(cue);
    }

    let episode_id = current.episode_id?;
    match session.library.get_episode(episode_id).await {
        Ok(episode) => episode.and_then(|e| e.credits_start),
        Err(e) => {
            debug!("No credits marker for episode {}: {:#}", episode_id, e);
            None
        }
    }
}

/// Plugin items are not library entries, so there is no watch state to commit
fn addon_current(addon: &AddonData) -> CurrentItem {
    CurrentItem {
        item: Some(addon.current_item.clone()),
        episode_id: None,
        playcount: addon.current_item.playcount(),
    }
}
