use crate::config::MarkWatched;
use crate::models::Item;
use crate::player::{PlayTarget, PlayerSnapshot};
use crate::services::library::{NextEpisodeOptions, commit_watch_state, resolve_next_by_id};
use crate::services::session::Session;
use crate::state::TrackingState;
use crate::utils::UpNextError;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Snapshot handed to the next-item workflow when the tracker fires
#[derive(Debug, Clone)]
pub struct HandoffRequest {
    pub state: TrackingState,
    pub player: PlayerSnapshot,
}

/// Invoked once per playback when the popup time is reached. Returns whether
/// a next item was actually presented.
#[async_trait]
pub trait NextItemWorkflow: Send + Sync {
    async fn launch(&self, session: &Session, request: HandoffRequest) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupKind {
    UpNext,
    StillWatching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptResponse {
    /// User asked to start the next item now
    PlayNow,
    /// Prompt ran out and the next item follows on its own
    AutoPlay,
    Cancel,
}

#[derive(Debug, Clone)]
pub struct PromptRequest {
    pub kind: PopupKind,
    pub current: Option<Item>,
    pub next: Item,
    pub new_season: bool,
    pub remaining: Duration,
    pub auto_play: bool,
}

/// The on-screen prompt
#[async_trait]
pub trait Prompt: Send + Sync {
    async fn show(&self, request: &PromptRequest) -> PromptResponse;
}

/// Where the next item came from
#[derive(Debug, Clone, PartialEq)]
enum NextSource {
    Addon,
    Playlist,
    Library,
}

/// Default workflow: resolve the next item, prompt, then play or queue it
/// and commit the finished item's watch state
pub struct UpNextHandoff {
    prompt: Arc<dyn Prompt>,
}

impl UpNextHandoff {
    pub fn new(prompt: Arc<dyn Prompt>) -> Self {
        Self { prompt }
    }

    async fn resolve(
        &self,
        session: &Session,
        state: &TrackingState,
    ) -> Result<Option<(Item, NextSource, bool)>> {
        if let Some(addon) = &state.addon_data {
            debug!("Next item from plugin data {}", addon.id);
            return Ok(Some((addon.next_item.clone(), NextSource::Addon, false)));
        }

        if state.settings.enable_playlist
            && let Some(position) = session.library.get_playlist_position().await?
            && let Some(item) = session.library.get_playlist_item(position).await?
        {
            debug!("Next item from playlist position {}", position);
            return Ok(Some((item, NextSource::Playlist, false)));
        }

        let Some(episode_id) = state.current_item.episode_id else {
            debug!("Playing item is not a library episode");
            return Ok(None);
        };

        let options = NextEpisodeOptions::from(&state.settings);
        let (next, new_season) =
            resolve_next_by_id(session.library.as_ref(), episode_id, &options).await?;
        Ok(next.map(|episode| (Item::Episode(episode), NextSource::Library, new_season)))
    }

    async fn play(
        &self,
        session: &Session,
        state: &TrackingState,
        next: &Item,
        source: &NextSource,
        response: PromptResponse,
    ) -> Result<()> {
        let target = match source {
            NextSource::Playlist => PlayTarget::PlaylistNext,
            NextSource::Addon => {
                let addon = state.addon_data.as_ref();
                match (
                    addon.and_then(|a| a.play_info.clone()),
                    addon.and_then(|a| a.play_url.clone()),
                ) {
                    (Some(play_info), _) => PlayTarget::AddonCallback {
                        id: addon.map(|a| a.id.clone()).unwrap_or_default(),
                        play_info,
                        encoding: addon.map(|a| a.encoding).unwrap_or_default(),
                    },
                    (None, Some(url)) => PlayTarget::File(url),
                    (None, None) => PlayTarget::File(next.file().to_string()),
                }
            }
            NextSource::Library => match next.episode_id() {
                Some(id) => PlayTarget::Episode(id),
                None => PlayTarget::File(next.file().to_string()),
            },
        };

        if response == PromptResponse::AutoPlay {
            // The host advances its own playlist when the current item ends
            if target == PlayTarget::PlaylistNext {
                return Ok(());
            }

            let file = match &target {
                PlayTarget::File(file) => file.clone(),
                _ => next.file().to_string(),
            };
            if !file.is_empty() && !matches!(target, PlayTarget::AddonCallback { .. }) {
                let mut queued = next.clone();
                queued.set_file(file.clone());
                if let Some(position) = session.library.queue_item(&queued).await? {
                    session.state.write().await.enqueue(&file, position);
                }
                return Ok(());
            }
        }

        session.player.open(target, false).await
    }

    async fn commit(&self, session: &Session, state: &TrackingState) {
        let Some(episode_id) = state.current_item.episode_id else {
            return;
        };

        let (reset_playcount, reset_resume) = match state.settings.mark_watched {
            MarkWatched::Off => return,
            MarkWatched::MirrorHost => (false, true),
            MarkWatched::AlwaysReset => (true, true),
        };

        if let Err(e) = commit_watch_state(
            session.library.as_ref(),
            episode_id,
            state.current_item.playcount,
            reset_playcount,
            reset_resume,
        )
        .await
        {
            match e.downcast_ref::<UpNextError>() {
                Some(err) if err.is_quiet() => debug!("Watch state not committed: {}", err),
                _ => warn!("Failed to commit watch state of {}: {:#}", episode_id, e),
            }
        }
    }
}

#[async_trait]
impl NextItemWorkflow for UpNextHandoff {
    async fn launch(&self, session: &Session, request: HandoffRequest) -> Result<bool> {
        let state = request.state;

        let Some((next, source, new_season)) = self.resolve(session, &state).await? else {
            info!("No next item, end of playback");
            session.state.write().await.reset();
            return Ok(false);
        };

        let kind = if state.still_watching() {
            PopupKind::StillWatching
        } else {
            PopupKind::UpNext
        };

        let prompt = PromptRequest {
            kind,
            current: state.current_item.item.clone(),
            next: next.clone(),
            new_season,
            remaining: request.player.remaining(),
            auto_play: state.settings.auto_play,
        };
        let response = self.prompt.show(&prompt).await;
        debug!(?kind, ?response, "Prompt closed");

        if response == PromptResponse::Cancel {
            info!("Next item cancelled: {}", next.title());
            return Ok(true);
        }

        {
            let mut live = session.state.write().await;
            live.playing_next = true;
            live.played_in_a_row = match response {
                PromptResponse::PlayNow => 1,
                _ => live.played_in_a_row.saturating_add(1),
            };
        }

        if let Err(e) = self.play(session, &state, &next, &source, response).await {
            warn!("Failed to start next item {}: {:#}", next.title(), e);
            session.state.write().await.playing_next = false;
            return Ok(true);
        }

        self.commit(session, &state).await;
        info!("Next item requested: {}", next.title());
        Ok(true)
    }
}
