use crate::config::Settings;
use crate::models::{Episode, Item, TvShow};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

/// Filters applied when looking for the episode after the current one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NextEpisodeOptions {
    pub unwatched_only: bool,
    pub next_season: bool,
    pub random: bool,
}

impl From<&Settings> for NextEpisodeOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            unwatched_only: settings.unwatched_only,
            next_season: settings.next_season,
            random: settings.random,
        }
    }
}

/// Fields to change on a library item. `None` leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchStateUpdate {
    pub playcount: Option<u32>,
    pub resume: Option<Duration>,
}

impl WatchStateUpdate {
    pub fn is_empty(&self) -> bool {
        self.playcount.is_none() && self.resume.is_none()
    }
}

/// Result of committing the just-watched item's watch state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchCommit {
    NotFound,
    Unchanged,
    Updated(WatchStateUpdate),
}

/// Media library and video playlist as seen by the tracker. Every lookup may
/// legitimately return nothing.
#[async_trait]
pub trait LibraryGateway: Send + Sync {
    /// Episode with its show title filled in
    async fn get_episode(&self, id: i32) -> Result<Option<Episode>>;

    async fn get_show(&self, id: i32) -> Result<Option<TvShow>>;

    /// First eligible episode after `current` in the same show
    async fn find_next_episode(
        &self,
        current: &Episode,
        options: &NextEpisodeOptions,
    ) -> Result<Option<Episode>>;

    async fn set_episode_watch_state(&self, id: i32, update: WatchStateUpdate) -> Result<()>;

    /// Position of the playlist entry after the playing one, if any. This is
    /// the 1-based position of the playing entry.
    async fn get_playlist_position(&self) -> Result<Option<usize>>;

    /// Entry at a 0-based position
    async fn get_playlist_item(&self, position: usize) -> Result<Option<Item>>;

    /// Append to the video playlist, returning the 0-based position it landed
    /// at. `None` if nothing was added.
    async fn queue_item(&self, item: &Item) -> Result<Option<usize>>;

    /// Remove the playlist entry at a 0-based position
    async fn dequeue_item(&self, position: usize) -> Result<()>;
}

/// Resolve the episode that follows `current`. The flag reports whether the
/// result lies in a later season. `None` means end of series, not an error.
pub async fn resolve_next(
    library: &dyn LibraryGateway,
    current: &Episode,
    options: &NextEpisodeOptions,
) -> Result<(Option<Episode>, bool)> {
    if !options.random && (current.season_number().is_none() || current.episode_number().is_none())
    {
        debug!(
            "Current item has no season/episode numbering, cannot order next episode: {:?}",
            current.title
        );
        return Ok((None, false));
    }

    let Some(mut next) = library.find_next_episode(current, options).await? else {
        debug!("No next episode found in library");
        return Ok((None, false));
    };

    if next.show_title.is_empty() {
        next.show_title = current.show_title.clone();
    }
    if next.tvshow_id.is_none() {
        next.tvshow_id = current.tvshow_id;
    }

    let new_season = !options.random && next.season != current.season;
    debug!(
        "Next episode from library: {} {} (new season: {})",
        next.show_title,
        next.season_episode_label(),
        new_season
    );
    Ok((Some(next), new_season))
}

/// Resolve the next episode for a library id
pub async fn resolve_next_by_id(
    library: &dyn LibraryGateway,
    episode_id: i32,
    options: &NextEpisodeOptions,
) -> Result<(Option<Episode>, bool)> {
    match library.get_episode(episode_id).await? {
        Some(current) => resolve_next(library, &current, options).await,
        None => {
            debug!("Current episode {} not in library, no next episode", episode_id);
            Ok((None, false))
        }
    }
}

/// Update play count and resume point of a just-watched episode.
///
/// The host may already have bumped the play count itself, so the count is
/// only bumped when it still equals `previous_playcount`. With
/// `reset_playcount` the count goes back to zero instead. A stored resume
/// point is cleared when `reset_resume` is set. At most one write, and none
/// if nothing changes.
pub async fn commit_watch_state(
    library: &dyn LibraryGateway,
    episode_id: i32,
    previous_playcount: u32,
    reset_playcount: bool,
    reset_resume: bool,
) -> Result<WatchCommit> {
    let Some(current) = library.get_episode(episode_id).await? else {
        debug!("Library update: id - {} not found", episode_id);
        return Ok(WatchCommit::NotFound);
    };

    let mut update = WatchStateUpdate::default();

    if reset_playcount {
        if current.playcount != 0 {
            update.playcount = Some(0);
        }
    } else if current.playcount == previous_playcount {
        update.playcount = Some(previous_playcount.saturating_add(1));
    }

    if current.resume.is_set() && reset_resume {
        update.resume = Some(Duration::ZERO);
    }

    if update.is_empty() {
        debug!("Library update: id - {}, no change", episode_id);
        return Ok(WatchCommit::Unchanged);
    }

    library
        .set_episode_watch_state(episode_id, update.clone())
        .await?;

    info!(
        "Library update: id - {}, playcount - {} to {:?}, resume - {:?} to {:?}",
        episode_id,
        current.playcount,
        update.playcount,
        current.resume.position,
        update.resume
    );
    Ok(WatchCommit::Updated(update))
}
