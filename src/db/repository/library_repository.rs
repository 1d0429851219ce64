use crate::db::DatabaseConnection;
use crate::db::entities::{
    EpisodeActiveModel, EpisodeEntity, TvShowActiveModel, TvShowEntity, art_json, episodes,
};
use crate::models::{Episode, Item, TvShow, split_file};
use crate::services::library::{LibraryGateway, NextEpisodeOptions, WatchStateUpdate};
use crate::utils::UpNextError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, NotSet, Order, QueryFilter, QueryOrder,
    Set,
};
use tokio::sync::RwLock;
use tracing::{debug, trace};

/// In-process mirror of the host's video playlist
#[derive(Debug, Default)]
struct Playlist {
    items: Vec<Item>,
    /// 0-based index of the playing entry
    current: Option<usize>,
}

/// sea-orm backed library plus the video playlist
#[derive(Debug)]
pub struct LibraryRepositoryImpl {
    db: DatabaseConnection,
    playlist: RwLock<Playlist>,
}

impl LibraryRepositoryImpl {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            playlist: RwLock::new(Playlist::default()),
        }
    }

    pub async fn add_show(&self, show: &TvShow) -> Result<i32> {
        let active = TvShowActiveModel {
            id: NotSet,
            title: Set(show.title.clone()),
            year: Set(show.year),
            premiered: Set(show.premiered.clone()),
            plot: Set(show.plot.clone()),
            art: Set(art_json(&show.art)),
        };
        let model = active
            .insert(self.db.as_ref())
            .await
            .context("Failed to insert show")?;
        Ok(model.id)
    }

    /// Insert an episode under `tvshow_id`. Season/episode that are not
    /// numeric are stored as NULL.
    pub async fn add_episode(&self, tvshow_id: i32, episode: &Episode) -> Result<i32> {
        let (path, filename) = split_file(&episode.file);
        let active = EpisodeActiveModel {
            id: NotSet,
            tvshow_id: Set(tvshow_id),
            title: Set(episode.title.clone()),
            season: Set(episode.season_number()),
            episode: Set(episode.episode_number()),
            file: Set(episode.file.clone()),
            path: Set(path),
            filename: Set(filename),
            playcount: Set(episode.playcount as i32),
            resume_position_ms: Set(episode.resume.position.as_millis() as i64),
            resume_total_ms: Set(episode.resume.total.as_millis() as i64),
            runtime_secs: Set(episode.runtime.as_secs() as i64),
            first_aired: Set(episode.first_aired.clone()),
            plot: Set(episode.plot.clone()),
            rating: Set(episode.rating),
            art: Set(art_json(&episode.art)),
            credits_start_ms: Set(episode.credits_start.map(|c| c.as_millis() as i64)),
        };
        let model = active
            .insert(self.db.as_ref())
            .await
            .context("Failed to insert episode")?;
        Ok(model.id)
    }

    pub async fn add_to_playlist(&self, item: Item) {
        self.playlist.write().await.items.push(item);
    }

    /// Mark which 0-based entry is playing; `None` when the playlist is inactive
    pub async fn set_playlist_position(&self, current: Option<usize>) {
        let mut playlist = self.playlist.write().await;
        playlist.current = current.filter(|c| *c < playlist.items.len());
    }

    pub async fn playlist_items(&self) -> Vec<Item> {
        self.playlist.read().await.items.clone()
    }
}

#[async_trait]
impl LibraryGateway for LibraryRepositoryImpl {
    async fn get_episode(&self, id: i32) -> Result<Option<Episode>> {
        let result = EpisodeEntity::find_by_id(id)
            .find_also_related(TvShowEntity)
            .one(self.db.as_ref())
            .await?;

        Ok(result.map(|(episode, show)| episode.into_episode(show.as_ref())))
    }

    async fn get_show(&self, id: i32) -> Result<Option<TvShow>> {
        Ok(TvShowEntity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(TvShow::from))
    }

    async fn find_next_episode(
        &self,
        current: &Episode,
        options: &NextEpisodeOptions,
    ) -> Result<Option<Episode>> {
        let Some(tvshow_id) = current.tvshow_id else {
            debug!("Current episode has no show id, cannot look up next episode");
            return Ok(None);
        };

        let (path, filename) = split_file(&current.file);

        // Both filename and path must differ to cope with layouts like
        // "Season 1/Episode 1.mkv", "Episode 1/video.mkv" and "Episode 1-2-3.mkv"
        let mut condition = Condition::all()
            .add(episodes::Column::TvshowId.eq(tvshow_id))
            .add(
                Condition::any()
                    .add(episodes::Column::Filename.ne(filename))
                    .add(episodes::Column::Path.ne(path)),
            );

        if options.unwatched_only {
            condition = condition.add(episodes::Column::Playcount.lt(1));
        }

        let mut query = EpisodeEntity::find();

        if options.random {
            query = query
                .filter(condition)
                .order_by(Expr::cust("RANDOM()"), Order::Asc);
        } else {
            let (Some(season), Some(episode)) = (current.season_number(), current.episode_number())
            else {
                return Ok(None);
            };

            let in_season = Condition::all()
                .add(episodes::Column::Season.eq(season))
                .add(episodes::Column::Episode.gt(episode));

            let episode_filter = if options.next_season {
                Condition::any()
                    .add(in_season)
                    .add(episodes::Column::Season.gt(season))
            } else {
                in_season
            };

            query = query
                .filter(condition.add(episode_filter))
                .order_by_asc(episodes::Column::Season)
                .order_by_asc(episodes::Column::Episode);
        }

        let next = query.one(self.db.as_ref()).await?;
        trace!("Next episode query result: {:?}", next.as_ref().map(|e| e.id));

        Ok(next.map(|model| model.into_episode(None)))
    }

    async fn set_episode_watch_state(&self, id: i32, update: WatchStateUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }

        let mut query = EpisodeEntity::update_many().filter(episodes::Column::Id.eq(id));

        if let Some(playcount) = update.playcount {
            query = query.col_expr(episodes::Column::Playcount, Expr::value(playcount as i32));
        }
        if let Some(resume) = update.resume {
            query = query.col_expr(
                episodes::Column::ResumePositionMs,
                Expr::value(resume.as_millis() as i64),
            );
        }

        let result = query.exec(self.db.as_ref()).await?;
        if result.rows_affected == 0 {
            return Err(UpNextError::not_found(format!("episode {id}")).into());
        }
        Ok(())
    }

    async fn get_playlist_position(&self) -> Result<Option<usize>> {
        let playlist = self.playlist.read().await;
        let Some(current) = playlist.current else {
            return Ok(None);
        };

        // A playlist with only one element has no next item
        if playlist.items.len() > 1 && current + 1 < playlist.items.len() {
            Ok(Some(current + 1))
        } else {
            Ok(None)
        }
    }

    async fn get_playlist_item(&self, position: usize) -> Result<Option<Item>> {
        let item = self.playlist.read().await.items.get(position).cloned();
        if item.is_none() {
            debug!("No item at playlist position {}", position);
        }
        Ok(item)
    }

    async fn queue_item(&self, item: &Item) -> Result<Option<usize>> {
        if item.file().is_empty() {
            debug!("Nothing added to queue, item has no file");
            return Ok(None);
        }

        let mut playlist = self.playlist.write().await;
        if playlist.items.iter().any(|queued| queued.file() == item.file()) {
            debug!("Already queued: {}", item.file());
            return Ok(None);
        }

        debug!("Adding to queue: {}", item.file());
        playlist.items.push(item.clone());
        Ok(Some(playlist.items.len() - 1))
    }

    async fn dequeue_item(&self, position: usize) -> Result<()> {
        let mut playlist = self.playlist.write().await;
        if position >= playlist.items.len() {
            return Ok(());
        }

        debug!("Removing playlist entry at position {}", position);
        playlist.items.remove(position);
        playlist.current = match playlist.current {
            Some(current) if current > position => Some(current - 1),
            Some(current) if current == position => None,
            other => other,
        };
        Ok(())
    }
}
