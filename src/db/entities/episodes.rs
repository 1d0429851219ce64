use crate::models::{Episode, Resume};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "episodes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub tvshow_id: i32,
    pub title: String,
    pub season: Option<i32>,
    pub episode: Option<i32>,
    pub file: String,
    /// Directory part of `file`, with trailing separator
    pub path: String,
    pub filename: String,
    pub playcount: i32,
    pub resume_position_ms: i64,
    pub resume_total_ms: i64,
    pub runtime_secs: i64,
    pub first_aired: String,
    pub plot: String,
    pub rating: f32,
    #[sea_orm(column_type = "Json")]
    pub art: Option<Json>,
    pub credits_start_ms: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tvshows::Entity",
        from = "Column::TvshowId",
        to = "super::tvshows::Column::Id",
        on_delete = "Cascade"
    )]
    TvShow,
}

impl Related<super::tvshows::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TvShow.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Normalize into the canonical episode record. Show title comes from the
    /// parent show when it was loaded alongside.
    pub fn into_episode(self, show: Option<&super::tvshows::Model>) -> Episode {
        Episode {
            id: Some(self.id),
            tvshow_id: Some(self.tvshow_id),
            show_title: show.map(|s| s.title.clone()).unwrap_or_default(),
            title: self.title,
            season: self.season.map(|s| s.to_string()).unwrap_or_default(),
            episode: self.episode.map(|e| e.to_string()).unwrap_or_default(),
            file: self.file,
            resume: Resume {
                position: millis(self.resume_position_ms),
                total: millis(self.resume_total_ms),
            },
            runtime: Duration::from_secs(self.runtime_secs.max(0) as u64),
            art: super::art_map(self.art.as_ref()),
            playcount: self.playcount.max(0) as u32,
            first_aired: self.first_aired,
            plot: self.plot,
            rating: self.rating,
            credits_start: self.credits_start_ms.map(millis),
        }
    }
}

fn millis(ms: i64) -> Duration {
    Duration::from_millis(ms.max(0) as u64)
}
