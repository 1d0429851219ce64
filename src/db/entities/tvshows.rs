use crate::models::TvShow;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tvshows")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub year: Option<i32>,
    pub premiered: String,
    pub plot: String,
    #[sea_orm(column_type = "Json")]
    pub art: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::episodes::Entity")]
    Episodes,
}

impl Related<super::episodes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Episodes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for TvShow {
    fn from(model: Model) -> Self {
        TvShow {
            id: model.id,
            title: model.title,
            year: model.year,
            premiered: model.premiered,
            plot: model.plot,
            art: super::art_map(model.art.as_ref()),
        }
    }
}
