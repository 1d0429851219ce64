use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Episodes::Table)
                    .add_column(ColumnDef::new(Episodes::CreditsStartMs).big_integer())
                    .to_owned(),
            )
            .await?;

        // Next-episode lookups filter by show and order by season/episode
        manager
            .create_index(
                Index::create()
                    .name("idx_episodes_show_season_episode")
                    .table(Episodes::Table)
                    .col(Episodes::TvshowId)
                    .col(Episodes::Season)
                    .col(Episodes::Episode)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_episodes_show_season_episode")
                    .table(Episodes::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Episodes::Table)
                    .drop_column(Episodes::CreditsStartMs)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum Episodes {
    Table,
    TvshowId,
    Season,
    Episode,
    CreditsStartMs,
}
