use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TvShows::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TvShows::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TvShows::Title).string().not_null())
                    .col(ColumnDef::new(TvShows::Year).integer())
                    .col(ColumnDef::new(TvShows::Premiered).string().not_null().default(""))
                    .col(ColumnDef::new(TvShows::Plot).text().not_null().default(""))
                    .col(ColumnDef::new(TvShows::Art).json())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Episodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Episodes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Episodes::TvshowId).integer().not_null())
                    .col(ColumnDef::new(Episodes::Title).string().not_null())
                    .col(ColumnDef::new(Episodes::Season).integer())
                    .col(ColumnDef::new(Episodes::Episode).integer())
                    .col(ColumnDef::new(Episodes::File).string().not_null())
                    .col(ColumnDef::new(Episodes::Path).string().not_null())
                    .col(ColumnDef::new(Episodes::Filename).string().not_null())
                    .col(ColumnDef::new(Episodes::Playcount).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Episodes::ResumePositionMs)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Episodes::ResumeTotalMs)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Episodes::RuntimeSecs)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Episodes::FirstAired).string().not_null().default(""))
                    .col(ColumnDef::new(Episodes::Plot).text().not_null().default(""))
                    .col(ColumnDef::new(Episodes::Rating).float().not_null().default(0.0))
                    .col(ColumnDef::new(Episodes::Art).json())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_episodes_tvshow")
                            .from(Episodes::Table, Episodes::TvshowId)
                            .to(TvShows::Table, TvShows::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Episodes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TvShows::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum TvShows {
    #[iden = "tvshows"]
    Table,
    Id,
    Title,
    Year,
    Premiered,
    Plot,
    Art,
}

#[derive(Iden)]
enum Episodes {
    Table,
    Id,
    TvshowId,
    Title,
    Season,
    Episode,
    File,
    Path,
    Filename,
    Playcount,
    ResumePositionMs,
    ResumeTotalMs,
    RuntimeSecs,
    FirstAired,
    Plot,
    Rating,
    Art,
}
