use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MovieEntry::Table)
                    .if_not_exists()
                    .col(pk_auto(MovieEntry::Id))
                    .col(string(MovieEntry::Collection))
                    .col(big_integer(MovieEntry::MovieId))
                    .col(string(MovieEntry::Title))
                    .col(string(MovieEntry::ReleaseDate))
                    .col(text(MovieEntry::Synopsis))
                    .col(double(MovieEntry::Rating))
                    .col(double(MovieEntry::Popularity))
                    .col(string(MovieEntry::PosterUrl))
                    .col(string_null(MovieEntry::ThumbUrl))
                    .col(big_integer(MovieEntry::InsertedAt))
                    .to_owned(),
            )
            .await?;

        // Not unique: every sync run appends its own batch.
        manager
            .create_index(
                Index::create()
                    .name("idx_movie_entry_collection_movie")
                    .table(MovieEntry::Table)
                    .col(MovieEntry::Collection)
                    .col(MovieEntry::MovieId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(MovieEntry::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum MovieEntry {
    Table,
    Id,
    Collection,
    MovieId,
    Title,
    ReleaseDate,
    Synopsis,
    Rating,
    Popularity,
    PosterUrl,
    ThumbUrl,
    InsertedAt,
}
