use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // revokeAll deletes by owner
        manager
            .create_index(
                Index::create()
                    .name("idx_tokens_user_id")
                    .table(Tokens::Table)
                    .col(Tokens::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // listing is newest-first
        manager
            .create_index(
                Index::create()
                    .name("idx_ideas_created_at")
                    .table(Ideas::Table)
                    .col(Ideas::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ideas_tags_tag_id")
                    .table(IdeasTags::Table)
                    .col(IdeasTags::TagId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_ideas_tags_tag_id")
                    .table(IdeasTags::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_ideas_created_at")
                    .table(Ideas::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_tokens_user_id")
                    .table(Tokens::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Tokens {
    Table,
    UserId,
}

#[derive(DeriveIden)]
enum Ideas {
    Table,
    CreatedAt,
}

#[derive(DeriveIden)]
enum IdeasTags {
    Table,
    TagId,
}
