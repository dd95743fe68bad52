use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Collections::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Collections::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Collections::OwnerId).string().not_null())
                    .col(ColumnDef::new(Collections::Name).string().not_null())
                    .col(
                        ColumnDef::new(Collections::Tags)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Collections::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .index(
                        Index::create()
                            .name("idx_collections_owner_name")
                            .table(Collections::Table)
                            .col(Collections::OwnerId)
                            .col(Collections::Name)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Items::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Items::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Items::OwnerId).string().not_null())
                    .col(ColumnDef::new(Items::Prompt).text().not_null())
                    .col(ColumnDef::new(Items::VideoPrompt).text().not_null())
                    .col(ColumnDef::new(Items::ValueEth).double().not_null())
                    .col(
                        ColumnDef::new(Items::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Items::ImageUrl).string().null())
                    .col(ColumnDef::new(Items::Rarity).string().not_null())
                    .col(ColumnDef::new(Items::Character).string().not_null())
                    .col(ColumnDef::new(Items::Action).string().not_null())
                    .col(ColumnDef::new(Items::Background).string().not_null())
                    .col(ColumnDef::new(Items::ColorScheme).string().not_null())
                    .col(
                        ColumnDef::new(Items::Effects)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Items::IsFavorite)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Items::CollectionId).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_items_collection")
                            .from(Items::Table, Items::CollectionId)
                            .to(Collections::Table, Collections::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_items_owner_created")
                    .table(Items::Table)
                    .col(Items::OwnerId)
                    .col(Items::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Items::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Collections::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Collections {
    Table,
    Id,
    OwnerId,
    Name,
    Tags,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Items {
    Table,
    Id,
    OwnerId,
    Prompt,
    VideoPrompt,
    ValueEth,
    CreatedAt,
    ImageUrl,
    Rarity,
    Character,
    Action,
    Background,
    ColorScheme,
    Effects,
    IsFavorite,
    CollectionId,
}
