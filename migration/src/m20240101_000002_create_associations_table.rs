use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Associations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Associations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Associations::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(Associations::Provider)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Associations::ExternalId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Associations::AccessToken).string_len(1024))
                    .col(ColumnDef::new(Associations::Avatar).string_len(1024))
                    .col(ColumnDef::new(Associations::ProfileUrl).string_len(1024))
                    .col(
                        ColumnDef::new(Associations::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Associations::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Associations::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_associations_user_id")
                            .from(Associations::Table, Associations::UserId)
                            .to(Users::Table, Users::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One external identity binds to at most one row, active or not.
        manager
            .create_index(
                Index::create()
                    .name("idx_associations_provider_external_id")
                    .table(Associations::Table)
                    .col(Associations::Provider)
                    .col(Associations::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_associations_user_id_provider")
                    .table(Associations::Table)
                    .col(Associations::UserId)
                    .col(Associations::Provider)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Associations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Associations {
    Table,
    Id,
    UserId,
    Provider,
    ExternalId,
    AccessToken,
    Avatar,
    ProfileUrl,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
