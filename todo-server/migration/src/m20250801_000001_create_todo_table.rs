use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Stored form of the default priority.
const DEFAULT_PRIORITY: &str = "Medium";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Todo::Table)
                    .if_not_exists()
                    .col(pk_auto(Todo::Id))
                    .col(string(Todo::Name))
                    .col(text_null(Todo::Description))
                    .col(boolean(Todo::IsComplete).default(false))
                    .col(
                        timestamp_with_time_zone(Todo::CreatedDate)
                            .default(Expr::current_timestamp()),
                    )
                    .col(date_null(Todo::DueDate))
                    .col(string_len(Todo::Priority, 8).default(DEFAULT_PRIORITY))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Todo::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Todo {
    Table,
    Id,
    Name,
    Description,
    IsComplete,
    CreatedDate,
    DueDate,
    Priority,
}
