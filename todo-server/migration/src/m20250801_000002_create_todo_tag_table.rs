use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

use crate::m20250801_000001_create_todo_table::Todo;

#[derive(DeriveMigrationName)]
pub struct Migration;

const PK_TODO_TAG: &str = "pk-todo_tag-todo_id-tag";
const FK_TODO_TAG_TO_TODO: &str = "fk-todo_tag-todo_id";
const IDX_TODO_TAG_TAG: &str = "idx-todo_tag-tag";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TodoTag::Table)
                    .if_not_exists()
                    .col(integer(TodoTag::TodoId))
                    .col(string(TodoTag::Tag))
                    .primary_key(
                        Index::create()
                            .name(PK_TODO_TAG)
                            .col(TodoTag::TodoId)
                            .col(TodoTag::Tag),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_TODO_TAG_TO_TODO)
                            .from(TodoTag::Table, TodoTag::TodoId)
                            .to(Todo::Table, Todo::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        // `GET /tags` and tag filtering scan by tag value.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(IDX_TODO_TAG_TAG)
                    .table(TodoTag::Table)
                    .col(TodoTag::Tag)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_TODO_TAG_TAG)
                    .table(TodoTag::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(TodoTag::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TodoTag {
    Table,
    TodoId,
    Tag,
}
