use crate::entities::{sea_orm_active_enums, todo, todo_tag};
use crate::query::{self, Page, TodoQuery};
use crate::tag::{self, Tags};
use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use sea_orm::sea_query::Query;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub mod api;

/// How urgent a todo is. Ordered `Low < Medium < High`.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(format!(
                "Invalid priority '{}', expected Low, Medium or High",
                value
            )),
        }
    }
}

impl From<sea_orm_active_enums::Priority> for Priority {
    fn from(priority: sea_orm_active_enums::Priority) -> Self {
        match priority {
            sea_orm_active_enums::Priority::Low => Priority::Low,
            sea_orm_active_enums::Priority::Medium => Priority::Medium,
            sea_orm_active_enums::Priority::High => Priority::High,
        }
    }
}

impl From<Priority> for sea_orm_active_enums::Priority {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Low => sea_orm_active_enums::Priority::Low,
            Priority::Medium => sea_orm_active_enums::Priority::Medium,
            Priority::High => sea_orm_active_enums::Priority::High,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Todo {
    id: i32,
    name: String,
    description: Option<String>,
    is_complete: bool,
    created_date: DateTime<Utc>,
    due_date: Option<NaiveDate>,
    priority: Priority,
    tags: Tags,
}

impl Todo {
    /// Creates a todo with default priority, no tags, no due date and not complete.
    pub fn new(id: i32, name: String, created_date: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            description: None,
            is_complete: false,
            created_date,
            due_date: None,
            priority: Priority::default(),
            tags: Tags::new(),
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_complete(mut self, is_complete: bool) -> Self {
        self.is_complete = is_complete;
        self
    }

    pub fn with_due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = due_date;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    /// Returns the ID of the todo.
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn created_date(&self) -> DateTime<Utc> {
        self.created_date
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }
}

impl From<(todo::Model, Vec<todo_tag::Model>)> for Todo {
    fn from((model, tags): (todo::Model, Vec<todo_tag::Model>)) -> Self {
        Todo::new(model.id, model.name, model.created_date)
            .with_description(model.description)
            .with_complete(model.is_complete)
            .with_due_date(model.due_date)
            .with_priority(model.priority.into())
            .with_tags(tags.into_iter().map(|tag| tag.tag).collect())
    }
}

/// The mutable fields of a todo.
///
/// Used both to create a todo and to replace every mutable field of an
/// existing one, so anything left at its default here is stored as such.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TodoFields {
    pub name: String,
    pub description: Option<String>,
    pub is_complete: bool,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub tags: Tags,
}

impl TodoFields {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<(), TodoServiceError> {
        if self.name.trim().is_empty() {
            return Err(TodoServiceError::Validation(
                "Todo name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of deleting several todos one at a time.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BulkDeleteReport {
    pub deleted_count: usize,
    pub failures: Vec<String>,
}

/// Error type for TodoService operations.
#[derive(Debug, thiserror::Error)]
pub enum TodoServiceError {
    /// The referenced todo does not exist.
    #[error("Todo item with ID {0} not found")]
    NotFound(i32),
    /// Malformed or missing input.
    #[error("Invalid todo: {0}")]
    Validation(String),
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

pub struct TodoService<'a> {
    db: &'a sea_orm::DatabaseConnection,
}

impl TodoService<'_> {
    pub fn new(db: &sea_orm::DatabaseConnection) -> TodoService<'_> {
        TodoService { db }
    }

    /// Creates a new todo with its tags in a single transaction.
    ///
    /// # Returns
    ///
    /// The stored todo, including its generated ID and creation time.
    #[tracing::instrument(skip(self))]
    pub async fn create_todo(&self, fields: TodoFields) -> Result<Todo, TodoServiceError> {
        fields.validate()?;
        let TodoFields {
            name,
            description,
            is_complete,
            due_date,
            priority,
            tags,
        } = fields;

        let txn = self.db.begin().await?;
        let active_model = todo::ActiveModel {
            name: ActiveValue::Set(name),
            description: ActiveValue::Set(description),
            is_complete: ActiveValue::Set(is_complete),
            created_date: ActiveValue::Set(Utc::now().trunc_subsecs(6)),
            due_date: ActiveValue::Set(due_date),
            priority: ActiveValue::Set(priority.into()),
            ..Default::default()
        };
        let created_model = active_model.insert(&txn).await?;
        insert_tags(&txn, created_model.id, &tags).await?;
        txn.commit().await?;

        tracing::info!("Created todo item with ID {}", created_model.id);
        Ok(Todo::from((created_model, Vec::new())).with_tags(tags))
    }

    /// Replaces every mutable field of a todo. `id` and `created_date` are kept.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the todo to update.
    /// * `fields` - The new values; omitted optional values clear the stored ones.
    ///
    /// # Returns
    ///
    /// The updated todo, or `NotFound` if no todo has the given ID.
    #[tracing::instrument(skip(self))]
    pub async fn update_todo(&self, id: i32, fields: TodoFields) -> Result<Todo, TodoServiceError> {
        fields.validate()?;
        let TodoFields {
            name,
            description,
            is_complete,
            due_date,
            priority,
            tags,
        } = fields;

        let txn = self.db.begin().await?;
        let todo_to_update = todo::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(TodoServiceError::NotFound(id))?;

        let mut active_model: todo::ActiveModel = todo_to_update.into();
        active_model.name = ActiveValue::Set(name);
        active_model.description = ActiveValue::Set(description);
        active_model.is_complete = ActiveValue::Set(is_complete);
        active_model.due_date = ActiveValue::Set(due_date);
        active_model.priority = ActiveValue::Set(priority.into());
        let updated_model = active_model.update(&txn).await?;

        todo_tag::Entity::delete_many()
            .filter(todo_tag::Column::TodoId.eq(id))
            .exec(&txn)
            .await?;
        insert_tags(&txn, id, &tags).await?;
        txn.commit().await?;

        Ok(Todo::from((updated_model, Vec::new())).with_tags(tags))
    }

    /// Deletes a todo and its tags.
    ///
    /// # Returns
    ///
    /// The deleted todo, or `NotFound` if it does not exist (including when it
    /// was already deleted).
    #[tracing::instrument(skip(self))]
    pub async fn delete_todo(&self, id: i32) -> Result<Todo, TodoServiceError> {
        let txn = self.db.begin().await?;
        let todo_to_delete = todo::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(TodoServiceError::NotFound(id))?;
        let tags = todo_to_delete
            .find_related(todo_tag::Entity)
            .all(&txn)
            .await?;

        todo_tag::Entity::delete_many()
            .filter(todo_tag::Column::TodoId.eq(id))
            .exec(&txn)
            .await?;
        todo::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        Ok(Todo::from((todo_to_delete, tags)))
    }

    /// Deletes several todos independently of each other.
    ///
    /// A failure on one ID does not stop or undo the others; it is recorded in
    /// the returned report instead.
    #[tracing::instrument(skip(self))]
    pub async fn bulk_delete_todos(
        &self,
        ids: &[i32],
    ) -> Result<BulkDeleteReport, TodoServiceError> {
        let mut report = BulkDeleteReport::default();

        for &id in ids {
            match self.delete_todo(id).await {
                Ok(_) => report.deleted_count += 1,
                Err(TodoServiceError::NotFound(_)) => {
                    report
                        .failures
                        .push(format!("Todo item with ID {} not found", id));
                    tracing::warn!("Failed to delete todo item with ID {}: not found", id);
                }
                Err(e) => {
                    report
                        .failures
                        .push(format!("Failed to delete todo item with ID {}: {}", id, e));
                    tracing::error!("Failed to delete todo item with ID {}: {}", id, e);
                }
            }
        }

        Ok(report)
    }

    /// Deletes every completed todo, one at a time.
    #[tracing::instrument(skip(self))]
    pub async fn clear_completed_todos(&self) -> Result<BulkDeleteReport, TodoServiceError> {
        let ids: Vec<i32> = self
            .get_complete_todos()
            .await?
            .iter()
            .map(Todo::id)
            .collect();
        self.bulk_delete_todos(&ids).await
    }

    /// Retrieves a todo by its ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_todo(&self, id: i32) -> Result<Todo, TodoServiceError> {
        let mut rows = todo::Entity::find_by_id(id)
            .find_with_related(todo_tag::Entity)
            .all(self.db)
            .await?;
        rows.pop()
            .map(Todo::from)
            .ok_or(TodoServiceError::NotFound(id))
    }

    /// Retrieves all todos in ID order.
    #[tracing::instrument(skip(self))]
    pub async fn get_all_todos(&self) -> Result<Vec<Todo>, TodoServiceError> {
        self.find_todos(todo::Entity::find()).await
    }

    /// Retrieves all completed todos in ID order.
    #[tracing::instrument(skip(self))]
    pub async fn get_complete_todos(&self) -> Result<Vec<Todo>, TodoServiceError> {
        self.find_todos(todo::Entity::find().filter(todo::Column::IsComplete.eq(true)))
            .await
    }

    /// Retrieves the todos carrying `tag`, compared in normalized form.
    #[tracing::instrument(skip(self))]
    pub async fn get_todos_by_tag(&self, tag: &str) -> Result<Vec<Todo>, TodoServiceError> {
        let tagged_ids = Query::select()
            .column(todo_tag::Column::TodoId)
            .from(todo_tag::Entity)
            .and_where(todo_tag::Column::Tag.eq(tag::normalize(tag)))
            .to_owned();
        self.find_todos(todo::Entity::find().filter(todo::Column::Id.in_subquery(tagged_ids)))
            .await
    }

    /// Retrieves every distinct tag in use, sorted ascending.
    #[tracing::instrument(skip(self))]
    pub async fn get_all_tags(&self) -> Result<Vec<String>, TodoServiceError> {
        let todos = self.get_all_todos().await?;
        Ok(tag::unique_tags_across(&todos))
    }

    /// Runs a filtered, sorted and paginated listing over all todos.
    #[tracing::instrument(skip(self))]
    pub async fn query_todos(&self, todo_query: &TodoQuery) -> Result<Page<Todo>, TodoServiceError> {
        let todos = self.get_all_todos().await?;
        Ok(query::run_query(todos, todo_query))
    }

    async fn find_todos(&self, select: Select<todo::Entity>) -> Result<Vec<Todo>, TodoServiceError> {
        let todos = select
            .order_by_asc(todo::Column::Id)
            .find_with_related(todo_tag::Entity)
            .all(self.db)
            .await?
            .into_iter()
            .map(Todo::from)
            .collect();
        Ok(todos)
    }
}

async fn insert_tags<C: ConnectionTrait>(conn: &C, todo_id: i32, tags: &Tags) -> Result<(), DbErr> {
    if tags.is_empty() {
        return Ok(());
    }
    let models = tags.iter().map(|tag| todo_tag::ActiveModel {
        todo_id: ActiveValue::Set(todo_id),
        tag: ActiveValue::Set(tag.to_string()),
    });
    todo_tag::Entity::insert_many(models)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}
