use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use todo_server::query::{SortDirection, SortField, TodoQuery};
use todo_server::todo::{Priority, Todo, TodoFields, TodoService, TodoServiceError};

mod common;

pub struct TestContext {
    pub db: DatabaseConnection,
}

async fn setup() -> anyhow::Result<TestContext> {
    let db = common::setup_db().await?;
    Ok(TestContext { db })
}

fn fields_with_tags(name: &str, tags: &[&str]) -> TodoFields {
    TodoFields {
        tags: tags.iter().collect(),
        ..TodoFields::new(name)
    }
}

fn tag_list(todo: &Todo) -> Vec<&str> {
    todo.tags().iter().collect()
}

#[tokio::test]
async fn can_create_todo_with_defaults() {
    let state = setup().await.expect("Failed to setup test context");
    let todo_service = TodoService::new(&state.db);

    let created = todo_service
        .create_todo(TodoFields::new("Buy milk"))
        .await
        .expect("Failed to create todo");

    assert!(created.id() > 0);
    assert_eq!(created.name(), "Buy milk");
    assert_eq!(created.description(), None);
    assert!(!created.is_complete());
    assert_eq!(created.due_date(), None);
    assert_eq!(created.priority(), Priority::Medium);
    assert!(created.tags().is_empty());

    let fetched = todo_service
        .get_todo(created.id())
        .await
        .expect("Failed to get todo");
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn can_normalize_tags_on_create() {
    let state = setup().await.expect("Failed to setup test context");
    let todo_service = TodoService::new(&state.db);

    let created = todo_service
        .create_todo(fields_with_tags("Buy milk", &["Shopping", " Personal ", "SHOPPING"]))
        .await
        .expect("Failed to create todo");

    assert_eq!(tag_list(&created), vec!["personal", "shopping"]);

    let fetched = todo_service.get_todo(created.id()).await.unwrap();
    assert_eq!(tag_list(&fetched), vec!["personal", "shopping"]);
}

#[tokio::test]
async fn can_reject_todo_without_name() {
    let state = setup().await.expect("Failed to setup test context");
    let todo_service = TodoService::new(&state.db);

    let result = todo_service.create_todo(TodoFields::new("  ")).await;

    assert!(matches!(result, Err(TodoServiceError::Validation(_))));
    assert!(todo_service.get_all_todos().await.unwrap().is_empty());
}

#[tokio::test]
async fn update_replaces_every_mutable_field() {
    let state = setup().await.expect("Failed to setup test context");
    let todo_service = TodoService::new(&state.db);

    let created = todo_service
        .create_todo(TodoFields {
            name: "A".to_string(),
            description: Some("first".to_string()),
            is_complete: true,
            due_date: NaiveDate::from_ymd_opt(2025, 12, 24),
            priority: Priority::Low,
            tags: ["home"].iter().collect(),
        })
        .await
        .expect("Failed to create todo");

    let updated = todo_service
        .update_todo(created.id(), TodoFields::new("B"))
        .await
        .expect("Failed to update todo");

    assert_eq!(updated.id(), created.id());
    assert_eq!(updated.created_date(), created.created_date());
    assert_eq!(updated.name(), "B");
    assert_eq!(updated.description(), None);
    assert!(!updated.is_complete());
    assert_eq!(updated.due_date(), None);
    assert_eq!(updated.priority(), Priority::Medium);
    assert!(updated.tags().is_empty());

    let fetched = todo_service.get_todo(created.id()).await.unwrap();
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn can_replace_tags_on_update() {
    let state = setup().await.expect("Failed to setup test context");
    let todo_service = TodoService::new(&state.db);

    let created = todo_service
        .create_todo(fields_with_tags("Plan trip", &["travel", "family"]))
        .await
        .unwrap();

    todo_service
        .update_todo(created.id(), fields_with_tags("Plan trip", &["Travel", "Budget "]))
        .await
        .unwrap();

    let fetched = todo_service.get_todo(created.id()).await.unwrap();
    assert_eq!(tag_list(&fetched), vec!["budget", "travel"]);
}

#[tokio::test]
async fn can_handle_update_when_todo_not_found() {
    let state = setup().await.expect("Failed to setup test context");
    let todo_service = TodoService::new(&state.db);

    let result = todo_service.update_todo(4242, TodoFields::new("Nobody")).await;

    assert!(matches!(result, Err(TodoServiceError::NotFound(4242))));
    if let Err(e) = result {
        assert_eq!(e.to_string(), "Todo item with ID 4242 not found");
    }
}

#[tokio::test]
async fn deleting_twice_reports_not_found() {
    let state = setup().await.expect("Failed to setup test context");
    let todo_service = TodoService::new(&state.db);

    let created = todo_service
        .create_todo(fields_with_tags("Walk dog", &["pets"]))
        .await
        .unwrap();

    let deleted = todo_service
        .delete_todo(created.id())
        .await
        .expect("Failed to delete todo");
    assert_eq!(deleted, created);

    let second = todo_service.delete_todo(created.id()).await;
    assert!(matches!(second, Err(TodoServiceError::NotFound(_))));
    let third = todo_service.delete_todo(created.id()).await;
    assert!(matches!(third, Err(TodoServiceError::NotFound(_))));

    assert!(matches!(
        todo_service.get_todo(created.id()).await,
        Err(TodoServiceError::NotFound(_))
    ));
    assert!(todo_service.get_all_tags().await.unwrap().is_empty());
}

#[tokio::test]
async fn can_get_all_todos_in_id_order() {
    let state = setup().await.expect("Failed to setup test context");
    let todo_service = TodoService::new(&state.db);

    let first = todo_service.create_todo(TodoFields::new("First")).await.unwrap();
    let second = todo_service
        .create_todo(fields_with_tags("Second", &["b", "a"]))
        .await
        .unwrap();

    let todos = todo_service.get_all_todos().await.unwrap();

    assert_eq!(todos, vec![first, second]);
}

#[tokio::test]
async fn can_get_complete_todos() {
    let state = setup().await.expect("Failed to setup test context");
    let todo_service = TodoService::new(&state.db);

    todo_service.create_todo(TodoFields::new("Open")).await.unwrap();
    let done = todo_service
        .create_todo(TodoFields {
            is_complete: true,
            ..TodoFields::new("Done")
        })
        .await
        .unwrap();

    let complete = todo_service.get_complete_todos().await.unwrap();

    assert_eq!(complete, vec![done]);
}

#[tokio::test]
async fn can_get_todos_by_tag_ignoring_case() {
    let state = setup().await.expect("Failed to setup test context");
    let todo_service = TodoService::new(&state.db);

    let work = todo_service
        .create_todo(fields_with_tags("Report", &["Work", "urgent"]))
        .await
        .unwrap();
    todo_service
        .create_todo(fields_with_tags("Groceries", &["home"]))
        .await
        .unwrap();

    let tagged = todo_service.get_todos_by_tag("  WORK ").await.unwrap();

    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0], work);
    assert!(todo_service.get_todos_by_tag("missing").await.unwrap().is_empty());
}

#[tokio::test]
async fn can_list_unique_tags_sorted() {
    let state = setup().await.expect("Failed to setup test context");
    let todo_service = TodoService::new(&state.db);

    todo_service
        .create_todo(fields_with_tags("Buy milk", &["Shopping", " Personal "]))
        .await
        .unwrap();
    todo_service
        .create_todo(fields_with_tags("Buy bread", &["shopping", "bakery"]))
        .await
        .unwrap();

    let tags = todo_service.get_all_tags().await.unwrap();

    assert_eq!(tags, vec!["bakery", "personal", "shopping"]);
}

#[tokio::test]
async fn can_bulk_delete_with_partial_failures() {
    let state = setup().await.expect("Failed to setup test context");
    let todo_service = TodoService::new(&state.db);

    let first = todo_service.create_todo(TodoFields::new("One")).await.unwrap();
    let second = todo_service.create_todo(TodoFields::new("Two")).await.unwrap();

    let report = todo_service
        .bulk_delete_todos(&[first.id(), 999, second.id()])
        .await
        .unwrap();

    assert_eq!(report.deleted_count, 2);
    assert_eq!(report.failures, vec!["Todo item with ID 999 not found"]);
    assert!(todo_service.get_all_todos().await.unwrap().is_empty());
}

#[tokio::test]
async fn can_clear_completed_todos() {
    let state = setup().await.expect("Failed to setup test context");
    let todo_service = TodoService::new(&state.db);

    let open = todo_service.create_todo(TodoFields::new("Open")).await.unwrap();
    for name in ["Done 1", "Done 2"] {
        todo_service
            .create_todo(TodoFields {
                is_complete: true,
                ..TodoFields::new(name)
            })
            .await
            .unwrap();
    }

    let report = todo_service.clear_completed_todos().await.unwrap();

    assert_eq!(report.deleted_count, 2);
    assert!(report.failures.is_empty());
    assert_eq!(todo_service.get_all_todos().await.unwrap(), vec![open]);
}

#[tokio::test]
async fn can_query_todos_with_search_sort_and_paging() {
    let state = setup().await.expect("Failed to setup test context");
    let todo_service = TodoService::new(&state.db);

    for (name, priority) in [
        ("Buy milk", Priority::Low),
        ("Walk dog", Priority::High),
        ("Buy eggs", Priority::High),
        ("Buy bread", Priority::Medium),
    ] {
        todo_service
            .create_todo(TodoFields {
                priority,
                ..TodoFields::new(name)
            })
            .await
            .unwrap();
    }

    let page = todo_service
        .query_todos(&TodoQuery {
            search_query: Some("buy".to_string()),
            sort_by: Some(SortField::Priority),
            sort_direction: SortDirection::Descending,
            page_number: 1,
            page_size: 2,
            ..Default::default()
        })
        .await
        .unwrap();

    let names: Vec<&str> = page.data.iter().map(Todo::name).collect();
    assert_eq!(names, vec!["Buy eggs", "Buy bread"]);
    assert_eq!(page.total_count, 3);
    assert_eq!(page.total_pages, 2);
    assert!(page.has_next_page);
    assert!(!page.has_previous_page);
}
