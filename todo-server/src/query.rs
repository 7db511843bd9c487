//! Filtering, sorting and pagination over a todo collection.
//!
//! Everything here is a pure function over explicit inputs. The steps run in a
//! fixed order: tag filter, free-text search, priority filter, completion
//! filter, sort, paginate.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::todo::{Priority, Todo};

/// Page size used when a request does not name one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Field a todo listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Priority,
    DueDate,
    IsComplete,
    CreatedDate,
}

impl FromStr for SortField {
    type Err = String;

    /// Parses a sort field name, ignoring case (`dueDate`, `duedate` and
    /// `DUEDATE` are all accepted).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(SortField::Name),
            "priority" => Ok(SortField::Priority),
            "duedate" => Ok(SortField::DueDate),
            "iscomplete" => Ok(SortField::IsComplete),
            "createddate" => Ok(SortField::CreatedDate),
            _ => Err(format!("Unknown sort field '{}'", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            _ => Err(format!(
                "Invalid sort direction '{}', expected 'asc' or 'desc'",
                value
            )),
        }
    }
}

/// A listing request over the full todo collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoQuery {
    pub search_query: Option<String>,
    pub priority: Option<Priority>,
    pub is_complete: Option<bool>,
    pub tag: Option<String>,
    /// `None` keeps the collection in id order.
    pub sort_by: Option<SortField>,
    pub sort_direction: SortDirection,
    pub page_number: u32,
    pub page_size: u32,
}

impl Default for TodoQuery {
    fn default() -> Self {
        Self {
            search_query: None,
            priority: None,
            is_complete: None,
            tag: None,
            sort_by: None,
            sort_direction: SortDirection::Ascending,
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of a filtered and sorted result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    /// Number of items after filtering, before pagination.
    pub total_count: usize,
    pub total_pages: usize,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl<T> Page<T> {
    /// Converts the items of the page, keeping its metadata.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            data: self.data.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
            has_next_page: self.has_next_page,
            has_previous_page: self.has_previous_page,
        }
    }
}

/// Clamps a raw page number or page size to the accepted `1..=u32::MAX` range.
pub fn clamp_page_param(value: i64) -> u32 {
    value.clamp(1, i64::from(u32::MAX)) as u32
}

/// Runs `query` over `todos`, which are expected in id order.
pub fn run_query(todos: Vec<Todo>, query: &TodoQuery) -> Page<Todo> {
    let mut matching: Vec<Todo> = todos
        .into_iter()
        .filter(|todo| query.tag.as_deref().is_none_or(|tag| todo.tags().has(tag)))
        .filter(|todo| {
            query
                .search_query
                .as_deref()
                .is_none_or(|search| matches_search(todo, search))
        })
        .filter(|todo| query.priority.is_none_or(|p| todo.priority() == p))
        .filter(|todo| {
            query
                .is_complete
                .is_none_or(|complete| todo.is_complete() == complete)
        })
        .collect();

    if let Some(field) = query.sort_by {
        sort_todos(&mut matching, field, query.sort_direction);
    }

    paginate(matching, query.page_number, query.page_size)
}

/// Case-insensitive substring match on name or description.
pub fn matches_search(todo: &Todo, search: &str) -> bool {
    let needle = search.to_lowercase();
    todo.name().to_lowercase().contains(&needle)
        || todo
            .description()
            .is_some_and(|description| description.to_lowercase().contains(&needle))
}

/// Stable sort; items without a due date always go last.
pub fn sort_todos(todos: &mut [Todo], field: SortField, direction: SortDirection) {
    todos.sort_by(|a, b| match field {
        SortField::DueDate => match (a.due_date(), b.due_date()) {
            (Some(left), Some(right)) => direction.apply(left.cmp(&right)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortField::Name => direction.apply(a.name().cmp(b.name())),
        SortField::Priority => direction.apply(a.priority().cmp(&b.priority())),
        SortField::IsComplete => direction.apply(a.is_complete().cmp(&b.is_complete())),
        SortField::CreatedDate => direction.apply(a.created_date().cmp(&b.created_date())),
    });
}

/// Slices `items` into the requested page. Pages past the end are empty.
pub fn paginate<T>(items: Vec<T>, page_number: u32, page_size: u32) -> Page<T> {
    let page_number = page_number.max(1);
    let page_size = page_size.max(1);
    let total_count = items.len();
    let total_pages = total_count.div_ceil(page_size as usize);
    let skip = (page_number as usize - 1).saturating_mul(page_size as usize);

    let data = items
        .into_iter()
        .skip(skip)
        .take(page_size as usize)
        .collect();

    Page {
        data,
        page_number,
        page_size,
        total_count,
        total_pages,
        has_next_page: (page_number as usize) < total_pages,
        has_previous_page: page_number > 1,
    }
}
