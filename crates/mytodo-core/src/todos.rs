//! In-memory todo collection kept in step with the backend.
//!
//! Mutations are fire-and-confirm: the local list changes only after the
//! server accepted the call, using the todo the server returned.

use tracing::debug;

use crate::api::{
    ApiClient, ApiError, ApiResult, BearerToken, CreateTodoRequest, Todo, TodoFilter,
    UpdateTodoRequest,
};

/// Longest accepted title, in characters after trimming.
pub const MAX_TITLE_LEN: usize = 200;
/// Longest accepted description, in characters after trimming.
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// Ordered todos of the current session, most recently created first.
///
/// Ids are unique within the collection.
#[derive(Debug, Clone, Default)]
pub struct TodoCollection {
    items: Vec<Todo>,
}

impl TodoCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Todo] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&Todo> {
        self.items.iter().find(|todo| todo.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.items.iter().filter(|todo| todo.completed).count()
    }

    pub fn active_count(&self) -> usize {
        self.len() - self.completed_count()
    }

    /// Completed todos when `show_completed`, open ones otherwise.
    pub fn filtered(&self, show_completed: bool) -> impl Iterator<Item = &Todo> {
        self.items
            .iter()
            .filter(move |todo| todo.completed == show_completed)
    }

    /// Replaces the whole collection with the server's list.
    ///
    /// # Errors
    /// Any API error; the collection is left empty in that case.
    pub async fn load(
        &mut self,
        api: &ApiClient,
        token: &BearerToken,
        filter: TodoFilter,
    ) -> ApiResult<&[Todo]> {
        match api.list_todos(token, filter).await {
            Ok(items) => {
                self.items = dedup_by_id(items);
                Ok(&self.items)
            }
            Err(err) => {
                self.items.clear();
                Err(err)
            }
        }
    }

    /// Creates a todo and puts it at the front.
    ///
    /// # Errors
    /// `Validation` (without a network call) when the title is blank or a
    /// field is too long, otherwise any API error.
    pub async fn create(
        &mut self,
        api: &ApiClient,
        token: &BearerToken,
        title: &str,
        description: &str,
    ) -> ApiResult<Todo> {
        let request = CreateTodoRequest {
            title: validate_title(title)?.to_string(),
            description: validate_description(description)?.to_string(),
        };
        let todo = api.create_todo(token, &request).await?;
        self.items.retain(|existing| existing.id != todo.id);
        self.items.insert(0, todo.clone());
        Ok(todo)
    }

    /// Edits title and/or description.
    ///
    /// # Errors
    /// `Validation` when nothing is set, the new title is blank, or a field
    /// is too long; otherwise any API error.
    pub async fn update(
        &mut self,
        api: &ApiClient,
        token: &BearerToken,
        id: &str,
        fields: UpdateTodoRequest,
    ) -> ApiResult<Todo> {
        if fields.is_empty() {
            return Err(ApiError::validation("Nothing to update"));
        }
        let request = UpdateTodoRequest {
            title: fields
                .title
                .as_deref()
                .map(validate_title)
                .transpose()?
                .map(str::to_string),
            description: fields
                .description
                .as_deref()
                .map(validate_description)
                .transpose()?
                .map(str::to_string),
        };
        let todo = api.update_todo(token, id, &request).await?;
        self.replace(todo.clone());
        Ok(todo)
    }

    /// Marks a todo completed or open again via the completion endpoint.
    ///
    /// # Errors
    /// Any API error.
    pub async fn set_completed(
        &mut self,
        api: &ApiClient,
        token: &BearerToken,
        id: &str,
        completed: bool,
    ) -> ApiResult<Todo> {
        let todo = api.set_completed(token, id, completed).await?;
        self.replace(todo.clone());
        Ok(todo)
    }

    /// Deletes a todo and returns the server's confirmation message.
    ///
    /// # Errors
    /// Any API error; the entry stays in the collection in that case.
    pub async fn remove(
        &mut self,
        api: &ApiClient,
        token: &BearerToken,
        id: &str,
    ) -> ApiResult<String> {
        let message = api.delete_todo(token, id).await?;
        self.items.retain(|todo| todo.id != id);
        Ok(message)
    }

    /// Re-fetches one todo; inserts it at the front if it was not loaded.
    ///
    /// # Errors
    /// Any API error.
    pub async fn refresh(
        &mut self,
        api: &ApiClient,
        token: &BearerToken,
        id: &str,
    ) -> ApiResult<Todo> {
        let todo = api.get_todo(token, id).await?;
        if !self.replace(todo.clone()) {
            self.items.insert(0, todo.clone());
        }
        Ok(todo)
    }

    /// Swaps in the server's version of a todo. Returns false if absent.
    fn replace(&mut self, todo: Todo) -> bool {
        if let Some(slot) = self.items.iter_mut().find(|existing| existing.id == todo.id) {
            *slot = todo;
            true
        } else {
            debug!(id = %todo.id, "todo not in collection, skipping replace");
            false
        }
    }
}

/// Returns the trimmed title, or a validation error when it is blank or
/// longer than [`MAX_TITLE_LEN`].
pub fn validate_title(title: &str) -> ApiResult<&str> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Title is required"));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(ApiError::validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(trimmed)
}

/// Returns the trimmed description, or a validation error when it is longer
/// than [`MAX_DESCRIPTION_LEN`].
pub fn validate_description(description: &str) -> ApiResult<&str> {
    let trimmed = description.trim();
    if trimmed.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ApiError::validation(format!(
            "Description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(trimmed)
}

fn dedup_by_id(items: Vec<Todo>) -> Vec<Todo> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|todo| seen.insert(todo.id.clone()))
        .collect()
}
