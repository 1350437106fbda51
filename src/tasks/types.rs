//! Task types and payload validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const MAX_TITLE_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// A stored task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/tasks` and `PUT /api/tasks/{id}`.
///
/// Fields stay untyped so that wrong types surface as validation messages
/// rather than deserialization failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPayload {
    #[serde(default)]
    pub title: Value,
    #[serde(default)]
    pub description: Value,
}

/// Body of `PATCH /api/tasks/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusPayload {
    #[serde(default)]
    pub completed: Value,
}

/// Title and description after validation and trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
}

/// Length in UTF-16 code units, the unit browser clients count in.
fn text_length(text: &str) -> usize {
    text.encode_utf16().count()
}

impl TaskPayload {
    /// Validate into a draft, or return the client-facing message.
    pub fn validate(&self) -> Result<TaskDraft, String> {
        let title = match self.title.as_str() {
            Some(t) if !t.trim().is_empty() => t.trim(),
            _ => return Err("Title is required".to_string()),
        };

        if text_length(title) > MAX_TITLE_LENGTH {
            return Err(format!("Title must be {MAX_TITLE_LENGTH} characters or less"));
        }

        let description = match self.description.as_str() {
            Some(d) if text_length(d) > MAX_DESCRIPTION_LENGTH => {
                return Err(format!(
                    "Description must be {MAX_DESCRIPTION_LENGTH} characters or less"
                ));
            }
            Some(d) => d.trim().to_string(),
            None => String::new(),
        };

        Ok(TaskDraft {
            title: title.to_string(),
            description,
        })
    }
}

impl StatusPayload {
    pub fn validate(&self) -> Result<bool, String> {
        self.completed
            .as_bool()
            .ok_or_else(|| "Completed status must be a boolean".to_string())
    }
}
