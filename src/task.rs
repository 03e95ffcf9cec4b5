//! Task data structures and title validation.
//!
//! `Task` is the persisted record. `TaskInput` and `TaskUpdate` are what callers
//! hand to the store; the store alone assigns `id` and `created_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest title the presentation layer accepts, in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// A short unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields a caller supplies when creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskInput {
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `false` when unset.
    pub completed: Option<bool>,
}

impl TaskInput {
    pub fn new(title: impl Into<String>) -> Self {
        TaskInput {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }
}

/// Partial set of fields to merge into an existing task.
///
/// `None` leaves the field untouched. For `description`, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }

    /// Merge into `task`, leaving unspecified fields untouched.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TitleError {
    #[error("Title is required")]
    Empty,
    #[error("Title must be 100 characters or less")]
    TooLong,
}

/// Check a raw title from user input and return it trimmed.
///
/// Emptiness is judged after trimming, length on the raw input.
pub fn validate_title(raw: &str) -> Result<String, TitleError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TitleError::Empty);
    }
    if raw.chars().count() > MAX_TITLE_CHARS {
        return Err(TitleError::TooLong);
    }
    Ok(trimmed.to_string())
}

/// Trim an optional description; blank becomes absent.
pub fn normalise_description(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|d| !d.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Task {
        Task {
            id: "a1".into(),
            title: "Buy milk".into(),
            description: None,
            completed: false,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_validate_title() {
        assert_eq!(validate_title("  Buy milk "), Ok("Buy milk".to_string()));
        assert_eq!(validate_title(""), Err(TitleError::Empty));
        assert_eq!(validate_title("   "), Err(TitleError::Empty));
        assert!(validate_title(&"a".repeat(100)).is_ok());
        assert_eq!(validate_title(&"a".repeat(101)), Err(TitleError::TooLong));
        // Characters, not bytes.
        assert!(validate_title(&"é".repeat(100)).is_ok());
    }

    #[test]
    fn test_title_error_messages() {
        assert_eq!(TitleError::Empty.to_string(), "Title is required");
        assert_eq!(TitleError::TooLong.to_string(), "Title must be 100 characters or less");
    }

    #[test]
    fn test_normalise_description() {
        assert_eq!(normalise_description(None), None);
        assert_eq!(normalise_description(Some("  ")), None);
        assert_eq!(normalise_description(Some(" two litres ")), Some("two litres".into()));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["id"], "a1");
        assert_eq!(json["completed"], false);
        assert_eq!(json["createdAt"], "2024-03-01T09:30:00Z");
        assert!(json.get("description").is_none());
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn test_deserialize_restores_instant() {
        let raw = r#"{"id":"x","title":"t","completed":true,
            "createdAt":"2024-03-01T10:30:00.250+01:00"}"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
            + chrono::Duration::milliseconds(250);
        assert_eq!(task.created_at, expected);
        assert!(task.completed);
        assert_eq!(task.description, None);
    }

    #[test]
    fn test_update_changes_only_given_fields() {
        let mut task = sample();
        TaskUpdate { completed: Some(true), ..Default::default() }.apply_to(&mut task);
        assert_eq!(task.title, "Buy milk");
        assert!(task.completed);

        task.description = Some("two litres".into());
        TaskUpdate { description: Some(None), ..Default::default() }.apply_to(&mut task);
        assert_eq!(task.description, None);
        assert!(task.completed);
        assert!(TaskUpdate::default().is_empty());
    }
}
