use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dates::date_key_serde;
use crate::error::{Invalid, TaskError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for TaskId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,

    pub text: String,

    #[serde(with = "date_key_serde")]
    pub date: NaiveDate,

    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn new(id: TaskId, text: String, date: NaiveDate) -> Self {
        Self {
            id,
            text,
            date,
            completed: false,
        }
    }
}

/// Trimmed text and date that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidInput {
    pub text: String,
    pub date: NaiveDate,
}

/// Shared by create, update and edit commit so all three reject the same input.
pub fn validate(text: &str, date: Option<NaiveDate>) -> Result<ValidInput, TaskError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TaskError::ValidationFailed(Invalid::EmptyText));
    }
    let date = date.ok_or(TaskError::ValidationFailed(Invalid::MissingDate))?;
    Ok(ValidInput {
        text: trimmed.to_string(),
        date,
    })
}
