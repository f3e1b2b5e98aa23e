use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::TaskError;
use crate::kv::KeyValueStore;
use crate::task::{Task, TaskId, validate};

pub const DEFAULT_STORAGE_KEY: &str = "todos";

/// A mutation that has been applied in memory.
///
/// `persist_error` is set when the follow-up write failed; the mutation
/// stays applied either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed<T> {
    pub value: T,
    pub persist_error: Option<TaskError>,
}

impl<T> Committed<T> {
    pub fn persisted(&self) -> bool {
        self.persist_error.is_none()
    }
}

/// Owns the canonical task collection and is its only writer to the backend.
#[derive(Debug)]
pub struct TaskStore<S> {
    backend: S,
    key: String,
    tasks: Vec<Task>,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Opens the store and loads whatever the backend holds under `key`.
    #[tracing::instrument(skip(backend))]
    pub fn open(backend: S, key: &str) -> Self {
        let mut store = Self {
            backend,
            key: key.to_string(),
            tasks: Vec::new(),
        };
        store.load();
        store
    }

    /// Replaces the in-memory collection with the stored one. Missing,
    /// unreadable or corrupt payloads all yield an empty collection.
    #[tracing::instrument(skip(self), fields(key = %self.key))]
    pub fn load(&mut self) {
        self.tasks = match self.backend.get(&self.key) {
            Ok(None) => {
                debug!("no stored tasks; starting empty");
                Vec::new()
            }
            Ok(Some(raw)) => match decode_tasks(&raw) {
                Ok(tasks) => tasks,
                Err(err) => {
                    warn!(error = %err, "discarding stored tasks");
                    Vec::new()
                }
            },
            Err(err) => {
                warn!(error = %err, "failed reading stored tasks; starting empty");
                Vec::new()
            }
        };
        info!(count = self.tasks.len(), "loaded tasks");
    }

    /// Writes the full collection under the store key.
    #[tracing::instrument(skip(self), fields(key = %self.key, count = self.tasks.len()))]
    pub fn save(&mut self) -> Result<(), TaskError> {
        let payload = encode_tasks(&self.tasks)?;
        self.backend.set(&self.key, &payload).map_err(|err| {
            warn!(error = %err, "failed to persist tasks");
            TaskError::PersistenceWriteFailed(format!("{err:#}"))
        })
    }

    #[tracing::instrument(skip(self, text))]
    pub fn create(
        &mut self,
        text: &str,
        date: Option<NaiveDate>,
    ) -> Result<Committed<Task>, TaskError> {
        let input = validate(text, date)?;
        let task = Task::new(self.fresh_id(), input.text, input.date);
        self.tasks.push(task.clone());
        info!(id = %task.id, date = %task.date, "created task");
        Ok(self.commit(task))
    }

    #[tracing::instrument(skip(self, text))]
    pub fn update(
        &mut self,
        id: &TaskId,
        text: &str,
        date: Option<NaiveDate>,
    ) -> Result<Committed<Task>, TaskError> {
        let input = validate(text, date)?;
        let task = self
            .tasks
            .iter_mut()
            .find(|task| &task.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;

        task.text = input.text;
        task.date = input.date;
        let updated = task.clone();
        info!(date = %updated.date, "updated task");
        Ok(self.commit(updated))
    }

    /// Removes the task if present. An absent id is a no-op that returns
    /// `None` and skips the write.
    #[tracing::instrument(skip(self))]
    pub fn delete(&mut self, id: &TaskId) -> Committed<Option<Task>> {
        let Some(idx) = self.tasks.iter().position(|task| &task.id == id) else {
            debug!("delete of unknown id ignored");
            return Committed {
                value: None,
                persist_error: None,
            };
        };

        let removed = self.tasks.remove(idx);
        info!(remaining = self.tasks.len(), "deleted task");
        self.commit(Some(removed))
    }

    #[tracing::instrument(skip(self))]
    pub fn set_completed(
        &mut self,
        id: &TaskId,
        completed: bool,
    ) -> Result<Committed<Task>, TaskError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|task| &task.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        task.completed = completed;
        let updated = task.clone();
        Ok(self.commit(updated))
    }

    /// Insertion order.
    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    pub fn find_by_id(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    /// Exact id, or a prefix matching exactly one task.
    pub fn resolve_id(&self, raw: &str) -> Option<TaskId> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Some(task) = self.tasks.iter().find(|task| task.id.as_str() == raw) {
            return Some(task.id.clone());
        }

        let mut matches = self.tasks.iter().filter(|task| task.id.as_str().starts_with(raw));
        match (matches.next(), matches.next()) {
            (Some(task), None) => Some(task.id.clone()),
            (Some(_), Some(_)) => {
                debug!(prefix = %raw, "ambiguous id prefix");
                None
            }
            _ => None,
        }
    }

    pub fn by_date(&self, date: NaiveDate) -> Vec<&Task> {
        self.tasks.iter().filter(|task| task.date == date).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    fn commit<T>(&mut self, value: T) -> Committed<T> {
        Committed {
            value,
            persist_error: self.save().err(),
        }
    }

    fn fresh_id(&self) -> TaskId {
        loop {
            let id = TaskId::generate();
            if self.find_by_id(&id).is_none() {
                return id;
            }
            warn!(id = %id, "generated id collided; retrying");
        }
    }
}

/// Parses a stored payload. Blank payloads are an empty collection;
/// duplicate ids keep the first record and blank-text records are dropped.
pub fn decode_tasks(raw: &str) -> Result<Vec<Task>, TaskError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let parsed: Vec<Task> = serde_json::from_str(raw)
        .map_err(|err| TaskError::PersistenceReadCorrupt(err.to_string()))?;

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(parsed.len());
    for mut task in parsed {
        let trimmed = task.text.trim();
        if trimmed.is_empty() {
            warn!(id = %task.id, "dropping stored task with empty text");
            continue;
        }
        if !seen.insert(task.id.clone()) {
            warn!(id = %task.id, "dropping stored task with duplicate id");
            continue;
        }
        if trimmed.len() != task.text.len() {
            task.text = trimmed.to_string();
        }
        out.push(task);
    }

    debug!(count = out.len(), "decoded stored tasks");
    Ok(out)
}

pub fn encode_tasks(tasks: &[Task]) -> Result<String, TaskError> {
    serde_json::to_string(tasks).map_err(|err| TaskError::PersistenceWriteFailed(err.to_string()))
}
