use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::TaskError;
use crate::kv::KeyValueStore;
use crate::store::{Committed, TaskStore};
use crate::task::{Task, TaskId, validate};

/// Draft fields of the task being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub target_id: TaskId,
    pub draft_text: String,
    pub draft_date: NaiveDate,
}

/// Tracks at most one in-progress edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSession {
    active: Option<EditDraft>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts editing `id`, replacing any draft already open.
    #[tracing::instrument(skip(self, store))]
    pub fn begin<S: KeyValueStore>(
        &mut self,
        store: &TaskStore<S>,
        id: &TaskId,
    ) -> Result<&EditDraft, TaskError> {
        let task = store
            .find_by_id(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;

        if let Some(previous) = &self.active {
            debug!(previous = %previous.target_id, "replacing open edit");
        }

        Ok(self.active.insert(EditDraft {
            target_id: task.id.clone(),
            draft_text: task.text.clone(),
            draft_date: task.date,
        }))
    }

    /// Applies the edited fields through `TaskStore::update`.
    ///
    /// Invalid input keeps the session open so the caller can retry. Any
    /// other outcome, including a vanished target, closes it.
    #[tracing::instrument(skip(self, store, text))]
    pub fn commit<S: KeyValueStore>(
        &mut self,
        store: &mut TaskStore<S>,
        text: &str,
        date: Option<NaiveDate>,
    ) -> Result<Committed<Task>, TaskError> {
        let Some(draft) = self.active.as_mut() else {
            return Err(TaskError::NoActiveEdit);
        };

        if let Err(err) = validate(text, date) {
            draft.draft_text = text.to_string();
            if let Some(date) = date {
                draft.draft_date = date;
            }
            debug!(error = %err, "edit rejected; session stays open");
            return Err(err);
        }

        let target = draft.target_id.clone();
        self.active = None;
        let outcome = store.update(&target, text, date);
        info!(id = %target, ok = outcome.is_ok(), "edit committed");
        outcome
    }

    pub fn cancel(&mut self) {
        if let Some(draft) = self.active.take() {
            debug!(id = %draft.target_id, "edit cancelled");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn target_id(&self) -> Option<&TaskId> {
        self.active.as_ref().map(|draft| &draft.target_id)
    }

    pub fn draft(&self) -> Option<&EditDraft> {
        self.active.as_ref()
    }
}
