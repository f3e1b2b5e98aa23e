use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::dates;
use crate::edit::EditSession;
use crate::error::{Invalid, TaskError};
use crate::kv::KeyValueStore;
use crate::locale::{Locale, Message};
use crate::navigator::CalendarNavigator;
use crate::projector::{self, CalendarModel};
use crate::store::{Committed, TaskStore};
use crate::task::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    List,
    Calendar,
}

impl FromStr for ViewMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "list" => Ok(Self::List),
            "calendar" => Ok(Self::Calendar),
            other => Err(anyhow!("unknown view: {other}")),
        }
    }
}

/// One user action. Dates arrive as raw `YYYY-MM-DD` input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddTask { text: String, date: String },
    DeleteTask { id: TaskId },
    BeginEdit { id: TaskId },
    CommitEdit { text: String, date: String },
    CancelEdit,
    NavigateMonth { delta: i64 },
    SwitchView { view: ViewMode },
    SetCompleted { id: TaskId, completed: bool },
}

/// Yes/no gate consulted before a delete.
pub trait ConfirmGate {
    fn confirm(&mut self, message: &str) -> bool;
}

/// Receives validation and persistence feedback meant for the user.
pub trait NotificationSink {
    fn notify(&mut self, message: &str);
}

impl NotificationSink for Vec<String> {
    fn notify(&mut self, message: &str) {
        self.push(message.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Applied in memory but the write failed.
    Unsaved(TaskError),
    /// The confirmation gate said no.
    Declined,
    Rejected(TaskError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub id: TaskId,
    pub text: String,
    pub date: NaiveDate,
    pub date_label: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarView {
    pub title: String,
    pub weekday_labels: [&'static str; 7],
    pub model: CalendarModel,
}

/// Render-ready projection of the current view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewModel {
    List(Vec<ListRow>),
    Calendar(CalendarView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub outcome: Outcome,
    pub view: ViewModel,
}

/// Owns every piece of mutable state and routes commands to it.
#[derive(Debug)]
pub struct App<S> {
    store: TaskStore<S>,
    edit: EditSession,
    navigator: CalendarNavigator,
    view: ViewMode,
    locale: Locale,
    today: NaiveDate,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(store: TaskStore<S>, navigator: CalendarNavigator, view: ViewMode, locale: Locale) -> Self {
        Self {
            store,
            edit: EditSession::new(),
            navigator,
            view,
            locale,
            today: dates::today(),
        }
    }

    /// Pins "today" for the calendar highlight.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    #[tracing::instrument(skip(self, gate, sink))]
    pub fn dispatch(
        &mut self,
        command: Command,
        gate: &mut dyn ConfirmGate,
        sink: &mut dyn NotificationSink,
    ) -> Dispatched {
        let outcome = match command {
            Command::AddTask { text, date } => {
                let result = self.store.create(&text, parse_input_date(&date));
                self.settle(result, sink)
            }
            Command::DeleteTask { id } => self.delete(&id, gate, sink),
            Command::BeginEdit { id } => {
                let begun = self.edit.begin(&self.store, &id).map(|_| ());
                match begun {
                    Ok(()) => Outcome::Applied,
                    Err(err) => self.reject(err, sink),
                }
            }
            Command::CommitEdit { text, date } => {
                let result = self.edit.commit(&mut self.store, &text, parse_input_date(&date));
                self.settle(result, sink)
            }
            Command::CancelEdit => {
                self.edit.cancel();
                Outcome::Applied
            }
            Command::NavigateMonth { delta } => {
                self.navigator.shift_by(delta);
                Outcome::Applied
            }
            Command::SwitchView { view } => {
                info!(?view, "switching view");
                self.view = view;
                Outcome::Applied
            }
            Command::SetCompleted { id, completed } => {
                let result = self.store.set_completed(&id, completed);
                self.settle(result, sink)
            }
        };

        debug!(?outcome, "command handled");
        Dispatched {
            outcome,
            view: self.render_model(),
        }
    }

    /// Projects the current view from the store.
    pub fn render_model(&self) -> ViewModel {
        match self.view {
            ViewMode::List => ViewModel::List(
                projector::project_list(self.store.all())
                    .into_iter()
                    .map(|task| ListRow {
                        id: task.id.clone(),
                        text: task.text.clone(),
                        date: task.date,
                        date_label: dates::format_display(task.date, self.locale),
                        completed: task.completed,
                    })
                    .collect(),
            ),
            ViewMode::Calendar => {
                let cursor = self.navigator.cursor();
                ViewModel::Calendar(CalendarView {
                    title: dates::month_title(cursor.year, cursor.month, self.locale),
                    weekday_labels: dates::weekday_labels(self.locale),
                    model: projector::project_calendar(cursor, self.store.all(), self.today),
                })
            }
        }
    }

    pub fn store(&self) -> &TaskStore<S> {
        &self.store
    }

    pub fn edit(&self) -> &EditSession {
        &self.edit
    }

    pub fn navigator(&self) -> &CalendarNavigator {
        &self.navigator
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    fn delete(&mut self, id: &TaskId, gate: &mut dyn ConfirmGate, sink: &mut dyn NotificationSink) -> Outcome {
        if self.store.find_by_id(id).is_none() {
            return self.reject(TaskError::NotFound(id.to_string()), sink);
        }
        if !gate.confirm(self.locale.message(Message::ConfirmDelete)) {
            debug!(id = %id, "delete declined");
            return Outcome::Declined;
        }

        if self.edit.target_id() == Some(id) {
            self.edit.cancel();
        }
        let committed = self.store.delete(id);
        self.settle(Ok(committed), sink)
    }

    fn settle<T>(&self, result: Result<Committed<T>, TaskError>, sink: &mut dyn NotificationSink) -> Outcome {
        match result {
            Ok(Committed { persist_error: None, .. }) => Outcome::Applied,
            Ok(Committed { persist_error: Some(err), .. }) => {
                warn!(error = %err, "change kept in memory only");
                sink.notify(self.locale.message(Message::SaveFailed));
                Outcome::Unsaved(err)
            }
            Err(err) => self.reject(err, sink),
        }
    }

    fn reject(&self, err: TaskError, sink: &mut dyn NotificationSink) -> Outcome {
        let message = match &err {
            TaskError::ValidationFailed(Invalid::EmptyText) => Message::EmptyText,
            TaskError::ValidationFailed(Invalid::MissingDate) => Message::MissingDate,
            TaskError::NotFound(_) => Message::NotFound,
            TaskError::NoActiveEdit => Message::NoActiveEdit,
            TaskError::PersistenceWriteFailed(_) | TaskError::PersistenceReadCorrupt(_) => {
                Message::SaveFailed
            }
        };
        debug!(error = %err, "command rejected");
        sink.notify(self.locale.message(message));
        Outcome::Rejected(err)
    }
}

/// Blank or malformed input both count as a missing date.
fn parse_input_date(raw: &str) -> Option<NaiveDate> {
    if raw.trim().is_empty() {
        return None;
    }
    dates::parse_date_key(raw)
}
