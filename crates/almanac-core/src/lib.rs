pub mod cli;
pub mod config;
pub mod controller;
pub mod dates;
pub mod edit;
pub mod error;
pub mod kv;
pub mod locale;
pub mod navigator;
pub mod projector;
pub mod render;
pub mod store;
pub mod task;

use std::ffi::OsString;

use anyhow::{
  Context,
  anyhow
};
use clap::Parser;
use tracing::{
  debug,
  info
};

use crate::cli::{
  Action,
  StderrSink,
  TerminalGate
};
use crate::controller::{
  App,
  Command,
  ConfirmGate,
  NotificationSink,
  Outcome,
  ViewMode,
  ViewModel
};
use crate::kv::KeyValueStore;
use crate::navigator::{
  CalendarCursor,
  CalendarNavigator
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting almanac"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let backend =
    kv::FileStore::open(&data_dir)
      .with_context(|| {
        format!(
          "failed to open task storage \
           at {}",
          data_dir.display()
        )
      })?;
  let store = store::TaskStore::open(
    backend,
    &cfg.storage_key()
  );

  let locale = cfg.locale()?;
  let mut app = App::new(
    store,
    CalendarNavigator::at_today(),
    cfg.default_view()?,
    locale
  );
  let mut renderer =
    render::Renderer::new(&cfg, locale)?;

  let assume_yes = matches!(
    cli.action,
    Some(Action::Delete { yes: true, .. })
  );
  let view = execute(
    &mut app,
    cli.action,
    &mut TerminalGate {
      assume_yes
    },
    &mut StderrSink
  )?;

  renderer.print_view(&view)?;

  info!("done");
  Ok(())
}

/// Translates one CLI action into
/// controller commands and returns the
/// view to paint.
pub fn execute<S: KeyValueStore>(
  app: &mut App<S>,
  action: Option<Action>,
  gate: &mut dyn ConfirmGate,
  sink: &mut dyn NotificationSink
) -> anyhow::Result<ViewModel> {
  let commands = match action {
    | None => vec![],
    | Some(Action::Add {
      date,
      text
    }) => {
      let date = date.unwrap_or_else(
        || dates::date_key(dates::today())
      );
      vec![Command::AddTask {
        text: text.join(" "),
        date
      }]
    }
    | Some(Action::List) => {
      vec![Command::SwitchView {
        view: ViewMode::List
      }]
    }
    | Some(Action::Calendar {
      month,
      shift
    }) => {
      let mut commands =
        vec![Command::SwitchView {
          view: ViewMode::Calendar
        }];
      let mut delta = shift;
      if let Some(raw) = month {
        let target =
          parse_month(&raw)?;
        let current =
          app.navigator().cursor();
        delta = delta.saturating_add(
          months_between(current, target)
        );
      }
      if delta != 0 {
        commands.push(
          Command::NavigateMonth {
            delta
          }
        );
      }
      commands
    }
    | Some(Action::Edit {
      id,
      text,
      date
    }) => {
      let id = resolve(app, &id);
      let begun = app.dispatch(
        Command::BeginEdit {
          id
        },
        gate,
        sink
      );
      finish(&begun.outcome)?;

      let Some(draft) = app.edit().draft()
      else {
        return Err(anyhow!(
          "edit session did not open"
        ));
      };
      let text = text.unwrap_or_else(
        || draft.draft_text.clone()
      );
      let date =
        date.unwrap_or_else(|| {
          dates::date_key(
            draft.draft_date
          )
        });
      vec![Command::CommitEdit {
        text,
        date
      }]
    }
    | Some(Action::Delete {
      id,
      ..
    }) => {
      vec![Command::DeleteTask {
        id: resolve(app, &id)
      }]
    }
    | Some(Action::Done { id }) => {
      vec![Command::SetCompleted {
        id:        resolve(app, &id),
        completed: true
      }]
    }
    | Some(Action::Undone { id }) => {
      vec![Command::SetCompleted {
        id:        resolve(app, &id),
        completed: false
      }]
    }
  };

  for command in commands {
    let dispatched =
      app.dispatch(command, gate, sink);
    finish(&dispatched.outcome)?;
  }

  Ok(app.render_model())
}

fn resolve<S: KeyValueStore>(
  app: &App<S>,
  raw: &str
) -> task::TaskId {
  app
    .store()
    .resolve_id(raw)
    .unwrap_or_else(|| raw.into())
}

fn finish(
  outcome: &Outcome
) -> anyhow::Result<()> {
  match outcome {
    | Outcome::Rejected(err) => {
      Err(anyhow!(err.clone()))
    }
    | Outcome::Applied
    | Outcome::Unsaved(_)
    | Outcome::Declined => Ok(())
  }
}

fn parse_month(
  raw: &str
) -> anyhow::Result<CalendarCursor> {
  let first = dates::parse_date_key(
    &format!("{}-01", raw.trim())
  )
  .ok_or_else(|| {
    anyhow!(
      "expected month as YYYY-MM, got: \
       {raw}"
    )
  })?;
  Ok(CalendarCursor::containing(first))
}

fn months_between(
  from: CalendarCursor,
  to: CalendarCursor
) -> i64 {
  (i64::from(to.year)
    - i64::from(from.year))
    * 12
    + i64::from(to.month)
    - i64::from(from.month)
}

#[cfg(test)]
mod tests {
  use super::{
    execute,
    months_between,
    parse_month
  };
  use crate::cli::Action;
  use crate::controller::{
    App,
    ConfirmGate,
    ViewMode
  };
  use crate::kv::MemoryStore;
  use crate::locale::Locale;
  use crate::navigator::{
    CalendarCursor,
    CalendarNavigator,
    cursor_bounds
  };
  use crate::store::{
    DEFAULT_STORAGE_KEY,
    TaskStore
  };

  struct Yes;

  impl ConfirmGate for Yes {
    fn confirm(
      &mut self,
      _message: &str
    ) -> bool {
      true
    }
  }

  #[test]
  fn parses_month_argument() {
    assert_eq!(
      parse_month("2024-02")
        .expect("month"),
      CalendarCursor {
        year:  2024,
        month: 1
      }
    );
    assert!(
      parse_month("2024-13").is_err()
    );
    assert!(
      parse_month("feb").is_err()
    );
  }

  #[test]
  fn extreme_shift_with_month_stays_in_range() {
    let mut app = App::new(
      TaskStore::open(
        MemoryStore::new(),
        DEFAULT_STORAGE_KEY
      ),
      CalendarNavigator::new(
        CalendarCursor {
          year:  2024,
          month: 0
        }
      ),
      ViewMode::List,
      Locale::En
    );
    let mut sink: Vec<String> =
      Vec::new();

    execute(
      &mut app,
      Some(Action::Calendar {
        month: Some(
          "2030-06".to_string()
        ),
        shift: i64::MAX
      }),
      &mut Yes,
      &mut sink
    )
    .expect("calendar");
    assert_eq!(
      app.navigator().cursor(),
      cursor_bounds().1
    );

    execute(
      &mut app,
      Some(Action::Calendar {
        month: None,
        shift: i64::MIN
      }),
      &mut Yes,
      &mut sink
    )
    .expect("calendar");
    assert_eq!(
      app.navigator().cursor(),
      cursor_bounds().0
    );
    assert!(sink.is_empty());
  }

  #[test]
  fn counts_months_across_years() {
    let from = CalendarCursor {
      year:  2024,
      month: 10
    };
    let to = CalendarCursor {
      year:  2025,
      month: 1
    };
    assert_eq!(
      months_between(from, to),
      3
    );
    assert_eq!(
      months_between(to, from),
      -3
    );
  }
}
