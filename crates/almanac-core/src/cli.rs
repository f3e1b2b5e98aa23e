use std::ffi::OsString;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::controller::{ConfirmGate, NotificationSink};

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "almanac",
    version,
    about = "Almanac: a task list with list and month-calendar views",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    #[arg(long = "data")]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub action: Option<Action>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Add a task; the date defaults to today.
    Add {
        #[arg(short = 'd', long = "date")]
        date: Option<String>,

        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// Show tasks ordered by date.
    List,
    /// Show a month grid.
    Calendar {
        /// Month as YYYY-MM; defaults to the current month.
        #[arg(long = "month")]
        month: Option<String>,

        /// Months to move from the starting month.
        #[arg(long = "shift", allow_hyphen_values = true, default_value_t = 0)]
        shift: i64,
    },
    /// Change a task's text and/or date.
    Edit {
        id: String,

        #[arg(short = 't', long = "text")]
        text: Option<String>,

        #[arg(short = 'd', long = "date")]
        date: Option<String>,
    },
    /// Delete a task after confirmation.
    Delete {
        id: String,

        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
    /// Mark a task completed.
    Done { id: String },
    /// Clear a task's completed mark.
    Undone { id: String },
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Global options that take the next argv word as their value.
const VALUE_OPTIONS: [&str; 3] = ["--rc", "--config", "--data"];

/// Pulls positional `rc.key=value` / `rc.key:value` overrides out of argv.
///
/// Only words ahead of the subcommand are considered; everything from the
/// subcommand (or a `--`) onwards is passed through untouched so task text
/// keeps words that merely look like overrides.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    let mut pending_value = false;
    for arg in iter.by_ref() {
        let s = arg.to_string_lossy().into_owned();

        if pending_value {
            pending_value = false;
            cleaned.push(arg);
            continue;
        }
        if s == "--" {
            cleaned.push(arg);
            break;
        }
        if s.starts_with('-') {
            pending_value = VALUE_OPTIONS.contains(&s.as_str());
            cleaned.push(arg);
            continue;
        }
        if let Some((k, v)) = split_rc_override(&s) {
            debug!(key = %k, value = %v, "captured positional rc override");
            overrides.push((k, v));
            continue;
        }

        // First bare word is the subcommand.
        cleaned.push(arg);
        break;
    }
    cleaned.extend(iter);

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

fn split_rc_override(word: &str) -> Option<(String, String)> {
    let rest = word.strip_prefix("rc.")?;
    let (k, v) = rest.split_once('=').or_else(|| rest.split_once(':'))?;
    Some((format!("rc.{k}"), v.to_string()))
}

/// Asks on the terminal; `--yes` or a closed stdin short-circuit it.
#[derive(Debug, Clone, Copy)]
pub struct TerminalGate {
    pub assume_yes: bool,
}

impl ConfirmGate for TerminalGate {
    fn confirm(&mut self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        let mut err = io::stderr().lock();
        if write!(err, "{message} [y/N] ").and_then(|_| err.flush()).is_err() {
            return false;
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(err) => {
                warn!(error = %err, "could not read confirmation; treating as no");
                false
            }
        }
    }
}

/// Prints user-facing notices on stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink;

impl NotificationSink for StderrSink {
    fn notify(&mut self, message: &str) {
        eprintln!("almanac: {message}");
    }
}
