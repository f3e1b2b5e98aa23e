use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::controller::ViewMode;
use crate::locale::Locale;
use crate::store::DEFAULT_STORAGE_KEY;

pub const CONFIG_ENV_VAR: &str =
  "ALMANACRC";

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    map.insert(
      "data.location".to_string(),
      "~/.almanac".to_string()
    );
    map.insert(
      "storage.key".to_string(),
      DEFAULT_STORAGE_KEY.to_string()
    );
    map.insert(
      "locale".to_string(),
      "en".to_string()
    );
    map.insert(
      "color".to_string(),
      "on".to_string()
    );
    map.insert(
      "default.view".to_string(),
      "list".to_string()
    );
    Self { map }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let rc = resolve_rc_path(rc_override)?;
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading almanacrc");
      cfg.load_file(&path)?;
    } else {
      debug!(
        "no almanacrc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  /// `None` when unset; an
  /// unrecognized value is an error.
  pub fn get_bool(
    &self,
    key: &str
  ) -> anyhow::Result<Option<bool>> {
    let Some(raw) = self.map.get(key)
    else {
      return Ok(None);
    };
    parse_bool(raw).map(Some).ok_or_else(
      || {
        anyhow!(
          "invalid boolean for {key}: \
           {raw}"
        )
      }
    )
  }

  pub fn locale(
    &self
  ) -> anyhow::Result<Locale> {
    self
      .get("locale")
      .unwrap_or_else(|| "en".to_string())
      .parse()
  }

  pub fn default_view(
    &self
  ) -> anyhow::Result<ViewMode> {
    self
      .get("default.view")
      .unwrap_or_else(|| {
        "list".to_string()
      })
      .parse()
  }

  pub fn storage_key(&self) -> String {
    self
      .get("storage.key")
      .map(|key| key.trim().to_string())
      .filter(|key| !key.is_empty())
      .unwrap_or_else(|| {
        DEFAULT_STORAGE_KEY.to_string()
      })
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    for (idx, raw_line) in
      text.lines().enumerate()
    {
      let line = raw_line
        .split('#')
        .next()
        .unwrap_or_default()
        .trim();
      if line.is_empty() {
        continue;
      }

      let Some((k, v)) =
        line.split_once('=')
      else {
        return Err(anyhow!(
          "{}:{}: expected key = \
           value, got: {}",
          path.display(),
          idx + 1,
          raw_line.trim()
        ));
      };

      let key = k.trim();
      if key.is_empty() {
        return Err(anyhow!(
          "{}:{}: missing key",
          path.display(),
          idx + 1
        ));
      }
      trace!(key, value = v.trim(), "rc setting");
      self.map.insert(
        key.to_string(),
        v.trim().to_string()
      );
    }

    debug!(
      rc = %path.display(),
      keys = self.map.len(),
      "loaded almanacrc"
    );
    Ok(())
  }
}

#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  let dir = if let Some(path) =
    override_dir
  {
    path.to_path_buf()
  } else if let Some(cfg_value) =
    cfg.get("data.location")
  {
    expand_tilde(Path::new(&cfg_value))
  } else {
    default_data_dir()?
  };

  if !dir.exists() {
    info!(dir = %dir.display(), "creating data directory");
    fs::create_dir_all(&dir)
      .with_context(|| {
        format!(
          "failed to create {}",
          dir.display()
        )
      })?;
  }

  Ok(dir)
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var(CONFIG_ENV_VAR)
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory; skipping almanacrc"
    );
    return Ok(None);
  };
  let candidate =
    home.join(".almanacrc");
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn default_data_dir()
-> anyhow::Result<PathBuf> {
  let home = dirs::home_dir()
    .ok_or_else(|| {
      anyhow!(
        "cannot determine home \
         directory"
      )
    })?;
  Ok(home.join(".almanac"))
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(
  raw: &str
) -> Option<bool> {
  match raw
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Some(true),
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::tempdir;

  use super::{
    Config,
    resolve_data_dir
  };
  use crate::controller::ViewMode;
  use crate::locale::Locale;

  #[test]
  fn defaults_cover_every_key() {
    let cfg = Config::default();
    assert_eq!(
      cfg.storage_key(),
      "todos"
    );
    assert_eq!(
      cfg.locale().expect("locale"),
      Locale::En
    );
    assert_eq!(
      cfg
        .default_view()
        .expect("view"),
      ViewMode::List
    );
    assert_eq!(
      cfg
        .get_bool("color")
        .expect("color"),
      Some(true)
    );
    assert_eq!(
      cfg
        .get_bool("missing")
        .expect("unset"),
      None
    );
  }

  #[test]
  fn loads_rc_file_with_comments() {
    let temp =
      tempdir().expect("tempdir");
    let rc = temp.path().join("main.rc");
    fs::write(
      &rc,
      "# almanac settings\nlocale = \
       ko   # korean ui\n\n\
       default.view=calendar\n\
       storage.key = work-todos\n"
    )
    .expect("write rc");

    let cfg = Config::load(Some(&rc))
      .expect("load config");
    assert_eq!(
      cfg.locale().expect("locale"),
      Locale::Ko
    );
    assert_eq!(
      cfg
        .default_view()
        .expect("view"),
      ViewMode::Calendar
    );
    assert_eq!(
      cfg.storage_key(),
      "work-todos"
    );
  }

  #[test]
  fn bad_booleans_are_reported() {
    let mut cfg = Config::default();
    cfg.apply_overrides(vec![(
      "rc.color".to_string(),
      "maybe".to_string()
    )]);
    assert!(
      cfg.get_bool("color").is_err()
    );
  }

  #[test]
  fn rejects_lines_without_equals() {
    let temp =
      tempdir().expect("tempdir");
    let rc = temp.path().join("bad.rc");
    fs::write(&rc, "locale ko\n")
      .expect("write rc");
    assert!(
      Config::load(Some(&rc)).is_err()
    );

    fs::write(&rc, " = ko\n")
      .expect("write rc");
    assert!(
      Config::load(Some(&rc)).is_err()
    );
  }

  #[test]
  fn overrides_strip_rc_prefix() {
    let mut cfg = Config::default();
    cfg.apply_overrides(vec![(
      "rc.locale".to_string(),
      "ko".to_string()
    )]);
    assert_eq!(
      cfg.get("locale").as_deref(),
      Some("ko")
    );
  }

  #[test]
  fn data_dir_override_is_created() {
    let temp =
      tempdir().expect("tempdir");
    let target =
      temp.path().join("nested/data");
    let dir = resolve_data_dir(
      &Config::default(),
      Some(&target)
    )
    .expect("resolve");
    assert_eq!(dir, target);
    assert!(target.is_dir());
  }
}
