use chrono::{
  Datelike,
  Duration,
  Local,
  NaiveDate
};
use regex::Regex;

use crate::locale::Locale;

pub const DATE_KEY_FORMAT: &str =
  "%Y-%m-%d";

const MONTH_NAMES: [&str; 12] = [
  "January",
  "February",
  "March",
  "April",
  "May",
  "June",
  "July",
  "August",
  "September",
  "October",
  "November",
  "December"
];

/// Today's date on the local clock.
#[must_use]
pub fn today() -> NaiveDate {
  Local::now().date_naive()
}

/// Canonical zero-padded `YYYY-MM-DD`.
#[must_use]
pub fn date_key(
  date: NaiveDate
) -> String {
  date
    .format(DATE_KEY_FORMAT)
    .to_string()
}

/// Parses only the canonical key form;
/// `2024-5-1` and trailing time parts
/// are rejected.
pub fn parse_date_key(
  raw: &str
) -> Option<NaiveDate> {
  let trimmed = raw.trim();
  let key_re =
    Regex::new(r"^\d{4}-\d{2}-\d{2}$")
      .ok()?;
  if !key_re.is_match(trimmed) {
    tracing::debug!(
      raw = %trimmed,
      "rejected non-canonical date key"
    );
    return None;
  }

  NaiveDate::parse_from_str(
    trimmed,
    DATE_KEY_FORMAT
  )
  .ok()
}

#[must_use]
pub fn is_today(
  date: NaiveDate,
  today: NaiveDate
) -> bool {
  date == today
}

#[must_use]
pub fn weekday_labels(
  locale: Locale
) -> [&'static str; 7] {
  locale.weekday_labels()
}

#[must_use]
pub fn weekday_label(
  date: NaiveDate,
  locale: Locale
) -> &'static str {
  let idx = date
    .weekday()
    .num_days_from_sunday()
    as usize;
  locale.weekday_labels()[idx]
}

/// Human-readable date for list rows.
#[must_use]
pub fn format_display(
  date: NaiveDate,
  locale: Locale
) -> String {
  let weekday =
    weekday_label(date, locale);
  match locale {
    | Locale::En => {
      format!(
        "{weekday}, {} {}, {}",
        month_name(date.month0()),
        date.day(),
        date.year()
      )
    }
    | Locale::Ko => {
      format!(
        "{}년 {}월 {}일 ({weekday})",
        date.year(),
        date.month(),
        date.day()
      )
    }
  }
}

/// Calendar header; `month0` is
/// zero-based.
#[must_use]
pub fn month_title(
  year: i32,
  month0: u32,
  locale: Locale
) -> String {
  match locale {
    | Locale::En => {
      format!(
        "{} {year}",
        month_name(month0)
      )
    }
    | Locale::Ko => {
      format!("{year}년 {}월", month0 + 1)
    }
  }
}

fn month_name(
  month0: u32
) -> &'static str {
  MONTH_NAMES
    .get(month0 as usize)
    .copied()
    .unwrap_or("")
}

pub fn first_day_of_month(
  year: i32,
  month0: u32
) -> Option<NaiveDate> {
  NaiveDate::from_ymd_opt(
    year,
    month0 + 1,
    1
  )
}

/// Saturates at `NaiveDate::MIN`/`MAX`.
#[must_use]
pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  Duration::try_days(days)
    .and_then(|delta| {
      date.checked_add_signed(delta)
    })
    .unwrap_or(if days < 0 {
      NaiveDate::MIN
    } else {
      NaiveDate::MAX
    })
}

/// The Sunday on or before `day`.
#[must_use]
pub fn start_of_week_sunday(
  day: NaiveDate
) -> NaiveDate {
  let diff = day
    .weekday()
    .num_days_from_sunday()
    as i64;
  add_days(day, -diff)
}

pub mod date_key_serde {
  use chrono::NaiveDate;
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  pub fn serialize<S>(
    date: &NaiveDate,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer
      .serialize_str(&super::date_key(*date))
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<NaiveDate, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = String::deserialize(
      deserializer
    )?;
    super::parse_date_key(&raw)
      .ok_or_else(|| {
        serde::de::Error::custom(
          format!(
            "invalid date key: {raw}"
          )
        )
      })
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    Datelike,
    NaiveDate,
    Weekday
  };

  use super::{
    add_days,
    date_key,
    format_display,
    is_today,
    month_title,
    parse_date_key,
    start_of_week_sunday
  };
  use crate::locale::Locale;

  fn ymd(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn date_key_is_zero_padded() {
    assert_eq!(
      date_key(ymd(2024, 5, 1)),
      "2024-05-01"
    );
  }

  #[test]
  fn parses_only_canonical_keys() {
    assert_eq!(
      parse_date_key("2024-02-29"),
      Some(ymd(2024, 2, 29))
    );
    assert_eq!(
      parse_date_key("2024-5-1"),
      None
    );
    assert_eq!(
      parse_date_key(
        "2024-05-01T00:00:00"
      ),
      None
    );
    assert_eq!(
      parse_date_key("2023-02-29"),
      None
    );
    assert_eq!(parse_date_key(""), None);
  }

  #[test]
  fn formats_display_dates() {
    assert_eq!(
      format_display(
        ymd(2024, 5, 1),
        Locale::En
      ),
      "Wed, May 1, 2024"
    );
    assert_eq!(
      format_display(
        ymd(2024, 5, 1),
        Locale::Ko
      ),
      "2024년 5월 1일 (수)"
    );
  }

  #[test]
  fn month_titles_use_zero_based_month()
  {
    assert_eq!(
      month_title(2024, 1, Locale::En),
      "February 2024"
    );
    assert_eq!(
      month_title(2024, 11, Locale::Ko),
      "2024년 12월"
    );
  }

  #[test]
  fn week_starts_on_sunday() {
    let start =
      start_of_week_sunday(ymd(
        2024, 2, 1
      ));
    assert_eq!(start, ymd(2024, 1, 28));
    assert_eq!(
      start.weekday(),
      Weekday::Sun
    );
    assert_eq!(
      start_of_week_sunday(ymd(
        2024, 9, 1
      )),
      ymd(2024, 9, 1)
    );
  }

  #[test]
  fn add_days_saturates_at_the_range_edges()
  {
    assert_eq!(
      add_days(ymd(2024, 2, 28), 2),
      ymd(2024, 3, 1)
    );
    assert_eq!(
      add_days(NaiveDate::MAX, 1),
      NaiveDate::MAX
    );
    assert_eq!(
      add_days(NaiveDate::MIN, -1),
      NaiveDate::MIN
    );
    assert_eq!(
      add_days(ymd(2024, 1, 1), i64::MIN),
      NaiveDate::MIN
    );
  }

  #[test]
  fn today_check_compares_days() {
    let day = ymd(2026, 2, 17);
    assert!(is_today(day, day));
    assert!(!is_today(
      day,
      ymd(2026, 2, 18)
    ));
  }
}
