use std::io::{self, IsTerminal, Write};

use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::controller::{CalendarView, ListRow, ViewModel};
use crate::locale::{Locale, Message};

const SHORT_ID_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    locale: Locale,
}

impl Renderer {
    pub fn new(cfg: &Config, locale: Locale) -> anyhow::Result<Self> {
        let color = cfg.get_bool("color")?.unwrap_or(true);

        Ok(Self {
            color: color && io::stdout().is_terminal(),
            locale,
        })
    }

    pub fn plain(locale: Locale) -> Self {
        Self {
            color: false,
            locale,
        }
    }

    #[tracing::instrument(skip(self, view))]
    pub fn print_view(&mut self, view: &ViewModel) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_view(&mut out, view)
    }

    pub fn write_view<W: Write>(&self, out: &mut W, view: &ViewModel) -> anyhow::Result<()> {
        match view {
            ViewModel::List(rows) => self.write_list(out, rows),
            ViewModel::Calendar(calendar) => self.write_calendar(out, calendar),
        }
    }

    fn write_list<W: Write>(&self, out: &mut W, rows: &[ListRow]) -> anyhow::Result<()> {
        if rows.is_empty() {
            writeln!(out, "{}", self.locale.message(Message::EmptyList))?;
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            "Date".to_string(),
            "Task".to_string(),
            "Done".to_string(),
        ];

        let rows = rows
            .iter()
            .map(|row| {
                let id: String = row.id.as_str().chars().take(SHORT_ID_LEN).collect();
                let done = if row.completed { "x" } else { "" };
                vec![
                    self.paint(&id, "33"),
                    row.date_label.clone(),
                    row.text.clone(),
                    done.to_string(),
                ]
            })
            .collect();

        write_table(out, headers, rows)
    }

    fn write_calendar<W: Write>(&self, out: &mut W, calendar: &CalendarView) -> anyhow::Result<()> {
        writeln!(out, "{}", calendar.title)?;
        writeln!(out)?;

        let headers: Vec<String> = calendar
            .weekday_labels
            .iter()
            .map(|label| label.to_string())
            .collect();

        let mut rows: Vec<Vec<String>> = Vec::new();
        for week in calendar.model.weeks() {
            rows.push(
                week.iter()
                    .map(|cell| {
                        let day = if cell.is_today {
                            format!("[{}]", cell.day())
                        } else {
                            cell.day().to_string()
                        };
                        if cell.is_today {
                            self.paint(&day, "1;36")
                        } else if !cell.in_current_month {
                            self.paint(&day, "2")
                        } else {
                            day
                        }
                    })
                    .collect(),
            );

            let depth = week.iter().map(|cell| cell.entries.len()).max().unwrap_or(0);
            for line in 0..depth {
                rows.push(
                    week.iter()
                        .map(|cell| {
                            cell.entries
                                .get(line)
                                .map(|entry| entry.label.clone())
                                .unwrap_or_default()
                        })
                        .collect(),
                );
            }
        }

        write_table(out, headers, rows)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = pad_width(&headers[idx], widths[idx]))?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, width) in widths.iter().enumerate() {
            let cell = row.get(idx).map(String::as_str).unwrap_or("");
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

// `{:width$}` pads by char count; wide glyphs need the difference added back.
fn pad_width(text: &str, display_width: usize) -> usize {
    let chars = text.chars().count();
    let visible = UnicodeWidthStr::width(text);
    display_width.saturating_sub(visible) + chars
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{Renderer, strip_ansi};
    use crate::config::Config;
    use crate::controller::{CalendarView, ListRow, ViewModel};
    use crate::locale::Locale;
    use crate::navigator::CalendarCursor;
    use crate::projector::project_calendar;
    use crate::task::{Task, TaskId};

    fn render(view: &ViewModel, locale: Locale) -> String {
        let mut out = Vec::new();
        Renderer::plain(locale)
            .write_view(&mut out, view)
            .expect("render");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn empty_list_shows_hint() {
        assert_eq!(
            render(&ViewModel::List(vec![]), Locale::Ko),
            "할 일이 없습니다. 새로운 할 일을 추가해보세요!\n"
        );
    }

    #[test]
    fn list_rows_use_short_ids() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).expect("date");
        let view = ViewModel::List(vec![ListRow {
            id: TaskId::from("0123456789abcdef"),
            text: "stretch".to_string(),
            date,
            date_label: "Wed, May 1, 2024".to_string(),
            completed: true,
        }]);
        let text = render(&view, Locale::En);
        let last = text.lines().last().expect("row line");
        assert!(last.starts_with("01234567 "));
        assert!(last.contains("stretch"));
        assert!(!text.contains("89abcdef"));
    }

    #[test]
    fn calendar_prints_title_and_labels() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 14).expect("date");
        let tasks = vec![Task::new(TaskId::from("1"), "valentine dinner".to_string(), date)];
        let view = ViewModel::Calendar(CalendarView {
            title: "February 2024".to_string(),
            weekday_labels: Locale::En.weekday_labels(),
            model: project_calendar(CalendarCursor { year: 2024, month: 1 }, &tasks, date),
        });
        let text = render(&view, Locale::En);
        assert!(text.starts_with("February 2024\n"));
        assert!(text.contains("[14]"));
        assert!(text.contains("valentin..."));
        assert!(text.contains("Sun"));
    }

    #[test]
    fn color_setting_goes_through_config() {
        let mut cfg = Config::default();
        cfg.apply_overrides(vec![("color".to_string(), "off".to_string())]);
        let renderer = Renderer::new(&cfg, Locale::En).expect("renderer");
        assert!(!renderer.color);

        cfg.apply_overrides(vec![("color".to_string(), "sometimes".to_string())]);
        assert!(Renderer::new(&cfg, Locale::En).is_err());
    }

    #[test]
    fn strip_ansi_removes_escapes() {
        assert_eq!(strip_ansi("\x1b[33mabc\x1b[0m"), "abc");
    }
}
