use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use crate::dates;
use crate::navigator::CalendarCursor;
use crate::task::{Task, TaskId};

/// Six full weeks.
pub const GRID_CELLS: usize = 42;
pub const CELL_LABEL_MAX_CHARS: usize = 8;
pub const ELLIPSIS: &str = "...";

/// Tasks ordered by date; tasks sharing a date keep collection order.
pub fn project_list(tasks: &[Task]) -> Vec<&Task> {
    let mut ordered: Vec<&Task> = tasks.iter().collect();
    ordered.sort_by_key(|task| task.date);
    ordered
}

/// A task as shown inside a calendar cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEntry {
    pub id: TaskId,
    /// Possibly truncated text for the cell.
    pub label: String,
    /// Untruncated text, the tooltip.
    pub full_text: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub in_current_month: bool,
    pub is_today: bool,
    pub entries: Vec<CellEntry>,
}

impl DayCell {
    pub fn day(&self) -> u32 {
        self.date.day()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarModel {
    pub cursor: CalendarCursor,
    pub grid_start: NaiveDate,
    pub cells: Vec<DayCell>,
}

impl CalendarModel {
    pub fn weeks(&self) -> impl Iterator<Item = &[DayCell]> {
        self.cells.chunks(7)
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&DayCell> {
        self.cells.iter().find(|cell| cell.date == date)
    }
}

/// Builds the month grid for `cursor`. Pure: `today` is passed in rather
/// than read from the clock.
pub fn project_calendar(cursor: CalendarCursor, tasks: &[Task], today: NaiveDate) -> CalendarModel {
    let cursor = cursor.clamped();
    let first = cursor.first_day().unwrap_or(NaiveDate::MIN);
    let grid_start = dates::start_of_week_sunday(first);

    let mut buckets: HashMap<NaiveDate, Vec<&Task>> = HashMap::new();
    for task in tasks {
        buckets.entry(task.date).or_default().push(task);
    }

    let cells = (0..GRID_CELLS as i64)
        .map(|offset| {
            let date = dates::add_days(grid_start, offset);
            let entries: Vec<CellEntry> = buckets
                .get(&date)
                .map(|bucket| bucket.iter().copied().map(cell_entry).collect())
                .unwrap_or_default();
            DayCell {
                date,
                in_current_month: cursor.contains(date),
                is_today: dates::is_today(date, today),
                entries,
            }
        })
        .collect();

    CalendarModel {
        cursor,
        grid_start,
        cells,
    }
}

fn cell_entry(task: &Task) -> CellEntry {
    CellEntry {
        id: task.id.clone(),
        label: truncate_label(&task.text),
        full_text: task.text.clone(),
        completed: task.completed,
    }
}

/// Cuts `text` to `CELL_LABEL_MAX_CHARS` characters plus an ellipsis.
pub fn truncate_label(text: &str) -> String {
    if text.chars().count() <= CELL_LABEL_MAX_CHARS {
        return text.to_string();
    }
    let mut label: String = text.chars().take(CELL_LABEL_MAX_CHARS).collect();
    label.push_str(ELLIPSIS);
    label
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, NaiveDate, Weekday};

    use super::{GRID_CELLS, project_calendar, project_list, truncate_label};
    use crate::dates;
    use crate::navigator::{CalendarCursor, cursor_bounds, shift};
    use crate::task::{Task, TaskId};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn task(id: &str, text: &str, date: NaiveDate) -> Task {
        Task::new(TaskId::from(id), text.to_string(), date)
    }

    #[test]
    fn list_is_stable_by_date() {
        let tasks = vec![
            task("a", "a", ymd(2024, 5, 2)),
            task("b", "b", ymd(2024, 5, 1)),
            task("c", "c", ymd(2024, 5, 1)),
        ];
        let ids: Vec<&str> = project_list(&tasks).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn leap_february_grid() {
        let model = project_calendar(CalendarCursor { year: 2024, month: 1 }, &[], ymd(2024, 2, 14));
        assert_eq!(model.cells.len(), GRID_CELLS);
        assert_eq!(model.cells[0].date, ymd(2024, 1, 28));
        assert_eq!(model.cells[0].date.weekday(), Weekday::Sun);
        assert_eq!(model.cells[41].date, ymd(2024, 3, 9));

        let in_month: Vec<NaiveDate> = model
            .cells
            .iter()
            .filter(|cell| cell.in_current_month)
            .map(|cell| cell.date)
            .collect();
        assert_eq!(in_month.len(), 29);
        assert_eq!(in_month.first(), Some(&ymd(2024, 2, 1)));
        assert_eq!(in_month.last(), Some(&ymd(2024, 2, 29)));

        let today: Vec<_> = model.cells.iter().filter(|cell| cell.is_today).collect();
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].date, ymd(2024, 2, 14));
    }

    #[test]
    fn month_starting_on_sunday_begins_on_the_first() {
        let model = project_calendar(CalendarCursor { year: 2024, month: 8 }, &[], ymd(2000, 1, 1));
        assert_eq!(model.cells[0].date, ymd(2024, 9, 1));
        assert!(model.cells[0].in_current_month);
        assert!(model.cells.iter().all(|cell| !cell.is_today));
    }

    #[test]
    fn buckets_tasks_per_day_in_collection_order() {
        let tasks = vec![
            task("1", "dentist appointment", ymd(2024, 2, 5)),
            task("2", "gym", ymd(2024, 3, 1)),
            task("3", "pay rent", ymd(2024, 2, 5)),
            task("4", "far away", ymd(2024, 6, 1)),
        ];
        let model = project_calendar(CalendarCursor { year: 2024, month: 1 }, &tasks, ymd(2024, 2, 1));

        let cell = model.cell(ymd(2024, 2, 5)).expect("cell in grid");
        let labels: Vec<&str> = cell.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["dentist ...", "pay rent"]);
        assert_eq!(cell.entries[0].full_text, "dentist appointment");

        let boundary = model.cell(ymd(2024, 3, 1)).expect("boundary cell");
        assert!(!boundary.in_current_month);
        assert_eq!(boundary.entries.len(), 1);

        let total: usize = model.cells.iter().map(|c| c.entries.len()).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn projection_is_deterministic() {
        let tasks = vec![task("1", "x", ymd(2024, 12, 31))];
        let cursor = CalendarCursor { year: 2024, month: 11 };
        assert_eq!(
            project_calendar(cursor, &tasks, ymd(2024, 12, 1)),
            project_calendar(cursor, &tasks, ymd(2024, 12, 1))
        );
    }

    #[test]
    fn every_reachable_cursor_yields_a_sunday_grid() {
        let start = CalendarCursor { year: 2024, month: 0 };
        let (lo, hi) = cursor_bounds();
        let cursors = [
            shift(start, i64::MAX),
            shift(start, i64::MIN),
            shift(start, 12 * 300_000),
            shift(start, -12 * 300_000),
            lo,
            hi,
            CalendarCursor { year: i32::MAX, month: 40 },
        ];

        for cursor in cursors {
            let model = project_calendar(cursor, &[], ymd(2024, 1, 1));
            assert_eq!(model.cells.len(), GRID_CELLS);
            assert_eq!(model.cells[0].date.weekday(), Weekday::Sun, "{cursor:?}");
            assert!(
                model
                    .cells
                    .windows(2)
                    .all(|pair| dates::add_days(pair[0].date, 1) == pair[1].date),
                "{cursor:?}"
            );
            assert!(model.cells.iter().any(|cell| cell.in_current_month), "{cursor:?}");
        }
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_label("12345678"), "12345678");
        assert_eq!(truncate_label("123456789"), "12345678...");
        assert_eq!(truncate_label("장보기와 청소하기 계획"), "장보기와 청소하...");
    }

    #[test]
    fn weeks_split_into_rows_of_seven() {
        let model = project_calendar(CalendarCursor { year: 2025, month: 0 }, &[], ymd(2025, 1, 1));
        let rows: Vec<_> = model.weeks().collect();
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|row| row.len() == 7 && row[0].date.weekday() == Weekday::Sun));
    }
}
