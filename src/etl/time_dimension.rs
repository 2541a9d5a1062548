use crate::warehouse::TimeRow;
use chrono::{DateTime, Datelike, Timelike, Utc};

/// Calendar fields of a play's start instant: ISO week number, calendar
/// year and a Monday-based weekday.
pub fn time_row(start_time: DateTime<Utc>) -> TimeRow {
    TimeRow {
        start_time,
        hour: start_time.hour(),
        day: start_time.day(),
        week: start_time.iso_week().week(),
        month: start_time.month(),
        year: start_time.year(),
        weekday: start_time.weekday().num_days_from_monday(),
    }
}

pub fn time_row_from_millis(ts: i64) -> Option<TimeRow> {
    DateTime::from_timestamp_millis(ts).map(time_row)
}
