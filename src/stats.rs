//! Per-task time statistics, recomputed from the timer rows on every read.
//!
//! Day and week boundaries are taken in the time zone of `now`, so the same
//! rows can yield different "today" totals for callers in different zones.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use rusqlite::Connection;

use crate::error::Result;
use crate::model::{TaskStatistics, Timer};
use crate::timers::list_task_timers;

/// First instant of `date` in `tz`. When local midnight falls in a DST gap
/// the first representable hour of the day is used instead.
fn local_day_start<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    for hour in 0..24 {
        let Some(naive) = date.and_hms_opt(hour, 0, 0) else {
            continue;
        };
        if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
            return dt.with_timezone(&Utc);
        }
    }
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Start of the calendar day containing `now`.
pub fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    local_day_start(&now.timezone(), now.date_naive())
}

/// Start of the most recent `week_start` day at local midnight (today, if
/// today is `week_start`).
pub fn start_of_week<Tz: TimeZone>(now: &DateTime<Tz>, week_start: Weekday) -> DateTime<Utc> {
    let today = now.date_naive();
    let back = (7 + today.weekday().num_days_from_monday() - week_start.num_days_from_monday()) % 7;
    let first = today
        .checked_sub_days(Days::new(u64::from(back)))
        .unwrap_or(today);
    local_day_start(&now.timezone(), first)
}

/// Start of the calendar day after the one containing `now`.
fn start_of_next_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let today = now.date_naive();
    let next = today.succ_opt().unwrap_or(today);
    local_day_start(&now.timezone(), next)
}

/// Sum of durations of timers started in `[from, until)`.
fn sum_between(timers: &[Timer], from: DateTime<Utc>, until: DateTime<Utc>) -> i64 {
    timers
        .iter()
        .filter(|t| t.start_time >= from && t.start_time < until)
        .map(|t| t.duration.unwrap_or(0))
        .sum()
}

/// Aggregate a task's timers. Running timers count toward `timer_count`
/// only; their elapsed time is not part of any sum. Timers started after
/// `now`'s day count toward the total but not toward today or this week.
pub fn compute_task_statistics<Tz: TimeZone>(
    timers: &[Timer],
    now: &DateTime<Tz>,
    week_start: Weekday,
) -> TaskStatistics {
    let tomorrow = start_of_next_day(now);
    TaskStatistics {
        total_time_spent: timers.iter().map(|t| t.duration.unwrap_or(0)).sum(),
        time_spent_today: sum_between(timers, start_of_day(now), tomorrow),
        time_spent_this_week: sum_between(timers, start_of_week(now, week_start), tomorrow),
        timer_count: timers.len(),
        last_worked_on: timers.iter().filter_map(|t| t.end_time).max(),
    }
}

/// Load a task's timers and aggregate them as of `now`.
pub fn task_statistics<Tz: TimeZone>(
    conn: &Connection,
    task_key: &str,
    now: &DateTime<Tz>,
    week_start: Weekday,
) -> Result<TaskStatistics> {
    let timers = list_task_timers(conn, task_key)?;
    Ok(compute_task_statistics(&timers, now, week_start))
}
