//! Start/stop state machine for task timers.
//!
//! A timer belongs to the assignee of its task at the moment it is started,
//! and that user id is stored on the row. A user may have at most one running
//! timer (`end_time IS NULL`) across all tasks. Starting runs the check and the insert under one `BEGIN IMMEDIATE`
//! transaction, and the `timers_one_active_per_user` partial unique index
//! rejects any insert that slips past it. Stopping is a single conditional
//! UPDATE on `end_time IS NULL`, so two concurrent stops cannot both credit
//! a duration.

use chrono::{DateTime, Utc};
use log::{info, warn};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::auth::Actor;
use crate::db;
use crate::error::{Error, Result};
use crate::model::{ActiveTimer, Timer};
use crate::tasks;
use crate::validate::{validate_task_key, validate_timer_id};

const TIMER_COLUMNS: &str = "id, task, user_id, start_time, end_time, duration, flagged";

const INSERT_TIMER: &str = "
INSERT INTO timers (id, task, user_id, start_time)
VALUES (?1, ?2, ?3, ?4)
";

const STOP_ACTIVE: &str = "
UPDATE timers
SET end_time = ?1, duration = ?2, flagged = ?3
WHERE id = ?4 AND end_time IS NULL
";

fn read_timer_row(row: &rusqlite::Row) -> rusqlite::Result<Timer> {
    Ok(Timer {
        id: row.get(0)?,
        task: row.get(1)?,
        user_id: row.get(2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        duration: row.get(5)?,
        flagged: row.get(6)?,
    })
}

fn query_timers(conn: &Connection, filter: &str, params: impl rusqlite::Params) -> Result<Vec<Timer>> {
    let query =
        format!("SELECT {TIMER_COLUMNS} FROM timers {filter} ORDER BY start_time DESC, rowid DESC");
    let mut stmt = conn.prepare(&query)?;
    let rows = stmt.query_map(params, read_timer_row)?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(Into::into)
}

fn conflict(active: &Timer) -> Error {
    Error::ConflictActiveTimer {
        timer_id: active.id.clone(),
        task: active.task.clone(),
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Whole seconds between `start` and `end`, rounded half away from zero.
pub fn elapsed_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let ms = (end - start).num_milliseconds();
    if ms >= 0 {
        (ms + 500) / 1000
    } else {
        -((-ms + 500) / 1000)
    }
}

pub fn find_timer(conn: &Connection, id: &str) -> Result<Option<Timer>> {
    validate_timer_id(id)?;
    let query = format!("SELECT {TIMER_COLUMNS} FROM timers WHERE id = ?1");
    let timer = conn.query_row(&query, [id], read_timer_row).optional()?;
    Ok(timer)
}

pub fn get_timer(conn: &Connection, id: &str) -> Result<Timer> {
    find_timer(conn, id)?.ok_or_else(|| Error::not_found("timer", id))
}

pub fn find_active_for_user(conn: &Connection, user_id: &str) -> Result<Option<Timer>> {
    let query = format!("SELECT {TIMER_COLUMNS} FROM timers WHERE user_id = ?1 AND end_time IS NULL");
    let timer = conn.query_row(&query, [user_id], read_timer_row).optional()?;
    Ok(timer)
}

/// Start tracking `task_key` for `actor`.
///
/// The actor must be the task's assignee or hold an elevated role. The new
/// timer belongs to the assignee, who must not already have one running.
pub fn start_timer(
    conn: &Connection,
    actor: &Actor,
    task_key: &str,
    now: DateTime<Utc>,
) -> Result<Timer> {
    validate_task_key(task_key)?;
    let timer = db::immediate(conn, || {
        let task = tasks::get_task(conn, task_key)?;
        actor.require_can_act_for(&task.assignee, &format!("track time on task '{task_key}'"))?;

        if let Some(active) = find_active_for_user(conn, &task.assignee)? {
            return Err(conflict(&active));
        }

        let timer = Timer {
            id: Uuid::new_v4().to_string(),
            task: task.key,
            user_id: task.assignee,
            start_time: now,
            end_time: None,
            duration: None,
            flagged: false,
        };
        match conn.execute(
            INSERT_TIMER,
            rusqlite::params![timer.id, timer.task, timer.user_id, timer.start_time],
        ) {
            Ok(_) => Ok(timer),
            Err(e) if is_unique_violation(&e) => match find_active_for_user(conn, &timer.user_id)? {
                Some(active) => Err(conflict(&active)),
                None => Err(e.into()),
            },
            Err(e) => Err(e.into()),
        }
    })?;
    info!(
        "timer {} started on '{}' for '{}' by '{}'",
        timer.id, timer.task, timer.user_id, actor.user_id
    );
    Ok(timer)
}

/// Stop a running timer, persisting `end_time` and `duration` together.
///
/// Stopping an already-stopped timer is an error, never a no-op.
pub fn stop_timer(
    conn: &Connection,
    actor: &Actor,
    timer_id: &str,
    now: DateTime<Utc>,
) -> Result<Timer> {
    let timer = get_timer(conn, timer_id)?;
    actor.require_can_act_for(&timer.user_id, "stop this timer")?;
    if !timer.is_active() {
        return Err(Error::AlreadyStopped {
            timer_id: timer.id,
        });
    }

    let raw = elapsed_seconds(timer.start_time, now);
    let (duration, flagged) = if raw < 0 {
        warn!(
            "timer {} stopped {}s before it started; clamping duration to 0",
            timer.id, -raw
        );
        (0, true)
    } else {
        (raw, false)
    };

    let rows = conn.execute(
        STOP_ACTIVE,
        rusqlite::params![now, duration, flagged, timer.id],
    )?;
    if rows == 0 {
        // Another writer stopped it between our read and this update
        return Err(Error::AlreadyStopped {
            timer_id: timer.id,
        });
    }

    info!(
        "timer {} stopped on '{}' after {duration}s",
        timer.id, timer.task
    );
    Ok(Timer {
        end_time: Some(now),
        duration: Some(duration),
        flagged,
        ..timer
    })
}

/// The actor's running timer with its elapsed time as of `now`.
pub fn get_active_timer(
    conn: &Connection,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<Option<ActiveTimer>> {
    let active = find_active_for_user(conn, &actor.user_id)?;
    Ok(active.map(|timer| {
        let elapsed = elapsed_seconds(timer.start_time, now).max(0);
        ActiveTimer { timer, elapsed }
    }))
}

/// Every timer for elevated actors, otherwise only the actor's own,
/// optionally narrowed to one task.
pub fn list_timers(conn: &Connection, actor: &Actor, task_key: Option<&str>) -> Result<Vec<Timer>> {
    if let Some(key) = task_key {
        tasks::get_task(conn, key)?;
    }
    match (actor.is_elevated(), task_key) {
        (true, None) => query_timers(conn, "", rusqlite::params![]),
        (true, Some(key)) => query_timers(conn, "WHERE task = ?1", rusqlite::params![key]),
        (false, None) => query_timers(conn, "WHERE user_id = ?1", rusqlite::params![actor.user_id]),
        (false, Some(key)) => query_timers(
            conn,
            "WHERE user_id = ?1 AND task = ?2",
            rusqlite::params![actor.user_id, key],
        ),
    }
}

/// All timers recorded against a task, newest first.
pub fn list_task_timers(conn: &Connection, task_key: &str) -> Result<Vec<Timer>> {
    tasks::get_task(conn, task_key)?;
    query_timers(conn, "WHERE task = ?1", rusqlite::params![task_key])
}

pub fn delete_timer(conn: &Connection, actor: &Actor, timer_id: &str) -> Result<()> {
    let timer = get_timer(conn, timer_id)?;
    actor.require_can_act_for(&timer.user_id, "delete this timer")?;
    conn.execute("DELETE FROM timers WHERE id = ?1", [&timer.id])?;
    info!("timer {} deleted by '{}'", timer.id, actor.user_id);
    Ok(())
}
