use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::error::Result;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id         TEXT PRIMARY KEY CHECK(length(id) > 0),
    name       TEXT NOT NULL DEFAULT '',
    role       TEXT NOT NULL CHECK(role IN ('SUPER_ADMIN', 'MANAGER', 'PROFESSIONAL', 'CLIENT')),
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE TABLE IF NOT EXISTS tasks (
    id          INTEGER PRIMARY KEY,
    task_key    TEXT NOT NULL UNIQUE CHECK(task_key GLOB '[a-zA-Z0-9_-]*' AND length(task_key) > 0),
    title       TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    status      TEXT NOT NULL DEFAULT 'PENDING'
                CHECK(status IN ('PENDING', 'IN_PROGRESS', 'COMPLETED', 'ON_HOLD', 'CANCELLED')),
    priority    TEXT NOT NULL DEFAULT 'MEDIUM'
                CHECK(priority IN ('LOW', 'MEDIUM', 'HIGH', 'URGENT')),
    due_date    TEXT,
    assignee    TEXT NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    creator     TEXT NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    project     TEXT,
    created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    updated_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE TABLE IF NOT EXISTS timers (
    id         TEXT PRIMARY KEY,
    task       TEXT NOT NULL REFERENCES tasks(task_key) ON UPDATE CASCADE ON DELETE CASCADE,
    user_id    TEXT NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    start_time TEXT NOT NULL,
    end_time   TEXT,
    duration   INTEGER CHECK(duration IS NULL OR duration >= 0),
    flagged    INTEGER NOT NULL DEFAULT 0,
    CHECK ((end_time IS NULL) = (duration IS NULL))
);

CREATE UNIQUE INDEX IF NOT EXISTS timers_one_active_per_user
    ON timers(user_id) WHERE end_time IS NULL;

CREATE INDEX IF NOT EXISTS timers_by_task ON timers(task, start_time);
";

fn set_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(())
}

pub fn open(path: &str) -> Result<Connection> {
    let conn = Connection::open(path)?;
    set_pragmas(&conn)?;
    Ok(conn)
}

pub fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Fresh in-memory database with the schema applied. Used by tests.
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    set_pragmas(&conn)?;
    init(&conn)?;
    Ok(conn)
}

/// Run `f` inside `BEGIN IMMEDIATE`, committing on success. The write lock
/// is taken up front so a concurrent writer waits on `busy_timeout` instead
/// of racing a stale read snapshot. The transaction rolls back when dropped,
/// so an error from `f`, a failed COMMIT or a panic all leave the
/// connection outside any transaction.
pub fn immediate<T>(conn: &Connection, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let value = f()?;
    tx.commit()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let conn = open_memory().unwrap();
        init(&conn).unwrap();
        init(&conn).unwrap();
    }

    #[test]
    fn second_active_timer_for_user_violates_index() {
        let conn = open_memory().unwrap();
        conn.execute_batch(
            "INSERT INTO users (id, role) VALUES ('u', 'PROFESSIONAL');
             INSERT INTO tasks (task_key, title, assignee, creator) VALUES ('t', 'Task', 'u', 'u');
             INSERT INTO timers (id, task, user_id, start_time) VALUES ('a', 't', 'u', '2025-01-01 00:00:00+00:00');",
        )
        .unwrap();
        let res = conn.execute(
            "INSERT INTO timers (id, task, user_id, start_time) VALUES ('b', 't', 'u', '2025-01-01 00:01:00+00:00')",
            [],
        );
        assert!(res.is_err());
    }

    #[test]
    fn immediate_rolls_back_on_error() {
        let conn = open_memory().unwrap();
        let res: Result<()> = immediate(&conn, || {
            conn.execute("INSERT INTO users (id, role) VALUES ('ghost', 'CLIENT')", [])?;
            Err(crate::Error::Validation("abort".into()))
        });
        assert!(res.is_err());
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
        assert!(conn.is_autocommit());
    }

    #[test]
    fn immediate_rolls_back_on_panic() {
        let conn = open_memory().unwrap();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _: Result<()> = immediate(&conn, || {
                conn.execute("INSERT INTO users (id, role) VALUES ('ghost', 'CLIENT')", [])?;
                panic!("boom");
            });
        }));
        assert!(res.is_err());
        assert!(conn.is_autocommit());
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn immediate_recovers_from_failed_commit() {
        let conn = open_memory().unwrap();
        conn.execute("INSERT INTO users (id, role) VALUES ('u', 'PROFESSIONAL')", [])
            .unwrap();
        // A deferred foreign key violation makes COMMIT itself fail.
        let res: Result<()> = immediate(&conn, || {
            conn.execute_batch(
                "PRAGMA defer_foreign_keys = ON;
                 INSERT INTO tasks (task_key, title, assignee, creator) VALUES ('t', 'Task', 'ghost', 'u');",
            )?;
            Ok(())
        });
        assert!(res.is_err());
        assert!(conn.is_autocommit());
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
