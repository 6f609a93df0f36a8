use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc, Weekday};
use rusqlite::Connection;

use agency_time::auth::{resolve_actor, Actor};
use agency_time::model::{Priority, Role};
use agency_time::tasks::{add_task, NewTask};
use agency_time::{db, stats, timers, users, ErrorKind};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 14, 10, 0, 0).unwrap()
}

fn task(key: &str, assignee: &str) -> NewTask {
    NewTask {
        key: key.into(),
        title: format!("Task {key}"),
        description: "Client deliverable for the sprint".into(),
        priority: Priority::Medium,
        due_date: None,
        assignee: assignee.into(),
        project: Some("website".into()),
    }
}

fn seed() -> Connection {
    let conn = db::open_memory().unwrap();
    users::add_user(&conn, "mia", "Mia", Role::Manager).unwrap();
    users::add_user(&conn, "u", "Una", Role::Professional).unwrap();
    users::add_user(&conn, "v", "Vic", Role::Client).unwrap();
    let mia = Actor::new("mia", Role::Manager);
    let today = NaiveDate::from_ymd_opt(2025, 5, 14).unwrap();
    add_task(&conn, &mia, &task("T1", "u"), today).unwrap();
    add_task(&conn, &mia, &task("T2", "u"), today).unwrap();
    conn
}

#[test]
fn full_timer_lifecycle_scenario() {
    let conn = seed();
    let u = resolve_actor(&conn, Some("u")).unwrap();
    assert_eq!(u.role, Role::Professional);

    // Start on T1.
    let t1 = timers::start_timer(&conn, &u, "T1", t0()).unwrap();
    assert!(t1.end_time.is_none());

    // A second task cannot be tracked concurrently.
    let err = timers::start_timer(&conn, &u, "T2", t0() + Duration::seconds(5)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConflictActiveTimer);

    // Stop after 60 simulated seconds.
    let end = t0() + Duration::seconds(60);
    let stopped = timers::stop_timer(&conn, &u, &t1.id, end).unwrap();
    assert_eq!(stopped.duration, Some(60));

    // Stopping again fails and leaves the row alone.
    let err = timers::stop_timer(&conn, &u, &t1.id, end + Duration::seconds(30)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyStopped);
    assert_eq!(timers::get_timer(&conn, &t1.id).unwrap(), stopped);

    let s = stats::task_statistics(&conn, "T1", &(end + Duration::seconds(1)), Weekday::Sun).unwrap();
    assert_eq!(s.total_time_spent, 60);
    assert_eq!(s.timer_count, 1);
    assert_eq!(s.last_worked_on, Some(end));
    assert_eq!(s.time_spent_today, 60);
    assert_eq!(s.time_spent_this_week, 60);

    let other = stats::task_statistics(&conn, "T2", &end, Weekday::Sun).unwrap();
    assert_eq!(other.timer_count, 0);
    assert!(other.last_worked_on.is_none());
}

#[test]
fn client_without_assignment_is_denied() {
    let conn = seed();
    let v = resolve_actor(&conn, Some("v")).unwrap();
    let err = timers::start_timer(&conn, &v, "T1", t0()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    assert!(timers::get_active_timer(&conn, &v, t0()).unwrap().is_none());
}

#[test]
fn anonymous_caller_is_unauthenticated() {
    let conn = seed();
    assert_eq!(
        resolve_actor(&conn, None).unwrap_err().kind(),
        ErrorKind::Unauthenticated
    );
}

#[test]
fn stats_for_unknown_task_is_not_found() {
    let conn = seed();
    let err = stats::task_statistics(&conn, "T9", &t0(), Weekday::Sun).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn never_more_than_one_active_timer_per_user() {
    let conn = seed();
    let u = Actor::new("u", Role::Professional);
    let mut now = t0();
    for (i, key) in ["T1", "T2", "T1", "T2"].iter().enumerate() {
        let timer = timers::start_timer(&conn, &u, key, now).unwrap();
        for other in ["T1", "T2"] {
            assert!(timers::start_timer(&conn, &u, other, now).is_err());
        }
        let active: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM timers WHERE user_id = 'u' AND end_time IS NULL",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(active, 1, "iteration {i}");
        now += Duration::seconds(30);
        timers::stop_timer(&conn, &u, &timer.id, now).unwrap();
    }
    let s = stats::task_statistics(&conn, "T1", &now, Weekday::Sun).unwrap();
    assert_eq!(s.total_time_spent, 60);
    assert_eq!(s.timer_count, 2);
}
