mod cli;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, Utc};
use clap::Parser;
use rusqlite::Connection;

use agency_time::auth::{self, Actor};
use agency_time::config::{self, Config};
use agency_time::model::{Priority, Role, TaskStatus};
use agency_time::tasks::{NewTask, TaskFilter};
use agency_time::{db, output, stats, tasks, timers, users};
use cli::{Cli, Command};

fn resolve_db_path(cli_db: Option<String>, config: &Config) -> Result<String> {
    if let Some(p) = cli_db.or_else(|| config.database.path.clone()) {
        return Ok(p);
    }
    let path = config::home_dir().join("agency-time.db");
    Ok(path
        .to_str()
        .context("default DB path is not valid UTF-8")?
        .to_string())
}

fn ensure_db_dir(db_path: &str) -> Result<()> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

fn open_db(db_path: &str) -> Result<Connection> {
    let conn = db::open(db_path)?;
    db::init(&conn)?;
    Ok(conn)
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}': expected YYYY-MM-DD"))
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", to_json(value)?);
    Ok(())
}

/// Timer to stop: the given id, or the actor's running timer.
fn stop_target(conn: &Connection, actor: &Actor, timer: Option<String>) -> Result<String> {
    if let Some(id) = timer {
        return Ok(id);
    }
    match timers::find_active_for_user(conn, &actor.user_id)? {
        Some(active) => Ok(active.id),
        None => bail!("no running timer for '{}'", actor.user_id),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref().map(PathBuf::from).as_deref())?;
    let week_start = config.week_start()?;
    let db_path = resolve_db_path(cli.db, &config)?;
    ensure_db_dir(&db_path)?;
    let conn = open_db(&db_path)?;

    let actor = || -> Result<Actor> { Ok(auth::resolve_actor(&conn, cli.user.as_deref())?) };
    let today = Local::now().date_naive();

    match cli.command {
        Command::Init => {
            eprintln!("Initialized {db_path}");
        }

        Command::AddUser { id, role, name } => {
            let role = Role::parse(&role)?;
            users::add_user(&conn, &id, &name, role)?;
            eprintln!("Added user '{id}' ({role})");
        }

        Command::Users { json } => {
            let list = users::list_users(&conn)?;
            if json {
                print_json(&list)?;
            } else {
                print!("{}", output::format_users(&list));
            }
        }

        Command::Add {
            key,
            title,
            desc,
            assignee,
            priority,
            due,
            project,
        } => {
            let actor = actor()?;
            let task = NewTask {
                key,
                title,
                description: desc,
                priority: Priority::parse(&priority)?,
                due_date: due.as_deref().map(parse_date).transpose()?,
                assignee,
                project,
            };
            tasks::add_task(&conn, &actor, &task, today)?;
            eprintln!("Added task '{}' for '{}'", task.key, task.assignee);
        }

        Command::Show { key, json } => {
            actor()?;
            let task = tasks::get_task(&conn, &key)?;
            let stats = stats::task_statistics(&conn, &key, &Local::now(), week_start)?;
            if json {
                print_json(&output::TaskDetail {
                    task: &task,
                    overdue: task.is_overdue(today),
                    statistics: &stats,
                })?;
            } else {
                print!("{}", output::format_task_detail(&task, &stats, today));
            }
        }

        Command::List {
            assignee,
            status,
            project,
            json,
        } => {
            actor()?;
            let filter = TaskFilter {
                assignee,
                status: status.as_deref().map(TaskStatus::parse).transpose()?,
                project,
            };
            let list = tasks::list_tasks(&conn, &filter)?;
            if json {
                print_json(&list)?;
            } else {
                print!("{}", output::format_task_list(&list, today));
            }
        }

        Command::Status { key, status } => {
            let actor = actor()?;
            let status = TaskStatus::parse(&status)?;
            tasks::update_task_status(&conn, &actor, &key, status)?;
            eprintln!("Set '{key}' to {status}");
        }

        Command::Assign { key, assignee } => {
            let actor = actor()?;
            tasks::assign_task(&conn, &actor, &key, &assignee)?;
            eprintln!("Assigned '{key}' to '{assignee}'");
        }

        Command::Rm { key } => {
            let actor = actor()?;
            tasks::remove_task(&conn, &actor, &key)?;
            eprintln!("Removed task '{key}'");
        }

        Command::Start { task, json } => {
            let actor = actor()?;
            let timer = timers::start_timer(&conn, &actor, &task, Utc::now())?;
            if json {
                print_json(&timer)?;
            } else {
                println!("{}", timer.id);
            }
            eprintln!("Started timer on '{task}'");
        }

        Command::Stop { timer, json } => {
            let actor = actor()?;
            let id = stop_target(&conn, &actor, timer)?;
            let stopped = timers::stop_timer(&conn, &actor, &id, Utc::now())?;
            if json {
                print_json(&stopped)?;
            } else {
                print!("{}", output::format_timer(&stopped));
            }
        }

        Command::Active { json } => {
            let actor = actor()?;
            let active = timers::get_active_timer(&conn, &actor, Utc::now())?;
            match (json, active) {
                (true, active) => print_json(&active)?,
                (false, Some(active)) => print!("{}", output::format_active(&active)),
                (false, None) => eprintln!("No running timer"),
            }
        }

        Command::Timers { task, json } => {
            let actor = actor()?;
            let list = timers::list_timers(&conn, &actor, task.as_deref())?;
            if json {
                print_json(&list)?;
            } else {
                print!("{}", output::format_timer_list(&list));
            }
        }

        Command::RmTimer { timer } => {
            let actor = actor()?;
            timers::delete_timer(&conn, &actor, &timer)?;
            eprintln!("Deleted timer {timer}");
        }

        Command::Stats { task, json } => {
            actor()?;
            let stats = stats::task_statistics(&conn, &task, &Local::now(), week_start)?;
            if json {
                print_json(&stats)?;
            } else {
                print!("{}", output::format_stats(&stats));
            }
        }
    }

    Ok(())
}
