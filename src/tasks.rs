use chrono::NaiveDate;
use log::info;
use rusqlite::{Connection, OptionalExtension};

use crate::auth::Actor;
use crate::error::{Error, Result};
use crate::model::{Priority, Role, Task, TaskStatus};
use crate::users::require_user;
use crate::validate::{validate_description, validate_due_date, validate_task_key, validate_title};

const TASK_COLUMNS: &str = "id, task_key, title, description, status, priority, due_date, \
                            assignee, creator, project, created_at, updated_at";

const INSERT_TASK: &str = "
INSERT INTO tasks (task_key, title, description, status, priority, due_date, assignee, creator, project)
VALUES (?1, ?2, ?3, 'PENDING', ?4, ?5, ?6, ?7, ?8)
";

const SET_STATUS: &str = "
UPDATE tasks
SET status = ?1,
    updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
WHERE task_key = ?2
";

const SET_ASSIGNEE: &str = "
UPDATE tasks
SET assignee = ?1,
    updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
WHERE task_key = ?2
";

fn read_task_row(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        key: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: row.get(4)?,
        priority: row.get(5)?,
        due_date: row.get(6)?,
        assignee: row.get(7)?,
        creator: row.get(8)?,
        project: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Fields supplied when creating a task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub key: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub assignee: String,
    pub project: Option<String>,
}

/// Filter for [`list_tasks`]; `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub assignee: Option<String>,
    pub status: Option<TaskStatus>,
    pub project: Option<String>,
}

fn task_exists(conn: &Connection, key: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tasks WHERE task_key = ?1",
        [key],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn require_not_client(actor: &Actor, what: &str) -> Result<()> {
    if actor.role == Role::Client {
        return Err(Error::PermissionDenied(format!("clients cannot {what}")));
    }
    Ok(())
}

pub fn add_task(conn: &Connection, actor: &Actor, task: &NewTask, today: NaiveDate) -> Result<()> {
    require_not_client(actor, "create tasks")?;
    validate_task_key(&task.key)?;
    validate_title(&task.title)?;
    validate_description(&task.description)?;
    if let Some(due) = task.due_date {
        validate_due_date(due, today)?;
    }
    if task_exists(conn, &task.key)? {
        return Err(Error::Validation(format!("task '{}' already exists", task.key)));
    }
    require_user(conn, &task.assignee)?;
    conn.execute(
        INSERT_TASK,
        rusqlite::params![
            task.key,
            task.title.trim(),
            task.description.trim(),
            task.priority,
            task.due_date,
            task.assignee,
            actor.user_id,
            task.project,
        ],
    )?;
    info!("task '{}' created by '{}'", task.key, actor.user_id);
    Ok(())
}

pub fn find_task(conn: &Connection, key: &str) -> Result<Option<Task>> {
    validate_task_key(key)?;
    let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE task_key = ?1");
    let task = conn.query_row(&query, [key], read_task_row).optional()?;
    Ok(task)
}

pub fn get_task(conn: &Connection, key: &str) -> Result<Task> {
    find_task(conn, key)?.ok_or_else(|| Error::not_found("task", key))
}

pub fn list_tasks(conn: &Connection, filter: &TaskFilter) -> Result<Vec<Task>> {
    let query = format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY id");
    let mut stmt = conn.prepare(&query)?;
    let rows = stmt.query_map([], read_task_row)?;
    let mut tasks: Vec<Task> = rows.collect::<rusqlite::Result<Vec<_>>>()?;

    if let Some(ref a) = filter.assignee {
        tasks.retain(|t| &t.assignee == a);
    }
    if let Some(s) = filter.status {
        tasks.retain(|t| t.status == s);
    }
    if let Some(ref p) = filter.project {
        tasks.retain(|t| t.project.as_deref() == Some(p.as_str()));
    }
    Ok(tasks)
}

/// Creator, assignee, or SUPER_ADMIN; never a client.
fn require_can_edit(actor: &Actor, task: &Task) -> Result<()> {
    require_not_client(actor, "edit tasks")?;
    if actor.role == Role::SuperAdmin
        || actor.user_id == task.creator
        || actor.user_id == task.assignee
    {
        return Ok(());
    }
    Err(Error::PermissionDenied(format!(
        "'{}' can only edit tasks they created or are assigned to",
        actor.user_id
    )))
}

pub fn update_task_status(
    conn: &Connection,
    actor: &Actor,
    key: &str,
    status: TaskStatus,
) -> Result<()> {
    let task = get_task(conn, key)?;
    require_can_edit(actor, &task)?;
    conn.execute(SET_STATUS, rusqlite::params![status, key])?;
    Ok(())
}

pub fn assign_task(conn: &Connection, actor: &Actor, key: &str, assignee: &str) -> Result<()> {
    let task = get_task(conn, key)?;
    require_can_edit(actor, &task)?;
    require_user(conn, assignee)?;
    conn.execute(SET_ASSIGNEE, rusqlite::params![assignee, key])?;
    info!("task '{key}' reassigned from '{}' to '{assignee}'", task.assignee);
    Ok(())
}

/// Delete a task and, through the foreign key cascade, all of its timers.
pub fn remove_task(conn: &Connection, actor: &Actor, key: &str) -> Result<()> {
    let task = get_task(conn, key)?;
    require_not_client(actor, "delete tasks")?;
    if actor.role != Role::SuperAdmin && actor.user_id != task.creator {
        return Err(Error::PermissionDenied(format!(
            "'{}' can only delete tasks they created",
            actor.user_id
        )));
    }
    conn.execute("DELETE FROM tasks WHERE task_key = ?1", [key])?;
    info!("task '{key}' deleted by '{}'", actor.user_id);
    Ok(())
}
