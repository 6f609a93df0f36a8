use rusqlite::{Connection, OptionalExtension};

use crate::error::{Error, Result};
use crate::model::{Role, User};
use crate::validate::validate_user_id;

const USER_COLUMNS: &str = "id, name, role, created_at";

fn read_user_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        role: row.get(2)?,
        created_at: row.get(3)?,
    })
}

pub(crate) fn user_exists(conn: &Connection, id: &str) -> Result<bool> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM users WHERE id = ?1", [id], |row| {
        row.get(0)
    })?;
    Ok(count > 0)
}

pub(crate) fn require_user(conn: &Connection, id: &str) -> Result<()> {
    if !user_exists(conn, id)? {
        return Err(Error::not_found("user", id));
    }
    Ok(())
}

pub fn add_user(conn: &Connection, id: &str, name: &str, role: Role) -> Result<()> {
    validate_user_id(id)?;
    if user_exists(conn, id)? {
        return Err(Error::Validation(format!("user '{id}' already exists")));
    }
    conn.execute(
        "INSERT INTO users (id, name, role) VALUES (?1, ?2, ?3)",
        rusqlite::params![id, name, role],
    )?;
    Ok(())
}

pub fn find_user(conn: &Connection, id: &str) -> Result<Option<User>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    let user = conn.query_row(&query, [id], read_user_row).optional()?;
    Ok(user)
}

pub fn get_user(conn: &Connection, id: &str) -> Result<User> {
    find_user(conn, id)?.ok_or_else(|| Error::not_found("user", id))
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
    let mut stmt = conn.prepare(&query)?;
    let rows = stmt.query_map([], read_user_row)?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(Into::into)
}
