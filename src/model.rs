use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    Manager,
    Professional,
    Client,
}

impl Role {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "SUPER_ADMIN" => Ok(Self::SuperAdmin),
            "MANAGER" => Ok(Self::Manager),
            "PROFESSIONAL" => Ok(Self::Professional),
            "CLIENT" => Ok(Self::Client),
            _ => Err(Error::Validation(format!(
                "invalid role '{s}': must be SUPER_ADMIN, MANAGER, PROFESSIONAL, or CLIENT"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "SUPER_ADMIN",
            Self::Manager => "MANAGER",
            Self::Professional => "PROFESSIONAL",
            Self::Client => "CLIENT",
        }
    }

    /// MANAGER and SUPER_ADMIN may act on timers and tasks they do not own.
    pub fn is_elevated(self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Manager)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    OnHold,
    Cancelled,
}

impl TaskStatus {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "PENDING" => Ok(Self::Pending),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "ON_HOLD" => Ok(Self::OnHold),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(Error::Validation(format!(
                "invalid status '{s}': must be PENDING, IN_PROGRESS, COMPLETED, ON_HOLD, or CANCELLED"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::OnHold => "ON_HOLD",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Returns display icon: x=completed, *=in progress, ~=on hold, -=cancelled, .=pending
    pub fn icon(self) -> &'static str {
        match self {
            Self::Completed => "x",
            Self::InProgress => "*",
            Self::OnHold => "~",
            Self::Cancelled => "-",
            Self::Pending => ".",
        }
    }

    pub fn is_closed(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "URGENT" => Ok(Self::Urgent),
            _ => Err(Error::Validation(format!(
                "invalid priority '{s}': must be LOW, MEDIUM, HIGH, or URGENT"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Urgent => "URGENT",
        }
    }
}

fn text_column<T>(value: ValueRef<'_>, parse: fn(&str) -> Result<T>) -> FromSqlResult<T> {
    let s = value.as_str()?;
    parse(s).map_err(|e| FromSqlError::Other(Box::new(e)))
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        text_column(value, Self::parse)
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TaskStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        text_column(value, Self::parse)
    }
}

impl ToSql for TaskStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Priority {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        text_column(value, Self::parse)
    }
}

impl ToSql for Priority {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: i64,
    pub key: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub assignee: String,
    pub creator: String,
    pub project: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Task {
    /// Past its due date and still open.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.due_date {
            Some(due) => due < today && !self.status.is_closed(),
            None => false,
        }
    }
}

/// One tracked work session against a task. `end_time == None` means the
/// timer is still running; `duration` is only set once it has stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timer {
    pub id: String,
    pub task: String,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<i64>,
    /// Set when a negative elapsed time was clamped to zero at stop.
    pub flagged: bool,
}

impl Timer {
    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }
}

/// A running timer together with its elapsed seconds at read time.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveTimer {
    #[serde(flatten)]
    pub timer: Timer,
    pub elapsed: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskStatistics {
    pub total_time_spent: i64,
    pub time_spent_today: i64,
    pub time_spent_this_week: i64,
    pub timer_count: usize,
    pub last_worked_on: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_accepts_any_case() {
        assert_eq!(Role::parse("manager").unwrap(), Role::Manager);
        assert_eq!(Role::parse("super-admin").unwrap(), Role::SuperAdmin);
        assert!(Role::parse("owner").is_err());
    }

    #[test]
    fn only_manager_and_admin_are_elevated() {
        assert!(Role::SuperAdmin.is_elevated());
        assert!(Role::Manager.is_elevated());
        assert!(!Role::Professional.is_elevated());
        assert!(!Role::Client.is_elevated());
    }

    #[test]
    fn status_roundtrips_through_str() {
        for s in ["PENDING", "IN_PROGRESS", "COMPLETED", "ON_HOLD", "CANCELLED"] {
            assert_eq!(TaskStatus::parse(s).unwrap().as_str(), s);
        }
        assert!(TaskStatus::parse("done").is_err());
    }

    #[test]
    fn overdue_ignores_closed_tasks() {
        let mut task = Task {
            id: 1,
            key: "t".into(),
            title: "Title".into(),
            description: String::new(),
            status: TaskStatus::Pending,
            priority: Priority::Medium,
            due_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            assignee: "u".into(),
            creator: "u".into(),
            project: None,
            created_at: String::new(),
            updated_at: String::new(),
        };
        let today = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        assert!(task.is_overdue(today));
        assert!(!task.is_overdue(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()));
        task.status = TaskStatus::Completed;
        assert!(!task.is_overdue(today));
    }
}
