use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Validate a task key: must be non-empty and match [a-zA-Z0-9_-]+
pub fn validate_task_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::Validation("task key must not be empty".into()));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(Error::Validation(format!(
            "task key '{key}' contains invalid characters: only a-z, A-Z, 0-9, _, - allowed"
        )));
    }
    Ok(())
}

/// Validate a user id: non-empty, [a-zA-Z0-9_.@-]+ so email-like ids work.
pub fn validate_user_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::Validation("user id must not be empty".into()));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '@'))
    {
        return Err(Error::Validation(format!(
            "user id '{id}' contains invalid characters"
        )));
    }
    Ok(())
}

/// Timer ids are UUIDs; anything else is rejected before touching storage.
pub fn validate_timer_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::Validation("timer id must not be empty".into()));
    }
    Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| Error::Validation(format!("timer id '{id}' is not a valid UUID")))
}

pub fn validate_title(title: &str) -> Result<()> {
    let len = title.trim().chars().count();
    if !(3..=200).contains(&len) {
        return Err(Error::Validation(
            "task title must be between 3 and 200 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<()> {
    let len = description.trim().chars().count();
    if !(10..=1000).contains(&len) {
        return Err(Error::Validation(
            "task description must be between 10 and 1000 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_due_date(due: NaiveDate, today: NaiveDate) -> Result<()> {
    if due < today {
        return Err(Error::Validation(format!(
            "due date {due} cannot be in the past"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_keys() {
        assert!(validate_task_key("foo").is_ok());
        assert!(validate_task_key("foo-bar").is_ok());
        assert!(validate_task_key("foo_bar").is_ok());
        assert!(validate_task_key("FooBar123").is_ok());
    }

    #[test]
    fn invalid_keys() {
        assert!(validate_task_key("").is_err());
        assert!(validate_task_key("foo bar").is_err());
        assert!(validate_task_key("foo.bar").is_err());
        assert!(validate_task_key("foo/bar").is_err());
    }

    #[test]
    fn user_ids_allow_email_shape() {
        assert!(validate_user_id("ana@agency.io").is_ok());
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("ana smith").is_err());
    }

    #[test]
    fn timer_id_must_be_uuid() {
        assert!(validate_timer_id("67e55044-10b1-426f-9247-bb680e5fe0c8").is_ok());
        assert!(validate_timer_id("42").is_err());
        assert!(validate_timer_id("").is_err());
    }

    #[test]
    fn title_and_description_bounds() {
        assert!(validate_title("ab").is_err());
        assert!(validate_title("abc").is_ok());
        assert!(validate_description("too short").is_err());
        assert!(validate_description("long enough text").is_ok());
        assert!(validate_description(&"x".repeat(1001)).is_err());
    }

    #[test]
    fn due_date_today_is_allowed() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert!(validate_due_date(today, today).is_ok());
        assert!(validate_due_date(today.pred_opt().unwrap(), today).is_err());
    }
}
