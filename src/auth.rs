//! Request identity and role-based permission checks.
//!
//! The caller supplies a user id (from a session, a CLI flag, ...); this
//! module only looks the role up and never verifies credentials.

use rusqlite::Connection;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::Role;
use crate::users;

/// The authenticated identity performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn is_elevated(&self) -> bool {
        self.role.is_elevated()
    }

    /// Owner of the resource, or an elevated role.
    pub fn can_act_for(&self, owner: &str) -> bool {
        self.user_id == owner || self.is_elevated()
    }

    pub(crate) fn require_can_act_for(&self, owner: &str, what: &str) -> Result<()> {
        if self.can_act_for(owner) {
            return Ok(());
        }
        Err(Error::PermissionDenied(format!(
            "'{}' ({}) cannot {what}",
            self.user_id, self.role
        )))
    }
}

/// Resolve the request's user id into an [`Actor`].
pub fn resolve_actor(conn: &Connection, user_id: Option<&str>) -> Result<Actor> {
    let Some(id) = user_id.filter(|id| !id.is_empty()) else {
        return Err(Error::Unauthenticated);
    };
    match users::find_user(conn, id)? {
        Some(user) => Ok(Actor::new(user.id, user.role)),
        None => Err(Error::Unauthenticated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::error::ErrorKind;

    #[test]
    fn missing_identity_is_unauthenticated() {
        let conn = db::open_memory().unwrap();
        assert_eq!(
            resolve_actor(&conn, None).unwrap_err().kind(),
            ErrorKind::Unauthenticated
        );
        assert_eq!(
            resolve_actor(&conn, Some("")).unwrap_err().kind(),
            ErrorKind::Unauthenticated
        );
    }

    #[test]
    fn unknown_user_is_unauthenticated() {
        let conn = db::open_memory().unwrap();
        assert_eq!(
            resolve_actor(&conn, Some("ghost")).unwrap_err().kind(),
            ErrorKind::Unauthenticated
        );
    }

    #[test]
    fn resolves_role_from_store() {
        let conn = db::open_memory().unwrap();
        users::add_user(&conn, "mia", "Mia", Role::Manager).unwrap();
        let actor = resolve_actor(&conn, Some("mia")).unwrap();
        assert_eq!(actor, Actor::new("mia", Role::Manager));
    }

    #[test]
    fn ownership_or_elevation_grants_access() {
        let pro = Actor::new("pat", Role::Professional);
        assert!(pro.can_act_for("pat"));
        assert!(!pro.can_act_for("sam"));
        let mgr = Actor::new("mia", Role::Manager);
        assert!(mgr.can_act_for("sam"));
        let err = pro.require_can_act_for("sam", "stop this timer").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }
}
