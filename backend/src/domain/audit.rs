//! Audit trail entries written alongside orchestrated operations.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::domain::ports::UserPersistenceError;

/// Operation recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditAction {
    Create,
    Get,
    Update,
    Delete,
}

impl AuditAction {
    /// Method name persisted in the `action_type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Get => "Get",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only audit record.
///
/// `response` is absent for operations that produce no payload (delete) or
/// whose response is not recorded (update).
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLogEntry {
    pub action: AuditAction,
    pub request: Value,
    pub response: Option<Value>,
}

impl AuditLogEntry {
    /// Build an entry by serialising the request and optional response.
    ///
    /// # Examples
    /// ```
    /// use auth_backend::domain::{AuditAction, AuditLogEntry, DeleteUserParams, UserId};
    ///
    /// let params = DeleteUserParams { user_id: UserId::new(3).expect("id") };
    /// let entry = AuditLogEntry::record::<_, ()>(AuditAction::Delete, &params, None)
    ///     .expect("serialisable");
    /// assert_eq!(entry.request["userId"], 3);
    /// assert!(entry.response.is_none());
    /// ```
    pub fn record<Req, Resp>(
        action: AuditAction,
        request: &Req,
        response: Option<&Resp>,
    ) -> Result<Self, UserPersistenceError>
    where
        Req: Serialize + ?Sized,
        Resp: Serialize + ?Sized,
    {
        let request = to_payload(request)?;
        let response = response.map(to_payload).transpose()?;
        Ok(Self {
            action,
            request,
            response,
        })
    }
}

fn to_payload<T: Serialize + ?Sized>(value: &T) -> Result<Value, UserPersistenceError> {
    serde_json::to_value(value).map_err(|err| {
        UserPersistenceError::serialization(format!("audit payload encoding failed: {err}"))
    })
}
