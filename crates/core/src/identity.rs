//! Identity snapshots for acting principals.
//!
//! A [`UserSnapshot`] is captured once per request and carried through the
//! job context. It is a value, not a live session reference, so a job
//! running on a worker long after the request finished still sees the
//! identity that submitted it.

use serde::{Deserialize, Serialize};

/// Snapshot of the acting principal at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    /// Stable user id, `None` for an anonymous principal.
    pub id: Option<String>,
    pub email: Option<String>,
    /// Role / permission names held by the user.
    pub roles: Vec<String>,
    pub display_name: Option<String>,
    /// Client address observed on the submitting request.
    pub current_ip: Option<String>,
}

impl UserSnapshot {
    /// The anonymous principal: no id, no roles.
    pub fn anonymous() -> Self {
        Self {
            id: None,
            email: None,
            roles: Vec::new(),
            display_name: None,
            current_ip: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.id.is_some()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}
