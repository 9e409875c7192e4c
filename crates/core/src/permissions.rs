//! Permission gate consumed, not owned, by the pipeline engine.
//!
//! The engine calls [`PermissionEvaluator::check`] before creating any
//! per-job state. A denial distinguishes "not authenticated" from
//! "authenticated but forbidden" so the HTTP layer can answer 401 vs 403 at
//! submission time. Job lookups never go through this path — they hide
//! ownership failures behind an `unknown` status instead.

use crate::error::CoreError;
use crate::identity::UserSnapshot;

/// Capability check over a set of required permission names.
pub trait PermissionEvaluator: Send + Sync {
    /// Check that `identity` holds every permission in `required`.
    fn check(&self, required: &[String], identity: &UserSnapshot) -> Result<(), CoreError>;
}

/// Role-membership evaluator: a permission is granted when the identity
/// carries a role of the same name. An empty requirement list admits any
/// authenticated user.
#[derive(Debug, Default)]
pub struct RolePermissions;

impl PermissionEvaluator for RolePermissions {
    fn check(&self, required: &[String], identity: &UserSnapshot) -> Result<(), CoreError> {
        if !identity.is_authenticated() {
            return Err(CoreError::NotAuthenticated(
                "You must be authenticated to run a presentation".to_string(),
            ));
        }

        for permission in required {
            if !identity.has_role(permission) {
                return Err(CoreError::PermissionDenied(format!(
                    "Missing permission '{permission}' required by this presentation"
                )));
            }
        }

        Ok(())
    }
}
