//! # Capability Guards
//!
//! Role and ownership checks gating application mutations. Status is not
//! constrained by a transition graph; these guards are the only gate.

use crate::error::{Result, TicketError};
use crate::models::{Actor, Application, UserRole};

/// What a guard sees when deciding on a status change
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext<'a> {
    pub actor: Actor,
    pub application: &'a Application,
}

/// Trait for implementing status transition guards
pub trait TransitionGuard: Send + Sync {
    /// `Ok(())` when the transition may proceed
    fn check(&self, context: &TransitionContext<'_>) -> Result<()>;

    /// Get a description of this guard for logging
    fn description(&self) -> &'static str;
}

/// Only MANAGER and ADMIN may move an application between statuses
pub struct ReviewerRoleGuard;

impl TransitionGuard for ReviewerRoleGuard {
    fn check(&self, context: &TransitionContext<'_>) -> Result<()> {
        ensure_reviewer(context.actor)
    }

    fn description(&self) -> &'static str {
        "Actor must be a manager or an admin"
    }
}

/// A manager may not review an application they submitted
pub struct NoSelfReviewGuard;

impl TransitionGuard for NoSelfReviewGuard {
    fn check(&self, context: &TransitionContext<'_>) -> Result<()> {
        if context.actor.role == UserRole::Manager
            && context.application.applicant_id == context.actor.id
        {
            return Err(TicketError::conflict(
                "Managers cannot change status of their own applications",
            ));
        }
        Ok(())
    }

    fn description(&self) -> &'static str {
        "Managers may not review their own applications"
    }
}

/// Guards applied to every status change, in order
pub fn status_change_guards() -> [&'static dyn TransitionGuard; 2] {
    [&ReviewerRoleGuard, &NoSelfReviewGuard]
}

pub fn ensure_reviewer(actor: Actor) -> Result<()> {
    if actor.role.is_reviewer() {
        Ok(())
    } else {
        Err(TicketError::forbidden(
            "Only managers or admins can change application status",
        ))
    }
}

pub fn ensure_admin(actor: Actor, action: &str) -> Result<()> {
    if actor.role.is_admin() {
        Ok(())
    } else {
        Err(TicketError::forbidden(format!("Only admins can {action}")))
    }
}

/// The applicant themselves, or any MANAGER/ADMIN
pub fn ensure_owner_or_reviewer(actor: Actor, application: &Application) -> Result<()> {
    if application.applicant_id == actor.id || actor.role.is_reviewer() {
        Ok(())
    } else {
        Err(TicketError::forbidden(
            "Only the applicant, a manager or an admin can access this application",
        ))
    }
}

/// ADMIN, or the holder of a PRODUCT_OWNER assignment on the product
pub fn is_elevated(role: UserRole, holds_product_owner: bool) -> bool {
    role.is_admin() || holds_product_owner
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn application_by(applicant_id: Uuid) -> Application {
        Application::submit(applicant_id, Uuid::new_v4(), None, vec![], vec![])
    }

    fn actor(role: UserRole) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn test_reviewer_role_guard() {
        let app = application_by(Uuid::new_v4());
        for (role, allowed) in [
            (UserRole::User, false),
            (UserRole::Manager, true),
            (UserRole::Admin, true),
        ] {
            let context = TransitionContext {
                actor: actor(role),
                application: &app,
            };
            let result = ReviewerRoleGuard.check(&context);
            assert_eq!(result.is_ok(), allowed, "role {role}");
            if let Err(err) = result {
                assert_eq!(err.status_code(), 403);
            }
        }
    }

    #[test]
    fn test_manager_cannot_review_own_application() {
        let manager = actor(UserRole::Manager);
        let app = application_by(manager.id);
        let context = TransitionContext {
            actor: manager,
            application: &app,
        };

        let err = NoSelfReviewGuard.check(&context).unwrap_err();
        assert!(matches!(err, TicketError::Conflict(_)));
    }

    #[test]
    fn test_admin_may_review_own_application() {
        let admin = actor(UserRole::Admin);
        let app = application_by(admin.id);
        let context = TransitionContext {
            actor: admin,
            application: &app,
        };

        for guard in status_change_guards() {
            assert!(guard.check(&context).is_ok(), "{}", guard.description());
        }
    }

    #[test]
    fn test_owner_or_reviewer() {
        let owner = actor(UserRole::User);
        let app = application_by(owner.id);

        assert!(ensure_owner_or_reviewer(owner, &app).is_ok());
        assert!(ensure_owner_or_reviewer(actor(UserRole::Manager), &app).is_ok());
        assert!(ensure_owner_or_reviewer(actor(UserRole::User), &app).is_err());
    }

    #[test]
    fn test_is_elevated() {
        assert!(is_elevated(UserRole::Admin, false));
        assert!(is_elevated(UserRole::User, true));
        assert!(!is_elevated(UserRole::Manager, false));
    }
}
