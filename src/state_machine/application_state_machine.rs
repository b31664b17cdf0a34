use super::guards::{status_change_guards, TransitionContext};
use super::states::ApplicationStatus;
use crate::error::{Result, TicketError};
use crate::models::{Actor, Application, ApplicationHistory};
use crate::repository::{ApplicationStore, TransitionWrite};

/// Outcome of planning a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPlan {
    /// Target equals the current status; nothing is written
    NoOp,
    Apply {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
}

/// Status lifecycle of one loaded application.
///
/// Any status may move to any other; only the guards decide. A transition
/// persists the status update and its history row as one unit.
pub struct ApplicationStateMachine<'a, S: ApplicationStore + ?Sized> {
    application: Application,
    store: &'a S,
}

impl<'a, S: ApplicationStore + ?Sized> ApplicationStateMachine<'a, S> {
    pub fn new(application: Application, store: &'a S) -> Self {
        Self { application, store }
    }

    pub fn current_state(&self) -> ApplicationStatus {
        self.application.status
    }

    pub fn application(&self) -> &Application {
        &self.application
    }

    /// Unknown names are a business-rule conflict, not malformed input
    pub fn parse_target(name: &str) -> Result<ApplicationStatus> {
        name.parse::<ApplicationStatus>()
            .map_err(TicketError::conflict)
    }

    pub fn plan(&self, target: ApplicationStatus) -> TransitionPlan {
        let current = self.current_state();
        if current == target {
            TransitionPlan::NoOp
        } else {
            TransitionPlan::Apply {
                from: current,
                to: target,
            }
        }
    }

    pub fn check_guards(&self, actor: Actor) -> Result<()> {
        let context = TransitionContext {
            actor,
            application: &self.application,
        };
        for guard in status_change_guards() {
            if let Err(err) = guard.check(&context) {
                tracing::warn!(
                    application_id = %self.application.id,
                    actor_id = %actor.id,
                    guard = guard.description(),
                    "Status change refused by guard"
                );
                return Err(err);
            }
        }
        Ok(())
    }

    /// Guard, plan, and persist. Returns the application as it now stands.
    pub async fn transition(
        mut self,
        target: ApplicationStatus,
        actor: Actor,
    ) -> Result<Application> {
        self.check_guards(actor)?;

        let (from, to) = match self.plan(target) {
            TransitionPlan::NoOp => {
                tracing::debug!(
                    application_id = %self.application.id,
                    status = %target,
                    "Status unchanged, skipping transition"
                );
                return Ok(self.application);
            }
            TransitionPlan::Apply { from, to } => (from, to),
        };

        let entry = ApplicationHistory::transition(self.application.id, from, to, actor.role);
        self.application.status = to;
        self.application.updated_at = Some(entry.changed_at);

        let write = self
            .store
            .record_transition(&self.application, &entry)
            .await
            .map_err(|e| {
                tracing::warn!(
                    application_id = %self.application.id,
                    error = %e,
                    "Failed to persist status transition"
                );
                TicketError::conflict(format!(
                    "Failed to change application status: {}",
                    e.public_cause()
                ))
            })?;

        if let TransitionWrite::Stale { current } = write {
            return self.replan_after_race(from, current, target).await;
        }

        tracing::info!(
            application_id = %self.application.id,
            from = %from,
            to = %to,
            changed_by = %actor.role,
            "Application status changed"
        );

        Ok(self.application)
    }

    /// The stored status moved between our read and our write. Reaching the
    /// same target concurrently is a no-op; anything else is a conflict.
    async fn replan_after_race(
        self,
        expected: ApplicationStatus,
        current: ApplicationStatus,
        target: ApplicationStatus,
    ) -> Result<Application> {
        tracing::warn!(
            application_id = %self.application.id,
            expected = %expected,
            current = %current,
            target = %target,
            "Status changed concurrently"
        );

        if current != target {
            return Err(TicketError::conflict(format!(
                "Application status changed concurrently: expected {expected}, found {current}"
            )));
        }

        match self.store.find_application(self.application.id).await {
            Ok(Some(stored)) => Ok(stored),
            Ok(None) => Err(TicketError::not_found(format!(
                "Application not found: {}",
                self.application.id
            ))),
            Err(e) => {
                tracing::warn!(
                    application_id = %self.application.id,
                    error = %e,
                    "Failed to reload application"
                );
                Err(TicketError::conflict("storage unavailable"))
            }
        }
    }
}
