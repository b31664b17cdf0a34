// State machine module for the application review lifecycle
//
// Status is a closed enum with no transition table: any member may follow any
// other. Role and ownership guards are the real gate, and every genuine change
// is recorded in the application's history.

pub mod application_state_machine;
pub mod guards;
pub mod states;

// Re-export main types for convenient access
pub use application_state_machine::{ApplicationStateMachine, TransitionPlan};
pub use states::ApplicationStatus;

// Common traits and utilities
pub use guards::{
    ensure_admin, ensure_owner_or_reviewer, ensure_reviewer, is_elevated, TransitionContext,
    TransitionGuard,
};
