//! Services layer for group-service.
//!
//! The directory core (authorization, backend selection, group operations,
//! membership reconciliation, audit) plus the collaborators it calls.

pub mod audit;
pub mod authorization;
pub mod backend;
pub mod directory;
pub mod error;
pub mod membership;
pub mod metrics;
pub mod providers;

pub use audit::{AuditError, AuditGate, AuditStatus};
pub use authorization::require_admin;
pub use backend::{
    federated_summaries, parse_group_attribute, DirectoryBackend, DirectoryModeResolver,
    FEDERATED_GROUP_DESCRIPTION,
};
pub use directory::GroupDirectory;
pub use error::DirectoryError;
pub use membership::{MembershipPlan, MembershipReconciler};
pub use metrics::{get_metrics, init_metrics};
