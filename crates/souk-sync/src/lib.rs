//! Identity reconciliation core.
//!
//! Keeps a local relational mirror converged with the external identity
//! provider: a full-pass diff engine ([`engine::ReconciliationEngine`]),
//! a tiered role resolver ([`resolver::RoleResolver`]), a periodic
//! scheduler ([`scheduler::SyncScheduler`]) and the upstream-first user
//! lifecycle ([`lifecycle::UserService`]).

pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod report;
pub mod resolver;
pub mod scheduler;

pub use engine::{EngineConfig, ReconciliationEngine};
pub use error::SyncError;
pub use lifecycle::{LifecycleError, NewUser, UserService, UserUpdate};
pub use report::{SyncOutcome, SyncSummary};
pub use resolver::{ResolverConfig, RoleResolver};
pub use scheduler::SyncScheduler;
