//! Shared application state.

use std::sync::Arc;

use souk_sync::{ReconciliationEngine, UserService};

/// State handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    /// Reconciliation engine, shared with the scheduler.
    pub engine: Arc<ReconciliationEngine>,
    /// User lifecycle service.
    pub users: UserService,
}
