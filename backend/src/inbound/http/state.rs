//! Shared HTTP adapter state.
//!
//! Handlers receive this via `actix_web::web::Data` and depend only on the
//! driving port, so they stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::UserManagement;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub users: Arc<dyn UserManagement>,
}

impl HttpState {
    pub fn new(users: Arc<dyn UserManagement>) -> Self {
        Self { users }
    }
}
