//! Shared application state for all routes. Built once by the process entry point.

use crate::backend::Backend;
use crate::config::EmailUniqueness;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub email_uniqueness: EmailUniqueness,
}

impl AppState {
    pub fn new(backend: Arc<dyn Backend>, email_uniqueness: EmailUniqueness) -> Self {
        AppState {
            backend,
            email_uniqueness,
        }
    }
}
