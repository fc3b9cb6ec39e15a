//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::AstronautService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
///
/// Generic over the executor so the same router serves PostgreSQL in
/// production and the in-memory store in tests.
#[derive(Debug)]
pub struct AppState<E> {
    /// Astronaut service for all store operations.
    pub astronaut_service: Arc<AstronautService<E>>,
}

impl<E> AppState<E> {
    /// Wraps a service into shareable state.
    #[must_use]
    pub fn new(astronaut_service: AstronautService<E>) -> Self {
        Self {
            astronaut_service: Arc::new(astronaut_service),
        }
    }
}

impl<E> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self {
            astronaut_service: Arc::clone(&self.astronaut_service),
        }
    }
}
