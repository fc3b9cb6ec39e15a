//! REST endpoint handlers organized by resource.

pub mod astronaut;
pub mod system;

use axum::Router;

use crate::app_state::AppState;
use crate::persistence::TransactionalExecutor;

/// Composes all resource routes.
pub fn routes<E: TransactionalExecutor>() -> Router<AppState<E>> {
    Router::new().merge(astronaut::routes())
}
