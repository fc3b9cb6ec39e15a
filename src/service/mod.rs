//! Service layer: snapshot store and the astronaut operations built on it.

pub mod astronaut_service;
pub mod snapshot_store;

pub use astronaut_service::AstronautService;
