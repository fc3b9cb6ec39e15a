//! # astronaut-registry
//!
//! REST API for astronaut records that keeps every change as an append-only
//! snapshot instead of updating rows in place.
//!
//! Each astronaut is an identity row plus a history of snapshot rows. The
//! current state is the single active snapshot when it is not marked deleted;
//! updates and deletes append new snapshots, so the full history stays
//! queryable.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── AstronautService (service/)
//!     ├── Snapshot store (service/snapshot_store)
//!     ├── Representations + transforms (domain/)
//!     │
//!     └── TransactionalExecutor (persistence/)
//!             ├── PostgreSQL (sqlx)
//!             └── in-memory
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
