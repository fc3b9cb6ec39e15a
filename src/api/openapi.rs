//! OpenAPI document for the REST API.

use utoipa::OpenApi;

use super::dto::{AstronautResponse, CreateAstronautResponse, SnapshotResponse};
use super::handlers::{astronaut, system};
use crate::domain::AstronautSerialized;
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI specification, served at `/api-docs/openapi.json`
/// when the `swagger-ui` feature is enabled.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "astronaut-registry", description = "Astronaut records with full change history"),
    paths(
        astronaut::create_astronaut,
        astronaut::list_astronauts,
        astronaut::get_astronaut,
        astronaut::update_astronaut,
        astronaut::delete_astronaut,
        astronaut::astronaut_history,
        system::health_handler,
    ),
    components(schemas(
        AstronautSerialized,
        AstronautResponse,
        CreateAstronautResponse,
        SnapshotResponse,
        ErrorResponse,
        ErrorBody,
        system::HealthResponse,
    )),
    tags(
        (name = "Astronauts", description = "Astronaut records"),
        (name = "System", description = "Service status"),
    )
)]
pub struct ApiDoc;
