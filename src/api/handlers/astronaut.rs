//! Astronaut CRUD handlers: create, list, get, update, delete, history.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{AstronautResponse, CreateAstronautResponse, SnapshotResponse};
use crate::app_state::AppState;
use crate::domain::{AstronautDeserialized, AstronautId, AstronautSerialized};
use crate::error::{ErrorResponse, RegistryError};
use crate::persistence::TransactionalExecutor;

/// `POST /astronauts`: Create an astronaut.
///
/// # Errors
///
/// Returns [`RegistryError`] on invalid input or store failure.
#[utoipa::path(
    post,
    path = "/astronauts",
    tag = "Astronauts",
    summary = "Create an astronaut",
    description = "Validates the submitted fields and stores them as the first snapshot of a new astronaut.",
    request_body = AstronautSerialized,
    responses(
        (status = 201, description = "Astronaut created", body = CreateAstronautResponse),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
    )
)]
pub async fn create_astronaut<E: TransactionalExecutor>(
    State(state): State<AppState<E>>,
    payload: Result<Json<AstronautSerialized>, JsonRejection>,
) -> Result<impl IntoResponse, RegistryError> {
    let Json(req) = payload?;
    let data = parse_astronaut(&req)?;
    let id = state.astronaut_service.create_astronaut(&data).await?;
    Ok((StatusCode::CREATED, Json(CreateAstronautResponse { id })))
}

/// `GET /astronauts`: List astronauts that are not deleted.
///
/// # Errors
///
/// Returns [`RegistryError`] on store failure.
#[utoipa::path(
    get,
    path = "/astronauts",
    tag = "Astronauts",
    summary = "List astronauts",
    description = "Returns the current state of every astronaut that is not deleted, ordered by id.",
    responses(
        (status = 200, description = "Astronaut list", body = Vec<AstronautResponse>),
    )
)]
pub async fn list_astronauts<E: TransactionalExecutor>(
    State(state): State<AppState<E>>,
) -> Result<impl IntoResponse, RegistryError> {
    let astronauts = state.astronaut_service.list_astronauts().await?;
    let data: Vec<AstronautResponse> = astronauts.into_iter().map(Into::into).collect();
    Ok(Json(data))
}

/// `GET /astronauts/{id}`: Get the current state of an astronaut.
///
/// # Errors
///
/// Returns [`RegistryError::NotFound`] if the astronaut does not exist or is deleted.
#[utoipa::path(
    get,
    path = "/astronauts/{id}",
    tag = "Astronauts",
    summary = "Get an astronaut",
    params(
        ("id" = i64, Path, description = "Astronaut id"),
    ),
    responses(
        (status = 200, description = "Current state", body = AstronautResponse),
        (status = 404, description = "Astronaut not found", body = ErrorResponse),
    )
)]
pub async fn get_astronaut<E: TransactionalExecutor>(
    State(state): State<AppState<E>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, RegistryError> {
    let astronaut = state
        .astronaut_service
        .get_astronaut(AstronautId::new(id))
        .await?;
    Ok(Json(AstronautResponse::from(astronaut)))
}

/// `PUT /astronauts/{id}`: Replace the fields of an astronaut.
///
/// # Errors
///
/// Returns [`RegistryError`] on invalid input, unknown id, or store failure.
#[utoipa::path(
    put,
    path = "/astronauts/{id}",
    tag = "Astronauts",
    summary = "Update an astronaut",
    description = "Expires the current snapshot and stores the submitted fields as a new one. Updating a deleted astronaut restores it.",
    params(
        ("id" = i64, Path, description = "Astronaut id"),
    ),
    request_body = AstronautSerialized,
    responses(
        (status = 204, description = "Astronaut updated"),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 404, description = "Astronaut not found", body = ErrorResponse),
    )
)]
pub async fn update_astronaut<E: TransactionalExecutor>(
    State(state): State<AppState<E>>,
    Path(id): Path<i64>,
    payload: Result<Json<AstronautSerialized>, JsonRejection>,
) -> Result<impl IntoResponse, RegistryError> {
    let Json(req) = payload?;
    let data = parse_astronaut(&req)?;
    state
        .astronaut_service
        .update_astronaut(AstronautId::new(id), &data)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /astronauts/{id}`: Soft-delete an astronaut.
///
/// # Errors
///
/// Returns [`RegistryError::NotFound`] if the astronaut does not exist or is
/// already deleted.
#[utoipa::path(
    delete,
    path = "/astronauts/{id}",
    tag = "Astronauts",
    summary = "Delete an astronaut",
    description = "Stores the current fields as a new snapshot marked deleted. History is kept.",
    params(
        ("id" = i64, Path, description = "Astronaut id"),
    ),
    responses(
        (status = 204, description = "Astronaut deleted"),
        (status = 404, description = "Astronaut not found", body = ErrorResponse),
    )
)]
pub async fn delete_astronaut<E: TransactionalExecutor>(
    State(state): State<AppState<E>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, RegistryError> {
    state
        .astronaut_service
        .delete_astronaut(AstronautId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /astronauts/{id}/history`: List every snapshot of an astronaut.
///
/// # Errors
///
/// Returns [`RegistryError::NotFound`] if the astronaut was never created.
#[utoipa::path(
    get,
    path = "/astronauts/{id}/history",
    tag = "Astronauts",
    summary = "Get astronaut history",
    description = "Returns all snapshots of the astronaut oldest first, including deleted ones.",
    params(
        ("id" = i64, Path, description = "Astronaut id"),
    ),
    responses(
        (status = 200, description = "Snapshot history", body = Vec<SnapshotResponse>),
        (status = 404, description = "Astronaut not found", body = ErrorResponse),
    )
)]
pub async fn astronaut_history<E: TransactionalExecutor>(
    State(state): State<AppState<E>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, RegistryError> {
    let snapshots = state
        .astronaut_service
        .astronaut_history(AstronautId::new(id))
        .await?;
    let data: Vec<SnapshotResponse> = snapshots.into_iter().map(Into::into).collect();
    Ok(Json(data))
}

/// Astronaut routes.
pub fn routes<E: TransactionalExecutor>() -> Router<AppState<E>> {
    Router::new()
        .route(
            "/astronauts",
            get(list_astronauts::<E>).post(create_astronaut::<E>),
        )
        .route(
            "/astronauts/{id}",
            get(get_astronaut::<E>)
                .put(update_astronaut::<E>)
                .delete(delete_astronaut::<E>),
        )
        .route("/astronauts/{id}/history", get(astronaut_history::<E>))
}

/// Validates a submitted astronaut and resolves its birthdate.
fn parse_astronaut(req: &AstronautSerialized) -> Result<AstronautDeserialized, RegistryError> {
    req.validate()?;
    req.to_deserialized()
}
