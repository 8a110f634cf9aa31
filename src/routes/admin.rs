// Admin read/update of a single car record

use axum::{
    extract::{Path, State},
    response::Json,
};

use crate::{
    error::{AppError, AppResult},
    models::CarRecord,
    AppState,
};

pub async fn get_car(State(app_state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<CarRecord>> {
    tracing::info!("[HANDLER] GET /api/car/{} - Request received.", id);
    match app_state.inventory.get_car(id).await? {
        Some(record) => Ok(Json(record)),
        None => Err(AppError::NotFound(format!("Car {} not found", id))),
    }
}

// The body is a full record. Its id may be left at 0; any other value must match the path.
pub async fn update_car(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Json(mut record): Json<CarRecord>,
) -> AppResult<Json<CarRecord>> {
    tracing::info!("[HANDLER] PUT /api/car/{} - Request received.", id);

    if record.summary.id != 0 && record.summary.id != id {
        return Err(AppError::BadRequest(format!(
            "Record id {} does not match path id {}",
            record.summary.id, id
        )));
    }
    record.summary.id = id;

    match app_state.inventory.update_car(record).await? {
        Some(updated) => {
            tracing::info!("[HANDLER] PUT /api/car/{} - Record updated.", id);
            Ok(Json(updated))
        }
        None => Err(AppError::NotFound(format!("Car {} not found", id))),
    }
}
