//! Book availability endpoint

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::error::AppResult;

/// Availability response
#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub book_id: i32,
    pub available: bool,
}

/// Check whether a book can currently be borrowed
pub async fn get_availability(
    State(state): State<crate::AppState>,
    Path(book_id): Path<i32>,
) -> AppResult<Json<AvailabilityResponse>> {
    let available = state.services.loans.is_book_available(book_id).await?;

    Ok(Json(AvailabilityResponse { book_id, available }))
}
