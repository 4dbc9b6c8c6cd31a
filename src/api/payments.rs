//! Fine payment endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::payment::{Page, Payment, PaymentQuery},
};

/// Create payment request
#[derive(Deserialize)]
pub struct CreatePaymentRequest {
    /// Paying user ID
    pub user_id: i32,
    /// Loan the payment applies to
    pub loan_id: i32,
    /// Amount in currency units
    pub amount: Decimal,
}

/// Record a payment against a loan's fine
pub async fn create_payment(
    State(state): State<crate::AppState>,
    Json(request): Json<CreatePaymentRequest>,
) -> AppResult<(StatusCode, Json<Payment>)> {
    let payment = state
        .services
        .payments
        .create_payment(request.user_id, request.loan_id, request.amount)
        .await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

/// Get a payment by id
pub async fn get_payment_details(
    State(state): State<crate::AppState>,
    Path(payment_id): Path<i32>,
) -> AppResult<Json<Payment>> {
    let payment = state
        .services
        .payments
        .get_payment_details(payment_id)
        .await?;

    Ok(Json(payment))
}

/// Get a user's payment history, filtered, sorted and paginated
pub async fn get_user_payments(
    State(state): State<crate::AppState>,
    Path(user_id): Path<i32>,
    Query(query): Query<PaymentQuery>,
) -> AppResult<Json<Page<Payment>>> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let page = state.services.payments.get_user_payments(user_id, query).await?;
    Ok(Json(page))
}

/// Get all payments applied to a loan
pub async fn get_loan_payments(
    State(state): State<crate::AppState>,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<Vec<Payment>>> {
    let payments = state.services.payments.get_loan_payments(loan_id).await?;
    Ok(Json(payments))
}
