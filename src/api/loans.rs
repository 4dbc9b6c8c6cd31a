//! Loan management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    models::loan::{Loan, LoanWithBook, OverdueLoan, ReturnLoanInput},
};

/// Create loan request
#[derive(Deserialize)]
pub struct CreateLoanRequest {
    /// Borrowing user ID
    pub user_id: i32,
    /// Book ID
    pub book_id: i32,
}

/// Return loan request (all fields optional)
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ReturnLoanRequest {
    /// Effective return date, defaults to now
    pub return_date: Option<DateTime<Utc>>,
    /// Fine override for back-office corrections
    pub fine_amount: Option<Decimal>,
}

/// Remaining balance response
#[derive(Serialize)]
pub struct BalanceResponse {
    pub loan_id: i32,
    pub remaining_balance: Decimal,
}

/// Create a new loan (borrow a book)
pub async fn create_loan(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateLoanRequest>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    let loan = state
        .services
        .loans
        .create_loan(request.user_id, request.book_id)
        .await?;

    Ok((StatusCode::CREATED, Json(loan)))
}

/// Return a borrowed book
pub async fn return_loan(
    State(state): State<crate::AppState>,
    Path(loan_id): Path<i32>,
    Json(request): Json<ReturnLoanRequest>,
) -> AppResult<Json<Loan>> {
    let loan = state
        .services
        .loans
        .return_loan(
            loan_id,
            ReturnLoanInput {
                return_date: request.return_date,
                fine_amount: request.fine_amount,
            },
        )
        .await?;

    Ok(Json(loan))
}

/// Get active loans for a specific user
pub async fn get_user_loans(
    State(state): State<crate::AppState>,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<LoanWithBook>>> {
    let loans = state.services.loans.get_user_loans(user_id).await?;
    Ok(Json(loans))
}

/// Get all overdue loans with their live fine projection
pub async fn get_overdue_loans(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<OverdueLoan>>> {
    let loans = state.services.loans.get_overdue_loans().await?;
    Ok(Json(loans))
}

/// Get the fine still owed on a loan
pub async fn get_remaining_balance(
    State(state): State<crate::AppState>,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<BalanceResponse>> {
    let remaining_balance = state.services.loans.get_remaining_balance(loan_id).await?;

    Ok(Json(BalanceResponse {
        loan_id,
        remaining_balance,
    }))
}
