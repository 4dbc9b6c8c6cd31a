//! Error types for Biblioteca server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Application error codes exposed to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    DbFailure = 2,
    NoSuchData = 3,
    BadValue = 4,
    LoanLimitExceeded = 5,
    UnpaidFines = 6,
    BookNotAvailable = 7,
    NoSuchLoan = 8,
    LoanAlreadyReturned = 9,
    NoSuchPayment = 10,
    InvalidPaymentAmount = 11,
    NoFineAssociated = 12,
    PaymentExceedsBalance = 13,
}

/// Main application error type
///
/// Domain-rule rejections are distinct variants so callers can tell them
/// apart; persistence faults stay in `Database`/`Internal` and are never
/// reported as rule violations.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Maximum of 3 active loans allowed")]
    LoanLimitExceeded,

    #[error("Cannot borrow books with unpaid fines")]
    UnpaidFines,

    #[error("Book with id {0} is not available")]
    BookNotAvailable(i32),

    #[error("Loan not found or does not belong to the user")]
    LoanNotFound,

    #[error("Book already returned")]
    LoanAlreadyReturned,

    #[error("Payment not found")]
    PaymentNotFound,

    #[error("Invalid payment amount")]
    InvalidPaymentAmount,

    #[error("No fine associated with this loan")]
    NoFineAssociated,

    #[error("Payment exceeds remaining balance of {0}")]
    PaymentExceedsBalance(Decimal),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchData, msg.clone())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
            AppError::LoanLimitExceeded => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::LoanLimitExceeded,
                self.to_string(),
            ),
            AppError::UnpaidFines => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::UnpaidFines,
                self.to_string(),
            ),
            AppError::BookNotAvailable(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::BookNotAvailable,
                self.to_string(),
            ),
            AppError::LoanNotFound => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchLoan, self.to_string())
            }
            AppError::LoanAlreadyReturned => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::LoanAlreadyReturned,
                self.to_string(),
            ),
            AppError::PaymentNotFound => (
                StatusCode::NOT_FOUND,
                ErrorCode::NoSuchPayment,
                self.to_string(),
            ),
            AppError::InvalidPaymentAmount => (
                StatusCode::BAD_REQUEST,
                ErrorCode::InvalidPaymentAmount,
                self.to_string(),
            ),
            AppError::NoFineAssociated => (
                StatusCode::BAD_REQUEST,
                ErrorCode::NoFineAssociated,
                self.to_string(),
            ),
            AppError::PaymentExceedsBalance(_) => (
                StatusCode::BAD_REQUEST,
                ErrorCode::PaymentExceedsBalance,
                self.to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
