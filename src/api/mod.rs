//! API handlers for Biblioteca REST endpoints

pub mod books;
pub mod health;
pub mod loans;
pub mod payments;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Books
        .route("/books/:id/availability", get(books::get_availability))
        // Users
        .route("/users/:id/loans", get(loans::get_user_loans))
        .route("/users/:id/payments", get(payments::get_user_payments))
        // Loans
        .route("/loans", post(loans::create_loan))
        .route("/loans/overdue", get(loans::get_overdue_loans))
        .route("/loans/:id/return", post(loans::return_loan))
        .route("/loans/:id/balance", get(loans::get_remaining_balance))
        .route("/loans/:id/payments", get(payments::get_loan_payments))
        // Payments
        .route("/payments", post(payments::create_payment))
        .route("/payments/:id", get(payments::get_payment_details))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
