//! Payment model and query types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Payment model from database. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: i32,
    pub user_id: i32,
    pub loan_id: i32,
    pub amount: Decimal,
    pub payment_date: DateTime<Utc>,
}

/// Fields for creating a payment
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub user_id: i32,
    pub loan_id: i32,
    pub amount: Decimal,
}

/// Sortable payment fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentSortField {
    Amount,
    PaymentDate,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Filter, pagination and sort parameters for payment listings.
///
/// Filters combine with AND. Pagination is 1-indexed.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentQuery {
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[validate(range(min = 1))]
    pub page: u32,
    #[validate(range(min = 1, max = 100))]
    pub page_size: u32,
    pub sort_by: PaymentSortField,
    pub order: SortOrder,
}

impl Default for PaymentQuery {
    fn default() -> Self {
        Self {
            min_amount: None,
            max_amount: None,
            start_date: None,
            end_date: None,
            page: 1,
            page_size: 10,
            sort_by: PaymentSortField::PaymentDate,
            order: SortOrder::Desc,
        }
    }
}

/// Pagination metadata for list responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

/// A page of results with its metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl PageMeta {
    pub fn new(total: i64, page: u32, page_size: u32) -> Self {
        let total_pages = ((total as f64) / (page_size as f64)).ceil() as u32;
        Self {
            total,
            page,
            page_size,
            total_pages,
        }
    }
}
