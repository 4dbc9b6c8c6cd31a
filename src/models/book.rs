//! Book model and status

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Book circulation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "book_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum BookStatus {
    Available,
    Rented,
}

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub category: String,
    pub status: BookStatus,
}
