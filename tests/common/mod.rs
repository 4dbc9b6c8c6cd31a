//! Shared test fixtures

use std::sync::Arc;

use biblioteca_server::{
    models::book::{Book, BookStatus},
    repository::{memory::MemoryStore, Repository},
    services::Services,
};

/// Services wired to a fresh in-memory store
pub fn setup() -> (Services, Arc<MemoryStore>) {
    let store = MemoryStore::new();
    let services = Services::new(Repository::in_memory(store.clone()));
    (services, store)
}

/// An available book with the given id
pub fn book(id: i32) -> Book {
    Book {
        id,
        title: format!("Book {}", id),
        author: "Test Author".to_string(),
        category: "Fiction".to_string(),
        status: BookStatus::Available,
    }
}
