//! Business logic services

pub mod loans;
pub mod payments;

use crate::repository::Repository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub loans: loans::LoansService,
    pub payments: payments::PaymentsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository) -> Self {
        Self {
            loans: loans::LoansService::new(repository.clone()),
            payments: payments::PaymentsService::new(repository),
        }
    }
}
