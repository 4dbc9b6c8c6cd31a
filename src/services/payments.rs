//! Fine payment service

use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult},
    models::payment::{NewPayment, Page, PageMeta, Payment, PaymentQuery},
    repository::Repository,
};

#[derive(Clone)]
pub struct PaymentsService {
    repository: Repository,
}

impl PaymentsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Record a payment against a loan's fine.
    ///
    /// Validation order: positive amount, loan exists and belongs to the
    /// payer (missing and not-owned are deliberately indistinguishable so
    /// loan existence does not leak to non-owners), a fine exists, amount
    /// within the remaining balance. When the accumulated total covers the
    /// fine, the loan is marked paid together with the payment insert.
    pub async fn create_payment(
        &self,
        user_id: i32,
        loan_id: i32,
        amount: Decimal,
    ) -> AppResult<Payment> {
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidPaymentAmount);
        }

        let loan = self
            .repository
            .loans
            .find_by_id(loan_id)
            .await?
            .filter(|loan| loan.user_id == user_id)
            .ok_or(AppError::LoanNotFound)?;

        if loan.fine_amount <= Decimal::ZERO {
            return Err(AppError::NoFineAssociated);
        }

        let existing = self.repository.payments.find_by_loan(loan_id).await?;
        let total_paid: Decimal = existing.iter().map(|p| p.amount).sum();
        let remaining = loan.fine_amount - total_paid;

        if amount > remaining {
            return Err(AppError::PaymentExceedsBalance(remaining));
        }

        self.repository
            .payments
            .create(NewPayment {
                user_id,
                loan_id,
                amount,
            })
            .await
    }

    /// Get a payment by id
    pub async fn get_payment_details(&self, payment_id: i32) -> AppResult<Payment> {
        self.repository
            .payments
            .find_by_id(payment_id)
            .await?
            .ok_or(AppError::PaymentNotFound)
    }

    /// Filtered, sorted, paginated payment history for a user
    pub async fn get_user_payments(
        &self,
        user_id: i32,
        query: PaymentQuery,
    ) -> AppResult<Page<Payment>> {
        let (data, total) = self.repository.payments.find_by_user(user_id, &query).await?;

        Ok(Page {
            data,
            meta: PageMeta::new(total, query.page, query.page_size),
        })
    }

    /// All payments applied to a loan
    pub async fn get_loan_payments(&self, loan_id: i32) -> AppResult<Vec<Payment>> {
        self.repository.payments.find_by_loan(loan_id).await
    }
}
