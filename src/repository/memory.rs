//! In-memory store implementing every persistence contract
//!
//! One mutex guards the whole state, which serializes all operations and
//! gives the same atomicity the Postgres adapters get from transactions.
//! Used by the test suites; not wired into the server binary.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookStatus},
        loan::{Loan, LoanWithBook, NewLoan, MAX_ACTIVE_LOANS},
        payment::{NewPayment, Payment, PaymentQuery, PaymentSortField, SortOrder},
    },
    repository::{BookGateway, LoanRepository, PaymentRepository, UserStandingGateway},
};

#[derive(Default)]
struct State {
    books: HashMap<i32, Book>,
    loans: HashMap<i32, Loan>,
    payments: HashMap<i32, Payment>,
    next_loan_id: i32,
    next_payment_id: i32,
}

pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State::default()),
        })
    }

    /// Seed a book into the catalog
    pub fn add_book(&self, book: Book) {
        let mut state = self.state.lock().unwrap();
        state.books.insert(book.id, book);
    }

    /// Current catalog entry, for test assertions
    pub fn book(&self, book_id: i32) -> Option<Book> {
        self.state.lock().unwrap().books.get(&book_id).cloned()
    }

    /// Current loan record, for test assertions
    pub fn loan(&self, loan_id: i32) -> Option<Loan> {
        self.state.lock().unwrap().loans.get(&loan_id).cloned()
    }

    /// Shift a loan's checkout and due dates into the past, for tests that
    /// need an overdue loan without waiting for one
    pub fn backdate_loan(&self, loan_id: i32, by: chrono::Duration) {
        let mut state = self.state.lock().unwrap();
        if let Some(loan) = state.loans.get_mut(&loan_id) {
            loan.checkout_date -= by;
            loan.due_date -= by;
        }
    }
}

#[async_trait::async_trait]
impl BookGateway for MemoryStore {
    async fn is_available(&self, book_id: i32) -> AppResult<bool> {
        let state = self.state.lock().unwrap();
        Ok(state
            .books
            .get(&book_id)
            .map(|b| b.status == BookStatus::Available)
            .unwrap_or(false))
    }
}

#[async_trait::async_trait]
impl UserStandingGateway for MemoryStore {
    async fn has_unpaid_fines(&self, user_id: i32) -> AppResult<bool> {
        let state = self.state.lock().unwrap();
        Ok(state
            .loans
            .values()
            .any(|l| l.user_id == user_id && l.fine_amount > Decimal::ZERO && !l.paid))
    }
}

#[async_trait::async_trait]
impl LoanRepository for MemoryStore {
    async fn create(&self, loan: NewLoan) -> AppResult<Loan> {
        let mut state = self.state.lock().unwrap();

        // Preconditions are repeated here because the service reads them
        // before taking this lock; re-checks follow the same priority order
        // as the service.
        let active_count = state
            .loans
            .values()
            .filter(|l| l.user_id == loan.user_id && l.is_active())
            .count() as i64;
        if active_count >= MAX_ACTIVE_LOANS {
            return Err(AppError::LoanLimitExceeded);
        }

        let unpaid_fines = state
            .loans
            .values()
            .any(|l| l.user_id == loan.user_id && l.fine_amount > Decimal::ZERO && !l.paid);
        if unpaid_fines {
            return Err(AppError::UnpaidFines);
        }

        let book = state
            .books
            .get(&loan.book_id)
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", loan.book_id)))?;
        if book.status != BookStatus::Available {
            return Err(AppError::BookNotAvailable(loan.book_id));
        }

        state.next_loan_id += 1;
        let created = Loan {
            id: state.next_loan_id,
            user_id: loan.user_id,
            book_id: loan.book_id,
            checkout_date: loan.checkout_date,
            due_date: loan.due_date,
            return_date: None,
            fine_amount: Decimal::ZERO,
            paid: false,
        };

        state.loans.insert(created.id, created.clone());
        if let Some(book) = state.books.get_mut(&loan.book_id) {
            book.status = BookStatus::Rented;
        }

        Ok(created)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Loan>> {
        Ok(self.state.lock().unwrap().loans.get(&id).cloned())
    }

    async fn find_active_by_user(&self, user_id: i32) -> AppResult<Vec<LoanWithBook>> {
        let state = self.state.lock().unwrap();
        let mut loans: Vec<LoanWithBook> = state
            .loans
            .values()
            .filter(|l| l.user_id == user_id && l.is_active())
            .filter_map(|l| {
                state.books.get(&l.book_id).map(|b| LoanWithBook {
                    loan: l.clone(),
                    book: b.clone(),
                })
            })
            .collect();
        loans.sort_by_key(|l| l.loan.checkout_date);
        Ok(loans)
    }

    async fn find_overdue(&self, as_of: DateTime<Utc>) -> AppResult<Vec<Loan>> {
        let state = self.state.lock().unwrap();
        let mut loans: Vec<Loan> = state
            .loans
            .values()
            .filter(|l| l.is_active() && l.due_date < as_of)
            .cloned()
            .collect();
        loans.sort_by_key(|l| l.due_date);
        Ok(loans)
    }

    async fn finish(
        &self,
        id: i32,
        returned_at: DateTime<Utc>,
        fine_amount: Decimal,
    ) -> AppResult<Loan> {
        let mut state = self.state.lock().unwrap();

        let book_id;
        let updated;
        {
            let loan = state.loans.get_mut(&id).ok_or(AppError::LoanNotFound)?;
            if loan.return_date.is_some() {
                return Err(AppError::LoanAlreadyReturned);
            }
            loan.return_date = Some(returned_at);
            loan.fine_amount = fine_amount;
            book_id = loan.book_id;
            updated = loan.clone();
        }

        if let Some(book) = state.books.get_mut(&book_id) {
            book.status = BookStatus::Available;
        }

        Ok(updated)
    }
}

#[async_trait::async_trait]
impl PaymentRepository for MemoryStore {
    async fn create(&self, payment: NewPayment) -> AppResult<Payment> {
        let mut state = self.state.lock().unwrap();

        let fine_amount = state
            .loans
            .get(&payment.loan_id)
            .map(|l| l.fine_amount)
            .ok_or(AppError::LoanNotFound)?;

        let total_paid: Decimal = state
            .payments
            .values()
            .filter(|p| p.loan_id == payment.loan_id)
            .map(|p| p.amount)
            .sum();

        let remaining = fine_amount - total_paid;
        if payment.amount > remaining {
            return Err(AppError::PaymentExceedsBalance(remaining));
        }

        state.next_payment_id += 1;
        let created = Payment {
            id: state.next_payment_id,
            user_id: payment.user_id,
            loan_id: payment.loan_id,
            amount: payment.amount,
            payment_date: Utc::now(),
        };
        state.payments.insert(created.id, created.clone());

        if total_paid + payment.amount >= fine_amount {
            if let Some(loan) = state.loans.get_mut(&payment.loan_id) {
                loan.paid = true;
            }
        }

        Ok(created)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Payment>> {
        Ok(self.state.lock().unwrap().payments.get(&id).cloned())
    }

    async fn find_by_loan(&self, loan_id: i32) -> AppResult<Vec<Payment>> {
        let state = self.state.lock().unwrap();
        let mut payments: Vec<Payment> = state
            .payments
            .values()
            .filter(|p| p.loan_id == loan_id)
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.payment_date);
        Ok(payments)
    }

    async fn find_by_user(
        &self,
        user_id: i32,
        query: &PaymentQuery,
    ) -> AppResult<(Vec<Payment>, i64)> {
        let state = self.state.lock().unwrap();

        let mut payments: Vec<Payment> = state
            .payments
            .values()
            .filter(|p| p.user_id == user_id)
            .filter(|p| query.min_amount.map_or(true, |min| p.amount >= min))
            .filter(|p| query.max_amount.map_or(true, |max| p.amount <= max))
            .filter(|p| query.start_date.map_or(true, |start| p.payment_date >= start))
            .filter(|p| query.end_date.map_or(true, |end| p.payment_date <= end))
            .cloned()
            .collect();

        match query.sort_by {
            PaymentSortField::Amount => payments.sort_by_key(|p| p.amount),
            PaymentSortField::PaymentDate => payments.sort_by_key(|p| p.payment_date),
        }
        if query.order == SortOrder::Desc {
            payments.reverse();
        }

        let total = payments.len() as i64;
        let offset = query.page.saturating_sub(1) as usize * query.page_size as usize;
        let page: Vec<Payment> = payments
            .into_iter()
            .skip(offset)
            .take(query.page_size as usize)
            .collect();

        Ok((page, total))
    }
}
