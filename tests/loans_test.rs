//! Loan service integration tests over the in-memory store

mod common;

use biblioteca_server::{
    error::AppError,
    fine,
    models::{
        book::BookStatus,
        loan::{NewLoan, ReturnLoanInput},
    },
    repository::LoanRepository,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use common::{book, setup};

/// A loan insert dated now, as the repository receives it
fn new_loan(user_id: i32, book_id: i32) -> NewLoan {
    let checkout_date = Utc::now();
    NewLoan {
        user_id,
        book_id,
        checkout_date,
        due_date: fine::due_date(checkout_date),
    }
}

#[tokio::test]
async fn create_loan_sets_seven_day_due_date() {
    let (services, store) = setup();
    store.add_book(book(1));

    let loan = services.loans.create_loan(1, 1).await.unwrap();

    assert_eq!(loan.due_date - loan.checkout_date, Duration::days(7));
    assert_eq!(loan.fine_amount, Decimal::ZERO);
    assert!(!loan.paid);
    assert!(loan.return_date.is_none());
    assert_eq!(store.book(1).unwrap().status, BookStatus::Rented);
}

#[tokio::test]
async fn fourth_active_loan_is_rejected() {
    let (services, store) = setup();
    for id in 1..=4 {
        store.add_book(book(id));
    }

    for id in 1..=3 {
        services.loans.create_loan(1, id).await.unwrap();
    }

    let err = services.loans.create_loan(1, 4).await.unwrap_err();
    assert!(matches!(err, AppError::LoanLimitExceeded));

    // Another user is not affected by the first user's limit
    services.loans.create_loan(2, 4).await.unwrap();
}

#[tokio::test]
async fn concurrent_creates_cannot_exceed_loan_limit() {
    let (services, store) = setup();
    for id in 1..=4 {
        store.add_book(book(id));
    }
    for id in 1..=2 {
        services.loans.create_loan(1, id).await.unwrap();
    }

    // Two simultaneous borrows while holding 2 of 3: only one may land
    let (a, b) = tokio::join!(
        services.loans.create_loan(1, 3),
        services.loans.create_loan(1, 4),
    );

    assert!(a.is_ok() != b.is_ok());
    let err = a.err().or(b.err()).unwrap();
    assert!(matches!(err, AppError::LoanLimitExceeded));
    assert_eq!(services.loans.get_user_loans(1).await.unwrap().len(), 3);
}

#[tokio::test]
async fn stale_limit_read_is_recaught_at_write() {
    let (services, store) = setup();
    for id in 1..=4 {
        store.add_book(book(id));
    }
    for id in 1..=3 {
        services.loans.create_loan(1, id).await.unwrap();
    }

    // Insert straight through the repository, as a request whose precondition
    // reads ran before the third loan existed
    let err = store.create(new_loan(1, 4)).await.unwrap_err();
    assert!(matches!(err, AppError::LoanLimitExceeded));
    assert_eq!(services.loans.get_user_loans(1).await.unwrap().len(), 3);
}

#[tokio::test]
async fn stale_fines_read_is_recaught_at_write() {
    let (services, store) = setup();
    store.add_book(book(1));
    store.add_book(book(2));

    let loan = services.loans.create_loan(1, 1).await.unwrap();
    services
        .loans
        .return_loan(
            loan.id,
            ReturnLoanInput {
                return_date: Some(loan.due_date + Duration::days(2)),
                fine_amount: None,
            },
        )
        .await
        .unwrap();

    // Insert as a request whose standing read predates the fine
    let err = store.create(new_loan(1, 2)).await.unwrap_err();
    assert!(matches!(err, AppError::UnpaidFines));
    assert!(services.loans.get_user_loans(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn limit_check_outranks_availability() {
    let (services, store) = setup();
    for id in 1..=3 {
        store.add_book(book(id));
    }
    for id in 1..=3 {
        services.loans.create_loan(1, id).await.unwrap();
    }

    // Book 1 is rented and the limit is reached; the limit wins
    let err = services.loans.create_loan(1, 1).await.unwrap_err();
    assert!(matches!(err, AppError::LoanLimitExceeded));
}

#[tokio::test]
async fn unpaid_fine_blocks_new_loan() {
    let (services, store) = setup();
    store.add_book(book(1));
    store.add_book(book(2));

    let loan = services.loans.create_loan(1, 1).await.unwrap();
    // Return two days late, leaving an unpaid fine
    services
        .loans
        .return_loan(
            loan.id,
            ReturnLoanInput {
                return_date: Some(loan.due_date + Duration::days(2)),
                fine_amount: None,
            },
        )
        .await
        .unwrap();

    let err = services.loans.create_loan(1, 2).await.unwrap_err();
    assert!(matches!(err, AppError::UnpaidFines));
}

#[tokio::test]
async fn unpaid_fine_outranks_availability() {
    let (services, store) = setup();
    store.add_book(book(1));
    store.add_book(book(2));

    // User 2 rents book 2
    services.loans.create_loan(2, 2).await.unwrap();

    // User 1 earns a fine
    let loan = services.loans.create_loan(1, 1).await.unwrap();
    services
        .loans
        .return_loan(
            loan.id,
            ReturnLoanInput {
                return_date: Some(loan.due_date + Duration::days(1)),
                fine_amount: None,
            },
        )
        .await
        .unwrap();

    // Book 2 is also unavailable; the fine is reported first
    let err = services.loans.create_loan(1, 2).await.unwrap_err();
    assert!(matches!(err, AppError::UnpaidFines));
}

#[tokio::test]
async fn borrowing_a_rented_book_fails() {
    let (services, store) = setup();
    store.add_book(book(1));

    services.loans.create_loan(1, 1).await.unwrap();

    let err = services.loans.create_loan(2, 1).await.unwrap_err();
    assert!(matches!(err, AppError::BookNotAvailable(1)));
}

#[tokio::test]
async fn on_time_return_leaves_no_fine() {
    let (services, store) = setup();
    store.add_book(book(1));

    let loan = services.loans.create_loan(1, 1).await.unwrap();
    let returned = services
        .loans
        .return_loan(loan.id, ReturnLoanInput::default())
        .await
        .unwrap();

    assert!(returned.return_date.is_some());
    assert_eq!(returned.fine_amount, Decimal::ZERO);
    assert_eq!(store.book(1).unwrap().status, BookStatus::Available);
}

#[tokio::test]
async fn late_return_materializes_fine() {
    let (services, store) = setup();
    store.add_book(book(1));

    let loan = services.loans.create_loan(1, 1).await.unwrap();
    let returned = services
        .loans
        .return_loan(
            loan.id,
            ReturnLoanInput {
                return_date: Some(loan.due_date + Duration::days(4)),
                fine_amount: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(returned.fine_amount, Decimal::from(8));
}

#[tokio::test]
async fn second_return_fails_and_changes_nothing() {
    let (services, store) = setup();
    store.add_book(book(1));

    let loan = services.loans.create_loan(1, 1).await.unwrap();
    services
        .loans
        .return_loan(
            loan.id,
            ReturnLoanInput {
                return_date: Some(loan.due_date + Duration::days(2)),
                fine_amount: None,
            },
        )
        .await
        .unwrap();

    let before = store.loan(loan.id).unwrap();

    let err = services
        .loans
        .return_loan(loan.id, ReturnLoanInput::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::LoanAlreadyReturned));

    let after = store.loan(loan.id).unwrap();
    assert_eq!(after.return_date, before.return_date);
    assert_eq!(after.fine_amount, before.fine_amount);
    assert_eq!(store.book(1).unwrap().status, BookStatus::Available);
}

#[tokio::test]
async fn returning_unknown_loan_fails() {
    let (services, _store) = setup();

    let err = services
        .loans
        .return_loan(999, ReturnLoanInput::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::LoanNotFound));
}

#[tokio::test]
async fn user_loans_lists_active_with_books() {
    let (services, store) = setup();
    store.add_book(book(1));
    store.add_book(book(2));

    let first = services.loans.create_loan(1, 1).await.unwrap();
    services.loans.create_loan(1, 2).await.unwrap();
    services
        .loans
        .return_loan(first.id, ReturnLoanInput::default())
        .await
        .unwrap();

    let loans = services.loans.get_user_loans(1).await.unwrap();
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0].loan.book_id, 2);
    assert_eq!(loans[0].book.title, "Book 2");
}

#[tokio::test]
async fn overdue_listing_projects_live_fine() {
    let (services, store) = setup();
    store.add_book(book(1));
    store.add_book(book(2));

    let overdue = services.loans.create_loan(1, 1).await.unwrap();
    services.loans.create_loan(2, 2).await.unwrap();

    // Push the first loan two days past due
    store.backdate_loan(overdue.id, Duration::days(9));

    let listed = services.loans.get_overdue_loans().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].loan.id, overdue.id);
    // Two full days late at 2 per day, computed live
    assert_eq!(listed[0].current_fine, Decimal::from(4));
    // The stored amount stays untouched until return
    assert_eq!(store.loan(overdue.id).unwrap().fine_amount, Decimal::ZERO);
}

#[tokio::test]
async fn availability_reflects_loan_state() {
    let (services, store) = setup();
    store.add_book(book(1));

    assert!(services.loans.is_book_available(1).await.unwrap());

    let loan = services.loans.create_loan(1, 1).await.unwrap();
    assert!(!services.loans.is_book_available(1).await.unwrap());

    services
        .loans
        .return_loan(loan.id, ReturnLoanInput::default())
        .await
        .unwrap();
    assert!(services.loans.is_book_available(1).await.unwrap());
}

#[tokio::test]
async fn balance_of_unknown_loan_fails() {
    let (services, _store) = setup();

    let err = services.loans.get_remaining_balance(999).await.unwrap_err();
    assert!(matches!(err, AppError::LoanNotFound));
}

#[tokio::test]
async fn fine_override_wins_on_late_return() {
    let (services, store) = setup();
    store.add_book(book(1));

    let loan = services.loans.create_loan(1, 1).await.unwrap();
    let returned = services
        .loans
        .return_loan(
            loan.id,
            ReturnLoanInput {
                return_date: Some(loan.due_date + Duration::days(4)),
                fine_amount: Some(Decimal::from(5)),
            },
        )
        .await
        .unwrap();

    assert_eq!(returned.fine_amount, Decimal::from(5));
}

#[tokio::test]
async fn future_due_loans_are_not_overdue() {
    let (services, store) = setup();
    store.add_book(book(1));

    services.loans.create_loan(1, 1).await.unwrap();

    let listed = services.loans.get_overdue_loans().await.unwrap();
    assert!(listed.is_empty());
}
