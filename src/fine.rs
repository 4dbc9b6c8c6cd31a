//! Fine policy: due-date and overdue-fine computation
//!
//! Pure functions, no IO. Fines are expressed in whole currency units.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

/// Loan period in days
pub const LOAN_PERIOD_DAYS: i64 = 7;

/// Fine charged per overdue day, in currency units
pub const FINE_PER_DAY: i64 = 2;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Due date for a loan checked out at the given instant
pub fn due_date(checkout_date: DateTime<Utc>) -> DateTime<Utc> {
    checkout_date + Duration::days(LOAN_PERIOD_DAYS)
}

/// Fine owed at `as_of` for a loan due at `due_date`.
///
/// Zero while not overdue. Overdue time is rounded up to whole calendar
/// days, so any fraction of a day past due is charged as a full day.
pub fn fine(due_date: DateTime<Utc>, as_of: DateTime<Utc>) -> Decimal {
    let overdue_millis = (as_of - due_date).num_milliseconds();
    if overdue_millis <= 0 {
        return Decimal::ZERO;
    }

    let overdue_days = (overdue_millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY;
    Decimal::from(overdue_days * FINE_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn due_date_is_checkout_plus_seven_days() {
        let checkout = at(2024, 3, 10, 14);
        assert_eq!(due_date(checkout), at(2024, 3, 17, 14));
    }

    #[test]
    fn no_fine_before_or_at_due_date() {
        let due = at(2024, 1, 1, 0);
        assert_eq!(fine(due, due - Duration::days(2)), Decimal::ZERO);
        assert_eq!(fine(due, due), Decimal::ZERO);
    }

    #[test]
    fn one_day_overdue_charges_one_day() {
        let due = at(2024, 1, 1, 0);
        assert_eq!(fine(due, due + Duration::days(1)), Decimal::from(2));
    }

    #[test]
    fn fractional_day_rounds_up() {
        let due = at(2024, 1, 1, 0);
        let as_of = due + Duration::days(1) + Duration::hours(1);
        assert_eq!(fine(due, as_of), Decimal::from(4));
    }

    #[test]
    fn four_days_overdue_charges_eight() {
        let due = at(2024, 1, 1, 0);
        assert_eq!(fine(due, at(2024, 1, 5, 0)), Decimal::from(8));
    }
}
