use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use libris_core::{BookId, BorrowId, DomainError, DomainResult, Entity, UserId};

/// Standard loan period, in days.
pub const LOAN_PERIOD_DAYS: i64 = 14;

/// Borrow record lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorrowStatus {
    Borrowed,
    Returned,
    Overdue,
}

impl BorrowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BorrowStatus::Borrowed => "borrowed",
            BorrowStatus::Returned => "returned",
            BorrowStatus::Overdue => "overdue",
        }
    }

    /// The copy is still out (borrowed or overdue).
    pub fn is_active(self) -> bool {
        !matches!(self, BorrowStatus::Returned)
    }
}

impl core::fmt::Display for BorrowStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One loan of one book to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowRecord {
    pub id: BorrowId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub borrowed_at: DateTime<Utc>,
    /// Set once, when the record is first written.
    pub due_date: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: BorrowStatus,
}

/// Input for writing a borrow record directly (outside the lending desk).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBorrowRecord {
    pub user_id: UserId,
    pub book_id: BookId,
    /// Defaults to the moment of the write.
    #[serde(default)]
    pub borrowed_at: Option<DateTime<Utc>>,
    /// Defaults to `borrowed_at` plus the loan period.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default = "default_status")]
    pub status: BorrowStatus,
}

fn default_status() -> BorrowStatus {
    BorrowStatus::Borrowed
}

impl NewBorrowRecord {
    pub fn borrowed(user_id: UserId, book_id: BookId) -> Self {
        Self {
            user_id,
            book_id,
            borrowed_at: None,
            due_date: None,
            status: BorrowStatus::Borrowed,
        }
    }
}

impl BorrowRecord {
    pub fn new(id: BorrowId, input: NewBorrowRecord, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: input.user_id,
            book_id: input.book_id,
            borrowed_at: input.borrowed_at.unwrap_or(now),
            due_date: input.due_date,
            returned_at: None,
            status: input.status,
        }
    }

    /// Fill in the due date from the borrow date if it was not supplied.
    ///
    /// A due date that is already set is never moved.
    pub fn assign_due_date(&mut self, loan_period: Duration) {
        if self.due_date.is_none() {
            self.due_date = Some(self.borrowed_at + loan_period);
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Borrowed, past its due date, and not yet flagged.
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        self.status == BorrowStatus::Borrowed && self.due_date.is_some_and(|due| due < now)
    }

    pub fn mark_overdue(&mut self) {
        if self.status == BorrowStatus::Borrowed {
            self.status = BorrowStatus::Overdue;
        }
    }

    /// Close the loan.
    pub fn mark_returned(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if !self.is_active() {
            return Err(DomainError::conflict(format!(
                "borrow record {} is already returned",
                self.id
            )));
        }
        self.status = BorrowStatus::Returned;
        self.returned_at = Some(at);
        Ok(())
    }
}

impl Entity for BorrowRecord {
    type Id = BorrowId;
    const KIND: &'static str = "borrow_record";

    fn id(&self) -> BorrowId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    fn record(input: NewBorrowRecord) -> BorrowRecord {
        BorrowRecord::new(BorrowId::new(), input, t0())
    }

    #[test]
    fn due_date_defaults_to_borrow_date_plus_loan_period() {
        let mut r = record(NewBorrowRecord::borrowed(UserId::new(), BookId::new()));
        assert_eq!(r.borrowed_at, t0());
        assert_eq!(r.due_date, None);

        r.assign_due_date(Duration::days(LOAN_PERIOD_DAYS));
        assert_eq!(r.due_date, Some(t0() + Duration::days(14)));
    }

    #[test]
    fn supplied_due_date_is_kept() {
        let due = t0() + Duration::days(3);
        let mut r = record(NewBorrowRecord {
            due_date: Some(due),
            ..NewBorrowRecord::borrowed(UserId::new(), BookId::new())
        });

        r.assign_due_date(Duration::days(LOAN_PERIOD_DAYS));
        r.assign_due_date(Duration::days(30));
        assert_eq!(r.due_date, Some(due));
    }

    #[test]
    fn overdue_only_after_the_due_date() {
        let mut r = record(NewBorrowRecord::borrowed(UserId::new(), BookId::new()));
        r.assign_due_date(Duration::days(LOAN_PERIOD_DAYS));

        assert!(!r.is_overdue_at(t0() + Duration::days(14)));
        assert!(r.is_overdue_at(t0() + Duration::days(15)));

        r.mark_overdue();
        assert_eq!(r.status, BorrowStatus::Overdue);
        assert!(r.is_active());
        assert!(!r.is_overdue_at(t0() + Duration::days(20)));
    }

    #[test]
    fn return_closes_the_record_once() {
        let mut r = record(NewBorrowRecord::borrowed(UserId::new(), BookId::new()));
        let back = t0() + Duration::days(2);

        r.mark_returned(back).unwrap();
        assert_eq!(r.status, BorrowStatus::Returned);
        assert_eq!(r.returned_at, Some(back));

        assert!(matches!(r.mark_returned(back), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&BorrowStatus::Overdue).unwrap(), "\"overdue\"");
    }
}
