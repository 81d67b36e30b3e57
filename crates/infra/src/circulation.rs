//! Lending desk: the checked borrow / return operations.
//!
//! The checks and the writes they guard run in the same unit of work, so two
//! callers racing for the last copy are decided by whichever unit runs first.

use libris_catalog::{BookStatistics, BorrowRecord, BorrowStatus, NewBorrowRecord, Rating};
use libris_core::{BookId, BorrowId, UserId};

use crate::engine::ReturnEvent;
use crate::error::LibraryError;
use crate::library::Library;
use crate::store::LibraryStore;

impl<S> Library<S>
where
    S: LibraryStore,
{
    /// Lend one copy of `book_id` to `user_id`.
    ///
    /// Fails with `NoCopiesAvailable` when no copy is on the shelf and with
    /// `AlreadyBorrowed` when the user still holds this book (borrowed or
    /// overdue). The new record is due one loan period from now.
    pub fn borrow(&self, user_id: UserId, book_id: BookId) -> Result<BorrowRecord, LibraryError> {
        let loan_period = self.config().loan_period();
        self.unit("borrow", |engine, uow| {
            uow.tables.account(user_id)?;
            let book = uow.tables.book(book_id)?;
            if !book.is_available() {
                return Err(LibraryError::NoCopiesAvailable {
                    title: book.title.clone(),
                });
            }
            if uow.tables.active_borrow(user_id, book_id).is_some() {
                return Err(LibraryError::AlreadyBorrowed {
                    title: book.title.clone(),
                });
            }

            let now = uow.now;
            engine.insert_borrow(
                uow,
                NewBorrowRecord {
                    borrowed_at: Some(now),
                    due_date: Some(now + loan_period),
                    ..NewBorrowRecord::borrowed(user_id, book_id)
                },
            )
        })
    }

    /// Take back the loan `borrow_id` on behalf of `acting_user`.
    ///
    /// Only the borrower can return a loan, and only while it is open;
    /// anything else reads as `NotFound`.
    pub fn return_book(&self, borrow_id: BorrowId, acting_user: UserId) -> Result<BorrowRecord, LibraryError> {
        self.unit("return_book", |engine, uow| {
            let open = uow
                .tables
                .borrows
                .get(&borrow_id)
                .is_some_and(|r| r.user_id == acting_user && r.is_active());
            if !open {
                return Err(LibraryError::not_found(format!(
                    "active borrow record {borrow_id} of user {acting_user}"
                )));
            }

            engine.raise_return(
                uow,
                ReturnEvent {
                    record_id: borrow_id,
                    returned_by: acting_user,
                },
            )
        })
    }

    /// Record a 1–5 rating of `book_id` by `user_id`.
    pub fn rate_book(&self, user_id: UserId, book_id: BookId, score: u8) -> Result<BookStatistics, LibraryError> {
        let rating = Rating::new(score)?;
        self.unit("rate_book", |_, uow| {
            uow.tables.account(user_id)?;
            uow.tables.book(book_id)?;
            let stats = uow.tables.statistics_mut(book_id)?;
            stats.record_rating(rating);
            tracing::info!(%book_id, %user_id, score, "book rated");
            Ok(stats.clone())
        })
    }

    /// Flag every borrowed record past its due date as overdue.
    ///
    /// Returns how many records changed.
    pub fn mark_overdue(&self) -> Result<usize, LibraryError> {
        self.unit("mark_overdue", |_, uow| {
            let now = uow.now;
            let mut flagged = 0;
            for record in uow.tables.borrows.values_mut() {
                if record.is_overdue_at(now) {
                    record.mark_overdue();
                    flagged += 1;
                }
            }
            if flagged > 0 {
                tracing::info!(flagged, status = %BorrowStatus::Overdue, "loans flagged");
            }
            Ok(flagged)
        })
    }
}
