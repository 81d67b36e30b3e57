//! The lending desk's derived-state reactions.
//!
//! | Subject       | Phase         | Reactions (in firing order)                               |
//! |---------------|---------------|-----------------------------------------------------------|
//! | author        | BeforePersist | `normalize_author`                                        |
//! | book          | BeforePersist | `normalize_book`                                          |
//! | book          | AfterInsert   | `log_book_created`                                        |
//! | book          | AfterDelete   | `log_book_deleted`                                        |
//! | user          | AfterInsert   | `log_user_registered`                                     |
//! | borrow_record | BeforePersist | `assign_due_date`                                         |
//! | borrow_record | AfterInsert   | `count_borrow_in_statistics`, `count_borrow_in_profile`, `take_copy`, `log_book_borrowed` |
//! | return        | OnInvocation  | `close_borrow_record`, `count_return_in_statistics`, `restore_copy`, `log_book_returned` |
//!
//! Borrow-insert reactions only act on records inserted with status
//! `borrowed`.

use libris_catalog::{
    ActivityEntry, Author, Book, BookStatistics, BorrowRecord, BorrowStatus, UserAccount,
    UserProfile,
};
use libris_core::{DomainError, DomainResult};
use libris_events::Phase;

use crate::config::LibraryConfig;
use crate::engine::{DerivationEngine, ReturnEvent};
use crate::error::LibraryError;
use crate::store::UnitOfWork;

/// Register every standard reaction on `engine`.
pub fn register_standard(engine: &mut DerivationEngine, config: &LibraryConfig) {
    engine
        .authors_mut()
        .register(Phase::BeforePersist, "normalize_author", normalize_author);

    engine
        .books_mut()
        .register(Phase::BeforePersist, "normalize_book", normalize_book)
        .register(Phase::AfterInsert, "log_book_created", log_book_created)
        .register(Phase::AfterDelete, "log_book_deleted", log_book_deleted);

    engine
        .accounts_mut()
        .register(Phase::AfterInsert, "log_user_registered", log_user_registered);

    let loan_period = config.loan_period();
    engine
        .borrows_mut()
        .register(
            Phase::BeforePersist,
            "assign_due_date",
            move |_: &mut UnitOfWork, record: &mut BorrowRecord| -> DomainResult<()> {
                record.assign_due_date(loan_period);
                Ok(())
            },
        )
        .register(Phase::AfterInsert, "count_borrow_in_statistics", count_borrow_in_statistics)
        .register(Phase::AfterInsert, "count_borrow_in_profile", count_borrow_in_profile)
        .register(Phase::AfterInsert, "take_copy", take_copy)
        .register(Phase::AfterInsert, "log_book_borrowed", log_book_borrowed);

    engine
        .returns_mut()
        .register(Phase::OnInvocation, "close_borrow_record", close_borrow_record)
        .register(Phase::OnInvocation, "count_return_in_statistics", count_return_in_statistics)
        .register(Phase::OnInvocation, "restore_copy", restore_copy)
        .register(Phase::OnInvocation, "log_book_returned", log_book_returned);
}

/// Reactions speak `DomainError`; lookups on the rows speak `LibraryError`.
fn domain(err: LibraryError) -> DomainError {
    match err {
        LibraryError::NotFound(what) => DomainError::NotFound(what),
        LibraryError::InvariantViolation(msg) => DomainError::InvariantViolation(msg),
        other => DomainError::invariant(other.to_string()),
    }
}

fn author_name(uow: &UnitOfWork, book: &Book) -> DomainResult<String> {
    uow.tables
        .author(book.author_id)
        .map(|a| a.name.clone())
        .map_err(domain)
}

fn is_new_loan(record: &BorrowRecord) -> bool {
    record.status == BorrowStatus::Borrowed
}

// ---- authors -------------------------------------------------------------

fn normalize_author(_: &mut UnitOfWork, author: &mut Author) -> DomainResult<()> {
    author.normalize();
    Ok(())
}

// ---- books ---------------------------------------------------------------

fn normalize_book(_: &mut UnitOfWork, book: &mut Book) -> DomainResult<()> {
    book.normalize();
    Ok(())
}

fn log_book_created(uow: &mut UnitOfWork, book: &mut Book) -> DomainResult<()> {
    let author = author_name(uow, book)?;
    let now = uow.now;
    uow.log(ActivityEntry::book_created(&book.title, &author, now));
    tracing::info!(book_id = %book.id, title = %book.title, "book created");
    Ok(())
}

fn log_book_deleted(uow: &mut UnitOfWork, book: &mut Book) -> DomainResult<()> {
    let author = author_name(uow, book)?;
    let now = uow.now;
    uow.log(ActivityEntry::book_deleted(&book.title, &author, now));
    tracing::info!(book_id = %book.id, title = %book.title, "book deleted");
    Ok(())
}

// ---- accounts ------------------------------------------------------------

fn log_user_registered(uow: &mut UnitOfWork, account: &mut UserAccount) -> DomainResult<()> {
    let now = uow.now;
    uow.log(ActivityEntry::user_registered(&account.username, account.id, now));
    tracing::info!(user_id = %account.id, username = %account.username, "user registered");
    Ok(())
}

// ---- borrow records ------------------------------------------------------

fn count_borrow_in_statistics(uow: &mut UnitOfWork, record: &mut BorrowRecord) -> DomainResult<()> {
    if !is_new_loan(record) {
        return Ok(());
    }
    let now = uow.now;
    uow.tables
        .statistics
        .entry(record.book_id)
        .or_insert_with(|| BookStatistics::new(record.book_id, now))
        .record_borrow();
    Ok(())
}

fn count_borrow_in_profile(uow: &mut UnitOfWork, record: &mut BorrowRecord) -> DomainResult<()> {
    if !is_new_loan(record) {
        return Ok(());
    }
    let now = uow.now;
    uow.tables
        .profiles
        .entry(record.user_id)
        .or_insert_with(|| UserProfile::new(record.user_id, now))
        .record_borrow();
    Ok(())
}

fn take_copy(uow: &mut UnitOfWork, record: &mut BorrowRecord) -> DomainResult<()> {
    if !is_new_loan(record) {
        return Ok(());
    }
    let now = uow.now;
    let book = uow.tables.book_mut(record.book_id).map_err(domain)?;
    if book.available_copies > 0 {
        book.available_copies -= 1;
        book.updated_at = now;
    }
    Ok(())
}

fn log_book_borrowed(uow: &mut UnitOfWork, record: &mut BorrowRecord) -> DomainResult<()> {
    if !is_new_loan(record) {
        return Ok(());
    }
    let title = uow.tables.book(record.book_id).map_err(domain)?.title.clone();
    let name = uow.tables.account(record.user_id).map_err(domain)?.username.clone();
    let now = uow.now;
    uow.log(ActivityEntry::book_borrowed(&title, &name, record.user_id, now));
    tracing::info!(borrow_id = %record.id, %title, username = %name, "book borrowed");
    Ok(())
}

// ---- returns -------------------------------------------------------------

fn returned_record(uow: &UnitOfWork, event: &ReturnEvent) -> DomainResult<BorrowRecord> {
    uow.tables
        .borrow_record(event.record_id)
        .cloned()
        .map_err(domain)
}

fn close_borrow_record(uow: &mut UnitOfWork, event: &mut ReturnEvent) -> DomainResult<()> {
    let now = uow.now;
    let record = uow
        .tables
        .borrows
        .get_mut(&event.record_id)
        .ok_or_else(|| DomainError::not_found(format!("borrow record {}", event.record_id)))?;
    record.mark_returned(now)
}

fn count_return_in_statistics(uow: &mut UnitOfWork, event: &mut ReturnEvent) -> DomainResult<()> {
    let record = returned_record(uow, event)?;
    uow.tables
        .statistics_mut(record.book_id)
        .map_err(domain)?
        .record_return();
    Ok(())
}

fn restore_copy(uow: &mut UnitOfWork, event: &mut ReturnEvent) -> DomainResult<()> {
    let record = returned_record(uow, event)?;
    let now = uow.now;
    let book = uow.tables.book_mut(record.book_id).map_err(domain)?;
    book.available_copies += 1;
    book.updated_at = now;
    Ok(())
}

fn log_book_returned(uow: &mut UnitOfWork, event: &mut ReturnEvent) -> DomainResult<()> {
    let record = returned_record(uow, event)?;
    let title = uow.tables.book(record.book_id).map_err(domain)?.title.clone();
    let name = uow.tables.account(record.user_id).map_err(domain)?.username.clone();
    let now = uow.now;
    uow.log(ActivityEntry::book_returned(&title, &name, record.user_id, now));
    tracing::info!(
        borrow_id = %record.id,
        %title,
        username = %name,
        returned_by = %event.returned_by,
        "book returned"
    );
    Ok(())
}
