//! Derivation engine: typed reaction registries plus the write pipelines that
//! fire them.
//!
//! Every entity write goes through one of the pipelines below, inside a
//! [`UnitOfWork`]:
//!
//! ```text
//! BeforePersist reactions (may rewrite the record)
//!   ↓
//! field/reference checks
//!   ↓
//! row written
//!   ↓
//! AfterInsert / AfterDelete reactions (see every earlier write of the unit)
//! ```
//!
//! Returns raise [`ReturnEvent`] and fire its `OnInvocation` reactions.
//! Any failure propagates out of the unit, which is then discarded.

use libris_catalog::{
    Author, AuthorChanges, Book, BookChanges, BorrowRecord, NewAuthor, NewBook, NewBorrowRecord,
    NewUser, UserAccount,
};
use libris_core::{AuthorId, BookId, BorrowId, UserId};
use libris_events::{Hooks, Phase};

use crate::config::LibraryConfig;
use crate::error::LibraryError;
use crate::reactions;
use crate::store::UnitOfWork;

/// Explicit "this loan came back" event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnEvent {
    pub record_id: BorrowId,
    pub returned_by: UserId,
}

/// One reaction registry per record kind.
#[derive(Debug)]
pub struct DerivationEngine {
    authors: Hooks<UnitOfWork, Author>,
    books: Hooks<UnitOfWork, Book>,
    accounts: Hooks<UnitOfWork, UserAccount>,
    borrows: Hooks<UnitOfWork, BorrowRecord>,
    returns: Hooks<UnitOfWork, ReturnEvent>,
}

impl DerivationEngine {
    /// No reactions at all: rows are written exactly as given.
    pub fn empty() -> Self {
        Self {
            authors: Hooks::new("author"),
            books: Hooks::new("book"),
            accounts: Hooks::new("user"),
            borrows: Hooks::new("borrow_record"),
            returns: Hooks::new("return"),
        }
    }

    /// The lending desk's reactions.
    pub fn standard(config: &LibraryConfig) -> Self {
        let mut engine = Self::empty();
        reactions::register_standard(&mut engine, config);
        engine
    }

    pub fn authors(&self) -> &Hooks<UnitOfWork, Author> {
        &self.authors
    }

    pub fn authors_mut(&mut self) -> &mut Hooks<UnitOfWork, Author> {
        &mut self.authors
    }

    pub fn books(&self) -> &Hooks<UnitOfWork, Book> {
        &self.books
    }

    pub fn books_mut(&mut self) -> &mut Hooks<UnitOfWork, Book> {
        &mut self.books
    }

    pub fn accounts(&self) -> &Hooks<UnitOfWork, UserAccount> {
        &self.accounts
    }

    pub fn accounts_mut(&mut self) -> &mut Hooks<UnitOfWork, UserAccount> {
        &mut self.accounts
    }

    pub fn borrows(&self) -> &Hooks<UnitOfWork, BorrowRecord> {
        &self.borrows
    }

    pub fn borrows_mut(&mut self) -> &mut Hooks<UnitOfWork, BorrowRecord> {
        &mut self.borrows
    }

    pub fn returns(&self) -> &Hooks<UnitOfWork, ReturnEvent> {
        &self.returns
    }

    pub fn returns_mut(&mut self) -> &mut Hooks<UnitOfWork, ReturnEvent> {
        &mut self.returns
    }

    // ---- authors -------------------------------------------------------

    pub fn insert_author(&self, uow: &mut UnitOfWork, input: NewAuthor) -> Result<Author, LibraryError> {
        let mut author = Author::new(AuthorId::new(), input, uow.now);
        self.authors.run(Phase::BeforePersist, uow, &mut author)?;
        author.validate()?;

        uow.tables.insert_author(author.clone());
        self.authors.run(Phase::AfterInsert, uow, &mut author)?;
        Ok(author)
    }

    pub fn update_author(
        &self,
        uow: &mut UnitOfWork,
        id: AuthorId,
        changes: AuthorChanges,
    ) -> Result<Author, LibraryError> {
        let mut author = uow.tables.author(id)?.clone();
        author.apply_changes(changes);
        self.authors.run(Phase::BeforePersist, uow, &mut author)?;
        author.validate()?;

        uow.tables.insert_author(author.clone());
        Ok(author)
    }

    /// Remove an author and, first, every book written by them.
    pub fn delete_author(&self, uow: &mut UnitOfWork, id: AuthorId) -> Result<Author, LibraryError> {
        uow.tables.author(id)?;

        let book_ids: Vec<BookId> = uow
            .tables
            .books
            .values()
            .filter(|b| b.author_id == id)
            .map(|b| b.id)
            .collect();
        for book_id in book_ids {
            self.delete_book(uow, book_id)?;
        }

        let mut author = uow
            .tables
            .authors
            .remove(&id)
            .ok_or_else(|| LibraryError::not_found(format!("author {id}")))?;
        self.authors.run(Phase::AfterDelete, uow, &mut author)?;
        Ok(author)
    }

    // ---- books ---------------------------------------------------------

    pub fn insert_book(&self, uow: &mut UnitOfWork, input: NewBook) -> Result<Book, LibraryError> {
        let mut book = Book::new(BookId::new(), input, uow.now);
        self.books.run(Phase::BeforePersist, uow, &mut book)?;
        check_book(uow, &mut book)?;

        uow.tables.insert_book(book.clone(), uow.now);
        self.books.run(Phase::AfterInsert, uow, &mut book)?;
        Ok(book)
    }

    pub fn update_book(
        &self,
        uow: &mut UnitOfWork,
        id: BookId,
        changes: BookChanges,
    ) -> Result<Book, LibraryError> {
        let mut book = uow.tables.book(id)?.clone();
        book.apply_changes(changes);
        book.updated_at = uow.now;
        self.books.run(Phase::BeforePersist, uow, &mut book)?;
        check_book(uow, &mut book)?;

        uow.tables.books.insert(book.id, book.clone());
        Ok(book)
    }

    /// Remove a book with its statistics and borrow records.
    pub fn delete_book(&self, uow: &mut UnitOfWork, id: BookId) -> Result<Book, LibraryError> {
        let mut book = uow
            .tables
            .remove_book(id)
            .ok_or_else(|| LibraryError::not_found(format!("book {id}")))?;
        self.books.run(Phase::AfterDelete, uow, &mut book)?;
        Ok(book)
    }

    // ---- accounts ------------------------------------------------------

    pub fn insert_account(&self, uow: &mut UnitOfWork, input: NewUser) -> Result<UserAccount, LibraryError> {
        let mut account = UserAccount::new(UserId::new(), input, uow.now);
        self.accounts.run(Phase::BeforePersist, uow, &mut account)?;
        account.validate()?;
        if uow.tables.username_taken(&account.username) {
            return Err(LibraryError::Validation(format!(
                "username '{}' is already taken",
                account.username
            )));
        }

        uow.tables.insert_account(account.clone());
        self.accounts.run(Phase::AfterInsert, uow, &mut account)?;
        Ok(account)
    }

    /// Remove an account with its profile and borrow records.
    ///
    /// Copies held by the user's open loans are not given back.
    pub fn delete_account(&self, uow: &mut UnitOfWork, id: UserId) -> Result<UserAccount, LibraryError> {
        let mut account = uow
            .tables
            .remove_account(id)
            .ok_or_else(|| LibraryError::not_found(format!("user {id}")))?;
        self.accounts.run(Phase::AfterDelete, uow, &mut account)?;
        Ok(account)
    }

    // ---- borrow records ------------------------------------------------

    /// Write a borrow record and fire its reactions. No lending checks.
    pub fn insert_borrow(
        &self,
        uow: &mut UnitOfWork,
        input: NewBorrowRecord,
    ) -> Result<BorrowRecord, LibraryError> {
        uow.tables.account(input.user_id)?;
        uow.tables.book(input.book_id)?;

        let mut record = BorrowRecord::new(BorrowId::new(), input, uow.now);
        self.borrows.run(Phase::BeforePersist, uow, &mut record)?;

        uow.tables.borrows.insert(record.id, record.clone());
        self.borrows.run(Phase::AfterInsert, uow, &mut record)?;
        Ok(record)
    }

    /// Raise a return and fire its reactions.
    pub fn raise_return(&self, uow: &mut UnitOfWork, event: ReturnEvent) -> Result<BorrowRecord, LibraryError> {
        let mut event = event;
        self.returns.run(Phase::OnInvocation, uow, &mut event)?;
        Ok(uow.tables.borrow_record(event.record_id)?.clone())
    }
}

/// Row constraints every book write meets, whatever reactions are registered.
fn check_book(uow: &UnitOfWork, book: &mut Book) -> Result<(), LibraryError> {
    book.clamp_copies();
    book.validate()?;
    uow.tables.author(book.author_id)?;
    if uow.tables.isbn_taken(&book.isbn, Some(book.id)) {
        return Err(LibraryError::Validation(format!(
            "a book with ISBN {} already exists",
            book.isbn
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use libris_core::DomainResult;

    use crate::store::Tables;

    fn unit() -> UnitOfWork {
        UnitOfWork::new(Tables::default(), Utc::now())
    }

    fn orwell() -> NewAuthor {
        NewAuthor {
            name: "george orwell".to_string(),
            email: "george@example.com".to_string(),
            biography: String::new(),
        }
    }

    #[test]
    fn empty_engine_writes_rows_verbatim() {
        let engine = DerivationEngine::empty();
        let mut uow = unit();

        let author = engine.insert_author(&mut uow, orwell()).unwrap();
        assert_eq!(author.name, "george orwell");

        let book = engine
            .insert_book(
                &mut uow,
                NewBook {
                    title: "animal farm".to_string(),
                    author_id: author.id,
                    isbn: "978-0-451-52634-2".to_string(),
                    pages: 112,
                    available_copies: 4,
                },
            )
            .unwrap();
        assert_eq!(book.isbn, "978-0-451-52634-2");
        // Structural rows do not depend on reactions.
        assert!(uow.tables.statistics.contains_key(&book.id));
        assert!(uow.tables.activity.is_empty());
    }

    #[test]
    fn standard_engine_registers_reactions_in_order() {
        let engine = DerivationEngine::standard(&LibraryConfig::default());
        assert_eq!(
            engine.books().names(Phase::BeforePersist),
            vec!["normalize_book"]
        );
        assert_eq!(
            engine.borrows().names(Phase::AfterInsert),
            vec![
                "count_borrow_in_statistics",
                "count_borrow_in_profile",
                "take_copy",
                "log_book_borrowed"
            ]
        );
        assert_eq!(
            engine.returns().names(Phase::OnInvocation),
            vec![
                "close_borrow_record",
                "count_return_in_statistics",
                "restore_copy",
                "log_book_returned"
            ]
        );
    }

    #[test]
    fn extra_reactions_run_after_the_standard_ones() {
        let mut engine = DerivationEngine::standard(&LibraryConfig::default());
        engine.authors_mut().register(
            Phase::BeforePersist,
            "shout",
            |_: &mut UnitOfWork, a: &mut Author| -> DomainResult<()> {
                a.name = a.name.to_uppercase();
                Ok(())
            },
        );

        let mut uow = unit();
        let author = engine.insert_author(&mut uow, orwell()).unwrap();
        assert_eq!(author.name, "GEORGE ORWELL");
        assert_eq!(uow.tables.authors[&author.id].name, "GEORGE ORWELL");
    }

    #[test]
    fn book_constraints_hold_without_reactions() {
        let engine = DerivationEngine::empty();
        let mut uow = unit();
        let author = engine.insert_author(&mut uow, orwell()).unwrap();
        let nineteen = |isbn: &str, copies: i64| NewBook {
            title: "1984".to_string(),
            author_id: author.id,
            isbn: isbn.to_string(),
            pages: 328,
            available_copies: copies,
        };

        let first = engine.insert_book(&mut uow, nineteen("9780451524935", -5)).unwrap();
        assert_eq!(uow.tables.books[&first.id].available_copies, 0);

        let duplicate = engine
            .insert_book(&mut uow, nineteen("978-0-451-52493-5", 1))
            .unwrap_err();
        assert!(matches!(duplicate, LibraryError::Validation(_)));

        let malformed = engine.insert_book(&mut uow, nineteen("garbage", 1)).unwrap_err();
        assert!(matches!(malformed, LibraryError::Validation(_)));

        let updated = engine
            .update_book(
                &mut uow,
                first.id,
                BookChanges {
                    available_copies: Some(-1),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.available_copies, 0);
        assert_eq!(uow.tables.books.len(), 1);
    }

    #[test]
    fn book_requires_an_existing_author() {
        let engine = DerivationEngine::standard(&LibraryConfig::default());
        let mut uow = unit();
        let err = engine
            .insert_book(
                &mut uow,
                NewBook {
                    title: "orphan".to_string(),
                    author_id: AuthorId::new(),
                    isbn: "9780451524935".to_string(),
                    pages: 1,
                    available_copies: 1,
                },
            )
            .unwrap_err();
        assert!(matches!(err, LibraryError::NotFound(_)));
        assert!(uow.tables.books.is_empty());
    }
}
