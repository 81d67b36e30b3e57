//! Entity store: the relational rows and the unit-of-work contract.
//!
//! ## Rows
//!
//! [`Tables`] holds one ordered map per record kind plus the append-only
//! activity log. The structural one-to-one rows (book statistics, user
//! profiles) are written by `Tables` itself together with their owner, so they
//! exist whether or not any reaction is registered.
//!
//! ## Units of work
//!
//! Every write goes through [`LibraryStore::transaction`]: the closure gets a
//! [`UnitOfWork`] and either returns `Ok` (all writes become visible at once)
//! or an error (none of them do). Units are serialised per store.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use libris_catalog::{
    ActivityEntry, Author, Book, BookStatistics, BorrowRecord, Isbn, UserAccount, UserProfile,
};
use libris_core::{AuthorId, BookId, BorrowId, Entity, UserId};

use crate::error::LibraryError;

mod in_memory;

pub use in_memory::InMemoryLibraryStore;

/// All persisted rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tables {
    pub authors: BTreeMap<AuthorId, Author>,
    pub books: BTreeMap<BookId, Book>,
    pub statistics: BTreeMap<BookId, BookStatistics>,
    pub accounts: BTreeMap<UserId, UserAccount>,
    pub profiles: BTreeMap<UserId, UserProfile>,
    pub borrows: BTreeMap<BorrowId, BorrowRecord>,
    /// Oldest first. Never reordered or truncated.
    pub activity: Vec<ActivityEntry>,
}

/// Row lookup that reports a miss as `NotFound("<kind> <id>")`.
fn row<E>(rows: &BTreeMap<E::Id, E>, id: E::Id) -> Result<&E, LibraryError>
where
    E: Entity,
    E::Id: Display,
{
    rows.get(&id)
        .ok_or_else(|| LibraryError::not_found(format!("{} {id}", E::KIND)))
}

impl Tables {
    pub fn author(&self, id: AuthorId) -> Result<&Author, LibraryError> {
        row(&self.authors, id)
    }

    pub fn book(&self, id: BookId) -> Result<&Book, LibraryError> {
        row(&self.books, id)
    }

    pub fn book_mut(&mut self, id: BookId) -> Result<&mut Book, LibraryError> {
        self.books
            .get_mut(&id)
            .ok_or_else(|| LibraryError::not_found(format!("{} {id}", Book::KIND)))
    }

    pub fn account(&self, id: UserId) -> Result<&UserAccount, LibraryError> {
        row(&self.accounts, id)
    }

    pub fn borrow_record(&self, id: BorrowId) -> Result<&BorrowRecord, LibraryError> {
        row(&self.borrows, id)
    }

    /// Statistics row of an existing book. A missing row is a broken
    /// invariant, not a lookup miss.
    pub fn statistics_mut(&mut self, book_id: BookId) -> Result<&mut BookStatistics, LibraryError> {
        self.statistics.get_mut(&book_id).ok_or_else(|| {
            LibraryError::InvariantViolation(format!("book {book_id} has no statistics row"))
        })
    }

    pub fn insert_author(&mut self, author: Author) {
        self.authors.insert(author.id, author);
    }

    /// Write a new book together with its zeroed statistics row.
    pub fn insert_book(&mut self, book: Book, now: DateTime<Utc>) {
        self.statistics
            .insert(book.id, BookStatistics::new(book.id, now));
        self.books.insert(book.id, book);
    }

    /// Remove a book, its statistics row and every borrow record of it.
    pub fn remove_book(&mut self, id: BookId) -> Option<Book> {
        let book = self.books.remove(&id)?;
        self.statistics.remove(&id);
        self.borrows.retain(|_, r| r.book_id != id);
        Some(book)
    }

    /// Write a new account together with its empty profile.
    pub fn insert_account(&mut self, account: UserAccount) {
        self.profiles.insert(
            account.id,
            UserProfile::new(account.id, account.date_joined),
        );
        self.accounts.insert(account.id, account);
    }

    /// Remove an account, its profile and borrow records. Activity entries
    /// are kept with their user reference cleared.
    pub fn remove_account(&mut self, id: UserId) -> Option<UserAccount> {
        let account = self.accounts.remove(&id)?;
        self.profiles.remove(&id);
        self.borrows.retain(|_, r| r.user_id != id);
        for entry in self.activity.iter_mut().filter(|e| e.user_id == Some(id)) {
            entry.user_id = None;
        }
        Some(account)
    }

    /// Whether another book already holds `isbn`. Separators and the case of
    /// a trailing `X` are ignored.
    pub fn isbn_taken(&self, isbn: &str, except: Option<BookId>) -> bool {
        let wanted = Isbn::strip(isbn);
        self.books.values().any(|b| {
            Some(b.id) != except && Isbn::strip(&b.isbn).eq_ignore_ascii_case(&wanted)
        })
    }

    pub fn username_taken(&self, username: &str) -> bool {
        self.accounts.values().any(|a| a.username == username)
    }

    /// The user's open (borrowed or overdue) loan of the book, if any.
    pub fn active_borrow(&self, user_id: UserId, book_id: BookId) -> Option<&BorrowRecord> {
        self.borrows
            .values()
            .find(|r| r.user_id == user_id && r.book_id == book_id && r.is_active())
    }

    pub fn append_activity(&mut self, entry: ActivityEntry) {
        self.activity.push(entry);
    }
}

/// The rows a unit of work may change, plus the unit's timestamp.
///
/// `now` is fixed for the whole unit so every row and log entry it writes
/// carries the same instant.
#[derive(Debug, Clone)]
pub struct UnitOfWork {
    pub tables: Tables,
    pub now: DateTime<Utc>,
}

impl UnitOfWork {
    pub fn new(tables: Tables, now: DateTime<Utc>) -> Self {
        Self { tables, now }
    }

    pub fn log(&mut self, entry: ActivityEntry) {
        self.tables.append_activity(entry);
    }
}

/// Atomic access to the library rows.
pub trait LibraryStore: Send + Sync {
    /// Run `work` as one atomic unit.
    ///
    /// Writes become visible only if `work` returns `Ok`. Units never
    /// interleave.
    fn transaction<T, F>(&self, now: DateTime<Utc>, work: F) -> Result<T, LibraryError>
    where
        F: FnOnce(&mut UnitOfWork) -> Result<T, LibraryError>;

    /// Run `view` against a consistent snapshot of the rows.
    fn read<T, F>(&self, view: F) -> Result<T, LibraryError>
    where
        F: FnOnce(&Tables) -> T;
}

impl<S> LibraryStore for Arc<S>
where
    S: LibraryStore + ?Sized,
{
    fn transaction<T, F>(&self, now: DateTime<Utc>, work: F) -> Result<T, LibraryError>
    where
        F: FnOnce(&mut UnitOfWork) -> Result<T, LibraryError>,
    {
        (**self).transaction(now, work)
    }

    fn read<T, F>(&self, view: F) -> Result<T, LibraryError>
    where
        F: FnOnce(&Tables) -> T,
    {
        (**self).read(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_catalog::{NewAuthor, NewBook, NewBorrowRecord, NewUser};

    fn seeded() -> (Tables, BookId, UserId) {
        let now = Utc::now();
        let mut tables = Tables::default();

        let author = Author::new(
            AuthorId::new(),
            NewAuthor {
                name: "George Orwell".to_string(),
                email: "george@example.com".to_string(),
                biography: String::new(),
            },
            now,
        );
        let book = Book::new(
            BookId::new(),
            NewBook {
                title: "1984".to_string(),
                author_id: author.id,
                isbn: "9780451524935".to_string(),
                pages: 328,
                available_copies: 2,
            },
            now,
        );
        let account = UserAccount::new(UserId::new(), NewUser::named("alice_reader"), now);
        let (book_id, user_id) = (book.id, account.id);

        tables.insert_author(author);
        tables.insert_book(book, now);
        tables.insert_account(account);
        (tables, book_id, user_id)
    }

    #[test]
    fn owner_rows_bring_their_one_to_one_rows() {
        let (tables, book_id, user_id) = seeded();
        assert_eq!(tables.statistics[&book_id].total_borrows, 0);
        assert_eq!(tables.profiles[&user_id].books_borrowed_count, 0);
    }

    #[test]
    fn removing_a_book_cascades() {
        let (mut tables, book_id, user_id) = seeded();
        let record = BorrowRecord::new(
            BorrowId::new(),
            NewBorrowRecord::borrowed(user_id, book_id),
            Utc::now(),
        );
        tables.borrows.insert(record.id, record);

        assert!(tables.remove_book(book_id).is_some());
        assert!(tables.statistics.is_empty());
        assert!(tables.borrows.is_empty());
        assert!(tables.remove_book(book_id).is_none());
    }

    #[test]
    fn removing_an_account_clears_activity_references() {
        let (mut tables, book_id, user_id) = seeded();
        tables.append_activity(ActivityEntry::user_registered("alice_reader", user_id, Utc::now()));
        let record = BorrowRecord::new(
            BorrowId::new(),
            NewBorrowRecord::borrowed(user_id, book_id),
            Utc::now(),
        );
        tables.borrows.insert(record.id, record);

        tables.remove_account(user_id).unwrap();
        assert!(tables.profiles.is_empty());
        assert!(tables.borrows.is_empty());
        assert_eq!(tables.activity.len(), 1);
        assert_eq!(tables.activity[0].user_id, None);
    }

    #[test]
    fn isbn_uniqueness_ignores_the_book_itself() {
        let (tables, book_id, _) = seeded();
        assert!(tables.isbn_taken("9780451524935", None));
        assert!(!tables.isbn_taken("9780451524935", Some(book_id)));
        assert!(!tables.isbn_taken("9780451526342", None));
    }

    #[test]
    fn isbn_uniqueness_ignores_separators() {
        let (tables, _, _) = seeded();
        assert!(tables.isbn_taken("978-0-451-52493-5", None));
        assert!(tables.isbn_taken("978 0451 524935", None));
    }
}
