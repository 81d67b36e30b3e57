//! Library facade: entity operations and reads over a [`LibraryStore`].
//!
//! Every write method opens exactly one unit of work, runs the matching
//! [`DerivationEngine`] pipeline inside it, and publishes the activity entries
//! the unit appended once it has committed. Units of one library commit and
//! publish under a single lock, so subscribers see entries in log order
//! whichever thread wrote them.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use libris_catalog::{
    ActivityEntry, Author, AuthorChanges, Book, BookChanges, BookStatistics, BorrowRecord,
    NewAuthor, NewBook, NewBorrowRecord, NewUser, ProfileChanges, UserAccount, UserProfile,
    text::title_case,
};
use libris_core::{AuthorId, BookId, BorrowId, Clock, SystemClock, UserId};
use libris_events::{Event, EventBus, InMemoryEventBus, Subscription};

use crate::config::LibraryConfig;
use crate::engine::DerivationEngine;
use crate::error::LibraryError;
use crate::store::{LibraryStore, Tables, UnitOfWork};

/// A book as shown in the catalogue: the row, its author and its counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogueEntry {
    pub book: Book,
    pub author_name: String,
    pub statistics: BookStatistics,
    pub average_rating: f64,
}

/// The library: store, reactions, clock and the committed-activity feed.
pub struct Library<S> {
    store: S,
    engine: DerivationEngine,
    clock: Arc<dyn Clock>,
    config: LibraryConfig,
    feed: InMemoryEventBus<ActivityEntry>,
    /// Held from transaction start until the unit's entries are published.
    feed_order: Mutex<()>,
}

impl<S> core::fmt::Debug for Library<S>
where
    S: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Library")
            .field("store", &self.store)
            .field("engine", &self.engine)
            .field("clock", &self.clock)
            .field("config", &self.config)
            .finish()
    }
}

impl<S> Library<S> {
    /// Standard reactions and the system clock.
    pub fn new(store: S, config: LibraryConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, config: LibraryConfig, clock: Arc<dyn Clock>) -> Self {
        let engine = DerivationEngine::standard(&config);
        Self::with_engine(store, config, clock, engine)
    }

    pub fn with_engine(
        store: S,
        config: LibraryConfig,
        clock: Arc<dyn Clock>,
        engine: DerivationEngine,
    ) -> Self {
        Self {
            store,
            engine,
            clock,
            config,
            feed: InMemoryEventBus::new(),
            feed_order: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn engine(&self) -> &DerivationEngine {
        &self.engine
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Live feed of activity entries, delivered after their unit commits.
    pub fn subscribe_activity(&self) -> Subscription<ActivityEntry> {
        self.feed.subscribe()
    }
}

/// Hand committed events to `bus`, oldest first. A failed publish is logged
/// and skipped.
fn publish_committed<E, B>(bus: &B, op: &'static str, events: Vec<E>)
where
    E: Event,
    B: EventBus<E>,
{
    for event in events {
        let (event_type, at) = (event.event_type(), event.occurred_at());
        if let Err(e) = bus.publish(event) {
            tracing::warn!(op, event_type, %at, error = ?e, "activity publish failed");
        }
    }
}

impl<S> Library<S>
where
    S: LibraryStore,
{
    /// Run `work` as one unit of work, then publish what it logged.
    pub(crate) fn unit<T, F>(&self, op: &'static str, work: F) -> Result<T, LibraryError>
    where
        F: FnOnce(&DerivationEngine, &mut UnitOfWork) -> Result<T, LibraryError>,
    {
        let _ordered = self
            .feed_order
            .lock()
            .map_err(|_| LibraryError::store("feed order lock poisoned"))?;

        let now = self.clock.now();
        let result = self.store.transaction(now, |uow| {
            let logged_from = uow.tables.activity.len();
            let value = work(&self.engine, uow)?;
            Ok((value, uow.tables.activity[logged_from..].to_vec()))
        });

        let (value, logged) = match result {
            Ok(committed) => committed,
            Err(e) => {
                tracing::debug!(op, error = %e, "unit discarded");
                return Err(e);
            }
        };

        tracing::debug!(op, logged = logged.len(), "unit committed");
        publish_committed(&self.feed, op, logged);
        Ok(value)
    }

    fn view<T, F>(&self, view: F) -> Result<T, LibraryError>
    where
        F: FnOnce(&Tables) -> Result<T, LibraryError>,
    {
        self.store.read(view)?
    }

    // ---- authors -------------------------------------------------------

    pub fn create_author(&self, input: NewAuthor) -> Result<Author, LibraryError> {
        self.unit("create_author", |engine, uow| engine.insert_author(uow, input))
    }

    pub fn update_author(&self, id: AuthorId, changes: AuthorChanges) -> Result<Author, LibraryError> {
        self.unit("update_author", |engine, uow| engine.update_author(uow, id, changes))
    }

    /// Delete an author together with all of their books.
    pub fn delete_author(&self, id: AuthorId) -> Result<Author, LibraryError> {
        self.unit("delete_author", |engine, uow| engine.delete_author(uow, id))
    }

    pub fn author(&self, id: AuthorId) -> Result<Author, LibraryError> {
        self.view(|t| t.author(id).cloned())
    }

    /// All authors, by name.
    pub fn authors(&self) -> Result<Vec<Author>, LibraryError> {
        self.store.read(|t| {
            let mut authors: Vec<Author> = t.authors.values().cloned().collect();
            authors.sort_by(|a, b| a.name.cmp(&b.name));
            authors
        })
    }

    /// Look an author up by name as it would be stored (title case).
    pub fn author_by_name(&self, name: &str) -> Result<Option<Author>, LibraryError> {
        let wanted = title_case(name.trim());
        self.store
            .read(|t| t.authors.values().find(|a| a.name == wanted).cloned())
    }

    // ---- books ---------------------------------------------------------

    pub fn create_book(&self, input: NewBook) -> Result<Book, LibraryError> {
        self.unit("create_book", |engine, uow| engine.insert_book(uow, input))
    }

    pub fn update_book(&self, id: BookId, changes: BookChanges) -> Result<Book, LibraryError> {
        self.unit("update_book", |engine, uow| engine.update_book(uow, id, changes))
    }

    /// Delete a book together with its statistics and borrow records.
    pub fn delete_book(&self, id: BookId) -> Result<Book, LibraryError> {
        self.unit("delete_book", |engine, uow| engine.delete_book(uow, id))
    }

    pub fn book(&self, id: BookId) -> Result<Book, LibraryError> {
        self.view(|t| t.book(id).cloned())
    }

    /// All books, by title.
    pub fn books(&self) -> Result<Vec<Book>, LibraryError> {
        self.store.read(|t| {
            let mut books: Vec<Book> = t.books.values().cloned().collect();
            books.sort_by(|a, b| a.title.cmp(&b.title));
            books
        })
    }

    /// Look a book up by title as it would be stored (title case).
    pub fn book_by_title(&self, title: &str) -> Result<Option<Book>, LibraryError> {
        let wanted = title_case(title.trim());
        self.store
            .read(|t| t.books.values().find(|b| b.title == wanted).cloned())
    }

    pub fn statistics(&self, book_id: BookId) -> Result<BookStatistics, LibraryError> {
        self.view(|t| {
            t.book(book_id)?;
            t.statistics.get(&book_id).cloned().ok_or_else(|| {
                LibraryError::InvariantViolation(format!("book {book_id} has no statistics row"))
            })
        })
    }

    /// Every book with its author and counters, by title.
    pub fn catalogue(&self) -> Result<Vec<CatalogueEntry>, LibraryError> {
        self.view(|t| {
            let mut entries = t
                .books
                .values()
                .map(|book| {
                    let author_name = t.author(book.author_id)?.name.clone();
                    let statistics = t.statistics.get(&book.id).cloned().ok_or_else(|| {
                        LibraryError::InvariantViolation(format!(
                            "book {} has no statistics row",
                            book.id
                        ))
                    })?;
                    Ok(CatalogueEntry {
                        book: book.clone(),
                        author_name,
                        average_rating: statistics.average_rating(),
                        statistics,
                    })
                })
                .collect::<Result<Vec<_>, LibraryError>>()?;
            entries.sort_by(|a, b| a.book.title.cmp(&b.book.title));
            Ok(entries)
        })
    }

    // ---- users ---------------------------------------------------------

    /// Register an account; its profile is created with it.
    pub fn register_user(&self, input: NewUser) -> Result<UserAccount, LibraryError> {
        self.unit("register_user", |engine, uow| engine.insert_account(uow, input))
    }

    pub fn update_profile(&self, user_id: UserId, changes: ProfileChanges) -> Result<UserProfile, LibraryError> {
        self.unit("update_profile", |_, uow| {
            uow.tables.account(user_id)?;
            let profile = uow.tables.profiles.get_mut(&user_id).ok_or_else(|| {
                LibraryError::InvariantViolation(format!("user {user_id} has no profile"))
            })?;
            profile.apply_changes(changes)?;
            Ok(profile.clone())
        })
    }

    /// Delete an account with its profile and borrow records.
    pub fn delete_user(&self, user_id: UserId) -> Result<UserAccount, LibraryError> {
        self.unit("delete_user", |engine, uow| engine.delete_account(uow, user_id))
    }

    pub fn account(&self, id: UserId) -> Result<UserAccount, LibraryError> {
        self.view(|t| t.account(id).cloned())
    }

    /// All accounts, by username.
    pub fn accounts(&self) -> Result<Vec<UserAccount>, LibraryError> {
        self.store.read(|t| {
            let mut accounts: Vec<UserAccount> = t.accounts.values().cloned().collect();
            accounts.sort_by(|a, b| a.username.cmp(&b.username));
            accounts
        })
    }

    pub fn account_by_username(&self, username: &str) -> Result<Option<UserAccount>, LibraryError> {
        let wanted = username.trim();
        self.store
            .read(|t| t.accounts.values().find(|a| a.username == wanted).cloned())
    }

    pub fn profile(&self, user_id: UserId) -> Result<UserProfile, LibraryError> {
        self.view(|t| {
            t.profiles
                .get(&user_id)
                .cloned()
                .ok_or_else(|| LibraryError::not_found(format!("profile of user {user_id}")))
        })
    }

    // ---- borrow records ------------------------------------------------

    /// Write a borrow record directly.
    ///
    /// No availability or duplicate checks; every borrow-record reaction
    /// still fires. Lending goes through [`Library::borrow`].
    pub fn create_borrow_record(&self, input: NewBorrowRecord) -> Result<BorrowRecord, LibraryError> {
        self.unit("create_borrow_record", |engine, uow| engine.insert_borrow(uow, input))
    }

    pub fn borrow_record(&self, id: BorrowId) -> Result<BorrowRecord, LibraryError> {
        self.view(|t| t.borrow_record(id).cloned())
    }

    /// The user's open loans, most recent first.
    pub fn active_loans(&self, user_id: UserId) -> Result<Vec<BorrowRecord>, LibraryError> {
        self.borrow_history_where(user_id, BorrowRecord::is_active)
    }

    /// Every borrow record of the user, most recent first.
    pub fn borrow_history(&self, user_id: UserId) -> Result<Vec<BorrowRecord>, LibraryError> {
        self.borrow_history_where(user_id, |_| true)
    }

    fn borrow_history_where<P>(&self, user_id: UserId, keep: P) -> Result<Vec<BorrowRecord>, LibraryError>
    where
        P: Fn(&BorrowRecord) -> bool,
    {
        self.store.read(|t| {
            let mut records: Vec<BorrowRecord> = t
                .borrows
                .values()
                .filter(|r| r.user_id == user_id && keep(*r))
                .cloned()
                .collect();
            records.sort_by(|a, b| b.borrowed_at.cmp(&a.borrowed_at));
            records
        })
    }

    // ---- activity ------------------------------------------------------

    /// Up to `limit` activity entries, newest first.
    pub fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>, LibraryError> {
        self.store
            .read(|t| t.activity.iter().rev().take(limit).cloned().collect())
    }

    /// One page of recent activity, sized by configuration.
    pub fn activity_page(&self) -> Result<Vec<ActivityEntry>, LibraryError> {
        self.recent_activity(self.config.activity_page_size)
    }

    /// Every entry naming the user, newest first.
    pub fn activity_for(&self, user_id: UserId) -> Result<Vec<ActivityEntry>, LibraryError> {
        self.store.read(|t| {
            t.activity
                .iter()
                .rev()
                .filter(|e| e.user_id == Some(user_id))
                .cloned()
                .collect()
        })
    }
}
