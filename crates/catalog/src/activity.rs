use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use libris_core::{ActivityId, Entity, UserId};
use libris_events::Event;

/// What an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    BookCreated,
    BookBorrowed,
    BookReturned,
    BookDeleted,
    UserRegistered,
}

impl ActivityAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityAction::BookCreated => "book_created",
            ActivityAction::BookBorrowed => "book_borrowed",
            ActivityAction::BookReturned => "book_returned",
            ActivityAction::BookDeleted => "book_deleted",
            ActivityAction::UserRegistered => "user_registered",
        }
    }

    /// Human-readable label, as shown on the activity page.
    pub fn label(self) -> &'static str {
        match self {
            ActivityAction::BookCreated => "Book Created",
            ActivityAction::BookBorrowed => "Book Borrowed",
            ActivityAction::BookReturned => "Book Returned",
            ActivityAction::BookDeleted => "Book Deleted",
            ActivityAction::UserRegistered => "User Registered",
        }
    }
}

impl core::fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only audit log entry.
///
/// Entries are never edited by the system; the only change an entry ever sees
/// is `user_id` being cleared when that user account is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: ActivityId,
    pub action: ActivityAction,
    pub description: String,
    pub user_id: Option<UserId>,
    pub timestamp: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn new(
        action: ActivityAction,
        description: impl Into<String>,
        user_id: Option<UserId>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActivityId::new(),
            action,
            description: description.into(),
            user_id,
            timestamp,
        }
    }

    pub fn book_created(title: &str, author: &str, at: DateTime<Utc>) -> Self {
        Self::new(
            ActivityAction::BookCreated,
            format!("New book '{title}' by {author} added to library"),
            None,
            at,
        )
    }

    pub fn book_deleted(title: &str, author: &str, at: DateTime<Utc>) -> Self {
        Self::new(
            ActivityAction::BookDeleted,
            format!("Book '{title}' by {author} was removed from library"),
            None,
            at,
        )
    }

    pub fn book_borrowed(title: &str, username: &str, user_id: UserId, at: DateTime<Utc>) -> Self {
        Self::new(
            ActivityAction::BookBorrowed,
            format!("'{title}' borrowed by {username}"),
            Some(user_id),
            at,
        )
    }

    pub fn book_returned(title: &str, username: &str, user_id: UserId, at: DateTime<Utc>) -> Self {
        Self::new(
            ActivityAction::BookReturned,
            format!("'{title}' returned by {username}"),
            Some(user_id),
            at,
        )
    }

    pub fn user_registered(username: &str, user_id: UserId, at: DateTime<Utc>) -> Self {
        Self::new(
            ActivityAction::UserRegistered,
            format!("New user '{username}' registered in the system"),
            Some(user_id),
            at,
        )
    }
}

impl Entity for ActivityEntry {
    type Id = ActivityId;
    const KIND: &'static str = "activity";

    fn id(&self) -> ActivityId {
        self.id
    }
}

impl Event for ActivityEntry {
    fn event_type(&self) -> &'static str {
        self.action.as_str()
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
