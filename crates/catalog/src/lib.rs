//! Library catalogue records.
//!
//! Plain records plus the field rules that apply to them (normalisation,
//! shape checks, counter arithmetic). No storage and no cross-record logic:
//! how records react to each other lives in the infrastructure crate.

pub mod account;
pub mod activity;
pub mod author;
pub mod book;
pub mod borrow;
pub mod isbn;
pub mod statistics;
pub mod text;

pub use account::{NewUser, ProfileChanges, UserAccount, UserProfile};
pub use activity::{ActivityAction, ActivityEntry};
pub use author::{Author, AuthorChanges, NewAuthor};
pub use book::{Book, BookChanges, NewBook};
pub use borrow::{BorrowRecord, BorrowStatus, LOAN_PERIOD_DAYS, NewBorrowRecord};
pub use isbn::Isbn;
pub use statistics::{BookStatistics, Rating, average_rating};
