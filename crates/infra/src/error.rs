//! Error taxonomy for library operations.

use thiserror::Error;

use libris_core::DomainError;
use libris_events::ReactionError;

/// Everything a library operation can fail with.
///
/// Any error returned from inside a unit of work discards every write that
/// unit made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LibraryError {
    /// A field constraint failed (malformed ISBN, duplicate username, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The book has no copy left to lend.
    #[error("no copies of '{title}' are available")]
    NoCopiesAvailable { title: String },

    /// The user already holds an active loan of the book.
    #[error("'{title}' is already borrowed by this user")]
    AlreadyBorrowed { title: String },

    /// A referenced record does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Stored state contradicts a structural rule (e.g. a book with no
    /// statistics row).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// A lifecycle reaction failed and the unit was aborted.
    #[error(transparent)]
    Reaction(#[from] ReactionError),

    /// The store itself failed (poisoned lock, undecodable snapshot).
    #[error("store failure: {0}")]
    Store(String),
}

impl LibraryError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// The domain error at the root of a reaction failure, if any.
    pub fn reaction_source(&self) -> Option<&DomainError> {
        match self {
            LibraryError::Reaction(e) => Some(&e.source),
            _ => None,
        }
    }
}

impl From<DomainError> for LibraryError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => LibraryError::Validation(msg),
            DomainError::InvariantViolation(msg) => LibraryError::InvariantViolation(msg),
            DomainError::InvalidId(msg) => LibraryError::Validation(msg),
            DomainError::NotFound(what) => LibraryError::NotFound(what),
            DomainError::Conflict(msg) => LibraryError::Validation(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_events::Phase;

    #[test]
    fn domain_errors_map_onto_library_errors() {
        assert_eq!(
            LibraryError::from(DomainError::validation("bad isbn")),
            LibraryError::Validation("bad isbn".to_string())
        );
        assert_eq!(
            LibraryError::from(DomainError::not_found("book")),
            LibraryError::NotFound("book".to_string())
        );
        assert!(matches!(
            LibraryError::from(DomainError::conflict("isbn taken")),
            LibraryError::Validation(_)
        ));
    }

    #[test]
    fn reaction_failures_keep_their_source() {
        let err = LibraryError::from(ReactionError {
            subject: "borrow_record",
            reaction: "take_copy",
            phase: Phase::AfterInsert,
            source: DomainError::invariant("book has no row"),
        });
        assert_eq!(
            err.reaction_source(),
            Some(&DomainError::invariant("book has no row"))
        );
        assert!(err.to_string().contains("take_copy"));
    }
}
