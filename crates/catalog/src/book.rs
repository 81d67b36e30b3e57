use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use libris_core::{AuthorId, BookId, DomainError, DomainResult, Entity};

use crate::isbn::Isbn;
use crate::text::title_case;

/// Copies a new book starts with when the caller does not say.
pub const DEFAULT_COPIES: i64 = 1;

/// A title held by the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author_id: AuthorId,
    pub isbn: String,
    pub pages: u32,
    /// Copies on the shelf right now. Never negative once persisted.
    pub available_copies: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author_id: AuthorId,
    pub isbn: String,
    pub pages: u32,
    #[serde(default = "default_copies")]
    pub available_copies: i64,
}

fn default_copies() -> i64 {
    DEFAULT_COPIES
}

/// Partial update of a book; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author_id: Option<AuthorId>,
    pub isbn: Option<String>,
    pub pages: Option<u32>,
    pub available_copies: Option<i64>,
}

impl Book {
    pub fn new(id: BookId, input: NewBook, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: input.title,
            author_id: input.author_id,
            isbn: input.isbn,
            pages: input.pages,
            available_copies: input.available_copies,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_changes(&mut self, changes: BookChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(author_id) = changes.author_id {
            self.author_id = author_id;
        }
        if let Some(isbn) = changes.isbn {
            self.isbn = isbn;
        }
        if let Some(pages) = changes.pages {
            self.pages = pages;
        }
        if let Some(copies) = changes.available_copies {
            self.available_copies = copies;
        }
    }

    /// Title-case the title and strip ISBN separators.
    ///
    /// Corrections only; nothing here fails.
    pub fn normalize(&mut self) {
        self.title = title_case(self.title.trim());
        self.isbn = Isbn::strip(&self.isbn).to_ascii_uppercase();
    }

    /// Negative shelf counts are stored as zero.
    pub fn clamp_copies(&mut self) {
        self.available_copies = self.available_copies.max(0);
    }

    /// Field constraints checked before a book row is written.
    pub fn validate(&self) -> DomainResult<()> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("book title cannot be empty"));
        }
        Isbn::parse(&self.isbn)?;
        Ok(())
    }

    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }
}

impl Entity for Book {
    type Id = BookId;
    const KIND: &'static str = "book";

    fn id(&self) -> BookId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nineteen_eighty_four(copies: i64) -> Book {
        Book::new(
            BookId::new(),
            NewBook {
                title: "nineteen eighty-four".to_string(),
                author_id: AuthorId::new(),
                isbn: "978-0-451-52493-5".to_string(),
                pages: 328,
                available_copies: copies,
            },
            Utc::now(),
        )
    }

    #[test]
    fn normalize_fixes_title_and_isbn_and_clamp_fixes_copies() {
        let mut book = nineteen_eighty_four(-3);
        book.normalize();

        assert_eq!(book.title, "Nineteen Eighty-Four");
        assert_eq!(book.isbn, "9780451524935");
        assert_eq!(book.available_copies, -3);

        book.clamp_copies();
        assert_eq!(book.available_copies, 0);
        assert!(!book.is_available());
        assert!(book.validate().is_ok());
    }

    #[test]
    fn normalize_trims_before_title_casing() {
        let mut book = nineteen_eighty_four(1);
        book.title = "  harry potter and the philosopher's stone \n".to_string();
        book.normalize();
        assert_eq!(book.title, "Harry Potter And The Philosopher's Stone");
    }

    #[test]
    fn clamp_keeps_positive_copies() {
        let mut book = nineteen_eighty_four(2);
        book.clamp_copies();
        assert_eq!(book.available_copies, 2);
        assert!(book.is_available());
    }

    #[test]
    fn validate_rejects_malformed_isbn() {
        let mut book = nineteen_eighty_four(1);
        book.isbn = "12-34".to_string();
        book.normalize();
        assert!(matches!(book.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn new_book_defaults_to_one_copy_when_deserialized() {
        let json = serde_json::json!({
            "title": "animal farm",
            "author_id": AuthorId::new(),
            "isbn": "9780451526342",
            "pages": 112
        });
        let input: NewBook = serde_json::from_value(json).unwrap();
        assert_eq!(input.available_copies, DEFAULT_COPIES);
    }
}
