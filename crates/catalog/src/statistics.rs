use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use libris_core::{BookId, DomainError, DomainResult, ValueObject};

/// Per-book circulation counters, one row per book.
///
/// Maintained incrementally by lifecycle reactions; never recomputed from the
/// borrow history on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookStatistics {
    pub book_id: BookId,
    /// Every borrow ever recorded. Only grows.
    pub total_borrows: u64,
    /// Copies out right now. Floored at zero.
    pub current_borrowed: u64,
    pub rating_sum: i64,
    pub rating_count: u64,
    pub created_at: DateTime<Utc>,
}

impl BookStatistics {
    pub fn new(book_id: BookId, created_at: DateTime<Utc>) -> Self {
        Self {
            book_id,
            total_borrows: 0,
            current_borrowed: 0,
            rating_sum: 0,
            rating_count: 0,
            created_at,
        }
    }

    pub fn record_borrow(&mut self) {
        self.total_borrows += 1;
        self.current_borrowed += 1;
    }

    /// One copy came back. Never goes below zero.
    pub fn record_return(&mut self) {
        self.current_borrowed = self.current_borrowed.saturating_sub(1);
    }

    pub fn record_rating(&mut self, rating: Rating) {
        self.rating_sum += i64::from(rating.value());
        self.rating_count += 1;
    }

    /// Mean rating rounded to two decimals; `0.0` before the first rating.
    pub fn average_rating(&self) -> f64 {
        average_rating(self.rating_sum, self.rating_count)
    }
}

/// `sum / count` rounded to two decimals, or `0.0` when `count` is zero.
pub fn average_rating(sum: i64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let mean = sum as f64 / count as f64;
    (mean * 100.0).round() / 100.0
}

/// A single reader rating, 1 to 5 inclusive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl ValueObject for Rating {}

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> DomainResult<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DomainError::validation(format!(
                "rating must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}
