//! ISBN normalisation and shape checks.

use serde::{Deserialize, Serialize};

use libris_core::{DomainError, DomainResult, ValueObject};

/// A normalised ISBN: separators removed, 10 or 13 characters.
///
/// Only the shape is checked (length, digits, a trailing `X` on ISBN-10);
/// check digits are not verified.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Isbn(String);

impl ValueObject for Isbn {}

impl Isbn {
    /// Remove spaces and hyphens. Never fails.
    pub fn strip(raw: &str) -> String {
        raw.chars().filter(|c| *c != ' ' && *c != '-').collect()
    }

    /// Strip separators, then check the shape.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let stripped = Self::strip(raw);
        let well_formed = stripped.is_ascii()
            && match stripped.len() {
                13 => stripped.bytes().all(|b| b.is_ascii_digit()),
                10 => {
                    let (body, check) = stripped.split_at(9);
                    body.bytes().all(|b| b.is_ascii_digit())
                        && check.bytes().all(|b| b.is_ascii_digit() || b == b'X' || b == b'x')
                }
                _ => false,
            };

        if !well_formed {
            return Err(DomainError::validation(format!(
                "'{raw}' is not a 10 or 13 character ISBN"
            )));
        }

        Ok(Self(stripped.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl core::fmt::Display for Isbn {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
