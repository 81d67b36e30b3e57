use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use libris_core::{AuthorId, DomainError, DomainResult, Entity};

use crate::text::title_case;

/// An author; many books may reference one author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    pub email: String,
    pub biography: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating an author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuthor {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub biography: String,
}

/// Partial update of an author; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub biography: Option<String>,
}

impl Author {
    pub fn new(id: AuthorId, input: NewAuthor, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            email: input.email,
            biography: input.biography,
            created_at,
        }
    }

    pub fn apply_changes(&mut self, changes: AuthorChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(email) = changes.email {
            self.email = email;
        }
        if let Some(biography) = changes.biography {
            self.biography = biography;
        }
    }

    /// Title-case the name. Applied on every write.
    pub fn normalize(&mut self) {
        self.name = title_case(self.name.trim());
    }

    /// Field constraints checked before an author row is written.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("author name cannot be empty"));
        }
        if !self.email.contains('@') {
            return Err(DomainError::validation(format!(
                "author email '{}' is not an address",
                self.email
            )));
        }
        Ok(())
    }
}

impl Entity for Author {
    type Id = AuthorId;
    const KIND: &'static str = "author";

    fn id(&self) -> AuthorId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orwell() -> Author {
        Author::new(
            AuthorId::new(),
            NewAuthor {
                name: "george orwell".to_string(),
                email: "george@example.com".to_string(),
                biography: "English novelist and essayist".to_string(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn normalize_title_cases_the_name() {
        let mut author = orwell();
        author.normalize();
        assert_eq!(author.name, "George Orwell");
    }

    #[test]
    fn changes_only_touch_given_fields() {
        let mut author = orwell();
        author.apply_changes(AuthorChanges {
            biography: Some("Wrote 1984".to_string()),
            ..AuthorChanges::default()
        });
        assert_eq!(author.name, "george orwell");
        assert_eq!(author.biography, "Wrote 1984");
    }

    #[test]
    fn validate_rejects_blank_name_and_bad_email() {
        let mut author = orwell();
        author.name = "   ".to_string();
        assert!(matches!(author.validate(), Err(DomainError::Validation(_))));

        let mut author = orwell();
        author.email = "nowhere".to_string();
        assert!(matches!(author.validate(), Err(DomainError::Validation(_))));
    }
}
