use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use libris_core::{DomainError, DomainResult, Entity, UserId};

/// A registered borrower.
///
/// Credentials are out of scope; the account is the identity the lending desk
/// receives from an already-authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: DateTime<Utc>,
}

/// Input for registering a user account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl NewUser {
    pub fn named(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }
}

impl UserAccount {
    pub fn new(id: UserId, input: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id,
            username: input.username.trim().to_string(),
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            date_joined: now,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.username.is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }
        if self.username.chars().any(char::is_whitespace) {
            return Err(DomainError::validation(format!(
                "username '{}' cannot contain whitespace",
                self.username
            )));
        }
        Ok(())
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

impl Entity for UserAccount {
    type Id = UserId;
    const KIND: &'static str = "user";

    fn id(&self) -> UserId {
        self.id
    }
}

/// Lending-side profile, one per account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub phone: String,
    pub address: String,
    /// Lifetime borrow count. Returns do not decrement it.
    pub books_borrowed_count: u64,
    pub membership_date: DateTime<Utc>,
}

/// Contact details a user may edit on their profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileChanges {
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Longest phone number the profile accepts.
pub const PHONE_MAX_LEN: usize = 15;

impl UserProfile {
    pub fn new(user_id: UserId, membership_date: DateTime<Utc>) -> Self {
        Self {
            user_id,
            phone: String::new(),
            address: String::new(),
            books_borrowed_count: 0,
            membership_date,
        }
    }

    pub fn record_borrow(&mut self) {
        self.books_borrowed_count += 1;
    }

    pub fn apply_changes(&mut self, changes: ProfileChanges) -> DomainResult<()> {
        if let Some(phone) = changes.phone {
            if phone.chars().count() > PHONE_MAX_LEN {
                return Err(DomainError::validation(format!(
                    "phone number longer than {PHONE_MAX_LEN} characters"
                )));
            }
            self.phone = phone;
        }
        if let Some(address) = changes.address {
            self.address = address;
        }
        Ok(())
    }
}

impl Entity for UserProfile {
    type Id = UserId;
    const KIND: &'static str = "profile";

    fn id(&self) -> UserId {
        self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_is_trimmed_and_checked() {
        let account = UserAccount::new(UserId::new(), NewUser::named("  alice_reader "), Utc::now());
        assert_eq!(account.username, "alice_reader");
        assert!(account.validate().is_ok());

        let account = UserAccount::new(UserId::new(), NewUser::named("alice reader"), Utc::now());
        assert!(matches!(account.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn full_name_skips_missing_parts() {
        let account = UserAccount::new(
            UserId::new(),
            NewUser {
                first_name: "Alice".to_string(),
                ..NewUser::named("alice_reader")
            },
            Utc::now(),
        );
        assert_eq!(account.full_name(), "Alice");
    }

    #[test]
    fn profile_changes_validate_phone_length() {
        let mut profile = UserProfile::new(UserId::new(), Utc::now());
        profile
            .apply_changes(ProfileChanges {
                phone: Some("+44 20 7946".to_string()),
                address: Some("1 Library Lane".to_string()),
            })
            .unwrap();
        assert_eq!(profile.address, "1 Library Lane");

        let err = profile
            .apply_changes(ProfileChanges {
                phone: Some("0".repeat(16)),
                address: None,
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(profile.phone, "+44 20 7946");
    }
}
