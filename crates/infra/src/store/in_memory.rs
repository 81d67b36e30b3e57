use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::{LibraryStore, Tables, UnitOfWork};
use crate::error::LibraryError;

/// In-memory library store.
///
/// One mutex guards all rows. A unit of work runs on a copy of the rows and
/// the copy replaces the originals only when the unit succeeds.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryLibraryStore {
    tables: Mutex<Tables>,
}

impl InMemoryLibraryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(tables: Tables) -> Self {
        Self {
            tables: Mutex::new(tables),
        }
    }

    /// A copy of every row.
    pub fn snapshot(&self) -> Result<Tables, LibraryError> {
        self.read(Tables::clone)
    }

    /// Serialize every row as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, LibraryError> {
        let tables = self.snapshot()?;
        serde_json::to_string_pretty(&tables)
            .map_err(|e| LibraryError::store(format!("snapshot encode failed: {e}")))
    }

    /// Rebuild a store from [`InMemoryLibraryStore::to_json`] output.
    pub fn from_json(json: &str) -> Result<Self, LibraryError> {
        let tables: Tables = serde_json::from_str(json)
            .map_err(|e| LibraryError::store(format!("snapshot decode failed: {e}")))?;
        Ok(Self::with_tables(tables))
    }
}

impl LibraryStore for InMemoryLibraryStore {
    fn transaction<T, F>(&self, now: DateTime<Utc>, work: F) -> Result<T, LibraryError>
    where
        F: FnOnce(&mut UnitOfWork) -> Result<T, LibraryError>,
    {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| LibraryError::store("lock poisoned"))?;

        let mut unit = UnitOfWork::new(tables.clone(), now);
        let out = work(&mut unit)?;

        *tables = unit.tables;
        Ok(out)
    }

    fn read<T, F>(&self, view: F) -> Result<T, LibraryError>
    where
        F: FnOnce(&Tables) -> T,
    {
        let tables = self
            .tables
            .lock()
            .map_err(|_| LibraryError::store("lock poisoned"))?;
        Ok(view(&tables))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_catalog::{ActivityEntry, NewUser, UserAccount};
    use libris_core::UserId;

    fn register(unit: &mut UnitOfWork, username: &str) -> UserId {
        let account = UserAccount::new(UserId::new(), NewUser::named(username), unit.now);
        let id = account.id;
        unit.tables.insert_account(account);
        id
    }

    #[test]
    fn committed_units_are_visible() {
        let store = InMemoryLibraryStore::new();
        let id = store
            .transaction(Utc::now(), |unit| Ok(register(unit, "alice_reader")))
            .unwrap();

        let count = store.read(|t| t.accounts.len()).unwrap();
        assert_eq!(count, 1);
        assert!(store.read(|t| t.profiles.contains_key(&id)).unwrap());
    }

    #[test]
    fn failed_units_leave_no_trace() {
        let store = InMemoryLibraryStore::new();
        let result: Result<(), _> = store.transaction(Utc::now(), |unit| {
            let id = register(unit, "alice_reader");
            unit.log(ActivityEntry::user_registered("alice_reader", id, unit.now));
            Err(LibraryError::Validation("nope".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(store.snapshot().unwrap(), Tables::default());
    }

    #[test]
    fn json_snapshot_restores_every_row() {
        let store = InMemoryLibraryStore::new();
        store
            .transaction(Utc::now(), |unit| {
                let id = register(unit, "bob_bookworm");
                unit.log(ActivityEntry::user_registered("bob_bookworm", id, unit.now));
                Ok(())
            })
            .unwrap();

        let json = store.to_json().unwrap();
        let restored = InMemoryLibraryStore::from_json(&json).unwrap();
        assert_eq!(restored.snapshot().unwrap(), store.snapshot().unwrap());

        assert!(matches!(
            InMemoryLibraryStore::from_json("{not json"),
            Err(LibraryError::Store(_))
        ));
    }
}
