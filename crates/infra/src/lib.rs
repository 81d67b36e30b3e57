//! Infrastructure layer: store, derivation engine, lending desk, config.

pub mod circulation;
pub mod config;
pub mod engine;
pub mod error;
pub mod library;
pub mod reactions;
pub mod store;


pub use config::{ConfigError, LibraryConfig};
pub use engine::{DerivationEngine, ReturnEvent};
pub use error::LibraryError;
pub use library::{CatalogueEntry, Library};
pub use store::{InMemoryLibraryStore, LibraryStore, Tables, UnitOfWork};
