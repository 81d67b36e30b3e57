//! Bulk seeding of sample authors, books and users.
//!
//! Everything is created through [`Library`], so every reaction fires exactly
//! as it would for a librarian's edit: names are title-cased, statistics rows
//! and profiles appear, and the activity log records each creation.
//!
//! Seeding is get-or-create: records that already exist (matched by author
//! name, book title, username) are left alone, so re-running against a loaded
//! snapshot only fills the gaps.

use libris_catalog::{NewAuthor, NewBook, NewUser};
use libris_infra::{Library, LibraryError, LibraryStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorSeed {
    pub name: &'static str,
    pub email: &'static str,
    pub biography: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookSeed {
    pub title: &'static str,
    pub isbn: &'static str,
    pub pages: u32,
    pub copies: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserSeed {
    pub username: &'static str,
    pub email: &'static str,
    pub first_name: &'static str,
    pub last_name: &'static str,
}

pub const AUTHORS: [AuthorSeed; 4] = [
    AuthorSeed {
        name: "j.k. rowling",
        email: "jk@example.com",
        biography: "British author, best known for Harry Potter series",
    },
    AuthorSeed {
        name: "george orwell",
        email: "george@example.com",
        biography: "English novelist and essayist",
    },
    AuthorSeed {
        name: "agatha christie",
        email: "agatha@example.com",
        biography: "English crime novelist",
    },
    AuthorSeed {
        name: "isaac asimov",
        email: "isaac@example.com",
        biography: "American science fiction writer",
    },
];

/// Book `i` is attributed to author `i % AUTHORS.len()`.
pub const BOOKS: [BookSeed; 8] = [
    BookSeed {
        title: "harry potter and the philosopher's stone",
        isbn: "9780747532699",
        pages: 223,
        copies: 3,
    },
    BookSeed {
        title: "1984",
        isbn: "9780451524935",
        pages: 328,
        copies: 2,
    },
    BookSeed {
        title: "murder on the orient express",
        isbn: "9780062693662",
        pages: 256,
        copies: 1,
    },
    BookSeed {
        title: "foundation",
        isbn: "9780553293357",
        pages: 244,
        copies: 2,
    },
    BookSeed {
        title: "animal farm",
        isbn: "9780451526342",
        pages: 112,
        copies: 4,
    },
    BookSeed {
        title: "the da vinci code",
        isbn: "9780307474278",
        pages: 454,
        copies: 1,
    },
    BookSeed {
        title: "pride and prejudice",
        isbn: "9780141439518",
        pages: 432,
        copies: 2,
    },
    BookSeed {
        title: "to kill a mockingbird",
        isbn: "9780061120084",
        pages: 376,
        copies: 1,
    },
];

pub const USERS: [UserSeed; 3] = [
    UserSeed {
        username: "alice_reader",
        email: "alice@example.com",
        first_name: "Alice",
        last_name: "Johnson",
    },
    UserSeed {
        username: "bob_bookworm",
        email: "bob@example.com",
        first_name: "Bob",
        last_name: "Smith",
    },
    UserSeed {
        username: "carol_student",
        email: "carol@example.com",
        first_name: "Carol",
        last_name: "Davis",
    },
];

/// How much sample data to create. Counts beyond the built-in samples are
/// capped at the sample size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedOptions {
    pub users: usize,
    pub books: usize,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            users: USERS.len(),
            books: BOOKS.len(),
        }
    }
}

/// What a seeding run did, and what the library holds afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub authors_created: usize,
    pub books_created: usize,
    pub users_created: usize,
    pub authors_total: usize,
    pub books_total: usize,
    pub users_total: usize,
}

/// Create the sample records that are not there yet.
pub fn populate<S>(library: &Library<S>, options: &SeedOptions) -> Result<SeedSummary, LibraryError>
where
    S: LibraryStore,
{
    let mut summary = SeedSummary::default();

    let mut author_ids = Vec::with_capacity(AUTHORS.len());
    for seed in AUTHORS {
        let author = match library.author_by_name(seed.name)? {
            Some(existing) => existing,
            None => {
                let created = library.create_author(NewAuthor {
                    name: seed.name.to_string(),
                    email: seed.email.to_string(),
                    biography: seed.biography.to_string(),
                })?;
                tracing::info!(name = %created.name, "created author");
                summary.authors_created += 1;
                created
            }
        };
        author_ids.push(author.id);
    }

    for (i, seed) in BOOKS.iter().take(options.books).enumerate() {
        if library.book_by_title(seed.title)?.is_some() {
            continue;
        }
        let created = library.create_book(NewBook {
            title: seed.title.to_string(),
            author_id: author_ids[i % author_ids.len()],
            isbn: seed.isbn.to_string(),
            pages: seed.pages,
            available_copies: seed.copies,
        })?;
        tracing::info!(title = %created.title, "created book");
        summary.books_created += 1;
    }

    for seed in USERS.iter().take(options.users) {
        if library.account_by_username(seed.username)?.is_some() {
            continue;
        }
        let created = library.register_user(NewUser {
            username: seed.username.to_string(),
            email: seed.email.to_string(),
            first_name: seed.first_name.to_string(),
            last_name: seed.last_name.to_string(),
        })?;
        tracing::info!(username = %created.username, name = %created.full_name(), "created user");
        summary.users_created += 1;
    }

    summary.authors_total = library.authors()?.len();
    summary.books_total = library.books()?.len();
    summary.users_total = library.accounts()?.len();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_catalog::ActivityAction;
    use libris_infra::{InMemoryLibraryStore, LibraryConfig};

    fn library() -> Library<InMemoryLibraryStore> {
        Library::new(InMemoryLibraryStore::new(), LibraryConfig::default())
    }

    #[test]
    fn seeding_goes_through_every_reaction() {
        let library = library();
        let summary = populate(&library, &SeedOptions::default()).unwrap();

        assert_eq!(
            summary,
            SeedSummary {
                authors_created: 4,
                books_created: 8,
                users_created: 3,
                authors_total: 4,
                books_total: 8,
                users_total: 3,
            }
        );

        let names: Vec<String> = library.authors().unwrap().into_iter().map(|a| a.name).collect();
        assert_eq!(
            names,
            vec!["Agatha Christie", "George Orwell", "Isaac Asimov", "J.K. Rowling"]
        );
        let potter = library
            .book_by_title("harry potter and the philosopher's stone")
            .unwrap()
            .unwrap();
        assert_eq!(potter.title, "Harry Potter And The Philosopher's Stone");
        assert_eq!(library.statistics(potter.id).unwrap().total_borrows, 0);

        let alice = library.account_by_username("alice_reader").unwrap().unwrap();
        assert_eq!(library.profile(alice.id).unwrap().books_borrowed_count, 0);

        let activity = library.recent_activity(usize::MAX).unwrap();
        let count = |action: ActivityAction| activity.iter().filter(|e| e.action == action).count();
        assert_eq!(count(ActivityAction::BookCreated), 8);
        assert_eq!(count(ActivityAction::UserRegistered), 3);
    }

    #[test]
    fn reseeding_only_fills_gaps() {
        let library = library();
        populate(&library, &SeedOptions { users: 1, books: 2 }).unwrap();

        let summary = populate(&library, &SeedOptions::default()).unwrap();
        assert_eq!(summary.authors_created, 0);
        assert_eq!(summary.books_created, 6);
        assert_eq!(summary.users_created, 2);
        assert_eq!(summary.books_total, 8);

        let again = populate(&library, &SeedOptions::default()).unwrap();
        assert_eq!((again.books_created, again.users_created), (0, 0));
    }

    #[test]
    fn counts_are_capped_at_the_samples() {
        let library = library();
        let summary = populate(&library, &SeedOptions { users: 10, books: 0 }).unwrap();
        assert_eq!(summary.books_total, 0);
        assert_eq!(summary.users_total, 3);
        // Authors are always seeded.
        assert_eq!(summary.authors_total, 4);
    }
}
