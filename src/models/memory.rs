//! In-process implementations of the store traits.
//!
//! They keep the repository contracts (id < 1 handling, version-conditioned
//! updates, genre containment, safelisted ordering with id tie-break) so the
//! HTTP layer and callers can be exercised without PostgreSQL. Word matching
//! approximates the `simple` text-search configuration: every word of the
//! query must occur as a word of the field, case-insensitively.

use crate::error::AppError;
use crate::models::{validate_book, Book, BookStore, Token, TokenStore, User, UserStore};
use crate::service::{calculate_metadata, validate_filters, Filters, Metadata, SortDirection, Validator};
use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Tables {
    next_book_id: i64,
    books: BTreeMap<i64, Book>,
    next_user_id: i64,
    users: BTreeMap<i64, User>,
    tokens: Vec<Token>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn words(s: &str) -> Vec<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// A term without any word matches nothing, like an empty `plainto_tsquery`.
fn text_matches(field: &str, term: &str) -> bool {
    let field_words = words(field);
    let term_words = words(term);
    !term_words.is_empty() && term_words.iter().all(|w| field_words.contains(w))
}

fn compare_column(a: &Book, b: &Book, column: &str) -> Ordering {
    match column {
        "id" => a.id.cmp(&b.id),
        "title" => a.title.cmp(&b.title),
        "author" => a.author.cmp(&b.author),
        "year" => a.year.cmp(&b.year),
        "released_at" => a.released_at.cmp(&b.released_at),
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn insert(&self, book: &mut Book) -> Result<(), AppError> {
        let mut t = self.lock();
        t.next_book_id += 1;
        book.id = t.next_book_id;
        book.created_at = Utc::now();
        book.version = 1;
        t.books.insert(book.id, book.clone());
        Ok(())
    }

    async fn get(&self, id: i64) -> Result<Book, AppError> {
        if id < 1 {
            return Err(AppError::NotFound);
        }
        self.lock().books.get(&id).cloned().ok_or(AppError::NotFound)
    }

    async fn update(&self, book: &mut Book) -> Result<(), AppError> {
        let mut v = Validator::new();
        validate_book(&mut v, book);
        v.into_result()?;

        let mut t = self.lock();
        let stored = match t.books.get_mut(&book.id) {
            Some(stored) if stored.version == book.version => stored,
            _ => return Err(AppError::EditConflict),
        };
        stored.title = book.title.clone();
        stored.author = book.author.clone();
        stored.year = book.year;
        stored.genres = book.genres.clone();
        stored.released_at = book.released_at;
        stored.version += 1;
        *book = stored.clone();
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        if id < 1 {
            return Err(AppError::NotFound);
        }
        self.lock().books.remove(&id).map(|_| ()).ok_or(AppError::NotFound)
    }

    async fn get_all(
        &self,
        title: &str,
        author: &str,
        genres: &[String],
        filters: &Filters,
    ) -> Result<(Vec<Book>, Metadata), AppError> {
        let mut v = Validator::new();
        validate_filters(&mut v, filters);
        v.into_result()?;
        let order = filters.sort_order()?;
        let (title, author) = (title.trim(), author.trim());

        let mut matched: Vec<Book> = self
            .lock()
            .books
            .values()
            .filter(|b| title.is_empty() || text_matches(&b.title, title))
            .filter(|b| author.is_empty() || text_matches(&b.author, author))
            .filter(|b| genres.iter().all(|g| b.genres.contains(g)))
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            let primary = compare_column(a, b, order.column());
            let primary = match order.direction() {
                SortDirection::Asc => primary,
                SortDirection::Desc => primary.reverse(),
            };
            primary.then(a.id.cmp(&b.id))
        });

        let offset = usize::try_from(filters.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(filters.limit()).unwrap_or(0);
        let page: Vec<Book> = matched.iter().skip(offset).take(limit).cloned().collect();
        // Mirrors `count(*) OVER()`: the count rides on the returned rows.
        let total_records = if page.is_empty() { 0 } else { matched.len() as i64 };
        Ok((page, calculate_metadata(total_records, filters.page, filters.page_size)))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: &mut User) -> Result<(), AppError> {
        let mut t = self.lock();
        if t.users.values().any(|u| u.email == user.email) {
            return Err(AppError::DuplicateEmail);
        }
        t.next_user_id += 1;
        user.id = t.next_user_id;
        user.created_at = Utc::now();
        user.version = 1;
        t.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_by_email(&self, email: &str) -> Result<User, AppError> {
        self.lock()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn update(&self, user: &mut User) -> Result<(), AppError> {
        let mut t = self.lock();
        if t.users.values().any(|u| u.email == user.email && u.id != user.id) {
            return Err(AppError::DuplicateEmail);
        }
        let stored = match t.users.get_mut(&user.id) {
            Some(stored) if stored.version == user.version => stored,
            _ => return Err(AppError::EditConflict),
        };
        let version = stored.version + 1;
        *stored = User {
            version,
            ..user.clone()
        };
        user.version = version;
        Ok(())
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn insert(&self, token: &Token) -> Result<(), AppError> {
        self.lock().tokens.push(token.clone());
        Ok(())
    }

    async fn delete_all_for_user(&self, scope: &str, user_id: i64) -> Result<(), AppError> {
        self.lock()
            .tokens
            .retain(|t| !(t.scope == scope && t.user_id == user_id));
        Ok(())
    }

    async fn get_user_for_token(&self, scope: &str, hash: &[u8]) -> Result<User, AppError> {
        let t = self.lock();
        let now = Utc::now();
        t.tokens
            .iter()
            .find(|tok| tok.scope == scope && tok.hash == hash && tok.expiry > now)
            .and_then(|tok| t.users.get(&tok.user_id))
            .cloned()
            .ok_or(AppError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_matching_ignores_case_and_punctuation() {
        assert!(text_matches("The Lord of the Rings", "lord rings"));
        assert!(text_matches("Le Guin, Ursula K.", "ursula"));
        assert!(!text_matches("The Lord of the Rings", "lords"));
        assert!(!text_matches("anything", "!!!"));
    }
}
