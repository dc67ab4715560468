//! Book handlers: create, show, list, update, delete.

use crate::error::AppError;
use crate::models::{validate_book, Book, BOOK_SORT_SAFELIST, DEFAULT_BOOK_SORT};
use crate::response::{message_ok, success_one, success_one_ok, success_page};
use crate::service::{Filters, Validator};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::collections::HashMap;

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_PAGE_SIZE: i64 = 20;

/// Ids that do not parse or are below 1 cannot name a record.
fn parse_id(id_str: &str) -> Result<i64, AppError> {
    match id_str.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(AppError::NotFound),
    }
}

fn read_string(params: &HashMap<String, String>, key: &str, default: &str) -> String {
    params
        .get(key)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn read_csv(params: &HashMap<String, String>, key: &str) -> Vec<String> {
    params
        .get(key)
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn read_int(params: &HashMap<String, String>, key: &str, default: i64, v: &mut Validator) -> i64 {
    match params.get(key).filter(|s| !s.is_empty()) {
        None => default,
        Some(s) => s.trim().parse().unwrap_or_else(|_| {
            v.add_error(key, "must be an integer value");
            default
        }),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateBookInput {
    pub title: String,
    pub author: String,
    pub year: i32,
    pub genres: Vec<String>,
    pub released_at: i32,
}

/// Partial update. `version`, when sent, must match the stored version.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateBookInput {
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<i32>,
    pub genres: Option<Vec<String>>,
    pub released_at: Option<i32>,
    pub version: Option<i32>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let mut v = Validator::new();
    let title = read_string(&params, "title", "");
    let author = read_string(&params, "author", "");
    let genres = read_csv(&params, "genres");
    let filters = Filters::new(
        read_int(&params, "page", DEFAULT_PAGE, &mut v),
        read_int(&params, "page_size", DEFAULT_PAGE_SIZE, &mut v),
        read_string(&params, "sort", DEFAULT_BOOK_SORT),
        BOOK_SORT_SAFELIST,
    );
    v.into_result()?;

    let (books, metadata) = state.models.books.get_all(&title, &author, &genres, &filters).await?;
    Ok(success_page(books, metadata))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateBookInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(input) = payload?;
    let mut book = Book {
        title: input.title,
        author: input.author,
        year: input.year,
        genres: input.genres,
        released_at: input.released_at,
        ..Default::default()
    };
    let mut v = Validator::new();
    validate_book(&mut v, &book);
    v.into_result()?;

    state.models.books.insert(&mut book).await?;
    tracing::info!(id = book.id, "book created");
    Ok(success_one(book))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let book = state.models.books.get(id).await?;
    Ok(success_one_ok(book))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    payload: Result<Json<UpdateBookInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let Json(input) = payload?;
    let mut book = state.models.books.get(id).await?;
    if input.version.is_some_and(|expected| expected != book.version) {
        return Err(AppError::EditConflict);
    }
    if let Some(title) = input.title {
        book.title = title;
    }
    if let Some(author) = input.author {
        book.author = author;
    }
    if let Some(year) = input.year {
        book.year = year;
    }
    if let Some(genres) = input.genres {
        book.genres = genres;
    }
    if let Some(released_at) = input.released_at {
        book.released_at = released_at;
    }

    state.models.books.update(&mut book).await?;
    Ok(success_one_ok(book))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    state.models.books.delete(id).await?;
    tracing::info!(id, "book deleted");
    Ok(message_ok("book successfully deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn ids_below_one_or_garbage_are_not_found() {
        assert_eq!(parse_id("12").unwrap(), 12);
        for bad in ["0", "-3", "abc", ""] {
            assert!(matches!(parse_id(bad), Err(AppError::NotFound)), "{bad}");
        }
    }

    #[test]
    fn csv_genres_are_trimmed() {
        let p = params(&[("genres", "sci-fi, classic,,")]);
        assert_eq!(read_csv(&p, "genres"), vec!["sci-fi", "classic"]);
        assert!(read_csv(&p, "missing").is_empty());
    }

    #[test]
    fn blank_search_terms_fall_back_to_default() {
        let p = params(&[("title", "   "), ("author", " Le Guin ")]);
        assert_eq!(read_string(&p, "title", ""), "");
        assert_eq!(read_string(&p, "author", ""), "Le Guin");
        assert_eq!(read_string(&p, "sort", "id"), "id");
    }

    #[test]
    fn non_integer_page_is_a_validation_error() {
        let p = params(&[("page", "two")]);
        let mut v = Validator::new();
        assert_eq!(read_int(&p, "page", 1, &mut v), 1);
        assert_eq!(v.errors()["page"], "must be an integer value");
    }
}
