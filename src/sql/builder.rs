//! Builds parameterized statements for the `books` table.
//!
//! Identifiers are static; every client-supplied value travels as a bind parameter.
//! The one dynamic identifier, the ORDER BY column, arrives as a [`SortOrder`],
//! which can only be produced from a safelist.

use crate::models::Book;
use crate::service::SortOrder;
use crate::sql::PgBindValue;
use sqlx::postgres::{PgArguments, PgRow, Postgres};
use sqlx::query::{Query, QueryAs};
use sqlx::FromRow;

pub const BOOKS_TABLE: &str = "books";

/// Columns returned for a full book row, in struct order.
pub const BOOK_COLUMNS: &[&str] = &[
    "id",
    "created_at",
    "title",
    "author",
    "year",
    "genres",
    "released_at",
    "version",
];

/// Columns written by insert and update.
const BOOK_MUTABLE_COLUMNS: &[&str] = &["title", "author", "year", "genres", "released_at"];

/// Quote identifier for PostgreSQL (safe: only static names reach here).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn column_list(cols: &[&str]) -> String {
    cols.iter().map(|c| quoted(c)).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf::default()
    }

    fn push_param(&mut self, v: impl Into<PgBindValue>) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v.into());
        n
    }

    /// Untyped query with every parameter bound.
    pub fn query(&self) -> Query<'_, Postgres, PgArguments> {
        self.params
            .iter()
            .fold(sqlx::query(&self.sql), |query, p| p.bind(query))
    }

    /// Typed query with every parameter bound.
    pub fn query_as<O>(&self) -> QueryAs<'_, Postgres, O, PgArguments>
    where
        O: for<'r> FromRow<'r, PgRow>,
    {
        self.params
            .iter()
            .fold(sqlx::query_as(&self.sql), |query, p| p.bind_as(query))
    }

    fn push_book_values(&mut self, book: &Book) -> Vec<u32> {
        vec![
            self.push_param(book.title.as_str()),
            self.push_param(book.author.as_str()),
            self.push_param(book.year),
            self.push_param(book.genres.as_slice()),
            self.push_param(book.released_at),
        ]
    }
}

/// INSERT of the mutable columns; the database assigns id, created_at and version.
pub fn insert_book(book: &Book) -> QueryBuf {
    let mut q = QueryBuf::new();
    let placeholders = q
        .push_book_values(book)
        .into_iter()
        .map(|n| format!("${}", n))
        .collect::<Vec<_>>()
        .join(", ");
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(BOOKS_TABLE),
        column_list(BOOK_MUTABLE_COLUMNS),
        placeholders,
        column_list(&["id", "created_at", "version"])
    );
    q
}

/// SELECT by primary key.
pub fn select_book_by_id(id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(id);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = ${}",
        column_list(BOOK_COLUMNS),
        quoted(BOOKS_TABLE),
        quoted("id"),
        n
    );
    q
}

/// UPDATE conditioned on both id and the version the caller last read.
/// Bumps the version and returns the stored values.
pub fn update_book(book: &Book) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets: Vec<String> = BOOK_MUTABLE_COLUMNS
        .iter()
        .zip(q.push_book_values(book))
        .map(|(col, n)| format!("{} = ${}", quoted(col), n))
        .collect();
    sets.push(format!("{0} = {0} + 1", quoted("version")));
    let id_param = q.push_param(book.id);
    let version_param = q.push_param(book.version);
    let mut returning = BOOK_MUTABLE_COLUMNS.to_vec();
    returning.push("version");
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${} AND {} = ${} RETURNING {}",
        quoted(BOOKS_TABLE),
        sets.join(", "),
        quoted("id"),
        id_param,
        quoted("version"),
        version_param,
        column_list(&returning)
    );
    q
}

/// DELETE by id.
pub fn delete_book(id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(id);
    q.sql = format!("DELETE FROM {} WHERE {} = ${}", quoted(BOOKS_TABLE), quoted("id"), n);
    q
}

/// Filtered, sorted, paginated SELECT. Each predicate is true when its input is empty.
/// The first column is the pre-pagination match count (`count(*) OVER()`).
/// Rows are tie-broken by id so pages stay stable for non-unique sort columns.
pub fn search_books(
    title: &str,
    author: &str,
    genres: &[String],
    order: SortOrder,
    limit: i64,
    offset: i64,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let title_param = q.push_param(title);
    let author_param = q.push_param(author);
    let genres_param = q.push_param(genres);
    let limit_param = q.push_param(limit);
    let offset_param = q.push_param(offset);

    let where_parts = [
        format!(
            "(to_tsvector('simple', {col}) @@ plainto_tsquery('simple', ${n}) OR ${n} = '')",
            col = quoted("title"),
            n = title_param
        ),
        format!(
            "(to_tsvector('simple', {col}) @@ plainto_tsquery('simple', ${n}) OR ${n} = '')",
            col = quoted("author"),
            n = author_param
        ),
        format!(
            "({col} @> ${n} OR ${n} = '{{}}')",
            col = quoted("genres"),
            n = genres_param
        ),
    ];
    let order_clause = format!(
        "{} {}, {} ASC",
        quoted(order.column()),
        order.direction().as_sql(),
        quoted("id")
    );
    q.sql = format!(
        "SELECT count(*) OVER() AS {}, {} FROM {} WHERE {} ORDER BY {} LIMIT ${} OFFSET ${}",
        quoted("total_records"),
        column_list(BOOK_COLUMNS),
        quoted(BOOKS_TABLE),
        where_parts.join(" AND "),
        order_clause,
        limit_param,
        offset_param
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BOOK_SORT_SAFELIST;
    use crate::service::resolve_sort;

    fn sample() -> Book {
        Book {
            id: 7,
            title: "Dune".into(),
            author: "Frank Herbert".into(),
            year: 1965,
            genres: vec!["sci-fi".into()],
            released_at: 1965,
            version: 3,
            ..Default::default()
        }
    }

    #[test]
    fn insert_binds_values_in_column_order() {
        let q = insert_book(&sample());
        assert_eq!(
            q.sql,
            r#"INSERT INTO "books" ("title", "author", "year", "genres", "released_at") VALUES ($1, $2, $3, $4, $5) RETURNING "id", "created_at", "version""#
        );
        assert_eq!(q.params[0], PgBindValue::Text("Dune".into()));
        assert_eq!(q.params[3], PgBindValue::TextArray(vec!["sci-fi".into()]));
        assert_eq!(q.params.len(), 5);
    }

    #[test]
    fn update_is_conditioned_on_version() {
        let q = update_book(&sample());
        assert!(q.sql.contains(r#""version" = "version" + 1"#));
        assert!(q.sql.contains(r#"WHERE "id" = $6 AND "version" = $7"#));
        assert!(q.sql.ends_with(r#"RETURNING "title", "author", "year", "genres", "released_at", "version""#));
        assert_eq!(q.params[5], PgBindValue::BigInt(7));
        assert_eq!(q.params[6], PgBindValue::Int(3));
    }

    #[test]
    fn search_orders_by_resolved_column_then_id() {
        let order = resolve_sort("-year", BOOK_SORT_SAFELIST).unwrap();
        let q = search_books("", "", &[], order, 20, 40);
        assert!(q.sql.starts_with(r#"SELECT count(*) OVER() AS "total_records", "id""#));
        assert!(q.sql.contains(r#"ORDER BY "year" DESC, "id" ASC LIMIT $4 OFFSET $5"#));
        assert!(q.sql.contains(r#"("genres" @> $3 OR $3 = '{}')"#));
        assert_eq!(q.params[3], PgBindValue::BigInt(20));
        assert_eq!(q.params[4], PgBindValue::BigInt(40));
    }

    #[test]
    fn search_input_never_reaches_sql_text() {
        let order = resolve_sort("title", BOOK_SORT_SAFELIST).unwrap();
        let hostile = "x'); DROP TABLE books; --";
        let q = search_books(hostile, hostile, &[hostile.to_string()], order, 10, 0);
        assert!(!q.sql.contains("DROP"));
        assert_eq!(q.params[0], PgBindValue::Text(hostile.into()));
        assert_eq!(q.params[2], PgBindValue::TextArray(vec![hostile.into()]));
    }

    #[test]
    fn delete_and_select_by_id() {
        assert_eq!(delete_book(4).sql, r#"DELETE FROM "books" WHERE "id" = $1"#);
        let q = select_book_by_id(4);
        assert!(q.sql.ends_with(r#"FROM "books" WHERE "id" = $1"#));
        assert_eq!(q.params, vec![PgBindValue::BigInt(4)]);
    }
}
