//! Typed bind values carried next to generated SQL.

use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::{Query, QueryAs};

/// A value bound to a `$n` placeholder.
#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    BigInt(i64),
    Int(i32),
    Text(String),
    TextArray(Vec<String>),
}

impl PgBindValue {
    pub fn bind<'q>(&self, query: Query<'q, Postgres, PgArguments>) -> Query<'q, Postgres, PgArguments> {
        match self {
            PgBindValue::BigInt(n) => query.bind(*n),
            PgBindValue::Int(n) => query.bind(*n),
            PgBindValue::Text(s) => query.bind(s.clone()),
            PgBindValue::TextArray(v) => query.bind(v.clone()),
        }
    }

    pub fn bind_as<'q, O>(
        &self,
        query: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> QueryAs<'q, Postgres, O, PgArguments> {
        match self {
            PgBindValue::BigInt(n) => query.bind(*n),
            PgBindValue::Int(n) => query.bind(*n),
            PgBindValue::Text(s) => query.bind(s.clone()),
            PgBindValue::TextArray(v) => query.bind(v.clone()),
        }
    }
}

impl From<i64> for PgBindValue {
    fn from(n: i64) -> Self {
        PgBindValue::BigInt(n)
    }
}

impl From<i32> for PgBindValue {
    fn from(n: i32) -> Self {
        PgBindValue::Int(n)
    }
}

impl From<&str> for PgBindValue {
    fn from(s: &str) -> Self {
        PgBindValue::Text(s.to_string())
    }
}

impl From<&[String]> for PgBindValue {
    fn from(v: &[String]) -> Self {
        PgBindValue::TextArray(v.to_vec())
    }
}
