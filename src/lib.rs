//! Book catalog backend: validated, paginated search and optimistic-concurrency CRUD over PostgreSQL.

pub mod config;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod models;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{AppConfig, DbConfig};
pub use error::{AppError, ConfigError};
pub use migration::apply_migrations;
pub use models::{Book, BookStore, Models};
pub use routes::{app, book_routes, common_routes};
pub use service::{Filters, Metadata, Validator};
pub use state::AppState;
pub use store::{ensure_database_exists, new_pool};
