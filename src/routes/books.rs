//! Book CRUD and search routes.

use crate::handlers::books::{create, delete as delete_handler, list, read, update};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn book_routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/books", get(list).post(create))
        .route(
            "/v1/books/:id",
            get(read).patch(update).delete(delete_handler),
        )
        .with_state(state)
}
