use crate::server::router::BoardState;
use axum::{
    Router,
    routing::{get, post},
};

pub mod extract;
pub mod handlers;
pub mod views;

pub fn router() -> Router<BoardState> {
    Router::new()
        .route("/", get(handlers::latest_handler))
        .route("/top", get(handlers::top_handler))
        .route("/random", get(handlers::random_handler))
        .route("/quote/{id}", get(handlers::view_handler))
        .route("/add", post(handlers::add_handler))
        .route("/vote", get(handlers::vote_handler))
}
