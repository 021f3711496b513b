//! Database module: quote persistence.
//!
//! Layout:
//! - `models.rs`: domain records and the row struct mirroring the `quotes` table
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `timestamp.rs`: codec for the stored `submitted_at` text
//! - `traits.rs`: the `QuoteStore` contract consumed by the request layer
//! - `actor.rs`: SQLite-backed store serialized through a ractor actor

pub mod actor;
pub mod models;
pub mod schema;
pub mod timestamp;
pub mod traits;

pub use actor::{DbActorHandle, DbRpcError, spawn};
pub use models::{ListOrder, NewQuote, Quote, Vote};
pub use schema::SQLITE_INIT;
pub use traits::QuoteStore;
