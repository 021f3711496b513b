pub mod config;
pub mod db;
pub mod error;
pub mod sanitize;
pub mod server;

pub use db::{NewQuote, Quote, QuoteStore, Vote};
pub use error::{BoardError, DeadlineExceeded, StoreError, StoreErrorKind};
