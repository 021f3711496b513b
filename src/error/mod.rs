mod board;
mod store;

pub use board::BoardError;
pub use store::{BoxError, DeadlineExceeded, StoreError, StoreErrorKind};
