pub mod comments;
pub mod db;
pub mod filter;
pub mod models;
pub mod notes;
pub mod relations;
pub mod schema;
pub mod users;

mod error;

pub use error::{Error, is_serialization_failure, is_unique_violation};

pub type Result<T, E = Error> = std::result::Result<T, E>;
