pub mod bookings;
pub mod db;
pub mod embeddings;
pub mod models;
pub mod preferences;
pub mod schema;
pub mod tours;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
