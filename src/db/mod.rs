pub mod connection;
pub mod listings;
pub mod off_market;

pub use connection::Database;
