// errors.rs
use std::fmt;

/// Errors originating from either the server logic
/// (routing, bad caller input, etc.) or downstream layers (DB, CMS).
#[derive(Debug)]
pub enum ServerError {
    NotFound,
    BadRequest(String),
    /// A backing-store query failed. Never retried inside the engine: a
    /// repeated count+page pair could disagree across attempts.
    DbError(String),
    /// A required upstream fetch failed. Only the team path carries one of
    /// these; rule fetches fail open instead.
    Upstream(String),
    InternalError,
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::NotFound => write!(f, "Not Found"),
            ServerError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            ServerError::DbError(msg) => write!(f, "Database Error: {msg}"),
            ServerError::Upstream(msg) => write!(f, "Upstream Error: {msg}"),
            ServerError::InternalError => write!(f, "Internal Server Error"),
        }
    }
}

impl std::error::Error for ServerError {}
