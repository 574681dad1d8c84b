pub mod client;
pub mod config;
pub mod roster;

pub use client::{CmsClient, CmsError};
pub use config::RulesCache;
