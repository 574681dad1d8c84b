pub mod filter;
pub mod listing;
pub mod page;
pub mod rules;
