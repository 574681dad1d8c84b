pub mod models;
pub mod normalize;

pub use models::{BrokerRow, MlsRow, OffMarketRow};
