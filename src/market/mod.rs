/// Exchange mover aggregation and ranking
pub mod provider;
pub mod model;
pub mod symbol;
pub mod merge;
pub mod float;
pub mod ranking;
pub mod cse;
pub mod yahoo;
pub mod service;

// Re-export commonly used types
pub use provider::MarketDataError;
pub use model::{MoverRecord, ScoredMover};
pub use ranking::Thresholds;
pub use service::{DaytradeReport, LowFloatReport, MoverService};
