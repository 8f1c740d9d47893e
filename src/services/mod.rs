pub mod cache;
pub mod engine;
pub mod features;
pub mod performance;
pub mod portfolio;
pub mod scorer;
pub mod signal_store;
pub mod sqlite_store;
pub mod trades;

pub use cache::TtlCache;
pub use engine::SignalEngine;
pub use features::extract_features;
pub use performance::{analyze, PerformanceService};
pub use portfolio::{compute_allocation, compute_exposure, PortfolioService};
pub use scorer::generate_signal;
pub use signal_store::SignalStore;
pub use sqlite_store::SqliteStore;
pub use trades::TradeService;
