//! Pipeline module - loading, cleaning, filtering and aggregating the application table

pub mod aggregate;
pub mod binning;
pub mod cache;
pub mod categories;
pub mod columns;
pub mod correlation;
pub mod error;
pub mod features;
pub mod filter;
pub mod loader;
pub mod missing;
pub mod outliers;
pub mod preprocess;
pub mod stats;

pub use cache::{CacheStats, TableCache};
pub use correlation::{correlation_matrix, CorrelationMatrix};
pub use error::DashboardError;
pub use filter::*;
pub use loader::*;
pub use missing::*;
pub use preprocess::*;
