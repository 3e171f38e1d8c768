// Service exports
pub mod analytics;
pub mod cache;
pub mod memory;
pub mod mongo;
pub mod store;

pub use analytics::{AnalyticsService, Clock, QueryLimits, UNKNOWN_DEALER};
pub use cache::{CacheError, CacheKey, CacheManager, CacheStats, CacheTier};
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use store::{StoreError, VehicleStore};
