//! Car Sales Analytics - read-side service for the car sales dashboard
//!
//! This library compiles sidebar filters into store predicates, runs the
//! dashboard aggregations against the vehicles collection, and looks up
//! single-vehicle histories. Results are cached with a time-to-live.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{service_cutoff, FilterSelection, ManufacturerChoice, Predicate};
pub use models::{ClosedRange, DashboardSummary, Vehicle, VehicleDetail, VehicleId};
pub use services::{AnalyticsService, CacheManager, MemoryStore, MongoStore, VehicleStore};
