// Core query logic exports
pub mod aggregations;
pub mod filters;
pub mod pipelines;
pub mod window;

pub use filters::{FilterSelection, ManufacturerChoice, Predicate};
pub use window::{service_cutoff, SERVICE_WINDOW_YEARS};
