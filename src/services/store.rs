use crate::core::Predicate;
use crate::models::document::DocumentError;
use crate::models::{
    Dealer, FilterOptions, FuelCount, ManufacturerAvgPrice, ManufacturerCount, PriceMileagePoint,
    ServiceYearCount, SeverityCount, Vehicle, VehicleId, VehicleListItem,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur when reading from the vehicle store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("MongoDB error: {0}")]
    MongoError(#[from] mongodb::error::Error),

    #[error("Row decode error: {0}")]
    DecodeError(#[from] bson::de::Error),

    #[error("Invalid document: {0}")]
    InvalidDocument(#[from] DocumentError),
}

/// Read-only access to the vehicles and dealers collections
///
/// Every transform takes the compiled predicate and returns its rows fully
/// ordered. Empty results are `Ok(vec![])`, never an error.
#[async_trait]
pub trait VehicleStore: Send + Sync {
    /// Vehicles per manufacturer, count descending
    async fn manufacturer_distribution(
        &self,
        predicate: &Predicate,
    ) -> Result<Vec<ManufacturerCount>, StoreError>;

    /// Mean price per manufacturer, mean descending
    async fn avg_price_by_manufacturer(
        &self,
        predicate: &Predicate,
    ) -> Result<Vec<ManufacturerAvgPrice>, StoreError>;

    /// Embedded accidents per severity, count descending
    async fn accident_severity(&self, predicate: &Predicate) -> Result<Vec<SeverityCount>, StoreError>;

    /// Vehicles per fuel type, count descending
    async fn fuel_distribution(&self, predicate: &Predicate) -> Result<Vec<FuelCount>, StoreError>;

    /// Services on or after `cutoff` per calendar year, year ascending
    async fn service_frequency(
        &self,
        predicate: &Predicate,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ServiceYearCount>, StoreError>;

    /// At most `limit` rows, each with numeric price and mileage
    async fn price_mileage_sample(
        &self,
        predicate: &Predicate,
        limit: usize,
    ) -> Result<Vec<PriceMileagePoint>, StoreError>;

    async fn vehicle_list(
        &self,
        predicate: &Predicate,
        limit: usize,
    ) -> Result<Vec<VehicleListItem>, StoreError>;

    /// `Ok(None)` when no vehicle has this id
    async fn find_vehicle(&self, id: &VehicleId) -> Result<Option<Vehicle>, StoreError>;

    async fn find_dealer(&self, dealer_id: i64) -> Result<Option<Dealer>, StoreError>;

    /// Distinct values and bounds over the whole, unfiltered collection
    async fn filter_options(&self) -> Result<FilterOptions, StoreError>;

    /// Health check for the underlying connection
    async fn ping(&self) -> Result<(), StoreError>;
}
