use crate::core::{service_cutoff, Predicate};
use crate::models::{
    DashboardQuery, DashboardSummary, FilterOptions, FuelCount, ManufacturerAvgPrice,
    ManufacturerCount, PriceMileagePoint, ServiceYearCount, SeverityCount, Vehicle, VehicleDetail,
    VehicleId, VehicleListItem,
};
use crate::services::cache::{CacheKey, CacheManager, CacheTier};
use crate::services::store::{StoreError, VehicleStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Label shown when a vehicle's dealer cannot be resolved
pub const UNKNOWN_DEALER: &str = "Unknown";

/// Source of the current instant for the rolling service window
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Row caps for the raw-row reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    pub price_mileage_sample: usize,
    pub vehicle_list: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            price_mileage_sample: 2000,
            vehicle_list: 500,
        }
    }
}

/// Dashboard read service
///
/// Wraps a [`VehicleStore`] with the result caches, the row caps and the
/// clock. Every call is a stateless read keyed by its predicate.
#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn VehicleStore>,
    cache: Arc<CacheManager>,
    limits: QueryLimits,
    clock: Clock,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn VehicleStore>, cache: Arc<CacheManager>, limits: QueryLimits) -> Self {
        Self {
            store,
            cache,
            limits,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock, e.g. to pin the service window in tests
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn limits(&self) -> QueryLimits {
        self.limits
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }

    pub async fn filter_options(&self) -> Result<FilterOptions, StoreError> {
        self.cache
            .get_or_load(CacheTier::Options, &CacheKey::filter_options(), || {
                self.store.filter_options()
            })
            .await
    }

    /// Compile query-string filters, filling omitted ranges from the collection bounds
    pub async fn compile_query(&self, query: &DashboardQuery) -> Result<Predicate, StoreError> {
        let options = self.filter_options().await?;
        Ok(query.to_selection(&options).compile())
    }

    pub async fn manufacturer_distribution(
        &self,
        predicate: &Predicate,
    ) -> Result<Vec<ManufacturerCount>, StoreError> {
        self.cache
            .get_or_load(
                CacheTier::Results,
                &CacheKey::manufacturer_distribution(predicate),
                || self.store.manufacturer_distribution(predicate),
            )
            .await
    }

    pub async fn avg_price_by_manufacturer(
        &self,
        predicate: &Predicate,
    ) -> Result<Vec<ManufacturerAvgPrice>, StoreError> {
        self.cache
            .get_or_load(CacheTier::Results, &CacheKey::avg_price(predicate), || {
                self.store.avg_price_by_manufacturer(predicate)
            })
            .await
    }

    pub async fn accident_severity(&self, predicate: &Predicate) -> Result<Vec<SeverityCount>, StoreError> {
        self.cache
            .get_or_load(CacheTier::Results, &CacheKey::accident_severity(predicate), || {
                self.store.accident_severity(predicate)
            })
            .await
    }

    pub async fn fuel_distribution(&self, predicate: &Predicate) -> Result<Vec<FuelCount>, StoreError> {
        self.cache
            .get_or_load(CacheTier::Results, &CacheKey::fuel_distribution(predicate), || {
                self.store.fuel_distribution(predicate)
            })
            .await
    }

    /// Services over the last five years, counted per year
    pub async fn service_frequency(
        &self,
        predicate: &Predicate,
    ) -> Result<Vec<ServiceYearCount>, StoreError> {
        let cutoff = service_cutoff((self.clock)());
        self.cache
            .get_or_load(
                CacheTier::Results,
                &CacheKey::service_frequency(predicate, cutoff),
                || self.store.service_frequency(predicate, cutoff),
            )
            .await
    }

    pub async fn price_mileage_sample(
        &self,
        predicate: &Predicate,
    ) -> Result<Vec<PriceMileagePoint>, StoreError> {
        let limit = self.limits.price_mileage_sample;
        self.cache
            .get_or_load(
                CacheTier::Results,
                &CacheKey::price_mileage(predicate, limit),
                || self.store.price_mileage_sample(predicate, limit),
            )
            .await
    }

    /// All six charts of the dashboard page, evaluated one after another
    pub async fn dashboard(&self, predicate: &Predicate) -> Result<DashboardSummary, StoreError> {
        Ok(DashboardSummary {
            manufacturer_distribution: self.manufacturer_distribution(predicate).await?,
            avg_price_by_manufacturer: self.avg_price_by_manufacturer(predicate).await?,
            fuel_distribution: self.fuel_distribution(predicate).await?,
            accident_severity: self.accident_severity(predicate).await?,
            service_frequency: self.service_frequency(predicate).await?,
            price_mileage: self.price_mileage_sample(predicate).await?,
        })
    }

    pub async fn vehicle_list(&self, predicate: &Predicate) -> Result<Vec<VehicleListItem>, StoreError> {
        let limit = self.limits.vehicle_list;
        self.cache
            .get_or_load(
                CacheTier::Results,
                &CacheKey::vehicle_list(predicate, limit),
                || self.store.vehicle_list(predicate, limit),
            )
            .await
    }

    /// Full history of one vehicle; `Ok(None)` when the id is unknown
    pub async fn vehicle_detail(&self, id: &VehicleId) -> Result<Option<VehicleDetail>, StoreError> {
        self.cache
            .get_or_load(CacheTier::Results, &CacheKey::vehicle_detail(id), || async {
                let Some(vehicle) = self.store.find_vehicle(id).await? else {
                    tracing::debug!("Vehicle {} not found", id);
                    return Ok(None);
                };

                let dealer_name = self.dealer_name(&vehicle).await;
                Ok(Some(build_detail(vehicle, dealer_name)))
            })
            .await
    }

    /// Dealer display name; failures fall back to [`UNKNOWN_DEALER`]
    async fn dealer_name(&self, vehicle: &Vehicle) -> String {
        let Some(dealer_id) = vehicle.dealer_id else {
            return UNKNOWN_DEALER.to_string();
        };

        match self.store.find_dealer(dealer_id).await {
            Ok(Some(dealer)) => dealer.name,
            Ok(None) => {
                tracing::warn!("Dealer {} referenced by vehicle {} not found", dealer_id, vehicle.id);
                UNKNOWN_DEALER.to_string()
            }
            Err(e) => {
                tracing::warn!("Dealer lookup for {} failed, using placeholder: {}", dealer_id, e);
                UNKNOWN_DEALER.to_string()
            }
        }
    }
}

/// Detail record with service and accident history newest first
pub fn build_detail(vehicle: Vehicle, dealer_name: String) -> VehicleDetail {
    let mut services = vehicle.services;
    let mut accidents = vehicle.accidents;
    // undated entries sort last
    services.sort_by(|a, b| b.date.cmp(&a.date));
    accidents.sort_by(|a, b| b.date.cmp(&a.date));

    VehicleDetail {
        id: vehicle.id,
        manufacturer: vehicle.manufacturer,
        model: vehicle.model,
        price: vehicle.price,
        mileage: vehicle.mileage,
        fuel_type: vehicle.fuel_type,
        engine_size: vehicle.engine_size,
        year_of_manufacturing: vehicle.year_of_manufacturing,
        dealer_id: vehicle.dealer_id,
        dealer_name,
        features: vehicle.features,
        services,
        accidents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ServiceEvent;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn service_on(year: i32, month: u32, day: u32) -> ServiceEvent {
        ServiceEvent {
            date: Some(Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()),
            native_date: true,
            details: BTreeMap::new(),
        }
    }

    #[test]
    fn test_build_detail_sorts_newest_first() {
        let vehicle = Vehicle {
            id: VehicleId::Int(1),
            manufacturer: Some("Audi".to_string()),
            model: Some("A3".to_string()),
            price: Some(14000.0),
            mileage: Some(52000.0),
            fuel_type: Some("Diesel".to_string()),
            engine_size: Some(2.0),
            year_of_manufacturing: Some(2017),
            dealer_id: Some(5),
            features: vec![],
            services: vec![
                service_on(2019, 5, 1),
                ServiceEvent {
                    date: None,
                    native_date: false,
                    details: BTreeMap::new(),
                },
                service_on(2023, 1, 9),
                service_on(2021, 7, 30),
            ],
            accidents: vec![],
        };

        let detail = build_detail(vehicle, "Prime Autos".to_string());
        let years: Vec<Option<i32>> = detail
            .services
            .iter()
            .map(|s| s.date.map(|d| chrono::Datelike::year(&d)))
            .collect();

        assert_eq!(years, vec![Some(2023), Some(2021), Some(2019), None]);
        assert_eq!(detail.dealer_name, "Prime Autos");
    }

    #[test]
    fn test_default_limits() {
        let limits = QueryLimits::default();
        assert_eq!(limits.price_mileage_sample, 2000);
        assert_eq!(limits.vehicle_list, 500);
    }
}
