use crate::core::{aggregations, Predicate};
use crate::models::{
    ClosedRange, Dealer, FilterOptions, FuelCount, ManufacturerAvgPrice, ManufacturerCount,
    PriceMileagePoint, ServiceYearCount, SeverityCount, Vehicle, VehicleId, VehicleListItem,
};
use crate::services::store::{StoreError, VehicleStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Vehicle store held entirely in memory
///
/// Evaluates the transforms in-process with the same semantics and ordering
/// as [`super::MongoStore`]. Used for tests, benchmarks and demo data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    vehicles: Vec<Vehicle>,
    dealers: Vec<Dealer>,
}

impl MemoryStore {
    pub fn new(vehicles: Vec<Vehicle>, dealers: Vec<Dealer>) -> Self {
        Self { vehicles, dealers }
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }
}

fn distinct_non_empty<'a>(values: impl Iterator<Item = Option<&'a String>>) -> Vec<String> {
    values
        .flatten()
        .filter(|value| !value.is_empty())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn bounds<T: PartialOrd + Copy>(values: impl Iterator<Item = T>) -> Option<ClosedRange<T>> {
    values.fold(None, |range: Option<ClosedRange<T>>, value| match range {
        None => Some(ClosedRange::new(value, value)),
        Some(r) => Some(ClosedRange::new(
            if value < r.min { value } else { r.min },
            if value > r.max { value } else { r.max },
        )),
    })
}

#[async_trait]
impl VehicleStore for MemoryStore {
    async fn manufacturer_distribution(
        &self,
        predicate: &Predicate,
    ) -> Result<Vec<ManufacturerCount>, StoreError> {
        Ok(aggregations::manufacturer_distribution(&self.vehicles, predicate))
    }

    async fn avg_price_by_manufacturer(
        &self,
        predicate: &Predicate,
    ) -> Result<Vec<ManufacturerAvgPrice>, StoreError> {
        Ok(aggregations::avg_price_by_manufacturer(&self.vehicles, predicate))
    }

    async fn accident_severity(&self, predicate: &Predicate) -> Result<Vec<SeverityCount>, StoreError> {
        Ok(aggregations::accident_severity(&self.vehicles, predicate))
    }

    async fn fuel_distribution(&self, predicate: &Predicate) -> Result<Vec<FuelCount>, StoreError> {
        Ok(aggregations::fuel_distribution(&self.vehicles, predicate))
    }

    async fn service_frequency(
        &self,
        predicate: &Predicate,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ServiceYearCount>, StoreError> {
        Ok(aggregations::service_frequency(&self.vehicles, predicate, cutoff))
    }

    async fn price_mileage_sample(
        &self,
        predicate: &Predicate,
        limit: usize,
    ) -> Result<Vec<PriceMileagePoint>, StoreError> {
        Ok(aggregations::price_mileage_sample(&self.vehicles, predicate, limit))
    }

    async fn vehicle_list(
        &self,
        predicate: &Predicate,
        limit: usize,
    ) -> Result<Vec<VehicleListItem>, StoreError> {
        Ok(aggregations::vehicle_list(&self.vehicles, predicate, limit))
    }

    async fn find_vehicle(&self, id: &VehicleId) -> Result<Option<Vehicle>, StoreError> {
        Ok(self.vehicles.iter().find(|v| &v.id == id).cloned())
    }

    async fn find_dealer(&self, dealer_id: i64) -> Result<Option<Dealer>, StoreError> {
        Ok(self.dealers.iter().find(|d| d.dealer_id == dealer_id).cloned())
    }

    async fn filter_options(&self) -> Result<FilterOptions, StoreError> {
        Ok(FilterOptions {
            manufacturers: distinct_non_empty(self.vehicles.iter().map(|v| v.manufacturer.as_ref())),
            fuel_types: distinct_non_empty(self.vehicles.iter().map(|v| v.fuel_type.as_ref())),
            dealers: self
                .dealers
                .iter()
                .map(|d| (d.dealer_id, d.name.clone()))
                .collect(),
            price: bounds(self.vehicles.iter().filter_map(|v| v.price)),
            year: bounds(self.vehicles.iter().filter_map(|v| v.year_of_manufacturing)),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_vehicle(id: i64, manufacturer: &str, fuel: &str, price: f64, year: i32) -> Vehicle {
        Vehicle {
            id: VehicleId::Int(id),
            manufacturer: Some(manufacturer.to_string()),
            model: Some("Model".to_string()),
            price: Some(price),
            mileage: Some(10000.0),
            fuel_type: Some(fuel.to_string()),
            engine_size: None,
            year_of_manufacturing: Some(year),
            dealer_id: None,
            features: vec![],
            services: vec![],
            accidents: vec![],
        }
    }

    #[tokio::test]
    async fn test_filter_options() {
        let store = MemoryStore::new(
            vec![
                create_test_vehicle(1, "VW", "Diesel", 9000.0, 2012),
                create_test_vehicle(2, "BMW", "Petrol", 31000.0, 2020),
                create_test_vehicle(3, "", "Petrol", 4500.0, 2008),
            ],
            vec![Dealer {
                dealer_id: 1,
                name: "North Cars".to_string(),
            }],
        );

        let options = store.filter_options().await.unwrap();
        assert_eq!(options.manufacturers, vec!["BMW", "VW"]);
        assert_eq!(options.fuel_types, vec!["Diesel", "Petrol"]);
        assert_eq!(options.dealers.get(&1).map(String::as_str), Some("North Cars"));
        assert_eq!(options.price, Some(ClosedRange::new(4500.0, 31000.0)));
        assert_eq!(options.year, Some(ClosedRange::new(2008, 2020)));
    }

    #[tokio::test]
    async fn test_empty_store_has_no_bounds() {
        let options = MemoryStore::default().filter_options().await.unwrap();
        assert!(options.manufacturers.is_empty());
        assert_eq!(options.price, None);
        assert_eq!(options.year, None);
    }

    #[tokio::test]
    async fn test_find_vehicle() {
        let store = MemoryStore::new(vec![create_test_vehicle(7, "Kia", "Petrol", 7000.0, 2016)], vec![]);

        assert!(store.find_vehicle(&VehicleId::Int(7)).await.unwrap().is_some());
        assert!(store.find_vehicle(&VehicleId::Int(8)).await.unwrap().is_none());
    }
}
