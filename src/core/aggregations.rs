//! In-process evaluation of the dashboard transforms.
//!
//! Same semantics and ordering as the store pipelines in
//! [`super::pipelines`], evaluated over a slice of decoded vehicles.

use super::filters::Predicate;
use crate::models::{
    FuelCount, ManufacturerAvgPrice, ManufacturerCount, PriceMileagePoint, ServiceYearCount,
    SeverityCount, Vehicle, VehicleListItem,
};
use chrono::{DateTime, Datelike, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Count occurrences per key; count descending, key ascending on ties
fn count_by<K: Ord>(keys: impl Iterator<Item = K>) -> Vec<(K, u64)> {
    let mut counts: BTreeMap<K, u64> = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut rows: Vec<(K, u64)> = counts.into_iter().collect();
    // stable sort keeps the BTreeMap key order for equal counts
    rows.sort_by(|a, b| b.1.cmp(&a.1));
    rows
}

pub fn manufacturer_distribution(vehicles: &[Vehicle], predicate: &Predicate) -> Vec<ManufacturerCount> {
    let keys = vehicles
        .iter()
        .filter(|v| predicate.matches(v))
        .map(|v| v.manufacturer.clone());

    count_by(keys)
        .into_iter()
        .map(|(manufacturer, count)| ManufacturerCount { manufacturer, count })
        .collect()
}

/// Arithmetic mean of price per manufacturer; manufacturers without a match are absent
pub fn avg_price_by_manufacturer(vehicles: &[Vehicle], predicate: &Predicate) -> Vec<ManufacturerAvgPrice> {
    let mut totals: BTreeMap<Option<String>, (f64, u64)> = BTreeMap::new();
    for vehicle in vehicles.iter().filter(|v| predicate.matches(v)) {
        if let Some(price) = vehicle.price {
            let entry = totals.entry(vehicle.manufacturer.clone()).or_insert((0.0, 0));
            entry.0 += price;
            entry.1 += 1;
        }
    }

    let mut rows: Vec<ManufacturerAvgPrice> = totals
        .into_iter()
        .map(|(manufacturer, (sum, n))| ManufacturerAvgPrice {
            manufacturer,
            avg_price: sum / n as f64,
        })
        .collect();

    rows.sort_by(|a, b| {
        b.avg_price
            .partial_cmp(&a.avg_price)
            .unwrap_or(Ordering::Equal)
    });
    rows
}

/// One entry per embedded accident (not per vehicle), grouped by severity
pub fn accident_severity(vehicles: &[Vehicle], predicate: &Predicate) -> Vec<SeverityCount> {
    let keys = vehicles
        .iter()
        .filter(|v| predicate.matches(v))
        .flat_map(|v| v.accidents.iter())
        .map(|accident| accident.severity.clone());

    count_by(keys)
        .into_iter()
        .map(|(severity, count)| SeverityCount { severity, count })
        .collect()
}

pub fn fuel_distribution(vehicles: &[Vehicle], predicate: &Predicate) -> Vec<FuelCount> {
    let keys = vehicles
        .iter()
        .filter(|v| predicate.matches(v))
        .map(|v| v.fuel_type.clone());

    count_by(keys)
        .into_iter()
        .map(|(fuel_type, count)| FuelCount { fuel_type, count })
        .collect()
}

/// Services with a native date at or after `cutoff`, counted per calendar year (UTC), ascending
pub fn service_frequency(
    vehicles: &[Vehicle],
    predicate: &Predicate,
    cutoff: DateTime<Utc>,
) -> Vec<ServiceYearCount> {
    let mut per_year: BTreeMap<i32, u64> = BTreeMap::new();
    let dates = vehicles
        .iter()
        .filter(|v| predicate.matches(v))
        .flat_map(|v| v.services.iter())
        .filter(|service| service.native_date)
        .filter_map(|service| service.date)
        .filter(|date| *date >= cutoff);

    for date in dates {
        *per_year.entry(date.year()).or_insert(0) += 1;
    }

    per_year
        .into_iter()
        .map(|(year, services_count)| ServiceYearCount { year, services_count })
        .collect()
}

/// First `limit` matching vehicles; rows without numeric price and mileage are
/// dropped after the limit is applied
pub fn price_mileage_sample(
    vehicles: &[Vehicle],
    predicate: &Predicate,
    limit: usize,
) -> Vec<PriceMileagePoint> {
    vehicles
        .iter()
        .filter(|v| predicate.matches(v))
        .take(limit)
        .filter_map(|v| {
            Some(PriceMileagePoint {
                price: v.price.filter(|p| p.is_finite())?,
                mileage: v.mileage.filter(|m| m.is_finite())?,
                manufacturer: v.manufacturer.clone(),
                model: v.model.clone(),
                fuel_type: v.fuel_type.clone(),
            })
        })
        .collect()
}

pub fn vehicle_list(vehicles: &[Vehicle], predicate: &Predicate, limit: usize) -> Vec<VehicleListItem> {
    vehicles
        .iter()
        .filter(|v| predicate.matches(v))
        .take(limit)
        .map(|v| VehicleListItem::new(v.id.clone(), v.manufacturer.clone(), v.model.clone(), v.price))
        .collect()
}
