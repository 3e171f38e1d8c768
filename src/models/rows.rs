use super::domain::{AccidentEvent, ServiceEvent, VehicleId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Vehicles per manufacturer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufacturerCount {
    pub manufacturer: Option<String>,
    pub count: u64,
}

/// Mean price per manufacturer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufacturerAvgPrice {
    pub manufacturer: Option<String>,
    pub avg_price: f64,
}

/// Accidents per severity label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityCount {
    pub severity: Option<String>,
    pub count: u64,
}

/// Vehicles per fuel type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelCount {
    pub fuel_type: Option<String>,
    pub count: u64,
}

/// Service visits per calendar year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceYearCount {
    pub year: i32,
    pub services_count: u64,
}

/// One point of the price-vs-mileage scatter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceMileagePoint {
    pub price: f64,
    pub mileage: f64,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub fuel_type: Option<String>,
}

/// Entry of the vehicle picker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleListItem {
    pub id: VehicleId,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub price: Option<f64>,
    pub label: String,
}

impl VehicleListItem {
    pub fn new(
        id: VehicleId,
        manufacturer: Option<String>,
        model: Option<String>,
        price: Option<f64>,
    ) -> Self {
        let label = format!(
            "{} {} | £{}",
            manufacturer.as_deref().unwrap_or(""),
            model.as_deref().unwrap_or(""),
            price.map(format_price).unwrap_or_default(),
        );
        Self {
            id,
            manufacturer,
            model,
            price,
            label,
        }
    }
}

fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{}", price as i64)
    } else {
        format!("{:.2}", price)
    }
}

/// Full history of a single vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleDetail {
    pub id: VehicleId,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub price: Option<f64>,
    pub mileage: Option<f64>,
    pub fuel_type: Option<String>,
    pub engine_size: Option<f64>,
    pub year_of_manufacturing: Option<i32>,
    pub dealer_id: Option<i64>,
    pub dealer_name: String,
    pub features: Vec<String>,
    /// Newest first
    pub services: Vec<ServiceEvent>,
    /// Newest first
    pub accidents: Vec<AccidentEvent>,
}

/// All six chart summaries for one predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub manufacturer_distribution: Vec<ManufacturerCount>,
    pub avg_price_by_manufacturer: Vec<ManufacturerAvgPrice>,
    pub fuel_distribution: Vec<FuelCount>,
    pub accident_severity: Vec<SeverityCount>,
    pub service_frequency: Vec<ServiceYearCount>,
    pub price_mileage: Vec<PriceMileagePoint>,
}

impl DashboardSummary {
    /// Which charts have rows to render
    pub fn availability(&self) -> BTreeMap<&'static str, bool> {
        BTreeMap::from([
            ("manufacturers", !self.manufacturer_distribution.is_empty()),
            ("avg_price", !self.avg_price_by_manufacturer.is_empty()),
            ("fuel", !self.fuel_distribution.is_empty()),
            ("accidents", !self.accident_severity.is_empty()),
            ("services", !self.service_frequency.is_empty()),
            ("price_mileage", !self.price_mileage.is_empty()),
        ])
    }
}
