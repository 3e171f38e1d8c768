use crate::models::document::fields;
use crate::models::{ClosedRange, Vehicle};
use bson::{doc, Document};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Manufacturer dimension of the sidebar: everything, or one name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManufacturerChoice {
    #[default]
    All,
    Only(String),
}

impl ManufacturerChoice {
    /// `"All"` (any case) or a blank label selects every manufacturer
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() || label.eq_ignore_ascii_case("all") {
            ManufacturerChoice::All
        } else {
            ManufacturerChoice::Only(label.to_string())
        }
    }
}

/// Raw user selection before compilation
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSelection {
    pub manufacturer: ManufacturerChoice,
    pub fuel_types: BTreeSet<String>,
    pub dealer_id: Option<i64>,
    pub price: ClosedRange<f64>,
    pub year: ClosedRange<i32>,
}

impl FilterSelection {
    /// Selection with only the always-present range constraints
    pub fn with_ranges(price: ClosedRange<f64>, year: ClosedRange<i32>) -> Self {
        Self {
            manufacturer: ManufacturerChoice::All,
            fuel_types: BTreeSet::new(),
            dealer_id: None,
            price,
            year,
        }
    }

    /// Compile into a predicate. Unset dimensions are omitted, the two ranges
    /// are always present. Nothing is validated: an inverted range simply
    /// matches no vehicle.
    pub fn compile(&self) -> Predicate {
        Predicate {
            manufacturer: match &self.manufacturer {
                ManufacturerChoice::All => None,
                ManufacturerChoice::Only(name) => Some(name.clone()),
            },
            fuel_types: (!self.fuel_types.is_empty()).then(|| self.fuel_types.clone()),
            dealer_id: self.dealer_id,
            price: self.price,
            year: self.year,
        }
    }
}

/// Conjunction of constraints applied to the vehicles collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub manufacturer: Option<String>,
    pub fuel_types: Option<BTreeSet<String>>,
    pub dealer_id: Option<i64>,
    pub price: ClosedRange<f64>,
    pub year: ClosedRange<i32>,
}

impl Predicate {
    /// Evaluate the predicate against one vehicle
    ///
    /// Mirrors the server-side match: a vehicle without a numeric price or
    /// year never satisfies the ranges.
    #[inline]
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        if let Some(manufacturer) = &self.manufacturer {
            if vehicle.manufacturer.as_ref() != Some(manufacturer) {
                return false;
            }
        }

        if let Some(fuel_types) = &self.fuel_types {
            match &vehicle.fuel_type {
                Some(fuel) if fuel_types.contains(fuel) => {}
                _ => return false,
            }
        }

        if let Some(dealer_id) = self.dealer_id {
            if vehicle.dealer_id != Some(dealer_id) {
                return false;
            }
        }

        match vehicle.price {
            Some(price) if self.price.contains(price) => {}
            _ => return false,
        }

        matches!(vehicle.year_of_manufacturing, Some(year) if self.year.contains(year))
    }

    /// `$match` filter document for the store
    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();

        if let Some(manufacturer) = &self.manufacturer {
            filter.insert(fields::MANUFACTURER, manufacturer.as_str());
        }
        if let Some(fuel_types) = &self.fuel_types {
            let fuel_types: Vec<&str> = fuel_types.iter().map(String::as_str).collect();
            filter.insert(fields::FUEL_TYPE, doc! { "$in": fuel_types });
        }
        if let Some(dealer_id) = self.dealer_id {
            filter.insert(fields::DEALER_ID, dealer_id);
        }

        filter.insert(
            fields::PRICE,
            doc! { "$gte": self.price.min, "$lte": self.price.max },
        );
        filter.insert(
            fields::YEAR,
            doc! { "$gte": self.year.min, "$lte": self.year.max },
        );

        filter
    }

    /// Stable serialized form, used as the cache key
    pub fn cache_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}
