use crate::core::{FilterSelection, ManufacturerChoice};
use crate::models::{ClosedRange, FilterOptions};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Sidebar filters as query-string parameters
///
/// Any omitted range bound falls back to the bound computed over the full
/// collection, which is what the sidebar sliders default to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DashboardQuery {
    /// Blank or `All` selects every manufacturer
    #[validate(length(max = 200))]
    #[serde(default)]
    pub manufacturer: Option<String>,
    /// Comma-separated fuel types
    #[serde(default, alias = "fuelTypes")]
    pub fuel_types: Option<String>,
    #[validate(range(min = 0))]
    #[serde(default, alias = "dealerId")]
    pub dealer_id: Option<i64>,
    #[validate(range(min = 0.0), custom(function = "finite_amount"))]
    #[serde(default, alias = "minPrice")]
    pub min_price: Option<f64>,
    #[validate(range(min = 0.0), custom(function = "finite_amount"))]
    #[serde(default, alias = "maxPrice")]
    pub max_price: Option<f64>,
    #[validate(range(min = 1886, max = 2200))]
    #[serde(default, alias = "minYear")]
    pub min_year: Option<i32>,
    #[validate(range(min = 1886, max = 2200))]
    #[serde(default, alias = "maxYear")]
    pub max_year: Option<i32>,
}

/// `NaN` and infinities slip past a plain range check
fn finite_amount(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("non_finite"))
    }
}

impl DashboardQuery {
    pub fn to_selection(&self, options: &FilterOptions) -> FilterSelection {
        let price_bounds = options.price.unwrap_or(ClosedRange::new(0.0, f64::MAX));
        let year_bounds = options.year.unwrap_or(ClosedRange::new(i32::MIN, i32::MAX));

        FilterSelection {
            manufacturer: self
                .manufacturer
                .as_deref()
                .map(ManufacturerChoice::from_label)
                .unwrap_or_default(),
            fuel_types: self
                .fuel_types
                .as_deref()
                .unwrap_or("")
                .split(',')
                .map(str::trim)
                .filter(|fuel| !fuel.is_empty())
                .map(str::to_string)
                .collect(),
            dealer_id: self.dealer_id,
            price: ClosedRange::new(
                self.min_price.unwrap_or(price_bounds.min),
                self.max_price.unwrap_or(price_bounds.max),
            ),
            year: ClosedRange::new(
                self.min_year.unwrap_or(year_bounds.min),
                self.max_year.unwrap_or(year_bounds.max),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn create_test_options() -> FilterOptions {
        FilterOptions {
            manufacturers: vec!["Ford".to_string(), "Toyota".to_string()],
            fuel_types: vec!["Diesel".to_string(), "Petrol".to_string()],
            dealers: BTreeMap::new(),
            price: Some(ClosedRange::new(1200.0, 48000.0)),
            year: Some(ClosedRange::new(2001, 2023)),
        }
    }

    #[test]
    fn test_empty_query_uses_collection_bounds() {
        let selection = DashboardQuery::default().to_selection(&create_test_options());

        assert_eq!(selection.manufacturer, ManufacturerChoice::All);
        assert!(selection.fuel_types.is_empty());
        assert_eq!(selection.dealer_id, None);
        assert_eq!(selection.price, ClosedRange::new(1200.0, 48000.0));
        assert_eq!(selection.year, ClosedRange::new(2001, 2023));
    }

    #[test]
    fn test_fuel_types_are_split_and_trimmed() {
        let query = DashboardQuery {
            manufacturer: Some("All".to_string()),
            fuel_types: Some("Petrol, Diesel,,".to_string()),
            min_price: Some(5000.0),
            ..Default::default()
        };
        let selection = query.to_selection(&create_test_options());

        assert_eq!(selection.manufacturer, ManufacturerChoice::All);
        assert_eq!(selection.fuel_types.len(), 2);
        assert!(selection.fuel_types.contains("Diesel"));
        assert_eq!(selection.price, ClosedRange::new(5000.0, 48000.0));
    }

    #[test]
    fn test_validation_rejects_bad_year() {
        let query = DashboardQuery {
            min_year: Some(42),
            ..Default::default()
        };
        assert!(query.validate().is_err());
        assert!(DashboardQuery::default().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_non_finite_prices() {
        for bad in [f64::NAN, f64::INFINITY] {
            let query = DashboardQuery {
                max_price: Some(bad),
                ..Default::default()
            };
            assert!(query.validate().is_err());

            let query = DashboardQuery {
                min_price: Some(bad),
                ..Default::default()
            };
            assert!(query.validate().is_err());
        }

        let query = DashboardQuery {
            max_price: Some(25000.0),
            ..Default::default()
        };
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_blank_manufacturer_selects_all() {
        let query = DashboardQuery {
            manufacturer: Some(String::new()),
            ..Default::default()
        };
        assert!(query.validate().is_ok());
        assert_eq!(
            query.to_selection(&create_test_options()).manufacturer,
            ManufacturerChoice::All
        );
    }
}
