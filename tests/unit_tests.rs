// Unit tests for Car Sales Analytics

use bson::{doc, Bson};
use car_sales_analytics::core::{
    aggregations, pipelines, service_cutoff, FilterSelection, ManufacturerChoice, Predicate,
};
use car_sales_analytics::models::document::coerce_number;
use car_sales_analytics::models::{
    AccidentEvent, ClosedRange, DashboardQuery, FilterOptions, ServiceEvent, Vehicle, VehicleId,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{BTreeMap, BTreeSet};

fn create_test_vehicle(manufacturer: &str, fuel: &str, price: f64, year: i32) -> Vehicle {
    Vehicle {
        id: VehicleId::Int(1),
        manufacturer: Some(manufacturer.to_string()),
        model: Some("Corolla".to_string()),
        price: Some(price),
        mileage: Some(42000.0),
        fuel_type: Some(fuel.to_string()),
        engine_size: Some(1.8),
        year_of_manufacturing: Some(year),
        dealer_id: Some(0),
        features: vec![],
        services: vec![],
        accidents: vec![],
    }
}

fn create_full_range() -> FilterSelection {
    FilterSelection::with_ranges(ClosedRange::new(0.0, 100_000.0), ClosedRange::new(1990, 2030))
}

fn serviced_on(date: DateTime<Utc>) -> ServiceEvent {
    ServiceEvent { date: Some(date), native_date: true, details: BTreeMap::new() }
}

#[test]
fn test_all_manufacturers_omits_constraint() {
    let predicate = create_full_range().compile();

    assert!(predicate.manufacturer.is_none());
    assert!(predicate.fuel_types.is_none());
    assert!(predicate.dealer_id.is_none());

    let filter = predicate.to_document();
    assert!(!filter.contains_key("manufacturer"));
    assert!(!filter.contains_key("fuel_type"));
    assert!(filter.contains_key("price"));
    assert!(filter.contains_key("year_of_manufacturing"));
}

#[test]
fn test_all_label_selects_everything() {
    assert_eq!(ManufacturerChoice::from_label("All"), ManufacturerChoice::All);
    assert_eq!(ManufacturerChoice::from_label("  "), ManufacturerChoice::All);
    assert_eq!(
        ManufacturerChoice::from_label("Toyota"),
        ManufacturerChoice::Only("Toyota".to_string())
    );
}

#[test]
fn test_dealer_zero_is_a_real_constraint() {
    let selection = FilterSelection { dealer_id: Some(0), ..create_full_range() };
    let predicate = selection.compile();

    assert_eq!(predicate.dealer_id, Some(0));
    assert_eq!(predicate.to_document().get_i64("dealer_id").unwrap(), 0);

    let mut elsewhere = create_test_vehicle("Toyota", "Petrol", 9000.0, 2018);
    assert!(predicate.matches(&elsewhere));
    elsewhere.dealer_id = Some(4);
    assert!(!predicate.matches(&elsewhere));
}

#[test]
fn test_ranges_are_inclusive() {
    let predicate = FilterSelection::with_ranges(ClosedRange::new(5000.0, 20000.0), ClosedRange::new(2015, 2023))
        .compile();

    assert!(predicate.matches(&create_test_vehicle("Ford", "Diesel", 5000.0, 2015)));
    assert!(predicate.matches(&create_test_vehicle("Ford", "Diesel", 20000.0, 2023)));
    assert!(!predicate.matches(&create_test_vehicle("Ford", "Diesel", 4999.99, 2015)));
    assert!(!predicate.matches(&create_test_vehicle("Ford", "Diesel", 6000.0, 2024)));
}

#[test]
fn test_inverted_range_matches_nothing() {
    let predicate = FilterSelection::with_ranges(ClosedRange::new(20000.0, 5000.0), ClosedRange::new(1990, 2030))
        .compile();

    assert!(!predicate.matches(&create_test_vehicle("Ford", "Diesel", 10000.0, 2020)));
    let vehicles = vec![create_test_vehicle("Ford", "Diesel", 10000.0, 2020)];
    assert!(aggregations::manufacturer_distribution(&vehicles, &predicate).is_empty());
}

#[test]
fn test_fuel_types_use_set_membership() {
    let selection = FilterSelection {
        fuel_types: BTreeSet::from(["Petrol".to_string(), "Diesel".to_string()]),
        ..create_full_range()
    };
    let predicate = selection.compile();

    assert!(predicate.matches(&create_test_vehicle("Kia", "Diesel", 7000.0, 2019)));
    assert!(!predicate.matches(&create_test_vehicle("Kia", "Electric", 7000.0, 2019)));

    let fuel_filter = predicate.to_document().get_document("fuel_type").unwrap().clone();
    assert_eq!(
        fuel_filter.get_array("$in").unwrap(),
        &vec![Bson::String("Diesel".to_string()), Bson::String("Petrol".to_string())]
    );
}

#[test]
fn test_cache_key_independent_of_selection_order() {
    let a = FilterSelection {
        fuel_types: ["Petrol", "Diesel", "Hybrid"].iter().map(|s| s.to_string()).collect(),
        ..create_full_range()
    };
    let b = FilterSelection {
        fuel_types: ["Hybrid", "Petrol", "Diesel"].iter().map(|s| s.to_string()).collect(),
        ..create_full_range()
    };

    assert_eq!(a.compile().cache_key(), b.compile().cache_key());
    assert_ne!(
        a.compile().cache_key(),
        FilterSelection { dealer_id: Some(2), ..a }.compile().cache_key()
    );
}

#[test]
fn test_cache_key_round_trips_predicate() {
    let predicate = FilterSelection {
        manufacturer: ManufacturerChoice::Only("BMW".to_string()),
        ..create_full_range()
    }
    .compile();

    let restored: Predicate = serde_json::from_str(&predicate.cache_key()).unwrap();
    assert_eq!(restored, predicate);
}

#[test]
fn test_query_fills_missing_bounds_from_options() {
    let options = FilterOptions {
        manufacturers: vec!["Ford".to_string()],
        fuel_types: vec!["Petrol".to_string()],
        dealers: BTreeMap::new(),
        price: Some(ClosedRange::new(900.0, 61000.0)),
        year: Some(ClosedRange::new(1998, 2024)),
    };
    let query = DashboardQuery {
        manufacturer: Some("All".to_string()),
        fuel_types: Some("Petrol, Hybrid,".to_string()),
        min_price: Some(5000.0),
        ..Default::default()
    };

    let predicate = query.to_selection(&options).compile();
    assert!(predicate.manufacturer.is_none());
    assert_eq!(predicate.price, ClosedRange::new(5000.0, 61000.0));
    assert_eq!(predicate.year, ClosedRange::new(1998, 2024));
    assert_eq!(predicate.fuel_types.unwrap().len(), 2);
}

#[test]
fn test_service_window_boundary_is_inclusive() {
    let now = Utc.with_ymd_and_hms(2026, 10, 17, 18, 5, 0).unwrap();
    let cutoff = service_cutoff(now);
    assert_eq!(cutoff, Utc.with_ymd_and_hms(2021, 10, 17, 0, 0, 0).unwrap());

    let mut vehicle = create_test_vehicle("Toyota", "Petrol", 9000.0, 2016);
    vehicle.services = vec![
        serviced_on(cutoff),
        serviced_on(cutoff - Duration::days(1)),
        serviced_on(cutoff - Duration::seconds(1)),
        ServiceEvent { date: None, native_date: false, details: BTreeMap::new() },
    ];

    let rows = aggregations::service_frequency(&[vehicle], &create_full_range().compile(), cutoff);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].year, 2021);
    assert_eq!(rows[0].services_count, 1);
}

#[test]
fn test_service_years_ascending() {
    let mut vehicle = create_test_vehicle("Toyota", "Petrol", 9000.0, 2016);
    vehicle.services = vec![
        serviced_on(Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap()),
        serviced_on(Utc.with_ymd_and_hms(2022, 7, 7, 0, 0, 0).unwrap()),
        serviced_on(Utc.with_ymd_and_hms(2025, 11, 30, 0, 0, 0).unwrap()),
    ];
    let cutoff = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();

    let rows = aggregations::service_frequency(&[vehicle], &create_full_range().compile(), cutoff);
    let years: Vec<(i32, u64)> = rows.iter().map(|r| (r.year, r.services_count)).collect();
    assert_eq!(years, vec![(2022, 1), (2025, 2)]);
}

#[test]
fn test_accidents_counted_per_event() {
    let mut vehicle = create_test_vehicle("Audi", "Diesel", 14000.0, 2019);
    vehicle.accidents = vec![
        AccidentEvent { date: None, severity: Some("Minor".to_string()), details: BTreeMap::new() },
        AccidentEvent { date: None, severity: Some("Minor".to_string()), details: BTreeMap::new() },
        AccidentEvent { date: None, severity: None, details: BTreeMap::new() },
    ];

    let rows = aggregations::accident_severity(&[vehicle], &create_full_range().compile());
    let total: u64 = rows.iter().map(|r| r.count).sum();
    assert_eq!(total, 3);
    assert_eq!(rows[0].severity.as_deref(), Some("Minor"));
    assert_eq!(rows[0].count, 2);
}

#[test]
fn test_equal_counts_ordered_by_name() {
    let vehicles = vec![
        create_test_vehicle("Skoda", "Petrol", 7000.0, 2018),
        create_test_vehicle("Audi", "Petrol", 9000.0, 2018),
        create_test_vehicle("Mazda", "Petrol", 8000.0, 2018),
    ];

    let rows = aggregations::manufacturer_distribution(&vehicles, &create_full_range().compile());
    let names: Vec<&str> = rows.iter().filter_map(|r| r.manufacturer.as_deref()).collect();
    assert_eq!(names, vec!["Audi", "Mazda", "Skoda"]);
}

#[test]
fn test_price_mileage_limit_applies_before_dropping_rows() {
    let mut vehicles: Vec<Vehicle> = (0..5)
        .map(|i| create_test_vehicle("Ford", "Petrol", 5000.0 + i as f64, 2018))
        .collect();
    vehicles[0].mileage = None;

    let sample = aggregations::price_mileage_sample(&vehicles, &create_full_range().compile(), 3);
    assert_eq!(sample.len(), 2);
    assert!(sample.iter().all(|p| p.mileage.is_finite()));
}

#[test]
fn test_numeric_coercion() {
    assert_eq!(coerce_number(Some(&Bson::Int32(12000))), Some(12000.0));
    assert_eq!(coerce_number(Some(&Bson::String(" 8500.5 ".to_string()))), Some(8500.5));
    assert_eq!(coerce_number(Some(&Bson::String("n/a".to_string()))), None);
    assert_eq!(coerce_number(Some(&Bson::Null)), None);
    assert_eq!(coerce_number(None), None);
}

#[test]
fn test_vehicle_decodes_mixed_documents() {
    let doc = doc! {
        "_id": "A-17",
        "manufacturer": "Volvo",
        "price": "not a price",
        "year_of_manufacturing": 2017.0,
        "services": [ { "Date_of_Service": "2023-05-01", "Workshop": "North" } ],
    };

    let vehicle = Vehicle::from_document(&doc).unwrap();
    assert_eq!(vehicle.id, VehicleId::Text("A-17".to_string()));
    assert_eq!(vehicle.price, None);
    assert_eq!(vehicle.year_of_manufacturing, Some(2017));
    assert_eq!(vehicle.services.len(), 1);
    assert!(vehicle.services[0].date.is_some());
    assert!(vehicle.accidents.is_empty());

    assert!(Vehicle::from_document(&doc! { "manufacturer": "Volvo" }).is_err());
}

#[test]
fn test_pipelines_sort_and_project() {
    let predicate = create_full_range().compile();

    let fuel = pipelines::fuel_distribution(&predicate);
    assert_eq!(
        fuel.last().unwrap().get_document("$sort").unwrap(),
        &doc! { "count": -1, "fuel_type": 1 }
    );

    let accidents = pipelines::accident_severity(&predicate);
    assert_eq!(accidents[1].get_str("$unwind").unwrap(), "$accidents");

    let cutoff = Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap();
    let services = pipelines::service_frequency(&predicate, cutoff);
    let window = services[2].get_document("$match").unwrap();
    assert_eq!(
        window.get_document("services.Date_of_Service").unwrap().get_datetime("$gte").unwrap(),
        &bson::DateTime::from_chrono(cutoff)
    );
    assert_eq!(services.last().unwrap().get_document("$sort").unwrap(), &doc! { "year": 1 });
}
