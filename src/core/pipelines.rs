//! Aggregation pipelines executed by the document store.
//!
//! Every pipeline starts with the compiled predicate as `$match`, then
//! groups, projects to the row shape, and sorts. Ties are broken by the
//! group key so results are deterministic.

use super::filters::Predicate;
use crate::models::document::fields;
use bson::{doc, Document};
use chrono::{DateTime, Utc};

fn match_stage(predicate: &Predicate) -> Document {
    doc! { "$match": predicate.to_document() }
}

/// Group on `key_path`, count, project as `{ label: .., count: .. }`, sort by count descending
fn count_by(predicate: &Predicate, unwind: Option<&str>, key_path: &str, label: &str) -> Vec<Document> {
    let mut pipeline = vec![match_stage(predicate)];
    if let Some(path) = unwind {
        pipeline.push(doc! { "$unwind": format!("${}", path) });
    }
    pipeline.extend([
        doc! { "$group": { "_id": format!("${}", key_path), "count": { "$sum": 1 } } },
        doc! { "$project": { "_id": 0, label: "$_id", "count": 1 } },
        doc! { "$sort": { "count": -1, label: 1 } },
    ]);
    pipeline
}

pub fn manufacturer_distribution(predicate: &Predicate) -> Vec<Document> {
    count_by(predicate, None, fields::MANUFACTURER, "manufacturer")
}

pub fn avg_price_by_manufacturer(predicate: &Predicate) -> Vec<Document> {
    vec![
        match_stage(predicate),
        doc! {
            "$group": {
                "_id": format!("${}", fields::MANUFACTURER),
                "avg_price": { "$avg": format!("${}", fields::PRICE) },
            }
        },
        doc! { "$match": { "avg_price": { "$ne": null } } },
        // Decimal128 prices average to Decimal128
        doc! {
            "$project": {
                "_id": 0,
                "manufacturer": "$_id",
                "avg_price": { "$toDouble": "$avg_price" },
            }
        },
        doc! { "$sort": { "avg_price": -1, "manufacturer": 1 } },
    ]
}

/// One row per embedded accident, grouped by severity
pub fn accident_severity(predicate: &Predicate) -> Vec<Document> {
    let severity = format!("{}.{}", fields::ACCIDENTS, fields::SEVERITY);
    count_by(predicate, Some(fields::ACCIDENTS), &severity, "severity")
}

pub fn fuel_distribution(predicate: &Predicate) -> Vec<Document> {
    count_by(predicate, None, fields::FUEL_TYPE, "fuel_type")
}

/// Services dated on or after `cutoff`, counted per calendar year, oldest year first
pub fn service_frequency(predicate: &Predicate, cutoff: DateTime<Utc>) -> Vec<Document> {
    let date_path = format!("{}.{}", fields::SERVICES, fields::SERVICE_DATE);
    vec![
        match_stage(predicate),
        doc! { "$unwind": format!("${}", fields::SERVICES) },
        doc! { "$match": { &date_path: { "$gte": bson::DateTime::from_chrono(cutoff) } } },
        doc! {
            "$group": {
                "_id": { "year": { "$year": format!("${}", date_path) } },
                "services_count": { "$sum": 1 },
            }
        },
        doc! { "$project": { "_id": 0, "year": "$_id.year", "services_count": 1 } },
        doc! { "$sort": { "year": 1 } },
    ]
}

/// Fields read for the price-vs-mileage scatter
pub fn price_mileage_projection() -> Document {
    doc! {
        fields::PRICE: 1,
        fields::MILEAGE: 1,
        fields::MANUFACTURER: 1,
        fields::MODEL: 1,
        fields::FUEL_TYPE: 1,
    }
}

/// Fields read for the vehicle picker
pub fn vehicle_list_projection() -> Document {
    doc! {
        fields::ID: 1,
        fields::MANUFACTURER: 1,
        fields::MODEL: 1,
        fields::PRICE: 1,
    }
}
