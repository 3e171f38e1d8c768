//! Conversion of raw store documents into domain records.
//!
//! Field values are read leniently: a field with an unexpected type is
//! treated as absent rather than failing the whole document.

use super::domain::{AccidentEvent, Dealer, ServiceEvent, Vehicle, VehicleId};
use bson::{Bson, Document};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

/// Store field names
pub mod fields {
    pub const ID: &str = "_id";
    pub const MANUFACTURER: &str = "manufacturer";
    pub const MODEL: &str = "model";
    pub const PRICE: &str = "price";
    pub const MILEAGE: &str = "mileage";
    pub const FUEL_TYPE: &str = "fuel_type";
    pub const ENGINE_SIZE: &str = "engine_size";
    pub const YEAR: &str = "year_of_manufacturing";
    pub const DEALER_ID: &str = "dealer_id";
    pub const FEATURES: &str = "features";
    pub const SERVICES: &str = "services";
    pub const ACCIDENTS: &str = "accidents";
    pub const SERVICE_DATE: &str = "Date_of_Service";
    pub const ACCIDENT_DATE: &str = "Date_of_Accident";
    pub const SEVERITY: &str = "Severity";
    pub const DEALER_KEY: &str = "DealerID";
    pub const DEALER_NAME: &str = "DealerName";
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document has no usable _id")]
    MissingId,
}

/// Numeric BSON value as f64; strings and other types are rejected
pub fn numeric(value: Option<&Bson>) -> Option<f64> {
    let number = match value? {
        Bson::Int32(v) => f64::from(*v),
        Bson::Int64(v) => *v as f64,
        Bson::Double(v) => *v,
        decimal @ Bson::Decimal128(_) => decimal
            .clone()
            .into_relaxed_extjson()
            .get("$numberDecimal")
            .and_then(|v| v.as_str())
            .and_then(|v| v.parse().ok())?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Like [`numeric`], but numeric strings are parsed as well
pub fn coerce_number(value: Option<&Bson>) -> Option<f64> {
    match value? {
        Bson::String(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|number| number.is_finite()),
        other => numeric(Some(other)),
    }
}

fn integer(value: Option<&Bson>) -> Option<i64> {
    match value? {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        Bson::Double(v) if v.fract() == 0.0 => Some(*v as i64),
        _ => None,
    }
}

pub fn text(value: Option<&Bson>) -> Option<String> {
    match value? {
        Bson::String(text) => Some(text.clone()),
        _ => None,
    }
}

fn datetime(value: Option<&Bson>) -> Option<DateTime<Utc>> {
    match value? {
        Bson::DateTime(dt) => Some(dt.to_chrono()),
        Bson::String(text) => parse_date_text(text),
        _ => None,
    }
}

fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn details(doc: &Document, skip: &[&str]) -> BTreeMap<String, serde_json::Value> {
    doc.iter()
        .filter(|(key, _)| !skip.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone().into_relaxed_extjson()))
        .collect()
}

fn embedded(doc: &Document, key: &str) -> Vec<Document> {
    match doc.get(key) {
        Some(Bson::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_document().cloned())
            .collect(),
        _ => Vec::new(),
    }
}

impl ServiceEvent {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            date: datetime(doc.get(fields::SERVICE_DATE)),
            native_date: matches!(doc.get(fields::SERVICE_DATE), Some(Bson::DateTime(_))),
            details: details(doc, &[fields::SERVICE_DATE]),
        }
    }
}

impl AccidentEvent {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            date: datetime(doc.get(fields::ACCIDENT_DATE)),
            severity: text(doc.get(fields::SEVERITY)),
            details: details(doc, &[fields::ACCIDENT_DATE, fields::SEVERITY]),
        }
    }
}

impl Vehicle {
    pub fn from_document(doc: &Document) -> Result<Self, DocumentError> {
        let id = doc
            .get(fields::ID)
            .and_then(VehicleId::from_bson)
            .ok_or(DocumentError::MissingId)?;

        let features = match doc.get(fields::FEATURES) {
            Some(Bson::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            id,
            manufacturer: text(doc.get(fields::MANUFACTURER)),
            model: text(doc.get(fields::MODEL)),
            price: numeric(doc.get(fields::PRICE)),
            mileage: coerce_number(doc.get(fields::MILEAGE)),
            fuel_type: text(doc.get(fields::FUEL_TYPE)),
            engine_size: numeric(doc.get(fields::ENGINE_SIZE)),
            year_of_manufacturing: integer(doc.get(fields::YEAR))
                .and_then(|year| i32::try_from(year).ok()),
            dealer_id: integer(doc.get(fields::DEALER_ID)),
            features,
            services: embedded(doc, fields::SERVICES)
                .iter()
                .map(ServiceEvent::from_document)
                .collect(),
            accidents: embedded(doc, fields::ACCIDENTS)
                .iter()
                .map(AccidentEvent::from_document)
                .collect(),
        })
    }
}

impl Dealer {
    /// `None` when the document has no integer `DealerID`
    pub fn from_document(doc: &Document) -> Option<Self> {
        let dealer_id = integer(doc.get(fields::DEALER_KEY))?;
        let name = match doc.get(fields::DEALER_NAME) {
            Some(Bson::String(name)) => name.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        Some(Self { dealer_id, name })
    }
}
