use bson::oid::ObjectId;
use bson::Bson;
use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Identity of a vehicle document (`_id` in the store)
///
/// Documents imported from CSV carry integer ids, documents created through
/// the driver carry ObjectIds. Anything else is kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VehicleId {
    Int(i64),
    ObjectId(ObjectId),
    Text(String),
}

impl VehicleId {
    /// BSON value used to match `_id` in the store
    pub fn to_bson(&self) -> Bson {
        match self {
            VehicleId::Int(id) => Bson::Int64(*id),
            VehicleId::ObjectId(oid) => Bson::ObjectId(*oid),
            VehicleId::Text(text) => Bson::String(text.clone()),
        }
    }

    /// Convert a raw `_id` value, returning `None` for types that cannot identify a vehicle
    pub fn from_bson(value: &Bson) -> Option<Self> {
        match value {
            Bson::Int32(id) => Some(VehicleId::Int(i64::from(*id))),
            Bson::Int64(id) => Some(VehicleId::Int(*id)),
            Bson::Double(id) if id.fract() == 0.0 => Some(VehicleId::Int(*id as i64)),
            Bson::ObjectId(oid) => Some(VehicleId::ObjectId(*oid)),
            Bson::String(text) => Some(VehicleId::Text(text.clone())),
            _ => None,
        }
    }
}

impl FromStr for VehicleId {
    type Err = Infallible;

    /// Integer first, then a 24-hex ObjectId, otherwise the raw text
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(id) = trimmed.parse::<i64>() {
            return Ok(VehicleId::Int(id));
        }
        if let Ok(oid) = ObjectId::parse_str(trimmed) {
            return Ok(VehicleId::ObjectId(oid));
        }
        Ok(VehicleId::Text(trimmed.to_string()))
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleId::Int(id) => write!(f, "{}", id),
            VehicleId::ObjectId(oid) => write!(f, "{}", oid.to_hex()),
            VehicleId::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for VehicleId {
    fn from(value: i64) -> Self {
        VehicleId::Int(value)
    }
}

impl Serialize for VehicleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            VehicleId::Int(id) => serializer.serialize_i64(*id),
            VehicleId::ObjectId(oid) => serializer.serialize_str(&oid.to_hex()),
            VehicleId::Text(text) => serializer.serialize_str(text),
        }
    }
}

impl<'de> Deserialize<'de> for VehicleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct VehicleIdVisitor;

        impl<'de> de::Visitor<'de> for VehicleIdVisitor {
            type Value = VehicleId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an integer or string vehicle id")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(VehicleId::Int(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                i64::try_from(v)
                    .map(VehicleId::Int)
                    .map_err(|_| E::custom("vehicle id out of range"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(v.parse().unwrap_or_else(|never: Infallible| match never {}))
            }
        }

        deserializer.deserialize_any(VehicleIdVisitor)
    }
}

/// A vehicle sales record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub mileage: Option<f64>,
    #[serde(default)]
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub engine_size: Option<f64>,
    #[serde(default)]
    pub year_of_manufacturing: Option<i32>,
    #[serde(default)]
    pub dealer_id: Option<i64>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub services: Vec<ServiceEvent>,
    #[serde(default)]
    pub accidents: Vec<AccidentEvent>,
}

/// Service visit embedded in a vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEvent {
    pub date: Option<DateTime<Utc>>,
    /// False when `date` was parsed from text; only native dates fall in the service window
    #[serde(skip)]
    pub native_date: bool,
    /// Remaining descriptive fields, as stored
    #[serde(default)]
    pub details: BTreeMap<String, serde_json::Value>,
}

/// Accident embedded in a vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccidentEvent {
    pub date: Option<DateTime<Utc>>,
    pub severity: Option<String>,
    #[serde(default)]
    pub details: BTreeMap<String, serde_json::Value>,
}

/// Dealer looked up by `DealerID`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dealer {
    pub dealer_id: i64,
    pub name: String,
}

/// Closed interval `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosedRange<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> ClosedRange<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Choices and bounds offered to the filter sidebar, computed over the full collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub manufacturers: Vec<String>,
    pub fuel_types: Vec<String>,
    pub dealers: BTreeMap<i64, String>,
    pub price: Option<ClosedRange<f64>>,
    pub year: Option<ClosedRange<i32>>,
}
