use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::core::Predicate;
use crate::models::rows::{DashboardSummary, VehicleListItem};

/// Rows for a single chart
///
/// `has_data` is false for an empty result; the front-end shows a
/// placeholder instead of an empty chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartResponse<T> {
    pub chart: String,
    pub has_data: bool,
    pub rows: Vec<T>,
}

impl<T> ChartResponse<T> {
    pub fn new(chart: &str, rows: Vec<T>) -> Self {
        Self {
            chart: chart.to_string(),
            has_data: !rows.is_empty(),
            rows,
        }
    }
}

/// Every chart of the dashboard page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub predicate: Predicate,
    pub has_data: BTreeMap<String, bool>,
    #[serde(flatten)]
    pub summary: DashboardSummary,
}

impl DashboardResponse {
    pub fn new(predicate: Predicate, summary: DashboardSummary) -> Self {
        let has_data = summary
            .availability()
            .into_iter()
            .map(|(chart, available)| (chart.to_string(), available))
            .collect();
        Self {
            predicate,
            has_data,
            summary,
        }
    }
}

/// Vehicle picker entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleListResponse {
    pub vehicles: Vec<VehicleListItem>,
    pub count: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
