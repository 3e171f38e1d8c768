use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use validator::Validate;
use crate::core::Predicate;
use crate::models::{
    ChartResponse, DashboardQuery, DashboardResponse, ErrorResponse, HealthResponse, VehicleId,
    VehicleListResponse,
};
use crate::services::{AnalyticsService, StoreError};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub analytics: Arc<AnalyticsService>,
}

/// Configure all dashboard routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/filters", web::get().to(filter_options))
        .route("/dashboard", web::get().to(dashboard))
        .route("/charts/manufacturers", web::get().to(manufacturer_distribution))
        .route("/charts/avg-price", web::get().to(avg_price_by_manufacturer))
        .route("/charts/accidents", web::get().to(accident_severity))
        .route("/charts/fuel", web::get().to(fuel_distribution))
        .route("/charts/services", web::get().to(service_frequency))
        .route("/charts/price-mileage", web::get().to(price_mileage))
        .route("/vehicles", web::get().to(vehicle_list))
        .route("/vehicles/{id}", web::get().to(vehicle_detail));
}

fn store_failure(context: &str, e: StoreError) -> HttpResponse {
    tracing::error!("{}: {}", context, e);
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: context.to_string(),
        message: e.to_string(),
        status_code: 500,
    })
}

/// Validate query-string filters and compile them into a predicate
async fn compile(state: &AppState, query: &DashboardQuery) -> Result<Predicate, HttpResponse> {
    if let Err(errors) = query.validate() {
        tracing::info!("Validation failed for dashboard filters: {:?}", errors);
        return Err(HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        }));
    }

    state
        .analytics
        .compile_query(query)
        .await
        .map_err(|e| store_failure("Failed to load filter options", e))
}

fn chart<T: Serialize>(name: &str, result: Result<Vec<T>, StoreError>) -> HttpResponse {
    match result {
        Ok(rows) => {
            tracing::debug!("Chart {} has {} rows", name, rows.len());
            HttpResponse::Ok().json(ChartResponse::new(name, rows))
        }
        Err(e) => store_failure(&format!("Failed to compute {}", name), e),
    }
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let status = match state.analytics.ping().await {
        Ok(()) => "healthy",
        Err(e) => {
            tracing::warn!("Store ping failed: {}", e);
            "degraded"
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Sidebar choices and slider bounds
///
/// GET /api/v1/filters
async fn filter_options(state: web::Data<AppState>) -> impl Responder {
    match state.analytics.filter_options().await {
        Ok(options) => HttpResponse::Ok().json(options),
        Err(e) => store_failure("Failed to load filter options", e),
    }
}

/// Every chart for the current filters
///
/// GET /api/v1/dashboard?manufacturer=Toyota&fuel_types=Petrol,Diesel&min_price=5000&max_price=20000
async fn dashboard(state: web::Data<AppState>, query: web::Query<DashboardQuery>) -> impl Responder {
    let predicate = match compile(&state, &query).await {
        Ok(predicate) => predicate,
        Err(response) => return response,
    };

    tracing::info!("Rendering dashboard for {}", predicate.cache_key());

    match state.analytics.dashboard(&predicate).await {
        Ok(summary) => HttpResponse::Ok().json(DashboardResponse::new(predicate, summary)),
        Err(e) => store_failure("Failed to compute dashboard", e),
    }
}

async fn manufacturer_distribution(
    state: web::Data<AppState>,
    query: web::Query<DashboardQuery>,
) -> impl Responder {
    match compile(&state, &query).await {
        Ok(predicate) => chart("manufacturers", state.analytics.manufacturer_distribution(&predicate).await),
        Err(response) => response,
    }
}

async fn avg_price_by_manufacturer(
    state: web::Data<AppState>,
    query: web::Query<DashboardQuery>,
) -> impl Responder {
    match compile(&state, &query).await {
        Ok(predicate) => chart("avg_price", state.analytics.avg_price_by_manufacturer(&predicate).await),
        Err(response) => response,
    }
}

async fn accident_severity(
    state: web::Data<AppState>,
    query: web::Query<DashboardQuery>,
) -> impl Responder {
    match compile(&state, &query).await {
        Ok(predicate) => chart("accidents", state.analytics.accident_severity(&predicate).await),
        Err(response) => response,
    }
}

async fn fuel_distribution(
    state: web::Data<AppState>,
    query: web::Query<DashboardQuery>,
) -> impl Responder {
    match compile(&state, &query).await {
        Ok(predicate) => chart("fuel", state.analytics.fuel_distribution(&predicate).await),
        Err(response) => response,
    }
}

async fn service_frequency(
    state: web::Data<AppState>,
    query: web::Query<DashboardQuery>,
) -> impl Responder {
    match compile(&state, &query).await {
        Ok(predicate) => chart("services", state.analytics.service_frequency(&predicate).await),
        Err(response) => response,
    }
}

async fn price_mileage(
    state: web::Data<AppState>,
    query: web::Query<DashboardQuery>,
) -> impl Responder {
    match compile(&state, &query).await {
        Ok(predicate) => chart("price_mileage", state.analytics.price_mileage_sample(&predicate).await),
        Err(response) => response,
    }
}

/// Vehicle picker entries for the current filters
///
/// GET /api/v1/vehicles
async fn vehicle_list(state: web::Data<AppState>, query: web::Query<DashboardQuery>) -> impl Responder {
    let predicate = match compile(&state, &query).await {
        Ok(predicate) => predicate,
        Err(response) => return response,
    };

    match state.analytics.vehicle_list(&predicate).await {
        Ok(vehicles) => HttpResponse::Ok().json(VehicleListResponse {
            count: vehicles.len(),
            vehicles,
        }),
        Err(e) => store_failure("Failed to list vehicles", e),
    }
}

/// Full history of one vehicle
///
/// GET /api/v1/vehicles/{id}
///
/// Integer ids and ObjectId hex strings are both accepted. An unknown id
/// answers 404.
async fn vehicle_detail(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let raw = path.into_inner();
    let id: VehicleId = match raw.parse() {
        Ok(id) => id,
        Err(never) => match never {},
    };

    match state.analytics.vehicle_detail(&id).await {
        Ok(Some(detail)) => HttpResponse::Ok().json(detail),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Vehicle not found".to_string(),
            message: format!("No vehicle with id {}", raw),
            status_code: 404,
        }),
        Err(e) => store_failure("Failed to load vehicle", e),
    }
}
