// Model exports
pub mod document;
pub mod domain;
pub mod requests;
pub mod responses;
pub mod rows;

pub use domain::{AccidentEvent, ClosedRange, Dealer, FilterOptions, ServiceEvent, Vehicle, VehicleId};
pub use requests::DashboardQuery;
pub use responses::{ChartResponse, DashboardResponse, ErrorResponse, HealthResponse, VehicleListResponse};
pub use rows::{
    DashboardSummary, FuelCount, ManufacturerAvgPrice, ManufacturerCount, PriceMileagePoint,
    ServiceYearCount, SeverityCount, VehicleDetail, VehicleListItem,
};
