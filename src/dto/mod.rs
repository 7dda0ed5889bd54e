pub mod api_response;
pub mod auth_dto;
pub mod dashboard_dto;
pub mod driver_dto;
pub mod event_dto;
pub mod manager_dto;
pub mod vehicle_dto;

pub use api_response::{search_pattern, ApiResponse, IdQuery, SearchQuery};
