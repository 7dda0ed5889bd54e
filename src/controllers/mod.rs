pub mod auth_controller;
pub mod dashboard_controller;
pub mod driver_controller;
pub mod event_controller;
pub mod manager_controller;
pub mod vehicle_controller;
