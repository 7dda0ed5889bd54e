pub mod driver_repository;
pub mod event_repository;
pub mod manager_repository;
pub mod vehicle_repository;

pub use driver_repository::{DriverData, DriverRepository};
pub use event_repository::EventRepository;
pub use manager_repository::{ManagerData, ManagerRepository};
pub use vehicle_repository::{VehicleData, VehicleRepository};
