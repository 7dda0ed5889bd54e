use chrono::Utc;
use sqlx::PgPool;

use crate::repositories::{DriverRepository, EventRepository, VehicleRepository};
use crate::services::dashboard_service::{build_summary, expiry_alerts, DashboardSummary, ExpiryAlert};
use crate::utils::errors::AppResult;

pub struct DashboardController {
    vehicles: VehicleRepository,
    drivers: DriverRepository,
    events: EventRepository,
}

impl DashboardController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            vehicles: VehicleRepository::new(pool.clone()),
            drivers: DriverRepository::new(pool.clone()),
            events: EventRepository::new(pool),
        }
    }

    pub async fn summary(&self, window_days: i64) -> AppResult<DashboardSummary> {
        let vehicles = self.vehicles.find_all().await?;
        let drivers = self.drivers.find_all().await?;
        let events = self.events.find_all().await?;

        Ok(build_summary(
            &vehicles,
            &drivers,
            &events,
            Utc::now().date_naive(),
            window_days,
        ))
    }

    pub async fn alerts(&self, window_days: i64) -> AppResult<Vec<ExpiryAlert>> {
        let vehicles = self.vehicles.find_all().await?;
        let drivers = self.drivers.find_all().await?;

        Ok(expiry_alerts(&vehicles, &drivers, Utc::now().date_naive(), window_days))
    }
}
