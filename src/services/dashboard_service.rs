//! Resumen de flota para el dashboard
//!
//! Contadores por estado, ocupación derivada del ledger y alertas de
//! vencimiento de documentos (CNH, licenciamiento y seguro).

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::{
    models::{Driver, DriverStatus, Event, EventType, Vehicle, VehicleStatus},
    services::availability::{resolve_all, PartyKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryKind {
    DriverLicense,
    VehicleRegistration,
    VehicleInsurance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiryAlert {
    pub kind: ExpiryKind,
    pub entity_id: Uuid,
    pub label: String,
    pub expires_on: NaiveDate,
    /// Negativo si el documento ya venció
    pub days_left: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub vehicles_total: usize,
    pub vehicles_by_status: BTreeMap<&'static str, usize>,
    pub vehicles_in_use: usize,
    pub drivers_total: usize,
    pub drivers_by_status: BTreeMap<&'static str, usize>,
    pub drivers_traveling: usize,
    /// Eventos cuyo día UTC es `today`
    pub checkouts_today: usize,
    pub check_ins_today: usize,
    pub alerts: Vec<ExpiryAlert>,
}

fn alert(
    kind: ExpiryKind,
    entity_id: Uuid,
    label: String,
    expires_on: NaiveDate,
    today: NaiveDate,
    window_days: i64,
) -> Option<ExpiryAlert> {
    let days_left = (expires_on - today).num_days();
    (days_left <= window_days).then_some(ExpiryAlert {
        kind,
        entity_id,
        label,
        expires_on,
        days_left,
    })
}

/// Documentos vencidos o que vencen dentro de la ventana, por fecha
pub fn expiry_alerts(
    vehicles: &[Vehicle],
    drivers: &[Driver],
    today: NaiveDate,
    window_days: i64,
) -> Vec<ExpiryAlert> {
    let mut alerts: Vec<ExpiryAlert> = drivers
        .iter()
        .filter(|d| d.status != DriverStatus::Inactive)
        .filter_map(|d| {
            alert(
                ExpiryKind::DriverLicense,
                d.id,
                format!("{} (CNH {})", d.name, d.license_number),
                d.license_expiry,
                today,
                window_days,
            )
        })
        .collect();

    for vehicle in vehicles {
        let documents = [
            (ExpiryKind::VehicleRegistration, vehicle.registration_expiry),
            (ExpiryKind::VehicleInsurance, vehicle.insurance_expiry),
        ];
        alerts.extend(documents.into_iter().filter_map(|(kind, expiry)| {
            expiry.and_then(|date| alert(kind, vehicle.id, vehicle.label(), date, today, window_days))
        }));
    }

    alerts.sort_by(|a, b| a.expires_on.cmp(&b.expires_on).then_with(|| a.label.cmp(&b.label)));
    alerts
}

/// Resumen de la flota. `today` es una fecha UTC: los contadores del día
/// comparan la fecha UTC de cada evento, no la hora local del gestor.
pub fn build_summary(
    vehicles: &[Vehicle],
    drivers: &[Driver],
    events: &[Event],
    today: NaiveDate,
    window_days: i64,
) -> DashboardSummary {
    let mut vehicles_by_status: BTreeMap<&'static str, usize> =
        VehicleStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    for vehicle in vehicles {
        *vehicles_by_status.entry(vehicle.status.as_str()).or_default() += 1;
    }

    let mut drivers_by_status: BTreeMap<&'static str, usize> =
        DriverStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    for driver in drivers {
        *drivers_by_status.entry(driver.status.as_str()).or_default() += 1;
    }

    let today_count = |kind: EventType| {
        events
            .iter()
            .filter(|e| e.event_type == kind && e.occurred_at.date_naive() == today)
            .count()
    };

    DashboardSummary {
        vehicles_total: vehicles.len(),
        vehicles_by_status,
        vehicles_in_use: resolve_all(events, PartyKind::Vehicle).in_use_count(),
        drivers_total: drivers.len(),
        drivers_by_status,
        drivers_traveling: resolve_all(events, PartyKind::Driver).in_use_count(),
        checkouts_today: today_count(EventType::Checkout),
        check_ins_today: today_count(EventType::CheckIn),
        alerts: expiry_alerts(vehicles, drivers, today, window_days),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::availability::test_support::{at, event};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn vehicle(status: VehicleStatus, registration: Option<NaiveDate>) -> Vehicle {
        Vehicle {
            id: Uuid::new_v4(),
            make: "Renault".to_string(),
            model: "Kangoo".to_string(),
            year: 2019,
            plate: "QWE1A23".to_string(),
            odometer: 0,
            status,
            registration_expiry: registration,
            insurance_expiry: None,
            created_at: at(0),
            updated_at: at(0),
        }
    }

    fn driver(status: DriverStatus, expiry: NaiveDate) -> Driver {
        Driver {
            id: Uuid::new_v4(),
            name: "Ana Costa".to_string(),
            phone: "(21) 99876-5432".to_string(),
            license_number: "10987654321".to_string(),
            license_expiry: expiry,
            category: "C".to_string(),
            status,
            last_event_at: None,
            created_at: at(0),
            updated_at: at(0),
        }
    }

    #[test]
    fn test_expiry_alerts_window_and_order() {
        let today = day(2024, 3, 1);
        let vehicles = [
            vehicle(VehicleStatus::Available, Some(day(2024, 3, 20))),
            vehicle(VehicleStatus::Available, Some(day(2024, 6, 1))),
        ];
        let drivers = [
            driver(DriverStatus::Active, day(2024, 2, 25)),
            driver(DriverStatus::Inactive, day(2024, 2, 1)),
            driver(DriverStatus::Active, day(2025, 1, 1)),
        ];

        let alerts = expiry_alerts(&vehicles, &drivers, today, 30);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].kind, ExpiryKind::DriverLicense);
        assert_eq!(alerts[0].days_left, -5);
        assert_eq!(alerts[1].kind, ExpiryKind::VehicleRegistration);
        assert_eq!(alerts[1].days_left, 19);
    }

    #[test]
    fn test_summary_counts_registry_and_ledger() {
        let today = at(0).date_naive();
        let vehicles = [
            vehicle(VehicleStatus::InUse, None),
            vehicle(VehicleStatus::Available, None),
            vehicle(VehicleStatus::Maintenance, None),
        ];
        let drivers = [
            driver(DriverStatus::Active, day(2030, 1, 1)),
            driver(DriverStatus::Suspended, day(2030, 1, 1)),
        ];
        let events = vec![
            event(EventType::Checkout, drivers[0].id, vehicles[1].id, 0, 100),
            event(EventType::CheckIn, drivers[0].id, vehicles[1].id, 30, 120),
            event(EventType::Checkout, drivers[0].id, vehicles[0].id, 60, 500),
        ];

        let summary = build_summary(&vehicles, &drivers, &events, today, 30);
        assert_eq!(summary.vehicles_total, 3);
        assert_eq!(summary.vehicles_by_status["in_use"], 1);
        assert_eq!(summary.vehicles_by_status["unavailable"], 0);
        assert_eq!(summary.vehicles_in_use, 1);
        assert_eq!(summary.drivers_by_status["suspended"], 1);
        assert_eq!(summary.drivers_traveling, 1);
        assert_eq!(summary.checkouts_today, 2);
        assert_eq!(summary.check_ins_today, 1);
        assert!(summary.alerts.is_empty());
    }

    #[test]
    fn test_daily_counts_follow_utc_dates() {
        let (d, v) = (Uuid::new_v4(), Uuid::new_v4());
        // 2024-03-02 01:00 UTC, todavía 1 de marzo en Brasília
        let late = event(EventType::Checkout, d, v, 17 * 60, 100);

        let summary = build_summary(&[], &[], &[late.clone()], day(2024, 3, 1), 30);
        assert_eq!(summary.checkouts_today, 0);

        let summary = build_summary(&[], &[], &[late], day(2024, 3, 2), 30);
        assert_eq!(summary.checkouts_today, 1);
    }
}
