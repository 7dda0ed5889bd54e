//! Flujo completo salida → llegada sobre el gateway puro, aplicando cada
//! plan a un registro en memoria como lo haría la transacción.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use fleet_control::dto::event_dto::RegisterEventRequest;
use fleet_control::models::{Driver, DriverStatus, Event, EventType, NewEvent, Vehicle, VehicleStatus};
use fleet_control::services::availability::{resolve, Party};
use fleet_control::services::event_gateway::{plan_event, validate_request, EventPlan, LedgerContext};
use fleet_control::services::ledger_audit::audit;
use fleet_control::utils::errors::{AppError, AppResult};

/// La fila que devolvería el INSERT del gateway
fn persisted(event: NewEvent, created_at: DateTime<Utc>) -> Event {
    Event {
        id: event.id,
        event_type: event.event_type,
        driver_id: event.driver_id,
        vehicle_id: event.vehicle_id,
        manager_id: event.manager_id,
        odometer: event.odometer,
        phone: event.phone,
        occurred_at: event.occurred_at,
        notes: event.notes,
        created_at,
    }
}

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, 7, 30, 0).unwrap() + Duration::minutes(minutes)
}

struct Fleet {
    vehicle: Vehicle,
    driver: Driver,
    manager_id: Uuid,
    ledger: Vec<Event>,
}

impl Fleet {
    fn new(odometer: i64) -> Self {
        Self {
            vehicle: Vehicle {
                id: Uuid::new_v4(),
                make: "Volkswagen".to_string(),
                model: "Saveiro".to_string(),
                year: 2021,
                plate: "QWE4R56".to_string(),
                odometer,
                status: VehicleStatus::Available,
                registration_expiry: None,
                insurance_expiry: None,
                created_at: at(0),
                updated_at: at(0),
            },
            driver: Driver {
                id: Uuid::new_v4(),
                name: "Ana Lima".to_string(),
                phone: "(21) 99876-5432".to_string(),
                license_number: "98765432100".to_string(),
                license_expiry: NaiveDate::from_ymd_opt(2031, 8, 1).unwrap(),
                category: "B".to_string(),
                status: DriverStatus::Active,
                last_event_at: None,
                created_at: at(0),
                updated_at: at(0),
            },
            manager_id: Uuid::new_v4(),
            ledger: Vec::new(),
        }
    }

    fn request(&self, kind: &str, odometer: Option<i64>) -> RegisterEventRequest {
        RegisterEventRequest {
            driver_id: Some(self.driver.id.to_string()),
            vehicle_id: Some(self.vehicle.id.to_string()),
            manager_id: Some(self.manager_id.to_string()),
            event_type: Some(kind.to_string()),
            phone: Some("(21) 99876-5432".to_string()),
            odometer,
            ..Default::default()
        }
    }

    fn plan(&self, request: &RegisterEventRequest, now: DateTime<Utc>) -> AppResult<EventPlan> {
        let draft = validate_request(request, now)?;
        plan_event(
            draft,
            LedgerContext {
                driver: Some(&self.driver),
                vehicle: Some(&self.vehicle),
                manager_exists: true,
                events: &self.ledger,
            },
        )
    }

    /// Aplica el plan como una única unidad, o nada si el plan falla
    fn register(&mut self, kind: &str, odometer: Option<i64>, now: DateTime<Utc>) -> AppResult<Event> {
        let plan = self.plan(&self.request(kind, odometer), now)?;
        let event = persisted(plan.event, now);
        self.ledger.push(event.clone());
        self.vehicle.status = plan.vehicle_status;
        self.vehicle.odometer = plan.vehicle_odometer;
        self.driver.last_event_at = Some(plan.driver_last_event_at);
        Ok(event)
    }
}

#[test]
fn test_checkout_then_check_in_round_trip() {
    let mut fleet = Fleet::new(1000);

    let checkout = fleet.register("checkout", None, at(0)).unwrap();
    assert_eq!(checkout.odometer, 1000);
    assert_eq!(fleet.vehicle.status, VehicleStatus::InUse);
    assert!(resolve(&fleet.ledger, Party::Vehicle(fleet.vehicle.id)).is_in_use());

    fleet.register("check_in", Some(1050), at(90)).unwrap();
    assert_eq!(fleet.vehicle.odometer, 1050);
    assert_eq!(fleet.vehicle.status, VehicleStatus::Available);
    assert_eq!(fleet.driver.last_event_at, Some(at(90)));

    match fleet.register("check_in", Some(1060), at(120)) {
        Err(AppError::NotFound(msg)) => assert!(msg.contains("registro de salida")),
        other => panic!("expected not found, got {:?}", other),
    }
    assert_eq!(fleet.ledger.len(), 2);
    assert_eq!(fleet.vehicle.odometer, 1050);

    assert!(audit(&[fleet.vehicle.clone()], &fleet.ledger).is_consistent());
}

#[test]
fn test_low_odometer_check_in_leaves_vehicle_untouched() {
    let mut fleet = Fleet::new(1000);
    fleet.register("saida", None, at(0)).unwrap();

    for odometer in [1000, 999] {
        let err = fleet.register("chegada", Some(odometer), at(30)).unwrap_err();
        assert!(matches!(err, AppError::InvalidField { field: "odometer", .. }));
    }
    assert_eq!(fleet.vehicle.odometer, 1000);
    assert_eq!(fleet.vehicle.status, VehicleStatus::InUse);
    assert_eq!(fleet.ledger.len(), 1);
}

#[test]
fn test_second_checkout_conflicts_and_ledger_is_unchanged() {
    let mut fleet = Fleet::new(500);
    fleet.register("checkout", None, at(0)).unwrap();

    let err = fleet.register("checkout", None, at(10)).unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(fleet.ledger.len(), 1);
}

#[test]
fn test_in_use_means_exactly_one_open_checkout() {
    let mut fleet = Fleet::new(0);
    fleet.register("checkout", None, at(0)).unwrap();
    fleet.register("check_in", Some(40), at(60)).unwrap();
    fleet.register("checkout", None, at(120)).unwrap();

    let party = Party::Vehicle(fleet.vehicle.id);
    let first = resolve(&fleet.ledger, party);
    assert_eq!(first, resolve(&fleet.ledger, party));

    let open = first.open_checkout().expect("vehicle should be in use");
    let unmatched: Vec<&Event> = fleet
        .ledger
        .iter()
        .filter(|c| c.event_type == EventType::Checkout)
        .filter(|c| {
            !fleet
                .ledger
                .iter()
                .any(|e| e.event_type == EventType::CheckIn && e.occurred_at > c.occurred_at)
        })
        .collect();
    assert_eq!(unmatched.len(), 1);
    assert_eq!(unmatched[0].id, open.checkout_id);
    assert_eq!(open.odometer, 40);
    assert_eq!(open.since, at(120));
}
