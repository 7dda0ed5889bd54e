//! Resolución de disponibilidad
//!
//! Deriva del ledger si un vehículo o un conductor está "en uso": existe una
//! salida (checkout) sin una llegada (check-in) posterior. Es la única
//! implementación de esta regla; listados, gateway, auditoría y dashboard
//! dependen de ella.
//!
//! Los instantes se comparan como `DateTime<Utc>`, nunca como texto.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{Driver, Event, EventType};

/// Tipo de entidad sobre la que se resuelve la disponibilidad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartyKind {
    Vehicle,
    Driver,
}

impl PartyKind {
    pub(crate) fn id_of(&self, event: &Event) -> Uuid {
        match self {
            PartyKind::Vehicle => event.vehicle_id,
            PartyKind::Driver => event.driver_id,
        }
    }

    fn counterpart_of(&self, event: &Event) -> Uuid {
        match self {
            PartyKind::Vehicle => event.driver_id,
            PartyKind::Driver => event.vehicle_id,
        }
    }
}

/// Entidad concreta: un vehículo o un conductor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Party {
    Vehicle(Uuid),
    Driver(Uuid),
}

impl Party {
    pub fn kind(&self) -> PartyKind {
        match self {
            Party::Vehicle(_) => PartyKind::Vehicle,
            Party::Driver(_) => PartyKind::Driver,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Party::Vehicle(id) | Party::Driver(id) => *id,
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.kind().id_of(event) == self.id()
    }
}

/// Salida sin llegada posterior
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenCheckout {
    pub checkout_id: Uuid,
    /// Vehículo que usa el conductor, o conductor que usa el vehículo
    pub counterpart_id: Uuid,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
    pub since: DateTime<Utc>,
    pub odometer: i64,
}

impl OpenCheckout {
    fn from_event(event: &Event, kind: PartyKind) -> Self {
        Self {
            checkout_id: event.id,
            counterpart_id: kind.counterpart_of(event),
            driver_id: event.driver_id,
            vehicle_id: event.vehicle_id,
            since: event.occurred_at,
            odometer: event.odometer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Availability {
    Available,
    InUse(OpenCheckout),
}

impl Availability {
    pub fn is_in_use(&self) -> bool {
        matches!(self, Availability::InUse(_))
    }

    pub fn open_checkout(&self) -> Option<&OpenCheckout> {
        match self {
            Availability::InUse(open) => Some(open),
            Availability::Available => None,
        }
    }
}

/// Acumula la última salida y la última llegada de una entidad
#[derive(Default)]
struct Tracker<'a> {
    last_out: Option<&'a Event>,
    last_in: Option<DateTime<Utc>>,
}

impl<'a> Tracker<'a> {
    fn push(&mut self, event: &'a Event) {
        match event.event_type {
            EventType::Checkout => {
                if self.last_out.map_or(true, |out| event.occurred_at >= out.occurred_at) {
                    self.last_out = Some(event);
                }
            }
            EventType::CheckIn => {
                if self.last_in.map_or(true, |at| event.occurred_at > at) {
                    self.last_in = Some(event.occurred_at);
                }
            }
        }
    }

    fn finish(self, kind: PartyKind) -> Availability {
        match self.last_out {
            None => Availability::Available,
            Some(out) if self.last_in.map_or(false, |at| at > out.occurred_at) => {
                Availability::Available
            }
            Some(out) => Availability::InUse(OpenCheckout::from_event(out, kind)),
        }
    }
}

/// Disponibilidad de una entidad según el ledger
pub fn resolve(events: &[Event], party: Party) -> Availability {
    let mut tracker = Tracker::default();
    for event in events.iter().filter(|e| party.matches(e)) {
        tracker.push(event);
    }
    tracker.finish(party.kind())
}

/// Disponibilidad de todas las entidades de un tipo, en una sola pasada
pub fn resolve_all(events: &[Event], kind: PartyKind) -> AvailabilityIndex {
    let mut trackers: HashMap<Uuid, Tracker<'_>> = HashMap::new();
    for event in events {
        trackers.entry(kind.id_of(event)).or_default().push(event);
    }

    AvailabilityIndex {
        entries: trackers
            .into_iter()
            .map(|(id, tracker)| (id, tracker.finish(kind)))
            .collect(),
    }
}

/// Índice de disponibilidad por id; las entidades sin eventos están disponibles
#[derive(Debug, Default, Clone)]
pub struct AvailabilityIndex {
    entries: HashMap<Uuid, Availability>,
}

impl AvailabilityIndex {
    pub fn get(&self, id: Uuid) -> Availability {
        self.entries.get(&id).cloned().unwrap_or(Availability::Available)
    }

    pub fn in_use(&self) -> impl Iterator<Item = (&Uuid, &OpenCheckout)> {
        self.entries
            .iter()
            .filter_map(|(id, availability)| availability.open_checkout().map(|open| (id, open)))
    }

    pub fn in_use_count(&self) -> usize {
        self.in_use().count()
    }
}

/// Un conductor inactivo o suspendido nunca está disponible para salir,
/// aunque el ledger no muestre una salida abierta
pub fn driver_available_for_checkout(driver: &Driver, availability: &Availability) -> bool {
    driver.is_active() && !availability.is_in_use()
}

/// Instante del evento más reciente de la entidad
pub fn latest_event_at(events: &[Event], party: Party) -> Option<DateTime<Utc>> {
    events
        .iter()
        .filter(|e| party.matches(e))
        .map(|e| e.occurred_at)
        .max()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::{Duration, TimeZone};

    pub fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    pub fn event(
        event_type: EventType,
        driver_id: Uuid,
        vehicle_id: Uuid,
        minutes: i64,
        odometer: i64,
    ) -> Event {
        Event {
            id: Uuid::new_v4(),
            event_type,
            driver_id,
            vehicle_id,
            manager_id: Uuid::nil(),
            odometer,
            phone: "(11) 98765-4321".to_string(),
            occurred_at: at(minutes),
            notes: None,
            created_at: at(minutes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{at, event};
    use super::*;

    #[test]
    fn test_no_events_is_available() {
        assert_eq!(resolve(&[], Party::Vehicle(Uuid::new_v4())), Availability::Available);
    }

    #[test]
    fn test_unmatched_checkout_is_in_use_with_pairing() {
        let (d, v) = (Uuid::new_v4(), Uuid::new_v4());
        let out = event(EventType::Checkout, d, v, 0, 1000);
        let ledger = vec![out.clone()];

        match resolve(&ledger, Party::Driver(d)) {
            Availability::InUse(open) => {
                assert_eq!(open.checkout_id, out.id);
                assert_eq!(open.counterpart_id, v);
                assert_eq!(open.odometer, 1000);
            }
            other => panic!("expected in use, got {:?}", other),
        }
        assert_eq!(
            resolve(&ledger, Party::Vehicle(v)).open_checkout().map(|o| o.counterpart_id),
            Some(d)
        );
    }

    #[test]
    fn test_later_check_in_releases() {
        let (d, v) = (Uuid::new_v4(), Uuid::new_v4());
        let ledger = vec![
            event(EventType::Checkout, d, v, 0, 1000),
            event(EventType::CheckIn, d, v, 60, 1050),
        ];
        assert_eq!(resolve(&ledger, Party::Vehicle(v)), Availability::Available);
        assert_eq!(resolve(&ledger, Party::Driver(d)), Availability::Available);
    }

    #[test]
    fn test_check_in_before_last_checkout_does_not_release() {
        let (d, v) = (Uuid::new_v4(), Uuid::new_v4());
        // El orden del slice no importa, solo el instante
        let ledger = vec![
            event(EventType::Checkout, d, v, 120, 1050),
            event(EventType::CheckIn, d, v, 60, 1050),
            event(EventType::Checkout, d, v, 0, 1000),
        ];
        let availability = resolve(&ledger, Party::Vehicle(v));
        assert!(availability.is_in_use());
        assert_eq!(availability.open_checkout().unwrap().since, at(120));
    }

    #[test]
    fn test_check_in_at_same_instant_does_not_release() {
        let (d, v) = (Uuid::new_v4(), Uuid::new_v4());
        let ledger = vec![
            event(EventType::Checkout, d, v, 10, 1000),
            event(EventType::CheckIn, d, v, 10, 1010),
        ];
        assert!(resolve(&ledger, Party::Vehicle(v)).is_in_use());
    }

    #[test]
    fn test_other_entities_are_ignored() {
        let (d1, d2, v1, v2) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let ledger = vec![
            event(EventType::Checkout, d1, v1, 0, 10),
            event(EventType::Checkout, d2, v2, 5, 20),
            event(EventType::CheckIn, d2, v2, 30, 40),
        ];
        assert!(resolve(&ledger, Party::Vehicle(v1)).is_in_use());
        assert!(!resolve(&ledger, Party::Vehicle(v2)).is_in_use());
        assert!(!resolve(&ledger, Party::Driver(d2)).is_in_use());
    }

    #[test]
    fn test_resolve_all_matches_single_resolution() {
        let drivers: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let vehicles: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let ledger = vec![
            event(EventType::Checkout, drivers[0], vehicles[0], 0, 100),
            event(EventType::CheckIn, drivers[0], vehicles[0], 10, 150),
            event(EventType::Checkout, drivers[1], vehicles[0], 20, 150),
            event(EventType::Checkout, drivers[2], vehicles[1], 25, 500),
            event(EventType::CheckIn, drivers[2], vehicles[1], 40, 520),
            event(EventType::Checkout, drivers[0], vehicles[2], 50, 900),
        ];

        let index = resolve_all(&ledger, PartyKind::Vehicle);
        for v in &vehicles {
            assert_eq!(index.get(*v), resolve(&ledger, Party::Vehicle(*v)));
        }
        assert_eq!(index.in_use_count(), 2);
        assert_eq!(index.get(Uuid::new_v4()), Availability::Available);

        let by_driver = resolve_all(&ledger, PartyKind::Driver);
        for d in &drivers {
            assert_eq!(by_driver.get(*d), resolve(&ledger, Party::Driver(*d)));
        }
    }

    #[test]
    fn test_resolution_is_idempotent_and_order_independent() {
        let (d, v) = (Uuid::new_v4(), Uuid::new_v4());
        let mut ledger = vec![
            event(EventType::Checkout, d, v, 0, 100),
            event(EventType::CheckIn, d, v, 30, 130),
            event(EventType::Checkout, d, v, 60, 130),
        ];
        let first = resolve(&ledger, Party::Vehicle(v));
        assert_eq!(first, resolve(&ledger, Party::Vehicle(v)));
        ledger.reverse();
        assert_eq!(first, resolve(&ledger, Party::Vehicle(v)));
    }

    #[test]
    fn test_in_use_implies_exactly_one_unmatched_checkout() {
        let (d, v) = (Uuid::new_v4(), Uuid::new_v4());
        let mut ledger = Vec::new();
        let mut odometer = 1000;
        for step in 0..9 {
            let kind = if step % 2 == 0 { EventType::Checkout } else { EventType::CheckIn };
            odometer += 25;
            ledger.push(event(kind, d, v, step * 15, odometer));

            let availability = resolve(&ledger, Party::Vehicle(v));
            let unmatched = ledger
                .iter()
                .filter(|out| out.event_type == EventType::Checkout)
                .filter(|out| {
                    !ledger.iter().any(|back| {
                        back.event_type == EventType::CheckIn && back.occurred_at > out.occurred_at
                    })
                })
                .count();
            if availability.is_in_use() {
                assert_eq!(unmatched, 1);
            } else {
                assert_eq!(unmatched, 0);
            }
        }
    }

    #[test]
    fn test_inactive_driver_is_never_available_for_checkout() {
        use crate::models::DriverStatus;
        use chrono::NaiveDate;

        let mut driver = Driver {
            id: Uuid::new_v4(),
            name: "Joana Lima".to_string(),
            phone: "(11) 98765-4321".to_string(),
            license_number: "12345678901".to_string(),
            license_expiry: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            category: "B".to_string(),
            status: DriverStatus::Active,
            last_event_at: None,
            created_at: at(0),
            updated_at: at(0),
        };
        assert!(driver_available_for_checkout(&driver, &Availability::Available));

        let ledger = vec![event(EventType::Checkout, driver.id, Uuid::new_v4(), 0, 10)];
        let out = resolve(&ledger, Party::Driver(driver.id));
        assert!(!driver_available_for_checkout(&driver, &out));

        for status in [DriverStatus::Inactive, DriverStatus::Suspended] {
            driver.status = status;
            assert!(!driver_available_for_checkout(&driver, &Availability::Available));
        }
    }

    #[test]
    fn test_latest_event_at() {
        let (d, v) = (Uuid::new_v4(), Uuid::new_v4());
        let ledger = vec![
            event(EventType::Checkout, d, v, 0, 10),
            event(EventType::CheckIn, d, v, 45, 20),
        ];
        assert_eq!(latest_event_at(&ledger, Party::Vehicle(v)), Some(at(45)));
        assert_eq!(latest_event_at(&ledger, Party::Vehicle(Uuid::new_v4())), None);
    }
}
