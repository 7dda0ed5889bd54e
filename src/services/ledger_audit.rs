//! Auditoría del ledger
//!
//! Detecta secuencias que rompen la alternancia salida → llegada y
//! vehículos cuyo estado en el registro no coincide con el derivado
//! del ledger.

use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    models::{Event, EventType, Vehicle, VehicleStatus},
    services::availability::{resolve_all, PartyKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    StartsWithCheckIn,
    ConsecutiveCheckouts,
    ConsecutiveCheckIns,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerViolation {
    pub entity: &'static str,
    pub entity_id: Uuid,
    pub kind: ViolationKind,
    pub event_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMismatch {
    pub vehicle_id: Uuid,
    pub plate: String,
    pub registry_status: VehicleStatus,
    pub ledger_in_use: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LedgerAuditReport {
    pub events_checked: usize,
    pub violations: Vec<LedgerViolation>,
    pub status_mismatches: Vec<StatusMismatch>,
}

impl LedgerAuditReport {
    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty() && self.status_mismatches.is_empty()
    }
}

fn entity_label(kind: PartyKind) -> &'static str {
    match kind {
        PartyKind::Vehicle => "vehicle",
        PartyKind::Driver => "driver",
    }
}

/// Violaciones de alternancia para todas las entidades de un tipo
pub fn alternation_violations(events: &[Event], kind: PartyKind) -> Vec<LedgerViolation> {
    let mut per_entity: HashMap<Uuid, Vec<&Event>> = HashMap::new();
    for event in events {
        per_entity.entry(kind.id_of(event)).or_default().push(event);
    }

    let mut violations = Vec::new();
    for (entity_id, mut history) in per_entity {
        history.sort_by_key(|e| (e.occurred_at, e.created_at));

        let mut previous: Option<EventType> = None;
        for event in history {
            let kind_found = match (previous, event.event_type) {
                (None, EventType::CheckIn) => Some(ViolationKind::StartsWithCheckIn),
                (Some(EventType::Checkout), EventType::Checkout) => {
                    Some(ViolationKind::ConsecutiveCheckouts)
                }
                (Some(EventType::CheckIn), EventType::CheckIn) => {
                    Some(ViolationKind::ConsecutiveCheckIns)
                }
                _ => None,
            };
            if let Some(violation) = kind_found {
                violations.push(LedgerViolation {
                    entity: entity_label(kind),
                    entity_id,
                    kind: violation,
                    event_id: event.id,
                });
            }
            previous = Some(event.event_type);
        }
    }

    violations.sort_by_key(|v| (v.entity, v.entity_id, v.event_id));
    violations
}

/// Auditoría completa del ledger contra el registro de vehículos
pub fn audit(vehicles: &[Vehicle], events: &[Event]) -> LedgerAuditReport {
    let mut violations = alternation_violations(events, PartyKind::Vehicle);
    violations.extend(alternation_violations(events, PartyKind::Driver));

    let by_vehicle = resolve_all(events, PartyKind::Vehicle);
    let status_mismatches = vehicles
        .iter()
        .filter_map(|vehicle| {
            let ledger_in_use = by_vehicle.get(vehicle.id).is_in_use();
            let registry_in_use = vehicle.status == VehicleStatus::InUse;
            (ledger_in_use != registry_in_use).then(|| StatusMismatch {
                vehicle_id: vehicle.id,
                plate: vehicle.plate.clone(),
                registry_status: vehicle.status,
                ledger_in_use,
            })
        })
        .collect();

    LedgerAuditReport {
        events_checked: events.len(),
        violations,
        status_mismatches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::availability::test_support::{at, event};

    fn vehicle(id: Uuid, status: VehicleStatus) -> Vehicle {
        Vehicle {
            id,
            make: "VW".to_string(),
            model: "Saveiro".to_string(),
            year: 2020,
            plate: "ABC1234".to_string(),
            odometer: 0,
            status,
            registration_expiry: None,
            insurance_expiry: None,
            created_at: at(0),
            updated_at: at(0),
        }
    }

    #[test]
    fn test_alternating_ledger_is_consistent() {
        let (d, v) = (Uuid::new_v4(), Uuid::new_v4());
        let ledger = vec![
            event(EventType::Checkout, d, v, 0, 10),
            event(EventType::CheckIn, d, v, 10, 20),
            event(EventType::Checkout, d, v, 20, 20),
        ];
        let report = audit(&[vehicle(v, VehicleStatus::InUse)], &ledger);
        assert!(report.is_consistent());
        assert_eq!(report.events_checked, 3);
    }

    #[test]
    fn test_detects_alternation_violations() {
        let (d, v) = (Uuid::new_v4(), Uuid::new_v4());
        let orphan = event(EventType::CheckIn, d, v, 0, 10);
        let double_out = event(EventType::Checkout, d, v, 30, 10);
        let ledger = vec![event(EventType::Checkout, d, v, 20, 10), orphan.clone(), double_out.clone()];

        let violations = alternation_violations(&ledger, PartyKind::Vehicle);
        assert_eq!(violations.len(), 2);
        assert!(violations
            .iter()
            .any(|x| x.kind == ViolationKind::StartsWithCheckIn && x.event_id == orphan.id));
        assert!(violations
            .iter()
            .any(|x| x.kind == ViolationKind::ConsecutiveCheckouts && x.event_id == double_out.id));
    }

    #[test]
    fn test_driver_violations_span_vehicles() {
        let d = Uuid::new_v4();
        let second_out = event(EventType::Checkout, d, Uuid::new_v4(), 30, 10);
        let ledger = vec![event(EventType::Checkout, d, Uuid::new_v4(), 0, 10), second_out.clone()];

        assert!(alternation_violations(&ledger, PartyKind::Vehicle).is_empty());
        let violations = alternation_violations(&ledger, PartyKind::Driver);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].entity, "driver");
        assert_eq!(violations[0].entity_id, d);
        assert_eq!(violations[0].event_id, second_out.id);
    }

    #[test]
    fn test_detects_registry_disagreement() {
        let (d, v1, v2) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let ledger = vec![event(EventType::Checkout, d, v1, 0, 10)];
        let vehicles = [
            vehicle(v1, VehicleStatus::Available),
            vehicle(v2, VehicleStatus::InUse),
        ];

        let report = audit(&vehicles, &ledger);
        assert_eq!(report.status_mismatches.len(), 2);
        let first = report.status_mismatches.iter().find(|m| m.vehicle_id == v1).unwrap();
        assert!(first.ledger_in_use);
        let second = report.status_mismatches.iter().find(|m| m.vehicle_id == v2).unwrap();
        assert!(!second.ledger_in_use);
        assert!(!report.is_consistent());
    }
}
