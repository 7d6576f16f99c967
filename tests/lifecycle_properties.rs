mod common;

use std::collections::HashMap;

use chrono::Utc;
use proptest::prelude::*;
use uuid::Uuid;

use common::{fleet, start, Fleet};
use fleet_management::lifecycle::{derive_status, Hold};
use fleet_management::models::{
    AccidentStatus, MaintenanceStatus, TripFilters, TripStatus, Vehicle, VehicleFilters, VehicleStatus,
};
use fleet_management::services::{AccidentStatusChange, CreateMaintenance, MaintenanceStatusChange, ReportAccident};

const VEHICLES: usize = 2;

#[derive(Debug, Clone)]
enum Op {
    Start { vehicle: usize, extra: i64 },
    End { trip: usize, distance: i64 },
    Cancel { trip: usize },
    Maintain { vehicle: usize, immediate: bool },
    Advance { record: usize, status: MaintenanceStatus },
    Report { vehicle: usize },
    Accident { accident: usize, status: AccidentStatus },
    Retire { vehicle: usize },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..VEHICLES, 0..20i64).prop_map(|(vehicle, extra)| Op::Start { vehicle, extra }),
        3 => (0..8usize, -20..80i64).prop_map(|(trip, distance)| Op::End { trip, distance }),
        1 => (0..8usize).prop_map(|trip| Op::Cancel { trip }),
        2 => (0..VEHICLES, any::<bool>()).prop_map(|(vehicle, immediate)| Op::Maintain { vehicle, immediate }),
        2 => (
            0..8usize,
            prop_oneof![
                Just(MaintenanceStatus::InProgress),
                Just(MaintenanceStatus::Completed),
                Just(MaintenanceStatus::Cancelled),
            ]
        )
            .prop_map(|(record, status)| Op::Advance { record, status }),
        2 => (0..VEHICLES).prop_map(|vehicle| Op::Report { vehicle }),
        2 => (
            0..8usize,
            prop_oneof![
                Just(AccidentStatus::UnderInvestigation),
                Just(AccidentStatus::RepairScheduled),
                Just(AccidentStatus::RepairInProgress),
                Just(AccidentStatus::Resolved),
            ]
        )
            .prop_map(|(accident, status)| Op::Accident { accident, status }),
        1 => (0..VEHICLES).prop_map(|vehicle| Op::Retire { vehicle }),
    ]
}

#[derive(Default)]
struct Created {
    trips: Vec<Uuid>,
    maintenance: Vec<Uuid>,
    accidents: Vec<Uuid>,
}

fn pick(ids: &[Uuid], index: usize) -> Option<Uuid> {
    (!ids.is_empty()).then(|| ids[index % ids.len()])
}

async fn vehicles(f: &Fleet) -> HashMap<Uuid, Vehicle> {
    f.store
        .list_vehicles(&VehicleFilters::default())
        .await
        .unwrap()
        .into_iter()
        .map(|v| (v.id, v))
        .collect()
}

/// Aplica la operación; devuelve si tuvo éxito
async fn apply(f: &Fleet, fleet_ids: &[Uuid], created: &mut Created, op: &Op) -> bool {
    match *op {
        Op::Start { vehicle, extra } => {
            let v = f.store.find_vehicle(fleet_ids[vehicle]).await.unwrap().unwrap();
            match f.state.trips.start_trip(&f.driver, start(&v, v.current_odometer + extra)).await {
                Ok(trip) => {
                    created.trips.push(trip.id);
                    true
                }
                Err(_) => false,
            }
        }
        Op::End { trip, distance } => {
            let Some(id) = pick(&created.trips, trip) else { return false };
            let current = f.store.find_trip(id).await.unwrap().unwrap();
            f.state
                .trips
                .end_trip(&f.driver, id, current.start_odometer + distance, None)
                .await
                .is_ok()
        }
        Op::Cancel { trip } => {
            let Some(id) = pick(&created.trips, trip) else { return false };
            f.state.trips.cancel_trip(&f.manager, id, None).await.is_ok()
        }
        Op::Maintain { vehicle, immediate } => {
            let input = CreateMaintenance {
                vehicle_id: fleet_ids[vehicle],
                maintenance_type: "Inspection".to_string(),
                provider: None,
                description: "Generated".to_string(),
                odometer_reading: None,
                status: if immediate {
                    MaintenanceStatus::InProgress
                } else {
                    MaintenanceStatus::Scheduled
                },
                scheduled_date: None,
                cost: None,
                notes: String::new(),
            };
            match f.state.maintenance.create(&f.manager, input).await {
                Ok(record) => {
                    created.maintenance.push(record.id);
                    true
                }
                Err(_) => false,
            }
        }
        Op::Advance { record, status } => {
            let Some(id) = pick(&created.maintenance, record) else { return false };
            let change = MaintenanceStatusChange {
                status,
                cost: None,
                notes: None,
            };
            f.state.maintenance.change_status(&f.manager, id, change).await.is_ok()
        }
        Op::Report { vehicle } => {
            let input = ReportAccident {
                vehicle_id: fleet_ids[vehicle],
                driver_id: None,
                occurred_at: Utc::now(),
                location: "Yard".to_string(),
                description: "Generated".to_string(),
                damage_description: "Scratch".to_string(),
                third_party_involved: false,
                injuries: false,
                police_report_number: None,
                estimated_cost: None,
                notes: String::new(),
            };
            match f.state.accidents.report(&f.driver, input).await {
                Ok(accident) => {
                    created.accidents.push(accident.id);
                    true
                }
                Err(_) => false,
            }
        }
        Op::Accident { accident, status } => {
            let Some(id) = pick(&created.accidents, accident) else { return false };
            let change = AccidentStatusChange {
                status,
                actual_cost: None,
                notes: None,
            };
            f.state.accidents.change_status(&f.manager, id, change).await.is_ok()
        }
        Op::Retire { vehicle } => f.state.vehicles.retire(&f.manager, fleet_ids[vehicle]).await.is_ok(),
    }
}

async fn check_invariants(f: &Fleet, before: &HashMap<Uuid, Vehicle>) -> Result<(), TestCaseError> {
    let after = vehicles(f).await;
    let trips = f.store.list_trips(&TripFilters::default()).await.unwrap();

    for trip in &trips {
        if let Some(end) = trip.end_odometer {
            prop_assert!(end > trip.start_odometer, "trip {} ended at {} from {}", trip.id, end, trip.start_odometer);
        }
        if trip.status == TripStatus::Completed {
            prop_assert!(trip.end_time.is_some() && trip.end_odometer.is_some());
        }
    }

    for vehicle in after.values() {
        prop_assert!(vehicle.current_odometer >= before[&vehicle.id].current_odometer);

        let holds = f.store.vehicle_holds(vehicle.id).await.unwrap();
        prop_assert_eq!(vehicle.status, derive_status(vehicle.is_retired(), &holds));

        let ongoing = trips
            .iter()
            .filter(|t| t.vehicle_id == vehicle.id && t.status == TripStatus::Ongoing)
            .count();
        prop_assert!(ongoing <= 1);
        if vehicle.status == VehicleStatus::InUse {
            prop_assert_eq!(ongoing, 1);
            prop_assert!(holds.iter().all(|h| matches!(h, Hold::Trip(_))));
        }
        if vehicle.status == VehicleStatus::Retired {
            prop_assert!(holds.is_empty() || before[&vehicle.id].is_retired());
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_random_operations_keep_fleet_consistent(ops in prop::collection::vec(op(), 1..25)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let f = fleet().await;
            let mut fleet_ids = Vec::new();
            for n in 0..VEHICLES {
                fleet_ids.push(f.vehicle(n as u32 + 1, 1000).await.id);
            }
            let mut created = Created::default();

            for op in &ops {
                let before = vehicles(&f).await;
                let ok = apply(&f, &fleet_ids, &mut created, op).await;
                if !ok {
                    // Una operación rechazada no cambia ningún vehículo
                    prop_assert_eq!(&vehicles(&f).await, &before, "{:?}", op);
                }
                check_invariants(&f, &before).await?;
            }
            Ok(())
        })?;
    }
}
