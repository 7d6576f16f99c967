mod common;

use chrono::Utc;

use common::{fleet, start, user};
use fleet_management::lifecycle::{Hold, LifecycleError, MAX_ODOMETER_KM};
use fleet_management::models::{
    AccidentStatus, ApprovalStatus, MaintenanceStatus, TripFilters, TripStatus, UserType, VehicleStatus,
};
use fleet_management::services::{
    AccidentStatusChange, CreateMaintenance, MaintenanceStatusChange, ReportAccident, SweepOptions, VehicleUpdate,
};
use fleet_management::utils::errors::AppError;

fn accident(vehicle_id: uuid::Uuid) -> ReportAccident {
    ReportAccident {
        vehicle_id,
        driver_id: None,
        occurred_at: Utc::now(),
        location: "NH 48".to_string(),
        description: "Rear-ended at signal".to_string(),
        damage_description: "Bumper".to_string(),
        third_party_involved: true,
        injuries: false,
        police_report_number: None,
        estimated_cost: None,
        notes: String::new(),
    }
}

fn maintenance(vehicle_id: uuid::Uuid, status: MaintenanceStatus) -> CreateMaintenance {
    CreateMaintenance {
        vehicle_id,
        maintenance_type: "Oil Change".to_string(),
        provider: None,
        description: "Periodic service".to_string(),
        odometer_reading: None,
        status,
        scheduled_date: None,
        cost: None,
        notes: String::new(),
    }
}

fn is_invalid_state(result: &Result<impl std::fmt::Debug, AppError>) -> bool {
    matches!(result, Err(AppError::Lifecycle(LifecycleError::InvalidState(_))))
}

#[tokio::test]
async fn test_start_and_end_trip_frees_vehicle() {
    let f = fleet().await;
    let v = f.vehicle(1, 1000).await;

    let trip = f.state.trips.start_trip(&f.driver, start(&v, 1000)).await.unwrap();
    assert_eq!(trip.status, TripStatus::Ongoing);
    assert_eq!(f.reload(&v).await.status, VehicleStatus::InUse);

    let ended = f.state.trips.end_trip(&f.driver, trip.id, 1050, None).await.unwrap();
    assert_eq!(ended.status, TripStatus::Completed);
    assert_eq!(ended.end_odometer, Some(1050));
    assert!(ended.end_time.is_some());

    let v = f.reload(&v).await;
    assert_eq!(v.status, VehicleStatus::Available);
    assert_eq!(v.current_odometer, 1050);

    let again = f.state.trips.end_trip(&f.driver, trip.id, 1100, None).await;
    assert!(is_invalid_state(&again));
    assert_eq!(f.reload(&v).await.current_odometer, 1050);
}

#[tokio::test]
async fn test_end_trip_with_lower_odometer_changes_nothing() {
    let f = fleet().await;
    let v = f.vehicle(1, 1000).await;
    let trip = f.state.trips.start_trip(&f.driver, start(&v, 1000)).await.unwrap();

    let result = f.state.trips.end_trip(&f.driver, trip.id, 900, None).await;
    assert!(matches!(
        result,
        Err(AppError::Lifecycle(LifecycleError::InvalidOdometer { reading: 900, minimum: 1000 }))
    ));

    let v = f.reload(&v).await;
    assert_eq!(v.status, VehicleStatus::InUse);
    assert_eq!(v.current_odometer, 1000);
    let trip = f.store.find_trip(trip.id).await.unwrap().unwrap();
    assert_eq!(trip.status, TripStatus::Ongoing);
    assert_eq!(trip.end_odometer, None);
}

#[tokio::test]
async fn test_second_trip_on_busy_vehicle_is_rejected() {
    let f = fleet().await;
    let v = f.vehicle(1, 1000).await;
    f.state.trips.start_trip(&f.driver, start(&v, 1000)).await.unwrap();
    let before = f.reload(&v).await;

    let result = f.state.trips.start_trip(&f.manager, start(&v, 1000)).await;
    assert!(matches!(
        result,
        Err(AppError::Lifecycle(LifecycleError::VehicleUnavailable { .. }))
    ));

    assert_eq!(f.reload(&v).await, before);
    let trips = f.store.list_trips(&TripFilters::default()).await.unwrap();
    assert_eq!(trips.len(), 1);
}

#[tokio::test]
async fn test_trip_cannot_start_during_maintenance_or_unresolved_repair() {
    let f = fleet().await;
    let v = f.vehicle(1, 1000).await;
    let record = f
        .state
        .maintenance
        .create(&f.manager, maintenance(v.id, MaintenanceStatus::InProgress))
        .await
        .unwrap();
    assert_eq!(f.reload(&v).await.status, VehicleStatus::Maintenance);

    let result = f.state.trips.start_trip(&f.driver, start(&v, 1000)).await;
    assert!(matches!(
        result,
        Err(AppError::Lifecycle(LifecycleError::VehicleUnavailable { .. }))
    ));

    f.state
        .maintenance
        .change_status(
            &f.manager,
            record.id,
            MaintenanceStatusChange {
                status: MaintenanceStatus::Completed,
                cost: None,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(f.reload(&v).await.status, VehicleStatus::Available);
    assert!(f.state.trips.start_trip(&f.driver, start(&v, 1000)).await.is_ok());
}

#[tokio::test]
async fn test_cancel_trip_needs_no_odometer() {
    let f = fleet().await;
    let v = f.vehicle(1, 1000).await;
    let trip = f.state.trips.start_trip(&f.driver, start(&v, 1000)).await.unwrap();

    let cancelled = f
        .state
        .trips
        .cancel_trip(&f.driver, trip.id, Some("Wrong vehicle".to_string()))
        .await
        .unwrap();
    assert_eq!(cancelled.status, TripStatus::Cancelled);
    assert_eq!(cancelled.end_odometer, None);
    assert!(cancelled.notes.starts_with("Trip cancelled: Wrong vehicle"));

    let v = f.reload(&v).await;
    assert_eq!(v.status, VehicleStatus::Available);
    assert_eq!(v.current_odometer, 1000);
    assert!(is_invalid_state(&f.state.trips.cancel_trip(&f.driver, trip.id, None).await));
}

#[tokio::test]
async fn test_vehicle_free_only_after_last_accident_resolved() {
    let f = fleet().await;
    let v = f.vehicle(1, 1000).await;
    let trip = f.state.trips.start_trip(&f.driver, start(&v, 1000)).await.unwrap();

    let a1 = f.state.accidents.report(&f.driver, accident(v.id)).await.unwrap();
    assert!(a1.grounds_vehicle);
    assert_eq!(f.reload(&v).await.status, VehicleStatus::Maintenance);
    let a2 = f.state.accidents.report(&f.driver, accident(v.id)).await.unwrap();
    assert!(a2.grounds_vehicle);

    // El accidente domina sobre el viaje que se cierra
    f.state.trips.end_trip(&f.driver, trip.id, 1020, None).await.unwrap();
    assert_eq!(f.reload(&v).await.status, VehicleStatus::Maintenance);

    let resolve = || AccidentStatusChange {
        status: AccidentStatus::Resolved,
        actual_cost: None,
        notes: None,
    };
    f.state.accidents.change_status(&f.manager, a1.id, resolve()).await.unwrap();
    assert_eq!(f.reload(&v).await.status, VehicleStatus::Maintenance);

    let resolved = f.state.accidents.change_status(&f.manager, a2.id, resolve()).await.unwrap();
    assert!(resolved.resolution_date.is_some());
    assert_eq!(f.reload(&v).await.status, VehicleStatus::Available);
    assert!(f.store.vehicle_holds(v.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_maintenance_completion_keeps_vehicle_grounded_by_accident() {
    let f = fleet().await;
    let v = f.vehicle(1, 1000).await;
    let record = f
        .state
        .maintenance
        .create(&f.manager, maintenance(v.id, MaintenanceStatus::InProgress))
        .await
        .unwrap();
    let crash = f.state.accidents.report(&f.manager, accident(v.id)).await.unwrap();
    assert!(crash.grounds_vehicle);

    let done = f
        .state
        .maintenance
        .change_status(
            &f.manager,
            record.id,
            MaintenanceStatusChange {
                status: MaintenanceStatus::Completed,
                cost: None,
                notes: Some("Filter replaced".to_string()),
            },
        )
        .await
        .unwrap();
    assert!(done.completion_date.is_some());

    let v = f.reload(&v).await;
    assert_eq!(v.status, VehicleStatus::Maintenance);
    let holds = f.store.vehicle_holds(v.id).await.unwrap();
    assert!(holds.contains(&Hold::Accident(crash.id)));
    assert_eq!(holds.len(), 1);
}

#[tokio::test]
async fn test_accident_on_parked_vehicle_grounds_only_for_repair() {
    let f = fleet().await;
    let v = f.vehicle(1, 1000).await;
    let crash = f.state.accidents.report(&f.driver, accident(v.id)).await.unwrap();
    assert!(!crash.grounds_vehicle);
    assert_eq!(f.reload(&v).await.status, VehicleStatus::Available);

    let repair = f
        .state
        .accidents
        .change_status(
            &f.manager,
            crash.id,
            AccidentStatusChange {
                status: AccidentStatus::RepairScheduled,
                actual_cost: None,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert!(repair.grounds_vehicle);
    assert_eq!(f.reload(&v).await.status, VehicleStatus::Maintenance);
}

#[tokio::test]
async fn test_open_accident_from_parked_vehicle_keeps_grounding() {
    let f = fleet().await;
    let v = f.vehicle(1, 1000).await;
    let parked = f.state.accidents.report(&f.driver, accident(v.id)).await.unwrap();
    assert!(!parked.grounds_vehicle);

    let trip = f.state.trips.start_trip(&f.driver, start(&v, 1000)).await.unwrap();
    let crash = f.state.accidents.report(&f.driver, accident(v.id)).await.unwrap();
    assert!(crash.grounds_vehicle);
    assert!(f.store.find_accident(parked.id).await.unwrap().unwrap().grounds_vehicle);
    f.state.trips.end_trip(&f.driver, trip.id, 1030, None).await.unwrap();

    let resolve = || AccidentStatusChange {
        status: AccidentStatus::Resolved,
        actual_cost: None,
        notes: None,
    };
    f.state.accidents.change_status(&f.manager, crash.id, resolve()).await.unwrap();
    let parked_now = f.store.find_accident(parked.id).await.unwrap().unwrap();
    assert_eq!(parked_now.status, AccidentStatus::Reported);
    assert_eq!(f.reload(&v).await.status, VehicleStatus::Maintenance);

    f.state.accidents.change_status(&f.manager, parked.id, resolve()).await.unwrap();
    assert_eq!(f.reload(&v).await.status, VehicleStatus::Available);
    assert!(f.store.vehicle_holds(v.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_pending_driver_cannot_start_trip() {
    let f = fleet().await;
    let pending = user("10077", UserType::Driver, ApprovalStatus::Pending);
    common::insert_user(&f.store, &pending).await;
    let v = f.vehicle(1, 1000).await;

    let result = f.state.trips.start_trip(&pending, start(&v, 1000)).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert_eq!(f.reload(&v).await.status, VehicleStatus::Available);
}

#[tokio::test]
async fn test_other_driver_cannot_end_trip() {
    let f = fleet().await;
    let other = user("10099", UserType::Driver, ApprovalStatus::Approved);
    common::insert_user(&f.store, &other).await;
    let v = f.vehicle(1, 1000).await;
    let trip = f.state.trips.start_trip(&f.driver, start(&v, 1000)).await.unwrap();

    let result = f.state.trips.end_trip(&other, trip.id, 1010, None).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    // Un gestor sí puede, y el conductor recibe aviso
    f.state.trips.end_trip(&f.manager, trip.id, 1010, None).await.unwrap();
    let inbox = f.state.notifications.list_for_user(&f.driver, true).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert!(inbox[0].text.contains("was ended by"));
}

#[tokio::test]
async fn test_retire_requires_idle_vehicle_and_is_terminal() {
    let f = fleet().await;
    let v = f.vehicle(1, 1000).await;
    let trip = f.state.trips.start_trip(&f.driver, start(&v, 1000)).await.unwrap();

    let result = f.state.vehicles.retire(&f.manager, v.id).await;
    assert!(matches!(
        result,
        Err(AppError::Lifecycle(LifecycleError::VehicleUnavailable { .. }))
    ));

    f.state.trips.end_trip(&f.driver, trip.id, 1010, None).await.unwrap();
    let retired = f.state.vehicles.retire(&f.manager, v.id).await.unwrap();
    assert_eq!(retired.status, VehicleStatus::Retired);

    let result = f.state.trips.start_trip(&f.driver, start(&v, 1010)).await;
    assert!(matches!(
        result,
        Err(AppError::Lifecycle(LifecycleError::VehicleUnavailable { .. }))
    ));
    let result = f
        .state
        .maintenance
        .create(&f.manager, maintenance(v.id, MaintenanceStatus::InProgress))
        .await;
    assert!(is_invalid_state(&result));
}

#[tokio::test]
async fn test_vehicle_update_uses_version_check() {
    let f = fleet().await;
    let v = f.vehicle(1, 1000).await;

    let updated = f
        .state
        .vehicles
        .update(
            &f.manager,
            v.id,
            VehicleUpdate {
                color: Some("Blue".to_string()),
                expected_version: Some(v.version),
                ..VehicleUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.version, v.version + 1);

    let stale = f
        .state
        .vehicles
        .update(
            &f.manager,
            v.id,
            VehicleUpdate {
                color: Some("Red".to_string()),
                expected_version: Some(v.version),
                ..VehicleUpdate::default()
            },
        )
        .await;
    assert!(matches!(
        stale,
        Err(AppError::Lifecycle(LifecycleError::ConcurrencyConflict { .. }))
    ));

    let rollback = f
        .state
        .vehicles
        .update(
            &f.manager,
            v.id,
            VehicleUpdate {
                current_odometer: Some(999),
                ..VehicleUpdate::default()
            },
        )
        .await;
    assert!(matches!(
        rollback,
        Err(AppError::Lifecycle(LifecycleError::InvalidOdometer { .. }))
    ));
    assert_eq!(f.reload(&v).await.color.as_deref(), Some("Blue"));
}

#[tokio::test]
async fn test_duplicate_license_plate_is_conflict() {
    let f = fleet().await;
    f.vehicle(1, 0).await;

    let mut duplicate = common::new_vehicle(1, 0);
    duplicate.vin = "MA3EWDE1S00999999".to_string();
    let result = f.state.vehicles.create(&f.manager, duplicate).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let result = f.state.vehicles.create(&f.driver, common::new_vehicle(2, 0)).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_end_trip_only_one_wins() {
    let f = fleet().await;
    let v = f.vehicle(1, 1000).await;
    let trip = f.state.trips.start_trip(&f.driver, start(&v, 1000)).await.unwrap();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let trips = f.state.trips.clone();
            let driver = f.driver.clone();
            tokio::spawn(async move { trips.end_trip(&driver, trip.id, 1100 + i, None).await })
        })
        .collect();

    let mut wins = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(e) => assert!(
                matches!(e, AppError::Lifecycle(LifecycleError::InvalidState(_))),
                "unexpected error: {e}"
            ),
        }
    }
    assert_eq!(wins, 1);

    let trip = f.store.find_trip(trip.id).await.unwrap().unwrap();
    let v = f.reload(&v).await;
    assert_eq!(v.status, VehicleStatus::Available);
    assert_eq!(Some(v.current_odometer), trip.end_odometer);
}

#[tokio::test]
async fn test_sweep_ends_stale_trip_with_estimate() {
    let f = fleet().await;
    let v = f.vehicle(1, 1000).await;
    let trip = f.state.trips.start_trip(&f.driver, start(&v, 1000)).await.unwrap();
    f.backdate_trip(trip.id, 30).await;

    let options = SweepOptions {
        timeout_hours: 24,
        default_distance: 50,
        dry_run: true,
    };
    let preview = f.state.auto_end.run_sweep(options).await.unwrap();
    assert_eq!(preview.examined, 1);
    assert_eq!(preview.ended, 0);
    assert_eq!(preview.entries[0].end_odometer, Some(1050));
    assert_eq!(f.reload(&v).await.status, VehicleStatus::InUse);

    let report = f
        .state
        .auto_end
        .run_sweep(SweepOptions { dry_run: false, ..options })
        .await
        .unwrap();
    assert_eq!(report.ended, 1);
    assert_eq!(report.failed, 0);

    let ended = f.store.find_trip(trip.id).await.unwrap().unwrap();
    assert_eq!(ended.status, TripStatus::Completed);
    assert!(ended.auto_ended);
    assert_eq!(ended.end_odometer, Some(1050));
    assert_eq!(f.reload(&v).await.status, VehicleStatus::Available);

    let inbox = f.state.notifications.list_for_user(&f.driver, false).await.unwrap();
    assert!(inbox.iter().any(|n| n.text.contains("automatically ended due to inactivity")));
    let managers = f.state.notifications.list_for_user(&f.manager, false).await.unwrap();
    assert!(managers.iter().any(|n| n.text.contains("automatically ended")));

    let fresh = f.state.auto_end.run_sweep(SweepOptions { dry_run: false, ..options }).await.unwrap();
    assert_eq!(fresh.examined, 0);
}

#[tokio::test]
async fn test_sweep_reports_unestimable_trip_as_failed() {
    let f = fleet().await;
    let v = f.vehicle(1, MAX_ODOMETER_KM - 10).await;
    let trip = f
        .state
        .trips
        .start_trip(&f.driver, start(&v, MAX_ODOMETER_KM - 10))
        .await
        .unwrap();
    f.backdate_trip(trip.id, 48).await;

    let options = SweepOptions {
        timeout_hours: 24,
        default_distance: 50,
        dry_run: false,
    };
    let report = f.state.auto_end.run_sweep(options).await.unwrap();
    assert_eq!(report.examined, 1);
    assert_eq!(report.ended, 0);
    assert_eq!(report.failed, 1);

    let trip = f.store.find_trip(trip.id).await.unwrap().unwrap();
    assert_eq!(trip.status, TripStatus::Ongoing);
    assert_eq!(f.reload(&v).await.status, VehicleStatus::InUse);

    let preview = f.state.auto_end.run_sweep(SweepOptions { dry_run: true, ..options }).await.unwrap();
    assert_eq!(preview.entries[0].end_odometer, None);
}

#[tokio::test]
async fn test_sweep_rejects_non_positive_timeout() {
    let f = fleet().await;
    let result = f
        .state
        .auto_end
        .run_sweep(SweepOptions {
            timeout_hours: 0,
            default_distance: 50,
            dry_run: false,
        })
        .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sweep_and_driver_race_end_trip_once() {
    let f = fleet().await;
    let v = f.vehicle(1, 1000).await;
    let trip = f.state.trips.start_trip(&f.driver, start(&v, 1000)).await.unwrap();
    f.backdate_trip(trip.id, 48).await;

    let sweep = {
        let auto_end = f.state.auto_end.clone();
        tokio::spawn(async move {
            auto_end
                .run_sweep(SweepOptions {
                    timeout_hours: 24,
                    default_distance: 50,
                    dry_run: false,
                })
                .await
        })
    };
    let driver_end = {
        let trips = f.state.trips.clone();
        let driver = f.driver.clone();
        tokio::spawn(async move { trips.end_trip(&driver, trip.id, 1200, None).await })
    };

    let report = sweep.await.unwrap().unwrap();
    let driver_result = driver_end.await.unwrap();

    assert_eq!(report.failed, 0);
    match driver_result {
        Ok(_) => assert_eq!(report.ended, 0),
        Err(e) => {
            assert!(matches!(e, AppError::Lifecycle(LifecycleError::InvalidState(_))));
            assert_eq!(report.ended, 1);
        }
    }

    let trip = f.store.find_trip(trip.id).await.unwrap().unwrap();
    assert_eq!(trip.status, TripStatus::Completed);
    assert_eq!(f.reload(&v).await.status, VehicleStatus::Available);
}

#[tokio::test]
async fn test_data_quality_report_is_clean_after_lifecycle() {
    let f = fleet().await;
    let v1 = f.vehicle(1, 1000).await;
    let v2 = f.vehicle(2, 5000).await;
    let trip = f.state.trips.start_trip(&f.driver, start(&v1, 1000)).await.unwrap();
    f.state
        .maintenance
        .create(&f.manager, maintenance(v2.id, MaintenanceStatus::InProgress))
        .await
        .unwrap();
    f.state.trips.end_trip(&f.driver, trip.id, 1040, None).await.unwrap();

    let audit = f.state.reports.data_quality(&f.manager).await.unwrap();
    assert_eq!(audit.issues, 0, "{audit:?}");

    let status = f.state.reports.fleet_status(&f.manager).await.unwrap();
    assert_eq!(status.total_vehicles, 2);
    assert_eq!(status.vehicles_by_status["available"], 1);
    assert_eq!(status.vehicles_by_status["maintenance"], 1);
    assert_eq!(status.active_maintenance, 1);

    assert!(matches!(
        f.state.reports.fleet_status(&f.driver).await,
        Err(AppError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_data_quality_accepts_open_trip_on_grounded_vehicle() {
    let f = fleet().await;
    let v = f.vehicle(1, 1000).await;
    let trip = f.state.trips.start_trip(&f.driver, start(&v, 1000)).await.unwrap();
    f.state.accidents.report(&f.driver, accident(v.id)).await.unwrap();
    assert_eq!(f.reload(&v).await.status, VehicleStatus::Maintenance);

    let audit = f.state.reports.data_quality(&f.manager).await.unwrap();
    assert!(audit.ongoing_trips_on_idle_vehicles.is_empty());
    assert!(audit.status_drift.is_empty());
    assert_eq!(audit.issues, 0, "{audit:?}");

    // Un viaje abierto sobre un vehículo marcado disponible sí es una incidencia
    let mut tx = f.store.begin().await.unwrap();
    let mut stale = tx.lock_vehicle(v.id).await.unwrap().unwrap();
    let expected = stale.version;
    stale.status = VehicleStatus::Available;
    tx.save_vehicle(&stale, expected).await.unwrap();
    tx.commit().await.unwrap();

    let audit = f.state.reports.data_quality(&f.manager).await.unwrap();
    assert_eq!(audit.ongoing_trips_on_idle_vehicles, vec![trip.id]);
    assert_eq!(audit.status_drift.len(), 1);
}
