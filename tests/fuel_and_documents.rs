mod common;

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;

use common::{fleet, start, user};
use fleet_management::lifecycle::LifecycleError;
use fleet_management::models::{ApprovalStatus, DocumentFilters, FuelFilters, NewDocument, UserType, Vehicle};
use fleet_management::services::{DocumentUpdate, RecordFuel};
use fleet_management::utils::errors::AppError;

fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

fn refuel(vehicle: &Vehicle, odometer_reading: i64) -> RecordFuel {
    RecordFuel {
        vehicle_id: vehicle.id,
        driver_id: None,
        date: None,
        fuel_type: None,
        quantity: Some(dec("40")),
        cost_per_liter: Some(dec("1.25")),
        energy_consumed: None,
        cost_per_kwh: None,
        total_cost: None,
        odometer_reading,
        station_name: Some("Depot pump".to_string()),
        notes: String::new(),
    }
}

fn document(vehicle: &Vehicle, number: &str, expiry_date: NaiveDate) -> NewDocument {
    NewDocument {
        vehicle_id: vehicle.id,
        document_type: "Insurance Policy".to_string(),
        document_number: number.to_string(),
        issue_date: expiry_date - Duration::days(365),
        expiry_date,
        issuing_authority: Some("National Insurance".to_string()),
        notes: String::new(),
    }
}

#[tokio::test]
async fn test_fuel_reading_cannot_pass_vehicle_odometer() {
    let f = fleet().await;
    let v = f.vehicle(1, 1000).await;

    let ahead = f.state.fuel.record(&f.driver, refuel(&v, 1200)).await;
    assert!(matches!(
        ahead,
        Err(AppError::Lifecycle(LifecycleError::OdometerOutOfRange {
            reading: 1200,
            maximum: 1000
        }))
    ));

    let trip = f.state.trips.start_trip(&f.driver, start(&v, 1000)).await.unwrap();
    f.state.trips.end_trip(&f.driver, trip.id, 1250, None).await.unwrap();

    let recorded = f.state.fuel.record(&f.driver, refuel(&v, 1200)).await.unwrap();
    assert_eq!(recorded.total_cost, dec("50.00"));
    assert_eq!(recorded.fuel_type, "Diesel");
    assert_eq!(recorded.driver_id, f.driver.id);
    assert_eq!(recorded.date, Utc::now().date_naive());
    assert_eq!(f.reload(&v).await.current_odometer, 1250);
}

#[tokio::test]
async fn test_fuel_total_cost_required_when_not_derivable() {
    let f = fleet().await;
    let v = f.vehicle(1, 1000).await;

    let mut missing = refuel(&v, 900);
    missing.cost_per_liter = None;
    let result = f.state.fuel.record(&f.driver, missing.clone()).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    missing.total_cost = Some(dec("61.30"));
    let recorded = f.state.fuel.record(&f.driver, missing).await.unwrap();
    assert_eq!(recorded.total_cost, dec("61.30"));
}

#[tokio::test]
async fn test_drivers_only_record_and_see_their_own_fuel() {
    let f = fleet().await;
    let v = f.vehicle(1, 1000).await;
    let other = user("10077", UserType::Driver, ApprovalStatus::Approved);
    common::insert_user(&f.store, &other).await;

    let mut for_other = refuel(&v, 950);
    for_other.driver_id = Some(other.id);
    assert!(matches!(
        f.state.fuel.record(&f.driver, for_other.clone()).await,
        Err(AppError::Forbidden(_))
    ));
    let theirs = f.state.fuel.record(&f.manager, for_other).await.unwrap();
    let mine = f.state.fuel.record(&f.driver, refuel(&v, 990)).await.unwrap();

    let listed = f.state.fuel.list(&f.driver, FuelFilters::default()).await.unwrap();
    assert_eq!(listed.iter().map(|t| t.id).collect::<Vec<_>>(), vec![mine.id]);
    assert!(matches!(
        f.state.fuel.get(&f.driver, theirs.id).await,
        Err(AppError::Forbidden(_))
    ));
    assert_eq!(f.state.fuel.list(&f.manager, FuelFilters::default()).await.unwrap().len(), 2);

    let pending = user("10099", UserType::Driver, ApprovalStatus::Pending);
    common::insert_user(&f.store, &pending).await;
    assert!(matches!(
        f.state.fuel.record(&pending, refuel(&v, 990)).await,
        Err(AppError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_expiring_documents_feed_fleet_status() {
    let f = fleet().await;
    let v = f.vehicle(1, 1000).await;
    let today = Utc::now().date_naive();

    let expired = f
        .state
        .documents
        .create(&f.manager, document(&v, "POL-1", today - Duration::days(3)))
        .await
        .unwrap();
    let soon = f
        .state
        .documents
        .create(&f.manager, document(&v, "POL-2", today + Duration::days(10)))
        .await
        .unwrap();
    f.state
        .documents
        .create(&f.manager, document(&v, "POL-3", today + Duration::days(200)))
        .await
        .unwrap();

    let expiring = f.state.documents.expiring(today, 30).await.unwrap();
    assert_eq!(expiring.iter().map(|d| d.id).collect::<Vec<_>>(), vec![expired.id, soon.id]);
    assert_eq!(f.state.documents.expiring(today, 365).await.unwrap().len(), 3);
    assert!(matches!(
        f.state.documents.expiring(today, -1).await,
        Err(AppError::BadRequest(_))
    ));

    let status = f.state.reports.fleet_status(&f.manager).await.unwrap();
    assert_eq!(status.expired_documents, 1);
    assert_eq!(status.documents_expiring_soon, 1);

    // Renovar la póliza caducada la saca del aviso
    f.state
        .documents
        .update(
            &f.manager,
            expired.id,
            DocumentUpdate {
                document_number: None,
                issue_date: None,
                expiry_date: Some(today + Duration::days(365)),
                issuing_authority: None,
                notes: Some("Renewed".to_string()),
            },
        )
        .await
        .unwrap();
    let status = f.state.reports.fleet_status(&f.manager).await.unwrap();
    assert_eq!(status.expired_documents, 0);
    assert_eq!(status.documents_expiring_soon, 1);
}

#[tokio::test]
async fn test_document_rules() {
    let f = fleet().await;
    let v = f.vehicle(1, 1000).await;
    let today = Utc::now().date_naive();

    assert!(matches!(
        f.state.documents.create(&f.driver, document(&v, "RC-1", today)).await,
        Err(AppError::Forbidden(_))
    ));

    let mut backwards = document(&v, "RC-1", today);
    backwards.issue_date = today + Duration::days(1);
    assert!(matches!(
        f.state.documents.create(&f.manager, backwards).await,
        Err(AppError::BadRequest(_))
    ));

    let created = f.state.documents.create(&f.manager, document(&v, "RC-1", today)).await.unwrap();
    assert!(matches!(
        f.state.documents.create(&f.manager, document(&v, "RC-1", today)).await,
        Err(AppError::Conflict(_))
    ));

    let shortened = f
        .state
        .documents
        .update(
            &f.manager,
            created.id,
            DocumentUpdate {
                document_number: None,
                issue_date: None,
                expiry_date: Some(created.issue_date - Duration::days(1)),
                issuing_authority: None,
                notes: None,
            },
        )
        .await;
    assert!(matches!(shortened, Err(AppError::BadRequest(_))));
    assert_eq!(f.state.documents.get(created.id).await.unwrap().expiry_date, today);

    let filters = DocumentFilters {
        vehicle_id: Some(v.id),
        document_type: Some("insurance policy".to_string()),
    };
    assert_eq!(f.state.documents.list(&filters).await.unwrap().len(), 1);
}
