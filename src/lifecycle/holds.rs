//! Retenciones (holds) sobre un vehículo
//!
//! La disponibilidad de un vehículo no se escribe: se deriva del conjunto de
//! retenciones activas (viaje abierto, mantenimiento en curso, accidente sin
//! resolver que inmoviliza el vehículo) y se recalcula en cada cambio.

use std::collections::BTreeSet;

use serde::Serialize;
use uuid::Uuid;

use crate::models::VehicleStatus;

/// Razón activa por la que un vehículo no está disponible
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Hold {
    Trip(Uuid),
    Maintenance(Uuid),
    Accident(Uuid),
}

impl Hold {
    /// Mantenimientos y accidentes sacan el vehículo de servicio
    fn grounds(&self) -> bool {
        matches!(self, Hold::Maintenance(_) | Hold::Accident(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VehicleHolds {
    holds: BTreeSet<Hold>,
}

impl VehicleHolds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_holds(holds: impl IntoIterator<Item = Hold>) -> Self {
        Self {
            holds: holds.into_iter().collect(),
        }
    }

    pub fn acquire(&mut self, hold: Hold) -> bool {
        self.holds.insert(hold)
    }

    pub fn release(&mut self, hold: &Hold) -> bool {
        self.holds.remove(hold)
    }

    pub fn contains(&self, hold: &Hold) -> bool {
        self.holds.contains(hold)
    }

    pub fn is_empty(&self) -> bool {
        self.holds.is_empty()
    }

    pub fn len(&self) -> usize {
        self.holds.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hold> {
        self.holds.iter()
    }

    pub fn open_trips(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.holds.iter().filter_map(|hold| match hold {
            Hold::Trip(id) => Some(*id),
            _ => None,
        })
    }

    pub fn has_open_trip(&self) -> bool {
        self.open_trips().next().is_some()
    }

    pub fn is_grounded(&self) -> bool {
        self.holds.iter().any(Hold::grounds)
    }
}

/// Estado derivado: retirado es terminal; luego mantenimiento, luego en uso
pub fn derive_status(retired: bool, holds: &VehicleHolds) -> VehicleStatus {
    if retired {
        VehicleStatus::Retired
    } else if holds.is_grounded() {
        VehicleStatus::Maintenance
    } else if holds.has_open_trip() {
        VehicleStatus::InUse
    } else {
        VehicleStatus::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_holds_is_available() {
        assert_eq!(derive_status(false, &VehicleHolds::new()), VehicleStatus::Available);
    }

    #[test]
    fn test_trip_hold_is_in_use() {
        let holds = VehicleHolds::from_holds([Hold::Trip(Uuid::new_v4())]);
        assert_eq!(derive_status(false, &holds), VehicleStatus::InUse);
    }

    #[test]
    fn test_grounding_hold_wins_over_trip() {
        let holds = VehicleHolds::from_holds([
            Hold::Trip(Uuid::new_v4()),
            Hold::Accident(Uuid::new_v4()),
        ]);
        assert_eq!(derive_status(false, &holds), VehicleStatus::Maintenance);
    }

    #[test]
    fn test_retired_ignores_holds() {
        let holds = VehicleHolds::from_holds([Hold::Maintenance(Uuid::new_v4())]);
        assert_eq!(derive_status(true, &holds), VehicleStatus::Retired);
    }

    #[test]
    fn test_release_only_removes_matching_hold() {
        let a1 = Uuid::new_v4();
        let a2 = Uuid::new_v4();
        let mut holds = VehicleHolds::from_holds([Hold::Accident(a1), Hold::Accident(a2)]);

        assert!(holds.release(&Hold::Accident(a1)));
        assert!(!holds.release(&Hold::Accident(a1)));
        assert_eq!(derive_status(false, &holds), VehicleStatus::Maintenance);

        holds.release(&Hold::Accident(a2));
        assert_eq!(derive_status(false, &holds), VehicleStatus::Available);
    }
}
