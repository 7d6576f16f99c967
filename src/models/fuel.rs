//! Modelo de FuelTransaction
//!
//! Repostajes y cargas. Mapea a `fuel_transactions`. Los vehículos
//! eléctricos registran kWh y precio por kWh; el resto, litros y precio
//! por litro.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

pub const ELECTRIC_FUEL_TYPE: &str = "Electric";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct FuelTransaction {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub date: NaiveDate,
    pub fuel_type: String,
    /// Litros
    pub quantity: Option<Decimal>,
    pub cost_per_liter: Option<Decimal>,
    /// kWh
    pub energy_consumed: Option<Decimal>,
    pub cost_per_kwh: Option<Decimal>,
    pub total_cost: Decimal,
    pub odometer_reading: i64,
    pub station_name: Option<String>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFuelTransaction {
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub date: NaiveDate,
    pub fuel_type: Option<String>,
    pub quantity: Option<Decimal>,
    pub cost_per_liter: Option<Decimal>,
    pub energy_consumed: Option<Decimal>,
    pub cost_per_kwh: Option<Decimal>,
    /// Si falta o no es positivo se deriva de cantidad × precio unitario
    pub total_cost: Option<Decimal>,
    pub odometer_reading: i64,
    pub station_name: Option<String>,
    pub notes: String,
}

impl NewFuelTransaction {
    /// Coste total declarado o, si no lo hay, el derivado de la cantidad
    /// y el precio unitario que correspondan al tipo de vehículo.
    /// `None` si no hay forma de calcularlo.
    pub fn resolve_total_cost(&self, electric: bool) -> Option<Decimal> {
        if let Some(total) = self.total_cost.filter(|t| *t > Decimal::ZERO) {
            return Some(total);
        }
        let (amount, unit_price) = if electric {
            (self.energy_consumed, self.cost_per_kwh)
        } else {
            (self.quantity, self.cost_per_liter)
        };
        amount?.checked_mul(unit_price?).map(|total| total.round_dp(2))
    }
}

impl FuelTransaction {
    pub fn is_electric(&self) -> bool {
        self.fuel_type.eq_ignore_ascii_case(ELECTRIC_FUEL_TYPE)
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct FuelFilters {
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
}
