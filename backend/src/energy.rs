//! Physics model for EV trip consumption.
//!
//! Energy is the sum of three loads over the trip (rolling resistance,
//! aerodynamic drag, climbing) minus the potential energy recovered on
//! descents, divided by motor efficiency:
//!
//! ```text
//! rolling  = m * g * Crr * d
//! drag     = 0.5 * rho * Cd * A * v^2 * d
//! climb    = m * g * gain
//! regen    = m * g * loss * eta_regen
//! total    = max(0, (rolling + drag + climb - regen) / eta_motor)
//! ```
//!
//! Regenerated energy beyond the trip's own consumption is not credited back
//! to the battery; the total is clamped at zero.

use serde::{Deserialize, Serialize};

use crate::error::PlanningError;
use crate::models::{EfficiencyRating, ElevationPoint, EnergyBreakdown};

pub const JOULES_PER_KWH: f64 = 3.6e6;

/// Vehicle and environment constants used by the consumption model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VehicleProfile {
    pub mass_kg: f64,
    pub gravity: f64,
    pub rolling_resistance: f64,
    pub air_density: f64,
    pub drag_coefficient: f64,
    pub frontal_area_m2: f64,
    pub motor_efficiency: f64,
    pub regen_efficiency: f64,
    pub average_speed_kmh: f64,
    pub battery_capacity_kwh: f64,
}

impl Default for VehicleProfile {
    /// Mid-size EV driven at campus speed.
    fn default() -> Self {
        Self {
            mass_kg: 1800.0,
            gravity: 9.81,
            rolling_resistance: 0.01,
            air_density: 1.225,
            drag_coefficient: 0.28,
            frontal_area_m2: 2.3,
            motor_efficiency: 0.90,
            regen_efficiency: 0.70,
            average_speed_kmh: 40.0,
            battery_capacity_kwh: 60.0,
        }
    }
}

impl VehicleProfile {
    /// Rejects profiles the model cannot divide by.
    pub fn validate(&self) -> Result<(), PlanningError> {
        let positive = [
            ("motor efficiency", self.motor_efficiency),
            ("average speed", self.average_speed_kmh),
            ("battery capacity", self.battery_capacity_kwh),
        ];
        for (field, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(PlanningError::InvalidParameter(format!(
                    "{field} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }

    fn average_speed_ms(&self) -> f64 {
        self.average_speed_kmh * 1000.0 / 3600.0
    }

    fn weight_n(&self) -> f64 {
        self.mass_kg * self.gravity
    }
}

/// Energy breakdown for a trip of `distance_m` meters with the given
/// cumulative elevation gain and loss (meters).
pub fn consumption(
    distance_m: f64,
    elevation_gain: f64,
    elevation_loss: f64,
    profile: &VehicleProfile,
) -> EnergyBreakdown {
    let distance_km = distance_m / 1000.0;
    let speed = profile.average_speed_ms();

    let rolling = profile.weight_n() * profile.rolling_resistance * distance_m;
    let drag = 0.5
        * profile.air_density
        * profile.drag_coefficient
        * profile.frontal_area_m2
        * speed.powi(2)
        * distance_m;
    let climb = profile.weight_n() * elevation_gain;
    let recovered = profile.weight_n() * elevation_loss * profile.regen_efficiency;

    let total_joules = (rolling + drag + climb - recovered) / profile.motor_efficiency;

    let estimated_time = if profile.average_speed_kmh > 0.0 {
        distance_km / profile.average_speed_kmh * 60.0
    } else {
        0.0
    };

    EnergyBreakdown {
        total_energy: (total_joules / JOULES_PER_KWH).max(0.0),
        rolling_resistance: rolling / JOULES_PER_KWH,
        air_resistance: drag / JOULES_PER_KWH,
        uphill_energy: climb / JOULES_PER_KWH,
        regenerated_energy: recovered / JOULES_PER_KWH,
        distance_km,
        estimated_time,
    }
}

/// Cumulative ascent and descent along an elevation profile, in meters.
pub fn elevation_changes(profile: &[ElevationPoint]) -> (f64, f64) {
    profile
        .windows(2)
        .map(|w| w[1].elevation - w[0].elevation)
        .fold((0.0, 0.0), |(gain, loss), diff| {
            if diff > 0.0 {
                (gain + diff, loss)
            } else {
                (gain, loss + diff.abs())
            }
        })
}

/// Terrain rating from the average climbing gradient (percent).
pub fn efficiency_rating(elevation_gain: f64, distance_m: f64) -> EfficiencyRating {
    let gradient = if distance_m > 0.0 {
        elevation_gain / distance_m * 100.0
    } else {
        0.0
    };

    let (rating, color, efficiency) = match gradient {
        g if g < 2.0 => ("Excellent", "green", 95),
        g if g < 4.0 => ("Good", "lime", 85),
        g if g < 6.0 => ("Moderate", "yellow", 75),
        g if g < 8.0 => ("Poor", "orange", 65),
        _ => ("Very Poor", "red", 55),
    };

    EfficiencyRating {
        rating: rating.into(),
        color: color.into(),
        efficiency,
    }
}

/// Synthetic profile between two known elevations, used when no lookup is
/// available. Adds a +/-5 m undulation on top of the linear trend.
pub fn synthetic_profile(
    start_elevation: f64,
    end_elevation: f64,
    distance_m: f64,
    points: usize,
) -> Vec<ElevationPoint> {
    let points = points.max(1);
    let change = end_elevation - start_elevation;

    (0..=points)
        .map(|i| {
            let progress = i as f64 / points as f64;
            let variation = (progress * std::f64::consts::PI * 3.0).sin() * 5.0;
            ElevationPoint {
                distance: distance_m * progress / 1000.0,
                elevation: start_elevation + change * progress + variation,
                lat: 0.0,
                lng: 0.0,
            }
        })
        .collect()
}
