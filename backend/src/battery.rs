use crate::error::PlanningError;
use crate::models::{ChargingInterval, ChargingPlan, ChargingSchedule};

/// Level 2 AC charger.
pub const DEFAULT_CHARGER_POWER_KW: f64 = 7.4;
pub const MIN_BATTERY_THRESHOLD: f64 = 20.0;
pub const CHARGE_TARGET: f64 = 80.0;

/// Battery percentage left after consuming `energy_consumed_kwh`, never below zero.
pub fn remaining_battery(current_pct: f64, energy_consumed_kwh: f64, capacity_kwh: f64) -> f64 {
    let used_pct = energy_consumed_kwh / capacity_kwh * 100.0;
    (current_pct - used_pct).max(0.0)
}

/// Time and energy to charge from `current_pct` to `target_pct`.
pub fn charging_time(
    current_pct: f64,
    target_pct: f64,
    charger_power_kw: f64,
    capacity_kwh: f64,
) -> Result<ChargingPlan, PlanningError> {
    if target_pct < current_pct {
        return Err(PlanningError::InvalidRange {
            current: current_pct,
            target: target_pct,
        });
    }
    if charger_power_kw <= 0.0 || !charger_power_kw.is_finite() {
        return Err(PlanningError::InvalidParameter(format!(
            "charger power must be positive, got {charger_power_kw} kW"
        )));
    }

    let energy_needed = (target_pct - current_pct) / 100.0 * capacity_kwh;
    let hours = energy_needed / charger_power_kw;

    Ok(ChargingPlan {
        hours: hours.floor() as u32,
        minutes: (hours.fract() * 60.0).round() as u32,
        total_minutes: (hours * 60.0).round() as u32,
        energy_needed,
    })
}

/// Walks a day of trips and schedules a top-up before any trip that would
/// leave the battery below [`MIN_BATTERY_THRESHOLD`].
pub fn charging_intervals(
    trip_energies_kwh: &[f64],
    initial_pct: f64,
    charger_power_kw: f64,
    capacity_kwh: f64,
) -> Result<ChargingSchedule, PlanningError> {
    let mut intervals = Vec::new();
    let mut current = initial_pct;

    for (index, &energy) in trip_energies_kwh.iter().enumerate() {
        let after_trip = remaining_battery(current, energy, capacity_kwh);

        if after_trip < MIN_BATTERY_THRESHOLD && current < CHARGE_TARGET {
            let plan = charging_time(current, CHARGE_TARGET, charger_power_kw, capacity_kwh)?;
            tracing::debug!(
                "scheduling charge before trip {}: {:.1}% -> {:.0}%",
                index + 1,
                current,
                CHARGE_TARGET
            );
            intervals.push(ChargingInterval {
                before_trip: index + 1,
                current_battery: current,
                charge_to: CHARGE_TARGET,
                charging_time: plan,
                reason: format!(
                    "Battery would drop to {:.1}% after trip {}",
                    after_trip,
                    index + 1
                ),
            });
            current = CHARGE_TARGET;
        }

        current = remaining_battery(current, energy, capacity_kwh);
    }

    Ok(ChargingSchedule {
        intervals,
        final_battery: current,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_battery_subtracts_percentage() {
        assert!((remaining_battery(80.0, 6.0, 60.0) - 70.0).abs() < 1e-9);
        assert_eq!(remaining_battery(5.0, 30.0, 60.0), 0.0);
    }

    #[test]
    fn charging_time_splits_hours_and_minutes() {
        let plan = charging_time(20.0, 80.0, 7.4, 60.0).unwrap();
        // 36 kWh at 7.4 kW = 4.8649 h
        assert!((plan.energy_needed - 36.0).abs() < 1e-9);
        assert_eq!(plan.hours, 4);
        assert_eq!(plan.minutes, 52);
        assert_eq!(plan.total_minutes, 292);
    }

    #[test]
    fn charging_time_equal_levels_is_zero() {
        let plan = charging_time(50.0, 50.0, 7.4, 60.0).unwrap();
        assert_eq!(plan.hours, 0);
        assert_eq!(plan.minutes, 0);
        assert_eq!(plan.energy_needed, 0.0);
    }

    #[test]
    fn charging_time_rejects_discharge() {
        let err = charging_time(80.0, 20.0, 7.4, 60.0).unwrap_err();
        assert_eq!(
            err,
            PlanningError::InvalidRange {
                current: 80.0,
                target: 20.0
            }
        );
    }

    #[test]
    fn charging_time_rejects_zero_power() {
        assert!(matches!(
            charging_time(20.0, 80.0, 0.0, 60.0),
            Err(PlanningError::InvalidParameter(_))
        ));
    }

    #[test]
    fn intervals_charge_before_depleting_trip() {
        // 12 kWh per trip = 20% of a 60 kWh pack.
        let trips = [12.0, 12.0, 12.0, 12.0];
        let schedule = charging_intervals(&trips, 80.0, 7.4, 60.0).unwrap();

        // 80 -> 60 -> 40 -> 20, then trip 4 would leave 0%.
        assert_eq!(schedule.intervals.len(), 1);
        let interval = &schedule.intervals[0];
        assert_eq!(interval.before_trip, 4);
        assert!((interval.current_battery - 20.0).abs() < 1e-9);
        assert!((schedule.final_battery - 60.0).abs() < 1e-9);
    }

    #[test]
    fn intervals_empty_day_keeps_battery() {
        let schedule = charging_intervals(&[], 55.0, 7.4, 60.0).unwrap();
        assert!(schedule.intervals.is_empty());
        assert_eq!(schedule.final_battery, 55.0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_remaining_within_bounds(
                current in 0.0..=100.0f64,
                consumed in 0.0..100.0f64,
                capacity in 1.0..150.0f64,
            ) {
                let left = remaining_battery(current, consumed, capacity);
                prop_assert!(left >= 0.0);
                prop_assert!(left <= current);
            }

            #[test]
            fn prop_charging_energy_non_negative(
                current in 0.0..=100.0f64,
                delta in 0.0..=100.0f64,
                power in 0.5..350.0f64,
            ) {
                let plan = charging_time(current, current + delta, power, 60.0).unwrap();
                prop_assert!(plan.energy_needed >= 0.0);
                prop_assert!(plan.minutes <= 60);
            }
        }
    }
}
