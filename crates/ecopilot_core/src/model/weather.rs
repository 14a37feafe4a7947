//! Weather model and plant-care derivations.
//!
//! # Responsibility
//! - Define the weather snapshot shape consumed from providers.
//! - Derive care level, watering multiplier and plant weather alerts.
//!
//! # Invariants
//! - Derivations are pure; the same snapshot always yields the same advice.
//! - Thresholds are in °C and % relative humidity.

use serde::{Deserialize, Serialize};

/// Current weather as reported by a provider or fallback table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    /// Localized human-readable description.
    pub description: String,
    pub wind_speed_kmh: f64,
    pub city: String,
    pub country: String,
    /// True when the snapshot comes from fallback data, not a live provider.
    pub is_mock: bool,
    /// Observation time, epoch milliseconds.
    pub timestamp_ms: i64,
}

/// Plant-care intensity implied by current weather.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareLevel {
    /// Cold conditions, reduce watering.
    Low,
    /// Nothing special, keep the routine.
    Normal,
    /// High humidity, watch ventilation.
    Medium,
    /// Hot and dry, increase watering and humidity.
    High,
    /// Ideal indoor conditions.
    Perfect,
}

/// Derived plant advice attached to a weather snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherAdvice {
    pub care_level: CareLevel,
    /// Scales watering need; >1.0 waters more often, <1.0 less.
    pub watering_multiplier: f64,
    pub ideal_for_plants: bool,
}

/// Category of a plant weather alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherAlertKind {
    Heat,
    Cold,
    DryAir,
}

/// Alert urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Medium,
    High,
}

/// One plant protection alert derived from weather.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherAlert {
    pub kind: WeatherAlertKind,
    pub severity: AlertSeverity,
}

/// Care level for the given conditions.
///
/// Rule order matters: hot-and-dry wins over humid, cold wins over ideal.
pub fn care_level_for(temperature_c: f64, humidity_pct: f64) -> CareLevel {
    if temperature_c > 25.0 && humidity_pct < 50.0 {
        CareLevel::High
    } else if temperature_c < 15.0 {
        CareLevel::Low
    } else if humidity_pct > 70.0 {
        CareLevel::Medium
    } else if (18.0..=24.0).contains(&temperature_c) && (40.0..=60.0).contains(&humidity_pct) {
        CareLevel::Perfect
    } else {
        CareLevel::Normal
    }
}

/// Watering multiplier for the given conditions.
pub fn watering_multiplier_for(temperature_c: f64, humidity_pct: f64) -> f64 {
    if temperature_c > 25.0 && humidity_pct < 50.0 {
        1.3
    } else if temperature_c < 15.0 {
        0.7
    } else if humidity_pct > 70.0 {
        0.8
    } else {
        1.0
    }
}

impl WeatherSnapshot {
    /// Derives the full advice block for this snapshot.
    pub fn advice(&self) -> WeatherAdvice {
        let care_level = care_level_for(self.temperature_c, self.humidity_pct);
        WeatherAdvice {
            care_level,
            watering_multiplier: watering_multiplier_for(self.temperature_c, self.humidity_pct),
            ideal_for_plants: care_level == CareLevel::Perfect,
        }
    }

    /// Plant protection alerts for extreme conditions.
    pub fn plant_alerts(&self) -> Vec<WeatherAlert> {
        let mut alerts = Vec::new();
        if self.temperature_c > 30.0 {
            alerts.push(WeatherAlert {
                kind: WeatherAlertKind::Heat,
                severity: AlertSeverity::High,
            });
        }
        if self.temperature_c < 10.0 {
            alerts.push(WeatherAlert {
                kind: WeatherAlertKind::Cold,
                severity: AlertSeverity::Medium,
            });
        }
        if self.humidity_pct < 30.0 {
            alerts.push(WeatherAlert {
                kind: WeatherAlertKind::DryAir,
                severity: AlertSeverity::Medium,
            });
        }
        alerts
    }
}

#[cfg(test)]
mod tests {
    use super::{
        care_level_for, watering_multiplier_for, AlertSeverity, CareLevel, WeatherAlertKind,
        WeatherSnapshot,
    };

    fn snapshot(temperature_c: f64, humidity_pct: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            temperature_c,
            humidity_pct,
            description: "test".to_string(),
            wind_speed_kmh: 5.0,
            city: "Ottawa".to_string(),
            country: "CA".to_string(),
            is_mock: true,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn hot_and_dry_means_high_care_and_more_water() {
        assert_eq!(care_level_for(28.0, 40.0), CareLevel::High);
        assert_eq!(watering_multiplier_for(28.0, 40.0), 1.3);
    }

    #[test]
    fn cold_means_low_care_and_less_water() {
        assert_eq!(care_level_for(10.0, 55.0), CareLevel::Low);
        assert_eq!(watering_multiplier_for(10.0, 55.0), 0.7);
    }

    #[test]
    fn humid_means_medium_care() {
        assert_eq!(care_level_for(20.0, 80.0), CareLevel::Medium);
        assert_eq!(watering_multiplier_for(20.0, 80.0), 0.8);
    }

    #[test]
    fn ideal_window_is_perfect() {
        let advice = snapshot(21.0, 50.0).advice();
        assert_eq!(advice.care_level, CareLevel::Perfect);
        assert!(advice.ideal_for_plants);
        assert_eq!(advice.watering_multiplier, 1.0);
    }

    #[test]
    fn everything_else_is_normal() {
        assert_eq!(care_level_for(16.0, 35.0), CareLevel::Normal);
        assert_eq!(watering_multiplier_for(16.0, 35.0), 1.0);
    }

    #[test]
    fn extreme_conditions_produce_alerts() {
        let alerts = snapshot(32.0, 25.0).plant_alerts();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].kind, WeatherAlertKind::Heat);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
        assert_eq!(alerts[1].kind, WeatherAlertKind::DryAir);

        let cold = snapshot(5.0, 45.0).plant_alerts();
        assert_eq!(cold.len(), 1);
        assert_eq!(cold[0].kind, WeatherAlertKind::Cold);

        assert!(snapshot(20.0, 50.0).plant_alerts().is_empty());
    }
}
