//! Tuning configuration.
//!
//! Every field has a default taken from the shipped game, so a partial JSON
//! document only needs to name the values it overrides:
//!
//! ```
//! use frogcafe_logic::config::CafeConfig;
//!
//! let config = CafeConfig::from_json(r#"{ "patience": 5.0, "spawn": { "max_active": 3 } }"#).unwrap();
//! assert_eq!(config.patience, 5.0);
//! assert_eq!(config.spawn.max_active, 3);
//! assert_eq!(config.spawn.interval, 4.0);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading configuration or level data.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("unexpected character {ch:?} in layout row {row}, column {column}")]
    MalformedLayout { row: usize, column: usize, ch: char },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be finite and non-negative"))
    }
}

fn probability(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, "must be within 0..=1"))
    }
}

/// Probabilities used when rolling a customer's order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderChances {
    pub milk_chance: f32,
    pub honey_chance: f32,
    /// Only rolled for glass orders.
    pub ice_chance: f32,
}

impl Default for OrderChances {
    fn default() -> Self {
        Self {
            milk_chance: 0.35,
            honey_chance: 0.25,
            ice_chance: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Seconds between spawn attempts.
    pub interval: f32,
    /// Cap on simultaneously active customers.
    pub max_active: usize,
    /// Customer entities allocated up front and recycled.
    pub pool_size: usize,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            interval: 4.0,
            max_active: 6,
            pool_size: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DayConfig {
    /// Customers to serve on each day; its length is the number of days.
    pub customers_per_day: Vec<u32>,
    /// Per-day timer in seconds. Running out fails the run.
    pub day_length: f32,
}

impl Default for DayConfig {
    fn default() -> Self {
        Self {
            customers_per_day: vec![5, 7, 10],
            day_length: 60.0,
        }
    }
}

/// All simulation tuning values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CafeConfig {
    /// Walking speed in world units per second.
    pub customer_speed: f32,
    /// Distance at which a waypoint counts as reached.
    pub arrive_threshold: f32,
    /// Seated patience countdown in seconds.
    pub patience: f32,
    /// Delay between a normal serve and the customer leaving.
    pub served_linger: f32,
    /// Seconds between retries while a cell reservation is blocked.
    pub reserve_retry_interval: f32,
    /// Chance to replan around the blocker at each retry.
    pub replan_chance: f64,
    /// Seconds between retries of an unreachable destination.
    pub repath_interval: f32,
    /// Unreachable retries before falling back to a direct move.
    pub max_repath_attempts: u32,
    /// Distance from the counter point that counts as "at the counter".
    pub counter_tolerance: f32,
    /// Length of the first leg when walking from the queue to a seat.
    pub seat_forward_step: f32,
    /// Lateral offset per pair of queue ranks on that first leg.
    pub seat_lateral_spacing: f32,
    /// Spacing of computed queue positions when no queue points exist.
    pub fallback_queue_spacing: f32,
    pub spawn: SpawnConfig,
    pub days: DayConfig,
    pub orders: OrderChances,
}

impl Default for CafeConfig {
    fn default() -> Self {
        Self {
            customer_speed: 2.0,
            arrive_threshold: 0.06,
            patience: 8.0,
            served_linger: 0.6,
            reserve_retry_interval: 0.25,
            replan_chance: 0.25,
            repath_interval: 0.5,
            max_repath_attempts: 3,
            counter_tolerance: 0.08,
            seat_forward_step: 0.6,
            seat_lateral_spacing: 0.35,
            fallback_queue_spacing: 0.6,
            spawn: SpawnConfig::default(),
            days: DayConfig::default(),
            orders: OrderChances::default(),
        }
    }
}

impl CafeConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.customer_speed <= 0.0 {
            return Err(invalid("customer_speed", "must be positive"));
        }
        if self.arrive_threshold <= 0.0 {
            return Err(invalid("arrive_threshold", "must be positive"));
        }
        if self.patience <= 0.0 {
            return Err(invalid("patience", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.replan_chance) {
            return Err(invalid("replan_chance", "must be within 0..=1"));
        }
        non_negative("served_linger", self.served_linger)?;
        non_negative("reserve_retry_interval", self.reserve_retry_interval)?;
        non_negative("repath_interval", self.repath_interval)?;
        non_negative("counter_tolerance", self.counter_tolerance)?;
        non_negative("seat_forward_step", self.seat_forward_step)?;
        non_negative("seat_lateral_spacing", self.seat_lateral_spacing)?;
        non_negative("fallback_queue_spacing", self.fallback_queue_spacing)?;
        probability("orders.milk_chance", self.orders.milk_chance)?;
        probability("orders.honey_chance", self.orders.honey_chance)?;
        probability("orders.ice_chance", self.orders.ice_chance)?;

        if self.spawn.interval <= 0.0 {
            return Err(invalid("spawn.interval", "must be positive"));
        }
        if self.spawn.pool_size == 0 {
            return Err(invalid("spawn.pool_size", "must be at least 1"));
        }
        if self.spawn.max_active == 0 {
            return Err(invalid("spawn.max_active", "must be at least 1"));
        }
        if self.days.customers_per_day.is_empty() {
            return Err(invalid("days.customers_per_day", "needs at least one day"));
        }
        if let Some(day) = self.days.customers_per_day.iter().position(|n| *n == 0) {
            return Err(invalid(
                "days.customers_per_day",
                format!("day {} requires zero customers", day + 1),
            ));
        }
        if self.days.day_length <= 0.0 {
            return Err(invalid("days.day_length", "must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CafeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.days.customers_per_day, vec![5, 7, 10]);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CafeConfig::from_json(r#"{ "days": { "day_length": 90.0 } }"#).unwrap();
        assert_eq!(config.days.day_length, 90.0);
        assert_eq!(config.days.customers_per_day, vec![5, 7, 10]);
        assert_eq!(config.customer_speed, 2.0);
    }

    #[test]
    fn test_rejects_empty_days() {
        let err = CafeConfig::from_json(r#"{ "days": { "customers_per_day": [] } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "days.customers_per_day",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_zero_quota_day() {
        let err = CafeConfig::from_json(r#"{ "days": { "customers_per_day": [3, 0] } }"#).unwrap_err();
        assert!(err.to_string().contains("day 2"));
    }

    #[test]
    fn test_rejects_out_of_range_tuning() {
        let cases = [
            (r#"{ "orders": { "milk_chance": 1.5 } }"#, "orders.milk_chance"),
            (r#"{ "orders": { "ice_chance": -0.1 } }"#, "orders.ice_chance"),
            (r#"{ "served_linger": -1.0 }"#, "served_linger"),
            (r#"{ "reserve_retry_interval": -0.25 }"#, "reserve_retry_interval"),
            (r#"{ "repath_interval": -0.5 }"#, "repath_interval"),
            (r#"{ "fallback_queue_spacing": -0.6 }"#, "fallback_queue_spacing"),
            (r#"{ "spawn": { "max_active": 0 } }"#, "spawn.max_active"),
        ];
        for (json, expected) in cases {
            match CafeConfig::from_json(json) {
                Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, expected, "{}", json),
                other => panic!("{} accepted: {:?}", json, other.map(|_| ())),
            }
        }
    }

    #[test]
    fn test_rejects_non_finite_interval() {
        let config = CafeConfig {
            repath_interval: f32::NAN,
            ..CafeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_linger_and_chances_are_allowed() {
        let config =
            CafeConfig::from_json(r#"{ "served_linger": 0.0, "orders": { "milk_chance": 0.0, "honey_chance": 1.0 } }"#)
                .unwrap();
        assert_eq!(config.served_linger, 0.0);
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(matches!(
            CafeConfig::from_json("{ nope"),
            Err(ConfigError::Json(_))
        ));
    }
}
