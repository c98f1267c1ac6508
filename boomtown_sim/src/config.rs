// Data-driven engine configuration.
//
// Two layers of tunables live here:
//
// - `Settings`: per-game values an admin may change while the game runs
//   (turn length, tax rate, auto-save rate, global money multiplier). They
//   are stored on `WorldState` and sanitized at the start of every tick, so
//   a corrupt or half-written save degrades to defaults instead of stalling
//   the world.
// - `GameConfig`: engine constants (gate intervals, probabilities, payout
//   formulas, weather table). Loaded from JSON at startup, never mutated at
//   runtime. The engine never uses magic numbers; it reads them from here.
//
// `ConfigError` is the only error type in the engine crate. It is returned by
// the JSON loaders for `GameConfig` and `Catalog` (see `catalog.rs`); the
// tick itself has no error channel.
//
// See also: `catalog.rs` for the read-only reference tables, `clock.rs` for
// where `Settings` are healed, `economy.rs` for the payout formulas.

use crate::types::Weather;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Errors raised while loading configuration or reference data.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-game settings
// ---------------------------------------------------------------------------

/// Admin-adjustable settings stored on the world.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Length of one day (and one night) in milliseconds.
    pub turn_duration_ms: u64,
    /// Fraction of gross salary withheld as tax (0.0–1.0).
    pub tax_rate: f64,
    /// Fraction of net salary moved into the deposit account (0.0–1.0).
    pub auto_save_rate: f64,
    /// Global scale on salaries, shop sales, and event grants.
    pub money_multiplier: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            turn_duration_ms: 60_000,
            tax_rate: 0.1,
            auto_save_rate: 0.1,
            money_multiplier: 1.0,
        }
    }
}

impl Settings {
    /// Replace non-finite or out-of-range values with usable ones.
    pub fn sanitized(&self, config: &GameConfig) -> Settings {
        let defaults = Settings::default();
        Settings {
            turn_duration_ms: if self.turn_duration_ms == 0 {
                config.default_turn_duration_ms.max(1)
            } else {
                self.turn_duration_ms
            },
            tax_rate: unit_fraction_or(self.tax_rate, defaults.tax_rate),
            auto_save_rate: unit_fraction_or(self.auto_save_rate, defaults.auto_save_rate),
            money_multiplier: if self.money_multiplier.is_finite() && self.money_multiplier >= 0.0 {
                self.money_multiplier
            } else {
                defaults.money_multiplier
            },
        }
    }
}

fn unit_fraction_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

// ---------------------------------------------------------------------------
// Engine constants
// ---------------------------------------------------------------------------

/// Engine tunables. Loaded from JSON, never mutated at runtime.
///
/// Millisecond ranges are `(min, max)` inclusive. Percentages are on a
/// 0–100 scale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Minimum wall-clock gap between two ticks that do any work.
    pub clock_gate_ms: u64,
    /// Turn length used when the stored setting is missing or zero.
    pub default_turn_duration_ms: u64,
    /// Maximum number of journal entries kept; older ones are evicted.
    pub news_capacity: usize,
    /// Most passes a sub-tick component may run to catch up after a long
    /// gap between polls. Older owed passes are dropped.
    pub max_catch_up_passes: u32,

    /// Flat salary paid to every banker at dawn, before the money multiplier.
    pub banker_salary: i64,
    /// Rating bonus rate: `bonus = floor(salary * rating * rate)`.
    pub rating_bonus_rate: f64,
    /// Revenue per walk-in customer, before multipliers.
    pub sales_per_customer: i64,
    /// Walk-in base roll: `floor(rand * base_customer_roll)` customers.
    pub base_customer_roll: u64,
    /// Rating bonus customers: `floor(rating / customer_rating_divisor)`.
    pub customer_rating_divisor: f64,
    /// Walk-in traffic multipliers by weather. Missing entries count as 1.0.
    pub weather_multipliers: BTreeMap<Weather, f64>,
    /// Fraction of outstanding debt added as interest at nightfall.
    /// Zero disables the levy.
    pub nightly_debt_interest_rate: f64,

    /// Minimum gap between two NPC spawn passes.
    pub npc_spawn_interval_ms: u64,
    /// Spawn chance: `rating * weight + popularity / divisor + base` percent.
    pub npc_spawn_base_percent: f64,
    pub npc_spawn_rating_weight: f64,
    pub npc_spawn_popularity_divisor: f64,
    /// Visit length for templates that do not set their own.
    pub npc_visit_ms: (u64, u64),
    /// Budget range for purchasing NPCs.
    pub npc_budget: (u64, u64),
    /// Theft/scam range for templates that do not set their own.
    pub npc_steal: (u64, u64),
    /// Chance that a purchasing NPC takes an affordable item.
    pub npc_purchase_accept_percent: f64,
    /// Purchases at or above this total make the news.
    pub large_purchase_threshold: i64,

    /// Minimum gap between two random event scheduler passes.
    pub event_interval_ms: u64,
    /// Chance of a new global event per scheduler pass while none is active.
    pub event_spawn_percent: f64,

    /// Minimum gap between two night patrols.
    pub risk_interval_ms: u64,
    /// Chance per patrol that a user holding illegal assets is caught.
    pub risk_arrest_percent: f64,
    /// Fraction of the balance taken as a fine on arrest.
    pub risk_fine_fraction: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        let weather_multipliers = BTreeMap::from([
            (Weather::Sunny, 1.2),
            (Weather::Rain, 0.8),
            (Weather::HeavyRain, 0.6),
            (Weather::Storm, 0.3),
            (Weather::Snow, 0.7),
            (Weather::Heatwave, 0.9),
        ]);

        Self {
            clock_gate_ms: 1_000,
            default_turn_duration_ms: 60_000,
            news_capacity: 50,
            max_catch_up_passes: 300,
            banker_salary: 5_000,
            rating_bonus_rate: 0.05,
            sales_per_customer: 100,
            base_customer_roll: 3,
            customer_rating_divisor: 2.0,
            weather_multipliers,
            nightly_debt_interest_rate: 0.0,
            npc_spawn_interval_ms: 2_000,
            npc_spawn_base_percent: 5.0,
            npc_spawn_rating_weight: 5.0,
            npc_spawn_popularity_divisor: 50.0,
            npc_visit_ms: (10_000, 15_000),
            npc_budget: (1_000, 6_000),
            npc_steal: (100, 1_000),
            npc_purchase_accept_percent: 50.0,
            large_purchase_threshold: 5_000,
            event_interval_ms: 1_000,
            event_spawn_percent: 0.5,
            risk_interval_ms: 1_000,
            risk_arrest_percent: 0.5,
            risk_fine_fraction: 0.5,
        }
    }
}

impl GameConfig {
    /// Parse and validate a config from JSON. Fields left out of the JSON
    /// keep their default values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reject values that would make the engine misbehave rather than merely
    /// play differently.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clock_gate_ms == 0 {
            return Err(ConfigError::invalid("clock_gate_ms", "must be at least 1"));
        }
        if self.default_turn_duration_ms == 0 {
            return Err(ConfigError::invalid(
                "default_turn_duration_ms",
                "must be at least 1",
            ));
        }
        if self.news_capacity == 0 {
            return Err(ConfigError::invalid("news_capacity", "must be at least 1"));
        }
        if self.max_catch_up_passes == 0 {
            return Err(ConfigError::invalid("max_catch_up_passes", "must be at least 1"));
        }
        for (field, value) in [
            ("npc_spawn_interval_ms", self.npc_spawn_interval_ms),
            ("event_interval_ms", self.event_interval_ms),
            ("risk_interval_ms", self.risk_interval_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::invalid(field, "must be at least 1"));
            }
        }
        if self.base_customer_roll == 0 {
            return Err(ConfigError::invalid("base_customer_roll", "must be at least 1"));
        }
        if !(self.customer_rating_divisor.is_finite() && self.customer_rating_divisor > 0.0) {
            return Err(ConfigError::invalid(
                "customer_rating_divisor",
                "must be a positive number",
            ));
        }
        if !(self.npc_spawn_popularity_divisor.is_finite()
            && self.npc_spawn_popularity_divisor > 0.0)
        {
            return Err(ConfigError::invalid(
                "npc_spawn_popularity_divisor",
                "must be a positive number",
            ));
        }
        for (field, value) in [
            ("rating_bonus_rate", self.rating_bonus_rate),
            ("nightly_debt_interest_rate", self.nightly_debt_interest_rate),
            ("risk_fine_fraction", self.risk_fine_fraction),
        ] {
            if !(value.is_finite() && (0.0..=1.0).contains(&value)) {
                return Err(ConfigError::invalid(field, "must be within 0.0..=1.0"));
            }
        }
        for (field, value) in [
            ("npc_purchase_accept_percent", self.npc_purchase_accept_percent),
            ("event_spawn_percent", self.event_spawn_percent),
            ("risk_arrest_percent", self.risk_arrest_percent),
        ] {
            if !(value.is_finite() && (0.0..=100.0).contains(&value)) {
                return Err(ConfigError::invalid(field, "must be within 0..=100 percent"));
            }
        }
        for (field, (low, high)) in [
            ("npc_visit_ms", self.npc_visit_ms),
            ("npc_budget", self.npc_budget),
            ("npc_steal", self.npc_steal),
        ] {
            if low > high {
                return Err(ConfigError::invalid(
                    field,
                    format!("range minimum {low} exceeds maximum {high}"),
                ));
            }
        }
        for (weather, multiplier) in &self.weather_multipliers {
            if !(multiplier.is_finite() && *multiplier >= 0.0) {
                return Err(ConfigError::invalid(
                    format!("weather_multipliers.{weather:?}"),
                    "must be a non-negative number",
                ));
            }
        }
        Ok(())
    }

    /// A copy with every value `validate` rejects replaced by its default.
    /// Snapshots carry their own config, so the tick heals it the same way
    /// it heals `Settings`.
    pub fn sanitized(&self) -> GameConfig {
        let defaults = GameConfig::default();
        let mut healed = self.clone();

        for (value, fallback) in [
            (&mut healed.clock_gate_ms, defaults.clock_gate_ms),
            (&mut healed.default_turn_duration_ms, defaults.default_turn_duration_ms),
            (&mut healed.base_customer_roll, defaults.base_customer_roll),
            (&mut healed.npc_spawn_interval_ms, defaults.npc_spawn_interval_ms),
            (&mut healed.event_interval_ms, defaults.event_interval_ms),
            (&mut healed.risk_interval_ms, defaults.risk_interval_ms),
        ] {
            if *value == 0 {
                *value = fallback;
            }
        }
        if healed.news_capacity == 0 {
            healed.news_capacity = defaults.news_capacity;
        }
        if healed.max_catch_up_passes == 0 {
            healed.max_catch_up_passes = defaults.max_catch_up_passes;
        }

        for (value, fallback) in [
            (&mut healed.customer_rating_divisor, defaults.customer_rating_divisor),
            (
                &mut healed.npc_spawn_popularity_divisor,
                defaults.npc_spawn_popularity_divisor,
            ),
        ] {
            if !(value.is_finite() && *value > 0.0) {
                *value = fallback;
            }
        }
        for (value, fallback) in [
            (&mut healed.rating_bonus_rate, defaults.rating_bonus_rate),
            (
                &mut healed.nightly_debt_interest_rate,
                defaults.nightly_debt_interest_rate,
            ),
            (&mut healed.risk_fine_fraction, defaults.risk_fine_fraction),
        ] {
            if !(value.is_finite() && (0.0..=1.0).contains(&*value)) {
                *value = fallback;
            }
        }
        for (value, fallback) in [
            (
                &mut healed.npc_purchase_accept_percent,
                defaults.npc_purchase_accept_percent,
            ),
            (&mut healed.event_spawn_percent, defaults.event_spawn_percent),
            (&mut healed.risk_arrest_percent, defaults.risk_arrest_percent),
        ] {
            if !(value.is_finite() && (0.0..=100.0).contains(&*value)) {
                *value = fallback;
            }
        }
        for (range, fallback) in [
            (&mut healed.npc_visit_ms, defaults.npc_visit_ms),
            (&mut healed.npc_budget, defaults.npc_budget),
            (&mut healed.npc_steal, defaults.npc_steal),
        ] {
            if range.0 > range.1 {
                *range = fallback;
            }
        }
        healed
            .weather_multipliers
            .retain(|_, multiplier| multiplier.is_finite() && *multiplier >= 0.0);
        healed
    }

    /// Walk-in traffic multiplier for the given weather.
    pub fn weather_multiplier(&self, weather: Weather) -> f64 {
        self.weather_multipliers
            .get(&weather)
            .copied()
            .filter(|m| m.is_finite() && *m >= 0.0)
            .unwrap_or(1.0)
    }
}
