// Core types shared across the simulation.
//
// Defines wall-clock timestamps, entity identifiers, and the small closed
// enums (roles, weather) that the rest of the engine matches on. All types
// derive `Serialize` and `Deserialize` so the whole world snapshot can be
// persisted by the driver.
//
// User IDs come from outside (the account system owns them), so they are
// strings. NPC, event, and journal IDs are minted by the engine from a
// monotonic counter on `WorldState`, so they stay ordered and never consume
// random draws.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Wall-clock instant in milliseconds. The engine never reads the clock
/// itself; the driver passes `now` into every tick.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub const fn millis(self) -> u64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`. A clock that went backwards
    /// counts as zero elapsed.
    pub fn saturating_since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    pub fn plus_millis(self, ms: u64) -> Timestamp {
        Timestamp(self.0.saturating_add(ms))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

// ---------------------------------------------------------------------------
// Entity IDs
// ---------------------------------------------------------------------------

/// Identifier of a registered user, assigned by the account system.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

entity_id!(/// Identifier of a visiting NPC.
NpcId);
entity_id!(/// Identifier of a global random event.
EventId);

// ---------------------------------------------------------------------------
// Simulation enums
// ---------------------------------------------------------------------------

/// What a user does in the town. Bankers draw a flat salary; players work
/// jobs, run shops, and chase quests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Player,
    Banker,
}

/// Current town weather. Set by the driver (or an admin); the engine reads
/// it to scale walk-in shop traffic.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    #[default]
    Clear,
    Sunny,
    Cloudy,
    Fog,
    Rain,
    HeavyRain,
    Storm,
    Snow,
    Heatwave,
}
