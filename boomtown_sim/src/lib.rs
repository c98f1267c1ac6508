// boomtown_sim: the Boomtown town simulation engine.
//
// This crate advances a shared town snapshot by wall-clock time: day/night
// cycles, dawn payroll and shop sales, quest completion, visiting NPCs with
// delayed effects, global random events, and a nightly police patrol. It
// performs no I/O; the driver (see `boomtown_cli`) loads the world, calls
// `sim::tick`, and persists the result when it changed.
//
// Module overview:
// - `sim.rs`:          `tick()` / `WorldState::advance()`, the per-tick order of components.
// - `world.rs`:        WorldState, User, ledger and shop records.
// - `clock.rs`:        Clock gate, phase transitions, nightfall hook, sub-tick `Cadence`.
// - `economy.rs`:      Dawn payroll (salary, tax, auto-save) and walk-in shop sales.
// - `quest.rs`:        Quest conditions, progress records, dawn evaluation.
// - `npc.rs`:          Shop visitors: spawning and departure effects.
// - `global_event.rs`: Town-wide random events: scheduler, instant effects, multipliers.
// - `risk.rs`:         Night patrol fining holders of illegal assets.
// - `journal.rs`:      Bounded newest-first news feed.
// - `event.rs`:        Structured TickEvents returned from each tick.
// - `catalog.rs`:      Read-only reference tables (jobs, NPC templates, events, quests).
// - `config.rs`:       GameConfig, per-game Settings, ConfigError.
// - `types.rs`:        Timestamp, ids, Role, Weather.
// - `prng`:            Re-exported from `boomtown_prng`: `RandomSource`, `GameRng`, `ScriptedRng`.
//
// **Critical constraint: the tick never fails.** Missing or corrupt numbers
// heal to defaults, references to vanished users are dropped, and unknown
// catalog keys fall back to minimal behaviour. All randomness goes through
// an injected `RandomSource`; the engine never reads the system clock or OS
// entropy. Use `BTreeMap` for ordered collections so seeded runs replay
// identically.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod economy;
pub mod event;
pub mod global_event;
pub mod journal;
pub mod npc;
pub use boomtown_prng as prng;
pub mod quest;
pub mod risk;
pub mod sim;
pub mod types;
pub mod world;
