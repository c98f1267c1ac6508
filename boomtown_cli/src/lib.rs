// boomtown_cli: reference driver for the Boomtown simulation engine.
//
// The engine (`boomtown_sim`) is a pure function over a world snapshot. This
// crate supplies everything around it that a real deployment needs: a
// single-writer host that serializes ticks, persistence, a demo town, and a
// poll loop with a tracing subscriber.
//
// Module overview:
// - `host.rs`:      WorldHost: Mutex-guarded world + GameRng, tick-then-save-if-changed.
// - `store.rs`:     WorldStore trait, JsonFileStore (atomic rename), MemoryStore.
// - `driver.rs`:    DriverConfig, startup (config/catalog/world loading), the poll loop.
// - `demo.rs`:      A small seeded town for trying things out.
// - `telemetry.rs`: tracing-subscriber bootstrap (fmt + EnvFilter).
//
// The binary (`main.rs`) only parses arguments and calls `driver::run`.

pub mod demo;
pub mod driver;
pub mod host;
pub mod store;
pub mod telemetry;
