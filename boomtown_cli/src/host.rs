// Single-writer host for one world.
//
// The engine leaves serialization of ticks to its caller. `WorldHost` is
// that caller: the world and its random source sit behind one `Mutex`, and
// `poll` holds the lock across tick and save. Concurrent polls (e.g. one per
// incoming request) therefore queue up; the second sees the first one's
// result, finds the gate closed, and does nothing. No departing visitor can
// be resolved twice and no save can be lost.
//
// Every save also records the random stream position in the snapshot
// (`WorldState::rng_state`), so a restarted host resumes the stream rather
// than replaying it from `--seed`.
//
// Reads (`snapshot`, `with_world`) take the same lock briefly.

use crate::store::{StoreError, WorldStore};
use boomtown_prng::GameRng;
use boomtown_sim::event::TickEvent;
use boomtown_sim::journal::NewsEntry;
use boomtown_sim::types::Timestamp;
use boomtown_sim::world::WorldState;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

struct Hosted {
    world: WorldState,
    rng: GameRng,
}

/// What one poll did.
#[derive(Clone, Debug, Default)]
pub struct PollReport {
    pub has_changed: bool,
    pub events: Vec<TickEvent>,
    /// Journal entries written by this poll, newest first.
    pub news: Vec<NewsEntry>,
}

pub struct WorldHost<S: WorldStore> {
    hosted: Mutex<Hosted>,
    store: S,
}

impl<S: WorldStore> WorldHost<S> {
    /// Host `world`. A world saved by an earlier host resumes its random
    /// stream; a fresh one starts from `seed`.
    pub fn new(world: WorldState, seed: u64, store: S) -> Self {
        let rng = world
            .rng_state
            .clone()
            .unwrap_or_else(|| GameRng::new(seed));
        Self {
            hosted: Mutex::new(Hosted { world, rng }),
            store,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Hosted> {
        // A panic mid-tick leaves the previous snapshot in the store; the
        // in-memory copy is still a complete world.
        self.hosted.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Tick the world to `now` and persist it if anything changed.
    pub fn poll(&self, now: Timestamp) -> Result<PollReport, StoreError> {
        let mut guard = self.lock();
        let Hosted { world, rng } = &mut *guard;

        let mark = world.news.latest().map_or(0, |e| e.id);
        let step = world.advance(now, rng);
        if step.has_changed {
            world.rng_state = Some(rng.clone());
            self.store.save(world)?;
            debug!(%now, events = step.events.len(), "World saved");
        }
        Ok(PollReport {
            has_changed: step.has_changed,
            news: world.news.since(mark).cloned().collect(),
            events: step.events,
        })
    }

    /// A copy of the current world.
    pub fn snapshot(&self) -> WorldState {
        self.lock().world.clone()
    }

    /// Run `f` against the current world without copying it.
    pub fn with_world<R>(&self, f: impl FnOnce(&WorldState) -> R) -> R {
        f(&self.lock().world)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
