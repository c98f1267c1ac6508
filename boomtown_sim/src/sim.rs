// The tick entry point.
//
// `tick(state, now, rng)` is the whole engine from the driver's point of
// view: it takes the world by value, advances it to `now`, and hands back the
// new world, whether anything changed, and the structured events produced.
// `WorldState::advance` is the in-place form used by `tick` and by drivers
// that keep the world behind a lock.
//
// Order within one tick:
//
// 1. Sanitize config and settings (corrupt numbers fall back to defaults).
// 2. Clock gate: heal, pause, or short-circuit below the threshold.
// 3. Phase transition (dawn runs quests, then payroll and shop sales).
// 4. NPC spawning (daytime, one pass per spawn interval owed).
// 5. NPC departures (every open tick).
// 6. Event scheduler (one pass per event interval owed).
// 7. Risk patrol (night, one pass per risk interval owed).
//
// The engine performs no I/O and never fails. Callers must serialize ticks
// per world; two concurrent ticks over copies of the same snapshot would
// both resolve the same departing NPCs.

use crate::clock::{self, Gate};
use crate::event::TickEvent;
use crate::types::Timestamp;
use crate::world::WorldState;
use crate::{global_event, npc, risk};
use boomtown_prng::RandomSource;
use tracing::{trace, warn};

/// Result of `WorldState::advance`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepResult {
    /// True when the world differs from before the call and should be
    /// persisted.
    pub has_changed: bool,
    pub events: Vec<TickEvent>,
}

/// Result of `tick`.
#[derive(Clone, Debug, PartialEq)]
pub struct TickResult {
    pub state: WorldState,
    pub has_changed: bool,
    pub events: Vec<TickEvent>,
}

/// Advance `state` to `now`.
pub fn tick(mut state: WorldState, now: Timestamp, rng: &mut impl RandomSource) -> TickResult {
    let StepResult {
        has_changed,
        events,
    } = state.advance(now, rng);
    TickResult {
        state,
        has_changed,
        events,
    }
}

impl WorldState {
    /// Advance this world to `now` in place.
    pub fn advance(&mut self, now: Timestamp, rng: &mut impl RandomSource) -> StepResult {
        let mut healed = false;
        if let Err(err) = self.config.validate() {
            warn!(%err, "Stored config is invalid; healing to defaults");
            self.config = self.config.sanitized();
            self.news.set_capacity(self.config.news_capacity);
            healed = true;
        }
        let sanitized = self.settings.sanitized(&self.config);
        healed |= sanitized != self.settings;
        self.settings = sanitized;

        let elapsed_ms = match clock::gate(self, now) {
            Gate::Healed => {
                trace!(%now, "Clock fields healed");
                return StepResult {
                    has_changed: true,
                    events: Vec::new(),
                };
            }
            Gate::Paused { moved } => {
                return StepResult {
                    has_changed: moved || healed,
                    events: Vec::new(),
                };
            }
            Gate::Closed => {
                return StepResult {
                    has_changed: healed,
                    events: Vec::new(),
                };
            }
            Gate::Open { elapsed_ms } => elapsed_ms,
        };
        trace!(%now, elapsed_ms, turn = self.turn, is_day = self.is_day, "Tick");

        let mut events = Vec::new();
        clock::advance_phase(self, now, elapsed_ms, rng, &mut events);

        // Slots advance every open tick; the phase only decides whether the
        // owed passes run.
        let max_passes = self.config.max_catch_up_passes;
        let spawn_passes = clock::passes_due(
            &mut self.cadence.npc_spawn,
            now,
            self.config.npc_spawn_interval_ms,
            max_passes,
        );
        if self.is_day {
            for _ in 0..spawn_passes {
                npc::spawn_visitors(self, now, rng, &mut events);
            }
        }
        npc::resolve_departures(self, now, rng, &mut events);

        let event_passes =
            clock::passes_due(&mut self.cadence.events, now, self.config.event_interval_ms, max_passes);
        for _ in 0..event_passes {
            global_event::run_scheduler(self, now, rng, &mut events);
        }

        let risk_passes =
            clock::passes_due(&mut self.cadence.risk, now, self.config.risk_interval_ms, max_passes);
        if !self.is_day {
            for _ in 0..risk_passes {
                risk::run_patrol(self, now, rng, &mut events);
            }
        }

        StepResult {
            has_changed: true,
            events,
        }
    }
}
