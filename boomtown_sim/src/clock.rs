// Clock gate, phase transitions, and sub-tick cadences.
//
// The clock gate decides whether a tick does any work at all. It heals
// missing clock fields, honours the pause flag, and refuses to run until at
// least `config.clock_gate_ms` of wall-clock time has passed since the last
// processed tick. Only an open gate moves `last_tick`; a closed one leaves
// the world byte-for-byte unchanged so the driver can skip persisting it.
//
// The phase manager then burns the elapsed time off the countdown. When the
// countdown runs out the phase flips, the countdown resets to the full turn
// duration, and the hooks for the new phase run: nightfall charges debt
// interest, dawn advances the turn and runs quests then payroll. A single
// tick flips at most once, however long the gap since the previous one.
//
// `Cadence` holds the last-run timestamps of the sub-tick components (NPC
// spawning, the event scheduler, the risk patrol). Each runs on its own
// interval, independent of `last_tick`. A tick that arrives several
// intervals late runs the component once per whole interval owed (up to
// `config.max_catch_up_passes`), so per-second odds hold whether the driver
// polls every second or every minute. A slot keeps advancing while its
// component is idle (spawning at night, the patrol by day), so a phase flip
// never releases a backlog.
//
// See also: `sim.rs` for the full tick order, `quest.rs` and `economy.rs`
// for the dawn hooks.

use crate::event::{TickEvent, TickEventKind};
use crate::journal::NewsCategory;
use crate::types::Timestamp;
use crate::world::{Transaction, TransactionKind, WorldState};
use crate::{economy, quest};
use boomtown_prng::RandomSource;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Cadence
// ---------------------------------------------------------------------------

/// Last-run timestamps of the sub-tick components. A `None` slot is
/// initialized on first sight and runs one interval later.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cadence {
    pub npc_spawn: Option<Timestamp>,
    pub events: Option<Timestamp>,
    pub risk: Option<Timestamp>,
}

impl Cadence {
    pub fn starting_at(now: Option<Timestamp>) -> Self {
        Self {
            npc_spawn: now,
            events: now,
            risk: now,
        }
    }
}

/// Number of whole `interval_ms` periods owed since the slot last ran,
/// capped at `max_passes`. The slot advances by exactly the periods counted,
/// so a partial period carries over to the next tick. A backlog beyond the
/// cap is dropped and the slot jumps to `now`. A `None` slot, or one stamped
/// in the future after the clock jumped backwards, is reset to `now` and
/// owes nothing.
pub fn passes_due(
    slot: &mut Option<Timestamp>,
    now: Timestamp,
    interval_ms: u64,
    max_passes: u32,
) -> u32 {
    let last = match *slot {
        Some(last) if last <= now => last,
        _ => {
            *slot = Some(now);
            return 0;
        }
    };
    let interval_ms = interval_ms.max(1);
    let owed = now.saturating_since(last) / interval_ms;
    let cap = u64::from(max_passes.max(1));
    if owed > cap {
        *slot = Some(now);
        return cap as u32;
    }
    if owed > 0 {
        *slot = Some(last.plus_millis(owed * interval_ms));
    }
    owed as u32
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// What the clock gate decided for this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    /// A missing clock field was filled in. Nothing else runs.
    Healed,
    /// Timer paused. `moved` reports whether `last_tick` changed.
    Paused { moved: bool },
    /// Too soon since the last processed tick.
    Closed,
    /// Proceed with this much elapsed time.
    Open { elapsed_ms: u64 },
}

pub fn gate(state: &mut WorldState, now: Timestamp) -> Gate {
    let mut healed = false;
    if state.time_remaining_ms.is_none() {
        state.time_remaining_ms = Some(state.settings.turn_duration_ms);
        healed = true;
    }
    let Some(last_tick) = state.last_tick else {
        state.last_tick = Some(now);
        return Gate::Healed;
    };
    if healed {
        return Gate::Healed;
    }

    if !state.is_timer_running {
        state.last_tick = Some(now);
        return Gate::Paused {
            moved: last_tick != now,
        };
    }

    let elapsed_ms = now.saturating_since(last_tick);
    if elapsed_ms < state.config.clock_gate_ms {
        return Gate::Closed;
    }
    state.last_tick = Some(now);
    Gate::Open { elapsed_ms }
}

// ---------------------------------------------------------------------------
// Phase transitions
// ---------------------------------------------------------------------------

/// Burn `elapsed_ms` off the countdown and flip the phase if it ran out.
pub fn advance_phase(
    state: &mut WorldState,
    now: Timestamp,
    elapsed_ms: u64,
    rng: &mut impl RandomSource,
    events: &mut Vec<TickEvent>,
) {
    let turn_duration = state.settings.turn_duration_ms;
    let remaining = state.time_remaining_ms.unwrap_or(turn_duration);
    if elapsed_ms < remaining {
        state.time_remaining_ms = Some(remaining - elapsed_ms);
        return;
    }

    state.time_remaining_ms = Some(turn_duration);
    state.is_day = !state.is_day;

    if state.is_day {
        state.turn += 1;
        info!(turn = state.turn, "Dawn");
        state.news.record(
            now,
            state.turn,
            NewsCategory::Phase,
            format!("Day breaks over Boomtown. Turn {} begins.", state.turn),
        );
        events.push(TickEvent {
            at: now,
            kind: TickEventKind::PhaseChanged {
                is_day: true,
                turn: state.turn,
            },
        });
        quest::evaluate_all(state, now, events);
        economy::distribute(state, now, rng, events);
    } else {
        info!(turn = state.turn, "Nightfall");
        state.news.record(
            now,
            state.turn,
            NewsCategory::Phase,
            "Night falls over Boomtown. Shops close their doors.",
        );
        events.push(TickEvent {
            at: now,
            kind: TickEventKind::PhaseChanged {
                is_day: false,
                turn: state.turn,
            },
        });
        nightfall(state, now, events);
    }
}

/// Night-only processing: interest on outstanding debt.
fn nightfall(state: &mut WorldState, now: Timestamp, events: &mut Vec<TickEvent>) {
    let rate = state.config.nightly_debt_interest_rate;
    if !(rate.is_finite() && rate > 0.0) {
        return;
    }

    let mut charged = 0usize;
    for user in state.users.values_mut() {
        if user.debt <= 0 {
            continue;
        }
        let interest = (user.debt as f64 * rate).floor() as i64;
        if interest <= 0 {
            continue;
        }
        user.debt = user.debt.saturating_add(interest);
        user.transactions.push(Transaction {
            at: now,
            kind: TransactionKind::DebtInterest,
            amount: interest,
            description: "Overnight interest on debt".into(),
        });
        debug!(user = %user.id, interest, debt = user.debt, "Debt interest charged");
        events.push(TickEvent {
            at: now,
            kind: TickEventKind::DebtInterestCharged {
                user_id: user.id.clone(),
                amount: interest,
            },
        });
        charged += 1;
    }

    if charged > 0 {
        state.news.record(
            now,
            state.turn,
            NewsCategory::Economy,
            format!("The bank charged overnight interest on {charged} loan(s)."),
        );
    }
}
