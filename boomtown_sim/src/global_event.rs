// Global random events: town-wide modifiers drawn from the event catalog.
//
// The scheduler runs on its own cadence. Each pass first expires events whose
// window has closed, then, only if nothing is active, rolls a small chance to
// start a new one drawn uniformly from `Catalog::event_templates`. At most
// one event is ever active.
//
// Event kinds fall into three classes:
//
// - Instant (`Grant`, `TaxHike`): applied once to every user at spawn time,
//   ledgered, then left in the active list until expiry so nothing else can
//   start during their window.
// - Boost (`Boom`, `Festival`, `Viral`) and slump (`Recession`, `Epidemic`,
//   `Disaster`, `Scandal`, `Heatwave`, `Coldwave`): no direct effect; the
//   economic distributor multiplies walk-in sales by `effect_value` while
//   they are active.
//
// See also: `catalog.rs` for `EventTemplate`, `economy.rs` for the multiplier
// consumer.

use crate::event::{TickEvent, TickEventKind};
use crate::journal::NewsCategory;
use crate::types::*;
use crate::world::{TransactionKind, WorldState};
use boomtown_prng::RandomSource;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Boom,
    Recession,
    Grant,
    TaxHike,
    Festival,
    Epidemic,
    Disaster,
    Heatwave,
    Coldwave,
    Viral,
    Scandal,
}

/// How an event kind acts on the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectClass {
    /// Applied once at spawn.
    Instant,
    /// Multiplies walk-in sales upward while active.
    Boost,
    /// Multiplies walk-in sales downward while active.
    Slump,
}

impl EventKind {
    pub fn effect_class(self) -> EffectClass {
        match self {
            EventKind::Grant | EventKind::TaxHike => EffectClass::Instant,
            EventKind::Boom | EventKind::Festival | EventKind::Viral => EffectClass::Boost,
            EventKind::Recession
            | EventKind::Epidemic
            | EventKind::Disaster
            | EventKind::Scandal
            | EventKind::Heatwave
            | EventKind::Coldwave => EffectClass::Slump,
        }
    }
}

/// An event in effect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub id: EventId,
    pub kind: EventKind,
    pub title: String,
    pub start_time: Timestamp,
    pub duration_ms: u64,
    pub effect_value: f64,
}

impl GameEvent {
    pub fn ends_at(&self) -> Timestamp {
        self.start_time.plus_millis(self.duration_ms)
    }

    pub fn is_active_at(&self, now: Timestamp) -> bool {
        now < self.ends_at()
    }

    /// Sales multiplier contributed by this event, if it is durational and
    /// its value is usable.
    pub fn sales_multiplier(&self, class: EffectClass) -> Option<f64> {
        if self.kind.effect_class() != class || class == EffectClass::Instant {
            return None;
        }
        (self.effect_value.is_finite() && self.effect_value >= 0.0).then_some(self.effect_value)
    }
}

/// One scheduler pass: expire, then maybe spawn.
pub fn run_scheduler(
    state: &mut WorldState,
    now: Timestamp,
    rng: &mut impl RandomSource,
    events: &mut Vec<TickEvent>,
) {
    let (active, expired): (Vec<GameEvent>, Vec<GameEvent>) =
        std::mem::take(&mut state.active_events)
            .into_iter()
            .partition(|e| e.is_active_at(now));
    state.active_events = active;
    for event in expired {
        info!(event = %event.id, kind = ?event.kind, "Event expired");
        state.news.record(
            now,
            state.turn,
            NewsCategory::Event,
            format!("{} has come to an end.", event.title),
        );
        events.push(TickEvent {
            at: now,
            kind: TickEventKind::EventExpired {
                event_id: event.id,
                kind: event.kind,
            },
        });
    }

    if !state.active_events.is_empty() {
        return;
    }
    if !rng.roll_percent(state.config.event_spawn_percent) {
        return;
    }
    let Some(idx) = rng.pick_index(state.catalog.event_templates.len()) else {
        return;
    };
    let template = state.catalog.event_templates[idx].clone();
    let event = GameEvent {
        id: EventId(state.alloc_id()),
        kind: template.kind,
        title: template.title,
        start_time: now,
        duration_ms: template.duration_ms,
        effect_value: template.effect_value,
    };

    info!(event = %event.id, kind = ?event.kind, duration_ms = event.duration_ms, "Event started");
    state.news.record(
        now,
        state.turn,
        NewsCategory::Event,
        format!("BREAKING: {}!", event.title),
    );
    apply_instant_effect(state, &event, now);
    events.push(TickEvent {
        at: now,
        kind: TickEventKind::EventStarted {
            event_id: event.id,
            kind: event.kind,
        },
    });
    state.active_events.push(event);
}

fn apply_instant_effect(state: &mut WorldState, event: &GameEvent, now: Timestamp) {
    if !event.effect_value.is_finite() {
        return;
    }
    match event.kind {
        EventKind::Grant => {
            let amount = (event.effect_value * state.settings.money_multiplier).floor() as i64;
            if amount <= 0 {
                return;
            }
            for user in state.users.values_mut() {
                user.credit(now, TransactionKind::EventGrant, amount, event.title.clone());
            }
        }
        EventKind::TaxHike => {
            let keep = 1.0 - event.effect_value.clamp(0.0, 1.0);
            for user in state.users.values_mut() {
                if user.balance <= 0 {
                    continue;
                }
                let remaining = (user.balance as f64 * keep).floor() as i64;
                user.debit_floored(
                    now,
                    TransactionKind::EventTaxHike,
                    user.balance - remaining,
                    event.title.clone(),
                );
            }
        }
        _ => {}
    }
}
