// NPC lifecycle: spawning shop visitors and resolving their departures.
//
// A visitor is spawned for a shop owner, sits in `WorldState::active_npcs`
// for its visit window, and applies exactly one effect when it leaves:
// purchase (credit the owner), theft or scam (debit the owner, floored at
// zero), or browse (nothing). The effect is applied and the NPC removed in
// the same pass, so no visitor is ever resolved twice.
//
// Resolution is filter-then-replace: the NPC list is taken out of the world,
// each entry is either kept (still visiting), resolved (dropped after its
// effect), or discarded (owner no longer exists), and the kept entries are
// written back. Nothing iterates a collection it is mutating.
//
// Spawning runs on its own cadence (see `clock::Cadence`) and only during
// the day. Resolution runs on every tick the clock gate lets through, day or
// night, so visitors spawned late in the day still leave after dark.
//
// See also: `catalog.rs` for `NpcTemplate`, `event.rs` for `VisitOutcome`,
// `sim.rs` for where these run in the tick order.

use crate::catalog::{GUEST_TEMPLATE_ID, NpcTemplate};
use crate::event::{TickEvent, TickEventKind, VisitOutcome};
use crate::journal::NewsCategory;
use crate::types::*;
use crate::world::{TransactionKind, User, WorldState};
use boomtown_prng::RandomSource;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

/// Broad visitor category. Only customers carry a budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpcKind {
    Customer,
    Other,
}

/// What a visitor does when it leaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpcAction {
    Purchase,
    Theft,
    Scam,
    Browse,
}

/// A visitor currently in a shop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    pub id: NpcId,
    pub target_user_id: UserId,
    pub template_id: String,
    pub name: String,
    pub kind: NpcKind,
    pub action: NpcAction,
    pub entry_time: Timestamp,
    pub leave_time: Timestamp,
    /// Written once, immediately before the NPC is removed.
    #[serde(default)]
    pub effect_applied: bool,
    /// Spending limit for purchasing visitors; zero for everyone else.
    #[serde(default)]
    pub budget: i64,
}

/// Draw from an inclusive `(min, max)` range.
fn draw_inclusive(rng: &mut impl RandomSource, (low, high): (u64, u64)) -> u64 {
    rng.range_u64(low, high.saturating_add(1))
}

/// Percent chance that a shop draws a visitor on one spawn pass.
fn spawn_chance(state: &WorldState, user: &User) -> f64 {
    let config = &state.config;
    user.effective_rating() * config.npc_spawn_rating_weight
        + user.popularity as f64 / config.npc_spawn_popularity_divisor
        + config.npc_spawn_base_percent
}

// ---------------------------------------------------------------------------
// Spawning
// ---------------------------------------------------------------------------

/// One spawn pass: every open shop rolls for a visitor.
pub fn spawn_visitors(
    state: &mut WorldState,
    now: Timestamp,
    rng: &mut impl RandomSource,
    events: &mut Vec<TickEvent>,
) {
    let hosts: Vec<(UserId, f64)> = state
        .users
        .values()
        .filter(|u| u.is_player() && u.owns_shop() && !u.is_off)
        .map(|u| (u.id.clone(), spawn_chance(state, u)))
        .collect();

    for (user_id, chance) in hosts {
        if !rng.roll_percent(chance) {
            continue;
        }

        let (template_id, template) = match rng.pick_index(state.catalog.npc_templates.len()) {
            Some(idx) => state
                .catalog
                .npc_templates
                .iter()
                .nth(idx)
                .map(|(id, t)| (id.clone(), t.clone()))
                .unwrap_or_else(|| (GUEST_TEMPLATE_ID.to_owned(), NpcTemplate::guest())),
            None => (GUEST_TEMPLATE_ID.to_owned(), NpcTemplate::guest()),
        };

        let visit_ms = draw_inclusive(rng, template.visit_ms.unwrap_or(state.config.npc_visit_ms));
        let budget = if template.action == NpcAction::Purchase {
            draw_inclusive(rng, state.config.npc_budget) as i64
        } else {
            0
        };

        let npc = Npc {
            id: NpcId(state.alloc_id()),
            target_user_id: user_id.clone(),
            template_id,
            name: template.name,
            kind: template.kind,
            action: template.action,
            entry_time: now,
            leave_time: now.plus_millis(visit_ms),
            effect_applied: false,
            budget,
        };
        debug!(npc = %npc.id, user = %user_id, action = ?npc.action, visit_ms, "Visitor arrived");
        events.push(TickEvent {
            at: now,
            kind: TickEventKind::VisitorArrived {
                npc_id: npc.id,
                user_id,
                action: npc.action,
            },
        });
        state.active_npcs.push(npc);
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Slot {
    Shop(usize),
    Menu(usize),
}

/// Resolve every visitor whose window has elapsed, then drop it.
pub fn resolve_departures(
    state: &mut WorldState,
    now: Timestamp,
    rng: &mut impl RandomSource,
    events: &mut Vec<TickEvent>,
) {
    let visitors = std::mem::take(&mut state.active_npcs);
    let mut staying = Vec::with_capacity(visitors.len());

    let WorldState {
        users,
        catalog,
        config,
        news,
        turn,
        ..
    } = state;

    for mut npc in visitors {
        let Some(owner) = users.get_mut(&npc.target_user_id) else {
            debug!(npc = %npc.id, user = %npc.target_user_id, "Visitor discarded, owner gone");
            continue;
        };
        if npc.effect_applied {
            // Already resolved by an earlier pass; it should not have been kept.
            continue;
        }
        if now < npc.leave_time {
            staying.push(npc);
            continue;
        }

        let outcome = match npc.action {
            NpcAction::Theft | NpcAction::Scam => {
                let range = catalog
                    .npc_templates
                    .get(&npc.template_id)
                    .and_then(|t| t.steal_range)
                    .unwrap_or(config.npc_steal);
                let attempted = draw_inclusive(rng, range) as i64;
                let verb = if npc.action == NpcAction::Scam {
                    "scammed"
                } else {
                    "stole"
                };
                let taken = owner.debit_floored(
                    now,
                    TransactionKind::NpcTheft,
                    attempted,
                    format!("{} {verb} from the shop", npc.name),
                );
                let message = if taken > 0 {
                    format!("{} {verb} {taken} from {}'s shop!", npc.name, owner.name)
                } else {
                    format!(
                        "{} tried to rob {}'s shop but the till was empty.",
                        npc.name, owner.name
                    )
                };
                news.record(now, *turn, NewsCategory::Visitor, message);
                VisitOutcome::Stole { amount: taken }
            }
            NpcAction::Purchase => {
                let (amount, items) = shop_purchase(owner, npc.budget, rng, config.npc_purchase_accept_percent);
                if amount > 0 {
                    owner.credit(
                        now,
                        TransactionKind::NpcPurchase,
                        amount,
                        format!("{} bought {items} item(s)", npc.name),
                    );
                    let message = if amount >= config.large_purchase_threshold {
                        format!(
                            "Big spender! {} spent {amount} at {}'s shop.",
                            npc.name, owner.name
                        )
                    } else {
                        format!("{} bought {items} item(s) at {}'s shop.", npc.name, owner.name)
                    };
                    news.record(now, *turn, NewsCategory::Visitor, message);
                    VisitOutcome::Purchased { amount, items }
                } else {
                    VisitOutcome::LeftEmptyHanded
                }
            }
            NpcAction::Browse => VisitOutcome::LeftEmptyHanded,
        };

        npc.effect_applied = true;
        debug!(npc = %npc.id, user = %npc.target_user_id, ?outcome, "Visitor resolved");
        events.push(TickEvent {
            at: now,
            kind: TickEventKind::VisitorResolved { npc, outcome },
        });
    }

    state.active_npcs = staying;
}

/// Walk the owner's stock in random order, taking each affordable item with
/// the given chance. Returns `(total spent, items bought)`. Shop stock is
/// decremented; menu items never run out.
fn shop_purchase(
    owner: &mut User,
    budget: i64,
    rng: &mut impl RandomSource,
    accept_percent: f64,
) -> (i64, u32) {
    let mut slots: SmallVec<[Slot; 16]> = SmallVec::new();
    slots.extend(
        owner
            .shop_items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.in_stock())
            .map(|(idx, _)| Slot::Shop(idx)),
    );
    slots.extend(
        owner
            .shop_menu
            .iter()
            .enumerate()
            .filter(|(_, item)| item.available)
            .map(|(idx, _)| Slot::Menu(idx)),
    );
    rng.shuffle(&mut slots);

    let mut remaining = budget.max(0);
    let mut total = 0i64;
    let mut bought = 0u32;
    for slot in slots {
        let price = match slot {
            Slot::Shop(idx) => owner.shop_items[idx].price,
            Slot::Menu(idx) => owner.shop_menu[idx].price,
        };
        if price <= 0 || price > remaining {
            continue;
        }
        if !rng.roll_percent(accept_percent) {
            continue;
        }
        remaining -= price;
        total += price;
        bought += 1;
        if let Slot::Shop(idx) = slot {
            let item = &mut owner.shop_items[idx];
            item.stock -= 1;
            if item.stock == 0 {
                item.sold_out = true;
            }
        }
    }
    (total, bought)
}
