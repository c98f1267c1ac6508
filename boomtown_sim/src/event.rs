// Structured tick output.
//
// Every tick returns the list of `TickEvent`s it produced, alongside the new
// state. These are the machine-readable twin of the journal: drivers use
// them for logging, metrics, push notifications, or tests, without parsing
// news text. They are not stored on the world.
//
// See also: `journal.rs` for the persistent, human-readable news feed,
// `sim.rs` for `TickResult`.

use crate::global_event::EventKind;
use crate::npc::{Npc, NpcAction};
use crate::types::{EventId, NpcId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Something that happened during a tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TickEvent {
    pub at: Timestamp,
    pub kind: TickEventKind,
}

/// How a visitor's stay ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitOutcome {
    /// Bought `items` items for `amount` in total.
    Purchased { amount: i64, items: u32 },
    /// Took `amount` from the owner (theft or scam).
    Stole { amount: i64 },
    /// Looked around and left.
    LeftEmptyHanded,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TickEventKind {
    /// Day/night flipped. `turn` is the turn number after the flip.
    PhaseChanged { is_day: bool, turn: u64 },
    /// Dawn payroll for one user.
    SalaryPaid {
        user_id: UserId,
        gross: i64,
        tax: i64,
        saved: i64,
        cash: i64,
    },
    /// Dawn walk-in sales for one shop.
    ShopSales {
        user_id: UserId,
        customers: u64,
        amount: i64,
    },
    QuestCompleted { user_id: UserId, quest_id: String },
    VisitorArrived {
        npc_id: NpcId,
        user_id: UserId,
        action: NpcAction,
    },
    /// A visitor left and its effect was applied. `npc` is the final record,
    /// with `effect_applied` set.
    VisitorResolved { npc: Npc, outcome: VisitOutcome },
    EventStarted { event_id: EventId, kind: EventKind },
    EventExpired { event_id: EventId, kind: EventKind },
    Arrested { user_id: UserId, fine: i64 },
    DebtInterestCharged { user_id: UserId, amount: i64 },
}
