// The world snapshot: the single aggregate every tick reads and rewrites.
//
// `WorldState` owns the phase clock, the per-game settings, all users, the
// active NPCs and global events, the read-only catalog and engine config,
// and the news journal. It is a plain value: the driver loads it, hands it
// to `sim::tick`, and persists whatever comes back. Nothing in here is
// global or hidden.
//
// `User` carries the account (balance, deposit, debt), the player's job and
// shop, illegal holdings for the risk engine, an append-only transaction
// ledger, and quest progress. Balance mutations that should appear in the
// ledger go through `User::credit` / `User::debit_floored` so the two never
// drift apart.
//
// Most fields use `#[serde(default)]` so that snapshots written by older
// builds (or hand-edited by an admin) still load; anything missing heals to
// a sensible default on the next tick.
//
// See also: `sim.rs` for the tick entry point, `clock.rs` for `Cadence` and
// the self-healing rules, `quest.rs` for `QuestProgress`.

use crate::catalog::{Catalog, UNEMPLOYED_JOB};
use crate::clock::Cadence;
use crate::config::{GameConfig, Settings};
use crate::global_event::GameEvent;
use crate::journal::Journal;
use crate::npc::Npc;
use crate::quest::QuestProgress;
use crate::types::*;
use boomtown_prng::GameRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Why money moved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Salary,
    ShopSales,
    NpcPurchase,
    NpcTheft,
    QuestReward,
    EventGrant,
    EventTaxHike,
    Fine,
    DebtInterest,
}

/// One ledger line. `amount` is the signed change to the user's balance,
/// except for `DebtInterest`, where it is the amount added to the debt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub at: Timestamp,
    pub kind: TransactionKind,
    pub amount: i64,
    pub description: String,
}

// ---------------------------------------------------------------------------
// Shop and inventory
// ---------------------------------------------------------------------------

/// A stocked product in a player's shop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShopItem {
    pub name: String,
    pub price: i64,
    pub stock: u32,
    #[serde(default)]
    pub sold_out: bool,
}

impl ShopItem {
    pub fn in_stock(&self) -> bool {
        self.stock > 0 && !self.sold_out
    }
}

/// A dish or service on a player's menu. Menus have no stock count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub price: i64,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

/// Something a user carries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub is_illegal: bool,
}

fn default_quantity() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    pub balance: i64,
    pub deposit: i64,
    pub debt: i64,
    /// Tax owed outside payroll. Settled by the banking flow; the engine
    /// only reads it.
    pub unpaid_tax: i64,
    /// Display name of the job.
    pub job: Option<String>,
    /// Key into `Catalog::jobs`.
    pub job_type: Option<String>,
    /// Shop rating, nominally 0–5.
    pub rating: f64,
    pub popularity: i64,
    /// On vacation: no salary, no shop traffic, no visitors.
    pub is_off: bool,
    pub shop_items: Vec<ShopItem>,
    pub shop_menu: Vec<MenuItem>,
    /// Shares of forbidden stocks, by ticker.
    pub forbidden_stocks: BTreeMap<String, u64>,
    pub inventory: Vec<InventoryItem>,
    pub transactions: Vec<Transaction>,
    pub quests: Vec<QuestProgress>,
    pub completed_quest_ids: BTreeSet<String>,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId::new(id),
            name: name.into(),
            role,
            ..Self::default()
        }
    }

    pub fn is_player(&self) -> bool {
        self.role == Role::Player
    }

    pub fn owns_shop(&self) -> bool {
        !self.shop_items.is_empty() || !self.shop_menu.is_empty()
    }

    pub fn has_job(&self) -> bool {
        self.job_type
            .as_deref()
            .is_some_and(|job| !job.is_empty() && job != UNEMPLOYED_JOB)
    }

    /// Any non-zero forbidden-stock position or illegal inventory item.
    pub fn holds_illegal_assets(&self) -> bool {
        self.forbidden_stocks.values().any(|&shares| shares > 0)
            || self
                .inventory
                .iter()
                .any(|item| item.is_illegal && item.quantity > 0)
    }

    /// Rating clamped to a usable number. Corrupt values count as zero.
    pub fn effective_rating(&self) -> f64 {
        if self.rating.is_finite() && self.rating > 0.0 {
            self.rating
        } else {
            0.0
        }
    }

    /// Add `amount` to the balance and record it in the ledger.
    pub fn credit(
        &mut self,
        at: Timestamp,
        kind: TransactionKind,
        amount: i64,
        description: impl Into<String>,
    ) {
        self.balance = self.balance.saturating_add(amount);
        self.transactions.push(Transaction {
            at,
            kind,
            amount,
            description: description.into(),
        });
    }

    /// Take up to `amount` from the balance without pushing it below zero.
    /// Records the amount actually taken (if any) and returns it.
    pub fn debit_floored(
        &mut self,
        at: Timestamp,
        kind: TransactionKind,
        amount: i64,
        description: impl Into<String>,
    ) -> i64 {
        let taken = amount.clamp(0, self.balance.max(0));
        if taken > 0 {
            self.balance -= taken;
            self.transactions.push(Transaction {
                at,
                kind,
                amount: -taken,
                description: description.into(),
            });
        }
        taken
    }
}

// ---------------------------------------------------------------------------
// WorldState
// ---------------------------------------------------------------------------

/// The whole game world for one game instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    /// Full day+night cycles completed, starting at 1. Increments on
    /// night→day only.
    pub turn: u64,
    pub is_day: bool,
    /// Countdown to the next phase flip. `None` heals to the turn duration.
    #[serde(default)]
    pub time_remaining_ms: Option<u64>,
    /// Wall-clock time of the last tick that did work. `None` heals to `now`.
    #[serde(default)]
    pub last_tick: Option<Timestamp>,
    /// Pause flag. While false the countdown is frozen.
    #[serde(default = "default_running")]
    pub is_timer_running: bool,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub weather: Weather,
    #[serde(default)]
    pub users: BTreeMap<UserId, User>,
    /// Global events in effect. The scheduler keeps at most one.
    #[serde(default)]
    pub active_events: Vec<GameEvent>,
    #[serde(default)]
    pub active_npcs: Vec<Npc>,
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default)]
    pub config: GameConfig,
    /// Last-run timestamps of the sub-tick components.
    #[serde(default)]
    pub cadence: Cadence,
    /// Counter for NPC and event ids.
    #[serde(default)]
    pub next_entity_id: u64,
    #[serde(default)]
    pub news: Journal,
    /// Position of the driver's random stream, saved with the snapshot so a
    /// restart picks up where it left off. The engine never reads it; every
    /// roll goes through the `RandomSource` passed to `advance`.
    #[serde(default)]
    pub rng_state: Option<GameRng>,
}

fn default_running() -> bool {
    true
}

impl Default for WorldState {
    fn default() -> Self {
        Self::with_config(None, GameConfig::default(), Catalog::default())
    }
}

impl WorldState {
    /// A fresh world starting in daylight on turn 1, with the built-in
    /// config and catalog.
    pub fn new(now: Timestamp) -> Self {
        Self::with_config(Some(now), GameConfig::default(), Catalog::default())
    }

    /// A fresh world with the given config and catalog. When `now` is
    /// `None` the clock fields are left for the first tick to heal.
    pub fn with_config(now: Option<Timestamp>, config: GameConfig, catalog: Catalog) -> Self {
        let settings = Settings {
            turn_duration_ms: config.default_turn_duration_ms,
            ..Settings::default()
        };
        let news = Journal::with_capacity(config.news_capacity);
        Self {
            turn: 1,
            is_day: true,
            time_remaining_ms: now.map(|_| settings.turn_duration_ms),
            last_tick: now,
            is_timer_running: true,
            settings,
            weather: Weather::default(),
            users: BTreeMap::new(),
            active_events: Vec::new(),
            active_npcs: Vec::new(),
            catalog,
            config,
            cadence: Cadence::starting_at(now),
            next_entity_id: 1,
            news,
            rng_state: None,
        }
    }

    /// Register a user, replacing any existing user with the same id.
    pub fn insert_user(&mut self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.get(&UserId::from(id))
    }

    pub fn user_mut(&mut self, id: &str) -> Option<&mut User> {
        self.users.get_mut(&UserId::from(id))
    }

    /// Mint a fresh id for an NPC or event.
    pub(crate) fn alloc_id(&mut self) -> u64 {
        let id = self.next_entity_id.max(1);
        self.next_entity_id = id + 1;
        id
    }

    /// Serialize the world snapshot to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize a world snapshot. Missing fields take their defaults and
    /// are healed on the next tick.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut state: WorldState = serde_json::from_str(json)?;
        state.news.set_capacity(state.config.news_capacity);
        Ok(state)
    }
}
