// Read-only reference tables: jobs, NPC templates, event templates, quests.
//
// The engine only reads these. They are owned by content authors and shipped
// as JSON next to the game config; `Catalog::default()` is the built-in
// content set used by tests and the demo driver.
//
// Lookups never fail the tick. An unknown job pays nothing, an empty NPC
// table falls back to a generic "Guest" browser, an empty event table simply
// never spawns anything, and a quest record whose definition disappeared is
// left untouched.
//
// See also: `npc.rs` (`NpcKind`, `NpcAction`), `global_event.rs`
// (`EventKind`), `quest.rs` (`QuestCondition`), `config.rs` for the error
// type returned by `Catalog::from_json`.

use crate::config::ConfigError;
use crate::global_event::EventKind;
use crate::npc::{NpcAction, NpcKind};
use crate::quest::QuestCondition;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Job key used when a player has no job type or an unknown one.
pub const UNEMPLOYED_JOB: &str = "unemployed";

/// Template id stamped on NPCs spawned from the fallback template.
pub const GUEST_TEMPLATE_ID: &str = "guest";

/// A job a player can hold, keyed by job type in `Catalog::jobs`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobDefinition {
    pub title: String,
    /// Base salary paid at dawn, before rating bonus, multiplier, and tax.
    pub salary: i64,
}

/// Blueprint for a visiting NPC, keyed by template id in
/// `Catalog::npc_templates`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NpcTemplate {
    pub name: String,
    pub kind: NpcKind,
    pub action: NpcAction,
    /// Visit length `(min, max)` in milliseconds. `None` uses the config default.
    #[serde(default)]
    pub visit_ms: Option<(u64, u64)>,
    /// Amount taken by a thief or scammer `(min, max)`. `None` uses the
    /// config default.
    #[serde(default)]
    pub steal_range: Option<(u64, u64)>,
}

impl NpcTemplate {
    /// The minimal visitor used when the template table is empty.
    pub fn guest() -> Self {
        Self {
            name: "Guest".into(),
            kind: NpcKind::Other,
            action: NpcAction::Browse,
            visit_ms: None,
            steal_range: None,
        }
    }
}

/// Blueprint for a global random event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventTemplate {
    pub kind: EventKind,
    pub title: String,
    pub duration_ms: u64,
    /// Multiplier for durational kinds, flat amount for `Grant`, fraction
    /// for `TaxHike`.
    pub effect_value: f64,
}

/// A one-time goal with a reward.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestDefinition {
    pub id: String,
    pub title: String,
    pub condition: QuestCondition,
    #[serde(default)]
    pub reward_money: i64,
    #[serde(default)]
    pub reward_popularity: i64,
}

/// All static reference data the engine consumes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub jobs: BTreeMap<String, JobDefinition>,
    pub npc_templates: BTreeMap<String, NpcTemplate>,
    pub event_templates: Vec<EventTemplate>,
    pub quests: Vec<QuestDefinition>,
}

impl Catalog {
    /// Parse and validate a catalog from JSON. Missing tables keep the
    /// built-in defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, job) in &self.jobs {
            if job.salary < 0 {
                return Err(ConfigError::invalid(
                    format!("jobs.{key}.salary"),
                    "must not be negative",
                ));
            }
        }
        for (key, template) in &self.npc_templates {
            for (field, range) in [("visit_ms", template.visit_ms), ("steal_range", template.steal_range)] {
                if let Some((low, high)) = range {
                    if low > high {
                        return Err(ConfigError::invalid(
                            format!("npc_templates.{key}.{field}"),
                            format!("range minimum {low} exceeds maximum {high}"),
                        ));
                    }
                }
            }
        }
        for (idx, template) in self.event_templates.iter().enumerate() {
            if template.duration_ms == 0 {
                return Err(ConfigError::invalid(
                    format!("event_templates[{idx}].duration_ms"),
                    "must be at least 1",
                ));
            }
            if !template.effect_value.is_finite() {
                return Err(ConfigError::invalid(
                    format!("event_templates[{idx}].effect_value"),
                    "must be a finite number",
                ));
            }
        }
        let mut seen = BTreeSet::new();
        for quest in &self.quests {
            if !seen.insert(quest.id.as_str()) {
                return Err(ConfigError::invalid(
                    format!("quests.{}", quest.id),
                    "duplicate quest id",
                ));
            }
        }
        Ok(())
    }

    /// Salary for a job type; unknown or missing types pay the unemployed rate.
    pub fn salary_for(&self, job_type: Option<&str>) -> i64 {
        let key = job_type.unwrap_or(UNEMPLOYED_JOB);
        self.jobs
            .get(key)
            .or_else(|| self.jobs.get(UNEMPLOYED_JOB))
            .map_or(0, |job| job.salary.max(0))
    }

    pub fn quest(&self, id: &str) -> Option<&QuestDefinition> {
        self.quests.iter().find(|q| q.id == id)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        let job = |title: &str, salary: i64| JobDefinition {
            title: title.into(),
            salary,
        };
        let jobs = BTreeMap::from([
            (UNEMPLOYED_JOB.to_owned(), job("Unemployed", 0)),
            ("cashier".to_owned(), job("Cashier", 2_500)),
            ("teacher".to_owned(), job("Teacher", 3_500)),
            ("chef".to_owned(), job("Chef", 4_000)),
            ("police".to_owned(), job("Police Officer", 4_500)),
            ("programmer".to_owned(), job("Programmer", 6_000)),
            ("doctor".to_owned(), job("Doctor", 8_000)),
        ]);

        let npc = |name: &str, kind, action, visit_ms, steal_range| NpcTemplate {
            name: name.into(),
            kind,
            action,
            visit_ms,
            steal_range,
        };
        let npc_templates = BTreeMap::from([
            (
                "shopper".to_owned(),
                npc("Regular Shopper", NpcKind::Customer, NpcAction::Purchase, None, None),
            ),
            (
                "tourist".to_owned(),
                npc(
                    "Tourist",
                    NpcKind::Customer,
                    NpcAction::Purchase,
                    Some((8_000, 12_000)),
                    None,
                ),
            ),
            (
                "window_shopper".to_owned(),
                npc("Window Shopper", NpcKind::Other, NpcAction::Browse, None, None),
            ),
            (
                "pickpocket".to_owned(),
                npc("Pickpocket", NpcKind::Other, NpcAction::Theft, None, None),
            ),
            (
                "con_artist".to_owned(),
                npc(
                    "Con Artist",
                    NpcKind::Other,
                    NpcAction::Scam,
                    Some((15_000, 20_000)),
                    Some((500, 2_000)),
                ),
            ),
        ]);

        let event = |kind, title: &str, duration_ms, effect_value| EventTemplate {
            kind,
            title: title.into(),
            duration_ms,
            effect_value,
        };
        let event_templates = vec![
            event(EventKind::Boom, "Economic Boom", 300_000, 1.5),
            event(EventKind::Recession, "Recession", 300_000, 0.7),
            event(EventKind::Grant, "Government Stimulus", 60_000, 1_000.0),
            event(EventKind::TaxHike, "Emergency Tax", 60_000, 0.1),
            event(EventKind::Festival, "Town Festival", 180_000, 1.3),
            event(EventKind::Epidemic, "Flu Outbreak", 240_000, 0.6),
            event(EventKind::Disaster, "Earthquake", 120_000, 0.5),
            event(EventKind::Heatwave, "Heatwave", 180_000, 0.9),
            event(EventKind::Coldwave, "Cold Snap", 180_000, 0.85),
            event(EventKind::Viral, "Viral Trend", 120_000, 1.4),
            event(EventKind::Scandal, "Market Scandal", 120_000, 0.8),
        ];

        let quest = |id: &str, title: &str, condition, reward_money, reward_popularity| {
            QuestDefinition {
                id: id.into(),
                title: title.into(),
                condition,
                reward_money,
                reward_popularity,
            }
        };
        let quests = vec![
            quest("quest_first_job", "Get a job", QuestCondition::HasJob, 1_000, 10),
            quest("quest_debt_free", "Debt free", QuestCondition::DebtFree, 5_000, 20),
            quest(
                "quest_shopkeeper",
                "Open a shop",
                QuestCondition::OwnsShop,
                1_500,
                15,
            ),
            quest(
                "quest_nest_egg",
                "Save 10,000 in deposits",
                QuestCondition::DepositAtLeast(10_000),
                2_000,
                10,
            ),
            quest(
                "quest_local_star",
                "Reach 200 popularity",
                QuestCondition::PopularityAtLeast(200),
                3_000,
                0,
            ),
            quest(
                "quest_five_stars",
                "Earn a 4.5 rating",
                QuestCondition::RatingAtLeast(4.5),
                2_500,
                25,
            ),
            quest(
                "quest_first_fortune",
                "Hold 50,000 in cash",
                QuestCondition::BalanceAtLeast(50_000),
                5_000,
                30,
            ),
        ];

        Self {
            jobs,
            npc_templates,
            event_templates,
            quests,
        }
    }
}
