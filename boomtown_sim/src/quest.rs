// Quest evaluation: one-time goals checked at every dawn.
//
// Each player carries a `QuestProgress` record per catalog quest. At dawn
// the evaluator seeds records for quests the player has neither started nor
// completed, refreshes progress on every active record, and completes the
// ones whose condition now holds. Completion grants the reward exactly once:
// the quest id goes into `User::completed_quest_ids`, which is append-only
// and checked before any reward is paid, and completed records are never
// evaluated again.
//
// Conditions are a closed enum evaluated against plain user fields. A quest
// record whose definition was removed from the catalog is left as it is.
//
// See also: `catalog.rs` for `QuestDefinition` and the built-in quests,
// `clock.rs` for where the dawn hook runs.

use crate::event::{TickEvent, TickEventKind};
use crate::journal::NewsCategory;
use crate::types::Timestamp;
use crate::world::{TransactionKind, User, WorldState};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A predicate over a user's current state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestCondition {
    /// Holds any job other than unemployed.
    HasJob,
    DebtFree,
    /// No tax owed outside payroll.
    TaxesSettled,
    BalanceAtLeast(i64),
    DepositAtLeast(i64),
    PopularityAtLeast(i64),
    RatingAtLeast(f64),
    /// Has at least one shop item or menu entry.
    OwnsShop,
}

impl QuestCondition {
    pub fn is_met(&self, user: &User) -> bool {
        match *self {
            QuestCondition::HasJob => user.has_job(),
            QuestCondition::DebtFree => user.debt <= 0,
            QuestCondition::TaxesSettled => user.unpaid_tax <= 0,
            QuestCondition::BalanceAtLeast(target) => user.balance >= target,
            QuestCondition::DepositAtLeast(target) => user.deposit >= target,
            QuestCondition::PopularityAtLeast(target) => user.popularity >= target,
            QuestCondition::RatingAtLeast(target) => user.effective_rating() >= target,
            QuestCondition::OwnsShop => user.owns_shop(),
        }
    }

    /// Completion percentage, 0–100. Threshold conditions report partial
    /// progress; yes/no conditions jump straight to 100.
    pub fn progress(&self, user: &User) -> u8 {
        if self.is_met(user) {
            return 100;
        }
        let ratio = match *self {
            QuestCondition::BalanceAtLeast(target) => ratio(user.balance as f64, target as f64),
            QuestCondition::DepositAtLeast(target) => ratio(user.deposit as f64, target as f64),
            QuestCondition::PopularityAtLeast(target) => {
                ratio(user.popularity as f64, target as f64)
            }
            QuestCondition::RatingAtLeast(target) => ratio(user.effective_rating(), target),
            _ => 0.0,
        };
        // Not met, so never report a full bar.
        ((ratio * 100.0).floor() as u8).min(99)
    }
}

fn ratio(current: f64, target: f64) -> f64 {
    if !(target.is_finite() && target > 0.0) || current <= 0.0 {
        return 0.0;
    }
    (current / target).clamp(0.0, 1.0)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    Active,
    Completed,
}

/// A player's standing on one quest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestProgress {
    pub quest_id: String,
    pub status: QuestStatus,
    /// Percent complete, 0–100.
    #[serde(default)]
    pub progress: u8,
    pub started_at: Timestamp,
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
}

/// Seed, refresh, and complete quests for every player.
pub fn evaluate_all(state: &mut WorldState, now: Timestamp, events: &mut Vec<TickEvent>) {
    let WorldState {
        users,
        catalog,
        news,
        turn,
        ..
    } = state;

    for user in users.values_mut().filter(|u| u.is_player()) {
        // Seed quests the player has never seen.
        let known: FxHashSet<&str> = user.quests.iter().map(|q| q.quest_id.as_str()).collect();
        let fresh: Vec<QuestProgress> = catalog
            .quests
            .iter()
            .filter(|def| {
                !known.contains(def.id.as_str()) && !user.completed_quest_ids.contains(&def.id)
            })
            .map(|def| QuestProgress {
                quest_id: def.id.clone(),
                status: QuestStatus::Active,
                progress: 0,
                started_at: now,
                completed_at: None,
            })
            .collect();
        drop(known);
        user.quests.extend(fresh);

        // Evaluate against a read-only view first, then apply.
        let outcomes: Vec<(usize, u8, bool)> = user
            .quests
            .iter()
            .enumerate()
            .filter(|(_, record)| record.status == QuestStatus::Active)
            .filter_map(|(idx, record)| {
                let def = catalog.quest(&record.quest_id)?;
                Some((idx, def.condition.progress(user), def.condition.is_met(user)))
            })
            .collect();

        for (idx, progress, met) in outcomes {
            let record = &mut user.quests[idx];
            record.progress = progress;
            if !met {
                continue;
            }
            record.status = QuestStatus::Completed;
            record.completed_at = Some(now);
            let quest_id = record.quest_id.clone();

            // Completed before (e.g. a restored record): no second reward.
            if !user.completed_quest_ids.insert(quest_id.clone()) {
                continue;
            }
            let Some(def) = catalog.quest(&quest_id) else {
                continue;
            };
            if def.reward_money != 0 {
                user.credit(
                    now,
                    TransactionKind::QuestReward,
                    def.reward_money,
                    format!("Quest reward: {}", def.title),
                );
            }
            user.popularity = user.popularity.saturating_add(def.reward_popularity);

            info!(user = %user.id, quest = %quest_id, reward = def.reward_money, "Quest completed");
            news.record(
                now,
                *turn,
                NewsCategory::Quest,
                format!("{} completed the quest \"{}\"!", user.name, def.title),
            );
            events.push(TickEvent {
                at: now,
                kind: TickEventKind::QuestCompleted {
                    user_id: user.id.clone(),
                    quest_id,
                },
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::QuestDefinition;
    use crate::types::Role;

    fn world_with_quest(condition: QuestCondition) -> WorldState {
        let mut world = WorldState::new(Timestamp(0));
        world.catalog.quests = vec![QuestDefinition {
            id: "q".into(),
            title: "Test quest".into(),
            condition,
            reward_money: 500,
            reward_popularity: 7,
        }];
        world.insert_user(User::new("p1", "Pat", Role::Player));
        world
    }

    #[test]
    fn quests_are_seeded_once() {
        let mut world = world_with_quest(QuestCondition::BalanceAtLeast(1_000));
        evaluate_all(&mut world, Timestamp(1), &mut Vec::new());
        evaluate_all(&mut world, Timestamp(2), &mut Vec::new());
        let quests = &world.user("p1").unwrap().quests;
        assert_eq!(quests.len(), 1);
        assert_eq!(quests[0].status, QuestStatus::Active);
        assert_eq!(quests[0].started_at, Timestamp(1));
    }

    #[test]
    fn partial_progress_is_tracked() {
        let mut world = world_with_quest(QuestCondition::BalanceAtLeast(1_000));
        world.user_mut("p1").unwrap().balance = 250;
        evaluate_all(&mut world, Timestamp(1), &mut Vec::new());
        assert_eq!(world.user("p1").unwrap().quests[0].progress, 25);
    }

    #[test]
    fn completion_pays_once() {
        let mut world = world_with_quest(QuestCondition::DebtFree);
        let mut events = Vec::new();
        evaluate_all(&mut world, Timestamp(1), &mut events);
        evaluate_all(&mut world, Timestamp(2), &mut events);

        let user = world.user("p1").unwrap();
        assert_eq!(user.balance, 500);
        assert_eq!(user.popularity, 7);
        assert_eq!(user.transactions.len(), 1);
        assert!(user.completed_quest_ids.contains("q"));
        assert_eq!(user.quests[0].status, QuestStatus::Completed);
        assert_eq!(user.quests[0].completed_at, Some(Timestamp(1)));
        assert_eq!(events.len(), 1);
        assert_eq!(world.news.len(), 1);
    }

    #[test]
    fn completed_id_blocks_reseeding_and_reward() {
        let mut world = world_with_quest(QuestCondition::DebtFree);
        world
            .user_mut("p1")
            .unwrap()
            .completed_quest_ids
            .insert("q".into());
        evaluate_all(&mut world, Timestamp(1), &mut Vec::new());
        let user = world.user("p1").unwrap();
        assert!(user.quests.is_empty());
        assert_eq!(user.balance, 0);
    }

    #[test]
    fn restored_active_record_with_completed_id_pays_nothing() {
        let mut world = world_with_quest(QuestCondition::DebtFree);
        let user = world.user_mut("p1").unwrap();
        user.completed_quest_ids.insert("q".into());
        user.quests.push(QuestProgress {
            quest_id: "q".into(),
            status: QuestStatus::Active,
            progress: 0,
            started_at: Timestamp(0),
            completed_at: None,
        });
        evaluate_all(&mut world, Timestamp(1), &mut Vec::new());
        let user = world.user("p1").unwrap();
        assert_eq!(user.quests[0].status, QuestStatus::Completed);
        assert_eq!(user.balance, 0);
        assert!(user.transactions.is_empty());
    }

    #[test]
    fn bankers_do_not_take_quests() {
        let mut world = world_with_quest(QuestCondition::DebtFree);
        world.insert_user(User::new("b1", "Bo", Role::Banker));
        evaluate_all(&mut world, Timestamp(1), &mut Vec::new());
        assert!(world.user("b1").unwrap().quests.is_empty());
    }

    #[test]
    fn conditions_read_user_fields() {
        let mut user = User::new("p", "P", Role::Player);
        assert!(QuestCondition::TaxesSettled.is_met(&user));
        user.unpaid_tax = 10;
        assert!(!QuestCondition::TaxesSettled.is_met(&user));
        user.rating = 4.0;
        assert!(!QuestCondition::RatingAtLeast(4.5).is_met(&user));
        assert_eq!(QuestCondition::RatingAtLeast(5.0).progress(&user), 80);
        assert_eq!(QuestCondition::OwnsShop.progress(&user), 0);
    }

    #[test]
    fn condition_json_shape() {
        let json = serde_json::to_string(&QuestCondition::DepositAtLeast(10)).unwrap();
        assert_eq!(json, r#"{"deposit_at_least":10}"#);
        let cond: QuestCondition = serde_json::from_str(r#""owns_shop""#).unwrap();
        assert_eq!(cond, QuestCondition::OwnsShop);
    }
}
