// Behavioural properties of the tick function.
//
// Each test drives `tick` / `WorldState::advance` the way a driver would:
// a sequence of polls with increasing wall-clock timestamps. Scripted random
// sources pin down every roll where the outcome matters; seeded `GameRng`
// runs cover long randomized sequences.

use boomtown_sim::catalog::EventTemplate;
use boomtown_sim::event::TickEventKind;
use boomtown_sim::global_event::EventKind;
use boomtown_sim::journal::NewsCategory;
use boomtown_sim::npc::{Npc, NpcAction, NpcKind};
use boomtown_sim::prng::{GameRng, ScriptedRng};
use boomtown_sim::quest::QuestStatus;
use boomtown_sim::sim::tick;
use boomtown_sim::types::*;
use boomtown_sim::world::{InventoryItem, ShopItem, TransactionKind, User, WorldState};

/// A value that never wins a spawn, event, or arrest roll.
const QUIET: f64 = 0.99;

fn shop_owner(id: &str) -> User {
    let mut user = User::new(id, "Olive", Role::Player);
    user.balance = 5_000;
    user.shop_items.push(ShopItem {
        name: "Lamp".into(),
        price: 400,
        stock: 10,
        sold_out: false,
    });
    user
}

/// Start at `start` with `remaining_ms` of night left.
fn night_world(start: u64, remaining_ms: u64) -> WorldState {
    let mut world = WorldState::new(Timestamp(start));
    world.is_day = false;
    world.time_remaining_ms = Some(remaining_ms);
    world
}

// ---------------------------------------------------------------------------
// Clock gate
// ---------------------------------------------------------------------------

#[test]
fn no_op_below_threshold() {
    for start in [0u64, 1, 59_999, 1_000_000] {
        for delta in [0u64, 1, 500, 999] {
            let mut world = WorldState::new(Timestamp(start));
            world.insert_user(shop_owner("o"));
            let before = world.clone();
            let result = tick(world, Timestamp(start + delta), &mut ScriptedRng::constant(0.0));
            assert!(!result.has_changed, "start {start} delta {delta}");
            assert_eq!(result.state.last_tick, before.last_tick);
            assert_eq!(result.state.time_remaining_ms, before.time_remaining_ms);
            assert_eq!(result.state, before);
        }
    }
}

#[test]
fn pause_integrity() {
    let mut world = WorldState::new(Timestamp(0));
    world.is_timer_running = false;
    world.time_remaining_ms = Some(500);
    let mut rng = ScriptedRng::constant(0.0);
    for now in (250..200_000).step_by(3_333) {
        let result = tick(world, Timestamp(now), &mut rng);
        world = result.state;
        assert_eq!(world.last_tick, Some(Timestamp(now)));
        assert_eq!(world.time_remaining_ms, Some(500));
        assert!(world.is_day);
        assert_eq!(world.turn, 1);
        assert!(result.events.is_empty());
    }
}

#[test]
fn phase_flip_with_short_elapsed_time() {
    let mut world = WorldState::new(Timestamp(10_000));
    // The gate must admit a 600 ms step for this check.
    world.config.clock_gate_ms = 500;
    world.time_remaining_ms = Some(500);
    world.settings.turn_duration_ms = 60_000;
    let news_before = world.news.len();

    let result = tick(world, Timestamp(10_600), &mut ScriptedRng::constant(QUIET));
    let world = result.state;
    assert!(result.has_changed);
    assert!(!world.is_day);
    assert_eq!(world.time_remaining_ms, Some(60_000));
    assert_eq!(world.news.len(), news_before + 1);
    let entry = world.news.latest().unwrap();
    assert!(entry.message.to_lowercase().contains("night"));
}

#[test]
fn turn_monotonicity() {
    let mut world = WorldState::new(Timestamp(0));
    world.settings.turn_duration_ms = 3_000;
    world.insert_user(shop_owner("o"));
    let mut rng = GameRng::new(42);
    let mut dawns = 0;

    for step in 1..=400u64 {
        // Irregular polling: some polls land inside the gate, some skip ahead.
        let now = Timestamp(step * 700 + (step % 3) * 900);
        let was_day = world.is_day;
        let turn_before = world.turn;
        world.advance(now, &mut rng);

        match (was_day, world.is_day) {
            (false, true) => {
                assert_eq!(world.turn, turn_before + 1);
                dawns += 1;
            }
            _ => assert_eq!(world.turn, turn_before),
        }
        assert!(world.time_remaining_ms.is_some());
    }
    assert!(dawns > 10);
}

// ---------------------------------------------------------------------------
// NPC lifecycle
// ---------------------------------------------------------------------------

#[test]
fn departing_visitor_is_resolved_once() {
    let mut world = WorldState::new(Timestamp(0));
    world.insert_user(shop_owner("o"));
    world.active_npcs.push(Npc {
        id: NpcId(500),
        target_user_id: UserId::from("o"),
        template_id: "pickpocket".into(),
        name: "Pickpocket".into(),
        kind: NpcKind::Other,
        action: NpcAction::Theft,
        entry_time: Timestamp(0),
        leave_time: Timestamp(1_000),
        effect_applied: false,
        budget: 0,
    });

    let mut rng = ScriptedRng::constant(QUIET);
    let first = tick(world, Timestamp(1_000), &mut rng);
    assert!(first.state.active_npcs.is_empty());
    // 100 + floor(0.99 * 901)
    assert_eq!(first.state.user("o").unwrap().balance, 5_000 - 991);
    let resolved: Vec<_> = first
        .events
        .iter()
        .filter_map(|e| match &e.kind {
            TickEventKind::VisitorResolved { npc, .. } => Some(npc),
            _ => None,
        })
        .collect();
    assert_eq!(resolved.len(), 1);
    assert!(resolved[0].effect_applied);

    let second = tick(first.state, Timestamp(3_000), &mut rng);
    assert_eq!(second.state.user("o").unwrap().balance, 5_000 - 991);
    assert_eq!(second.state.user("o").unwrap().transactions.len(), 1);
}

#[test]
fn visitors_of_a_deleted_user_vanish() {
    let mut world = WorldState::new(Timestamp(0));
    world.insert_user(shop_owner("o"));
    let mut rng = ScriptedRng::constant(0.0);
    // Spawn pass at 2 s always hits with a zero roll.
    world.advance(Timestamp(2_000), &mut rng);
    assert_eq!(world.active_npcs.len(), 1);

    world.users.clear();
    world.advance(Timestamp(3_000), &mut rng);
    assert!(world.active_npcs.is_empty());
}

#[test]
fn spawn_cadence_is_independent_of_polling_rate() {
    let mut world = WorldState::new(Timestamp(0));
    world.insert_user(shop_owner("o"));
    world.catalog.event_templates.clear();
    // Every roll hits; the con artist (first template) stays 15 s.
    let mut rng = ScriptedRng::constant(0.0);
    for second in 1..=10u64 {
        world.advance(Timestamp(second * 1_000), &mut rng);
    }
    // Passes at 2, 4, 6, 8 and 10 seconds.
    assert_eq!(world.active_npcs.len(), 5);
    assert!(world.active_npcs.iter().all(|n| !n.effect_applied));
}

#[test]
fn slow_polling_spawns_as_many_visitors() {
    let mut world = WorldState::new(Timestamp(0));
    world.insert_user(shop_owner("o"));
    world.catalog.event_templates.clear();
    let mut rng = ScriptedRng::constant(0.0);
    // One poll after ten seconds owes the same five spawn passes.
    world.advance(Timestamp(10_000), &mut rng);
    assert_eq!(world.active_npcs.len(), 5);
    assert_eq!(world.cadence.npc_spawn, Some(Timestamp(10_000)));
}

#[test]
fn no_visitors_spawn_at_night() {
    let mut world = night_world(0, 600_000);
    world.insert_user(shop_owner("o"));
    let mut rng = ScriptedRng::constant(0.0);
    for second in 1..=20u64 {
        world.advance(Timestamp(second * 1_000), &mut rng);
    }
    assert!(world.active_npcs.is_empty());
}

// ---------------------------------------------------------------------------
// Global events
// ---------------------------------------------------------------------------

#[test]
fn event_exclusivity_over_a_long_run() {
    let mut world = WorldState::new(Timestamp(0));
    world.config.event_spawn_percent = 100.0;
    world.settings.turn_duration_ms = 10_000;
    world.insert_user(shop_owner("o"));
    let mut rng = GameRng::new(9);
    let mut started = 0;

    for second in 1..=2_000u64 {
        let now = Timestamp(second * 1_000);
        let step = world.advance(now, &mut rng);
        assert!(world.active_events.len() <= 1);
        assert!(world.active_events.iter().all(|e| e.is_active_at(now)));
        started += step
            .events
            .iter()
            .filter(|e| matches!(e.kind, TickEventKind::EventStarted { .. }))
            .count();
    }
    assert!(started > 1);
}

#[test]
fn grant_respects_money_multiplier() {
    let mut world = WorldState::new(Timestamp(0));
    world.settings.money_multiplier = 2.0;
    world.catalog.event_templates = vec![EventTemplate {
        kind: EventKind::Grant,
        title: "Stimulus".into(),
        duration_ms: 5_000,
        effect_value: 1_000.0,
    }];
    world.insert_user(User::new("p", "Pat", Role::Player));
    let result = tick(world, Timestamp(1_000), &mut ScriptedRng::new(vec![0.0, 0.0, QUIET]));
    let pat = result.state.user("p").unwrap();
    assert_eq!(pat.balance, 2_000);
    assert_eq!(pat.transactions[0].kind, TransactionKind::EventGrant);
}

// ---------------------------------------------------------------------------
// Quests
// ---------------------------------------------------------------------------

/// Advance one second at a time until `dawns` more dawns have happened.
fn run_until_dawns(world: &mut WorldState, clock: &mut u64, dawns: u32, rng: &mut ScriptedRng) {
    let mut seen = 0;
    while seen < dawns {
        *clock += 1_000;
        let step = world.advance(Timestamp(*clock), &mut *rng);
        seen += step
            .events
            .iter()
            .filter(|e| matches!(e.kind, TickEventKind::PhaseChanged { is_day: true, .. }))
            .count() as u32;
    }
}

#[test]
fn debt_free_quest_scenario() {
    let mut world = night_world(0, 1_000);
    world.settings.turn_duration_ms = 2_000;
    let mut debtor = User::new("d", "Dana", Role::Player);
    debtor.debt = 500;
    world.insert_user(debtor);
    let mut rng = ScriptedRng::constant(QUIET);
    let mut clock = 0;

    // First dawn seeds the quest while the debt is still open.
    run_until_dawns(&mut world, &mut clock, 1, &mut rng);
    let debtor = world.user("d").unwrap();
    let record = debtor
        .quests
        .iter()
        .find(|q| q.quest_id == "quest_debt_free")
        .unwrap();
    assert_eq!(record.status, QuestStatus::Active);
    assert!(debtor.transactions.is_empty());

    // Debt is paid off outside the engine.
    world.user_mut("d").unwrap().debt = 0;
    let quest_news_before = world
        .news
        .entries()
        .filter(|e| e.category == NewsCategory::Quest)
        .count();

    run_until_dawns(&mut world, &mut clock, 1, &mut rng);
    let debtor = world.user("d").unwrap();
    assert!(debtor.completed_quest_ids.contains("quest_debt_free"));
    let record = debtor
        .quests
        .iter()
        .find(|q| q.quest_id == "quest_debt_free")
        .unwrap();
    assert_eq!(record.status, QuestStatus::Completed);
    assert_eq!(record.progress, 100);
    assert_eq!(debtor.balance, 5_000);
    assert_eq!(debtor.popularity, 20);
    let rewards: Vec<_> = debtor
        .transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::QuestReward)
        .collect();
    assert_eq!(rewards.len(), 1);
    assert_eq!(rewards[0].amount, 5_000);
    let quest_news: Vec<_> = world
        .news
        .entries()
        .filter(|e| e.category == NewsCategory::Quest)
        .collect();
    assert_eq!(quest_news.len(), quest_news_before + 1);
    assert!(quest_news[0].message.contains("Debt free"));
}

#[test]
fn quest_reward_is_never_paid_twice() {
    let mut world = night_world(0, 1_000);
    world.settings.turn_duration_ms = 2_000;
    world.insert_user(User::new("p", "Pat", Role::Player));
    let mut rng = ScriptedRng::constant(QUIET);
    let mut clock = 0;

    run_until_dawns(&mut world, &mut clock, 6, &mut rng);
    let pat = world.user("p").unwrap();
    // Debt-free holds from the very first dawn and keeps holding.
    let rewards = pat
        .transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::QuestReward)
        .count();
    assert_eq!(rewards, 1);
    assert_eq!(pat.balance, 5_000);
    assert_eq!(pat.completed_quest_ids.len(), 1);
}

// ---------------------------------------------------------------------------
// Economy
// ---------------------------------------------------------------------------

#[test]
fn rainy_shop_scenario() {
    for roll in [0.0, 0.34, 0.7, 0.99] {
        let mut world = night_world(0, 1_000);
        world.weather = Weather::Rain;
        let mut owner = User::new("o", "Olive", Role::Player);
        owner.rating = 3.0;
        owner.popularity = 100;
        owner.shop_items.push(ShopItem {
            name: "Umbrella".into(),
            price: 900,
            stock: 5,
            sold_out: false,
        });
        world.insert_user(owner);

        // First draw feeds the walk-in roll; the event roll misses.
        let mut rng = ScriptedRng::new(vec![roll, QUIET]);
        let result = tick(world, Timestamp(1_000), &mut rng);
        let world = result.state;
        assert!(world.is_day);

        let customers = (roll * 3.0).floor() as u64 + 1;
        let expected = (customers as f64 * 100.0 * 0.8).floor() as i64;
        let owner = world.user("o").unwrap();
        let sales: Vec<_> = owner
            .transactions
            .iter()
            .filter(|t| t.kind == TransactionKind::ShopSales)
            .collect();
        assert_eq!(sales.len(), 1, "roll {roll}");
        assert_eq!(sales[0].amount, expected, "roll {roll}");
        assert!(
            world
                .news
                .entries()
                .any(|e| e.category == NewsCategory::Economy
                    && e.message.contains(&format!("earned {expected}")))
        );
    }
}

// ---------------------------------------------------------------------------
// Risk
// ---------------------------------------------------------------------------

#[test]
fn patrol_only_fines_at_night() {
    let mut world = WorldState::new(Timestamp(0));
    world.time_remaining_ms = Some(5_000);
    world.catalog.event_templates.clear();
    let mut smuggler = User::new("s", "Sly", Role::Player);
    smuggler.balance = 10_000;
    smuggler.inventory.push(InventoryItem {
        name: "Contraband".into(),
        quantity: 1,
        is_illegal: true,
    });
    world.insert_user(smuggler);

    // Every arrest roll hits.
    let mut rng = ScriptedRng::constant(0.0);
    for second in 1..=4u64 {
        world.advance(Timestamp(second * 1_000), &mut rng);
        assert!(world.is_day);
        assert_eq!(world.user("s").unwrap().balance, 10_000);
    }

    let step = world.advance(Timestamp(5_000), &mut rng);
    assert!(!world.is_day);
    assert!(step
        .events
        .iter()
        .any(|e| matches!(e.kind, TickEventKind::Arrested { fine: 5_000, .. })));
    assert_eq!(world.user("s").unwrap().balance, 5_000);
}

fn arrests_over_a_night(poll_every_ms: u64) -> usize {
    let mut world = night_world(0, 600_000);
    world.catalog.event_templates.clear();
    world.config.risk_arrest_percent = 100.0;
    let mut smuggler = User::new("s", "Sly", Role::Player);
    smuggler.balance = 1_000_000;
    smuggler.forbidden_stocks.insert("SHDY".into(), 5);
    world.insert_user(smuggler);

    let mut rng = ScriptedRng::constant(0.0);
    let mut arrests = 0;
    let mut clock = 0;
    while clock < 100_000 {
        clock += poll_every_ms;
        let step = world.advance(Timestamp(clock), &mut rng);
        arrests += step
            .events
            .iter()
            .filter(|e| matches!(e.kind, TickEventKind::Arrested { .. }))
            .count();
    }
    arrests
}

#[test]
fn patrol_rate_is_independent_of_polling_rate() {
    assert_eq!(arrests_over_a_night(1_000), 100);
    assert_eq!(arrests_over_a_night(10_000), 100);
}

#[test]
fn patrol_backlog_is_not_released_at_nightfall() {
    let mut world = WorldState::new(Timestamp(0));
    world.time_remaining_ms = Some(30_000);
    world.catalog.event_templates.clear();
    let mut smuggler = User::new("s", "Sly", Role::Player);
    smuggler.balance = 1_000;
    smuggler.forbidden_stocks.insert("SHDY".into(), 5);
    world.insert_user(smuggler);

    let mut rng = ScriptedRng::constant(0.0);
    for second in 1..=29u64 {
        world.advance(Timestamp(second * 1_000), &mut rng);
    }
    let step = world.advance(Timestamp(30_000), &mut rng);
    assert!(!world.is_day);
    let arrests = step
        .events
        .iter()
        .filter(|e| matches!(e.kind, TickEventKind::Arrested { .. }))
        .count();
    assert_eq!(arrests, 1);
}

// ---------------------------------------------------------------------------
// Degenerate input
// ---------------------------------------------------------------------------

#[test]
fn absurd_rating_does_not_break_dawn() {
    let mut world = night_world(0, 1_000);
    world.catalog.event_templates.clear();
    let mut owner = shop_owner("o");
    owner.rating = 1e20;
    world.insert_user(owner);

    let step = world.advance(Timestamp(1_000), &mut ScriptedRng::constant(0.9));
    assert!(world.is_day);
    assert!(step
        .events
        .iter()
        .any(|e| matches!(e.kind, TickEventKind::ShopSales { customers: u64::MAX, .. })));
    assert_eq!(world.user("o").unwrap().balance, i64::MAX);
}

#[test]
fn corrupt_stored_config_is_healed_before_dawn() {
    let mut world = night_world(0, 1_000);
    world.catalog.event_templates.clear();
    world.config.customer_rating_divisor = 0.0;
    let mut owner = shop_owner("o");
    owner.rating = 3.0;
    world.insert_user(owner);
    let mut world = WorldState::from_json(&world.to_json().unwrap()).unwrap();

    let step = world.advance(Timestamp(1_000), &mut ScriptedRng::constant(0.0));
    assert!(step.has_changed);
    assert!(world.is_day);
    assert_eq!(world.config.customer_rating_divisor, 2.0);
    // floor(0 * 3) + floor(3 / 2) = 1 customer.
    assert!(step
        .events
        .iter()
        .any(|e| matches!(e.kind, TickEventKind::ShopSales { customers: 1, amount: 100, .. })));
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn world_survives_json_roundtrip_mid_game() {
    let mut world = WorldState::new(Timestamp(0));
    world.settings.turn_duration_ms = 5_000;
    world.config.event_spawn_percent = 50.0;
    world.insert_user(shop_owner("o"));
    let mut rng = GameRng::new(3);
    for second in 1..=60u64 {
        world.advance(Timestamp(second * 1_000), &mut rng);
    }

    let json = world.to_json().unwrap();
    let restored = WorldState::from_json(&json).unwrap();
    assert_eq!(restored, world);
}
