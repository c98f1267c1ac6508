// A small seeded town for trying the engine from the command line.
//
// One banker and four players: a doctor with a busy bakery, a teacher
// running a café menu, an unemployed debtor (who will chase the debt-free
// quest once the debt is cleared), and a programmer with a side line in
// forbidden stock for the night patrol to find.

use boomtown_sim::catalog::Catalog;
use boomtown_sim::config::GameConfig;
use boomtown_sim::types::{Role, Timestamp, Weather};
use boomtown_sim::world::{InventoryItem, MenuItem, ShopItem, User, WorldState};

fn item(name: &str, price: i64, stock: u32) -> ShopItem {
    ShopItem {
        name: name.into(),
        price,
        stock,
        sold_out: false,
    }
}

fn dish(name: &str, price: i64) -> MenuItem {
    MenuItem {
        name: name.into(),
        price,
        available: true,
    }
}

pub fn demo_world(now: Timestamp, config: GameConfig, catalog: Catalog) -> WorldState {
    let mut world = WorldState::with_config(Some(now), config, catalog);
    world.weather = Weather::Sunny;

    let mut banker = User::new("banker", "Mr. Moneybags", Role::Banker);
    banker.balance = 50_000;
    world.insert_user(banker);

    let mut baker = User::new("alice", "Alice", Role::Player);
    baker.job = Some("Doctor".into());
    baker.job_type = Some("doctor".into());
    baker.balance = 2_000;
    baker.rating = 4.5;
    baker.popularity = 180;
    baker.shop_items = vec![
        item("Sourdough", 450, 20),
        item("Croissant", 300, 30),
        item("Wedding Cake", 5_500, 1),
    ];
    world.insert_user(baker);

    let mut cafe = User::new("bob", "Bob", Role::Player);
    cafe.job = Some("Teacher".into());
    cafe.job_type = Some("teacher".into());
    cafe.rating = 3.0;
    cafe.popularity = 60;
    cafe.shop_menu = vec![dish("Espresso", 250), dish("Lunch Special", 1_200)];
    world.insert_user(cafe);

    let mut debtor = User::new("carol", "Carol", Role::Player);
    debtor.debt = 2_500;
    debtor.unpaid_tax = 300;
    world.insert_user(debtor);

    let mut shady = User::new("dave", "Dave", Role::Player);
    shady.job = Some("Programmer".into());
    shady.job_type = Some("programmer".into());
    shady.balance = 12_000;
    shady.forbidden_stocks.insert("SHDY".into(), 40);
    shady.inventory.push(InventoryItem {
        name: "Counterfeit Watch".into(),
        quantity: 3,
        is_illegal: true,
    });
    world.insert_user(shady);

    world
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_world_has_every_kind_of_resident() {
        let world = demo_world(Timestamp(0), GameConfig::default(), Catalog::default());
        assert_eq!(world.users.len(), 5);
        assert!(world.users.values().any(|u| u.role == Role::Banker));
        assert!(world.users.values().any(|u| u.owns_shop()));
        assert!(world.users.values().any(|u| u.holds_illegal_assets()));
        assert!(world.users.values().any(|u| u.debt > 0));
    }
}
