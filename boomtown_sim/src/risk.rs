// Night patrol: fines for users holding illegal assets.
//
// Runs only at night, on its own cadence. Every user holding forbidden
// stock or an illegal inventory item rolls `config.risk_arrest_percent`;
// on a hit, `floor(balance * risk_fine_fraction)` is taken from the balance
// and the arrest makes the news. Holdings are not confiscated.

use crate::event::{TickEvent, TickEventKind};
use crate::journal::NewsCategory;
use crate::types::Timestamp;
use crate::world::{TransactionKind, WorldState};
use boomtown_prng::RandomSource;
use tracing::info;

pub fn run_patrol(
    state: &mut WorldState,
    now: Timestamp,
    rng: &mut impl RandomSource,
    events: &mut Vec<TickEvent>,
) {
    if state.is_day {
        return;
    }

    let WorldState {
        users,
        config,
        news,
        turn,
        ..
    } = state;

    for user in users.values_mut().filter(|u| u.holds_illegal_assets()) {
        if !rng.roll_percent(config.risk_arrest_percent) {
            continue;
        }
        let fine = (user.balance.max(0) as f64 * config.risk_fine_fraction).floor() as i64;
        let fine = user.debit_floored(now, TransactionKind::Fine, fine, "Fine for illegal assets");

        info!(user = %user.id, fine, "Arrested");
        news.record(
            now,
            *turn,
            NewsCategory::Risk,
            format!(
                "POLICE: {} was arrested for holding illegal assets and fined {fine}.",
                user.name
            ),
        );
        events.push(TickEvent {
            at: now,
            kind: TickEventKind::Arrested {
                user_id: user.id.clone(),
                fine,
            },
        });
    }
}
