// Dawn payroll and walk-in shop sales.
//
// Runs once per night→day transition, after quests. Every formula floors
// its monetary output, and the global money multiplier is applied as its own
// step rather than folded into any base constant:
//
//   banker pay   = floor(banker_salary * money_multiplier)
//   player gross = floor((salary + floor(salary * rating * bonus_rate))
//                        * money_multiplier)
//   tax          = floor(gross * tax_rate)
//   saved        = floor((gross - tax) * auto_save_rate)  -> deposit
//   cash         = gross - tax - saved                    -> balance
//
//   customers    = floor(rand * base_customer_roll) + floor(rating / divisor)
//   sales        = floor(customers * sales_per_customer * weather
//                        * boosts * slumps * money_multiplier)
//
// Vacationing players get neither salary nor walk-in sales.
//
// See also: `global_event.rs` for the boost/slump classes, `config.rs` for
// the tunables.

use crate::event::{TickEvent, TickEventKind};
use crate::global_event::EffectClass;
use crate::journal::NewsCategory;
use crate::types::*;
use crate::world::{TransactionKind, WorldState};
use boomtown_prng::RandomSource;
use tracing::debug;

/// Salary split for one player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payslip {
    pub gross: i64,
    pub tax: i64,
    pub saved: i64,
    pub cash: i64,
}

/// Compute a player's payslip. Returns `None` when there is nothing to pay.
pub fn payslip(
    salary: i64,
    rating: f64,
    bonus_rate: f64,
    money_multiplier: f64,
    tax_rate: f64,
    auto_save_rate: f64,
) -> Option<Payslip> {
    let bonus = (salary as f64 * rating * bonus_rate).floor() as i64;
    let base = salary.saturating_add(bonus.max(0));
    let gross = (base as f64 * money_multiplier).floor() as i64;
    if gross <= 0 {
        return None;
    }
    let tax = (gross as f64 * tax_rate).floor() as i64;
    let net = gross - tax;
    let saved = (net as f64 * auto_save_rate).floor() as i64;
    Some(Payslip {
        gross,
        tax,
        saved,
        cash: net - saved,
    })
}

/// Product of the sales multipliers of every active event in one class.
pub fn event_multiplier(state: &WorldState, now: Timestamp, class: EffectClass) -> f64 {
    state
        .active_events
        .iter()
        .filter(|e| e.is_active_at(now))
        .filter_map(|e| e.sales_multiplier(class))
        .product()
}

/// Pay every user and run walk-in sales for open shops.
pub fn distribute(
    state: &mut WorldState,
    now: Timestamp,
    rng: &mut impl RandomSource,
    events: &mut Vec<TickEvent>,
) {
    let boost = event_multiplier(state, now, EffectClass::Boost);
    let slump = event_multiplier(state, now, EffectClass::Slump);

    let WorldState {
        users,
        catalog,
        config,
        settings,
        weather,
        news,
        turn,
        is_day,
        ..
    } = state;
    let weather_multiplier = config.weather_multiplier(*weather);
    let mut paid = 0usize;

    for user in users.values_mut() {
        match user.role {
            Role::Banker => {
                let pay = (config.banker_salary as f64 * settings.money_multiplier).floor() as i64;
                if pay <= 0 {
                    continue;
                }
                user.credit(now, TransactionKind::Salary, pay, "Banker salary");
                debug!(user = %user.id, pay, "Banker paid");
                events.push(TickEvent {
                    at: now,
                    kind: TickEventKind::SalaryPaid {
                        user_id: user.id.clone(),
                        gross: pay,
                        tax: 0,
                        saved: 0,
                        cash: pay,
                    },
                });
                paid += 1;
            }
            Role::Player => {
                if user.is_off {
                    continue;
                }

                let salary = catalog.salary_for(user.job_type.as_deref());
                if let Some(slip) = payslip(
                    salary,
                    user.effective_rating(),
                    config.rating_bonus_rate,
                    settings.money_multiplier,
                    settings.tax_rate,
                    settings.auto_save_rate,
                ) {
                    user.deposit = user.deposit.saturating_add(slip.saved);
                    user.credit(
                        now,
                        TransactionKind::Salary,
                        slip.cash,
                        format!(
                            "Salary: gross {}, tax {}, saved {}",
                            slip.gross, slip.tax, slip.saved
                        ),
                    );
                    debug!(user = %user.id, gross = slip.gross, tax = slip.tax, saved = slip.saved, "Salary paid");
                    events.push(TickEvent {
                        at: now,
                        kind: TickEventKind::SalaryPaid {
                            user_id: user.id.clone(),
                            gross: slip.gross,
                            tax: slip.tax,
                            saved: slip.saved,
                            cash: slip.cash,
                        },
                    });
                    paid += 1;
                }

                if !*is_day || !user.owns_shop() {
                    continue;
                }
                // Float-to-int casts saturate, so an absurd rating tops out
                // at `u64::MAX` customers instead of overflowing.
                let rating_customers =
                    (user.effective_rating() / config.customer_rating_divisor).floor() as u64;
                let customers = rng
                    .below(config.base_customer_roll)
                    .saturating_add(rating_customers);
                let sales = (customers as f64
                    * config.sales_per_customer as f64
                    * weather_multiplier
                    * boost
                    * slump
                    * settings.money_multiplier)
                    .floor() as i64;
                if sales <= 0 {
                    continue;
                }
                user.credit(
                    now,
                    TransactionKind::ShopSales,
                    sales,
                    format!("Walk-in sales ({customers} customers)"),
                );
                news.record(
                    now,
                    *turn,
                    NewsCategory::Economy,
                    format!(
                        "{}'s shop served {customers} customers and earned {sales}.",
                        user.name
                    ),
                );
                events.push(TickEvent {
                    at: now,
                    kind: TickEventKind::ShopSales {
                        user_id: user.id.clone(),
                        customers,
                        amount: sales,
                    },
                });
            }
        }
    }

    if paid > 0 {
        news.record(
            now,
            *turn,
            NewsCategory::Economy,
            format!("Payday! Salaries went out to {paid} resident(s)."),
        );
    }
}
