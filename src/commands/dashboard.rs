// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use super::{Backend, print_notifications, require_user};
use crate::models::UserId;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, user: Option<UserId>, m: &clap::ArgMatches) -> Result<()> {
    let backend = Backend::open(conn)?;
    let d = backend.service().dashboard(require_user(user)?)?;
    if maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &d)? {
        return Ok(());
    }
    let base = d.base_currency.as_str();
    println!("{} <{}>", d.user.name, d.user.email);
    println!(
        "{} transaction(s): income {}, expense {}, saved {}",
        d.transaction_count,
        fmt_money(&d.total_income, base),
        fmt_money(&d.total_expense, base),
        fmt_money(&d.total_savings, base)
    );
    if !d.budgets.is_empty() {
        let rows = d
            .budgets
            .iter()
            .map(|b| {
                vec![
                    b.budget.category.to_string(),
                    format!("{:.2}", b.budget.limit),
                    format!("{:.2}", b.balance),
                    format!("{:.2}%", b.spending_rate),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Budget", "Limit", "Balance", "Used"], rows));
    }
    if !d.goals.is_empty() {
        let rows = d
            .goals
            .iter()
            .map(|g| {
                vec![
                    g.goal.name.clone(),
                    format!("{:.2}%", g.progress),
                    g.goal.deadline.to_string(),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Goal", "Progress", "Deadline"], rows));
    }
    if !d.recent_notifications.is_empty() {
        print_notifications(&d.recent_notifications);
    }
    Ok(())
}
