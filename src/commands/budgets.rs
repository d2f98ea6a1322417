// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use super::{Backend, arg, require_user};
use crate::models::{Category, UserId};
use crate::service::BudgetStatus;
use crate::utils::{maybe_print_json, parse_decimal, pretty_table};

pub fn handle(conn: &Connection, user: Option<UserId>, m: &clap::ArgMatches) -> Result<()> {
    let backend = Backend::open(conn)?;
    let svc = backend.service();
    let Some((name, sub)) = m.subcommand() else {
        return Ok(());
    };
    let user = require_user(user)?;
    match name {
        "create" => {
            let category: Category = arg(sub, "category")?.parse()?;
            let limit = parse_decimal(arg(sub, "limit")?)?;
            let b = svc.create_budget(user, category, limit, arg(sub, "period")?)?;
            println!(
                "Budget {} created: {} {} limit {:.2}",
                b.id, b.period, b.category, b.limit
            );
        }
        "list" => {
            let data: Vec<BudgetStatus> = svc
                .budgets(user)?
                .into_iter()
                .map(BudgetStatus::from)
                .collect();
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                print_budgets(&data);
            }
        }
        "show" => {
            let category: Category = arg(sub, "category")?.parse()?;
            let status = BudgetStatus::from(svc.budget(user, category)?);
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &status)? {
                print_budgets(std::slice::from_ref(&status));
            }
        }
        "update" => {
            let category: Category = arg(sub, "category")?.parse()?;
            let limit = parse_decimal(arg(sub, "limit")?)?;
            let b = svc.update_budget_limit(user, category, limit)?;
            println!(
                "{} budget limit set to {:.2} (balance {:.2})",
                b.category,
                b.limit,
                b.balance()
            );
        }
        "rm" => {
            let category: Category = arg(sub, "category")?.parse()?;
            let n = svc.delete_budget(user, category)?;
            println!("Removed {} {} budget(s)", n, category);
        }
        "recommend" => {
            let recs = svc.recommendations(user)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &recs)? {
                let rows = recs
                    .iter()
                    .map(|r| {
                        vec![
                            r.category.to_string(),
                            format!("{:.2}", r.limit),
                            format!("{:.2}", r.total_spent),
                            format!("{:.2}%", r.spending_rate),
                            r.message.clone(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Category", "Limit", "Spent", "Rate", "Advice"], rows)
                );
            }
        }
        _ => {}
    }
    Ok(())
}

fn print_budgets(data: &[BudgetStatus]) {
    let rows = data
        .iter()
        .map(|s| {
            vec![
                s.budget.id.to_string(),
                s.budget.category.to_string(),
                s.budget.period.clone(),
                format!("{:.2}", s.budget.limit),
                format!("{:.2}", s.budget.total_spent),
                format!("{:.2}", s.balance),
                format!("{:.2}%", s.spending_rate),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Category", "Period", "Limit", "Spent", "Balance", "Used"],
            rows
        )
    );
}
