// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use super::{Backend, arg, require_user};
use crate::models::UserId;
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table};

pub fn handle(conn: &Connection, user: Option<UserId>, m: &clap::ArgMatches) -> Result<()> {
    let backend = Backend::open(conn)?;
    let svc = backend.service();
    match m.subcommand() {
        Some(("add", sub)) => {
            let target = parse_decimal(arg(sub, "target")?)?;
            let deadline = parse_date(arg(sub, "deadline")?)?;
            let g = svc.create_goal(require_user(user)?, arg(sub, "name")?, target, deadline)?;
            println!(
                "Goal {} '{}' created: {:.2} by {}",
                g.id, g.name, g.target_amount, g.deadline
            );
        }
        Some(("list", sub)) => {
            let goals = svc.goals(require_user(user)?)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &goals)? {
                let rows = goals
                    .iter()
                    .map(|g| {
                        vec![
                            g.goal.id.to_string(),
                            g.goal.name.clone(),
                            format!("{:.2}", g.goal.current_amount),
                            format!("{:.2}", g.goal.target_amount),
                            format!("{:.2}%", g.progress),
                            g.goal.deadline.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Name", "Saved", "Target", "Progress", "Deadline"],
                        rows
                    )
                );
            }
        }
        Some(("contribute", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap_or(&0);
            let amount = parse_decimal(arg(sub, "amount")?)?;
            let g = svc.contribute(require_user(user)?, id, amount)?;
            println!(
                "'{}' now at {:.2} of {:.2} ({:.2}%)",
                g.goal.name, g.goal.current_amount, g.goal.target_amount, g.progress
            );
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap_or(&0);
            svc.delete_goal(require_user(user)?, id)?;
            println!("Removed goal {}", id);
        }
        _ => {}
    }
    Ok(())
}
