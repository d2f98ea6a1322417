// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use super::{Backend, filter_from, require_user};
use crate::engine::report::Report;
use crate::models::UserId;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, user: Option<UserId>, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("summary", sub)) = m.subcommand() {
        summary(conn, require_user(user)?, sub)?;
    }
    Ok(())
}

fn summary(conn: &Connection, user: UserId, sub: &clap::ArgMatches) -> Result<()> {
    let backend = Backend::open(conn)?;
    let svc = backend.service();
    let filter = filter_from(sub)?;
    let report = svc.report(user, &filter)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        return Ok(());
    }
    print_report(&report, &svc.settings().base_currency);
    Ok(())
}

pub fn print_report(report: &Report, base: &str) {
    let rows = report
        .category_breakdown
        .iter()
        .map(|(cat, t)| {
            vec![
                cat.to_string(),
                format!("{:.2}", t.income),
                format!("{:.2}", t.expense),
            ]
        })
        .collect();
    let header = format!("Category ({})", base);
    println!(
        "{}",
        pretty_table(&[header.as_str(), "Income", "Expense"], rows)
    );
    println!("Total income:  {}", fmt_money(&report.total_income, base));
    println!("Total expense: {}", fmt_money(&report.total_expense, base));
    println!("Net savings:   {}", fmt_money(&report.net_savings, base));
}
