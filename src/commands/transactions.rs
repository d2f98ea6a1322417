// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;

use super::{Backend, arg, filter_from, require_user};
use crate::models::{Transaction, UserId};
use crate::service::{BudgetOutcome, TransactionDraft, TransactionEdit};
use crate::utils::{
    maybe_print_json, parse_amount, parse_currency, parse_date, parse_tags, pretty_table,
};

pub fn handle(conn: &Connection, user: Option<UserId>, m: &clap::ArgMatches) -> Result<()> {
    let backend = Backend::open(conn)?;
    match m.subcommand() {
        Some(("add", sub)) => add(&backend, require_user(user)?, sub)?,
        Some(("list", sub)) => list(&backend, require_user(user)?, sub)?,
        Some(("edit", sub)) => edit(&backend, require_user(user)?, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap_or(&0);
            backend.service().delete_transaction(require_user(user)?, id)?;
            println!("Deleted transaction {}", id);
        }
        Some(("advance", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap_or(&0);
            let next = backend.service().advance_recurrence(require_user(user)?, id)?;
            println!("Transaction {} next due on {}", id, next);
        }
        _ => {}
    }
    Ok(())
}

/// Builds a draft from `tx add` arguments.
pub fn draft_from(sub: &clap::ArgMatches) -> Result<TransactionDraft> {
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => Utc::now().date_naive(),
    };
    let mut draft = TransactionDraft::new(
        arg(sub, "type")?.parse()?,
        arg(sub, "category")?.parse()?,
        parse_amount(arg(sub, "amount")?)?,
        date,
    );
    draft.currency = sub
        .get_one::<String>("currency")
        .map(|c| parse_currency(c))
        .transpose()?;
    draft.note = sub.get_one::<String>("note").cloned();
    draft.tags = sub
        .get_one::<String>("tags")
        .map(|t| parse_tags(t))
        .unwrap_or_default();
    draft.recurring = sub.get_flag("recurring");
    draft.pattern = sub
        .get_one::<String>("pattern")
        .map(|p| p.parse())
        .transpose()?;
    draft.start_date = sub.get_one::<String>("start").map(|d| parse_date(d)).transpose()?;
    draft.end_date = sub.get_one::<String>("end").map(|d| parse_date(d)).transpose()?;
    draft.next_due_date = sub
        .get_one::<String>("next-due")
        .map(|d| parse_date(d))
        .transpose()?;
    if !draft.recurring && (draft.pattern.is_some() || draft.next_due_date.is_some()) {
        anyhow::bail!("--pattern and --next-due require --recurring");
    }
    Ok(draft)
}

fn add(backend: &Backend<'_>, user: UserId, sub: &clap::ArgMatches) -> Result<()> {
    let recorded = backend.service().record_transaction(user, draft_from(sub)?)?;
    if maybe_print_json(sub.get_flag("json"), false, &recorded)? {
        return Ok(());
    }
    let tx = &recorded.transaction;
    println!(
        "Recorded {} #{}: {} {} ({}) on {}",
        tx.tx_type, tx.id, tx.amount, tx.currency, tx.category, tx.date
    );
    if tx.currency != backend.service().settings().base_currency {
        println!(
            "  converted at {} = {}",
            tx.exchange_rate, tx.converted_amount
        );
    }
    match &recorded.budget {
        BudgetOutcome::Reconciled(r) => {
            println!(
                "  {} budget: spent {:.2} of {:.2}, balance {:.2}",
                r.budget.category,
                r.budget.total_spent,
                r.budget.limit,
                r.budget.balance()
            );
            if let Some(n) = &r.notification {
                println!("  ! {}", n.message);
            }
        }
        BudgetOutcome::Failed { error } => {
            eprintln!("  budget not updated: {}", error);
        }
        BudgetOutcome::Untracked | BudgetOutcome::NotApplicable => {}
    }
    if let Some(s) = recorded.savings_allocated {
        println!("  {:.2} allocated to savings", s);
    }
    if let Some(due) = tx.next_due_date() {
        println!("  next due {}", due);
    }
    Ok(())
}

fn edit(backend: &Backend<'_>, user: UserId, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap_or(&0);
    let edit = TransactionEdit {
        tx_type: sub.get_one::<String>("type").map(|t| t.parse()).transpose()?,
        category: sub
            .get_one::<String>("category")
            .map(|c| c.parse())
            .transpose()?,
        amount: sub
            .get_one::<String>("amount")
            .map(|a| parse_amount(a))
            .transpose()?,
        currency: sub
            .get_one::<String>("currency")
            .map(|c| parse_currency(c))
            .transpose()?,
        date: sub.get_one::<String>("date").map(|d| parse_date(d)).transpose()?,
        note: sub.get_one::<String>("note").cloned(),
        tags: sub.get_one::<String>("tags").map(|t| parse_tags(t)),
        recurring: sub.get_one::<bool>("recurring").copied(),
        pattern: sub
            .get_one::<String>("pattern")
            .map(|p| p.parse())
            .transpose()?,
        end_date: sub.get_one::<String>("end").map(|d| parse_date(d)).transpose()?,
        next_due_date: sub
            .get_one::<String>("next-due")
            .map(|d| parse_date(d))
            .transpose()?,
    };
    let tx = backend.service().edit_transaction(user, id, edit)?;
    println!("Updated transaction {} ({} {} {})", tx.id, tx.tx_type, tx.amount, tx.currency);
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    #[serde(rename = "type")]
    pub tx_type: String,
    pub category: String,
    pub amount: String,
    pub currency: String,
    pub converted: String,
    pub tags: String,
    pub next_due: String,
    pub note: String,
}

impl From<&Transaction> for TransactionRow {
    fn from(t: &Transaction) -> Self {
        TransactionRow {
            id: t.id,
            date: t.date.to_string(),
            tx_type: t.tx_type.to_string(),
            category: t.category.to_string(),
            amount: format!("{:.2}", t.amount),
            currency: t.currency.clone(),
            converted: format!("{:.2}", t.converted_amount),
            tags: t.tags.join(","),
            next_due: t.next_due_date().map(|d| d.to_string()).unwrap_or_default(),
            note: t.note.clone().unwrap_or_default(),
        }
    }
}

pub fn query_rows(
    backend: &Backend<'_>,
    user: UserId,
    sub: &clap::ArgMatches,
) -> Result<Vec<TransactionRow>> {
    let filter = filter_from(sub)?;
    let txs = backend.service().transactions(user, &filter)?;
    Ok(txs.iter().map(TransactionRow::from).collect())
}

fn list(backend: &Backend<'_>, user: UserId, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(backend, user, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.tx_type.clone(),
                    r.category.clone(),
                    r.amount.clone(),
                    r.currency.clone(),
                    r.converted.clone(),
                    r.tags.clone(),
                    r.next_due.clone(),
                    r.note.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "ID", "Date", "Type", "Category", "Amount", "CCY", "Converted", "Tags",
                    "Next due", "Note"
                ],
                rows,
            )
        );
    }
    Ok(())
}
