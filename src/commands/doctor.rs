// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

use crate::config::get_base_currency;
use crate::fx::{self, ExchangeRateProvider, StoredRates};
use crate::models::UserId;
use crate::sqlite_store::SqliteStore;
use crate::store::{LedgerStore, UserStore};
use crate::utils::{parse_decimal, pretty_table};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub issue: &'static str,
    pub detail: String,
}

pub fn findings(conn: &Connection) -> Result<Vec<Finding>> {
    let store = SqliteStore::new(conn);
    let mut out = Vec::new();

    for user in store.list_users()? {
        // 1) Budget spend drifting from the ledger. Only the budget reconcile
        // writes to (lowest id per category) is checked, against expenses
        // recorded since it was created.
        for (budget_id, category, stored, ledger) in tracked_spend(conn, user.id)? {
            if ledger != stored {
                out.push(Finding {
                    issue: "budget_spend_drift",
                    detail: format!(
                        "user {} {} budget {}: stored {:.2}, ledger {:.2}",
                        user.id, category, budget_id, stored, ledger
                    ),
                });
            }
        }

        // 2) Recurring rows the monitor will skip
        for t in store.recurring_transactions(user.id)? {
            if t.next_due_date().is_none() {
                out.push(Finding {
                    issue: "recurring_without_due_date",
                    detail: format!("user {} transaction {}", user.id, t.id),
                });
            }
        }
    }

    // 3) Currencies with no stored rate
    let base = get_base_currency(conn)?;
    let rates = StoredRates::new(conn, &base);
    for ccy in fx::foreign_currencies(conn, &base)? {
        if rates.rate(&ccy).is_err() {
            out.push(Finding {
                issue: "missing_fx",
                detail: format!("{}/{}", base, ccy),
            });
        }
    }
    Ok(out)
}

/// (budget id, category, stored total_spent, ledger sum) per tracked budget.
fn tracked_spend(conn: &Connection, user: UserId) -> Result<Vec<(i64, String, Decimal, Decimal)>> {
    let mut stmt = conn.prepare(
        "SELECT b.id, b.category, b.total_spent, b.created_at FROM budgets b
         WHERE b.user_id=?1
           AND b.id = (SELECT MIN(id) FROM budgets WHERE user_id=b.user_id AND category=b.category)
         ORDER BY b.id",
    )?;
    let budgets = stmt
        .query_map(params![user], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut spent = conn.prepare(
        "SELECT converted_amount FROM transactions
         WHERE user_id=?1 AND category=?2 AND type='expense' AND created_at >= ?3",
    )?;
    let mut out = Vec::with_capacity(budgets.len());
    for (id, category, stored, since) in budgets {
        let amounts = spent
            .query_map(params![user, category, since], |r| r.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let mut ledger = Decimal::ZERO;
        for a in &amounts {
            ledger += parse_decimal(a)?;
        }
        out.push((id, category, parse_decimal(&stored)?, ledger));
    }
    Ok(out)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let found = findings(conn)?;
    if found.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        let rows = found
            .into_iter()
            .map(|f| vec![f.issue.to_string(), f.detail])
            .collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
