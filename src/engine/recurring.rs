// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, NaiveDate, Utc};

use super::ScanOptions;
use crate::errors::Result;
use crate::models::{
    NewNotification, Notification, NotificationPayload, RecurringStatus, Transaction, UserId,
};
use crate::store::{LedgerStore, NotificationStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueState {
    Upcoming { days: i64 },
    Missed,
    /// Due today or beyond the reminder window.
    Quiet,
}

/// Day-granularity comparison of a due date against today.
pub fn classify(due: NaiveDate, today: NaiveDate, window_days: i64) -> DueState {
    let days = (due - today).num_days();
    if due < today {
        DueState::Missed
    } else if days > 0 && days <= window_days {
        DueState::Upcoming { days }
    } else {
        DueState::Quiet
    }
}

fn notice(tx: &Transaction, due: NaiveDate, status: RecurringStatus, days: i64, dedupe: bool) -> NewNotification {
    let task = tx.task_label();
    let message = match status {
        RecurringStatus::Upcoming => format!(
            "Upcoming: '{}' of {:.2} {} is due on {} (in {} day{}).",
            task,
            tx.amount,
            tx.currency,
            due,
            days,
            if days == 1 { "" } else { "s" }
        ),
        RecurringStatus::Missed => format!(
            "Missed: '{}' of {:.2} {} was due on {}.",
            task, tx.amount, tx.currency, due
        ),
    };
    NewNotification {
        user_id: tx.user_id,
        label: tx.category.to_string(),
        message,
        payload: NotificationPayload::Recurring {
            transaction_id: tx.id,
            status,
            task,
            amount: tx.amount,
            next_due_date: due,
        },
        dedupe_key: dedupe.then(|| format!("recurring:{}:{}:{}", tx.id, status.as_str(), due)),
    }
}

/// Emits upcoming/missed notices for the user's recurring transactions.
pub fn scan_recurring<L, N>(
    ledger: &L,
    notifications: &N,
    user_id: UserId,
    now: DateTime<Utc>,
    opts: ScanOptions,
) -> Result<Vec<Notification>>
where
    L: LedgerStore + ?Sized,
    N: NotificationStore + ?Sized,
{
    let today = now.date_naive();
    let mut emitted = Vec::new();
    for tx in ledger.recurring_transactions(user_id)? {
        let Some(due) = tx.next_due_date() else {
            log::debug!("recurring transaction {} has no next due date; skipped", tx.id);
            continue;
        };
        let (status, days) = match classify(due, today, opts.window_days) {
            DueState::Upcoming { days } => (RecurringStatus::Upcoming, days),
            DueState::Missed => (RecurringStatus::Missed, (due - today).num_days()),
            DueState::Quiet => continue,
        };
        if let Some(n) = notifications.append(&notice(&tx, due, status, days, opts.dedupe))? {
            emitted.push(n);
        }
        if status == RecurringStatus::Missed && opts.advance_recurrence {
            advance(ledger, &tx, due)?;
        }
    }
    log::info!(
        "recurring scan for user {} emitted {} notice(s)",
        user_id,
        emitted.len()
    );
    Ok(emitted)
}

fn advance<L: LedgerStore + ?Sized>(ledger: &L, tx: &Transaction, due: NaiveDate) -> Result<()> {
    let Some(rec) = tx.recurrence.as_ref() else {
        return Ok(());
    };
    match rec.pattern.advance(due) {
        Some(next) if rec.end_date.is_none_or(|end| next <= end) => {
            ledger.set_next_due_date(tx.user_id, tx.id, next)?;
            log::debug!("recurring transaction {} advanced to {}", tx.id, next);
        }
        _ => log::debug!("recurring transaction {} has run past its end date", tx.id),
    }
    Ok(())
}
