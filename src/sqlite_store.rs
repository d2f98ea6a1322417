// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, ToSql, params};
use rust_decimal::Decimal;

use crate::errors::{Error, Result};
use crate::models::{
    Budget, Goal, NewBudget, NewGoal, NewNotification, NewTransaction, Notification,
    NotificationKind, Recurrence, Transaction, TransactionFilter, User, UserId,
};
use crate::store::{
    BudgetStore, GoalStore, LedgerStore, NotificationStore, SavingsStore, UserStore,
};

/// All store capabilities backed by one SQLite connection.
pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        SqliteStore { conn }
    }

    fn load_tags(&self, tx_id: i64) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT tag FROM transaction_tags WHERE transaction_id=?1 ORDER BY tag")?;
        let rows = stmt.query_map(params![tx_id], |r| r.get::<_, String>(0))?;
        let mut tags = Vec::new();
        for row in rows {
            tags.push(row?);
        }
        Ok(tags)
    }

    fn write_tags(&self, tx_id: i64, tags: &[String]) -> Result<()> {
        self.conn
            .execute("DELETE FROM transaction_tags WHERE transaction_id=?1", params![tx_id])?;
        let mut stmt = self.conn.prepare_cached(
            "INSERT OR IGNORE INTO transaction_tags(transaction_id, tag) VALUES (?1, ?2)",
        )?;
        for tag in tags {
            stmt.execute(params![tx_id, tag])?;
        }
        Ok(())
    }

    fn hydrate(&self, rows: Vec<TxRow>) -> Result<Vec<Transaction>> {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let tags = self.load_tags(row.id)?;
            out.push(row.into_transaction(tags)?);
        }
        Ok(out)
    }
}

const TX_COLUMNS: &str = "t.id, t.user_id, t.type, t.category, t.amount, t.currency, t.exchange_rate, \
     t.converted_amount, t.date, t.note, t.recurring, t.recurrence_pattern, t.recurrence_start, \
     t.recurrence_end, t.next_due_date";

struct TxRow {
    id: i64,
    user_id: i64,
    tx_type: String,
    category: String,
    amount: String,
    currency: String,
    exchange_rate: String,
    converted_amount: String,
    date: String,
    note: Option<String>,
    recurring: bool,
    pattern: Option<String>,
    start: Option<String>,
    end: Option<String>,
    next_due: Option<String>,
}

impl TxRow {
    fn read(r: &rusqlite::Row<'_>) -> rusqlite::Result<TxRow> {
        Ok(TxRow {
            id: r.get(0)?,
            user_id: r.get(1)?,
            tx_type: r.get(2)?,
            category: r.get(3)?,
            amount: r.get(4)?,
            currency: r.get(5)?,
            exchange_rate: r.get(6)?,
            converted_amount: r.get(7)?,
            date: r.get(8)?,
            note: r.get(9)?,
            recurring: r.get(10)?,
            pattern: r.get(11)?,
            start: r.get(12)?,
            end: r.get(13)?,
            next_due: r.get(14)?,
        })
    }

    fn into_transaction(self, tags: Vec<String>) -> Result<Transaction> {
        let date = parse_date(&self.date)?;
        // Rows written before recurrence was resolved may lack the pattern;
        // such rows carry no recurrence and are skipped by the monitor.
        let recurrence = match self.pattern.as_deref() {
            Some(p) => Some(Recurrence {
                pattern: p.parse()?,
                start_date: match self.start.as_deref() {
                    Some(s) => parse_date(s)?,
                    None => date,
                },
                end_date: self.end.as_deref().map(parse_date).transpose()?,
                next_due_date: self.next_due.as_deref().map(parse_date).transpose()?,
            }),
            None => None,
        };
        Ok(Transaction {
            id: self.id,
            user_id: self.user_id,
            tx_type: self.tx_type.parse()?,
            category: self.category.parse()?,
            amount: parse_decimal(&self.amount)?,
            currency: self.currency,
            exchange_rate: parse_decimal(&self.exchange_rate)?,
            converted_amount: parse_decimal(&self.converted_amount)?,
            date,
            note: self.note,
            tags,
            recurring: self.recurring,
            recurrence,
        })
    }
}

fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .map_err(|e| Error::Corrupt(format!("invalid decimal '{}': {}", s, e)))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| Error::Corrupt(format!("invalid date '{}': {}", s, e)))
}

fn opt_date(d: Option<NaiveDate>) -> Option<String> {
    d.map(|d| d.to_string())
}

impl UserStore for SqliteStore<'_> {
    fn insert_user(&self, name: &str, email: &str) -> Result<User> {
        self.conn.execute(
            "INSERT INTO users(name, email) VALUES (?1, ?2)",
            params![name, email],
        )?;
        Ok(User {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            email: email.to_string(),
        })
    }

    fn find_user(&self, user_id: UserId) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, name, email FROM users WHERE id=?1",
                params![user_id],
                |r| {
                    Ok(User {
                        id: r.get(0)?,
                        name: r.get(1)?,
                        email: r.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn.prepare("SELECT id, name, email FROM users ORDER BY id")?;
        let rows = stmt.query_map([], |r| {
            Ok(User {
                id: r.get(0)?,
                name: r.get(1)?,
                email: r.get(2)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

impl LedgerStore for SqliteStore<'_> {
    fn insert_transaction(&self, tx: &NewTransaction) -> Result<Transaction> {
        let db_tx = self.conn.unchecked_transaction()?;
        let rec = tx.recurrence.as_ref();
        self.conn.execute(
            "INSERT INTO transactions(user_id, type, category, amount, currency, exchange_rate,
                converted_amount, date, note, recurring, recurrence_pattern, recurrence_start,
                recurrence_end, next_due_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                tx.user_id,
                tx.tx_type.as_str(),
                tx.category.as_str(),
                tx.amount.to_string(),
                tx.currency,
                tx.exchange_rate.to_string(),
                tx.converted_amount.to_string(),
                tx.date.to_string(),
                tx.note,
                tx.recurring,
                rec.map(|r| r.pattern.as_str()),
                rec.map(|r| r.start_date.to_string()),
                opt_date(rec.and_then(|r| r.end_date)),
                opt_date(rec.and_then(|r| r.next_due_date)),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.write_tags(id, &tx.tags)?;
        db_tx.commit()?;
        self.get_transaction(tx.user_id, id)?
            .ok_or_else(|| Error::not_found(format!("Transaction {}", id)))
    }

    fn get_transaction(&self, user_id: UserId, id: i64) -> Result<Option<Transaction>> {
        let sql = format!(
            "SELECT {} FROM transactions t WHERE t.id=?1 AND t.user_id=?2",
            TX_COLUMNS
        );
        let row = self
            .conn
            .query_row(&sql, params![id, user_id], TxRow::read)
            .optional()?;
        match row {
            Some(row) => Ok(self.hydrate(vec![row])?.pop()),
            None => Ok(None),
        }
    }

    fn update_transaction(&self, tx: &Transaction) -> Result<()> {
        let db_tx = self.conn.unchecked_transaction()?;
        let rec = tx.recurrence.as_ref();
        let n = self.conn.execute(
            "UPDATE transactions SET type=?1, amount=?2, currency=?3, exchange_rate=?4,
                converted_amount=?5, date=?6, note=?7, recurring=?8, recurrence_pattern=?9,
                recurrence_start=?10, recurrence_end=?11, next_due_date=?12
             WHERE id=?13 AND user_id=?14",
            params![
                tx.tx_type.as_str(),
                tx.amount.to_string(),
                tx.currency,
                tx.exchange_rate.to_string(),
                tx.converted_amount.to_string(),
                tx.date.to_string(),
                tx.note,
                tx.recurring,
                rec.map(|r| r.pattern.as_str()),
                rec.map(|r| r.start_date.to_string()),
                opt_date(rec.and_then(|r| r.end_date)),
                opt_date(rec.and_then(|r| r.next_due_date)),
                tx.id,
                tx.user_id,
            ],
        )?;
        if n == 0 {
            return Err(Error::not_found(format!("Transaction {}", tx.id)));
        }
        self.write_tags(tx.id, &tx.tags)?;
        db_tx.commit()?;
        Ok(())
    }

    fn delete_transaction(&self, user_id: UserId, id: i64) -> Result<bool> {
        let n = self.conn.execute(
            "DELETE FROM transactions WHERE id=?1 AND user_id=?2",
            params![id, user_id],
        )?;
        Ok(n > 0)
    }

    fn find_transactions(
        &self,
        user_id: UserId,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        let mut sql = format!("SELECT {} FROM transactions t WHERE t.user_id=?", TX_COLUMNS);
        let mut params_vec: Vec<Box<dyn ToSql>> = vec![Box::new(user_id)];

        if let Some(t) = filter.tx_type {
            sql.push_str(" AND t.type=?");
            params_vec.push(Box::new(t.as_str()));
        }
        if let Some(c) = filter.category {
            sql.push_str(" AND t.category=?");
            params_vec.push(Box::new(c.as_str()));
        }
        if let Some(start) = filter.start {
            sql.push_str(" AND t.date>=?");
            params_vec.push(Box::new(start.to_string()));
        }
        if let Some(end) = filter.end {
            sql.push_str(" AND t.date<=?");
            params_vec.push(Box::new(end.to_string()));
        }
        if !filter.tags.is_empty() {
            let marks = vec!["?"; filter.tags.len()].join(",");
            sql.push_str(&format!(
                " AND t.id IN (SELECT transaction_id FROM transaction_tags WHERE tag IN ({}))",
                marks
            ));
            for tag in &filter.tags {
                params_vec.push(Box::new(tag.clone()));
            }
        }
        sql.push_str(" ORDER BY t.date DESC, t.id DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            params_vec.push(Box::new(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(params_vec.iter().map(|p| p.as_ref())),
            TxRow::read,
        )?;
        let mut raw = Vec::new();
        for row in rows {
            raw.push(row?);
        }
        self.hydrate(raw)
    }

    fn recurring_transactions(&self, user_id: UserId) -> Result<Vec<Transaction>> {
        let sql = format!(
            "SELECT {} FROM transactions t WHERE t.user_id=?1 AND t.recurring=1 ORDER BY t.id",
            TX_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], TxRow::read)?;
        let mut raw = Vec::new();
        for row in rows {
            raw.push(row?);
        }
        self.hydrate(raw)
    }

    fn set_next_due_date(&self, user_id: UserId, id: i64, next_due: NaiveDate) -> Result<()> {
        let n = self.conn.execute(
            "UPDATE transactions SET next_due_date=?1 WHERE id=?2 AND user_id=?3 AND recurring=1",
            params![next_due.to_string(), id, user_id],
        )?;
        if n == 0 {
            return Err(Error::not_found(format!("Recurring transaction {}", id)));
        }
        Ok(())
    }
}

const BUDGET_COLUMNS: &str = "id, user_id, category, limit_amount, total_spent, period, version";

fn read_budget(r: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, i64, String, String, String, String, i64)> {
    Ok((
        r.get(0)?,
        r.get(1)?,
        r.get(2)?,
        r.get(3)?,
        r.get(4)?,
        r.get(5)?,
        r.get(6)?,
    ))
}

fn budget_from(raw: (i64, i64, String, String, String, String, i64)) -> Result<Budget> {
    let (id, user_id, category, limit, spent, period, version) = raw;
    Ok(Budget {
        id,
        user_id,
        category: category.parse()?,
        limit: parse_decimal(&limit)?,
        total_spent: parse_decimal(&spent)?,
        period,
        version,
    })
}

impl BudgetStore for SqliteStore<'_> {
    fn insert_budget(&self, budget: &NewBudget) -> Result<Budget> {
        if self
            .find_budget(budget.user_id, budget.category, Some(&budget.period))?
            .is_some()
        {
            return Err(Error::validation(format!(
                "You already have a {} budget set for {}. Update or delete it first.",
                budget.period, budget.category
            )));
        }
        self.conn.execute(
            "INSERT INTO budgets(user_id, category, limit_amount, total_spent, period, version)
             VALUES (?1, ?2, ?3, '0', ?4, 0)",
            params![
                budget.user_id,
                budget.category.as_str(),
                budget.limit.to_string(),
                budget.period
            ],
        )?;
        Ok(Budget {
            id: self.conn.last_insert_rowid(),
            user_id: budget.user_id,
            category: budget.category,
            limit: budget.limit,
            total_spent: Decimal::ZERO,
            period: budget.period.clone(),
            version: 0,
        })
    }

    fn find_budget(
        &self,
        user_id: UserId,
        category: crate::models::Category,
        period: Option<&str>,
    ) -> Result<Option<Budget>> {
        let raw = match period {
            Some(p) => self
                .conn
                .query_row(
                    &format!(
                        "SELECT {} FROM budgets WHERE user_id=?1 AND category=?2 AND period=?3 ORDER BY id LIMIT 1",
                        BUDGET_COLUMNS
                    ),
                    params![user_id, category.as_str(), p],
                    read_budget,
                )
                .optional()?,
            None => self
                .conn
                .query_row(
                    &format!(
                        "SELECT {} FROM budgets WHERE user_id=?1 AND category=?2 ORDER BY id LIMIT 1",
                        BUDGET_COLUMNS
                    ),
                    params![user_id, category.as_str()],
                    read_budget,
                )
                .optional()?,
        };
        raw.map(budget_from).transpose()
    }

    fn list_budgets(&self, user_id: UserId) -> Result<Vec<Budget>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM budgets WHERE user_id=?1 ORDER BY category, period",
            BUDGET_COLUMNS
        ))?;
        let rows = stmt.query_map(params![user_id], read_budget)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(budget_from(row?)?);
        }
        Ok(out)
    }

    fn compare_and_set_spent(
        &self,
        budget_id: i64,
        expected_version: i64,
        total_spent: Decimal,
    ) -> Result<bool> {
        let n = self.conn.execute(
            "UPDATE budgets SET total_spent=?1, version=version+1 WHERE id=?2 AND version=?3",
            params![total_spent.to_string(), budget_id, expected_version],
        )?;
        Ok(n == 1)
    }

    fn update_limit(&self, user_id: UserId, budget_id: i64, limit: Decimal) -> Result<bool> {
        let n = self.conn.execute(
            "UPDATE budgets SET limit_amount=?1, version=version+1 WHERE id=?2 AND user_id=?3",
            params![limit.to_string(), budget_id, user_id],
        )?;
        Ok(n > 0)
    }

    fn delete_budget(&self, user_id: UserId, category: crate::models::Category) -> Result<usize> {
        let n = self.conn.execute(
            "DELETE FROM budgets WHERE user_id=?1 AND category=?2",
            params![user_id, category.as_str()],
        )?;
        Ok(n)
    }
}

fn read_goal(r: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, i64, String, String, String, String)> {
    Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?))
}

fn goal_from(raw: (i64, i64, String, String, String, String)) -> Result<Goal> {
    let (id, user_id, name, target, current, deadline) = raw;
    Ok(Goal {
        id,
        user_id,
        name,
        target_amount: parse_decimal(&target)?,
        current_amount: parse_decimal(&current)?,
        deadline: parse_date(&deadline)?,
    })
}

impl GoalStore for SqliteStore<'_> {
    fn insert_goal(&self, goal: &NewGoal) -> Result<Goal> {
        self.conn.execute(
            "INSERT INTO goals(user_id, name, target_amount, current_amount, deadline)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                goal.user_id,
                goal.name,
                goal.target_amount.to_string(),
                goal.current_amount.to_string(),
                goal.deadline.to_string()
            ],
        )?;
        Ok(Goal {
            id: self.conn.last_insert_rowid(),
            user_id: goal.user_id,
            name: goal.name.clone(),
            target_amount: goal.target_amount,
            current_amount: goal.current_amount,
            deadline: goal.deadline,
        })
    }

    fn list_goals(&self, user_id: UserId) -> Result<Vec<Goal>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, target_amount, current_amount, deadline
             FROM goals WHERE user_id=?1 ORDER BY deadline, id",
        )?;
        let rows = stmt.query_map(params![user_id], read_goal)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(goal_from(row?)?);
        }
        Ok(out)
    }

    fn add_to_goal(&self, user_id: UserId, goal_id: i64, amount: Decimal) -> Result<Option<Goal>> {
        let db_tx = self.conn.unchecked_transaction()?;
        let raw = self
            .conn
            .query_row(
                "SELECT id, user_id, name, target_amount, current_amount, deadline
                 FROM goals WHERE id=?1 AND user_id=?2",
                params![goal_id, user_id],
                read_goal,
            )
            .optional()?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let mut goal = goal_from(raw)?;
        goal.current_amount += amount;
        self.conn.execute(
            "UPDATE goals SET current_amount=?1 WHERE id=?2 AND user_id=?3",
            params![goal.current_amount.to_string(), goal_id, user_id],
        )?;
        db_tx.commit()?;
        Ok(Some(goal))
    }

    fn delete_goal(&self, user_id: UserId, goal_id: i64) -> Result<bool> {
        let n = self.conn.execute(
            "DELETE FROM goals WHERE id=?1 AND user_id=?2",
            params![goal_id, user_id],
        )?;
        Ok(n > 0)
    }
}

impl NotificationStore for SqliteStore<'_> {
    fn append(&self, n: &NewNotification) -> Result<Option<Notification>> {
        let created_at = Utc::now();
        let payload = serde_json::to_string(&n.payload)?;
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO notifications(user_id, kind, label, message, payload, dedupe_key, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                n.user_id,
                n.payload.kind().as_str(),
                n.label,
                n.message,
                payload,
                n.dedupe_key,
                created_at.to_rfc3339()
            ],
        )?;
        if inserted == 0 {
            log::debug!(
                "notification for user {} already recorded under key {:?}",
                n.user_id,
                n.dedupe_key
            );
            return Ok(None);
        }
        Ok(Some(Notification {
            id: self.conn.last_insert_rowid(),
            user_id: n.user_id,
            label: n.label.clone(),
            message: n.message.clone(),
            payload: n.payload.clone(),
            dedupe_key: n.dedupe_key.clone(),
            created_at,
        }))
    }

    fn list_notifications(
        &self,
        user_id: UserId,
        kind: Option<NotificationKind>,
    ) -> Result<Vec<Notification>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, label, message, payload, dedupe_key, created_at
             FROM notifications
             WHERE user_id=?1 AND (?2 IS NULL OR kind=?2)
             ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![user_id, kind.map(|k| k.as_str())], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, i64>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, Option<String>>(5)?,
                r.get::<_, String>(6)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, user_id, label, message, payload, dedupe_key, created_at) = row?;
            let created_at = DateTime::parse_from_rfc3339(&created_at)?.with_timezone(&Utc);
            out.push(Notification {
                id,
                user_id,
                label,
                message,
                payload: serde_json::from_str(&payload)?,
                dedupe_key,
                created_at,
            });
        }
        Ok(out)
    }
}

impl SavingsStore for SqliteStore<'_> {
    fn record_savings(&self, user_id: UserId, amount: Decimal, date: NaiveDate) -> Result<()> {
        self.conn.execute(
            "INSERT INTO savings(user_id, amount, date) VALUES (?1, ?2, ?3)",
            params![user_id, amount.to_string(), date.to_string()],
        )?;
        Ok(())
    }

    fn total_savings(&self, user_id: UserId) -> Result<Decimal> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT amount FROM savings WHERE user_id=?1")?;
        let mut rows = stmt.query(params![user_id])?;
        let mut total = Decimal::ZERO;
        while let Some(r) = rows.next()? {
            let a: String = r.get(0)?;
            total += parse_decimal(&a)?;
        }
        Ok(total)
    }
}
