// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::cell::{Cell, RefCell};

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::errors::{Error, Result};
use crate::models::{
    Budget, Category, Goal, NewBudget, NewGoal, NewNotification, NewTransaction, Notification,
    NotificationKind, Transaction, TransactionFilter, User, UserId,
};
use crate::store::{
    BudgetStore, GoalStore, LedgerStore, NotificationStore, SavingsStore, UserStore,
};

/// In-memory stores with hooks to simulate contention and outages.
#[derive(Default)]
pub struct MemStore {
    users: RefCell<Vec<User>>,
    budgets: RefCell<Vec<Budget>>,
    goals: RefCell<Vec<Goal>>,
    txs: RefCell<Vec<Transaction>>,
    notes: RefCell<Vec<Notification>>,
    savings: RefCell<Vec<(UserId, Decimal)>>,
    interference: Cell<Option<Decimal>>,
    conflict_forever: Cell<bool>,
    budgets_down: Cell<bool>,
}

impl MemStore {
    pub fn interfere_once(&self, amount: Decimal) {
        self.interference.set(Some(amount));
    }

    pub fn always_conflict(&self) {
        self.conflict_forever.set(true);
    }

    pub fn take_budgets_down(&self) {
        self.budgets_down.set(true);
    }

    pub fn budget(&self, id: i64) -> Budget {
        self.budgets
            .borrow()
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .unwrap()
    }

    pub fn notification_count(&self) -> usize {
        self.notes.borrow().len()
    }

    pub fn transaction(&self, id: i64) -> Transaction {
        self.txs
            .borrow()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .unwrap()
    }

    fn outage(&self) -> Result<()> {
        if self.budgets_down.get() {
            return Err(Error::Storage(rusqlite::Error::InvalidQuery));
        }
        Ok(())
    }
}

impl UserStore for MemStore {
    fn insert_user(&self, name: &str, email: &str) -> Result<User> {
        let mut users = self.users.borrow_mut();
        let user = User {
            id: users.len() as i64 + 1,
            name: name.into(),
            email: email.into(),
        };
        users.push(user.clone());
        Ok(user)
    }

    fn find_user(&self, user_id: UserId) -> Result<Option<User>> {
        Ok(self.users.borrow().iter().find(|u| u.id == user_id).cloned())
    }

    fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.users.borrow().clone())
    }
}

impl BudgetStore for MemStore {
    fn insert_budget(&self, b: &NewBudget) -> Result<Budget> {
        self.outage()?;
        if self.find_budget(b.user_id, b.category, Some(&b.period))?.is_some() {
            return Err(Error::validation("duplicate budget"));
        }
        let mut budgets = self.budgets.borrow_mut();
        let budget = Budget {
            id: budgets.len() as i64 + 1,
            user_id: b.user_id,
            category: b.category,
            limit: b.limit,
            total_spent: Decimal::ZERO,
            period: b.period.clone(),
            version: 0,
        };
        budgets.push(budget.clone());
        Ok(budget)
    }

    fn find_budget(
        &self,
        user_id: UserId,
        category: Category,
        period: Option<&str>,
    ) -> Result<Option<Budget>> {
        self.outage()?;
        Ok(self
            .budgets
            .borrow()
            .iter()
            .filter(|b| b.user_id == user_id && b.category == category)
            .find(|b| period.is_none_or(|p| b.period == p))
            .cloned())
    }

    fn list_budgets(&self, user_id: UserId) -> Result<Vec<Budget>> {
        self.outage()?;
        Ok(self
            .budgets
            .borrow()
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }

    fn compare_and_set_spent(
        &self,
        budget_id: i64,
        expected_version: i64,
        total_spent: Decimal,
    ) -> Result<bool> {
        self.outage()?;
        if self.conflict_forever.get() {
            return Ok(false);
        }
        let mut budgets = self.budgets.borrow_mut();
        let b = budgets
            .iter_mut()
            .find(|b| b.id == budget_id)
            .ok_or_else(|| Error::not_found("budget"))?;
        if let Some(extra) = self.interference.take() {
            b.total_spent += extra;
            b.version += 1;
        }
        if b.version != expected_version {
            return Ok(false);
        }
        b.total_spent = total_spent;
        b.version += 1;
        Ok(true)
    }

    fn update_limit(&self, user_id: UserId, budget_id: i64, limit: Decimal) -> Result<bool> {
        let mut budgets = self.budgets.borrow_mut();
        match budgets
            .iter_mut()
            .find(|b| b.id == budget_id && b.user_id == user_id)
        {
            Some(b) => {
                b.limit = limit;
                b.version += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_budget(&self, user_id: UserId, category: Category) -> Result<usize> {
        let mut budgets = self.budgets.borrow_mut();
        let before = budgets.len();
        budgets.retain(|b| !(b.user_id == user_id && b.category == category));
        Ok(before - budgets.len())
    }
}

impl GoalStore for MemStore {
    fn insert_goal(&self, g: &NewGoal) -> Result<Goal> {
        let mut goals = self.goals.borrow_mut();
        let goal = Goal {
            id: goals.len() as i64 + 1,
            user_id: g.user_id,
            name: g.name.clone(),
            target_amount: g.target_amount,
            current_amount: g.current_amount,
            deadline: g.deadline,
        };
        goals.push(goal.clone());
        Ok(goal)
    }

    fn list_goals(&self, user_id: UserId) -> Result<Vec<Goal>> {
        Ok(self
            .goals
            .borrow()
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect())
    }

    fn add_to_goal(&self, user_id: UserId, goal_id: i64, amount: Decimal) -> Result<Option<Goal>> {
        let mut goals = self.goals.borrow_mut();
        Ok(goals
            .iter_mut()
            .find(|g| g.id == goal_id && g.user_id == user_id)
            .map(|g| {
                g.current_amount += amount;
                g.clone()
            }))
    }

    fn delete_goal(&self, user_id: UserId, goal_id: i64) -> Result<bool> {
        let mut goals = self.goals.borrow_mut();
        let before = goals.len();
        goals.retain(|g| !(g.id == goal_id && g.user_id == user_id));
        Ok(goals.len() < before)
    }
}

impl NotificationStore for MemStore {
    fn append(&self, n: &NewNotification) -> Result<Option<Notification>> {
        let mut notes = self.notes.borrow_mut();
        if let Some(key) = &n.dedupe_key {
            if notes
                .iter()
                .any(|x| x.user_id == n.user_id && x.dedupe_key.as_ref() == Some(key))
            {
                return Ok(None);
            }
        }
        let note = Notification {
            id: notes.len() as i64 + 1,
            user_id: n.user_id,
            label: n.label.clone(),
            message: n.message.clone(),
            payload: n.payload.clone(),
            dedupe_key: n.dedupe_key.clone(),
            created_at: Utc::now(),
        };
        notes.push(note.clone());
        Ok(Some(note))
    }

    fn list_notifications(
        &self,
        user_id: UserId,
        kind: Option<NotificationKind>,
    ) -> Result<Vec<Notification>> {
        Ok(self
            .notes
            .borrow()
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id && kind.is_none_or(|k| n.kind() == k))
            .cloned()
            .collect())
    }
}

impl LedgerStore for MemStore {
    fn insert_transaction(&self, tx: &NewTransaction) -> Result<Transaction> {
        let mut txs = self.txs.borrow_mut();
        let t = Transaction {
            id: txs.len() as i64 + 1,
            user_id: tx.user_id,
            tx_type: tx.tx_type,
            category: tx.category,
            amount: tx.amount,
            currency: tx.currency.clone(),
            exchange_rate: tx.exchange_rate,
            converted_amount: tx.converted_amount,
            date: tx.date,
            note: tx.note.clone(),
            tags: tx.tags.clone(),
            recurring: tx.recurring,
            recurrence: tx.recurrence.clone(),
        };
        txs.push(t.clone());
        Ok(t)
    }

    fn get_transaction(&self, user_id: UserId, id: i64) -> Result<Option<Transaction>> {
        Ok(self
            .txs
            .borrow()
            .iter()
            .find(|t| t.id == id && t.user_id == user_id)
            .cloned())
    }

    fn update_transaction(&self, tx: &Transaction) -> Result<()> {
        let mut txs = self.txs.borrow_mut();
        let slot = txs
            .iter_mut()
            .find(|t| t.id == tx.id && t.user_id == tx.user_id)
            .ok_or_else(|| Error::not_found("transaction"))?;
        *slot = tx.clone();
        Ok(())
    }

    fn delete_transaction(&self, user_id: UserId, id: i64) -> Result<bool> {
        let mut txs = self.txs.borrow_mut();
        let before = txs.len();
        txs.retain(|t| !(t.id == id && t.user_id == user_id));
        Ok(txs.len() < before)
    }

    fn find_transactions(
        &self,
        user_id: UserId,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        let mut out: Vec<Transaction> = self
            .txs
            .borrow()
            .iter()
            .filter(|t| t.user_id == user_id && filter.matches(t))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        if let Some(limit) = filter.limit {
            out.truncate(limit);
        }
        Ok(out)
    }

    fn recurring_transactions(&self, user_id: UserId) -> Result<Vec<Transaction>> {
        Ok(self
            .txs
            .borrow()
            .iter()
            .filter(|t| t.user_id == user_id && t.recurring)
            .cloned()
            .collect())
    }

    fn set_next_due_date(&self, user_id: UserId, id: i64, next_due: NaiveDate) -> Result<()> {
        let mut txs = self.txs.borrow_mut();
        let t = txs
            .iter_mut()
            .find(|t| t.id == id && t.user_id == user_id)
            .ok_or_else(|| Error::not_found("transaction"))?;
        if let Some(r) = t.recurrence.as_mut() {
            r.next_due_date = Some(next_due);
        }
        Ok(())
    }
}

impl SavingsStore for MemStore {
    fn record_savings(&self, user_id: UserId, amount: Decimal, _date: NaiveDate) -> Result<()> {
        self.savings.borrow_mut().push((user_id, amount));
        Ok(())
    }

    fn total_savings(&self, user_id: UserId) -> Result<Decimal> {
        Ok(self
            .savings
            .borrow()
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, a)| *a)
            .sum())
    }
}
