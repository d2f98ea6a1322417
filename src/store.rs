// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Storage capabilities the tracking core is written against.
//!
//! Every method is scoped to a single user; implementations must never
//! return or mutate rows belonging to someone else.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::errors::Result;
use crate::models::{
    Budget, Category, Goal, NewBudget, NewGoal, NewNotification, NewTransaction, Notification,
    NotificationKind, Transaction, TransactionFilter, User, UserId,
};

pub trait UserStore {
    fn insert_user(&self, name: &str, email: &str) -> Result<User>;
    fn find_user(&self, user_id: UserId) -> Result<Option<User>>;
    fn list_users(&self) -> Result<Vec<User>>;
}

pub trait LedgerStore {
    fn insert_transaction(&self, tx: &NewTransaction) -> Result<Transaction>;
    fn get_transaction(&self, user_id: UserId, id: i64) -> Result<Option<Transaction>>;
    fn update_transaction(&self, tx: &Transaction) -> Result<()>;
    fn delete_transaction(&self, user_id: UserId, id: i64) -> Result<bool>;
    fn find_transactions(
        &self,
        user_id: UserId,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>>;
    fn recurring_transactions(&self, user_id: UserId) -> Result<Vec<Transaction>>;
    fn set_next_due_date(&self, user_id: UserId, id: i64, next_due: NaiveDate) -> Result<()>;
}

pub trait BudgetStore {
    /// Rejects a second budget for the same (user, category, period).
    fn insert_budget(&self, budget: &NewBudget) -> Result<Budget>;
    /// Lowest-id budget for the category, optionally narrowed to one period.
    fn find_budget(
        &self,
        user_id: UserId,
        category: Category,
        period: Option<&str>,
    ) -> Result<Option<Budget>>;
    fn list_budgets(&self, user_id: UserId) -> Result<Vec<Budget>>;
    /// Writes `total_spent` only if the stored version still equals
    /// `expected_version`, bumping it. Returns false when another writer won.
    fn compare_and_set_spent(
        &self,
        budget_id: i64,
        expected_version: i64,
        total_spent: Decimal,
    ) -> Result<bool>;
    fn update_limit(&self, user_id: UserId, budget_id: i64, limit: Decimal) -> Result<bool>;
    fn delete_budget(&self, user_id: UserId, category: Category) -> Result<usize>;
}

pub trait GoalStore {
    fn insert_goal(&self, goal: &NewGoal) -> Result<Goal>;
    fn list_goals(&self, user_id: UserId) -> Result<Vec<Goal>>;
    fn add_to_goal(&self, user_id: UserId, goal_id: i64, amount: Decimal) -> Result<Option<Goal>>;
    fn delete_goal(&self, user_id: UserId, goal_id: i64) -> Result<bool>;
}

pub trait NotificationStore {
    /// Append-only. Returns `None` when a notification with the same
    /// dedupe key already exists for the user.
    fn append(&self, notification: &NewNotification) -> Result<Option<Notification>>;
    fn list_notifications(
        &self,
        user_id: UserId,
        kind: Option<NotificationKind>,
    ) -> Result<Vec<Notification>>;
}

pub trait SavingsStore {
    fn record_savings(&self, user_id: UserId, amount: Decimal, date: NaiveDate) -> Result<()>;
    fn total_savings(&self, user_id: UserId) -> Result<Decimal>;
}

/// Every capability the finance service needs, behind one object.
pub trait FinanceStore:
    UserStore + LedgerStore + BudgetStore + GoalStore + NotificationStore + SavingsStore
{
}

impl<T> FinanceStore for T where
    T: UserStore + LedgerStore + BudgetStore + GoalStore + NotificationStore + SavingsStore + ?Sized
{
}
