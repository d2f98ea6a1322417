// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

pub type UserId = i64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// Closed set of labels shared by transactions and budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Food,
    Transportation,
    Entertainment,
    Bills,
    Shopping,
    Salary,
    Rent,
    Healthcare,
    Investment,
    Others,
    Hobbies,
    Books,
    Savings,
    Fitness,
}

impl Category {
    pub const ALL: [Category; 14] = [
        Category::Food,
        Category::Transportation,
        Category::Entertainment,
        Category::Bills,
        Category::Shopping,
        Category::Salary,
        Category::Rent,
        Category::Healthcare,
        Category::Investment,
        Category::Others,
        Category::Hobbies,
        Category::Books,
        Category::Savings,
        Category::Fitness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transportation => "Transportation",
            Category::Entertainment => "Entertainment",
            Category::Bills => "Bills",
            Category::Shopping => "Shopping",
            Category::Salary => "Salary",
            Category::Rent => "Rent",
            Category::Healthcare => "Healthcare",
            Category::Investment => "Investment",
            Category::Others => "Others",
            Category::Hobbies => "Hobbies",
            Category::Books => "Books",
            Category::Savings => "Savings",
            Category::Fitness => "Fitness",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                Error::validation(format!(
                    "Invalid category '{}'. Choose from the predefined categories.",
                    s
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxType {
    Income,
    Expense,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Income => "income",
            TxType::Expense => "expense",
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(TxType::Income),
            "expense" => Ok(TxType::Expense),
            other => Err(Error::validation(format!(
                "Invalid transaction type '{}', expected income or expense",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrencePattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrencePattern::Daily => "daily",
            RecurrencePattern::Weekly => "weekly",
            RecurrencePattern::Monthly => "monthly",
            RecurrencePattern::Yearly => "yearly",
        }
    }

    /// The occurrence one period after `date`. Month arithmetic clamps to
    /// the last day of shorter months.
    pub fn advance(&self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            RecurrencePattern::Daily => date.checked_add_days(Days::new(1)),
            RecurrencePattern::Weekly => date.checked_add_days(Days::new(7)),
            RecurrencePattern::Monthly => date.checked_add_months(Months::new(1)),
            RecurrencePattern::Yearly => date.checked_add_months(Months::new(12)),
        }
    }
}

impl fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecurrencePattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(RecurrencePattern::Daily),
            "weekly" => Ok(RecurrencePattern::Weekly),
            "monthly" => Ok(RecurrencePattern::Monthly),
            "yearly" => Ok(RecurrencePattern::Yearly),
            other => Err(Error::validation(format!(
                "Invalid recurrence pattern '{}', expected daily, weekly, monthly or yearly",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub pattern: RecurrencePattern,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub next_due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: UserId,
    pub tx_type: TxType,
    pub category: Category,
    pub amount: Decimal,
    pub currency: String,
    pub exchange_rate: Decimal,
    pub converted_amount: Decimal,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub tags: Vec<String>,
    pub recurring: bool,
    pub recurrence: Option<Recurrence>,
}

impl Transaction {
    pub fn is_expense(&self) -> bool {
        self.tx_type == TxType::Expense
    }

    /// Human label for recurring reminders: the note when present, else the category.
    pub fn task_label(&self) -> String {
        match self.note.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => self.category.to_string(),
        }
    }

    pub fn next_due_date(&self) -> Option<NaiveDate> {
        if !self.recurring {
            return None;
        }
        self.recurrence.as_ref().and_then(|r| r.next_due_date)
    }
}

/// A fully resolved transaction ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: UserId,
    pub tx_type: TxType,
    pub category: Category,
    pub amount: Decimal,
    pub currency: String,
    pub exchange_rate: Decimal,
    pub converted_amount: Decimal,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub tags: Vec<String>,
    pub recurring: bool,
    pub recurrence: Option<Recurrence>,
}

/// Query over a user's transactions. Every set field must match; `tags`
/// matches when the transaction carries any of them.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub tx_type: Option<TxType>,
    pub category: Option<Category>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub limit: Option<usize>,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(t) = self.tx_type {
            if tx.tx_type != t {
                return false;
            }
        }
        if let Some(c) = self.category {
            if tx.category != c {
                return false;
            }
        }
        if let Some(start) = self.start {
            if tx.date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if tx.date > end {
                return false;
            }
        }
        if !self.tags.is_empty() && !tx.tags.iter().any(|t| self.tags.contains(t)) {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub user_id: UserId,
    pub category: Category,
    pub limit: Decimal,
    pub total_spent: Decimal,
    pub period: String,
    /// Bumped on every spend update; guards concurrent reconciliations.
    pub version: i64,
}

impl Budget {
    pub fn balance(&self) -> Decimal {
        self.limit - self.total_spent
    }

    /// totalSpent / limit x 100.
    pub fn spending_rate(&self) -> Decimal {
        spending_rate(self.total_spent, self.limit)
    }
}

pub fn spending_rate(spent: Decimal, limit: Decimal) -> Decimal {
    if limit.is_zero() {
        return Decimal::ZERO;
    }
    spent / limit * Decimal::ONE_HUNDRED
}

#[derive(Debug, Clone)]
pub struct NewBudget {
    pub user_id: UserId,
    pub category: Category,
    pub limit: Decimal,
    pub period: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub user_id: UserId,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub deadline: NaiveDate,
}

impl Goal {
    /// Percent of target reached, capped at 100.
    pub fn progress(&self) -> Decimal {
        if self.target_amount <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let pct = self.current_amount / self.target_amount * Decimal::ONE_HUNDRED;
        pct.min(Decimal::ONE_HUNDRED)
    }
}

#[derive(Debug, Clone)]
pub struct NewGoal {
    pub user_id: UserId,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub deadline: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Budget,
    Goal,
    Recurring,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Budget => "budget",
            NotificationKind::Goal => "goal",
            NotificationKind::Recurring => "recurring",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "budget" => Ok(NotificationKind::Budget),
            "goal" => Ok(NotificationKind::Goal),
            "recurring" => Ok(NotificationKind::Recurring),
            other => Err(Error::validation(format!(
                "Invalid notification type '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetLevel {
    Nearing,
    Exceeded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringStatus {
    Upcoming,
    Missed,
}

impl RecurringStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurringStatus::Upcoming => "upcoming",
            RecurringStatus::Missed => "missed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NotificationPayload {
    Budget {
        level: BudgetLevel,
        limit: Decimal,
        total_spent: Decimal,
        balance_after_spending: Decimal,
    },
    Goal {
        goal_id: i64,
        goal_name: String,
        days_left: i64,
        deadline: NaiveDate,
    },
    Recurring {
        transaction_id: i64,
        status: RecurringStatus,
        task: String,
        amount: Decimal,
        next_due_date: NaiveDate,
    },
}

impl NotificationPayload {
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationPayload::Budget { .. } => NotificationKind::Budget,
            NotificationPayload::Goal { .. } => NotificationKind::Goal,
            NotificationPayload::Recurring { .. } => NotificationKind::Recurring,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: UserId,
    pub label: String,
    pub message: String,
    pub payload: NotificationPayload,
    pub dedupe_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        self.payload.kind()
    }
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: UserId,
    pub label: String,
    pub message: String,
    pub payload: NotificationPayload,
    /// Notifications sharing a key for the same user are stored once.
    pub dedupe_key: Option<String>,
}
