// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Request-level operations: validation at the boundary, then the stores and
//! the tracking engine.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::alerts::{self, AlertSink};
use crate::config::Settings;
use crate::engine::ScanOptions;
use crate::engine::goals;
use crate::engine::reconcile::{self, Reconciliation};
use crate::engine::recurring;
use crate::engine::report::{self, BudgetRecommendation, Report};
use crate::errors::{Error, Result};
use crate::fx::{ExchangeRateProvider, rate_or_identity};
use crate::models::{
    Budget, BudgetLevel, Category, Goal, NewBudget, NewGoal, NewTransaction, Notification,
    NotificationKind, NotificationPayload, Recurrence, RecurrencePattern, Transaction,
    TransactionFilter, TxType, User, UserId,
};
use crate::store::FinanceStore;
use crate::utils::{check_currency, check_email};

/// User input for a new transaction, before rates and recurrence defaults.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub tx_type: TxType,
    pub category: Category,
    pub amount: Decimal,
    /// Defaults to the base currency.
    pub currency: Option<String>,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub tags: Vec<String>,
    pub recurring: bool,
    pub pattern: Option<RecurrencePattern>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub next_due_date: Option<NaiveDate>,
}

impl TransactionDraft {
    pub fn new(tx_type: TxType, category: Category, amount: Decimal, date: NaiveDate) -> Self {
        TransactionDraft {
            tx_type,
            category,
            amount,
            currency: None,
            date,
            note: None,
            tags: Vec::new(),
            recurring: false,
            pattern: None,
            start_date: None,
            end_date: None,
            next_due_date: None,
        }
    }
}

/// Fields an edit may change. `category` is accepted only when unchanged.
#[derive(Debug, Clone, Default)]
pub struct TransactionEdit {
    pub tx_type: Option<TxType>,
    pub category: Option<Category>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub date: Option<NaiveDate>,
    pub note: Option<String>,
    pub tags: Option<Vec<String>>,
    pub recurring: Option<bool>,
    pub pattern: Option<RecurrencePattern>,
    pub end_date: Option<NaiveDate>,
    pub next_due_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BudgetOutcome {
    /// Income is never reconciled.
    NotApplicable,
    /// Expense in a category with no budget.
    Untracked,
    Reconciled(Reconciliation),
    /// The ledger write stands; the budget was not updated.
    Failed { error: String },
}

#[derive(Debug, Serialize)]
pub struct Recorded {
    pub transaction: Transaction,
    pub budget: BudgetOutcome,
    pub savings_allocated: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct GoalProgress {
    #[serde(flatten)]
    pub goal: Goal,
    pub progress: Decimal,
}

impl From<Goal> for GoalProgress {
    fn from(goal: Goal) -> Self {
        GoalProgress {
            progress: goal.progress().round_dp(2),
            goal,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BudgetStatus {
    #[serde(flatten)]
    pub budget: Budget,
    pub balance: Decimal,
    pub spending_rate: Decimal,
}

impl From<Budget> for BudgetStatus {
    fn from(budget: Budget) -> Self {
        BudgetStatus {
            balance: budget.balance(),
            spending_rate: budget.spending_rate().round_dp(2),
            budget,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub user: User,
    pub base_currency: String,
    pub transaction_count: usize,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub total_savings: Decimal,
    pub goals: Vec<GoalProgress>,
    pub budgets: Vec<BudgetStatus>,
    pub recent_notifications: Vec<Notification>,
}

const DASHBOARD_NOTIFICATIONS: usize = 5;

pub struct FinanceService<'a> {
    store: &'a dyn FinanceStore,
    rates: &'a dyn ExchangeRateProvider,
    alerts: &'a dyn AlertSink,
    settings: Settings,
    now: Option<DateTime<Utc>>,
}

impl<'a> FinanceService<'a> {
    pub fn new(
        store: &'a dyn FinanceStore,
        rates: &'a dyn ExchangeRateProvider,
        alerts: &'a dyn AlertSink,
        settings: Settings,
    ) -> Self {
        FinanceService {
            store,
            rates,
            alerts,
            settings,
            now: None,
        }
    }

    /// Pins the clock used for deadline checks and scans.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    fn scan_options(&self) -> ScanOptions {
        ScanOptions::from(&self.settings)
    }

    // ---- users ----

    pub fn register_user(&self, name: &str, email: &str) -> Result<User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("Name must not be empty"));
        }
        let email = check_email(email)?;
        let user = self.store.insert_user(name, &email)?;
        log::info!("registered user {} ({})", user.id, user.email);
        Ok(user)
    }

    pub fn user(&self, user_id: UserId) -> Result<User> {
        self.store
            .find_user(user_id)?
            .ok_or_else(|| Error::not_found(format!("User {}", user_id)))
    }

    pub fn users(&self) -> Result<Vec<User>> {
        self.store.list_users()
    }

    // ---- transactions ----

    fn resolve_rate(&self, currency: &str) -> Decimal {
        if currency == self.settings.base_currency {
            Decimal::ONE
        } else {
            rate_or_identity(self.rates, currency)
        }
    }

    fn build(&self, user_id: UserId, draft: TransactionDraft) -> Result<NewTransaction> {
        if draft.amount < Decimal::ZERO {
            return Err(Error::validation(format!(
                "Amount must not be negative, got {}",
                draft.amount
            )));
        }
        let currency = match draft.currency {
            Some(c) => check_currency(&c)?,
            None => self.settings.base_currency.clone(),
        };
        let recurrence = if draft.recurring {
            Some(resolve_recurrence(
                draft.date,
                draft.pattern,
                draft.start_date,
                draft.end_date,
                draft.next_due_date,
            )?)
        } else {
            None
        };
        let exchange_rate = self.resolve_rate(&currency);
        Ok(NewTransaction {
            user_id,
            tx_type: draft.tx_type,
            category: draft.category,
            amount: draft.amount,
            currency,
            exchange_rate,
            converted_amount: (draft.amount * exchange_rate).round_dp(2),
            date: draft.date,
            note: draft.note.filter(|n| !n.trim().is_empty()),
            tags: draft.tags,
            recurring: draft.recurring,
            recurrence,
        })
    }

    /// Persists the transaction, then reconciles expenses against the
    /// category budget and allocates savings from income.
    pub fn record_transaction(&self, user_id: UserId, draft: TransactionDraft) -> Result<Recorded> {
        let user = self.user(user_id)?;
        let new_tx = self.build(user_id, draft)?;
        let transaction = self.store.insert_transaction(&new_tx)?;
        log::info!(
            "recorded {} {} {} for user {} (converted {})",
            transaction.tx_type,
            transaction.amount,
            transaction.currency,
            user_id,
            transaction.converted_amount
        );

        let budget = if transaction.is_expense() {
            match reconcile::reconcile(
                self.store,
                self.store,
                user_id,
                transaction.category,
                transaction.converted_amount,
            ) {
                Ok(Some(r)) => BudgetOutcome::Reconciled(r),
                Ok(None) => BudgetOutcome::Untracked,
                Err(e) => {
                    log::warn!(
                        "budget reconciliation failed for transaction {}: {}",
                        transaction.id,
                        e
                    );
                    BudgetOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            }
        } else {
            BudgetOutcome::NotApplicable
        };

        let savings_allocated = self.allocate_savings(&transaction);

        if self.settings.alert_email {
            self.send_alerts(&user, &transaction, &budget, savings_allocated);
        }

        Ok(Recorded {
            transaction,
            budget,
            savings_allocated,
        })
    }

    fn allocate_savings(&self, tx: &Transaction) -> Option<Decimal> {
        let rate = self.settings.savings_rate;
        if tx.tx_type != TxType::Income || rate <= Decimal::ZERO {
            return None;
        }
        let amount = (tx.converted_amount * rate / Decimal::ONE_HUNDRED).round_dp(2);
        match self.store.record_savings(tx.user_id, amount, tx.date) {
            Ok(()) => Some(amount),
            Err(e) => {
                log::warn!("savings allocation for transaction {} failed: {}", tx.id, e);
                None
            }
        }
    }

    fn send_alerts(
        &self,
        user: &User,
        tx: &Transaction,
        budget: &BudgetOutcome,
        savings: Option<Decimal>,
    ) {
        let base = &self.settings.base_currency;
        let savings = savings.map(|s| format!("{:.2} {}", s, base));
        let body = alerts::transaction_summary_body(
            &user.name,
            &format!("{:.2} {}", tx.amount, tx.currency),
            &tx.exchange_rate.to_string(),
            &format!("{:.2} {}", tx.converted_amount, base),
            savings.as_deref(),
        );
        alerts::send_best_effort(self.alerts, &user.email, "Transaction Recorded", &body);

        if let BudgetOutcome::Reconciled(Reconciliation {
            budget: b,
            notification: Some(n),
        }) = budget
        {
            if let NotificationPayload::Budget {
                level: BudgetLevel::Exceeded,
                ..
            } = n.payload
            {
                let body = alerts::budget_exceeded_body(
                    &user.name,
                    b.category.as_str(),
                    &format!("{:.2}", b.limit),
                    &format!("{:.2}", b.total_spent),
                    &format!("{:.2}", b.balance()),
                );
                alerts::send_best_effort(self.alerts, &user.email, "Budget Exceeded Alert", &body);
            }
        }
    }

    fn owned_transaction(&self, user_id: UserId, id: i64) -> Result<Transaction> {
        self.store
            .get_transaction(user_id, id)?
            .ok_or_else(|| Error::not_found(format!("Transaction {}", id)))
    }

    pub fn transaction(&self, user_id: UserId, id: i64) -> Result<Transaction> {
        self.owned_transaction(user_id, id)
    }

    /// Applies an edit. Budgets are not re-reconciled.
    pub fn edit_transaction(
        &self,
        user_id: UserId,
        id: i64,
        edit: TransactionEdit,
    ) -> Result<Transaction> {
        let mut tx = self.owned_transaction(user_id, id)?;
        if let Some(c) = edit.category {
            if c != tx.category {
                return Err(Error::validation(
                    "Category cannot be changed once a transaction is recorded",
                ));
            }
        }
        if let Some(a) = edit.amount {
            if a < Decimal::ZERO {
                return Err(Error::validation(format!(
                    "Amount must not be negative, got {}",
                    a
                )));
            }
            tx.amount = a;
        }
        if let Some(c) = edit.currency {
            tx.currency = check_currency(&c)?;
        }
        if let Some(t) = edit.tx_type {
            tx.tx_type = t;
        }
        if let Some(d) = edit.date {
            tx.date = d;
        }
        if let Some(n) = edit.note {
            tx.note = Some(n).filter(|n| !n.trim().is_empty());
        }
        if let Some(tags) = edit.tags {
            tx.tags = tags;
        }
        if let Some(r) = edit.recurring {
            tx.recurring = r;
        }

        if tx.recurring {
            let current = tx.recurrence.take();
            let pattern = edit.pattern.or(current.as_ref().map(|r| r.pattern));
            let start = current.as_ref().map(|r| r.start_date);
            let end = edit.end_date.or(current.as_ref().and_then(|r| r.end_date));
            let next = edit
                .next_due_date
                .or(current.as_ref().and_then(|r| r.next_due_date));
            tx.recurrence = Some(resolve_recurrence(tx.date, pattern, start, end, next)?);
        } else {
            tx.recurrence = None;
        }

        tx.exchange_rate = self.resolve_rate(&tx.currency);
        tx.converted_amount = (tx.amount * tx.exchange_rate).round_dp(2);
        self.store.update_transaction(&tx)?;
        log::info!("updated transaction {} for user {}", id, user_id);
        Ok(tx)
    }

    pub fn delete_transaction(&self, user_id: UserId, id: i64) -> Result<()> {
        if !self.store.delete_transaction(user_id, id)? {
            return Err(Error::not_found(format!("Transaction {}", id)));
        }
        log::info!("deleted transaction {} for user {}", id, user_id);
        Ok(())
    }

    pub fn transactions(&self, user_id: UserId, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        self.store.find_transactions(user_id, filter)
    }

    /// Moves a recurring transaction's next due date forward one period.
    pub fn advance_recurrence(&self, user_id: UserId, id: i64) -> Result<NaiveDate> {
        let tx = self.owned_transaction(user_id, id)?;
        let (Some(rec), Some(due)) = (tx.recurrence.as_ref(), tx.next_due_date()) else {
            return Err(Error::validation(format!(
                "Transaction {} is not recurring",
                id
            )));
        };
        let next = rec
            .pattern
            .advance(due)
            .ok_or_else(|| Error::validation("Next due date is out of range"))?;
        if rec.end_date.is_some_and(|end| next > end) {
            return Err(Error::validation(format!(
                "Transaction {} has no occurrence after {}",
                id, due
            )));
        }
        self.store.set_next_due_date(user_id, id, next)?;
        Ok(next)
    }

    // ---- budgets ----

    pub fn create_budget(
        &self,
        user_id: UserId,
        category: Category,
        limit: Decimal,
        period: &str,
    ) -> Result<Budget> {
        self.user(user_id)?;
        if limit <= Decimal::ZERO {
            return Err(Error::validation("Budget limit must be greater than zero"));
        }
        let period = period.trim();
        if period.is_empty() {
            return Err(Error::validation("Budget period must not be empty"));
        }
        let budget = self.store.insert_budget(&NewBudget {
            user_id,
            category,
            limit,
            period: period.to_string(),
        })?;
        log::info!(
            "created {} {} budget {} for user {}",
            budget.period,
            budget.category,
            budget.id,
            user_id
        );
        Ok(budget)
    }

    pub fn budgets(&self, user_id: UserId) -> Result<Vec<Budget>> {
        self.store.list_budgets(user_id)
    }

    pub fn budget(&self, user_id: UserId, category: Category) -> Result<Budget> {
        self.store
            .find_budget(user_id, category, None)?
            .ok_or_else(|| Error::not_found(format!("{} budget", category)))
    }

    pub fn update_budget_limit(
        &self,
        user_id: UserId,
        category: Category,
        limit: Decimal,
    ) -> Result<Budget> {
        if limit <= Decimal::ZERO {
            return Err(Error::validation("Budget limit must be greater than zero"));
        }
        let mut budget = self.budget(user_id, category)?;
        if !self.store.update_limit(user_id, budget.id, limit)? {
            return Err(Error::not_found(format!("{} budget", category)));
        }
        budget.limit = limit;
        budget.version += 1;
        Ok(budget)
    }

    pub fn delete_budget(&self, user_id: UserId, category: Category) -> Result<usize> {
        let n = self.store.delete_budget(user_id, category)?;
        if n == 0 {
            return Err(Error::not_found(format!("{} budget", category)));
        }
        Ok(n)
    }

    pub fn recommendations(&self, user_id: UserId) -> Result<Vec<BudgetRecommendation>> {
        let budgets = self.store.list_budgets(user_id)?;
        let expenses = self.store.find_transactions(
            user_id,
            &TransactionFilter {
                tx_type: Some(TxType::Expense),
                ..Default::default()
            },
        )?;
        Ok(report::recommend(&budgets, &expenses))
    }

    // ---- goals ----

    pub fn create_goal(
        &self,
        user_id: UserId,
        name: &str,
        target_amount: Decimal,
        deadline: NaiveDate,
    ) -> Result<Goal> {
        self.user(user_id)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("Goal name must not be empty"));
        }
        if target_amount <= Decimal::ZERO {
            return Err(Error::validation("Target amount must be greater than zero"));
        }
        if deadline <= self.now().date_naive() {
            return Err(Error::validation("Deadline must be a future date"));
        }
        self.store.insert_goal(&NewGoal {
            user_id,
            name: name.to_string(),
            target_amount,
            current_amount: Decimal::ZERO,
            deadline,
        })
    }

    pub fn goals(&self, user_id: UserId) -> Result<Vec<GoalProgress>> {
        Ok(self
            .store
            .list_goals(user_id)?
            .into_iter()
            .map(GoalProgress::from)
            .collect())
    }

    pub fn contribute(&self, user_id: UserId, goal_id: i64, amount: Decimal) -> Result<GoalProgress> {
        if amount <= Decimal::ZERO {
            return Err(Error::validation("Contribution must be greater than zero"));
        }
        let goal = self
            .store
            .add_to_goal(user_id, goal_id, amount)?
            .ok_or_else(|| Error::not_found(format!("Goal {}", goal_id)))?;
        log::info!("goal {} now at {}", goal.id, goal.current_amount);
        Ok(goal.into())
    }

    pub fn delete_goal(&self, user_id: UserId, goal_id: i64) -> Result<()> {
        if !self.store.delete_goal(user_id, goal_id)? {
            return Err(Error::not_found(format!("Goal {}", goal_id)));
        }
        Ok(())
    }

    // ---- monitors and reports ----

    pub fn scan_deadlines(&self, user_id: UserId) -> Result<Vec<Notification>> {
        goals::scan_deadlines(self.store, self.store, user_id, self.now(), self.scan_options())
    }

    pub fn scan_recurring(&self, user_id: UserId) -> Result<Vec<Notification>> {
        recurring::scan_recurring(self.store, self.store, user_id, self.now(), self.scan_options())
    }

    pub fn notifications(
        &self,
        user_id: UserId,
        kind: Option<NotificationKind>,
    ) -> Result<Vec<Notification>> {
        self.store.list_notifications(user_id, kind)
    }

    pub fn report(&self, user_id: UserId, filter: &TransactionFilter) -> Result<Report> {
        let filter = TransactionFilter {
            limit: None,
            ..filter.clone()
        };
        let txs = self.store.find_transactions(user_id, &filter)?;
        Ok(report::aggregate(&txs, &filter))
    }

    pub fn dashboard(&self, user_id: UserId) -> Result<Dashboard> {
        let user = self.user(user_id)?;
        let txs = self
            .store
            .find_transactions(user_id, &TransactionFilter::default())?;
        let totals = report::aggregate(&txs, &TransactionFilter::default());
        let mut recent = self.store.list_notifications(user_id, None)?;
        recent.truncate(DASHBOARD_NOTIFICATIONS);
        Ok(Dashboard {
            user,
            base_currency: self.settings.base_currency.clone(),
            transaction_count: txs.len(),
            total_income: totals.total_income,
            total_expense: totals.total_expense,
            total_savings: self.store.total_savings(user_id)?,
            goals: self.goals(user_id)?,
            budgets: self
                .store
                .list_budgets(user_id)?
                .into_iter()
                .map(BudgetStatus::from)
                .collect(),
            recent_notifications: recent,
        })
    }
}

/// Fills recurrence defaults: monthly, starting on the transaction date,
/// first due one period after the start.
pub fn resolve_recurrence(
    date: NaiveDate,
    pattern: Option<RecurrencePattern>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    next_due_date: Option<NaiveDate>,
) -> Result<Recurrence> {
    let pattern = pattern.unwrap_or(RecurrencePattern::Monthly);
    let start_date = start_date.unwrap_or(date);
    if let Some(end) = end_date {
        if end < start_date {
            return Err(Error::validation("Recurrence end date precedes its start date"));
        }
    }
    let next_due_date = match next_due_date {
        Some(d) => d,
        None => pattern
            .advance(start_date)
            .ok_or_else(|| Error::validation("Recurrence start date is out of range"))?,
    };
    Ok(Recurrence {
        pattern,
        start_date,
        end_date,
        next_due_date: Some(next_due_date),
    })
}
