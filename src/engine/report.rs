// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Budget, Category, Transaction, TransactionFilter, TxType, spending_rate};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTotals {
    pub income: Decimal,
    pub expense: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net_savings: Decimal,
    pub category_breakdown: BTreeMap<Category, CategoryTotals>,
}

impl Report {
    fn add(&mut self, tx: &Transaction) {
        let amount = tx.converted_amount;
        let slot = self.category_breakdown.entry(tx.category).or_default();
        match tx.tx_type {
            TxType::Income => {
                self.total_income += amount;
                slot.income += amount;
            }
            TxType::Expense => {
                self.total_expense += amount;
                slot.expense += amount;
            }
        }
        self.net_savings = self.total_income - self.total_expense;
    }

    /// Combines two reports built over disjoint transaction sets.
    pub fn merge(mut self, other: &Report) -> Report {
        self.total_income += other.total_income;
        self.total_expense += other.total_expense;
        self.net_savings = self.total_income - self.total_expense;
        for (cat, t) in &other.category_breakdown {
            let slot = self.category_breakdown.entry(*cat).or_default();
            slot.income += t.income;
            slot.expense += t.expense;
        }
        self
    }
}

/// Folds the transactions matching `filter` into totals. Amounts are taken
/// in the base currency. `filter.limit` is ignored.
pub fn aggregate(transactions: &[Transaction], filter: &TransactionFilter) -> Report {
    let mut report = Report::default();
    for tx in transactions.iter().filter(|t| filter.matches(t)) {
        report.add(tx);
    }
    report
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Advice {
    Exceeded,
    Nearing,
    UnderUtilized,
    OnTrack,
}

impl Advice {
    pub fn for_rate(rate: Decimal) -> Advice {
        if rate > Decimal::ONE_HUNDRED {
            Advice::Exceeded
        } else if rate > Decimal::from(80) {
            Advice::Nearing
        } else if rate < Decimal::from(50) {
            Advice::UnderUtilized
        } else {
            Advice::OnTrack
        }
    }

    pub fn message(&self, category: Category) -> String {
        match self {
            Advice::Exceeded => format!(
                "You have exceeded your {} budget. Consider reducing spending here.",
                category
            ),
            Advice::Nearing => format!(
                "You are close to your {} budget limit. Spend carefully.",
                category
            ),
            Advice::UnderUtilized => format!(
                "Your {} budget is under-utilized. Consider reallocating the surplus.",
                category
            ),
            Advice::OnTrack => format!("Your {} spending is on track.", category),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetRecommendation {
    pub budget_id: i64,
    pub category: Category,
    pub limit: Decimal,
    pub total_spent: Decimal,
    pub spending_rate: Decimal,
    pub advice: Advice,
    pub message: String,
}

/// Advisory view of each budget against the expenses recorded in its
/// category. Nothing here is persisted.
pub fn recommend(budgets: &[Budget], transactions: &[Transaction]) -> Vec<BudgetRecommendation> {
    budgets
        .iter()
        .map(|b| {
            let spent: Decimal = transactions
                .iter()
                .filter(|t| t.user_id == b.user_id && t.is_expense() && t.category == b.category)
                .map(|t| t.converted_amount)
                .sum();
            let rate = spending_rate(spent, b.limit).round_dp(2);
            let advice = Advice::for_rate(rate);
            BudgetRecommendation {
                budget_id: b.id,
                category: b.category,
                limit: b.limit,
                total_spent: spent,
                spending_rate: rate,
                advice,
                message: advice.message(b.category),
            }
        })
        .collect()
}
