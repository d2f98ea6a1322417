// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use budgetwatch::commands::{Backend, doctor};
use budgetwatch::models::{Category, NewBudget, TxType};
use budgetwatch::service::TransactionDraft;
use budgetwatch::sqlite_store::SqliteStore;
use budgetwatch::store::{BudgetStore, UserStore};
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    budgetwatch::db::init_schema(&conn).unwrap();
    conn
}

#[test]
fn clean_database_has_no_findings() {
    let conn = setup();
    assert!(doctor::findings(&conn).unwrap().is_empty());
}

#[test]
fn drift_missing_due_dates_and_rates_are_reported() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let user = store.insert_user("Ada", "ada@example.com").unwrap();
    store
        .insert_budget(&NewBudget {
            user_id: user.id,
            category: Category::Food,
            limit: Decimal::from(100),
            period: "monthly".into(),
        })
        .unwrap();
    // written behind the service's back: no reconciliation, no due date
    conn.execute(
        "INSERT INTO transactions(user_id, type, category, amount, currency, exchange_rate,
            converted_amount, date, recurring, recurrence_pattern)
         VALUES (?1, 'expense', 'Food', '12', 'EUR', '1', '12', '2025-01-05', 1, 'monthly')",
        params![user.id],
    )
    .unwrap();

    let found = doctor::findings(&conn).unwrap();
    let issues: Vec<&str> = found.iter().map(|f| f.issue).collect();
    assert_eq!(
        issues,
        vec!["budget_spend_drift", "recurring_without_due_date", "missing_fx"]
    );
    assert!(found[2].detail.contains("EUR"));
}

fn food(amount: i64) -> TransactionDraft {
    TransactionDraft::new(
        TxType::Expense,
        Category::Food,
        Decimal::from(amount),
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
    )
}

#[test]
fn second_budget_for_a_category_is_not_drift() {
    let conn = setup();
    let backend = Backend::open(&conn).unwrap();
    let svc = backend.service();
    let user = svc.register_user("Ada", "ada@example.com").unwrap();
    svc.create_budget(user.id, Category::Food, Decimal::from(100), "monthly")
        .unwrap();
    svc.create_budget(user.id, Category::Food, Decimal::from(30), "weekly")
        .unwrap();
    svc.record_transaction(user.id, food(10)).unwrap();

    let budgets = svc.budgets(user.id).unwrap();
    assert_eq!(budgets[0].total_spent, Decimal::from(10));
    assert_eq!(budgets[1].total_spent, Decimal::ZERO);
    assert!(doctor::findings(&conn).unwrap().is_empty());
}

#[test]
fn spending_before_the_budget_is_not_drift() {
    let conn = setup();
    let backend = Backend::open(&conn).unwrap();
    let svc = backend.service();
    let user = svc.register_user("Ada", "ada@example.com").unwrap();
    let early = svc.record_transaction(user.id, food(40)).unwrap();
    conn.execute(
        "UPDATE transactions SET created_at='2025-03-01 08:00:00.000' WHERE id=?1",
        params![early.transaction.id],
    )
    .unwrap();

    svc.create_budget(user.id, Category::Food, Decimal::from(100), "monthly")
        .unwrap();
    svc.record_transaction(user.id, food(15)).unwrap();
    assert!(doctor::findings(&conn).unwrap().is_empty());

    // a later edit that skips reconciliation is still caught
    conn.execute(
        "UPDATE budgets SET total_spent='0' WHERE user_id=?1",
        params![user.id],
    )
    .unwrap();
    let found = doctor::findings(&conn).unwrap();
    assert_eq!(found.len(), 1);
    assert!(found[0].detail.contains("stored 0.00, ledger 15.00"));
}
