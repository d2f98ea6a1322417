// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use budgetwatch::engine::reconcile::reconcile;
use budgetwatch::models::{BudgetLevel, Category, NewBudget, NotificationKind, NotificationPayload};
use budgetwatch::sqlite_store::SqliteStore;
use budgetwatch::store::{BudgetStore, NotificationStore, UserStore};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    budgetwatch::db::init_schema(&conn).unwrap();
    conn
}

fn dec(n: i64) -> Decimal {
    Decimal::from(n)
}

#[test]
fn nearing_then_exceeded_on_sqlite() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let user = store.insert_user("Ada", "ada@example.com").unwrap();
    let budget = store
        .insert_budget(&NewBudget {
            user_id: user.id,
            category: Category::Food,
            limit: dec(1000),
            period: "monthly".into(),
        })
        .unwrap();

    let r = reconcile(&store, &store, user.id, Category::Food, dec(850))
        .unwrap()
        .unwrap();
    assert_eq!(r.budget.total_spent, dec(850));
    assert_eq!(r.budget.balance(), dec(150));

    let r = reconcile(&store, &store, user.id, Category::Food, dec(200))
        .unwrap()
        .unwrap();
    assert_eq!(r.budget.balance(), dec(-50));
    assert!(r.notification.unwrap().message.contains("by 50.00"));

    // stored state agrees with what reconcile returned
    let stored = store
        .find_budget(user.id, Category::Food, None)
        .unwrap()
        .unwrap();
    assert_eq!(stored.id, budget.id);
    assert_eq!(stored.total_spent, dec(1050));
    assert_eq!(stored.version, 2);

    let notes = store
        .list_notifications(user.id, Some(NotificationKind::Budget))
        .unwrap();
    assert_eq!(notes.len(), 2);
    // newest first
    match &notes[0].payload {
        NotificationPayload::Budget {
            level,
            limit,
            total_spent,
            balance_after_spending,
        } => {
            assert_eq!(*level, BudgetLevel::Exceeded);
            assert_eq!(*limit, dec(1000));
            assert_eq!(*total_spent, dec(1050));
            assert_eq!(*balance_after_spending, dec(-50));
        }
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn stale_version_loses_the_write() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let user = store.insert_user("Ada", "ada@example.com").unwrap();
    let b = store
        .insert_budget(&NewBudget {
            user_id: user.id,
            category: Category::Rent,
            limit: dec(900),
            period: "monthly".into(),
        })
        .unwrap();
    assert!(store.compare_and_set_spent(b.id, 0, dec(100)).unwrap());
    // a second writer still holding version 0 must not overwrite
    assert!(!store.compare_and_set_spent(b.id, 0, dec(50)).unwrap());
    let stored = store.find_budget(user.id, Category::Rent, None).unwrap().unwrap();
    assert_eq!(stored.total_spent, dec(100));
    assert_eq!(stored.version, 1);
}

#[test]
fn duplicate_budget_per_period_rejected() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let user = store.insert_user("Ada", "ada@example.com").unwrap();
    let new = NewBudget {
        user_id: user.id,
        category: Category::Food,
        limit: dec(300),
        period: "monthly".into(),
    };
    store.insert_budget(&new).unwrap();
    assert!(store.insert_budget(&new).unwrap_err().is_validation());

    // a different period is a different budget; reconcile uses the oldest
    let weekly = store
        .insert_budget(&NewBudget {
            period: "weekly".into(),
            ..new.clone()
        })
        .unwrap();
    let r = reconcile(&store, &store, user.id, Category::Food, dec(10))
        .unwrap()
        .unwrap();
    assert_ne!(r.budget.id, weekly.id);
    assert_eq!(store.list_budgets(user.id).unwrap().len(), 2);
    assert_eq!(store.delete_budget(user.id, Category::Food).unwrap(), 2);
}

#[test]
fn other_users_budget_untouched() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let ada = store.insert_user("Ada", "ada@example.com").unwrap();
    let bob = store.insert_user("Bob", "bob@example.com").unwrap();
    store
        .insert_budget(&NewBudget {
            user_id: ada.id,
            category: Category::Food,
            limit: dec(100),
            period: "monthly".into(),
        })
        .unwrap();
    assert!(
        reconcile(&store, &store, bob.id, Category::Food, dec(95))
            .unwrap()
            .is_none()
    );
    let ada_food = store.find_budget(ada.id, Category::Food, None).unwrap().unwrap();
    assert_eq!(ada_food.total_spent, Decimal::ZERO);
    assert!(store.list_notifications(bob.id, None).unwrap().is_empty());
}
