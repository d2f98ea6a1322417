// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use budgetwatch::alerts::OutboxAlertSink;
use budgetwatch::commands::{Backend, transactions};
use budgetwatch::models::{Category, RecurrencePattern, TxType};
use budgetwatch::service::TransactionDraft;
use budgetwatch::{cli, db};
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> (Connection, i64) {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    let id = {
        let backend = Backend::open(&conn).unwrap();
        let svc = backend.service();
        let user = svc.register_user("Ada", "ada@example.com").unwrap();
        for (i, cat) in [Category::Food, Category::Rent, Category::Food].iter().enumerate() {
            let mut d = TransactionDraft::new(
                TxType::Expense,
                *cat,
                Decimal::from(10),
                NaiveDate::from_ymd_opt(2025, 1, i as u32 + 1).unwrap(),
            );
            d.tags = vec![format!("t{}", i)];
            svc.record_transaction(user.id, d).unwrap();
        }
        user.id
    };
    (conn, id)
}

fn sub_matches(args: &[&str]) -> clap::ArgMatches {
    let matches = cli::build_cli().get_matches_from(args);
    let (_, tx_m) = matches.subcommand().expect("tx subcommand");
    let (_, leaf) = tx_m.subcommand().expect("leaf subcommand");
    leaf.clone()
}

#[test]
fn list_limit_respected() {
    let (conn, user) = setup();
    let backend = Backend::open(&conn).unwrap();
    let m = sub_matches(&["budgetwatch", "tx", "list", "--limit", "2"]);
    let rows = transactions::query_rows(&backend, user, &m).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, "2025-01-03");
}

#[test]
fn list_filters_by_category_tags_and_range() {
    let (conn, user) = setup();
    let backend = Backend::open(&conn).unwrap();

    let m = sub_matches(&["budgetwatch", "tx", "list", "--category", "food"]);
    assert_eq!(transactions::query_rows(&backend, user, &m).unwrap().len(), 2);

    let m = sub_matches(&["budgetwatch", "tx", "list", "--tags", "t1, t2"]);
    let rows = transactions::query_rows(&backend, user, &m).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].category, "Rent");

    let m = sub_matches(&[
        "budgetwatch", "tx", "list", "--from", "2025-01-02", "--to", "2025-01-02",
    ]);
    assert_eq!(transactions::query_rows(&backend, user, &m).unwrap().len(), 1);

    // nothing leaks across users
    let m = sub_matches(&["budgetwatch", "tx", "list"]);
    assert!(transactions::query_rows(&backend, user + 1, &m).unwrap().is_empty());

    let m = sub_matches(&["budgetwatch", "tx", "list", "--category", "Groceries"]);
    assert!(transactions::query_rows(&backend, user, &m).is_err());
}

#[test]
fn add_arguments_build_a_recurring_draft() {
    let m = sub_matches(&[
        "budgetwatch",
        "tx",
        "add",
        "--type",
        "expense",
        "--category",
        "bills",
        "--amount",
        "49.99",
        "--currency",
        "eur",
        "--date",
        "2025-02-03",
        "--tags",
        "home,utilities",
        "--recurring",
        "--pattern",
        "weekly",
    ]);
    let d = transactions::draft_from(&m).unwrap();
    assert_eq!(d.tx_type, TxType::Expense);
    assert_eq!(d.category, Category::Bills);
    assert_eq!(d.amount, Decimal::new(4999, 2));
    assert_eq!(d.currency.as_deref(), Some("EUR"));
    assert_eq!(d.tags, vec!["home", "utilities"]);
    assert!(d.recurring);
    assert_eq!(d.pattern, Some(RecurrencePattern::Weekly));

    let m = sub_matches(&[
        "budgetwatch", "tx", "add", "-t", "income", "-c", "Salary", "--amount=-5",
    ]);
    assert!(transactions::draft_from(&m).is_err());

    let m = sub_matches(&[
        "budgetwatch", "tx", "add", "-t", "expense", "-c", "Food", "-a", "5", "--pattern",
        "daily",
    ]);
    assert!(transactions::draft_from(&m).is_err());
}

#[test]
fn recording_queues_summary_alerts() {
    let (conn, _) = setup();
    let pending = OutboxAlertSink::new(&conn).pending().unwrap();
    assert_eq!(pending.len(), 3);
    assert!(pending.iter().all(|(_, to, subject)| {
        to == "ada@example.com" && subject == "Transaction Recorded"
    }));
}
