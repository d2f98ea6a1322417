// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use budgetwatch::alerts::LogAlertSink;
use budgetwatch::config::{Settings, get_base_currency, set_base_currency};
use budgetwatch::fx::{self, ExchangeRateProvider, FallbackRates, StoredRates};
use budgetwatch::models::{Category, TxType};
use budgetwatch::service::{FinanceService, TransactionDraft};
use budgetwatch::sqlite_store::SqliteStore;
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    budgetwatch::db::init_schema(&conn).unwrap();
    conn
}

fn d(m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, m, day).unwrap()
}

#[test]
fn stored_rate_and_reciprocal() {
    let conn = setup();
    // 1 USD = 0.90 EUR, 1 GBP = 1.25 USD
    fx::store_rate(&conn, d(8, 1), "USD", "EUR", Decimal::new(90, 2)).unwrap();
    fx::store_rate(&conn, d(8, 1), "GBP", "USD", Decimal::new(125, 2)).unwrap();

    let rates = StoredRates::new(&conn, "USD").as_of(d(8, 15));
    let eur = rates.rate("EUR").unwrap();
    assert_eq!((Decimal::from(9) * eur).round_dp(2), Decimal::from(10));
    assert_eq!(rates.rate("GBP").unwrap(), Decimal::new(125, 2));
    assert_eq!(rates.rate("USD").unwrap(), Decimal::ONE);
    assert!(rates.rate("JPY").is_err());
}

#[test]
fn rates_are_taken_as_of_a_date() {
    let conn = setup();
    fx::store_rate(&conn, d(8, 1), "USD", "EUR", Decimal::new(80, 2)).unwrap();
    fx::store_rate(&conn, d(8, 10), "USD", "EUR", Decimal::new(50, 2)).unwrap();
    // same day twice keeps the latest value
    fx::store_rate(&conn, d(8, 10), "USD", "EUR", Decimal::new(40, 2)).unwrap();

    let early = StoredRates::new(&conn, "USD").as_of(d(8, 5));
    assert_eq!(early.rate("EUR").unwrap(), Decimal::new(125, 2));
    let late = StoredRates::new(&conn, "USD").as_of(d(8, 20));
    assert_eq!(late.rate("EUR").unwrap(), Decimal::new(25, 1));
    let before = StoredRates::new(&conn, "USD").as_of(d(7, 1));
    assert!(before.rate("EUR").is_err());
    assert_eq!(fx::list_rates(&conn, 10).unwrap().len(), 2);
}

#[test]
fn transactions_convert_with_stored_rates() {
    let conn = setup();
    fx::store_rate(&conn, d(8, 1), "USD", "EUR", Decimal::new(80, 2)).unwrap();
    let store = SqliteStore::new(&conn);
    let rates = FallbackRates::new().with(StoredRates::new(&conn, "USD"));
    let svc = FinanceService::new(&store, &rates, &LogAlertSink, Settings::default());
    let user = svc.register_user("Ada", "ada@example.com").unwrap();
    svc.create_budget(user.id, Category::Shopping, Decimal::from(100), "monthly")
        .unwrap();

    let mut draft = TransactionDraft::new(TxType::Expense, Category::Shopping, Decimal::from(40), d(8, 2));
    draft.currency = Some("EUR".into());
    let r = svc.record_transaction(user.id, draft.clone()).unwrap();
    assert_eq!(r.transaction.amount, Decimal::from(40));
    assert_eq!(r.transaction.converted_amount, Decimal::from(50));
    assert_eq!(svc.budget(user.id, Category::Shopping).unwrap().total_spent, Decimal::from(50));

    // unknown currency degrades to a rate of 1
    draft.currency = Some("CHF".into());
    let r = svc.record_transaction(user.id, draft).unwrap();
    assert_eq!(r.transaction.exchange_rate, Decimal::ONE);
    assert_eq!(r.transaction.converted_amount, Decimal::from(40));

    let foreign = fx::foreign_currencies(&conn, "USD").unwrap();
    assert!(foreign.contains(&"EUR".to_string()));
    assert!(foreign.contains(&"CHF".to_string()));
}

#[test]
fn base_currency_setting() {
    let conn = setup();
    assert_eq!(get_base_currency(&conn).unwrap(), "USD");
    set_base_currency(&conn, "inr").unwrap();
    assert_eq!(get_base_currency(&conn).unwrap(), "INR");
    assert!(set_base_currency(&conn, "rupees").is_err());
}
