// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod budgets;
pub mod categories;
pub mod dashboard;
pub mod doctor;
pub mod fx;
pub mod goals;
pub mod notifications;
pub mod outbox;
pub mod reports;
pub mod scan;
pub mod settings;
pub mod transactions;
pub mod users;

use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;

use crate::alerts::{AlertSink, LogAlertSink, OutboxAlertSink};
use crate::config::Settings;
use crate::fx::{FallbackRates, FrankfurterRates, StoredRates};
use crate::models::{Notification, TransactionFilter, UserId};
use crate::service::FinanceService;
use crate::sqlite_store::SqliteStore;
use crate::utils::{parse_date, parse_tags, pretty_table};

/// SQLite-backed collaborators for one command invocation.
pub struct Backend<'a> {
    store: SqliteStore<'a>,
    rates: FallbackRates<'a>,
    alerts: Box<dyn AlertSink + 'a>,
    settings: Settings,
}

impl<'a> Backend<'a> {
    pub fn open(conn: &'a Connection) -> Result<Self> {
        let settings = Settings::load(conn)?;
        let mut rates = FallbackRates::new().with(StoredRates::new(conn, &settings.base_currency));
        if settings.live_rates {
            match FrankfurterRates::new(&settings.base_currency) {
                Ok(live) => rates = rates.with(live),
                Err(e) => log::warn!("live exchange rates unavailable: {}", e),
            }
        }
        let alerts: Box<dyn AlertSink + 'a> = if settings.alert_email {
            Box::new(OutboxAlertSink::new(conn))
        } else {
            Box::new(LogAlertSink)
        };
        Ok(Backend {
            store: SqliteStore::new(conn),
            rates,
            alerts,
            settings,
        })
    }

    pub fn service(&self) -> FinanceService<'_> {
        FinanceService::new(
            &self.store,
            &self.rates,
            self.alerts.as_ref(),
            self.settings.clone(),
        )
    }
}

pub fn require_user(user: Option<UserId>) -> Result<UserId> {
    user.ok_or_else(|| anyhow!("This command needs --user <id> (or BUDGETWATCH_USER)"))
}

pub fn arg<'m>(m: &'m clap::ArgMatches, name: &str) -> Result<&'m str> {
    m.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("Missing required argument '{}'", name))
}

/// Date range, tags and category/type/limit options shared by listings.
pub fn filter_from(m: &clap::ArgMatches) -> Result<TransactionFilter> {
    let mut f = TransactionFilter::default();
    if let Some(c) = m.try_get_one::<String>("category").ok().flatten() {
        f.category = Some(c.parse()?);
    }
    if let Some(t) = m.try_get_one::<String>("type").ok().flatten() {
        f.tx_type = Some(t.parse()?);
    }
    if let Some(d) = m.try_get_one::<String>("from").ok().flatten() {
        f.start = Some(parse_date(d)?);
    }
    if let Some(d) = m.try_get_one::<String>("to").ok().flatten() {
        f.end = Some(parse_date(d)?);
    }
    if let Some(t) = m.try_get_one::<String>("tags").ok().flatten() {
        f.tags = parse_tags(t);
    }
    if let Some(n) = m.try_get_one::<usize>("limit").ok().flatten() {
        f.limit = Some(*n);
    }
    if let (Some(s), Some(e)) = (f.start, f.end) {
        if s > e {
            anyhow::bail!("--from {} is after --to {}", s, e);
        }
    }
    Ok(f)
}

pub fn print_notifications(items: &[Notification]) {
    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|n| {
            vec![
                n.id.to_string(),
                n.kind().as_str().to_string(),
                n.label.clone(),
                n.message.clone(),
                n.created_at.format("%Y-%m-%d %H:%M").to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["ID", "Type", "Label", "Message", "Created"], rows)
    );
}
