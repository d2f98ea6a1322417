// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;

use super::arg;
use crate::config::{get_base_currency, set_base_currency};
use crate::fx::{self, ExchangeRateProvider, FrankfurterRates, StoredRates};
use crate::utils::{maybe_print_json, parse_currency, parse_date, parse_decimal, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set-base", sub)) => {
            let ccy = parse_currency(arg(sub, "currency")?)?;
            set_base_currency(conn, &ccy)?;
            println!("Base currency set to {}", ccy);
        }
        Some(("set", sub)) => {
            let base = get_base_currency(conn)?;
            let quote = parse_currency(arg(sub, "quote")?)?;
            if quote == base {
                bail!("{} is the base currency; its rate is always 1", quote);
            }
            let rate = parse_decimal(arg(sub, "rate")?)?;
            if rate <= rust_decimal::Decimal::ZERO {
                bail!("Rate must be positive, got {}", rate);
            }
            let date = match sub.get_one::<String>("date") {
                Some(d) => parse_date(d)?,
                None => Utc::now().date_naive(),
            };
            fx::store_rate(conn, date, &base, &quote, rate)?;
            println!("{}: 1 {} = {} {}", date, base, rate, quote);
        }
        Some(("fetch", sub)) => {
            let days = *sub.get_one::<i64>("days").unwrap_or(&30);
            let base = get_base_currency(conn)?;
            let quotes = fx::foreign_currencies(conn, &base)?;
            if quotes.is_empty() {
                println!("No non-base currencies found; nothing to fetch.");
                return Ok(());
            }
            let n = FrankfurterRates::new(&base)?
                .fetch_into(conn, &quotes, days)
                .context("Fetching rates from Frankfurter failed")?;
            println!("Stored {} rate(s) for {} via Frankfurter (ECB).", n, quotes.join(", "));
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("convert", sub)) => convert(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
struct RateRow {
    date: String,
    base: String,
    quote: String,
    rate: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let limit = *sub.get_one::<usize>("limit").unwrap_or(&50);
    let data: Vec<RateRow> = fx::list_rates(conn, limit)?
        .into_iter()
        .map(|(date, base, quote, rate)| RateRow {
            date,
            base,
            quote,
            rate,
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|r| vec![r.date.clone(), r.base.clone(), r.quote.clone(), r.rate.clone()])
            .collect();
        println!("{}", pretty_table(&["Date", "Base", "Quote", "Rate"], rows));
    }
    Ok(())
}

/// Converts into the base currency using stored rates only.
fn convert(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let base = get_base_currency(conn)?;
    let amount = parse_decimal(arg(sub, "amount")?)?;
    let from = parse_currency(arg(sub, "from")?)?;
    let mut rates = StoredRates::new(conn, &base);
    if let Some(d) = sub.get_one::<String>("date") {
        rates = rates.as_of(parse_date(d)?);
    }
    let rate = rates.rate(&from)?;
    println!("{} {} -> {:.4} {} (rate {})", amount, from, amount * rate, base, rate.round_dp(6));
    Ok(())
}
