// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Exchange-rate capability. A rate is the multiplier turning one unit of a
//! currency into the base currency.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::{Error, Result};

pub trait ExchangeRateProvider {
    fn rate(&self, currency: &str) -> Result<Decimal>;
}

/// Looks the rate up and falls back to 1 on any failure.
pub fn rate_or_identity<P: ExchangeRateProvider + ?Sized>(provider: &P, currency: &str) -> Decimal {
    match provider.rate(currency) {
        Ok(r) if r > Decimal::ZERO => r,
        Ok(r) => {
            log::warn!("ignoring non-positive rate {} for {}; using 1", r, currency);
            Decimal::ONE
        }
        Err(e) => {
            log::warn!("exchange rate for {} unavailable ({}); using 1", currency, e);
            Decimal::ONE
        }
    }
}

/// Rates recorded in the `fx_rates` table, newest first.
pub struct StoredRates<'a> {
    conn: &'a Connection,
    base: String,
    as_of: NaiveDate,
}

impl<'a> StoredRates<'a> {
    pub fn new(conn: &'a Connection, base: &str) -> Self {
        StoredRates {
            conn,
            base: base.to_string(),
            as_of: Utc::now().date_naive(),
        }
    }

    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = date;
        self
    }

    fn find_rate(&self, base: &str, quote: &str) -> Result<Option<Decimal>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT rate FROM fx_rates WHERE base=?1 AND quote=?2 AND date<=?3 ORDER BY date DESC LIMIT 1",
        )?;
        let r: Option<String> = stmt
            .query_row(params![base, quote, self.as_of.to_string()], |r| r.get(0))
            .optional()?;
        r.map(|s| {
            s.parse::<Decimal>()
                .map_err(|_| Error::Corrupt(format!("Invalid rate '{}' for {}/{}", s, base, quote)))
        })
        .transpose()
    }
}

impl ExchangeRateProvider for StoredRates<'_> {
    fn rate(&self, currency: &str) -> Result<Decimal> {
        if currency == self.base {
            return Ok(Decimal::ONE);
        }
        // 1 base = r quote, so one unit of quote is 1/r base.
        if let Some(r) = self.find_rate(&self.base, currency)? {
            if !r.is_zero() {
                return Ok(Decimal::ONE / r);
            }
        }
        // Try reciprocal last
        if let Some(r) = self.find_rate(currency, &self.base)? {
            return Ok(r);
        }
        Err(Error::not_found(format!(
            "Rate {}/{} on or before {}",
            self.base, currency, self.as_of
        )))
    }
}

#[derive(Debug, Deserialize)]
struct Latest {
    rates: HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct Series {
    rates: HashMap<String, HashMap<String, f64>>,
}

/// Live rates from the Frankfurter (ECB) API.
pub struct FrankfurterRates {
    client: reqwest::blocking::Client,
    base: String,
    endpoint: String,
}

impl FrankfurterRates {
    pub const ENDPOINT: &'static str = "https://api.frankfurter.dev";

    pub fn new(base: &str) -> anyhow::Result<Self> {
        Ok(FrankfurterRates {
            client: crate::utils::http_client()?,
            base: base.to_string(),
            endpoint: Self::ENDPOINT.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    /// Daily base->quote rates for `days` back from today, written to `fx_rates`.
    pub fn fetch_into(&self, conn: &Connection, quotes: &[String], days: i64) -> Result<usize> {
        if quotes.is_empty() {
            return Ok(0);
        }
        let today = Utc::now().date_naive();
        let start = today - chrono::Duration::days(days);
        let url = format!(
            "{}/{start}..{today}?from={}&to={}",
            self.endpoint,
            self.base,
            quotes.join(",")
        );
        let series: Series = self.client.get(url).send()?.error_for_status()?.json()?;
        let mut stored = 0;
        for (date, mp) in series.rates {
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")?;
            for (quote, rate) in mp {
                let rate = Decimal::try_from(rate)?;
                stored += store_rate(conn, date, &self.base, &quote, rate)?;
            }
        }
        log::info!("stored {} fx rates from {}", stored, self.endpoint);
        Ok(stored)
    }
}

impl ExchangeRateProvider for FrankfurterRates {
    fn rate(&self, currency: &str) -> Result<Decimal> {
        if currency == self.base {
            return Ok(Decimal::ONE);
        }
        let url = format!("{}/latest?from={}&to={}", self.endpoint, currency, self.base);
        let latest: Latest = self.client.get(url).send()?.error_for_status()?.json()?;
        let r = latest
            .rates
            .get(&self.base)
            .copied()
            .ok_or_else(|| Error::Upstream(format!("no {} quote for {}", self.base, currency)))?;
        Ok(Decimal::try_from(r)?)
    }
}

/// Tries each provider in order; the first success wins.
pub struct FallbackRates<'a> {
    providers: Vec<Box<dyn ExchangeRateProvider + 'a>>,
}

impl<'a> FallbackRates<'a> {
    pub fn new() -> Self {
        FallbackRates {
            providers: Vec::new(),
        }
    }

    pub fn with(mut self, provider: impl ExchangeRateProvider + 'a) -> Self {
        self.providers.push(Box::new(provider));
        self
    }
}

impl Default for FallbackRates<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl ExchangeRateProvider for FallbackRates<'_> {
    fn rate(&self, currency: &str) -> Result<Decimal> {
        let mut last = Error::not_found(format!("Rate for {}", currency));
        for p in &self.providers {
            match p.rate(currency) {
                Ok(r) => return Ok(r),
                Err(e) => {
                    log::debug!("rate provider failed for {}: {}", currency, e);
                    last = e;
                }
            }
        }
        Err(last)
    }
}

pub fn store_rate(
    conn: &Connection,
    date: NaiveDate,
    base: &str,
    quote: &str,
    rate: Decimal,
) -> Result<usize> {
    let n = conn.execute(
        "INSERT INTO fx_rates(date, base, quote, rate) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(date, base, quote) DO UPDATE SET rate=excluded.rate",
        params![date.to_string(), base, quote, rate.to_string()],
    )?;
    Ok(n)
}

pub fn list_rates(conn: &Connection, limit: usize) -> Result<Vec<(String, String, String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT date, base, quote, rate FROM fx_rates ORDER BY date DESC, base, quote LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit as i64], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Currencies used by transactions that differ from the base.
pub fn foreign_currencies(conn: &Connection, base: &str) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT DISTINCT currency FROM transactions WHERE currency != ?1 ORDER BY currency")?;
    let rows = stmt.query_map(params![base], |r| r.get::<_, String>(0))?;
    let mut out = Vec::new();
    for row in rows {
        let c = row?;
        if !c.is_empty() {
            out.push(c);
        }
    }
    Ok(out)
}
