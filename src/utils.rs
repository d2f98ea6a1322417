// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::errors;

const UA: &str = concat!(
    "budgetwatch/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/alphavelocity/budgetwatch)"
);

static CURRENCY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3}$").unwrap());
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

pub fn http_client() -> Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn parse_amount(s: &str) -> Result<Decimal> {
    let d = parse_decimal(s)?;
    if d < Decimal::ZERO {
        bail!("Amount must not be negative, got {}", d);
    }
    Ok(d)
}

/// Normalizes a 3-letter ISO currency code.
pub fn check_currency(s: &str) -> errors::Result<String> {
    let ccy = s.trim().to_uppercase();
    if !CURRENCY_RE.is_match(&ccy) {
        return Err(errors::Error::validation(format!(
            "Invalid currency code '{}', expected a 3-letter ISO code",
            s
        )));
    }
    Ok(ccy)
}

pub fn check_email(s: &str) -> errors::Result<String> {
    let email = s.trim();
    if !EMAIL_RE.is_match(email) {
        return Err(errors::Error::validation(format!(
            "Please provide a valid email address, got '{}'",
            s
        )));
    }
    Ok(email.to_string())
}

pub fn parse_currency(s: &str) -> Result<String> {
    Ok(check_currency(s)?)
}

pub fn parse_email(s: &str) -> Result<String> {
    Ok(check_email(s)?)
}

/// Splits a comma separated tag list, dropping blanks and duplicates.
pub fn parse_tags(s: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for t in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !out.iter().any(|o| o == t) {
            out.push(t.to_string());
        }
    }
    out
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {:.2}", ccy, d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_is_normalized() {
        assert_eq!(parse_currency(" eur ").unwrap(), "EUR");
        assert!(parse_currency("EURO").is_err());
        assert!(parse_currency("E1R").is_err());
    }

    #[test]
    fn negative_amounts_rejected() {
        assert!(parse_amount("-0.01").is_err());
        assert_eq!(parse_amount("0").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn tags_are_trimmed_and_unique() {
        assert_eq!(parse_tags(" a, b ,,a"), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn email_shape() {
        assert!(parse_email("ana@example.org").is_ok());
        assert!(parse_email("ana@example").is_err());
        assert!(check_email("@").unwrap_err().is_validation());
    }
}
