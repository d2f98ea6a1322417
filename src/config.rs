// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub const DEFAULT_BASE_CURRENCY: &str = "USD";
pub const DEFAULT_REMINDER_WINDOW_DAYS: i64 = 7;

/// Tunables persisted in the `settings` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub base_currency: String,
    pub reminder_window_days: i64,
    pub dedupe_notifications: bool,
    pub advance_recurrence: bool,
    /// Percent of each income recorded as a savings allocation.
    pub savings_rate: Decimal,
    pub alert_email: bool,
    /// Ask the Frankfurter API when no stored rate covers a currency.
    pub live_rates: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            reminder_window_days: DEFAULT_REMINDER_WINDOW_DAYS,
            dedupe_notifications: true,
            advance_recurrence: false,
            savings_rate: Decimal::ZERO,
            alert_email: true,
            live_rates: false,
        }
    }
}

pub const KEYS: [&str; 7] = [
    "base_currency",
    "reminder_window_days",
    "dedupe_notifications",
    "advance_recurrence",
    "savings_rate",
    "alert_email",
    "live_rates",
];

impl Settings {
    pub fn load(conn: &Connection) -> Result<Settings> {
        let mut s = Settings::default();
        if let Some(v) = get_setting(conn, "base_currency")? {
            s.base_currency = v;
        }
        if let Some(v) = get_setting(conn, "reminder_window_days")? {
            s.reminder_window_days = v
                .parse()
                .with_context(|| format!("Invalid reminder_window_days '{}'", v))?;
        }
        if let Some(v) = get_setting(conn, "dedupe_notifications")? {
            s.dedupe_notifications = parse_bool(&v)?;
        }
        if let Some(v) = get_setting(conn, "advance_recurrence")? {
            s.advance_recurrence = parse_bool(&v)?;
        }
        if let Some(v) = get_setting(conn, "savings_rate")? {
            s.savings_rate = v
                .parse()
                .with_context(|| format!("Invalid savings_rate '{}'", v))?;
        }
        if let Some(v) = get_setting(conn, "alert_email")? {
            s.alert_email = parse_bool(&v)?;
        }
        if let Some(v) = get_setting(conn, "live_rates")? {
            s.live_rates = parse_bool(&v)?;
        }
        Ok(s)
    }

    /// Validates and stores one setting by key.
    pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "base_currency" => {
                let ccy = crate::utils::parse_currency(value)?;
                return set_setting(conn, key, &ccy);
            }
            "reminder_window_days" => {
                let n: i64 = value
                    .parse()
                    .with_context(|| format!("Invalid number of days '{}'", value))?;
                if n < 1 {
                    bail!("reminder_window_days must be at least 1");
                }
            }
            "dedupe_notifications" | "advance_recurrence" | "alert_email" | "live_rates" => {
                parse_bool(value)?;
            }
            "savings_rate" => {
                let pct = crate::utils::parse_decimal(value)?;
                if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
                    bail!("savings_rate must be between 0 and 100");
                }
            }
            other => bail!("Unknown setting '{}'. Known: {}", other, KEYS.join(", ")),
        }
        set_setting(conn, key, value)
    }
}

fn parse_bool(v: &str) -> Result<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("Invalid boolean '{}'", other),
    }
}

fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

// Base currency settings
pub fn get_base_currency(conn: &Connection) -> Result<String> {
    Ok(get_setting(conn, "base_currency")?.unwrap_or_else(|| DEFAULT_BASE_CURRENCY.to_string()))
}

pub fn set_base_currency(conn: &Connection, ccy: &str) -> Result<()> {
    Settings::set(conn, "base_currency", ccy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn defaults_when_unset() {
        let conn = conn();
        assert_eq!(Settings::load(&conn).unwrap(), Settings::default());
    }

    #[test]
    fn set_validates_and_persists() {
        let conn = conn();
        Settings::set(&conn, "savings_rate", "20").unwrap();
        Settings::set(&conn, "dedupe_notifications", "off").unwrap();
        set_base_currency(&conn, "eur").unwrap();
        let s = Settings::load(&conn).unwrap();
        assert_eq!(s.savings_rate, Decimal::new(20, 0));
        assert!(!s.dedupe_notifications);
        assert_eq!(s.base_currency, "EUR");

        assert!(Settings::set(&conn, "savings_rate", "120").is_err());
        assert!(Settings::set(&conn, "reminder_window_days", "0").is_err());
        assert!(Settings::set(&conn, "colour", "blue").is_err());
    }
}
