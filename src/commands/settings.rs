// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use super::arg;
use crate::config::Settings;
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => {
            let s = Settings::load(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
                let rows = vec![
                    vec!["base_currency".into(), s.base_currency.clone()],
                    vec![
                        "reminder_window_days".into(),
                        s.reminder_window_days.to_string(),
                    ],
                    vec![
                        "dedupe_notifications".into(),
                        s.dedupe_notifications.to_string(),
                    ],
                    vec![
                        "advance_recurrence".into(),
                        s.advance_recurrence.to_string(),
                    ],
                    vec!["savings_rate".into(), s.savings_rate.to_string()],
                    vec!["alert_email".into(), s.alert_email.to_string()],
                    vec!["live_rates".into(), s.live_rates.to_string()],
                ];
                println!("{}", pretty_table(&["Key", "Value"], rows));
            }
        }
        Some(("set", sub)) => {
            let key = arg(sub, "key")?;
            Settings::set(conn, key, arg(sub, "value")?)?;
            println!("{} updated", key);
        }
        _ => {}
    }
    Ok(())
}
