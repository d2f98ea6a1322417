// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use super::{Backend, print_notifications, require_user};
use crate::models::UserId;
use crate::utils::maybe_print_json;

pub fn handle(conn: &Connection, user: Option<UserId>, m: &clap::ArgMatches) -> Result<()> {
    let Some((name, sub)) = m.subcommand() else {
        return Ok(());
    };
    let user = require_user(user)?;
    let backend = Backend::open(conn)?;
    let svc = backend.service();
    let emitted = match name {
        "goals" => svc.scan_deadlines(user)?,
        "recurring" => svc.scan_recurring(user)?,
        "all" => {
            let mut out = svc.scan_deadlines(user)?;
            out.extend(svc.scan_recurring(user)?);
            out
        }
        _ => return Ok(()),
    };
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &emitted)? {
        return Ok(());
    }
    if emitted.is_empty() {
        println!("No new notifications");
    } else {
        print_notifications(&emitted);
    }
    Ok(())
}
