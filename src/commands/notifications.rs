// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use super::{Backend, print_notifications, require_user};
use crate::models::{NotificationKind, UserId};
use crate::utils::maybe_print_json;

pub fn handle(conn: &Connection, user: Option<UserId>, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("list", sub)) = m.subcommand() {
        let kind: Option<NotificationKind> = sub
            .get_one::<String>("type")
            .map(|t| t.parse())
            .transpose()?;
        let backend = Backend::open(conn)?;
        let items = backend
            .service()
            .notifications(require_user(user)?, kind)?;
        if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &items)? {
            print_notifications(&items);
        }
    }
    Ok(())
}
