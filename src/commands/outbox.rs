// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::alerts::OutboxAlertSink;
use crate::utils::pretty_table;

pub fn handle(conn: &Connection) -> Result<()> {
    let pending = OutboxAlertSink::new(conn).pending()?;
    if pending.is_empty() {
        println!("Outbox is empty");
        return Ok(());
    }
    let rows = pending
        .into_iter()
        .map(|(id, to, subject)| vec![id.to_string(), to, subject])
        .collect();
    println!("{}", pretty_table(&["ID", "Recipient", "Subject"], rows));
    Ok(())
}
