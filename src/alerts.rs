// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{Connection, params};

use crate::errors::Result;

/// Best-effort delivery of human readable alerts (email in production).
pub trait AlertSink {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Sends and swallows failures; alert delivery never fails the caller.
pub fn send_best_effort<S: AlertSink + ?Sized>(sink: &S, to: &str, subject: &str, body: &str) {
    match sink.send(to, subject, body) {
        Ok(()) => log::debug!("alert '{}' queued for {}", subject, to),
        Err(e) => log::warn!("alert '{}' to {} not delivered: {}", subject, to, e),
    }
}

/// Queues alerts in the `outbox` table for an external mailer to pick up.
pub struct OutboxAlertSink<'a> {
    conn: &'a Connection,
}

impl<'a> OutboxAlertSink<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        OutboxAlertSink { conn }
    }

    pub fn pending(&self) -> Result<Vec<(i64, String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, recipient, subject FROM outbox ORDER BY id")?;
        let rows = stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

impl AlertSink for OutboxAlertSink<'_> {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO outbox(recipient, subject, body) VALUES (?1, ?2, ?3)",
            params![to, subject, body],
        )?;
        Ok(())
    }
}

/// Writes alerts to the log only.
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        log::info!("alert to {}: {} ({} chars)", to, subject, body.len());
        Ok(())
    }
}

pub fn budget_exceeded_body(
    name: &str,
    category: &str,
    limit: &str,
    spent: &str,
    balance: &str,
) -> String {
    format!(
        "Dear {name},\n\n\
         You have exceeded your budget for the category '{category}'.\n\n\
         Budget Limit: {limit}\n\
         Total Spent: {spent}\n\
         Remaining Balance: {balance}\n\n\
         Please review your spending and consider adjusting your budget.\n"
    )
}

pub fn transaction_summary_body(
    name: &str,
    amount: &str,
    rate: &str,
    converted: &str,
    savings: Option<&str>,
) -> String {
    let mut body = format!(
        "Dear {name},\n\n\
         Your recent transaction has been recorded.\n\n\
         Amount: {amount}\n\
         Exchange Rate: {rate}\n\
         Converted Amount: {converted}\n"
    );
    if let Some(s) = savings {
        body.push_str(&format!("Allocated to savings: {s}\n"));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    struct Down;

    impl AlertSink for Down {
        fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<()> {
            Err(Error::Upstream("smtp unreachable".into()))
        }
    }

    #[test]
    fn failures_are_swallowed() {
        send_best_effort(&Down, "a@b.io", "hi", "body");
    }

    #[test]
    fn outbox_queues_messages() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        let sink = OutboxAlertSink::new(&conn);
        sink.send("a@b.io", "Budget Alert", "body").unwrap();
        let pending = sink.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].2, "Budget Alert");
    }
}
