// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use budgetwatch::{cli, commands, db};

const LOG_FORMAT_ENV: &str = "BUDGETWATCH_LOG_FORMAT";

fn init_tracing() {
    let log_format = std::env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries command output; logs go to stderr
    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<()> {
    init_tracing();
    let matches = cli::build_cli().get_matches();

    let conn = db::open_or_init()?;
    let user = matches.get_one::<i64>("user").copied();

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("user", sub)) => commands::users::handle(&conn, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&conn, user, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&conn, user, sub)?,
        Some(("goal", sub)) => commands::goals::handle(&conn, user, sub)?,
        Some(("notify", sub)) => commands::notifications::handle(&conn, user, sub)?,
        Some(("scan", sub)) => commands::scan::handle(&conn, user, sub)?,
        Some(("report", sub)) => commands::reports::handle(&conn, user, sub)?,
        Some(("fx", sub)) => commands::fx::handle(&conn, sub)?,
        Some(("category", sub)) => commands::categories::handle(sub)?,
        Some(("config", sub)) => commands::settings::handle(&conn, sub)?,
        Some(("dashboard", sub)) => commands::dashboard::handle(&conn, user, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        Some(("outbox", _)) => commands::outbox::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
