// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use super::{Backend, arg};
use crate::utils::{maybe_print_json, parse_email, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let backend = Backend::open(conn)?;
    let svc = backend.service();
    match m.subcommand() {
        Some(("add", sub)) => {
            let email = parse_email(arg(sub, "email")?)?;
            let u = svc.register_user(arg(sub, "name")?, &email)?;
            println!("User {} created for {} <{}>", u.id, u.name, u.email);
        }
        Some(("list", sub)) => {
            let users = svc.users()?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &users)? {
                let rows = users
                    .iter()
                    .map(|u| vec![u.id.to_string(), u.name.clone(), u.email.clone()])
                    .collect();
                println!("{}", pretty_table(&["ID", "Name", "Email"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}
