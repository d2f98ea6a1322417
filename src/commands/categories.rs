// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use crate::models::Category;
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(m: &clap::ArgMatches) -> Result<()> {
    if let Some(("list", sub)) = m.subcommand() {
        let names: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
        if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &names)? {
            let rows = names.iter().map(|n| vec![n.to_string()]).collect();
            println!("{}", pretty_table(&["Category"], rows));
        }
    }
    Ok(())
}
