// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .conflicts_with("jsonl")
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print one JSON object per line"),
    )
}

fn category_arg(required: bool) -> Arg {
    Arg::new("category")
        .long("category")
        .short('c')
        .required(required)
        .help("Category, e.g. Food, Rent, Bills (see `category list`)")
}

fn date_range_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("from").long("from").help("Start date YYYY-MM-DD (inclusive)"))
        .arg(Arg::new("to").long("to").help("End date YYYY-MM-DD (inclusive)"))
        .arg(
            Arg::new("tags")
                .long("tags")
                .help("Comma separated tags; matches any"),
        )
}

fn recurrence_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("pattern")
            .long("pattern")
            .value_parser(["daily", "weekly", "monthly", "yearly"])
            .help("Recurrence pattern (default monthly)"),
    )
    .arg(Arg::new("end").long("end").help("Last date the transaction recurs"))
    .arg(
        Arg::new("next-due")
            .long("next-due")
            .help("Next due date (default: one period after the start)"),
    )
}

fn id_arg() -> Arg {
    Arg::new("id")
        .required(true)
        .value_parser(value_parser!(i64))
}

pub fn build_cli() -> Command {
    Command::new("budgetwatch")
        .about("Personal finance tracking: budgets, goals, recurring bills and reports")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("user")
                .long("user")
                .short('u')
                .global(true)
                .env("BUDGETWATCH_USER")
                .value_parser(value_parser!(i64))
                .help("Acting user id"),
        )
        .subcommand(Command::new("init").about("Initialize the database"))
        .subcommand(
            Command::new("user")
                .about("Manage users")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("email").long("email").required(true)),
                )
                .subcommand(json_flags(Command::new("list"))),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and inspect transactions")
                .subcommand(recurrence_args(
                    Command::new("add")
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .short('t')
                                .required(true)
                                .value_parser(["income", "expense"]),
                        )
                        .arg(category_arg(true))
                        .arg(Arg::new("amount").long("amount").short('a').required(true))
                        .arg(Arg::new("currency").long("currency"))
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD (default today)"))
                        .arg(Arg::new("note").long("note"))
                        .arg(Arg::new("tags").long("tags").help("Comma separated tags"))
                        .arg(
                            Arg::new("recurring")
                                .long("recurring")
                                .action(ArgAction::SetTrue),
                        )
                        .arg(Arg::new("start").long("start").help("Recurrence start date"))
                        .arg(
                            Arg::new("json")
                                .long("json")
                                .action(ArgAction::SetTrue),
                        ),
                ))
                .subcommand(json_flags(date_range_args(
                    Command::new("list")
                        .arg(category_arg(false))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .value_parser(["income", "expense"]),
                        )
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                )))
                .subcommand(recurrence_args(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(category_arg(false))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .value_parser(["income", "expense"]),
                        )
                        .arg(Arg::new("amount").long("amount"))
                        .arg(Arg::new("currency").long("currency"))
                        .arg(Arg::new("date").long("date"))
                        .arg(Arg::new("note").long("note"))
                        .arg(Arg::new("tags").long("tags"))
                        .arg(
                            Arg::new("recurring")
                                .long("recurring")
                                .value_parser(value_parser!(bool)),
                        ),
                ))
                .subcommand(Command::new("rm").arg(id_arg()))
                .subcommand(
                    Command::new("advance")
                        .about("Move a recurring transaction to its next occurrence")
                        .arg(id_arg()),
                ),
        )
        .subcommand(
            Command::new("budget")
                .about("Per-category spending limits")
                .subcommand(
                    Command::new("create")
                        .arg(category_arg(true))
                        .arg(Arg::new("limit").long("limit").required(true))
                        .arg(
                            Arg::new("period")
                                .long("period")
                                .default_value("monthly"),
                        ),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(json_flags(Command::new("show").arg(category_arg(true))))
                .subcommand(
                    Command::new("update")
                        .arg(category_arg(true))
                        .arg(Arg::new("limit").long("limit").required(true)),
                )
                .subcommand(Command::new("rm").arg(category_arg(true)))
                .subcommand(json_flags(Command::new("recommend"))),
        )
        .subcommand(
            Command::new("goal")
                .about("Savings goals")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("target").long("target").required(true))
                        .arg(
                            Arg::new("deadline")
                                .long("deadline")
                                .required(true)
                                .help("YYYY-MM-DD, must be in the future"),
                        ),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("contribute")
                        .arg(id_arg())
                        .arg(Arg::new("amount").long("amount").required(true)),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("notify").about("Notifications").subcommand(json_flags(
                Command::new("list").arg(
                    Arg::new("type")
                        .long("type")
                        .value_parser(["budget", "goal", "recurring"]),
                ),
            )),
        )
        .subcommand(
            Command::new("scan")
                .about("Run the deadline and recurring monitors")
                .subcommand(json_flags(Command::new("goals")))
                .subcommand(json_flags(Command::new("recurring")))
                .subcommand(json_flags(Command::new("all"))),
        )
        .subcommand(
            Command::new("report").about("Reports").subcommand(json_flags(
                date_range_args(Command::new("summary").arg(category_arg(false))),
            )),
        )
        .subcommand(
            Command::new("fx")
                .about("Exchange rates")
                .subcommand(
                    Command::new("set-base").arg(Arg::new("currency").required(true)),
                )
                .subcommand(
                    Command::new("set")
                        .about("Record a manual rate: 1 BASE = RATE QUOTE")
                        .arg(Arg::new("quote").long("quote").required(true))
                        .arg(Arg::new("rate").long("rate").required(true))
                        .arg(Arg::new("date").long("date")),
                )
                .subcommand(
                    Command::new("fetch")
                        .about("Download daily rates for every foreign currency in the ledger")
                        .arg(
                            Arg::new("days")
                                .long("days")
                                .value_parser(value_parser!(i64))
                                .default_value("30"),
                        ),
                )
                .subcommand(json_flags(
                    Command::new("list").arg(
                        Arg::new("limit")
                            .long("limit")
                            .value_parser(value_parser!(usize))
                            .default_value("50"),
                    ),
                ))
                .subcommand(
                    Command::new("convert")
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("from").long("from").required(true))
                        .arg(Arg::new("date").long("date")),
                ),
        )
        .subcommand(
            Command::new("category")
                .about("Known categories")
                .subcommand(json_flags(Command::new("list"))),
        )
        .subcommand(
            Command::new("config")
                .about("Persistent settings")
                .subcommand(json_flags(Command::new("show")))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                ),
        )
        .subcommand(json_flags(
            Command::new("dashboard").about("Summary of one user's finances"),
        ))
        .subcommand(Command::new("doctor").about("Consistency checks"))
        .subcommand(Command::new("outbox").about("Alerts waiting for delivery"))
}
