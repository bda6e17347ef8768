// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn id_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .required(true)
        .value_parser(value_parser!(i64))
        .help(help)
}

fn day_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_parser(value_parser!(u32).range(1..=31))
        .help(help)
}

fn text_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help)
}

fn card_cmd() -> Command {
    Command::new("card")
        .about("Manage credit cards")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Register a card")
                .arg(text_arg("bank", "Issuing bank").required(true))
                .arg(text_arg("limit", "Credit limit").required(true))
                .arg(day_arg("closing-day", "Statement closing day of month").required(true))
                .arg(day_arg("due-day", "Payment due day of month").required(true))
                .arg(
                    Arg::new("no-notify")
                        .long("no-notify")
                        .action(ArgAction::SetTrue)
                        .help("Leave this card out of scans run with --notifying-only"),
                ),
        )
        .subcommand(json_flags(Command::new("list").about("List cards")))
        .subcommand(
            Command::new("edit")
                .about("Change a card")
                .arg(id_arg("id", "Card id"))
                .arg(text_arg("bank", "Issuing bank"))
                .arg(text_arg("limit", "Credit limit"))
                .arg(day_arg("closing-day", "Statement closing day of month"))
                .arg(day_arg("due-day", "Payment due day of month"))
                .arg(text_arg("notify", "Raise alerts for this card (on|off)")),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete a card and all its installment purchases")
                .arg(id_arg("id", "Card id")),
        )
}

fn msi_cmd() -> Command {
    Command::new("msi")
        .about("Manage fixed-installment purchases")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Record an installment purchase")
                .arg(id_arg("card", "Card id"))
                .arg(text_arg("desc", "Description").required(true))
                .arg(text_arg("total", "Original total amount").required(true))
                .arg(
                    Arg::new("installments")
                        .long("installments")
                        .required(true)
                        .value_parser(value_parser!(u32))
                        .help("Number of monthly installments"),
                )
                .arg(text_arg("debtor", "Who owes this purchase (defaults to you)"))
                .arg(text_arg("date", "Purchase date YYYY-MM-DD (defaults to today)")),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("List a card's installment purchases")
                .arg(id_arg("card", "Card id")),
        ))
        .subcommand(
            Command::new("edit")
                .about("Change an installment purchase")
                .arg(id_arg("id", "Purchase id"))
                .arg(
                    Arg::new("card")
                        .long("card")
                        .value_parser(value_parser!(i64))
                        .help("Move to another card"),
                )
                .arg(text_arg("desc", "Description"))
                .arg(text_arg("total", "Original total amount"))
                .arg(
                    Arg::new("installments")
                        .long("installments")
                        .value_parser(value_parser!(u32))
                        .help("Number of monthly installments"),
                )
                .arg(
                    Arg::new("paid")
                        .long("paid")
                        .value_parser(value_parser!(u32))
                        .help("Installments paid so far"),
                )
                .arg(text_arg("debtor", "Who owes this purchase (blank for you)")),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete an installment purchase")
                .arg(id_arg("id", "Purchase id")),
        )
        .subcommand(json_flags(
            Command::new("summary")
                .about("Monthly obligation of a card, split by debtor")
                .arg(id_arg("card", "Card id"))
                .arg(
                    Arg::new("include-completed")
                        .long("include-completed")
                        .action(ArgAction::SetTrue)
                        .help("Keep counting purchases that are already paid off"),
                ),
        ))
        .subcommand(
            Command::new("pay")
                .about("Pay this month's installment on every open purchase of a card")
                .arg(id_arg("card", "Card id"))
                .arg(
                    Arg::new("record-expense")
                        .long("record-expense")
                        .action(ArgAction::SetTrue)
                        .help("Also record the payment as a daily expense"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Show the amount without paying"),
                ),
        )
}

fn expense_cmd() -> Command {
    Command::new("expense")
        .about("Track daily expenses")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Record an expense")
                .arg(text_arg("amount", "Amount").required(true))
                .arg(text_arg("desc", "Description (defaults to the category)"))
                .arg(text_arg("category", "Category").default_value("General"))
                .arg(text_arg("date", "Date YYYY-MM-DD (defaults to today)")),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("List expenses, most recent first")
                .arg(text_arg("month", "Only this month (YYYY-MM)")),
        ))
        .subcommand(
            Command::new("edit")
                .about("Change an expense")
                .arg(id_arg("id", "Expense id"))
                .arg(text_arg("amount", "Amount"))
                .arg(text_arg("desc", "Description"))
                .arg(text_arg("category", "Category"))
                .arg(text_arg("date", "Date YYYY-MM-DD")),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete an expense")
                .arg(id_arg("id", "Expense id")),
        )
        .subcommand(json_flags(
            Command::new("total")
                .about("Total spent in a month")
                .arg(text_arg("month", "Month (YYYY-MM)").required(true)),
        ))
}

fn income_cmd() -> Command {
    let frequency = || {
        Arg::new("frequency")
            .long("frequency")
            .value_parser(["weekly", "biweekly", "monthly"])
            .help("How often this income arrives")
    };
    Command::new("income")
        .about("Track income")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Register an income entry")
                .arg(text_arg("amount", "Amount").required(true))
                .arg(text_arg("source", "Where it comes from").required(true))
                .arg(frequency().required(true))
                .arg(text_arg("date", "Registration date YYYY-MM-DD (defaults to today)")),
        )
        .subcommand(json_flags(Command::new("list").about("List income entries")))
        .subcommand(
            Command::new("edit")
                .about("Change an income entry")
                .arg(id_arg("id", "Income id"))
                .arg(text_arg("amount", "Amount"))
                .arg(text_arg("source", "Where it comes from"))
                .arg(frequency()),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete an income entry")
                .arg(id_arg("id", "Income id")),
        )
}

pub fn build_cli() -> Command {
    Command::new("cardclip")
        .version(clap::crate_version!())
        .about("Credit cards, installment plans, daily expenses and income in one local ledger")
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .env("CARDCLIP_DB")
                .value_parser(value_parser!(std::path::PathBuf))
                .help("SQLite file to use instead of the platform data dir"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("warn")
                .value_parser(["none", "error", "warn", "info", "debug", "trace"])
                .help("Logging verbosity; RUST_LOG overrides it"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(card_cmd())
        .subcommand(msi_cmd())
        .subcommand(expense_cmd())
        .subcommand(income_cmd())
        .subcommand(
            Command::new("dashboard")
                .about("Balance and spending for a month")
                .arg(text_arg("month", "Month (YYYY-MM), defaults to the current one"))
                .arg(
                    Arg::new("shift")
                        .long("shift")
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(i32))
                        .help("Move the month by N (negative goes back)"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print JSON"),
                ),
        )
        .subcommand(
            Command::new("scan")
                .about("Check cards and purchases for alerts")
                .arg(text_arg("today", "Pretend today is YYYY-MM-DD"))
                .arg(
                    Arg::new("force")
                        .long("force")
                        .action(ArgAction::SetTrue)
                        .help("Scan even if one ran within the last 24 hours"),
                )
                .arg(
                    Arg::new("daemon")
                        .long("daemon")
                        .action(ArgAction::SetTrue)
                        .conflicts_with_all(["today", "force"])
                        .help("Keep running and scan whenever due"),
                )
                .arg(
                    Arg::new("notifying-only")
                        .long("notifying-only")
                        .action(ArgAction::SetTrue)
                        .help("Skip cards added with --no-notify"),
                )
                .arg(
                    Arg::new("poll-minutes")
                        .long("poll-minutes")
                        .default_value("60")
                        .value_parser(value_parser!(u64).range(1..))
                        .help("How often the daemon checks whether a scan is due"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Read or change settings")
                .subcommand_required(true)
                .subcommand(
                    Command::new("get")
                        .about("Show settings")
                        .arg(text_arg("key", "Only this key")),
                )
                .subcommand(
                    Command::new("set")
                        .about("Change a setting")
                        .arg(text_arg("key", "Setting name").required(true))
                        .arg(text_arg("value", "New value").required(true)),
                ),
        )
        .subcommand(Command::new("doctor").about("Report rows that break ledger invariants"))
}
