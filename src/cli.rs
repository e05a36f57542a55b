// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, arg, crate_version, value_parser};

fn user_arg() -> Arg {
    arg!(--user <USER> "Acting user id").required(true)
}

fn json_flags(cmd: Command) -> Command {
    cmd.arg(arg!(--json "Print JSON").action(ArgAction::SetTrue))
        .arg(arg!(--jsonl "Print JSON lines").action(ArgAction::SetTrue))
}

pub fn build_cli() -> Command {
    Command::new("fiscus")
        .version(crate_version!())
        .about("Personal finance engine: recurring schedules, investments, objectives")
        .subcommand(Command::new("init").about("Initialize the database"))
        .subcommand(category_cmd())
        .subcommand(tx_cmd())
        .subcommand(recurring_cmd())
        .subcommand(investment_cmd())
        .subcommand(objective_cmd())
        .subcommand(report_cmd())
        .subcommand(price_cmd())
        .subcommand(export_cmd())
        .subcommand(Command::new("doctor").about("Run integrity checks").arg(
            arg!(--date <DATE> "Reference date (defaults to today)"),
        ))
}

fn category_cmd() -> Command {
    Command::new("category")
        .about("Manage categories")
        .subcommand(
            Command::new("add")
                .about("Add a personal category")
                .arg(user_arg())
                .arg(arg!(--name <NAME> "Category name").required(true))
                .arg(arg!(--kind <KIND> "income|expense").required(true))
                .arg(arg!(--color <COLOR> "Hex color"))
                .arg(arg!(--icon <ICON> "Icon name")),
        )
        .subcommand(
            Command::new("list")
                .about("List categories visible to the user")
                .arg(user_arg())
                .arg(arg!(--kind <KIND> "income|expense")),
        )
        .subcommand(
            Command::new("rm")
                .about("Remove a personal category")
                .arg(user_arg())
                .arg(arg!(--name <NAME> "Category name").required(true))
                .arg(arg!(--kind <KIND> "income|expense").required(true)),
        )
}

fn tx_cmd() -> Command {
    Command::new("tx")
        .about("Ledger transactions")
        .subcommand(
            Command::new("add")
                .about("Record a transaction")
                .arg(user_arg())
                .arg(arg!(--date <DATE> "YYYY-MM-DD").required(true))
                .arg(arg!(--amount <AMOUNT> "Positive amount").required(true))
                .arg(arg!(--description <TEXT> "Description").required(true))
                .arg(arg!(--kind <KIND> "income|expense").required(true))
                .arg(arg!(--category <NAME> "Category name"))
                .arg(arg!(--method <METHOD> "Payment method")),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("List transactions")
                .arg(user_arg())
                .arg(arg!(--month <MONTH> "YYYY-MM"))
                .arg(arg!(--kind <KIND> "income|expense"))
                .arg(arg!(--limit <N> "Max rows").value_parser(value_parser!(usize))),
        ))
}

fn recurring_cmd() -> Command {
    Command::new("recurring")
        .about("Recurring schedules")
        .subcommand(
            Command::new("add")
                .about("Add a recurring schedule")
                .arg(user_arg())
                .arg(arg!(--description <TEXT> "Description").required(true))
                .arg(arg!(--amount <AMOUNT> "Positive amount").required(true))
                .arg(arg!(--kind <KIND> "income|expense").required(true))
                .arg(arg!(--frequency <FREQ> "daily|weekly|monthly|annual").required(true))
                .arg(arg!(--start <DATE> "Start date YYYY-MM-DD").required(true))
                .arg(arg!(--"day-of-month" <DAY> "Pin monthly/annual firing to a day 1-31"))
                .arg(arg!(--end <DATE> "End date YYYY-MM-DD"))
                .arg(arg!(--category <NAME> "Category name")),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("List schedules")
                .arg(user_arg()),
        ))
        .subcommand(
            Command::new("run")
                .about("Fire every schedule due on the given date")
                .arg(arg!(--date <DATE> "Fire as of this date (defaults to today)"))
                .arg(arg!(--user <USER> "Only this user's schedules")),
        )
        .subcommand(
            Command::new("pause")
                .about("Deactivate a schedule without deleting its history")
                .arg(user_arg())
                .arg(arg!(--id <ID> "Schedule id").required(true).value_parser(value_parser!(i64))),
        )
        .subcommand(
            Command::new("resume")
                .about("Reactivate a schedule")
                .arg(user_arg())
                .arg(arg!(--id <ID> "Schedule id").required(true).value_parser(value_parser!(i64))),
        )
}

fn investment_cmd() -> Command {
    Command::new("investment")
        .about("Investments and movements")
        .subcommand(
            Command::new("add")
                .about("Register an investment")
                .arg(user_arg())
                .arg(arg!(--symbol <SYMBOL> "Ticker symbol").required(true))
                .arg(arg!(--name <NAME> "Display name").required(true)),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("List investments")
                .arg(user_arg()),
        ))
        .subcommand(
            Command::new("movement")
                .about("Record a movement and post its ledger counterpart")
                .arg(user_arg())
                .arg(arg!(--symbol <SYMBOL> "Investment symbol").required(true))
                .arg(arg!(--kind <KIND> "purchase|sale|dividend|yield|adjustment").required(true))
                .arg(arg!(--date <DATE> "YYYY-MM-DD").required(true))
                .arg(
                    arg!(--quantity <QTY> "Quantity moved (signed for adjustments)")
                        .required(true)
                        .allow_negative_numbers(true),
                )
                .arg(arg!(--price <PRICE> "Unit price").required(true))
                .arg(arg!(--fees <FEES> "Fees (default 0)"))
                .arg(arg!(--amount <AMOUNT> "Total amount (default quantity × price)")),
        )
        .subcommand(
            Command::new("repost")
                .about("Retry ledger posting for a movement")
                .arg(user_arg())
                .arg(
                    arg!(--movement <ID> "Movement id")
                        .required(true)
                        .value_parser(value_parser!(i64)),
                ),
        )
        .subcommand(json_flags(
            Command::new("value")
                .about("Valuation report at latest known prices")
                .arg(user_arg()),
        ))
}

fn objective_cmd() -> Command {
    Command::new("objective")
        .about("Savings and budget objectives")
        .subcommand(
            Command::new("set")
                .about("Create or update an objective")
                .arg(user_arg())
                .arg(arg!(--name <NAME> "Objective name").required(true))
                .arg(arg!(--kind <KIND> "category-limit|monthly-savings|investment-goal").required(true))
                .arg(arg!(--target <AMOUNT> "Target amount").required(true))
                .arg(arg!(--period <MONTH> "Period YYYY-MM").required(true))
                .arg(arg!(--category <NAME> "Category (category-limit only)")),
        )
        .subcommand(
            Command::new("progress")
                .about("Add to an objective's current amount")
                .arg(user_arg())
                .arg(arg!(--name <NAME> "Objective name").required(true))
                .arg(arg!(--period <MONTH> "Period YYYY-MM").required(true))
                .arg(
                    arg!(--amount <AMOUNT> "Amount to add (negative to correct)")
                        .required(true)
                        .allow_negative_numbers(true),
                ),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("List objectives")
                .arg(user_arg()),
        ))
        .subcommand(json_flags(
            Command::new("status")
                .about("Progress and alert level per objective")
                .arg(user_arg())
                .arg(arg!(--period <MONTH> "Period YYYY-MM").required(true)),
        ))
}

fn report_cmd() -> Command {
    Command::new("report").about("Ledger reports").subcommand(json_flags(
        Command::new("spend-by-category")
            .about("Spending per category for a month")
            .arg(user_arg())
            .arg(arg!(--month <MONTH> "YYYY-MM").required(true)),
    ))
}

fn price_cmd() -> Command {
    Command::new("price")
        .about("Investment prices")
        .subcommand(
            Command::new("set")
                .about("Record a price manually")
                .arg(user_arg())
                .arg(arg!(--symbol <SYMBOL> "Investment symbol").required(true))
                .arg(arg!(--price <PRICE> "Unit price").required(true))
                .arg(arg!(--date <DATE> "As-of date (defaults to now)")),
        )
        .subcommand(Command::new("fetch").about("Fetch live prices for all investments"))
        .subcommand(Command::new("list").about("List recent prices"))
}

fn export_cmd() -> Command {
    Command::new("export").about("Export data").subcommand(
        Command::new("transactions")
            .about("Export a user's transactions")
            .arg(user_arg())
            .arg(arg!(--format <FORMAT> "csv|json").required(true))
            .arg(arg!(--out <FILE> "Output path").required(true)),
    )
}
