// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_LOG_LEVEL};
use clap::{arg, crate_version, value_parser, Arg, ArgAction, Command};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(arg!(--json "Print as pretty JSON").action(ArgAction::SetTrue))
        .arg(arg!(--jsonl "Print as JSON lines").action(ArgAction::SetTrue))
}

fn id_arg() -> Arg {
    arg!(--id <ID> "Record id")
        .required(true)
        .value_parser(value_parser!(i64))
}

fn type_arg() -> Arg {
    Arg::new("type")
        .long("type")
        .value_name("TYPE")
        .help("checking|savings|cash")
}

fn account_cmd() -> Command {
    Command::new("account")
        .about("Manage accounts")
        .subcommand(
            Command::new("add")
                .about("Add an account; the first one becomes the default")
                .arg(arg!(--name <NAME>).required(true))
                .arg(type_arg().default_value("checking")),
        )
        .subcommand(
            Command::new("edit")
                .arg(id_arg())
                .arg(arg!(--name <NAME>))
                .arg(type_arg()),
        )
        .subcommand(Command::new("set-default").arg(id_arg()))
        .subcommand(json_flags(Command::new("list")))
        .subcommand(Command::new("balance").about("Balance of one account").arg(id_arg()))
        .subcommand(Command::new("rm").arg(id_arg()))
}

fn category_cmd() -> Command {
    Command::new("category")
        .about("Manage categories")
        .subcommand(
            Command::new("add")
                .arg(arg!(--name <NAME>).required(true))
                .arg(arg!(--kind <KIND> "income|expense").required(true))
                .arg(arg!(--icon <ICON>)),
        )
        .subcommand(
            Command::new("edit")
                .arg(id_arg())
                .arg(arg!(--name <NAME>))
                .arg(arg!(--kind <KIND> "income|expense"))
                .arg(arg!(--icon <ICON>)),
        )
        .subcommand(json_flags(Command::new("list")))
        .subcommand(Command::new("rm").arg(id_arg()))
}

fn tx_cmd() -> Command {
    Command::new("tx")
        .about("Record and edit transactions")
        .subcommand(
            Command::new("add")
                .arg(arg!(--amount <AMOUNT> "Positive amount").required(true))
                .arg(arg!(--kind <KIND> "income|expense").required(true))
                .arg(arg!(--category <CATEGORY> "Category id or name").required(true))
                .arg(arg!(--account <ACCOUNT> "Account id or name"))
                .arg(arg!(--date <DATE> "YYYY-MM-DD, defaults to today"))
                .arg(arg!(--description <TEXT>)),
        )
        .subcommand(
            Command::new("edit")
                .arg(id_arg())
                .arg(arg!(--amount <AMOUNT>))
                .arg(arg!(--kind <KIND> "income|expense"))
                .arg(arg!(--category <CATEGORY> "Category id or name"))
                .arg(arg!(--account <ACCOUNT> "Account id or name"))
                .arg(
                    arg!(--"no-account" "Detach from its account")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("account"),
                )
                .arg(arg!(--date <DATE> "YYYY-MM-DD"))
                .arg(arg!(--description <TEXT>)),
        )
        .subcommand(Command::new("rm").arg(id_arg()))
        .subcommand(json_flags(
            Command::new("list")
                .arg(arg!(--kind <KIND> "income|expense"))
                .arg(arg!(--category <CATEGORY> "Category id or name"))
                .arg(arg!(--from <DATE> "Inclusive start date"))
                .arg(arg!(--to <DATE> "Inclusive end date"))
                .arg(
                    arg!(--limit <N>)
                        .value_parser(value_parser!(usize))
                        .default_value("100"),
                )
                .arg(
                    arg!(--offset <N>)
                        .value_parser(value_parser!(usize))
                        .default_value("0"),
                ),
        ))
}

fn transfer_cmd() -> Command {
    Command::new("transfer")
        .about("Move money between accounts")
        .subcommand(
            Command::new("add")
                .arg(arg!(--from <ACCOUNT> "Source account id or name").required(true))
                .arg(arg!(--to <ACCOUNT> "Destination account id or name").required(true))
                .arg(arg!(--amount <AMOUNT>).required(true))
                .arg(arg!(--date <DATE> "YYYY-MM-DD, defaults to today"))
                .arg(arg!(--note <NOTE>)),
        )
        .subcommand(json_flags(Command::new("list")))
}

fn goal_cmd() -> Command {
    Command::new("goal")
        .about("Savings goals")
        .subcommand(
            Command::new("add")
                .arg(arg!(--name <NAME>).required(true))
                .arg(arg!(--target <AMOUNT>).required(true))
                .arg(arg!(--deadline <DATE> "YYYY-MM-DD")),
        )
        .subcommand(
            Command::new("edit")
                .arg(id_arg())
                .arg(arg!(--name <NAME>))
                .arg(arg!(--target <AMOUNT>))
                .arg(arg!(--deadline <DATE> "YYYY-MM-DD")),
        )
        .subcommand(json_flags(Command::new("list")))
        .subcommand(
            Command::new("contribute")
                .arg(id_arg())
                .arg(arg!(--amount <AMOUNT>).required(true))
                .arg(arg!(--note <NOTE>))
                .arg(arg!(--date <DATE> "YYYY-MM-DD, defaults to today")),
        )
        .subcommand(json_flags(Command::new("history").arg(id_arg())))
        .subcommand(Command::new("rm").about("Delete a goal and its contributions").arg(id_arg()))
}

fn budget_cmd() -> Command {
    Command::new("budget")
        .about("Monthly category budgets")
        .subcommand(
            Command::new("add")
                .arg(arg!(--category <CATEGORY> "Category id or name").required(true))
                .arg(arg!(--amount <AMOUNT>).required(true))
                .arg(arg!(--month <MONTH> "1-12").required(true).value_parser(value_parser!(u32)))
                .arg(arg!(--year <YEAR>).required(true).value_parser(value_parser!(i32))),
        )
        .subcommand(
            Command::new("edit")
                .arg(id_arg())
                .arg(arg!(--amount <AMOUNT>))
                .arg(arg!(--month <MONTH> "1-12").value_parser(value_parser!(u32)))
                .arg(arg!(--year <YEAR>).value_parser(value_parser!(i32))),
        )
        .subcommand(json_flags(
            Command::new("list")
                .arg(arg!(--month <MONTH> "1-12, defaults to the current month").value_parser(value_parser!(u32)))
                .arg(arg!(--year <YEAR> "defaults to the current year").value_parser(value_parser!(i32))),
        ))
        .subcommand(Command::new("rm").arg(id_arg()))
}

fn recurring_cmd() -> Command {
    Command::new("recurring")
        .about("Recurring transaction templates")
        .subcommand(
            Command::new("add")
                .arg(arg!(--amount <AMOUNT>).required(true))
                .arg(arg!(--kind <KIND> "income|expense").required(true))
                .arg(arg!(--category <CATEGORY> "Category id or name").required(true))
                .arg(arg!(--interval <INTERVAL> "daily|weekly|monthly|yearly").required(true))
                .arg(arg!(--"next-date" <DATE> "First firing date, YYYY-MM-DD").required(true))
                .arg(arg!(--description <TEXT>)),
        )
        .subcommand(
            Command::new("edit")
                .arg(id_arg())
                .arg(arg!(--amount <AMOUNT>))
                .arg(arg!(--kind <KIND> "income|expense"))
                .arg(arg!(--category <CATEGORY> "Category id or name"))
                .arg(arg!(--interval <INTERVAL> "daily|weekly|monthly|yearly"))
                .arg(arg!(--"next-date" <DATE> "YYYY-MM-DD"))
                .arg(arg!(--description <TEXT>))
                .arg(arg!(--active <BOOL> "true|false").value_parser(value_parser!(bool))),
        )
        .subcommand(json_flags(Command::new("list")))
        .subcommand(Command::new("rm").arg(id_arg()))
        .subcommand(json_flags(
            Command::new("run")
                .about("Materialize due recurring transactions")
                .arg(arg!(--"as-of" <DATE> "YYYY-MM-DD, defaults to today")),
        ))
}

fn alloc_cmd() -> Command {
    Command::new("alloc")
        .about("Income allocation rules")
        .subcommand(
            Command::new("add")
                .arg(arg!(--name <NAME>).required(true))
                .arg(arg!(--percentage <PCT> "0-100").required(true).value_parser(value_parser!(i64)))
                .arg(arg!(--"target-type" <TYPE> "goal|category").required(true))
                .arg(arg!(--"target-id" <ID>).required(true).value_parser(value_parser!(i64)))
                .arg(arg!(--"sort-order" <N>).value_parser(value_parser!(i64)).default_value("0")),
        )
        .subcommand(
            Command::new("edit")
                .arg(id_arg())
                .arg(arg!(--name <NAME>))
                .arg(arg!(--percentage <PCT> "0-100").value_parser(value_parser!(i64)))
                .arg(arg!(--"target-type" <TYPE> "goal|category"))
                .arg(arg!(--"target-id" <ID>).value_parser(value_parser!(i64)))
                .arg(arg!(--"sort-order" <N>).value_parser(value_parser!(i64)))
                .arg(arg!(--active <BOOL> "true|false").value_parser(value_parser!(bool))),
        )
        .subcommand(json_flags(Command::new("list")))
        .subcommand(Command::new("rm").arg(id_arg()))
        .subcommand(json_flags(
            Command::new("plan")
                .about("Split an amount across the active rules")
                .arg(arg!(--amount <AMOUNT>).required(true)),
        ))
}

fn settings_cmd() -> Command {
    Command::new("settings")
        .about("Key/value preferences")
        .subcommand(Command::new("get").arg(arg!(--key <KEY>).required(true)))
        .subcommand(
            Command::new("set")
                .arg(arg!(--key <KEY>).required(true))
                .arg(arg!(--value <VALUE>).required(true)),
        )
        .subcommand(json_flags(Command::new("list")))
}

pub fn build_cli() -> Command {
    Command::new("fintrack")
        .version(crate_version!())
        .about("Personal ledger: transactions, goals, transfers, budgets, recurring entries")
        .arg(
            arg!(--db <PATH> "SQLite ledger file")
                .env("FINTRACK_DB")
                .global(true),
        )
        .arg(
            Arg::new("log_level")
                .long("log-level")
                .value_name("LEVEL")
                .help("trace|debug|info|warn|error")
                .env("FINTRACK_LOG")
                .default_value(DEFAULT_LOG_LEVEL)
                .global(true),
        )
        .arg(
            Arg::new("busy_timeout_ms")
                .long("busy-timeout-ms")
                .value_name("MS")
                .help("How long to wait for the ledger lock")
                .env("FINTRACK_BUSY_TIMEOUT_MS")
                .value_parser(value_parser!(u64))
                .default_value("5000")
                .global(true),
        )
        .subcommand(Command::new("init").about("Create the ledger database"))
        .subcommand(account_cmd())
        .subcommand(category_cmd())
        .subcommand(tx_cmd())
        .subcommand(transfer_cmd())
        .subcommand(goal_cmd())
        .subcommand(budget_cmd())
        .subcommand(recurring_cmd())
        .subcommand(alloc_cmd())
        .subcommand(settings_cmd())
        .subcommand(json_flags(
            Command::new("balance").about("Income, expense, contributions and available balance"),
        ))
        .subcommand(Command::new("doctor").about("Check ledger consistency"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        build_cli().debug_assert();
    }

    #[test]
    fn global_db_flag_after_subcommand() {
        let m = build_cli().get_matches_from(["fintrack", "balance", "--db", "/tmp/l.sqlite"]);
        assert_eq!(m.get_one::<String>("db").map(String::as_str), Some("/tmp/l.sqlite"));
        assert_eq!(m.get_one::<u64>("busy_timeout_ms"), Some(&DEFAULT_BUSY_TIMEOUT_MS));
    }
}
