// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Command, arg, value_parser};

pub fn build_cli() -> Command {
    Command::new("billfold")
        .about("Personal bookkeeping: cards, transfers, investment lots, accrual, dashboards")
        .subcommand(Command::new("init").about("Initialize the database"))
        .subcommand(
            Command::new("card")
                .about("Manage cards")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(arg!(--kind <KIND> "debit or credit").required(true))
                        .arg(arg!(--currency <CCY>).required(false))
                        .arg(arg!(--"opening-balance" <AMOUNT>).required(false))
                        .arg(arg!(--limit <AMOUNT> "credit limit (credit cards)").required(false)),
                )
                .subcommand(
                    Command::new("list")
                        .arg(arg!(--json).num_args(0))
                        .arg(arg!(--jsonl).num_args(0)),
                )
                .subcommand(
                    Command::new("rm")
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(arg!(--force "delete transaction history along with the card").num_args(0)),
                )
                .subcommand(
                    Command::new("rename")
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(arg!(--"new-name" <NAME>).required(true)),
                )
                .subcommand(
                    Command::new("set-limit")
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(arg!(--limit <AMOUNT>).required(true)),
                ),
        )
        .subcommand(
            Command::new("section")
                .about("Manage card sections")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--card <NAME>).required(true))
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(arg!(--"initial-balance" <AMOUNT>).required(false)),
                )
                .subcommand(Command::new("list").arg(arg!(--card <NAME>).required(true)))
                .subcommand(
                    Command::new("rm")
                        .arg(arg!(--card <NAME>).required(true))
                        .arg(arg!(--name <NAME>).required(true)),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and list transactions")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--date <DATE>).required(true))
                        .arg(arg!(--amount <AMOUNT> "signed: positive inflow, negative outflow").required(true))
                        .arg(arg!(--description <TEXT>).required(true))
                        .arg(arg!(--card <NAME> "omit for cash").required(false))
                        .arg(arg!(--section <NAME>).required(false))
                        .arg(arg!(--category <NAME>).required(false)),
                )
                .subcommand(
                    Command::new("list")
                        .arg(arg!(--card <NAME>).required(false))
                        .arg(arg!(--cash "cash transactions only").num_args(0))
                        .arg(arg!(--category <NAME>).required(false))
                        .arg(arg!(--from <DATE>).required(false))
                        .arg(arg!(--to <DATE>).required(false))
                        .arg(arg!(--"no-transfers" "hide internal transfer legs").num_args(0))
                        .arg(
                            arg!(--page <N>)
                                .required(false)
                                .value_parser(value_parser!(u64)),
                        )
                        .arg(
                            arg!(--"per-page" <N>)
                                .required(false)
                                .value_parser(value_parser!(u64)),
                        )
                        .arg(arg!(--json).num_args(0))
                        .arg(arg!(--jsonl).num_args(0)),
                )
                .subcommand(
                    Command::new("rm")
                        .arg(arg!(--id <ID>).required(true).value_parser(value_parser!(i64))),
                ),
        )
        .subcommand(
            Command::new("transfer")
                .about("Move money between accounts as an atomic leg pair")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--from <ENDPOINT> "cash, card:NAME, stock:SYM, crypto:SYM").required(true))
                        .arg(arg!(--to <ENDPOINT>).required(true))
                        .arg(arg!(--amount <AMOUNT>).required(true))
                        .arg(arg!(--date <DATE>).required(true))
                        .arg(arg!(--description <TEXT>).required(false))
                        .arg(arg!(--category <NAME>).required(false)),
                )
                .subcommand(
                    Command::new("list")
                        .arg(arg!(--json).num_args(0))
                        .arg(arg!(--jsonl).num_args(0)),
                )
                .subcommand(
                    Command::new("rm")
                        .arg(arg!(--id <ID>).required(true).value_parser(value_parser!(i64))),
                ),
        )
        .subcommand(
            Command::new("position")
                .about("Manage investment positions")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--"asset-type" <TYPE> "stock or crypto").required(true))
                        .arg(arg!(--symbol <SYMBOL>).required(true)),
                )
                .subcommand(
                    Command::new("list")
                        .arg(arg!(--json).num_args(0))
                        .arg(arg!(--jsonl).num_args(0)),
                )
                .subcommand(
                    Command::new("rm")
                        .arg(arg!(--"asset-type" <TYPE>).required(true))
                        .arg(arg!(--symbol <SYMBOL>).required(true)),
                )
                .subcommand(
                    Command::new("summary")
                        .arg(arg!(--"asset-type" <TYPE>).required(true))
                        .arg(arg!(--symbol <SYMBOL>).required(true))
                        .arg(arg!(--price <PRICE> "market price for unrealized P&L").required(false))
                        .arg(arg!(--json).num_args(0)),
                ),
        )
        .subcommand(
            Command::new("movement")
                .about("Record buys and sells on a position")
                .subcommand(movement_leg("buy"))
                .subcommand(movement_leg("sell"))
                .subcommand(
                    Command::new("list")
                        .arg(arg!(--"asset-type" <TYPE>).required(true))
                        .arg(arg!(--symbol <SYMBOL>).required(true))
                        .arg(arg!(--json).num_args(0))
                        .arg(arg!(--jsonl).num_args(0)),
                )
                .subcommand(
                    Command::new("rm")
                        .arg(arg!(--id <ID>).required(true).value_parser(value_parser!(i64))),
                ),
        )
        .subcommand(
            Command::new("price")
                .about("Manual price book for positions")
                .subcommand(
                    Command::new("set")
                        .arg(arg!(--"asset-type" <TYPE>).required(true))
                        .arg(arg!(--symbol <SYMBOL>).required(true))
                        .arg(arg!(--price <PRICE>).required(true))
                        .arg(arg!(--"as-of" <DATETIME>).required(false))
                        .arg(arg!(--source <TEXT>).required(false)),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("accrual")
                .about("Interest and fee terms on cards")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--card <NAME>).required(true))
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(arg!(--rate <PCT>).required(true))
                        .arg(arg!(--fee "a fee rather than interest").num_args(0))
                        .arg(arg!(--payment <FREQ> "daily|weekly|monthly|quarterly|annually").required(false))
                        .arg(arg!(--compound <FREQ> "e.g. monthly_12, daily_365").required(false)),
                )
                .subcommand(Command::new("list").arg(arg!(--card <NAME>).required(true)))
                .subcommand(
                    Command::new("rm")
                        .arg(arg!(--id <ID>).required(true).value_parser(value_parser!(i64))),
                )
                .subcommand(
                    Command::new("toggle")
                        .arg(arg!(--id <ID>).required(true).value_parser(value_parser!(i64)))
                        .arg(arg!(--off "deactivate instead of activate").num_args(0)),
                )
                .subcommand(
                    Command::new("compute")
                        .arg(arg!(--id <ID>).required(true).value_parser(value_parser!(i64)))
                        .arg(arg!(--principal <AMOUNT>).required(true))
                        .arg(arg!(--days <N>).required(true).value_parser(value_parser!(i64))),
                )
                .subcommand(
                    Command::new("projection")
                        .arg(arg!(--card <NAME>).required(true))
                        .arg(arg!(--principal <AMOUNT>).required(true))
                        .arg(arg!(--months <N>).required(false).value_parser(value_parser!(u32)))
                        .arg(arg!(--json).num_args(0)),
                ),
        )
        .subcommand(
            Command::new("dashboard")
                .about("Dashboard reports over a calendar period")
                .subcommand(
                    Command::new("summary")
                        .arg(arg!(--period <PERIOD> "week|month|quarter|year").required(false))
                        .arg(arg!(--date <DATE> "reference day, default today").required(false))
                        .arg(arg!(--json).num_args(0)),
                )
                .subcommand(
                    Command::new("chart")
                        .arg(arg!(--kind <KIND> "balance-trend|income|expense").required(true))
                        .arg(arg!(--period <PERIOD>).required(false))
                        .arg(arg!(--date <DATE>).required(false))
                        .arg(arg!(--json).num_args(0)),
                )
                .subcommand(
                    Command::new("categories")
                        .arg(arg!(--period <PERIOD>).required(false))
                        .arg(arg!(--date <DATE>).required(false))
                        .arg(arg!(--json).num_args(0)),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export data to CSV or JSON")
                .subcommand(
                    Command::new("transactions")
                        .arg(arg!(--format <FMT> "csv or json").required(true))
                        .arg(arg!(--out <PATH>).required(true)),
                )
                .subcommand(
                    Command::new("movements")
                        .arg(arg!(--format <FMT> "csv or json").required(true))
                        .arg(arg!(--out <PATH>).required(true)),
                ),
        )
        .subcommand(
            Command::new("settings")
                .about("Tool settings")
                .subcommand(
                    Command::new("set-currency").arg(arg!(--currency <CCY>).required(true)),
                )
                .subcommand(Command::new("show")),
        )
        .subcommand(Command::new("doctor").about("Audit stored invariants"))
}

fn movement_leg(name: &'static str) -> Command {
    Command::new(name)
        .arg(arg!(--"asset-type" <TYPE> "stock or crypto").required(true))
        .arg(arg!(--symbol <SYMBOL>).required(true))
        .arg(arg!(--quantity <QTY>).required(true))
        .arg(arg!(--price <PRICE> "price per unit").required(true))
        .arg(arg!(--datetime <DATETIME> "economic event time").required(true))
        .arg(arg!(--total <AMOUNT> "checked against quantity x price").required(false))
        .arg(arg!(--description <TEXT>).required(false))
}
