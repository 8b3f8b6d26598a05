// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::settings::currency_symbol;
use crate::balance::totals;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let t = totals(conn)?;
    if !maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &t)? {
        let sym = currency_symbol(conn)?;
        let rows = vec![
            vec!["Income".into(), fmt_money(&t.income, &sym)],
            vec!["Expense".into(), fmt_money(&t.expense, &sym)],
            vec!["Goal contributions".into(), fmt_money(&t.contributions, &sym)],
            vec!["Available".into(), fmt_money(&t.available, &sym)],
        ];
        println!("{}", pretty_table(&["", "Amount"], rows));
    }
    Ok(())
}
