// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use chrono::NaiveDate;
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use thiserror::Error;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use wallet_ledger_rs::{
    AccountId, DebtContact, LedgerEngine, LedgerError, MemoryStore, NewTransaction,
    TransactionId, TransactionKind, UserId,
};

/// Ledger replay - Process transaction CSV files
///
/// Reads transactions from a CSV file, replays them through the ledger
/// engine, and outputs final account balances to stdout. Accounts are
/// provisioned on first reference with a zero balance.
#[derive(Parser, Debug)]
#[command(name = "wallet-ledger-rs")]
#[command(about = "Replays a transaction CSV through the ledger engine", long_about = None)]
struct Args {
    /// Path to CSV file with transactions
    ///
    /// Expected columns: kind,user,account,from_account,to_account,amount,
    /// date,description,contact_name,contact_phone,ref,debt
    /// Example: cargo run -- transactions.csv > balances.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Abort on the first malformed or rejected row instead of skipping it
    #[arg(long)]
    strict: bool,
}

fn main() {
    // Log to stderr so stdout stays clean for the balances CSV.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let engine = match replay_transactions(BufReader::new(file), args.strict) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error replaying transactions: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_balances(&engine, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Replay failures that abort processing.
///
/// In lenient mode (the default) only CSV reader failures abort; malformed
/// and engine-rejected rows are logged and skipped. `--strict` promotes both
/// to hard errors.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("row {row}: {source}")]
    Rejected {
        row: u64,
        #[source]
        source: LedgerError,
    },

    #[error("row {row}: {reason}")]
    Malformed { row: u64, reason: String },
}

/// Raw CSV record matching the input format.
///
/// `account` names the single account of income/expense/debt rows; transfers
/// use `from_account`/`to_account` instead. `ref` labels a debt row so a
/// later `debt` column can reference it.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    kind: String,
    user: u64,
    #[serde(default)]
    account: Option<String>,
    #[serde(default)]
    from_account: Option<String>,
    #[serde(default)]
    to_account: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    amount: Option<Decimal>,
    date: NaiveDate,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    contact_name: Option<String>,
    #[serde(default)]
    contact_phone: Option<String>,
    #[serde(default, rename = "ref")]
    reference: Option<String>,
    #[serde(default)]
    debt: Option<String>,
}

/// Account and debt labels resolved so far, per user.
#[derive(Default)]
struct ReplayIndex {
    accounts: HashMap<(u64, String), AccountId>,
    debts: HashMap<(u64, String), TransactionId>,
}

impl ReplayIndex {
    /// Get-or-create an account by display name.
    fn account_id(
        &mut self,
        engine: &LedgerEngine<MemoryStore>,
        user: UserId,
        name: &str,
    ) -> AccountId {
        if let Some(id) = self.accounts.get(&(user.0, name.to_string())) {
            return *id;
        }
        let account = engine.store().add_account(user, name, Decimal::ZERO, None);
        self.accounts.insert((user.0, name.to_string()), account.id);
        account.id
    }

    fn debt_id(&self, user: UserId, label: &str) -> Option<TransactionId> {
        self.debts.get(&(user.0, label.to_string())).copied()
    }
}

/// Builds the engine request for one CSV row.
///
/// Returns a human-readable reason when the row is structurally unusable
/// (unknown kind, missing columns, unknown debt label). Amount sign and
/// ownership problems are left for the engine to reject.
fn build_request(
    engine: &LedgerEngine<MemoryStore>,
    index: &mut ReplayIndex,
    record: &CsvRecord,
) -> Result<NewTransaction, String> {
    let user = UserId(record.user);
    let amount = record.amount.ok_or("missing amount")?;

    let single_account = |index: &mut ReplayIndex| {
        record
            .account
            .as_deref()
            .filter(|name| !name.is_empty())
            .map(|name| index.account_id(engine, user, name))
            .ok_or_else(|| "missing account".to_string())
    };

    let kind = match record.kind.to_lowercase().as_str() {
        "income" => TransactionKind::Income {
            account_id: single_account(index)?,
        },
        "expense" => TransactionKind::Expense {
            account_id: single_account(index)?,
        },
        "transfer" => {
            let from = record
                .from_account
                .as_deref()
                .filter(|name| !name.is_empty())
                .ok_or("missing from_account")?;
            let to = record
                .to_account
                .as_deref()
                .filter(|name| !name.is_empty())
                .ok_or("missing to_account")?;
            TransactionKind::Transfer {
                from_account_id: index.account_id(engine, user, from),
                to_account_id: index.account_id(engine, user, to),
            }
        }
        "debt-give" | "debt-take" => {
            let account_id = single_account(index)?;
            let contact = DebtContact {
                name: record
                    .contact_name
                    .clone()
                    .filter(|name| !name.is_empty())
                    .ok_or("missing contact_name")?,
                phone: record.contact_phone.clone().filter(|p| !p.is_empty()),
            };
            if record.kind.eq_ignore_ascii_case("debt-give") {
                TransactionKind::DebtGive {
                    account_id,
                    contact,
                }
            } else {
                TransactionKind::DebtTake {
                    account_id,
                    contact,
                }
            }
        }
        "debt-repay" => {
            let label = record
                .debt
                .as_deref()
                .filter(|label| !label.is_empty())
                .ok_or("missing debt reference")?;
            let debt_id = index
                .debt_id(user, label)
                .ok_or_else(|| format!("unknown debt reference '{label}'"))?;
            TransactionKind::DebtRepay {
                account_id: single_account(index)?,
                debt_id,
            }
        }
        other => return Err(format!("unknown kind '{other}'")),
    };

    Ok(NewTransaction {
        kind,
        amount,
        date: record.date,
        description: record.description.clone().filter(|d| !d.is_empty()),
        category_id: None,
        profile_id: None,
    })
}

/// Replays transactions from a CSV reader through a fresh engine.
///
/// Streaming parse: arbitrarily large files are handled without loading
/// everything into memory. In lenient mode malformed rows and rows the
/// engine rejects are logged and skipped; rows after a skipped debt row that
/// reference its label are skipped in turn.
///
/// # Errors
///
/// Returns a CSV error if the reader itself fails, and row-level errors
/// when `strict` is set.
pub fn replay_transactions<R: Read>(
    reader: R,
    strict: bool,
) -> Result<LedgerEngine<MemoryStore>, ReplayError> {
    let engine = LedgerEngine::new(MemoryStore::new());
    let mut index = ReplayIndex::default();

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for (position, result) in rdr.deserialize::<CsvRecord>().enumerate() {
        // Header occupies line 1.
        let row = position as u64 + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) if strict => return Err(e.into()),
            Err(e) => {
                warn!(row, error = %e, "malformed row skipped");
                continue;
            }
        };

        let request = match build_request(&engine, &mut index, &record) {
            Ok(request) => request,
            Err(reason) if strict => return Err(ReplayError::Malformed { row, reason }),
            Err(reason) => {
                warn!(row, reason, "row skipped");
                continue;
            }
        };

        let user = UserId(record.user);
        match engine.create_transaction(user, request) {
            Ok(created) => {
                if created.kind.opens_debt()
                    && let Some(label) = record.reference.filter(|label| !label.is_empty())
                {
                    index.debts.insert((record.user, label), created.id);
                }
            }
            Err(e) if strict => return Err(ReplayError::Rejected { row, source: e }),
            Err(e) => warn!(row, error = %e, "row rejected"),
        }
    }

    Ok(engine)
}

/// One line of the balances report.
#[derive(Debug, Serialize)]
struct BalanceRow {
    user: u64,
    account: String,
    balance: Decimal,
}

/// Write final account balances to a CSV writer.
///
/// Columns: `user, account, balance`, ordered by account creation.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_balances<W: Write>(
    engine: &LedgerEngine<MemoryStore>,
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for account in engine.store().all_accounts() {
        wtr.serialize(BalanceRow {
            user: account.user_id.0,
            account: account.name,
            balance: account.balance,
        })?;
    }

    wtr.flush()?;
    Ok(())
}
