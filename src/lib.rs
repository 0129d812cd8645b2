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

//! # Wallet Ledger
//!
//! This library provides the ledger core of a personal-finance tracker:
//! turning user-submitted transactions (income, expenses, transfers, and
//! lent/borrowed money) into atomic, consistent mutations of account
//! balances.
//!
//! ## Core Components
//!
//! - [`LedgerEngine`]: Validates ownership and applies transactions atomically
//! - [`balance_deltas`]: Pure policy mapping a transaction to signed balance changes
//! - [`TransactionKind`]: Supported transaction kinds with their account references
//! - [`TransactionalStore`] / [`AtomicScope`]: Storage collaborator interfaces
//! - [`MemoryStore`]: In-process reference store implementation
//! - [`LedgerError`]: Error taxonomy (not-found, forbidden, invalid reference, internal)
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use wallet_ledger_rs::{
//!     LedgerEngine, MemoryStore, NewTransaction, TransactionKind, UserId,
//! };
//!
//! let store = MemoryStore::new();
//! let user = UserId(1);
//! let checking = store.add_account(user, "Checking", dec!(0), None);
//!
//! let engine = LedgerEngine::new(store);
//! engine
//!     .create_transaction(user, NewTransaction {
//!         kind: TransactionKind::Income { account_id: checking.id },
//!         amount: dec!(100.00),
//!         date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
//!         description: Some("salary".into()),
//!         category_id: None,
//!         profile_id: None,
//!     })
//!     .unwrap();
//!
//! let account = engine.get_account(user, checking.id).unwrap();
//! assert_eq!(account.balance, dec!(100.00));
//! ```
//!
//! ## Thread Safety
//!
//! The engine takes `&self` everywhere and can be shared across threads. The
//! reference store locks accounts individually and acquires multi-account
//! locks in a fixed order, so concurrent creates against the same account
//! serialize without lost updates and creates against different accounts run
//! in parallel.
//!
//! ## Known Limitation
//!
//! Amending or deleting a transaction does NOT reverse or recompute its
//! balance effects. Balances reflect every transaction as originally
//! committed; edits and deletes are bookkeeping-only. See
//! [`LedgerEngine::update_transaction`] for details.

pub mod account;
mod base;
mod category;
mod engine;
pub mod error;
pub mod memory;
pub mod policy;
mod profile;
pub mod store;
mod transaction;

pub use account::{Account, AccountTypeRef};
pub use base::{AccountId, AccountTypeId, CategoryId, ProfileId, TransactionId, UserId};
pub use category::Category;
pub use engine::LedgerEngine;
pub use error::{EntityKind, LedgerError};
pub use memory::MemoryStore;
pub use policy::{BalanceDelta, balance_deltas};
pub use profile::Profile;
pub use store::{
    AtomicScope, StoreError, TransactionDraft, TransactionFilter, TransactionalStore,
};
pub use transaction::{
    DebtContact, DebtStatus, NewTransaction, TransactionKind, TransactionPatch,
    TransactionRecord,
};
