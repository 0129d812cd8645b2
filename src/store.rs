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

//! Storage collaborator interfaces.
//!
//! The engine is storage-agnostic: it talks to a [`TransactionalStore`] for
//! reads and single-row writes, and to an [`AtomicScope`] for the write set
//! of one `create_transaction` call. A scope's writes become visible only on
//! [`AtomicScope::commit`]; dropping a scope uncommitted (early return,
//! panic, caller cancellation) discards everything it staged.
//!
//! [`MemoryStore`](crate::memory::MemoryStore) is the in-process reference
//! implementation; a relational backend would map scopes onto database
//! transactions.

use crate::account::Account;
use crate::base::{AccountId, CategoryId, ProfileId, TransactionId, UserId};
use crate::category::Category;
use crate::policy::BalanceDelta;
use crate::profile::Profile;
use crate::transaction::{DebtStatus, TransactionKind, TransactionRecord};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage-level failures.
///
/// The engine converts any of these that escape a scope into
/// [`LedgerError::Internal`](crate::error::LedgerError::Internal).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A delta targeted an account the store does not have
    #[error("account {0} missing from store")]
    MissingAccount(AccountId),

    /// A row write targeted a transaction the store does not have
    #[error("transaction {0} missing from store")]
    MissingTransaction(TransactionId),

    /// Backend failure (connection loss, fault injection in tests, ...)
    #[error("backend failure: {0}")]
    Backend(String),
}

/// A transaction row ready for insertion, minus the store-assigned id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionDraft {
    pub user_id: UserId,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub profile_id: Option<ProfileId>,
    pub debt_status: Option<DebtStatus>,
}

impl TransactionDraft {
    /// Attaches the id the store assigned, producing the persisted row.
    pub fn into_record(self, id: TransactionId) -> TransactionRecord {
        TransactionRecord {
            id,
            user_id: self.user_id,
            kind: self.kind,
            amount: self.amount,
            date: self.date,
            description: self.description,
            category_id: self.category_id,
            category_name: self.category_name,
            profile_id: self.profile_id,
            debt_status: self.debt_status,
        }
    }
}

/// Filter for record-store queries. All set fields must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionFilter {
    pub user_id: UserId,
    /// Matches any account the transaction references (either side of a
    /// transfer).
    pub account_id: Option<AccountId>,
    pub category_id: Option<CategoryId>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    /// Only debt-origin rows carry a status, so setting this also restricts
    /// the result to debt-give/debt-take rows.
    pub debt_status: Option<DebtStatus>,
}

impl TransactionFilter {
    /// Everything the user owns.
    pub fn for_user(user_id: UserId) -> Self {
        TransactionFilter {
            user_id,
            account_id: None,
            category_id: None,
            from_date: None,
            to_date: None,
            debt_status: None,
        }
    }

    /// The user's unresolved debts.
    pub fn active_debts(user_id: UserId) -> Self {
        TransactionFilter {
            debt_status: Some(DebtStatus::Active),
            ..Self::for_user(user_id)
        }
    }

    /// Whether a row satisfies every set field of this filter.
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        if record.user_id != self.user_id {
            return false;
        }
        if let Some(account_id) = self.account_id
            && !record.kind.account_ids().contains(&account_id)
        {
            return false;
        }
        if let Some(category_id) = self.category_id
            && record.category_id != Some(category_id)
        {
            return false;
        }
        if let Some(from) = self.from_date
            && record.date < from
        {
            return false;
        }
        if let Some(to) = self.to_date
            && record.date > to
        {
            return false;
        }
        if let Some(status) = self.debt_status
            && record.debt_status != Some(status)
        {
            return false;
        }
        true
    }
}

/// Read and single-row-write surface of the backing store.
pub trait TransactionalStore {
    fn account(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    fn category(&self, id: CategoryId) -> Result<Option<Category>, StoreError>;

    fn profile(&self, id: ProfileId) -> Result<Option<Profile>, StoreError>;

    fn transaction(&self, id: TransactionId) -> Result<Option<TransactionRecord>, StoreError>;

    /// Returns matching rows newest first: date descending, id descending
    /// within a date.
    fn query(&self, filter: &TransactionFilter) -> Result<Vec<TransactionRecord>, StoreError>;

    /// Replaces an existing row wholesale. Touches no balances.
    fn update_transaction(&self, record: TransactionRecord) -> Result<(), StoreError>;

    /// Removes a row. Touches no balances.
    fn remove_transaction(&self, id: TransactionId) -> Result<(), StoreError>;

    /// Opens an atomic scope for one create operation.
    fn begin(&self) -> Result<Box<dyn AtomicScope + '_>, StoreError>;
}

/// One all-or-nothing write set.
///
/// Writes staged here are invisible to every reader until [`commit`]
/// succeeds. There is no explicit abort: dropping the scope discards it.
///
/// [`commit`]: AtomicScope::commit
pub trait AtomicScope {
    /// Stages a row insert; the returned record carries the assigned id.
    ///
    /// Ids are assigned eagerly (like a database sequence), so an id may be
    /// consumed by a scope that never commits. Gaps in the id space are
    /// normal.
    fn insert_transaction(&mut self, draft: TransactionDraft)
    -> Result<TransactionRecord, StoreError>;

    /// Stages a balance increment/decrement.
    fn apply_delta(&mut self, delta: BalanceDelta) -> Result<(), StoreError>;

    /// Stages a debt-status change on an existing row.
    fn set_debt_status(&mut self, id: TransactionId, status: DebtStatus)
    -> Result<(), StoreError>;

    /// Applies every staged write as one unit.
    fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
