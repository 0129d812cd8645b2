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

//! In-memory reference store.
//!
//! [`MemoryStore`] backs the engine with `DashMap`s and one `parking_lot`
//! mutex per account. Scopes stage their writes and apply them on commit:
//!
//! - Balance deltas are applied under the account mutexes, acquired in
//!   ascending account-id order so concurrent commits touching the same
//!   accounts cannot deadlock and cannot lose updates.
//! - Row inserts and debt-status changes are applied while those locks are
//!   still held, so another writer of the same accounts sees either all of a
//!   commit or none of it.
//! - A scope dropped before [`commit`] discards its staged writes; nothing
//!   is applied early, so there is no rollback path.
//!
//! The store also carries the account/category/profile CRUD that the
//! surrounding system owns in production. Those methods exist so tests,
//! the CLI, and the demo server can provision fixtures; the engine itself
//! never calls them.
//!
//! [`commit`]: crate::store::AtomicScope::commit

use crate::account::{Account, AccountTypeRef};
use crate::base::{AccountId, CategoryId, ProfileId, TransactionId, UserId};
use crate::category::Category;
use crate::policy::BalanceDelta;
use crate::profile::Profile;
use crate::store::{
    AtomicScope, StoreError, TransactionDraft, TransactionFilter, TransactionalStore,
};
use crate::transaction::{DebtStatus, TransactionRecord};
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// One account behind its own lock.
///
/// Slots are shared out of the map as `Arc`s so a commit can hold several
/// account locks at once without pinning any `DashMap` shard.
#[derive(Debug)]
struct AccountSlot {
    inner: Mutex<Account>,
}

/// Thread-safe in-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: DashMap<AccountId, Arc<AccountSlot>>,
    transactions: DashMap<TransactionId, TransactionRecord>,
    categories: DashMap<CategoryId, Category>,
    profiles: DashMap<ProfileId, Profile>,
    next_account_id: AtomicU64,
    next_transaction_id: AtomicU64,
    next_category_id: AtomicU64,
    next_profile_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an account with an opening balance.
    ///
    /// The opening balance is part of creation, not a ledger mutation; after
    /// this point the balance changes only through committed scopes.
    pub fn add_account(
        &self,
        user_id: UserId,
        name: &str,
        opening_balance: Decimal,
        type_ref: Option<AccountTypeRef>,
    ) -> Account {
        let id = AccountId(self.next_account_id.fetch_add(1, Ordering::Relaxed) + 1);
        let account = Account {
            id,
            user_id,
            name: name.to_string(),
            balance: opening_balance,
            type_ref,
        };
        self.accounts.insert(
            id,
            Arc::new(AccountSlot {
                inner: Mutex::new(account.clone()),
            }),
        );
        account
    }

    pub fn add_category(&self, user_id: UserId, name: &str) -> Category {
        let id = CategoryId(self.next_category_id.fetch_add(1, Ordering::Relaxed) + 1);
        let category = Category {
            id,
            user_id,
            name: name.to_string(),
        };
        self.categories.insert(id, category.clone());
        category
    }

    /// Renames a category in place. Name snapshots taken by earlier
    /// transactions keep the old name.
    pub fn rename_category(&self, id: CategoryId, name: &str) -> bool {
        match self.categories.get_mut(&id) {
            Some(mut category) => {
                category.name = name.to_string();
                true
            }
            None => false,
        }
    }

    pub fn add_profile(&self, user_id: UserId, name: &str) -> Profile {
        let id = ProfileId(self.next_profile_id.fetch_add(1, Ordering::Relaxed) + 1);
        let profile = Profile {
            id,
            user_id,
            name: name.to_string(),
        };
        self.profiles.insert(id, profile.clone());
        profile
    }

    /// All of a user's accounts, ordered by id.
    pub fn accounts_for_user(&self, user_id: UserId) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .map(|entry| entry.value().inner.lock().clone())
            .filter(|account| account.user_id == user_id)
            .collect();
        accounts.sort_by_key(|account| account.id);
        accounts
    }

    /// Every account in the store, ordered by id. Report surface for the
    /// replay CLI.
    pub fn all_accounts(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .map(|entry| entry.value().inner.lock().clone())
            .collect();
        accounts.sort_by_key(|account| account.id);
        accounts
    }
}

impl TransactionalStore for MemoryStore {
    fn account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self
            .accounts
            .get(&id)
            .map(|entry| entry.value().inner.lock().clone()))
    }

    fn category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        Ok(self.categories.get(&id).map(|entry| entry.value().clone()))
    }

    fn profile(&self, id: ProfileId) -> Result<Option<Profile>, StoreError> {
        Ok(self.profiles.get(&id).map(|entry| entry.value().clone()))
    }

    fn transaction(&self, id: TransactionId) -> Result<Option<TransactionRecord>, StoreError> {
        Ok(self
            .transactions
            .get(&id)
            .map(|entry| entry.value().clone()))
    }

    fn query(&self, filter: &TransactionFilter) -> Result<Vec<TransactionRecord>, StoreError> {
        let mut rows: Vec<TransactionRecord> = self
            .transactions
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        // Newest first; ids are monotonic, so they break date ties by
        // insertion order.
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    fn update_transaction(&self, record: TransactionRecord) -> Result<(), StoreError> {
        match self.transactions.get_mut(&record.id) {
            Some(mut row) => {
                *row = record;
                Ok(())
            }
            None => Err(StoreError::MissingTransaction(record.id)),
        }
    }

    fn remove_transaction(&self, id: TransactionId) -> Result<(), StoreError> {
        match self.transactions.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::MissingTransaction(id)),
        }
    }

    fn begin(&self) -> Result<Box<dyn AtomicScope + '_>, StoreError> {
        Ok(Box::new(MemoryScope {
            store: self,
            staged: Vec::new(),
            committed: false,
        }))
    }
}

enum StagedWrite {
    Insert(TransactionRecord),
    Delta(BalanceDelta),
    Status(TransactionId, DebtStatus),
}

/// Scope over a [`MemoryStore`]: writes are buffered until commit.
pub struct MemoryScope<'a> {
    store: &'a MemoryStore,
    staged: Vec<StagedWrite>,
    committed: bool,
}

impl AtomicScope for MemoryScope<'_> {
    fn insert_transaction(
        &mut self,
        draft: TransactionDraft,
    ) -> Result<TransactionRecord, StoreError> {
        // Ids come off the sequence at stage time, like a database sequence:
        // an aborted scope leaves a gap, never a reused id.
        let id = TransactionId(
            self.store
                .next_transaction_id
                .fetch_add(1, Ordering::Relaxed)
                + 1,
        );
        let record = draft.into_record(id);
        self.staged.push(StagedWrite::Insert(record.clone()));
        Ok(record)
    }

    fn apply_delta(&mut self, delta: BalanceDelta) -> Result<(), StoreError> {
        if !self.store.accounts.contains_key(&delta.account_id) {
            return Err(StoreError::MissingAccount(delta.account_id));
        }
        self.staged.push(StagedWrite::Delta(delta));
        Ok(())
    }

    fn set_debt_status(
        &mut self,
        id: TransactionId,
        status: DebtStatus,
    ) -> Result<(), StoreError> {
        if !self.store.transactions.contains_key(&id) {
            return Err(StoreError::MissingTransaction(id));
        }
        self.staged.push(StagedWrite::Status(id, status));
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        // Verify everything before applying anything: a commit either lands
        // whole or returns an error with the store untouched.
        let mut totals: Vec<(AccountId, Decimal)> = Vec::new();
        for write in &self.staged {
            match write {
                StagedWrite::Delta(delta) => {
                    match totals.iter_mut().find(|(id, _)| *id == delta.account_id) {
                        Some((_, total)) => *total += delta.amount,
                        None => totals.push((delta.account_id, delta.amount)),
                    }
                }
                StagedWrite::Status(id, _) => {
                    if !self.store.transactions.contains_key(id) {
                        return Err(StoreError::MissingTransaction(*id));
                    }
                }
                StagedWrite::Insert(_) => {}
            }
        }
        // Ascending id order so concurrent commits cannot deadlock.
        totals.sort_unstable_by_key(|(id, _)| *id);

        let mut slots = Vec::with_capacity(totals.len());
        for (id, _) in &totals {
            let slot = self
                .store
                .accounts
                .get(id)
                .map(|entry| Arc::clone(entry.value()))
                .ok_or(StoreError::MissingAccount(*id))?;
            slots.push(slot);
        }
        let mut guards: Vec<_> = slots.iter().map(|slot| slot.inner.lock()).collect();

        for (guard, (_, total)) in guards.iter_mut().zip(&totals) {
            guard.balance += *total;
        }
        let writes = self.staged.len();
        for write in std::mem::take(&mut self.staged) {
            match write {
                StagedWrite::Insert(record) => {
                    self.store.transactions.insert(record.id, record);
                }
                StagedWrite::Status(id, status) => {
                    if let Some(mut row) = self.store.transactions.get_mut(&id) {
                        row.debt_status = Some(status);
                    }
                }
                StagedWrite::Delta(_) => {}
            }
        }
        drop(guards);

        self.committed = true;
        debug!(writes, "atomic scope committed");
        Ok(())
    }
}

impl Drop for MemoryScope<'_> {
    fn drop(&mut self) {
        if !self.committed && !self.staged.is_empty() {
            debug!(
                discarded = self.staged.len(),
                "atomic scope dropped without commit"
            );
        }
    }
}
