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

//! Ledger engine.
//!
//! The [`LedgerEngine`] turns a user-submitted transaction into a consistent
//! mutation of one or more account balances. Every create runs as: ownership
//! validation, then an atomic scope containing the row insert and the balance
//! deltas, then commit. Nothing is applied on any failure.
//!
//! # Thread Safety
//!
//! All methods take `&self`; the engine holds no mutable state of its own and
//! can be shared freely across threads. Consistency under concurrency is the
//! store's job (see [`AtomicScope`]): the reference [`MemoryStore`] locks
//! accounts individually, so creates against different accounts proceed in
//! parallel.
//!
//! [`MemoryStore`]: crate::memory::MemoryStore

use crate::account::Account;
use crate::base::{AccountId, CategoryId, ProfileId, TransactionId, UserId};
use crate::category::Category;
use crate::error::{EntityKind, LedgerError};
use crate::policy::balance_deltas;
use crate::store::{
    AtomicScope, StoreError, TransactionDraft, TransactionFilter, TransactionalStore,
};
use crate::transaction::{
    DebtStatus, NewTransaction, TransactionPatch, TransactionRecord,
};
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Orchestrates transaction creation against an abstract transactional store.
///
/// # Invariants
///
/// - Account balances change only through committed scopes opened here.
/// - Every referenced account, category, profile, and debt row is validated
///   for existence and ownership before a scope opens.
/// - A transaction row and its balance deltas commit together or not at all.
/// - Debt rows move `Active` to `Resolved` exactly once, inside the scope of
///   the repayment that settles them.
#[derive(Debug)]
pub struct LedgerEngine<S> {
    store: S,
}

impl<S: TransactionalStore> LedgerEngine<S> {
    pub fn new(store: S) -> Self {
        LedgerEngine { store }
    }

    /// The backing store, for read paths that bypass the engine.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a transaction and applies its balance effects atomically.
    ///
    /// # Balance effects
    ///
    /// | Kind | Effect |
    /// |------|--------|
    /// | Income | credits the account |
    /// | Expense | debits the account |
    /// | Transfer | debits `from`, credits `to` |
    /// | DebtGive | debits the account, opens an active debt |
    /// | DebtTake | credits the account, opens an active debt |
    /// | DebtRepay | credits the account, resolves the referenced debt |
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] - amount is zero or negative.
    /// - [`LedgerError::NotFound`] - a referenced account, category, profile,
    ///   or debt transaction does not exist.
    /// - [`LedgerError::Forbidden`] - a referenced entity belongs to another
    ///   user.
    /// - [`LedgerError::InvalidReference`] - transfer from/to are the same
    ///   account, or a repayment references a non-debt or already resolved
    ///   transaction.
    /// - [`LedgerError::Internal`] - the store failed mid-operation; the
    ///   scope was aborted and nothing was applied.
    pub fn create_transaction(
        &self,
        user_id: UserId,
        request: NewTransaction,
    ) -> Result<TransactionRecord, LedgerError> {
        match self.create_transaction_inner(user_id, request) {
            Ok(record) => {
                info!(
                    user_id = %user_id,
                    transaction_id = %record.id,
                    kind = record.kind.label(),
                    amount = %record.amount,
                    "transaction committed"
                );
                Ok(record)
            }
            Err(error) => {
                debug!(user_id = %user_id, error = %error, "transaction rejected");
                Err(error)
            }
        }
    }

    fn create_transaction_inner(
        &self,
        user_id: UserId,
        request: NewTransaction,
    ) -> Result<TransactionRecord, LedgerError> {
        if request.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }

        // Ownership validation, all of it before any write.
        let category = match request.category_id {
            Some(id) => Some(self.owned_category(user_id, id)?),
            None => None,
        };
        if let Some(id) = request.profile_id {
            self.owned_profile(user_id, id)?;
        }
        for account_id in request.kind.account_ids() {
            self.owned_account(user_id, account_id)?;
        }
        if let Some(debt_id) = request.kind.settles_debt() {
            self.owned_active_debt(user_id, debt_id)?;
        }

        let deltas = balance_deltas(&request.kind, request.amount)?;

        let mut scope = self.store.begin()?;
        let draft = TransactionDraft {
            user_id,
            debt_status: request.kind.opens_debt().then_some(DebtStatus::Active),
            category_name: category.map(|c| c.name),
            kind: request.kind,
            amount: request.amount,
            date: request.date,
            description: request.description,
            category_id: request.category_id,
            profile_id: request.profile_id,
        };
        let record = scope.insert_transaction(draft)?;
        for delta in deltas {
            scope.apply_delta(delta)?;
        }
        if let Some(debt_id) = record.kind.settles_debt() {
            scope.set_debt_status(debt_id, DebtStatus::Resolved)?;
        }
        scope.commit()?;

        Ok(record)
    }

    /// Returns the user's unresolved debt-give/debt-take transactions,
    /// newest first. Pure read, no scope.
    pub fn find_active_debts(
        &self,
        user_id: UserId,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        Ok(self.store.query(&TransactionFilter::active_debts(user_id))?)
    }

    /// Returns the user's transactions matching `filter`, newest first.
    pub fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        Ok(self.store.query(filter)?)
    }

    /// Fetches one transaction with an ownership check.
    pub fn get_transaction(
        &self,
        user_id: UserId,
        id: TransactionId,
    ) -> Result<TransactionRecord, LedgerError> {
        let record = self
            .store
            .transaction(id)?
            .ok_or(LedgerError::NotFound(EntityKind::Transaction))?;
        if record.user_id != user_id {
            return Err(LedgerError::Forbidden(EntityKind::Transaction));
        }
        Ok(record)
    }

    /// Fetches one account with an ownership check.
    pub fn get_account(
        &self,
        user_id: UserId,
        id: AccountId,
    ) -> Result<Account, LedgerError> {
        self.owned_account(user_id, id)
    }

    /// Amends description, date, or category of an existing transaction.
    ///
    /// Kind, amount, and account references are immutable. Balances are NOT
    /// recomputed: this operation is non-reconciling (see the crate docs),
    /// so amending a transaction never changes any account balance.
    pub fn update_transaction(
        &self,
        user_id: UserId,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<TransactionRecord, LedgerError> {
        let mut record = self.get_transaction(user_id, id)?;

        if let Some(description) = patch.description {
            record.description = Some(description);
        }
        if let Some(date) = patch.date {
            record.date = date;
        }
        if let Some(category_id) = patch.category_id {
            let category = self.owned_category(user_id, category_id)?;
            record.category_id = Some(category.id);
            record.category_name = Some(category.name);
        }

        self.store
            .update_transaction(record.clone())
            .map_err(Self::missing_row_as_not_found)?;
        info!(user_id = %user_id, transaction_id = %id, "transaction amended");
        Ok(record)
    }

    /// Deletes a transaction row.
    ///
    /// Non-reconciling like [`update_transaction`](Self::update_transaction):
    /// the balance effects the transaction had when it committed stay in
    /// place.
    pub fn delete_transaction(
        &self,
        user_id: UserId,
        id: TransactionId,
    ) -> Result<(), LedgerError> {
        self.get_transaction(user_id, id)?;
        self.store
            .remove_transaction(id)
            .map_err(Self::missing_row_as_not_found)?;
        info!(user_id = %user_id, transaction_id = %id, "transaction deleted");
        Ok(())
    }

    fn owned_account(&self, user_id: UserId, id: AccountId) -> Result<Account, LedgerError> {
        let account = self
            .store
            .account(id)?
            .ok_or(LedgerError::NotFound(EntityKind::Account))?;
        if account.user_id != user_id {
            return Err(LedgerError::Forbidden(EntityKind::Account));
        }
        Ok(account)
    }

    fn owned_category(&self, user_id: UserId, id: CategoryId) -> Result<Category, LedgerError> {
        let category = self
            .store
            .category(id)?
            .ok_or(LedgerError::NotFound(EntityKind::Category))?;
        if category.user_id != user_id {
            return Err(LedgerError::Forbidden(EntityKind::Category));
        }
        Ok(category)
    }

    fn owned_profile(&self, user_id: UserId, id: ProfileId) -> Result<(), LedgerError> {
        let profile = self
            .store
            .profile(id)?
            .ok_or(LedgerError::NotFound(EntityKind::Profile))?;
        if profile.user_id != user_id {
            return Err(LedgerError::Forbidden(EntityKind::Profile));
        }
        Ok(())
    }

    /// A repayment may only settle a debt row the user owns that is still
    /// active.
    fn owned_active_debt(
        &self,
        user_id: UserId,
        id: TransactionId,
    ) -> Result<(), LedgerError> {
        let debt = self
            .store
            .transaction(id)?
            .ok_or(LedgerError::NotFound(EntityKind::Transaction))?;
        if debt.user_id != user_id {
            return Err(LedgerError::Forbidden(EntityKind::Transaction));
        }
        if !debt.kind.opens_debt() {
            return Err(LedgerError::InvalidReference(
                "repayment must reference a debt transaction",
            ));
        }
        if debt.debt_status != Some(DebtStatus::Active) {
            return Err(LedgerError::InvalidReference("debt is already resolved"));
        }
        Ok(())
    }

    fn missing_row_as_not_found(err: StoreError) -> LedgerError {
        match err {
            StoreError::MissingTransaction(_) => LedgerError::NotFound(EntityKind::Transaction),
            other => other.into(),
        }
    }
}
