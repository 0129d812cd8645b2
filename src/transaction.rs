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

//! Transaction types.
//!
//! Debt-origin transactions (give/take) follow a state machine:
//! - [`Active`]: initial state on creation
//! - [`Active`] → [`Resolved`] (via a committed debt-repay referencing them)
//!
//! There is no transition out of [`Resolved`].
//!
//! [`Active`]: DebtStatus::Active
//! [`Resolved`]: DebtStatus::Resolved

use crate::base::{AccountId, CategoryId, ProfileId, TransactionId, UserId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Transaction kind with its kind-dependent account references.
///
/// Which accounts a transaction touches is part of the kind itself, so a
/// well-typed value always carries exactly the references its kind needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionKind {
    /// Money coming in: credits the account.
    Income { account_id: AccountId },
    /// Money going out: debits the account.
    Expense { account_id: AccountId },
    /// Money moving between two accounts of the same user.
    Transfer {
        from_account_id: AccountId,
        to_account_id: AccountId,
    },
    /// Money lent to someone: debits the account, opens an active debt.
    DebtGive {
        account_id: AccountId,
        contact: DebtContact,
    },
    /// Money borrowed from someone: credits the account, opens an active debt.
    DebtTake {
        account_id: AccountId,
        contact: DebtContact,
    },
    /// Settlement of a previously recorded debt.
    DebtRepay {
        account_id: AccountId,
        /// The debt-give/debt-take transaction this repayment settles.
        debt_id: TransactionId,
    },
}

impl TransactionKind {
    /// Short lowercase label for logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Income { .. } => "income",
            Self::Expense { .. } => "expense",
            Self::Transfer { .. } => "transfer",
            Self::DebtGive { .. } => "debt-give",
            Self::DebtTake { .. } => "debt-take",
            Self::DebtRepay { .. } => "debt-repay",
        }
    }

    /// All account ids this kind references, in delta order.
    pub fn account_ids(&self) -> Vec<AccountId> {
        match self {
            Self::Income { account_id }
            | Self::Expense { account_id }
            | Self::DebtGive { account_id, .. }
            | Self::DebtTake { account_id, .. }
            | Self::DebtRepay { account_id, .. } => vec![*account_id],
            Self::Transfer {
                from_account_id,
                to_account_id,
            } => vec![*from_account_id, *to_account_id],
        }
    }

    /// Whether this kind opens a debt (give/take).
    pub fn opens_debt(&self) -> bool {
        matches!(self, Self::DebtGive { .. } | Self::DebtTake { .. })
    }

    /// The debt transaction a repayment settles, if this is a repayment.
    pub fn settles_debt(&self) -> Option<TransactionId> {
        match self {
            Self::DebtRepay { debt_id, .. } => Some(*debt_id),
            _ => None,
        }
    }
}

/// Lifecycle state of a debt-origin transaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DebtStatus {
    Active,
    Resolved,
}

/// Counterparty details recorded on debt-give/debt-take transactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DebtContact {
    pub name: String,
    pub phone: Option<String>,
}

/// A transaction as submitted by a caller, before the engine validates it.
///
/// The owning user id is not part of the request; the engine receives it
/// separately from the authenticated caller, so a request body can never
/// claim another user's identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    /// Must be strictly positive.
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub profile_id: Option<ProfileId>,
}

/// A transaction row as persisted by the record store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub user_id: UserId,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    /// Name snapshot of the category at creation (or last category change),
    /// frozen against later renames.
    pub category_name: Option<String>,
    pub profile_id: Option<ProfileId>,
    /// `Some` only for debt-give/debt-take rows.
    pub debt_status: Option<DebtStatus>,
}

/// Fields a caller may amend after creation.
///
/// Kind, amount, and account references are immutable once committed; see
/// the crate docs for why edits do not reconcile balances. A `None` field
/// means "leave unchanged" (clearing a field is not supported).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionPatch {
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub category_id: Option<CategoryId>,
}
