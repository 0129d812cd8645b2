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

//! Error types for ledger operations.

use crate::store::StoreError;
use std::fmt;
use thiserror::Error;

/// The kind of entity an ownership or existence check failed on.
///
/// Carried by [`LedgerError::NotFound`] and [`LedgerError::Forbidden`] so a
/// caller can tell which reference in the request was bad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Account,
    Category,
    Profile,
    Transaction,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Account => "account",
            EntityKind::Category => "category",
            EntityKind::Profile => "profile",
            EntityKind::Transaction => "transaction",
        };
        write!(f, "{name}")
    }
}

/// Ledger operation errors.
///
/// Outer layers map these to failure classes: `NotFound` is a 404-class
/// error, `Forbidden` 403, `InvalidAmount` and `InvalidReference` 400, and
/// `Internal` 500. The engine never recovers silently; any failure after a
/// scope opens aborts the whole scope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Amount is zero or negative
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// A referenced entity does not exist
    #[error("referenced {0} not found")]
    NotFound(EntityKind),

    /// A referenced entity exists but belongs to another user
    #[error("referenced {0} belongs to another user")]
    Forbidden(EntityKind),

    /// A reference is structurally invalid for the transaction kind
    #[error("invalid reference: {0}")]
    InvalidReference(&'static str),

    /// The store failed mid-operation; the scope was aborted
    #[error("internal store failure: {0}")]
    Internal(String),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        LedgerError::Internal(err.to_string())
    }
}
