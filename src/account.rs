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

//! Account records.
//!
//! An [`Account`] is a row owned by the account store. Its balance is signed
//! and arbitrary-precision, and is only ever changed by the ledger engine's
//! delta application; no other code path writes it. The balance is never
//! recomputed from transaction history.

use crate::base::{AccountId, AccountTypeId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A user's account with its current balance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Account {
    pub id: AccountId,
    pub user_id: UserId,
    /// Display name, e.g. "Main checking".
    pub name: String,
    /// Current balance. Signed: overdrawing an account is allowed and simply
    /// produces a negative balance.
    pub balance: Decimal,
    /// Optional account type, carrying a name snapshot.
    pub type_ref: Option<AccountTypeRef>,
}

/// Reference to an account type with a denormalized name snapshot.
///
/// The `name` is copied from the account type at assignment time and never
/// updated afterwards, so renaming the type later does not change how
/// existing accounts display.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AccountTypeRef {
    pub id: AccountTypeId,
    pub name: String,
}
