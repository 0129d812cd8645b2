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

//! Balance mutation policy.
//!
//! The single place that decides how a transaction moves money. Pure and
//! deterministic: no store access, no clock, no side effects. The engine
//! applies whatever this module returns inside its atomic scope.

use crate::base::AccountId;
use crate::error::LedgerError;
use crate::transaction::TransactionKind;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A signed balance change to apply to one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct BalanceDelta {
    pub account_id: AccountId,
    /// Positive credits the account, negative debits it.
    pub amount: Decimal,
}

/// Computes the ordered balance deltas for one transaction.
///
/// | Kind       | Deltas                         |
/// |------------|--------------------------------|
/// | income     | `account: +amount`             |
/// | debt-take  | `account: +amount`             |
/// | expense    | `account: -amount`             |
/// | debt-give  | `account: -amount`             |
/// | transfer   | `from: -amount`, `to: +amount` |
/// | debt-repay | `account: +amount`             |
///
/// A repayment always credits the referenced account, whether the original
/// debt was given or taken. Financially that is only half right (repaying
/// money you borrowed should debit), but the direction is a recorded open
/// question in this design: callers that need direction-aware repayment must
/// model it as an explicit expense instead.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidReference`] when a transfer names the same
/// account on both sides. `amount` is taken as already validated (the engine
/// rejects non-positive amounts before calling here).
pub fn balance_deltas(
    kind: &TransactionKind,
    amount: Decimal,
) -> Result<Vec<BalanceDelta>, LedgerError> {
    debug_assert!(amount > Decimal::ZERO, "amount validated by the engine");

    let deltas = match kind {
        TransactionKind::Income { account_id }
        | TransactionKind::DebtTake { account_id, .. }
        | TransactionKind::DebtRepay { account_id, .. } => vec![BalanceDelta {
            account_id: *account_id,
            amount,
        }],
        TransactionKind::Expense { account_id }
        | TransactionKind::DebtGive { account_id, .. } => vec![BalanceDelta {
            account_id: *account_id,
            amount: -amount,
        }],
        TransactionKind::Transfer {
            from_account_id,
            to_account_id,
        } => {
            if from_account_id == to_account_id {
                return Err(LedgerError::InvalidReference(
                    "transfer accounts must differ",
                ));
            }
            vec![
                BalanceDelta {
                    account_id: *from_account_id,
                    amount: -amount,
                },
                BalanceDelta {
                    account_id: *to_account_id,
                    amount,
                },
            ]
        }
    };

    Ok(deltas)
}
