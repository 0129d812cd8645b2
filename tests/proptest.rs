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

//! Property-based tests for the ledger engine.
//!
//! These tests verify invariants that should hold for any amounts and any
//! sequence of valid transactions.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use wallet_ledger_rs::{
    AccountId, DebtContact, DebtStatus, LedgerEngine, LedgerError, MemoryStore, NewTransaction,
    TransactionFilter, TransactionId, TransactionKind, UserId, balance_deltas,
};

// =============================================================================
// Arbitrary Strategies
// =============================================================================

/// Generate a positive money amount (one cent to $10,000).
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..=1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
}

fn request(kind: TransactionKind, amount: Decimal, date: NaiveDate) -> NewTransaction {
    NewTransaction {
        kind,
        amount,
        date,
        description: None,
        category_id: None,
        profile_id: None,
    }
}

fn income(account_id: AccountId, amount: Decimal) -> NewTransaction {
    request(TransactionKind::Income { account_id }, amount, day(15))
}

fn expense(account_id: AccountId, amount: Decimal) -> NewTransaction {
    request(TransactionKind::Expense { account_id }, amount, day(15))
}

fn debt_give(account_id: AccountId, amount: Decimal) -> NewTransaction {
    request(
        TransactionKind::DebtGive {
            account_id,
            contact: DebtContact {
                name: "Alex".into(),
                phone: None,
            },
        },
        amount,
        day(15),
    )
}

fn debt_take(account_id: AccountId, amount: Decimal) -> NewTransaction {
    request(
        TransactionKind::DebtTake {
            account_id,
            contact: DebtContact {
                name: "Alex".into(),
                phone: None,
            },
        },
        amount,
        day(15),
    )
}

fn debt_repay(account_id: AccountId, debt_id: TransactionId, amount: Decimal) -> NewTransaction {
    request(
        TransactionKind::DebtRepay {
            account_id,
            debt_id,
        },
        amount,
        day(20),
    )
}

fn ledger_with_account(balance: Decimal) -> (LedgerEngine<MemoryStore>, UserId, AccountId) {
    let store = MemoryStore::new();
    let user = UserId(1);
    let account = store.add_account(user, "Checking", balance, None).id;
    (LedgerEngine::new(store), user, account)
}

// =============================================================================
// Balance Delta Table Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Income, debt-take and debt-repay all credit the account by exactly
    /// the amount.
    #[test]
    fn crediting_kinds_produce_one_positive_delta(amount in arb_amount()) {
        let account = AccountId(7);
        let kinds = [
            TransactionKind::Income { account_id: account },
            TransactionKind::DebtTake {
                account_id: account,
                contact: DebtContact { name: "Alex".into(), phone: None },
            },
            TransactionKind::DebtRepay {
                account_id: account,
                debt_id: TransactionId(1),
            },
        ];
        for kind in &kinds {
            let deltas = balance_deltas(kind, amount).unwrap();
            prop_assert_eq!(deltas.len(), 1);
            prop_assert_eq!(deltas[0].account_id, account);
            prop_assert_eq!(deltas[0].amount, amount);
        }
    }

    /// Expense and debt-give debit the account by exactly the amount.
    #[test]
    fn debiting_kinds_produce_one_negative_delta(amount in arb_amount()) {
        let account = AccountId(7);
        let kinds = [
            TransactionKind::Expense { account_id: account },
            TransactionKind::DebtGive {
                account_id: account,
                contact: DebtContact { name: "Alex".into(), phone: None },
            },
        ];
        for kind in &kinds {
            let deltas = balance_deltas(kind, amount).unwrap();
            prop_assert_eq!(deltas.len(), 1);
            prop_assert_eq!(deltas[0].account_id, account);
            prop_assert_eq!(deltas[0].amount, -amount);
        }
    }

    /// A transfer is always zero-sum: debit from, credit to, nothing else.
    #[test]
    fn transfer_deltas_are_zero_sum(amount in arb_amount()) {
        let kind = TransactionKind::Transfer {
            from_account_id: AccountId(1),
            to_account_id: AccountId(2),
        };
        let deltas = balance_deltas(&kind, amount).unwrap();
        prop_assert_eq!(deltas.len(), 2);
        prop_assert_eq!(deltas[0].account_id, AccountId(1));
        prop_assert_eq!(deltas[0].amount, -amount);
        prop_assert_eq!(deltas[1].account_id, AccountId(2));
        prop_assert_eq!(deltas[1].amount, amount);
        let sum: Decimal = deltas.iter().map(|delta| delta.amount).sum();
        prop_assert_eq!(sum, Decimal::ZERO);
    }

    /// A self-transfer is rejected for every amount.
    #[test]
    fn self_transfer_always_rejected(amount in arb_amount()) {
        let kind = TransactionKind::Transfer {
            from_account_id: AccountId(3),
            to_account_id: AccountId(3),
        };
        prop_assert_eq!(
            balance_deltas(&kind, amount),
            Err(LedgerError::InvalidReference("transfer accounts must differ"))
        );
    }
}

// =============================================================================
// Engine Accounting Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// The balance after a run of incomes is exactly their sum.
    #[test]
    fn incomes_sum_to_the_balance(
        amounts in prop::collection::vec(arb_amount(), 1..20),
    ) {
        let (engine, user, account) = ledger_with_account(Decimal::ZERO);
        let expected: Decimal = amounts.iter().copied().sum();

        for amount in &amounts {
            engine.create_transaction(user, income(account, *amount)).unwrap();
        }

        prop_assert_eq!(engine.get_account(user, account).unwrap().balance, expected);
        let rows = engine
            .list_transactions(&TransactionFilter::for_user(user))
            .unwrap();
        prop_assert_eq!(rows.len(), amounts.len());
    }

    /// Interleaved incomes and expenses net out exactly; overdraft is
    /// allowed so no operation in the run can fail.
    #[test]
    fn mixed_incomes_and_expenses_net_out(
        incomes in prop::collection::vec(arb_amount(), 0..10),
        expenses in prop::collection::vec(arb_amount(), 0..10),
    ) {
        let (engine, user, account) = ledger_with_account(Decimal::ZERO);
        let expected: Decimal = incomes.iter().copied().sum::<Decimal>()
            - expenses.iter().copied().sum::<Decimal>();

        for amount in &incomes {
            engine.create_transaction(user, income(account, *amount)).unwrap();
        }
        for amount in &expenses {
            engine.create_transaction(user, expense(account, *amount)).unwrap();
        }

        prop_assert_eq!(engine.get_account(user, account).unwrap().balance, expected);
    }

    /// Any run of transfers between two accounts conserves their total.
    #[test]
    fn transfers_conserve_the_total(
        amounts in prop::collection::vec(arb_amount(), 1..15),
    ) {
        let store = MemoryStore::new();
        let user = UserId(1);
        let a = store.add_account(user, "A", Decimal::new(50_000, 2), None).id;
        let b = store.add_account(user, "B", Decimal::new(20_000, 2), None).id;
        let engine = LedgerEngine::new(store);
        let total_before = Decimal::new(70_000, 2);

        for (i, amount) in amounts.iter().enumerate() {
            let (from, to) = if i % 2 == 0 { (a, b) } else { (b, a) };
            engine
                .create_transaction(
                    user,
                    request(
                        TransactionKind::Transfer {
                            from_account_id: from,
                            to_account_id: to,
                        },
                        *amount,
                        day(15),
                    ),
                )
                .unwrap();
        }

        let total_after = engine.get_account(user, a).unwrap().balance
            + engine.get_account(user, b).unwrap().balance;
        prop_assert_eq!(total_after, total_before);
    }

    /// Zero and negative amounts are rejected for every kind, writing
    /// nothing.
    #[test]
    fn non_positive_amounts_always_rejected(
        cents in -1_000_000i64..=0,
    ) {
        let (engine, user, account) = ledger_with_account(Decimal::ZERO);
        let amount = Decimal::new(cents, 2);

        let result = engine.create_transaction(user, income(account, amount));
        prop_assert_eq!(result, Err(LedgerError::InvalidAmount));

        let result = engine.create_transaction(user, debt_give(account, amount));
        prop_assert_eq!(result, Err(LedgerError::InvalidAmount));

        prop_assert_eq!(engine.get_account(user, account).unwrap().balance, Decimal::ZERO);
        let rows = engine
            .list_transactions(&TransactionFilter::for_user(user))
            .unwrap();
        prop_assert!(rows.is_empty());
    }
}

// =============================================================================
// Debt Lifecycle Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Lending and being repaid restores the balance for any amount.
    #[test]
    fn give_then_repay_round_trips(amount in arb_amount()) {
        let start = Decimal::new(1_000_000, 2);
        let (engine, user, account) = ledger_with_account(start);

        let debt = engine.create_transaction(user, debt_give(account, amount)).unwrap();
        prop_assert_eq!(
            engine.get_account(user, account).unwrap().balance,
            start - amount
        );

        engine
            .create_transaction(user, debt_repay(account, debt.id, amount))
            .unwrap();
        prop_assert_eq!(engine.get_account(user, account).unwrap().balance, start);
        prop_assert!(engine.find_active_debts(user).unwrap().is_empty());
    }

    /// Repay credits regardless of direction: borrow-then-repay grows the
    /// balance by twice the amount.
    #[test]
    fn take_then_repay_credits_twice(amount in arb_amount()) {
        let start = Decimal::new(1_000_000, 2);
        let (engine, user, account) = ledger_with_account(start);

        let debt = engine.create_transaction(user, debt_take(account, amount)).unwrap();
        engine
            .create_transaction(user, debt_repay(account, debt.id, amount))
            .unwrap();

        prop_assert_eq!(
            engine.get_account(user, account).unwrap().balance,
            start + amount + amount
        );
    }

    /// The repayment amount is independent of the debt amount; any positive
    /// repayment resolves the debt.
    #[test]
    fn repay_amount_need_not_match_the_debt(
        debt_amount in arb_amount(),
        repay_amount in arb_amount(),
    ) {
        let start = Decimal::new(1_000_000, 2);
        let (engine, user, account) = ledger_with_account(start);

        let debt = engine.create_transaction(user, debt_give(account, debt_amount)).unwrap();
        engine
            .create_transaction(user, debt_repay(account, debt.id, repay_amount))
            .unwrap();

        let resolved = engine.get_transaction(user, debt.id).unwrap();
        prop_assert_eq!(resolved.debt_status, Some(DebtStatus::Resolved));
        prop_assert_eq!(
            engine.get_account(user, account).unwrap().balance,
            start - debt_amount + repay_amount
        );
    }

    /// Repaying some of many debts leaves exactly the rest active.
    #[test]
    fn active_listing_tracks_unresolved_debts(
        amounts in prop::collection::vec(arb_amount(), 1..8),
        repay_seed in 0usize..8,
    ) {
        let start = Decimal::new(10_000_000, 2);
        let (engine, user, account) = ledger_with_account(start);

        let mut debts = Vec::with_capacity(amounts.len());
        for amount in &amounts {
            debts.push(engine.create_transaction(user, debt_give(account, *amount)).unwrap());
        }

        let repay_count = repay_seed % (debts.len() + 1);
        for debt in debts.iter().take(repay_count) {
            engine
                .create_transaction(user, debt_repay(account, debt.id, debt.amount))
                .unwrap();
        }

        let active = engine.find_active_debts(user).unwrap();
        prop_assert_eq!(active.len(), debts.len() - repay_count);
        for record in &active {
            prop_assert_eq!(record.debt_status, Some(DebtStatus::Active));
        }
    }
}

// =============================================================================
// Ordering Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Listings come back newest first (date descending, id descending
    /// within a date) no matter the creation order of dates.
    #[test]
    fn listings_are_always_newest_first(
        days in prop::collection::vec(1u32..=28, 1..15),
    ) {
        let (engine, user, account) = ledger_with_account(Decimal::ZERO);

        for d in &days {
            engine
                .create_transaction(user, request(
                    TransactionKind::Income { account_id: account },
                    Decimal::ONE,
                    day(*d),
                ))
                .unwrap();
        }

        let rows = engine
            .list_transactions(&TransactionFilter::for_user(user))
            .unwrap();
        prop_assert_eq!(rows.len(), days.len());
        for pair in rows.windows(2) {
            let newer = &pair[0];
            let older = &pair[1];
            prop_assert!(
                newer.date > older.date
                    || (newer.date == older.date && newer.id > older.id),
                "rows out of order: {:?} before {:?}",
                newer.id,
                older.id
            );
        }
    }
}
