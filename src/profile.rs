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

//! User profiles.
//!
//! A user may keep several profiles (personal, business, ...) and tag
//! transactions with one. Profile CRUD lives outside the ledger core; the
//! engine only reads profiles for ownership checks.

use crate::base::{ProfileId, UserId};
use serde::{Deserialize, Serialize};

/// A profile a transaction may be filed under.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    pub id: ProfileId,
    pub user_id: UserId,
    pub name: String,
}
