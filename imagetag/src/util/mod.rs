// This file is part of the product ImageTag.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod log_level_changer;
pub mod mime_helper;
pub mod test_fixtures;

pub use log_level_changer::{LevelRule, http_stack_rules, init_logger};
pub use mime_helper::detect_mime_type;
pub use test_fixtures::TestFixtureRoot;
