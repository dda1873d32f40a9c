// This file is part of the product ImageTag.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod backend;
pub mod config;
pub mod session;
pub mod shell;
pub mod tagging;
pub mod util;
