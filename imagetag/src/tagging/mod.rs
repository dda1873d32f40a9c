// This file is part of the product ImageTag.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Tag data model and click-to-coordinate mapping.

pub mod coords;
pub mod store;

pub use coords::{ClickPosition, VIEWPORT_SIZE, ViewportRect, map_click};
pub use store::{Tag, TagCollection, TagCoordinates};
