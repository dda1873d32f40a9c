// This file is part of the product ImageTag.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Image session state machine and the gallery that feeds it.

pub mod controller;
pub mod gallery;

pub use controller::{
    ImageSession, MutationOutcome, SelectOutcome, SessionError, SessionPhase, SessionSettings,
    SessionSnapshot,
};
pub use gallery::{GalleryEntry, GallerySelector};
