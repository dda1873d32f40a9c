// This file is part of the product ImageTag.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Record sync client for the external image record service.
//!
//! Tag collections cross the wire here and only here: the multipart upload
//! carries them as a JSON string, record reads may return either form, and
//! everything above this module sees a [`TagCollection`](crate::tagging::TagCollection).

pub mod client;
pub mod errors;
pub mod records;
pub mod upload;

pub use client::{HttpRecordClient, NewImageRecord, RecordStore, SORT_BY_TITLE};
pub use errors::{SyncError, SyncErrorKind, SyncResult};
pub use records::ImageRecord;
pub use upload::{UploadFile, UploadPolicy, generate_record_id};
