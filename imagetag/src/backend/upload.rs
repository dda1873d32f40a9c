// This file is part of the product ImageTag.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::errors::{SyncError, SyncResult};
use crate::util::detect_mime_type;
use std::path::Path;
use uuid::Uuid;

pub const RECORD_ID_LEN: usize = 15;
const RECORD_ID_SPACE: u128 = 1_000_000;

pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp"];

/// Image bytes picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> SyncResult<Self> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            SyncError::validation(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                SyncError::validation(format!("'{}' has no usable file name", path.display()))
            })?
            .to_string();
        let mime = detect_mime_type(path, &bytes);
        Ok(Self::new(file_name, mime, bytes))
    }
}

/// Limits applied before an upload leaves the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_file_size_mb: u64, // 0 means unlimited
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size_mb: 10,
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|mime| mime.to_string())
                .collect(),
        }
    }
}

impl UploadPolicy {
    pub fn check(&self, file: &UploadFile) -> SyncResult<()> {
        if file.bytes.is_empty() {
            return Err(SyncError::validation(format!(
                "'{}' is empty",
                file.file_name
            )));
        }
        if !self
            .allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&file.mime))
        {
            return Err(SyncError::validation(format!(
                "Unsupported file type '{}' for '{}'",
                file.mime, file.file_name
            )));
        }
        if self.max_file_size_mb > 0 {
            let max_bytes = self.max_file_size_mb.saturating_mul(1024 * 1024);
            if file.bytes.len() as u64 > max_bytes {
                return Err(SyncError::validation(format!(
                    "'{}' exceeds the {} MB upload limit",
                    file.file_name, self.max_file_size_mb
                )));
            }
        }
        Ok(())
    }
}

/// Random id in the backend's 15-character format: a number below one
/// million, zero padded.
pub fn generate_record_id() -> String {
    let value = Uuid::new_v4().as_u128() % RECORD_ID_SPACE;
    format!("{:0width$}", value, width = RECORD_ID_LEN)
}
