// This file is part of the product ImageTag.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncErrorKind {
    Network,
    NotFound,
    Validation,
    Conflict,
    InvalidResponse,
}

#[derive(Debug, Clone)]
pub struct SyncError {
    kind: SyncErrorKind,
    record_id: Option<String>,
    message: String,
}

impl SyncError {
    pub fn new(kind: SyncErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            record_id: None,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(SyncErrorKind::Network, message)
    }

    pub fn not_found(record_id: &str) -> Self {
        Self::new(SyncErrorKind::NotFound, "record not found").with_record(record_id)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(SyncErrorKind::Validation, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(SyncErrorKind::InvalidResponse, message)
    }

    pub fn kind(&self) -> SyncErrorKind {
        self.kind
    }

    pub fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn with_record(mut self, record_id: &str) -> Self {
        self.record_id = Some(record_id.to_string());
        self
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.record_id {
            Some(record_id) => write!(
                f,
                "{:?} error for record {}: {}",
                self.kind, record_id, self.message
            ),
            None => write!(f, "{:?} error: {}", self.kind, self.message),
        }
    }
}

impl Error for SyncError {}

impl From<reqwest::Error> for SyncError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            SyncError::invalid_response(error.to_string())
        } else {
            SyncError::network(error.to_string())
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
