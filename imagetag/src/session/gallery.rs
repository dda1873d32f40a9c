// This file is part of the product ImageTag.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::controller::{ImageSession, SelectOutcome, SessionError};
use log::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryEntry {
    pub id: String,
    pub title: String,
    pub file_url: String,
}

/// Thumbnail list of every image. It re-lists whenever the session's
/// selection changed since the last refresh, which also picks up new uploads.
#[derive(Debug, Default)]
pub struct GallerySelector {
    entries: Vec<GalleryEntry>,
    refreshed_for: Option<String>,
}

impl GallerySelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    /// Returns `Ok(true)` when a listing was fetched. On failure the
    /// previous entries stay in place.
    pub async fn refresh(&mut self, session: &ImageSession) -> Result<bool, SessionError> {
        let selected = session.selected_id();
        if self.refreshed_for.as_deref() == Some(selected.as_str()) {
            debug!("Gallery already current for selection {}", selected);
            return Ok(false);
        }
        self.force_refresh(session).await
    }

    pub async fn force_refresh(&mut self, session: &ImageSession) -> Result<bool, SessionError> {
        let selected = session.selected_id();
        match session.list_images().await {
            Ok(records) => {
                self.entries = records
                    .iter()
                    .map(|record| GalleryEntry {
                        id: record.id.clone(),
                        title: record.title.clone(),
                        file_url: session.file_url(record),
                    })
                    .collect();
                self.refreshed_for = Some(selected);
                debug!("Gallery holds {} images", self.entries.len());
                Ok(true)
            }
            Err(err) => {
                warn!("Gallery refresh failed; keeping previous entries");
                Err(err)
            }
        }
    }

    pub async fn choose(
        &self,
        session: &ImageSession,
        id: &str,
    ) -> Result<SelectOutcome, SessionError> {
        session.select(id).await
    }
}
