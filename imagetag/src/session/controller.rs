// This file is part of the product ImageTag.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::backend::{
    ImageRecord, NewImageRecord, RecordStore, SORT_BY_TITLE, SyncError, UploadFile, UploadPolicy,
    generate_record_id,
};
use crate::config::ValidatedConfig;
use crate::tagging::{ClickPosition, TagCollection, TagCoordinates, ViewportRect, map_click};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Loading,
    Ready,
    Mutating,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Applied,
    /// The selection moved on before the response arrived.
    Stale,
    /// Empty id; nothing is selected.
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    /// Blank tag name; nothing was sent.
    Skipped,
    /// Persisted, but the selection changed before the refetch landed.
    Stale,
}

#[derive(Debug, Clone)]
pub enum SessionError {
    Sync(SyncError),
    NotReady(SessionPhase),
    Busy(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Sync(error) => write!(f, "{}", error),
            SessionError::NotReady(phase) => {
                write!(f, "No image ready for changes (session is {:?})", phase)
            }
            SessionError::Busy(record_id) => {
                write!(f, "A tag update for record {} is still in flight", record_id)
            }
        }
    }
}

impl std::error::Error for SessionError {}

impl From<SyncError> for SessionError {
    fn from(error: SyncError) -> Self {
        SessionError::Sync(error)
    }
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub default_record_id: String,
    pub upload_policy: UploadPolicy,
}

impl From<&ValidatedConfig> for SessionSettings {
    fn from(config: &ValidatedConfig) -> Self {
        Self {
            default_record_id: config.session.default_record_id.clone(),
            upload_policy: config.upload_policy(),
        }
    }
}

/// Read-only view of the session for rendering.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub selected_id: String,
    pub generation: u64,
    pub record: Option<ImageRecord>,
    pub tags: TagCollection,
    pub file_url: Option<String>,
    pub clicked: TagCoordinates,
    pub last_error: Option<SyncError>,
}

struct SessionState {
    phase: SessionPhase,
    selected_id: String,
    generation: u64,
    record: Option<ImageRecord>,
    tags: TagCollection,
    file_url: Option<String>,
    clicked: TagCoordinates,
    last_error: Option<SyncError>,
    in_flight: HashSet<String>,
    /// Bumped whenever a mutation's refetch is applied.
    reconciled: u64,
}

impl SessionState {
    fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            selected_id: String::new(),
            generation: 0,
            record: None,
            tags: TagCollection::new(),
            file_url: None,
            clicked: TagCoordinates::default(),
            last_error: None,
            in_flight: HashSet::new(),
            reconciled: 0,
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            selected_id: self.selected_id.clone(),
            generation: self.generation,
            record: self.record.clone(),
            tags: self.tags.clone(),
            file_url: self.file_url.clone(),
            clicked: self.clicked,
            last_error: self.last_error.clone(),
        }
    }

    fn apply_record(&mut self, record: ImageRecord, file_url: String) {
        self.tags = self.tags.replace_all(record.image_data.clone());
        self.record = Some(record);
        self.file_url = Some(file_url);
        self.last_error = None;
        self.phase = SessionPhase::Ready;
    }

    fn fail(&mut self, error: SyncError) {
        self.last_error = Some(error);
        self.phase = SessionPhase::Error;
    }

    fn begin_mutation(&mut self) -> Result<MutationTicket, SessionError> {
        let record_id = match &self.record {
            Some(record) => record.id.clone(),
            None => return Err(SessionError::NotReady(self.phase)),
        };
        if self.in_flight.contains(&record_id) {
            return Err(SessionError::Busy(record_id));
        }
        if self.phase != SessionPhase::Ready {
            return Err(SessionError::NotReady(self.phase));
        }
        self.in_flight.insert(record_id.clone());
        self.phase = SessionPhase::Mutating;
        Ok(MutationTicket { record_id })
    }

    /// Reselecting the same record keeps the mutation current; its refetch
    /// was read after the update and is the freshest view of the record.
    fn is_current(&self, ticket: &MutationTicket) -> bool {
        self.selected_id == ticket.record_id
    }
}

struct MutationTicket {
    record_id: String,
}

enum MutationFailure {
    Persist(SyncError),
    Refetch(SyncError),
}

/// Owns the selected image, its optimistic tag state and every call to the
/// record store.
///
/// Each selection bumps a generation counter; responses carrying an older
/// generation are dropped. At most one tag mutation per record is in flight,
/// and its result is applied whenever that record is still selected. A
/// selection fetch that was in flight while such a result landed is dropped.
/// The state lock is never held across an `.await`.
pub struct ImageSession {
    store: Arc<dyn RecordStore>,
    settings: SessionSettings,
    state: Mutex<SessionState>,
}

impl ImageSession {
    pub fn new(store: Arc<dyn RecordStore>, settings: SessionSettings) -> Self {
        Self {
            store,
            settings,
            state: Mutex::new(SessionState::new()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Session state lock poisoned; continuing with last state");
            poisoned.into_inner()
        })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state().snapshot()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state().phase
    }

    pub fn selected_id(&self) -> String {
        self.state().selected_id.clone()
    }

    pub async fn start(&self) -> Result<SelectOutcome, SessionError> {
        let default_id = self.settings.default_record_id.clone();
        info!("Starting session with record {}", default_id);
        self.select(&default_id).await
    }

    pub async fn select(&self, id: &str) -> Result<SelectOutcome, SessionError> {
        let (generation, reconciled) = {
            let mut state = self.state();
            state.generation += 1;
            state.selected_id = id.to_string();
            state.record = None;
            state.tags = TagCollection::new();
            state.file_url = None;
            state.last_error = None;
            if id.is_empty() {
                state.phase = SessionPhase::Idle;
                return Ok(SelectOutcome::Cleared);
            }
            state.phase = SessionPhase::Loading;
            (state.generation, state.reconciled)
        };
        debug!("Loading record {} (generation {})", id, generation);

        let result = self.store.fetch_one(id).await.map(|record| {
            let file_url = self.store.file_url(&record);
            (record, file_url)
        });

        let mut state = self.state();
        if state.generation != generation {
            debug!(
                "Discarding response for record {} (generation {}, current {})",
                id, generation, state.generation
            );
            return Ok(SelectOutcome::Stale);
        }
        if state.reconciled != reconciled {
            debug!(
                "Record {} was refreshed by a tag update while loading; keeping that copy",
                id
            );
            return Ok(SelectOutcome::Applied);
        }
        match result {
            Ok((record, file_url)) => {
                debug!("Record {} ready with {} tags", id, record.image_data.len());
                state.apply_record(record, file_url);
                Ok(SelectOutcome::Applied)
            }
            Err(err) => {
                error!("Error fetching record {}: {}", id, err);
                state.fail(err.clone());
                Err(SessionError::Sync(err))
            }
        }
    }

    /// Records a click on the display square and returns its coordinates.
    pub fn click(&self, position: ClickPosition, rect: ViewportRect) -> TagCoordinates {
        let coordinates = map_click(position, rect);
        self.state().clicked = coordinates;
        coordinates
    }

    /// Appends a tag at the last clicked position, persists the collection
    /// and reconciles with the stored record.
    ///
    /// The new tag is visible locally while the update is in flight. If the
    /// update is rejected the local collection goes back to what it was; if
    /// only the refetch fails the persisted collection stays.
    pub async fn add_tag(&self, name: &str) -> Result<MutationOutcome, SessionError> {
        let (ticket, previous, updated) = {
            let mut state = self.state();
            let Some(updated) = state.tags.append(name, state.clicked) else {
                debug!("Ignoring tag with blank name");
                return Ok(MutationOutcome::Skipped);
            };
            let ticket = state.begin_mutation()?;
            let previous = std::mem::replace(&mut state.tags, updated.clone());
            (ticket, previous, updated)
        };
        debug!(
            "Adding tag to record {} ({} tags)",
            ticket.record_id,
            updated.len()
        );

        let result = self.persist_and_refetch(&ticket.record_id, &updated).await;
        self.finish_mutation(ticket, result, Some(previous))
    }

    /// Replaces the record's tags with the single example tag.
    pub async fn reset_tags(&self) -> Result<MutationOutcome, SessionError> {
        let ticket = self.state().begin_mutation()?;
        debug!("Resetting tags of record {}", ticket.record_id);

        let result = self
            .persist_and_refetch(&ticket.record_id, &TagCollection::default_collection())
            .await;
        self.finish_mutation(ticket, result, None)
    }

    async fn persist_and_refetch(
        &self,
        record_id: &str,
        tags: &TagCollection,
    ) -> Result<(ImageRecord, String), MutationFailure> {
        self.store
            .update_tags(record_id, tags)
            .await
            .map_err(MutationFailure::Persist)?;
        let record = self
            .store
            .fetch_one(record_id)
            .await
            .map_err(MutationFailure::Refetch)?;
        let file_url = self.store.file_url(&record);
        Ok((record, file_url))
    }

    fn finish_mutation(
        &self,
        ticket: MutationTicket,
        result: Result<(ImageRecord, String), MutationFailure>,
        rollback: Option<TagCollection>,
    ) -> Result<MutationOutcome, SessionError> {
        let mut state = self.state();
        state.in_flight.remove(&ticket.record_id);

        if !state.is_current(&ticket) {
            return match result {
                Ok(_) => {
                    debug!(
                        "Record {} updated after selection moved on; response discarded",
                        ticket.record_id
                    );
                    Ok(MutationOutcome::Stale)
                }
                Err(MutationFailure::Persist(err) | MutationFailure::Refetch(err)) => {
                    error!(
                        "Error updating tags of record {} (no longer selected): {}",
                        ticket.record_id, err
                    );
                    Err(SessionError::Sync(err))
                }
            };
        }

        match result {
            Ok((record, file_url)) => {
                state.apply_record(record, file_url);
                state.reconciled += 1;
                Ok(MutationOutcome::Applied)
            }
            Err(MutationFailure::Persist(err)) => {
                error!("Error updating tags of record {}: {}", ticket.record_id, err);
                if let Some(previous) = rollback {
                    state.tags = previous;
                }
                state.fail(err.clone());
                Err(SessionError::Sync(err))
            }
            Err(MutationFailure::Refetch(err)) => {
                error!(
                    "Tags of record {} saved but refetch failed: {}",
                    ticket.record_id, err
                );
                state.fail(err.clone());
                Err(SessionError::Sync(err))
            }
        }
    }

    /// Creates a record with a generated id and selects it.
    pub async fn upload(&self, title: &str, file: UploadFile) -> Result<ImageRecord, SessionError> {
        let id = generate_record_id();
        self.upload_with_id(&id, title, file).await
    }

    pub async fn upload_with_id(
        &self,
        id: &str,
        title: &str,
        file: UploadFile,
    ) -> Result<ImageRecord, SessionError> {
        if let Err(err) = self.settings.upload_policy.check(&file) {
            warn!("Upload of '{}' rejected: {}", file.file_name, err);
            self.state().last_error = Some(err.clone());
            return Err(SessionError::Sync(err));
        }

        let new_record = NewImageRecord {
            id: id.to_string(),
            title: title.to_string(),
            image_data: TagCollection::default_collection(),
            file,
        };
        let record = match self.store.create(new_record).await {
            Ok(record) => record,
            Err(err) => {
                error!("Error uploading file: {}", err);
                self.state().last_error = Some(err.clone());
                return Err(SessionError::Sync(err));
            }
        };
        info!("Created record {} ('{}')", record.id, record.title);

        self.select(id).await?;
        Ok(record)
    }

    /// All records ordered by title.
    pub async fn list_images(&self) -> Result<Vec<ImageRecord>, SessionError> {
        self.store.fetch_all(SORT_BY_TITLE).await.map_err(|err| {
            error!("Error fetching records: {}", err);
            SessionError::Sync(err)
        })
    }

    pub fn file_url(&self, record: &ImageRecord) -> String {
        self.store.file_url(record)
    }
}
