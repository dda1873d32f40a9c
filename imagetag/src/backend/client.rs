// This file is part of the product ImageTag.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::errors::{SyncError, SyncErrorKind, SyncResult};
use super::records::{ImageRecord, RecordPage, TagPatch, encode_tag_string};
use super::upload::UploadFile;
use crate::config::BackendConfig;
use crate::tagging::TagCollection;
use async_trait::async_trait;
use log::{debug, trace};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

const USER_AGENT: &str = concat!("imagetag/", env!("CARGO_PKG_VERSION"));

/// Field the gallery sorts by.
pub const SORT_BY_TITLE: &str = "title";

/// A record about to be created.
#[derive(Debug, Clone)]
pub struct NewImageRecord {
    pub id: String,
    pub title: String,
    pub image_data: TagCollection,
    pub file: UploadFile,
}

/// Record CRUD against the backend data service. Each call is one
/// independent round-trip with no retry and no caching.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_one(&self, id: &str) -> SyncResult<ImageRecord>;

    async fn fetch_all(&self, sort: &str) -> SyncResult<Vec<ImageRecord>>;

    async fn update_tags(&self, id: &str, tags: &TagCollection) -> SyncResult<()>;

    async fn create(&self, record: NewImageRecord) -> SyncResult<ImageRecord>;

    /// Retrieval URL of the record's image file.
    fn file_url(&self, record: &ImageRecord) -> String;
}

#[derive(Clone)]
pub struct HttpRecordClient {
    client: Client,
    base: Url,
    collection: String,
    page_size: u32,
}

impl HttpRecordClient {
    pub fn new(config: &BackendConfig) -> SyncResult<Self> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            SyncError::validation(format!("Invalid backend URL '{}': {}", config.base_url, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(SyncError::validation(format!(
                "Backend URL '{}' cannot be used as a base",
                config.base_url
            )));
        }

        let mut builder = Client::builder().user_agent(USER_AGENT);
        if config.timeout_seconds > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_seconds));
        }
        let client = builder
            .build()
            .map_err(|e| SyncError::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base,
            collection: config.collection.clone(),
            page_size: config.list_page_size,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn records_url(&self) -> Url {
        self.endpoint(&["api", "collections", &self.collection, "records"])
    }

    fn record_url(&self, id: &str) -> Url {
        self.endpoint(&["api", "collections", &self.collection, "records", id])
    }

    async fn fetch_page(&self, sort: &str, page: u32) -> SyncResult<RecordPage> {
        let url = self.records_url();
        trace!("GET {} (sort={}, page={})", url, sort, page);
        let response = self
            .client
            .get(url)
            .query(&[
                ("sort", sort.to_string()),
                ("page", page.to_string()),
                ("perPage", self.page_size.to_string()),
            ])
            .send()
            .await?;
        let response = check_status(response, None).await?;
        Ok(response.json::<RecordPage>().await?)
    }
}

#[async_trait]
impl RecordStore for HttpRecordClient {
    async fn fetch_one(&self, id: &str) -> SyncResult<ImageRecord> {
        let url = self.record_url(id);
        trace!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SyncError::from(e).with_record(id))?;
        let response = check_status(response, Some(id)).await?;
        response
            .json::<ImageRecord>()
            .await
            .map_err(|e| SyncError::from(e).with_record(id))
    }

    async fn fetch_all(&self, sort: &str) -> SyncResult<Vec<ImageRecord>> {
        let mut records = Vec::new();
        let mut page = 1;
        loop {
            let result = self.fetch_page(sort, page).await?;
            let received = result.items.len();
            records.extend(result.items);
            if received == 0
                || received < self.page_size as usize
                || result.page >= result.total_pages
            {
                break;
            }
            page = result.page + 1;
        }
        debug!("Listed {} records sorted by {}", records.len(), sort);
        Ok(records)
    }

    async fn update_tags(&self, id: &str, tags: &TagCollection) -> SyncResult<()> {
        let url = self.record_url(id);
        trace!("PATCH {} ({} tags)", url, tags.len());
        let response = self
            .client
            .patch(url)
            .json(&TagPatch { image_data: tags })
            .send()
            .await
            .map_err(|e| SyncError::from(e).with_record(id))?;
        check_status(response, Some(id)).await?;
        Ok(())
    }

    async fn create(&self, record: NewImageRecord) -> SyncResult<ImageRecord> {
        let encoded_tags = encode_tag_string(&record.image_data).map_err(|e| {
            SyncError::validation(format!("Failed to encode tags: {}", e)).with_record(&record.id)
        })?;
        let file_part = Part::bytes(record.file.bytes)
            .file_name(record.file.file_name.clone())
            .mime_str(&record.file.mime)
            .map_err(|e| {
                SyncError::validation(format!(
                    "Invalid MIME type '{}': {}",
                    record.file.mime, e
                ))
                .with_record(&record.id)
            })?;
        let form = Form::new()
            .text("title", record.title)
            .text("id", record.id.clone())
            .text("image_data", encoded_tags)
            .part("image_file", file_part);

        let url = self.records_url();
        trace!("POST {} (id={})", url, record.id);
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SyncError::from(e).with_record(&record.id))?;
        let response = check_status(response, Some(&record.id)).await?;
        let created = response
            .json::<ImageRecord>()
            .await
            .map_err(|e| SyncError::from(e).with_record(&record.id))?;
        debug!("Created record {} ({})", created.id, created.image_file);
        Ok(created)
    }

    fn file_url(&self, record: &ImageRecord) -> String {
        self.endpoint(&[
            "api",
            "files",
            &record.collection_id,
            &record.id,
            &record.image_file,
        ])
        .to_string()
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

async fn check_status(response: Response, record_id: Option<&str>) -> SyncResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .map(|body| body.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status));

    let error = SyncError::new(kind_for_status(status), message);
    Err(match record_id {
        Some(id) => error.with_record(id),
        None => error,
    })
}

pub(crate) fn kind_for_status(status: StatusCode) -> SyncErrorKind {
    match status {
        StatusCode::NOT_FOUND => SyncErrorKind::NotFound,
        StatusCode::BAD_REQUEST => SyncErrorKind::Validation,
        StatusCode::CONFLICT => SyncErrorKind::Conflict,
        _ => SyncErrorKind::Network,
    }
}
