// This file is part of the product ImageTag.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::tagging::{Tag, TagCollection};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Cached copy of one image record owned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image_file: String,
    #[serde(default, deserialize_with = "deserialize_image_data")]
    pub image_data: TagCollection,
    #[serde(rename = "collectionId", default)]
    pub collection_id: String,
    #[serde(rename = "collectionName", default)]
    pub collection_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
}

/// One page of a list response.
#[derive(Debug, Deserialize)]
pub(crate) struct RecordPage {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(rename = "totalPages", default)]
    pub total_pages: u32,
    #[serde(default)]
    pub items: Vec<ImageRecord>,
}

fn first_page() -> u32 {
    1
}

#[derive(Serialize)]
pub(crate) struct TagPatch<'a> {
    pub image_data: &'a TagCollection,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImageDataWire {
    Tags(Vec<Tag>),
    Encoded(String),
    Missing(()),
}

// JSON fields arrive as an array, as a string holding an array (multipart
// uploads), or as null when never written.
fn deserialize_image_data<'de, D>(deserializer: D) -> Result<TagCollection, D::Error>
where
    D: Deserializer<'de>,
{
    match ImageDataWire::deserialize(deserializer)? {
        ImageDataWire::Tags(tags) => Ok(TagCollection::from(tags)),
        ImageDataWire::Encoded(raw) => decode_tag_string(&raw).map_err(de::Error::custom),
        ImageDataWire::Missing(()) => Ok(TagCollection::new()),
    }
}

pub(crate) fn decode_tag_string(raw: &str) -> Result<TagCollection, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(TagCollection::new());
    }
    serde_json::from_str::<Vec<Tag>>(raw).map(TagCollection::from)
}

pub(crate) fn encode_tag_string(tags: &TagCollection) -> Result<String, serde_json::Error> {
    serde_json::to_string(tags)
}
