// This file is part of the product ImageTag.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::{Deserialize, Serialize};

pub const EXAMPLE_TAG_NAME: &str = "Example Tag";
pub const EXAMPLE_TAG_X: i32 = 20;
pub const EXAMPLE_TAG_Y: i32 = 30;

/// Percentage offsets inside the display square.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCoordinates {
    pub x: i32,
    pub y: i32,
}

impl TagCoordinates {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub coordinates: TagCoordinates,
}

impl Tag {
    pub fn new(name: impl Into<String>, coordinates: TagCoordinates) -> Self {
        Self {
            name: name.into(),
            coordinates,
        }
    }

    /// The seed tag placed on every new upload and restored by a reset.
    pub fn example() -> Self {
        Self::new(
            EXAMPLE_TAG_NAME,
            TagCoordinates::new(EXAMPLE_TAG_X, EXAMPLE_TAG_Y),
        )
    }
}

/// Ordered tag list of one image. Tags carry no identity beyond their
/// position, so duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagCollection {
    tags: Vec<Tag>,
}

impl TagCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_collection() -> Self {
        Self {
            tags: vec![Tag::example()],
        }
    }

    /// Returns a copy with a new tag at the end, or `None` when the trimmed
    /// name is empty. `None` means nothing changed and nothing must be
    /// persisted.
    pub fn append(&self, name: &str, coordinates: TagCoordinates) -> Option<TagCollection> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let mut tags = self.tags.clone();
        tags.push(Tag::new(name, coordinates));
        Some(Self { tags })
    }

    /// Appends every tag in order, skipping blank names.
    pub fn append_all<I>(&self, tags: I) -> TagCollection
    where
        I: IntoIterator<Item = Tag>,
    {
        tags.into_iter().fold(self.clone(), |collection, tag| {
            collection
                .append(&tag.name, tag.coordinates)
                .unwrap_or(collection)
        })
    }

    pub fn replace_all(&self, new_collection: TagCollection) -> TagCollection {
        new_collection
    }

    pub fn as_slice(&self) -> &[Tag] {
        &self.tags
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl From<Vec<Tag>> for TagCollection {
    fn from(tags: Vec<Tag>) -> Self {
        Self { tags }
    }
}

impl FromIterator<Tag> for TagCollection {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TagCollection {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}
