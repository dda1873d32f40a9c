// This file is part of the product ImageTag.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::path::Path;

pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Detect MIME type from the file's magic bytes, falling back to its extension
pub fn detect_mime_type(file_path: &Path, file_content: &[u8]) -> String {
    if let Some(mime_type) = infer::get(file_content) {
        return mime_type.mime_type().to_string();
    }

    let mime_guess = mime_guess::from_path(file_path);
    if let Some(mime_type) = mime_guess.first() {
        return mime_type.to_string();
    }

    FALLBACK_MIME_TYPE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn content_wins_over_extension() {
        assert_eq!(detect_mime_type(Path::new("photo.jpg"), PNG_MAGIC), "image/png");
    }

    #[test]
    fn extension_used_when_content_unknown() {
        assert_eq!(detect_mime_type(Path::new("photo.webp"), b"??"), "image/webp");
    }

    #[test]
    fn unknown_everything_falls_back() {
        assert_eq!(detect_mime_type(Path::new("blob"), b"??"), FALLBACK_MIME_TYPE);
    }
}
