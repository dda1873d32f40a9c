// This file is part of the product ImageTag.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::store::TagCoordinates;

/// Edge length of the square the image is displayed in.
pub const VIEWPORT_SIZE: f64 = 600.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickPosition {
    pub x: f64,
    pub y: f64,
}

impl ClickPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding rectangle of the display square in the same space as the click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewportRect {
    pub fn at(left: f64, top: f64) -> Self {
        Self {
            left,
            top,
            width: VIEWPORT_SIZE,
            height: VIEWPORT_SIZE,
        }
    }
}

impl Default for ViewportRect {
    fn default() -> Self {
        Self::at(0.0, 0.0)
    }
}

/// Converts a click into whole-percent offsets inside the display square.
///
/// The divisor is always [`VIEWPORT_SIZE`]; the rectangle only supplies the
/// origin. Clicks outside the square are not clamped.
pub fn map_click(click: ClickPosition, rect: ViewportRect) -> TagCoordinates {
    TagCoordinates::new(
        to_percent(click.x - rect.left),
        to_percent(click.y - rect.top),
    )
}

fn to_percent(offset: f64) -> i32 {
    round_half_up(offset / VIEWPORT_SIZE * 100.0) as i32
}

// Half-way values go up (-2.5 -> -2), not away from zero.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(x: f64, y: f64) -> TagCoordinates {
        map_click(ClickPosition::new(x, y), ViewportRect::default())
    }

    #[test]
    fn corners_and_center() {
        assert_eq!(map(0.0, 0.0), TagCoordinates::new(0, 0));
        assert_eq!(map(600.0, 600.0), TagCoordinates::new(100, 100));
        assert_eq!(map(300.0, 300.0), TagCoordinates::new(50, 50));
    }

    #[test]
    fn offsets_are_relative_to_rect_origin() {
        let rect = ViewportRect::at(120.0, 45.5);
        let coords = map_click(ClickPosition::new(270.0, 225.5), rect);
        assert_eq!(coords, TagCoordinates::new(25, 30));
    }

    #[test]
    fn rounds_to_nearest_percent() {
        // 3px = 0.5%, 9px = 1.5%, 10px = 1.666%
        assert_eq!(map(3.0, 9.0), TagCoordinates::new(1, 2));
        assert_eq!(map(10.0, 2.0), TagCoordinates::new(2, 0));
    }

    #[test]
    fn every_position_inside_viewport_stays_in_range() {
        let mut px = 0.0;
        while px <= VIEWPORT_SIZE {
            let coords = map(px, VIEWPORT_SIZE - px);
            assert!((0..=100).contains(&coords.x), "x out of range at {px}");
            assert!((0..=100).contains(&coords.y), "y out of range at {px}");
            px += 0.75;
        }
    }

    #[test]
    fn negative_half_rounds_up() {
        assert_eq!(map(-3.0, -9.0), TagCoordinates::new(0, -1));
    }
}
