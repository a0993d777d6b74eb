use serde::{Deserialize, Deserializer, Serialize};

use crate::search::SearchStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub w: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub h: u32,
}

impl Rect {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    pub fn rotated(&self) -> Self {
        Self {
            w: self.h,
            h: self.w,
        }
    }

    pub fn is_square(&self) -> bool {
        self.w == self.h
    }

    pub fn long_side(&self) -> u32 {
        self.w.max(self.h)
    }

    pub fn short_side(&self) -> u32 {
        self.w.min(self.h)
    }

    /// Whether some orientation of this rectangle fits across a roll of `width`.
    pub fn fits_roll(&self, width: u32) -> bool {
        self.short_side() <= width
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// One rectangle type still waiting to be cut from the roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demand {
    pub rect: Rect,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub qty: u32,
}

impl Demand {
    pub fn new(w: u32, h: u32, qty: u32) -> Self {
        Self {
            rect: Rect::new(w, h),
            qty,
        }
    }

    /// Area still required by the remaining copies.
    pub fn remaining_area(&self) -> u64 {
        self.qty as u64 * self.rect.area()
    }
}

/// A rectangle placed on the roll. `rect` is the placed (possibly rotated) shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub item: usize,
    pub x: u32,
    pub y: u32,
    pub rect: Rect,
    pub rotated: bool,
}

impl Placement {
    pub fn left(&self) -> u32 {
        self.x
    }

    pub fn top(&self) -> u32 {
        self.y
    }

    /// One past the last occupied column.
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.rect.w)
    }

    /// One past the last occupied row.
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.rect.h)
    }

    pub fn overlaps(&self, other: &Placement) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The exhaustive search explored its whole tree.
    Complete,
    /// A node or time budget stopped the exhaustive search early.
    Truncated,
    /// Produced by a heuristic; no optimality claim.
    Heuristic,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete => write!(f, "complete"),
            Self::Truncated => write!(f, "truncated"),
            Self::Heuristic => write!(f, "heuristic"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    pub width: u32,
    pub length: u32,
    pub placements: Vec<Placement>,
    pub status: Status,
    pub elapsed_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SearchStats>,
}

impl Solution {
    pub fn placed_count(&self) -> usize {
        self.placements.len()
    }

    pub fn used_area(&self) -> u64 {
        self.placements.iter().map(|p| p.rect.area()).sum()
    }

    pub fn waste_percent(&self) -> f64 {
        let roll_area = self.width as u64 * self.length as u64;
        if roll_area == 0 {
            return 0.0;
        }
        (roll_area - self.used_area()) as f64 / roll_area as f64 * 100.0
    }
}

/// Accepts `3` as well as `3.0`; JSON clients often send integral floats.
pub fn deserialize_u32_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Number::deserialize(deserializer)?;
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).map_err(serde::de::Error::custom);
    }
    match value.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => Ok(f as u32),
        _ => Err(serde::de::Error::custom(format!(
            "expected a non-negative integer, got {value}"
        ))),
    }
}
