use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

pub const TOP_SENTINEL_ID: &str = "::top";
pub const BOTTOM_SENTINEL_ID: &str = "::bottom";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TrackKey {
    Top,
    Bottom,
    Item(String),
}

impl TrackKey {
    /// Maps a raw id onto a key, reserving the two sentinel ids.
    pub fn from_id(id: &str) -> Self {
        match id {
            TOP_SENTINEL_ID => Self::Top,
            BOTTOM_SENTINEL_ID => Self::Bottom,
            other => Self::Item(other.to_string()),
        }
    }
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => f.write_str(TOP_SENTINEL_ID),
            Self::Bottom => f.write_str(BOTTOM_SENTINEL_ID),
            Self::Item(id) => f.write_str(id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackedItem {
    pub id: String,
    pub rect: Rect,
}

impl TrackedItem {
    pub fn new(id: impl Into<String>, rect: Rect) -> Self {
        Self {
            id: id.into(),
            rect,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntersectionRecord {
    pub rect: Rect,
    pub intersection_ratio: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum IntersectionAction {
    Record {
        key: TrackKey,
        record: IntersectionRecord,
    },
    Forget {
        key: TrackKey,
    },
    Reset,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntersectionState {
    records: HashMap<TrackKey, IntersectionRecord>,
}

impl IntersectionState {
    pub fn reduce(mut self, action: IntersectionAction) -> Self {
        match action {
            IntersectionAction::Record { key, record } => {
                self.records.insert(key, record);
            }
            IntersectionAction::Forget { key } => {
                self.records.remove(&key);
            }
            IntersectionAction::Reset => self.records.clear(),
        }
        self
    }

    pub fn get(&self, key: &TrackKey) -> Option<&IntersectionRecord> {
        self.records.get(key)
    }

    /// Both sentinel records, once each has reported at least once.
    pub fn sentinels(&self) -> Option<(&IntersectionRecord, &IntersectionRecord)> {
        Some((self.get(&TrackKey::Top)?, self.get(&TrackKey::Bottom)?))
    }
}

/// Dead zone, in pixels, around the sentinel edges.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub top: f64,
    pub bottom: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            top: 10.0,
            bottom: 10.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Position {
    Top,
    Bottom,
    Inside,
}

impl Position {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Inside => "inside",
        }
    }

    pub fn classify(distance_top: f64, distance_bottom: f64, thresholds: Thresholds) -> Self {
        if distance_top < -thresholds.top {
            Self::Top
        } else if distance_bottom < -thresholds.bottom {
            Self::Bottom
        } else {
            Self::Inside
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedEntry {
    pub item: TrackedItem,
    pub distance_top: f64,
    pub distance_bottom: f64,
    pub position: Position,
}

pub fn classify(
    items: &[TrackedItem],
    state: &IntersectionState,
    thresholds: Thresholds,
) -> Vec<ClassifiedEntry> {
    let Some((top, bottom)) = state.sentinels() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let record = state.get(&TrackKey::Item(item.id.clone()))?;
            let distance_top = record.rect.top() - top.rect.bottom();
            let distance_bottom = bottom.rect.bottom() - record.rect.bottom();
            Some(ClassifiedEntry {
                item: item.clone(),
                distance_top,
                distance_bottom,
                position: Position::classify(distance_top, distance_bottom, thresholds),
            })
        })
        .collect()
}
