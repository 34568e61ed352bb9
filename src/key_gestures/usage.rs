use crate::key_gestures::detector::GestureOutcome;
use crate::key_gestures::direction::DirectionSlot;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const MAX_USAGE_ENTRIES: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GestureUsageEntry {
    pub timestamp: i64,
    pub key: String,
    pub slot: DirectionSlot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub success: bool,
}

/// Most recent resolved gestures, oldest first.
#[derive(Debug, Clone, Default)]
pub struct UsageLog {
    entries: VecDeque<GestureUsageEntry>,
}

impl UsageLog {
    pub fn record(&mut self, outcome: &GestureOutcome) {
        self.push(GestureUsageEntry {
            timestamp: Local::now().timestamp(),
            key: outcome.gesture.key.clone(),
            slot: outcome.gesture.slot,
            action: outcome.gesture.action.as_ref().map(ToString::to_string),
            success: outcome.dispatched,
        });
    }

    pub fn push(&mut self, entry: GestureUsageEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > MAX_USAGE_ENTRIES {
            self.entries.pop_front();
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &GestureUsageEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&GestureUsageEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn failures(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.action.is_some() && !entry.success)
            .count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
