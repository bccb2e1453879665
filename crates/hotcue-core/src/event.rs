use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{CueColor, HotcueType};

/// One hotcue firing on a deck, as reported by the DJ application.
///
/// Field names are camelCase on the wire; the PascalCase spellings emitted by
/// older plugin builds are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotcueEvent {
    #[serde(alias = "Deck")]
    pub deck: i32,
    #[serde(alias = "HotCueType")]
    pub hot_cue_type: HotcueType,
    #[serde(default, alias = "CueName")]
    pub cue_name: String,
    #[serde(alias = "CueColor")]
    pub cue_color: CueColor,
    #[serde(default, alias = "EventType")]
    pub event_type: String,
    #[serde(default, alias = "Timestamp", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, alias = "Metadata", skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl HotcueEvent {
    pub fn new(
        deck: i32,
        hot_cue_type: HotcueType,
        cue_color: CueColor,
        cue_name: impl Into<String>,
    ) -> Self {
        Self {
            deck,
            hot_cue_type,
            cue_name: cue_name.into(),
            cue_color,
            event_type: String::new(),
            timestamp: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Fill in the arrival time if the sender did not supply one.
    pub fn stamped(mut self, arrived_at: DateTime<Utc>) -> Self {
        self.timestamp.get_or_insert(arrived_at);
        self
    }
}
