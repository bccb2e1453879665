//! Trigger rules and their actions.
//!
//! A [`Trigger`] is serialised verbatim as the payload of every network send,
//! so its field names are part of the wire contract with downstream apps.
//! Downstream apps compare payloads byte for byte against the encoding the
//! configuration tools produce: map keys are ordered by their string form and
//! absent maps or lists are written as `null`.

use serde::de::value::StrDeserializer;
use serde::de::IntoDeserializer;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::types::{AppId, CueColor, CueMatchType, HotcueType};

// ---------------------------------------------------------------------------
// TriggerAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerAction {
    pub app_id: AppId,
    pub action_type: String,
    #[serde(default)]
    pub args: Option<BTreeMap<String, String>>,
}

impl TriggerAction {
    pub fn new(app_id: impl Into<AppId>, action_type: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            action_type: action_type.into(),
            args: None,
        }
    }

    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args.as_ref()?.get(name).map(String::as_str)
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.args
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Trigger
// ---------------------------------------------------------------------------

/// A matching rule. Each set is a membership map: a key is a member only when
/// it maps to `true`, and an empty or absent map accepts nothing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    #[serde(default, serialize_with = "ordered_set")]
    pub hot_cue_type: Option<BTreeMap<HotcueType, bool>>,
    /// `None` when the rule never named a match type; written back as `""`.
    #[serde(default, with = "match_type")]
    pub cue_match_type: Option<CueMatchType>,
    #[serde(default, serialize_with = "ordered_set")]
    pub cue_color: Option<BTreeMap<CueColor, bool>>,
    #[serde(default, serialize_with = "ordered_set")]
    pub decks: Option<BTreeMap<i32, bool>>,
    #[serde(default)]
    pub cue_name: String,
    #[serde(default)]
    pub actions: Option<Vec<TriggerAction>>,
}

impl Trigger {
    pub fn accepts_type(&self, hotcue_type: HotcueType) -> bool {
        is_member(&self.hot_cue_type, &hotcue_type)
    }

    pub fn accepts_color(&self, color: CueColor) -> bool {
        is_member(&self.cue_color, &color)
    }

    pub fn accepts_deck(&self, deck: i32) -> bool {
        is_member(&self.decks, &deck)
    }

    pub fn accepts_cue_name(&self, cue_name: &str) -> bool {
        self.match_type().accepts(&self.cue_name, cue_name)
    }

    /// The effective match type; an unnamed one compares nothing.
    pub fn match_type(&self) -> CueMatchType {
        self.cue_match_type.unwrap_or_default()
    }

    pub fn actions(&self) -> &[TriggerAction] {
        self.actions.as_deref().unwrap_or_default()
    }

    /// Handles to every action, each bound to this trigger.
    pub fn action_refs(self: &Arc<Self>) -> impl Iterator<Item = ActionRef> + '_ {
        (0..self.actions().len()).map(move |index| ActionRef {
            trigger: Arc::clone(self),
            index,
        })
    }

    // Builder helpers, mostly for tests and the CLI's dry-run output.

    pub fn with_type(mut self, hotcue_type: HotcueType) -> Self {
        self.hot_cue_type
            .get_or_insert_with(BTreeMap::new)
            .insert(hotcue_type, true);
        self
    }

    pub fn with_color(mut self, color: CueColor) -> Self {
        self.cue_color
            .get_or_insert_with(BTreeMap::new)
            .insert(color, true);
        self
    }

    pub fn with_deck(mut self, deck: i32) -> Self {
        self.decks.get_or_insert_with(BTreeMap::new).insert(deck, true);
        self
    }

    pub fn with_cue_name(mut self, match_type: CueMatchType, name: impl Into<String>) -> Self {
        self.cue_match_type = Some(match_type);
        self.cue_name = name.into();
        self
    }

    pub fn with_action(mut self, action: TriggerAction) -> Self {
        self.actions.get_or_insert_with(Vec::new).push(action);
        self
    }
}

fn is_member<K: Ord>(set: &Option<BTreeMap<K, bool>>, key: &K) -> bool {
    set.as_ref()
        .and_then(|set| set.get(key))
        .copied()
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Wire encoding
// ---------------------------------------------------------------------------

/// The string a set key is written as. Colors and decks go out as their
/// decimal number, never a display name.
trait WireKey {
    fn wire_key(&self) -> String;
}

impl WireKey for HotcueType {
    fn wire_key(&self) -> String {
        self.as_str().to_owned()
    }
}

impl WireKey for CueColor {
    fn wire_key(&self) -> String {
        self.0.to_string()
    }
}

impl WireKey for i32 {
    fn wire_key(&self) -> String {
        self.to_string()
    }
}

// `BTreeMap<String, _>` orders bytewise, so 1024 sorts before 64.
fn ordered_set<K, S>(set: &Option<BTreeMap<K, bool>>, serializer: S) -> Result<S::Ok, S::Error>
where
    K: WireKey,
    S: Serializer,
{
    match set {
        None => serializer.serialize_none(),
        Some(set) => set
            .iter()
            .map(|(key, member)| (key.wire_key(), *member))
            .collect::<BTreeMap<String, bool>>()
            .serialize(serializer),
    }
}

mod match_type {
    use super::*;

    pub(super) fn serialize<S: Serializer>(
        value: &Option<CueMatchType>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.map(CueMatchType::as_str).unwrap_or(""))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<CueMatchType>, D::Error> {
        match Option::<String>::deserialize(deserializer)?.as_deref() {
            None | Some("") => Ok(None),
            Some(name) => {
                let name: StrDeserializer<'_, D::Error> = name.into_deserializer();
                CueMatchType::deserialize(name).map(Some)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ActionRef
// ---------------------------------------------------------------------------

/// An action together with a shared handle to the trigger that owns it.
///
/// Holding the `Arc` keeps the owning trigger alive for in-flight sends even
/// after the snapshot it came from has been replaced.
#[derive(Debug, Clone)]
pub struct ActionRef {
    trigger: Arc<Trigger>,
    index: usize,
}

impl ActionRef {
    pub fn action(&self) -> &TriggerAction {
        &self.trigger.actions()[self.index]
    }

    pub fn app_id(&self) -> &AppId {
        &self.action().app_id
    }

    pub fn trigger(&self) -> &Arc<Trigger> {
        &self.trigger
    }

    /// Position of the action within its trigger's action list.
    pub fn index(&self) -> usize {
        self.index
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Trigger {
        Trigger::default()
            .with_type(HotcueType::HotCue)
            .with_color(CueColor::RED)
            .with_deck(1)
            .with_cue_name(CueMatchType::Exact, "Drop")
            .with_action(
                TriggerAction::new(AppId::HTTP_ENDPOINT, "SendRequest").with_arg("path", "/drop"),
            )
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["hotCueType"]["Hot_Cue"], true);
        assert_eq!(value["cueMatchType"], "Exact");
        assert_eq!(value["cueColor"]["64"], true);
        assert_eq!(value["decks"]["1"], true);
        assert_eq!(value["cueName"], "Drop");
        assert_eq!(value["actions"][0]["appId"], "HttpEndpoint");
        assert_eq!(value["actions"][0]["actionType"], "SendRequest");
        assert_eq!(value["actions"][0]["args"]["path"], "/drop");
    }

    #[test]
    fn deserializes_payload_from_config_push() {
        let json = r#"{
            "hotCueType": {"Hot_Cue": true, "Saved_Loop": false},
            "cueMatchType": "StartsWith",
            "cueColor": {"64": true, "1024": false},
            "decks": {"1": true, "2": false},
            "cueName": "Dr",
            "actions": [{"appId": "OBS", "actionType": "ChangeToScene", "args": {"sceneName": "Main"}}]
        }"#;
        let trigger: Trigger = serde_json::from_str(json).unwrap();
        assert!(trigger.accepts_type(HotcueType::HotCue));
        assert!(!trigger.accepts_type(HotcueType::SavedLoop));
        assert!(trigger.accepts_color(CueColor::RED));
        assert!(!trigger.accepts_color(CueColor::GREEN));
        assert!(trigger.accepts_deck(1));
        assert!(!trigger.accepts_deck(2));
        assert_eq!(trigger.cue_match_type, Some(CueMatchType::StartsWith));
        assert_eq!(trigger.actions()[0].arg("sceneName"), Some("Main"));
    }

    #[test]
    fn missing_sets_accept_nothing() {
        let trigger: Trigger = serde_json::from_str("{}").unwrap();
        assert!(!trigger.accepts_type(HotcueType::HotCue));
        assert!(!trigger.accepts_color(CueColor::RED));
        assert!(!trigger.accepts_deck(1));
        assert!(trigger.actions().is_empty());
        assert_eq!(trigger.match_type(), CueMatchType::None);
    }

    #[test]
    fn absent_fields_are_written_as_null() {
        let trigger: Trigger = serde_json::from_str(r#"{"actions": [{"appId": "OBS", "actionType": "Mute"}]}"#).unwrap();
        assert_eq!(
            serde_json::to_string(&trigger).unwrap(),
            r#"{"hotCueType":null,"cueMatchType":"","cueColor":null,"decks":null,"cueName":"","actions":[{"appId":"OBS","actionType":"Mute","args":null}]}"#
        );

        let empty = Trigger {
            decks: Some(BTreeMap::new()),
            actions: Some(Vec::new()),
            ..Trigger::default()
        };
        let value = serde_json::to_value(&empty).unwrap();
        assert_eq!(value["decks"], serde_json::json!({}));
        assert_eq!(value["actions"], serde_json::json!([]));
        assert!(value["cueColor"].is_null());
    }

    #[test]
    fn set_keys_are_ordered_as_strings() {
        let trigger = Trigger::default()
            .with_type(HotcueType::HotCue)
            .with_type(HotcueType::Action)
            .with_color(CueColor::RED)
            .with_color(CueColor::GREEN)
            .with_deck(1)
            .with_deck(2)
            .with_deck(10);
        let json = serde_json::to_string(&trigger).unwrap();
        assert!(json.contains(r#""hotCueType":{"Action":true,"Hot_Cue":true}"#), "{json}");
        assert!(json.contains(r#""cueColor":{"1024":true,"64":true}"#), "{json}");
        assert!(json.contains(r#""decks":{"1":true,"10":true,"2":true}"#), "{json}");
    }

    #[test]
    fn negative_deck_is_accepted_but_never_matches_a_real_deck() {
        let trigger: Trigger = serde_json::from_str(r#"{"decks": {"-1": true}}"#).unwrap();
        assert!(trigger.accepts_deck(-1));
        assert!(!trigger.accepts_deck(1));
        assert!(!trigger.accepts_deck(0));
        assert_eq!(serde_json::to_value(&trigger).unwrap()["decks"]["-1"], true);
    }

    #[test]
    fn empty_match_type_reads_as_unnamed() {
        let trigger: Trigger = serde_json::from_str(r#"{"cueMatchType": "", "cueName": "x"}"#).unwrap();
        assert_eq!(trigger.cue_match_type, None);
        assert!(trigger.accepts_cue_name("anything"));

        let named: Trigger = serde_json::from_str(r#"{"cueMatchType": "None"}"#).unwrap();
        assert_eq!(serde_json::to_value(&named).unwrap()["cueMatchType"], "None");
    }

    #[test]
    fn unknown_match_type_is_rejected() {
        let err = serde_json::from_str::<Trigger>(r#"{"cueMatchType": "Fuzzy"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn action_refs_point_back_to_owner() {
        let trigger = Arc::new(
            sample().with_action(TriggerAction::new(AppId::UDP_ENDPOINT, "SendRequest")),
        );
        let refs: Vec<ActionRef> = trigger.action_refs().collect();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].index(), 1);
        assert_eq!(refs[1].app_id(), "UdpEndpoint");
        assert!(Arc::ptr_eq(refs[0].trigger(), &trigger));
        assert!(Arc::ptr_eq(refs[1].trigger(), &trigger));
    }
}
