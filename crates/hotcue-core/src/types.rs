use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

// ---------------------------------------------------------------------------
// HotcueType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HotcueType {
    #[serde(rename = "Hot_Cue")]
    HotCue,
    Action,
    #[serde(rename = "BeatGrid_Anchor")]
    BeatGridAnchor,
    #[serde(rename = "Load_Point")]
    LoadPoint,
    #[serde(rename = "Saved_Loop")]
    SavedLoop,
    #[serde(rename = "Remix_Point")]
    RemixPoint,
    #[serde(rename = "Automix_Point")]
    AutomixPoint,
}

impl HotcueType {
    pub fn all() -> &'static [HotcueType] {
        &[
            HotcueType::HotCue,
            HotcueType::Action,
            HotcueType::BeatGridAnchor,
            HotcueType::LoadPoint,
            HotcueType::SavedLoop,
            HotcueType::RemixPoint,
            HotcueType::AutomixPoint,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HotcueType::HotCue => "Hot_Cue",
            HotcueType::Action => "Action",
            HotcueType::BeatGridAnchor => "BeatGrid_Anchor",
            HotcueType::LoadPoint => "Load_Point",
            HotcueType::SavedLoop => "Saved_Loop",
            HotcueType::RemixPoint => "Remix_Point",
            HotcueType::AutomixPoint => "Automix_Point",
        }
    }
}

impl fmt::Display for HotcueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CueColor
// ---------------------------------------------------------------------------

/// A cue color as a single-bit flag. Travels as a plain integer on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CueColor(pub u16);

impl CueColor {
    pub const INVISIBLE: CueColor = CueColor(1);
    pub const DARK_GREY: CueColor = CueColor(2);
    pub const LIGHT_GREY: CueColor = CueColor(4);
    pub const WHITE: CueColor = CueColor(8);
    pub const BURGUNDY: CueColor = CueColor(16);
    pub const APRICOT: CueColor = CueColor(32);
    pub const RED: CueColor = CueColor(64);
    pub const ORANGE: CueColor = CueColor(128);
    pub const YELLOW: CueColor = CueColor(256);
    pub const EGGSHELL: CueColor = CueColor(512);
    pub const GREEN: CueColor = CueColor(1024);
    pub const CYAN: CueColor = CueColor(2048);
    pub const COBALT: CueColor = CueColor(4096);
    pub const BLUE: CueColor = CueColor(8192);
    pub const PURPLE: CueColor = CueColor(16384);
    pub const MAGENTA: CueColor = CueColor(32768);

    /// Palette name, or `None` for values outside the known flags.
    pub fn name(self) -> Option<&'static str> {
        let name = match self.0 {
            1 => "Invisible",
            2 => "DarkGrey",
            4 => "LightGrey",
            8 => "White",
            16 => "Burgundy",
            32 => "Apricot",
            64 => "Red",
            128 => "Orange",
            256 => "Yellow",
            512 => "Eggshell",
            1024 => "Green",
            2048 => "Cyan",
            4096 => "Cobalt",
            8192 => "Blue",
            16384 => "Purple",
            32768 => "Magenta",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for CueColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

// ---------------------------------------------------------------------------
// CueMatchType
// ---------------------------------------------------------------------------

/// How a trigger's reference cue name is compared against an event's cue name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CueMatchType {
    #[default]
    None,
    Exact,
    Contains,
    StartsWith,
    EndsWith,
    Embedded,
}

impl CueMatchType {
    /// Case-sensitive comparison of `cue_name` against `reference`.
    pub fn accepts(self, reference: &str, cue_name: &str) -> bool {
        match self {
            CueMatchType::None => true,
            CueMatchType::Exact => cue_name == reference,
            CueMatchType::Contains | CueMatchType::Embedded => cue_name.contains(reference),
            CueMatchType::StartsWith => cue_name.starts_with(reference),
            CueMatchType::EndsWith => cue_name.ends_with(reference),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CueMatchType::None => "None",
            CueMatchType::Exact => "Exact",
            CueMatchType::Contains => "Contains",
            CueMatchType::StartsWith => "StartsWith",
            CueMatchType::EndsWith => "EndsWith",
            CueMatchType::Embedded => "Embedded",
        }
    }
}

impl fmt::Display for CueMatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AppId
// ---------------------------------------------------------------------------

/// Identity of a downstream application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(String);

impl AppId {
    pub const OBS: &'static str = "OBS";
    pub const LIGHTING_CONTROLLER: &'static str = "LightingController";
    pub const HTTP_ENDPOINT: &'static str = "HttpEndpoint";
    pub const TCP_ENDPOINT: &'static str = "TcpEndpoint";
    pub const UDP_ENDPOINT: &'static str = "UdpEndpoint";
    pub const OSC_ENDPOINT: &'static str = "OscEndpoint";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// App ids that need a protocol send unless the config says otherwise.
    pub fn builtin_networked() -> [AppId; 4] {
        [
            AppId::new(Self::HTTP_ENDPOINT),
            AppId::new(Self::TCP_ENDPOINT),
            AppId::new(Self::UDP_ENDPOINT),
            AppId::new(Self::OSC_ENDPOINT),
        ]
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AppId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AppId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for AppId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for AppId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for AppId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// ---------------------------------------------------------------------------
// Action vocabulary
// ---------------------------------------------------------------------------

/// Action type tags understood by the stock downstream apps.
pub mod action_types {
    pub const DISPLAY_SOURCE: &str = "DisplaySource";
    pub const HIDE_SOURCE: &str = "HideSource";
    pub const TOGGLE_SOURCE: &str = "ToggleSource";
    pub const ENABLE_FILTER: &str = "EnableFilter";
    pub const DISABLE_FILTER: &str = "DisableFilter";
    pub const TOGGLE_FILTER: &str = "ToggleFilter";
    pub const CHANGE_TO_SCENE: &str = "ChangeToScene";
    pub const SET_LIGHT_PRESET: &str = "SetLightPreset";
    pub const SET_RANDOM_PRESET: &str = "SetRandomPreset";
    pub const SEND_REQUEST: &str = "SendRequest";
}

/// Argument names used by the stock action types.
pub mod arg_names {
    pub const SCENE_NAME: &str = "sceneName";
    pub const SOURCE_NAME: &str = "sourceName";
    pub const FILTER_NAME: &str = "filterName";
    pub const PRESET_VALUE: &str = "presetValue";
    pub const PRESET_LIST: &str = "presetList";
    pub const TARGET_HOST: &str = "targetHost";
    pub const PORT: &str = "port";
    pub const PATH: &str = "path";
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
