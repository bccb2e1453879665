use crate::dispatcher::Dispatcher;
use crate::error::{HotcueError, Result};
use crate::router::{AppTarget, HttpTarget, OscTarget, Router, TcpTarget, UdpTarget};
use crate::types::AppId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "hotcue.yaml";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

impl ConfigWarning {
    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Error,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ListenConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenConfig {
    /// TCP address for the hotcue event stream.
    #[serde(default = "default_events_addr")]
    pub events: String,
    /// HTTP address for trigger config pushes.
    #[serde(default = "default_config_addr")]
    pub config: String,
}

fn default_events_addr() -> String {
    "0.0.0.0:8112".to_string()
}

fn default_config_addr() -> String {
    "0.0.0.0:8111".to_string()
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            events: default_events_addr(),
            config: default_config_addr(),
        }
    }
}

// ---------------------------------------------------------------------------
// QueueConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_event_queue")]
    pub events: usize,
    #[serde(default = "default_snapshot_queue")]
    pub snapshots: usize,
}

fn default_event_queue() -> usize {
    64
}

fn default_snapshot_queue() -> usize {
    10
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            events: default_event_queue(),
            snapshots: default_snapshot_queue(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub queues: QueueConfig,
    /// App ids, beyond the builtin endpoints, that are delivered over the network.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networked_apps: Vec<AppId>,
    #[serde(default)]
    pub targets: BTreeMap<AppId, AppTarget>,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            listen: ListenConfig::default(),
            queues: QueueConfig::default(),
            networked_apps: Vec::new(),
            targets: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Config written by `hotcue-mesh init`: one loopback target per builtin
    /// endpoint.
    pub fn starter() -> Self {
        let mut http = HttpTarget::new("http://127.0.0.1:8080/hotcue");
        http.timeout_ms = Some(5000);
        let mut osc = OscTarget::new("127.0.0.1:9000");
        osc.path = Some("/trigger".to_string());

        let targets = BTreeMap::from([
            (AppId::new(AppId::HTTP_ENDPOINT), AppTarget::Http(http)),
            (
                AppId::new(AppId::UDP_ENDPOINT),
                AppTarget::Udp(UdpTarget::new("127.0.0.1:9100")),
            ),
            (
                AppId::new(AppId::TCP_ENDPOINT),
                AppTarget::Tcp(TcpTarget::new("127.0.0.1:9200")),
            ),
            (AppId::new(AppId::OSC_ENDPOINT), AppTarget::Osc(osc)),
        ]);

        Self {
            targets,
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(HotcueError::ConfigNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        crate::io::atomic_write(path, self.to_yaml()?.as_bytes())
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.networked_apps.iter().cloned())
    }

    pub fn router(&self) -> Router {
        Router::new(self.targets.clone())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        // 1. Listen addresses are host:port; hostnames resolve at bind time.
        for (name, addr) in [("events", &self.listen.events), ("config", &self.listen.config)] {
            if !looks_like_host_port(addr) {
                warnings.push(ConfigWarning::error(format!(
                    "listen.{name} '{addr}' must be host:port"
                )));
            }
        }

        // 2. Queues need room for at least one item.
        if self.queues.events == 0 {
            warnings.push(ConfigWarning::error("queues.events must be at least 1"));
        }
        if self.queues.snapshots == 0 {
            warnings.push(ConfigWarning::error("queues.snapshots must be at least 1"));
        }

        // 3. Per-target checks.
        for (app, target) in &self.targets {
            match target {
                AppTarget::Http(http) => {
                    if http.url.trim().is_empty() {
                        warnings.push(ConfigWarning::error(format!(
                            "target '{app}' has an empty http url"
                        )));
                    } else if !http.url.starts_with("http://") && !http.url.starts_with("https://")
                    {
                        warnings.push(ConfigWarning::error(format!(
                            "target '{app}' url '{}' must start with http:// or https://",
                            http.url
                        )));
                    }
                }
                AppTarget::Udp(UdpTarget { addr, .. })
                | AppTarget::Tcp(TcpTarget { addr, .. }) => {
                    if !looks_like_host_port(addr) {
                        warnings.push(ConfigWarning::error(format!(
                            "target '{app}' addr '{addr}' must be host:port"
                        )));
                    }
                }
                AppTarget::Osc(osc) => {
                    if !looks_like_host_port(&osc.addr) {
                        warnings.push(ConfigWarning::error(format!(
                            "target '{app}' addr '{}' must be host:port",
                            osc.addr
                        )));
                    }
                    if !osc.path().starts_with('/') {
                        warnings.push(ConfigWarning::warning(format!(
                            "target '{app}' osc path '{}' should start with '/'",
                            osc.path()
                        )));
                    }
                }
            }

            if target.timeout_ms() == Some(0) {
                warnings.push(ConfigWarning::warning(format!(
                    "target '{app}' has timeout_ms=0; the {} default of {:?} applies",
                    target.protocol(),
                    target.timeout()
                )));
            }
        }

        // 4. Networked apps without a target will fail every send.
        let dispatcher = self.dispatcher();
        for app in dispatcher.networked_apps() {
            if !self.targets.contains_key(app) {
                warnings.push(ConfigWarning::warning(format!(
                    "networked app '{app}' has no target; sends to it will fail"
                )));
            }
        }

        // 5. Targets for apps the dispatcher treats as local are never used.
        for app in self.targets.keys() {
            if !dispatcher.is_networked(app) {
                warnings.push(ConfigWarning::warning(format!(
                    "target '{app}' is never used: add it to networked_apps"
                )));
            }
        }

        warnings
    }
}

fn looks_like_host_port(addr: &str) -> bool {
    match addr.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
