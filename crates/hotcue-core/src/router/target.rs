use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_UDP_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_TCP_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_OSC_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_OSC_PATH: &str = "/trigger";

// ---------------------------------------------------------------------------
// Protocol
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Udp,
    Tcp,
    Osc,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Udp => "udp",
            Protocol::Tcp => "tcp",
            Protocol::Osc => "osc",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AppTarget
// ---------------------------------------------------------------------------

/// Where and how to deliver actions for one destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum AppTarget {
    Http(HttpTarget),
    Udp(UdpTarget),
    Tcp(TcpTarget),
    Osc(OscTarget),
}

impl AppTarget {
    pub fn protocol(&self) -> Protocol {
        match self {
            AppTarget::Http(_) => Protocol::Http,
            AppTarget::Udp(_) => Protocol::Udp,
            AppTarget::Tcp(_) => Protocol::Tcp,
            AppTarget::Osc(_) => Protocol::Osc,
        }
    }

    /// URL for HTTP, `host:port` for everything else.
    pub fn endpoint(&self) -> &str {
        match self {
            AppTarget::Http(t) => &t.url,
            AppTarget::Udp(t) => &t.addr,
            AppTarget::Tcp(t) => &t.addr,
            AppTarget::Osc(t) => &t.addr,
        }
    }

    /// Effective send timeout after defaults are applied.
    pub fn timeout(&self) -> Duration {
        match self {
            AppTarget::Http(t) => t.timeout(),
            AppTarget::Udp(t) => t.timeout(),
            AppTarget::Tcp(t) => t.timeout(),
            AppTarget::Osc(t) => t.timeout(),
        }
    }

    pub(crate) fn timeout_ms(&self) -> Option<u64> {
        match self {
            AppTarget::Http(t) => t.timeout_ms,
            AppTarget::Udp(t) => t.timeout_ms,
            AppTarget::Tcp(t) => t.timeout_ms,
            AppTarget::Osc(t) => t.timeout_ms,
        }
    }
}

/// Zero or unset means "use the protocol default".
fn effective(timeout_ms: Option<u64>, default: Duration) -> Duration {
    timeout_ms
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .unwrap_or(default)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpTarget {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl HttpTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: None,
            headers: BTreeMap::new(),
            timeout_ms: None,
        }
    }

    pub fn method(&self) -> &str {
        self.method
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or("POST")
    }

    pub fn timeout(&self) -> Duration {
        effective(self.timeout_ms, DEFAULT_HTTP_TIMEOUT)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UdpTarget {
    pub addr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl UdpTarget {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout_ms: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        effective(self.timeout_ms, DEFAULT_UDP_TIMEOUT)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TcpTarget {
    pub addr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl TcpTarget {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout_ms: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        effective(self.timeout_ms, DEFAULT_TCP_TIMEOUT)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OscTarget {
    pub addr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl OscTarget {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            path: None,
            timeout_ms: None,
        }
    }

    pub fn path(&self) -> &str {
        self.path
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_OSC_PATH)
    }

    pub fn timeout(&self) -> Duration {
        effective(self.timeout_ms, DEFAULT_OSC_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_is_tagged_by_protocol() {
        let yaml = "protocol: osc\naddr: 127.0.0.1:9000\n";
        let target: AppTarget = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(target.protocol(), Protocol::Osc);
        assert_eq!(target.endpoint(), "127.0.0.1:9000");
        let AppTarget::Osc(osc) = target else {
            panic!("expected osc target");
        };
        assert_eq!(osc.path(), "/trigger");
        assert_eq!(osc.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn http_defaults() {
        let target = HttpTarget::new("http://localhost/hook");
        assert_eq!(target.method(), "POST");
        assert_eq!(target.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn zero_timeout_falls_back_to_default() {
        let mut target = TcpTarget::new("127.0.0.1:1");
        target.timeout_ms = Some(0);
        assert_eq!(target.timeout(), DEFAULT_TCP_TIMEOUT);
        target.timeout_ms = Some(250);
        assert_eq!(target.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn unknown_protocol_is_rejected() {
        let yaml = "protocol: zmq\naddr: 127.0.0.1:5555\n";
        assert!(serde_yaml::from_str::<AppTarget>(yaml).is_err());
    }

    #[test]
    fn http_round_trips_through_yaml() {
        let mut http = HttpTarget::new("http://localhost:8080/cue");
        http.method = Some("PUT".into());
        http.headers.insert("X-Token".into(), "abc".into());
        let target = AppTarget::Http(http);
        let yaml = serde_yaml::to_string(&target).unwrap();
        assert!(yaml.contains("protocol: http"));
        let parsed: AppTarget = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, target);
    }
}
