pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod io;
pub mod matcher;
pub mod orchestrator;
pub mod router;
pub mod shutdown;
pub mod snapshot;
pub mod trigger;
pub mod types;

pub use config::{Config, ConfigWarning, WarnLevel};
pub use dispatcher::{Dispatch, Dispatcher};
pub use error::{HotcueError, Result};
pub use event::HotcueEvent;
pub use orchestrator::{EventReport, LocalActionSink, LoggingSink, Orchestrator, SendOutcome};
pub use router::{AppTarget, Router, RouterError};
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use snapshot::{SnapshotCell, TriggerSnapshot, MAX_CONFIG_PAYLOAD_BYTES};
pub use trigger::{ActionRef, Trigger, TriggerAction};
pub use types::{AppId, CueColor, CueMatchType, HotcueType};
