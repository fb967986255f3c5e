//! Real-time wire model: frames, event kinds and typed event payloads.
//!
//! Every frame in both directions is `{ "event": <name>, "args": [..] }`.
//! Inbound frames are lifted into a [`ChannelEvent`], whose variant fixes
//! the payload shape: no argument, one text argument, or a parsed
//! [`ServerStats`] document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const AUTH_EVENT: &str = "auth";
pub const SEND_COMMAND_EVENT: &str = "send command";
pub const SET_STATE_EVENT: &str = "set state";

/// A single frame as it travels over the socket.
///
/// Arguments are kept as raw JSON values so a frame with a non-string
/// argument still parses; payloads only ever read the first argument as text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketFrame {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<Value>>,
}

impl SocketFrame {
    #[must_use]
    pub fn new(event: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            event: event.into(),
            args: Some(args.into_iter().map(Value::String).collect()),
        }
    }

    #[must_use]
    pub fn auth(token: &str) -> Self {
        Self::new(AUTH_EVENT, vec![token.to_owned()])
    }

    #[must_use]
    pub fn command(command: &str) -> Self {
        Self::new(SEND_COMMAND_EVENT, vec![command.to_owned()])
    }

    #[must_use]
    pub fn power(action: PowerAction) -> Self {
        Self::new(SET_STATE_EVENT, vec![action.as_str().to_owned()])
    }

    /// First argument, if it is a string.
    #[must_use]
    pub fn first_arg(&self) -> Option<&str> {
        self.args.as_ref()?.first()?.as_str()
    }

    /// Parse a text frame. Returns `None` for anything that is not a frame.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

// =============================================================================
// EVENT KINDS
// =============================================================================

/// Inbound events a listener can subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    AuthSuccess,
    ConsoleOutput,
    Status,
    Stats,
    TokenExpiring,
    TokenExpired,
    DaemonMessage,
    DaemonError,
    InstallOutput,
    InstallStarted,
    InstallCompleted,
    TransferLogs,
    TransferStatus,
}

impl EventKind {
    pub const ALL: [Self; 13] = [
        Self::AuthSuccess,
        Self::ConsoleOutput,
        Self::Status,
        Self::Stats,
        Self::TokenExpiring,
        Self::TokenExpired,
        Self::DaemonMessage,
        Self::DaemonError,
        Self::InstallOutput,
        Self::InstallStarted,
        Self::InstallCompleted,
        Self::TransferLogs,
        Self::TransferStatus,
    ];

    /// Event name on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthSuccess => "auth success",
            Self::ConsoleOutput => "console output",
            Self::Status => "status",
            Self::Stats => "stats",
            Self::TokenExpiring => "token expiring",
            Self::TokenExpired => "token expired",
            Self::DaemonMessage => "daemon message",
            Self::DaemonError => "daemon error",
            Self::InstallOutput => "install output",
            Self::InstallStarted => "install started",
            Self::InstallCompleted => "install completed",
            Self::TransferLogs => "transfer logs",
            Self::TransferStatus => "transfer status",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// EVENTS
// =============================================================================

/// An inbound event with its payload already in typed form.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelEvent {
    AuthSuccess,
    ConsoleOutput(String),
    /// Power state string, passed through as sent.
    Status(String),
    Stats(ServerStats),
    TokenExpiring,
    TokenExpired,
    DaemonMessage(String),
    DaemonError(String),
    InstallOutput(String),
    InstallStarted,
    InstallCompleted,
    TransferLogs(String),
    TransferStatus(String),
}

impl ChannelEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::AuthSuccess => EventKind::AuthSuccess,
            Self::ConsoleOutput(_) => EventKind::ConsoleOutput,
            Self::Status(_) => EventKind::Status,
            Self::Stats(_) => EventKind::Stats,
            Self::TokenExpiring => EventKind::TokenExpiring,
            Self::TokenExpired => EventKind::TokenExpired,
            Self::DaemonMessage(_) => EventKind::DaemonMessage,
            Self::DaemonError(_) => EventKind::DaemonError,
            Self::InstallOutput(_) => EventKind::InstallOutput,
            Self::InstallStarted => EventKind::InstallStarted,
            Self::InstallCompleted => EventKind::InstallCompleted,
            Self::TransferLogs(_) => EventKind::TransferLogs,
            Self::TransferStatus(_) => EventKind::TransferStatus,
        }
    }

    /// Lift a frame into a typed event.
    ///
    /// Unknown event names, text events without an argument and `stats`
    /// frames whose argument is not a stats document all yield `None`.
    #[must_use]
    pub fn from_frame(frame: &SocketFrame) -> Option<Self> {
        let kind = EventKind::from_name(&frame.event)?;
        let text = || frame.first_arg().map(ToOwned::to_owned);

        let event = match kind {
            EventKind::AuthSuccess => Self::AuthSuccess,
            EventKind::TokenExpiring => Self::TokenExpiring,
            EventKind::TokenExpired => Self::TokenExpired,
            EventKind::InstallStarted => Self::InstallStarted,
            EventKind::InstallCompleted => Self::InstallCompleted,
            EventKind::Stats => Self::Stats(serde_json::from_str(frame.first_arg()?).ok()?),
            EventKind::Status => Self::Status(text()?),
            EventKind::ConsoleOutput => Self::ConsoleOutput(text()?),
            EventKind::DaemonMessage => Self::DaemonMessage(text()?),
            EventKind::DaemonError => Self::DaemonError(text()?),
            EventKind::InstallOutput => Self::InstallOutput(text()?),
            EventKind::TransferLogs => Self::TransferLogs(text()?),
            EventKind::TransferStatus => Self::TransferStatus(text()?),
        };
        Some(event)
    }
}

/// Resource usage snapshot carried by `stats` events. Fields the daemon
/// leaves out read as zero or empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerStats {
    pub memory_bytes: u64,
    pub memory_limit_bytes: u64,
    pub cpu_absolute: f64,
    pub network: NetworkStats,
    pub uptime: u64,
    pub state: String,
    pub disk_bytes: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkStats {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

// =============================================================================
// POWER & CLOSE CODES
// =============================================================================

/// Power signals accepted by the daemon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerAction {
    Start,
    Stop,
    Restart,
    Kill,
}

impl PowerAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Kill => "kill",
        }
    }
}

impl std::str::FromStr for PowerAction {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "restart" => Ok(Self::Restart),
            "kill" => Ok(Self::Kill),
            other => Err(format!("unknown power action `{other}`")),
        }
    }
}

/// Socket close codes the daemon uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CloseCode {
    Normal,
    GoingAway,
    AbnormalClosure,
    AuthenticationFailed,
    TokenExpired,
}

impl CloseCode {
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            Self::Normal => 1000,
            Self::GoingAway => 1001,
            Self::AbnormalClosure => 1006,
            Self::AuthenticationFailed => 4001,
            Self::TokenExpired => 4004,
        }
    }

    #[must_use]
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1000 => Some(Self::Normal),
            1001 => Some(Self::GoingAway),
            1006 => Some(Self::AbnormalClosure),
            4001 => Some(Self::AuthenticationFailed),
            4004 => Some(Self::TokenExpired),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "events_test.rs"]
mod tests;
