//! Wire protocol for the dashboard channel.
//!
//! Every message is a JSON envelope `{event, payload}`. Event names carry a
//! `unicast/` or `multicast/` namespace on the server side; delivery is
//! decided by the typed [`Delivery`] value chosen at the emit site, not by
//! parsing the name back out of the string.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for one connected client session.
pub type SessionId = Uuid;

/// How a server event is routed.
///
/// `Unicast` reaches only the session that triggered the originating
/// request; `Multicast` reaches every session joined to the named process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Unicast(SessionId),
    Multicast(String),
}

/// Requests a client can send over the channel.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "payload")]
pub enum ClientRequest {
    /// Start the named process.
    #[serde(rename = "process/start/req")]
    Start {
        #[serde(rename = "processName")]
        process_name: String,
    },

    /// Request termination of the named process.
    #[serde(rename = "process/stop/req")]
    Stop {
        #[serde(rename = "processName")]
        process_name: String,
    },

    /// Subscribe to the named process and receive a state snapshot.
    #[serde(rename = "process/join/req")]
    Join {
        #[serde(rename = "processName")]
        process_name: String,
    },
}

/// Events the server sends to clients.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "event", content = "payload")]
pub enum ServerEvent {
    /// A per-request failure, reported to the requester only.
    #[serde(rename = "unicast/process/error")]
    Error {
        #[serde(rename = "processName")]
        process_name: String,
        message: String,
    },

    /// Snapshot of current process state, sent once on join.
    #[serde(rename = "unicast/process/join/resp")]
    JoinResponse {
        #[serde(rename = "processName")]
        process_name: String,
        running: bool,
        log: Vec<String>,
        path: String,
        args: Vec<String>,
    },

    /// The process was spawned; log history has just been reset.
    #[serde(rename = "multicast/process/starting")]
    Starting {
        #[serde(rename = "processName")]
        process_name: String,
        log: Vec<String>,
    },

    /// Newly committed log lines, never previously delivered history.
    #[serde(rename = "multicast/process/log")]
    Log {
        #[serde(rename = "processName")]
        process_name: String,
        lines: Vec<String>,
    },

    /// The process exited, with a human-readable reason.
    #[serde(rename = "multicast/process/exit")]
    Exit {
        #[serde(rename = "processName")]
        process_name: String,
        message: String,
    },
}

impl ServerEvent {
    /// The process this event refers to.
    pub fn process_name(&self) -> &str {
        match self {
            Self::Error { process_name, .. }
            | Self::JoinResponse { process_name, .. }
            | Self::Starting { process_name, .. }
            | Self::Log { process_name, .. }
            | Self::Exit { process_name, .. } => process_name,
        }
    }
}
