use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GateError;

// ─── Decision ─────────────────────────────────────────────────

/// Which UI root the launch should mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    /// The probe has not completed yet.
    Pending,
    /// Show the embedded web content.
    Unlocked,
    /// Show the native application.
    Locked,
}

impl GateDecision {
    pub fn is_terminal(self) -> bool {
        !matches!(self, GateDecision::Pending)
    }

    pub fn from_locked_flag(locked: bool) -> Self {
        if locked {
            GateDecision::Locked
        } else {
            GateDecision::Unlocked
        }
    }
}

impl fmt::Display for GateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GateDecision::Pending => "pending",
            GateDecision::Unlocked => "unlocked",
            GateDecision::Locked => "locked",
        };
        f.write_str(name)
    }
}

// ─── Persisted flags ──────────────────────────────────────────

/// The durable pair written after each launch's resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateFlags {
    pub locked: bool,
    /// Whether any launch has reached a terminal decision.
    pub probed: bool,
}

impl Default for GateFlags {
    fn default() -> Self {
        Self {
            locked: true,
            probed: false,
        }
    }
}

impl GateFlags {
    /// Flags recording a terminal decision. `Pending` maps to the defaults.
    pub fn from_decision(decision: GateDecision) -> Self {
        match decision {
            GateDecision::Pending => Self::default(),
            GateDecision::Unlocked => Self {
                locked: false,
                probed: true,
            },
            GateDecision::Locked => Self {
                locked: true,
                probed: true,
            },
        }
    }
}

// ─── Probe outcome ────────────────────────────────────────────

/// What a single probe observed, independent of the HTTP client used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Response {
        status: u16,
        /// Declared `Content-Length`, if the server sent one.
        content_length: Option<u64>,
        /// Body bytes received. Reading stops at the first non-empty chunk.
        body_len: usize,
    },
    Failed(GateError),
}

impl ProbeOutcome {
    pub fn status(&self) -> Option<u16> {
        match self {
            ProbeOutcome::Response { status, .. } => Some(*status),
            ProbeOutcome::Failed(_) => None,
        }
    }
}
