//! Outcome codes for discovery and digit dispatch

use serde::{Deserialize, Serialize};

/// How capability discovery ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscoveryOutcome {
    /// Both phases succeeded, handoff delivered
    Ready,
    /// SDK object never appeared
    CapabilityExhausted { attempts: u32 },
    /// SDK appeared but its registration API never did
    SubCapabilityExhausted { attempts: u32 },
}

impl DiscoveryOutcome {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ready => "D001_READY",
            Self::CapabilityExhausted { .. } => "D002_CAPABILITY_EXHAUSTED",
            Self::SubCapabilityExhausted { .. } => "D003_SUB_CAPABILITY_EXHAUSTED",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Ready => "SDK ready",
            Self::CapabilityExhausted { .. } => "SDK not detected; stopping bootstrap",
            Self::SubCapabilityExhausted { .. } => {
                "customComponentsApi unavailable; stopping bootstrap"
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl std::fmt::Display for DiscoveryOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}

/// Result of one digit dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DigitOutcome {
    /// Transmit handed to the host; the reply settles it
    Transmitting,
    /// DTMF transmitted during an active call
    Sent,
    /// Transmission attempted and rejected by the host
    Failed,
    /// No call active (or no interaction capability); only buffered
    NoActiveCall,
}

impl DigitOutcome {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transmitting => "T000_TRANSMITTING",
            Self::Sent => "T001_SENT",
            Self::Failed => "T002_FAILED",
            Self::NoActiveCall => "T003_NO_ACTIVE_CALL",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Transmitting => "DTMF transmit pending",
            Self::Sent => "DTMF sent",
            Self::Failed => "DTMF rejected by host",
            Self::NoActiveCall => "No active call; digit buffered only",
        }
    }
}

impl std::fmt::Display for DigitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
