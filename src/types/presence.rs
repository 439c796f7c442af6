//! Presence, notification and dial request values passed to the host

use serde::{Deserialize, Serialize};

/// Agent presence states the host accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PresenceStatus {
    Working,
    NotReady,
    Logout,
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PresenceStatus::Working => "WORKING",
            PresenceStatus::NotReady => "NOT_READY",
            PresenceStatus::Logout => "LOGOUT",
        };
        write!(f, "{}", name)
    }
}

/// Host notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// Arguments for the host's click-to-dial call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialRequest {
    /// Sanitized number, only `0-9 * # +`
    pub click_to_dial_number: String,
    pub default_campaign: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preselected_campaign_name: Option<String>,
}
