//! Server-pushed progress events
//!
//! Wire shape (JSON, one message per frame):
//! `{"event": "dialing", "type": "Inbound", "progress": 40}`
//! `{"event": "dialing", "type": "Outbound", "progress": 60, "ghlStageName": "..."}`
//! `{"event": "connected", "type": "Outbound", "lead": {"ghlLocationID": "...", "ghlContactID": "..."}}`
//! `{"event": "idle"}`

use serde::{Deserialize, Deserializer, Serialize};

use crate::GAUGE_MAX;

/// What happened on the agent's line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Dialing,
    Connected,
    Idle,
    /// Anything the feed sends that we don't act on
    #[serde(other)]
    Unknown,
}

/// Call direction, decoded case-insensitively from the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "inbound" => Some(Self::Inbound),
            "outbound" => Some(Self::Outbound),
            _ => None,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Direction::Inbound => "Inbound",
            Direction::Outbound => "Outbound",
        };
        write!(f, "{}", name)
    }
}

/// CRM cross-reference carried by a `connected` event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    #[serde(rename = "ghlContactID", default, skip_serializing_if = "Option::is_none")]
    pub contact_ref: Option<String>,
    #[serde(rename = "ghlLocationID", default, skip_serializing_if = "Option::is_none")]
    pub location_ref: Option<String>,
}

impl Lead {
    pub fn new(location_ref: impl Into<String>, contact_ref: impl Into<String>) -> Self {
        Self {
            contact_ref: Some(contact_ref.into()),
            location_ref: Some(location_ref.into()),
        }
    }

    /// Both references, when both are present and non-empty
    pub fn references(&self) -> Option<(&str, &str)> {
        let location = self.location_ref.as_deref().filter(|s| !s.is_empty())?;
        let contact = self.contact_ref.as_deref().filter(|s| !s.is_empty())?;
        Some((location, contact))
    }
}

/// One message from the agent event feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub event: EventKind,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "deserialize_direction",
        skip_serializing_if = "Option::is_none"
    )]
    pub direction: Option<Direction>,
    #[serde(
        default,
        deserialize_with = "deserialize_progress",
        skip_serializing_if = "Option::is_none"
    )]
    pub progress: Option<i64>,
    #[serde(rename = "ghlStageName", default, skip_serializing_if = "Option::is_none")]
    pub stage_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead: Option<Lead>,
}

fn deserialize_direction<'de, D>(deserializer: D) -> Result<Option<Direction>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Direction::parse))
}

/// Feeds send progress as either `40` or `40.0`; fractions round to nearest
fn deserialize_progress<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<f64> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|p| p.is_finite()).map(|p| p.round() as i64))
}

impl ProgressEvent {
    fn bare(event: EventKind) -> Self {
        Self {
            event,
            direction: None,
            progress: None,
            stage_name: None,
            lead: None,
        }
    }

    pub fn dialing(direction: Direction, progress: i64) -> Self {
        Self {
            direction: Some(direction),
            progress: Some(progress),
            ..Self::bare(EventKind::Dialing)
        }
    }

    pub fn connected(direction: Option<Direction>) -> Self {
        Self {
            direction,
            ..Self::bare(EventKind::Connected)
        }
    }

    pub fn idle() -> Self {
        Self::bare(EventKind::Idle)
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage_name = Some(stage.into());
        self
    }

    pub fn with_lead(mut self, lead: Lead) -> Self {
        self.lead = Some(lead);
        self
    }

    /// Progress clamped into the gauge range; missing means 0
    pub fn gauge_progress(&self) -> u8 {
        self.progress.unwrap_or(0).clamp(0, GAUGE_MAX as i64) as u8
    }

    /// Stage label override, ignoring empty strings
    pub fn stage_label(&self) -> Option<&str> {
        self.stage_name.as_deref().filter(|s| !s.is_empty())
    }
}
