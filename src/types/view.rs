//! Presentation state produced by the session controller and the progress
//! synchronizer

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::types::Direction;

/// Outbound label while nothing is happening
pub const OUTBOUND_IDLE_LABEL: &str = "Outbound Idle";
/// Outbound label while dialing without a CRM stage name
pub const OUTBOUND_DIALING_LABEL: &str = "Outbound dialing…";
/// Outbound label once an outbound call connects
pub const OUTBOUND_CONNECTED_LABEL: &str = "Connected – Outbound";

/// Indicator text at rest, no call
pub const INDICATOR_IDLE: &str = "DTMF: idle";
/// Indicator text at rest, call active
pub const INDICATOR_IN_CALL: &str = "DTMF: in-call";

pub const STATUS_FEED_CONNECTED: &str = "Agent feed connected…";
pub const STATUS_FEED_CLOSED: &str = "Agent feed disconnected.";
pub const STATUS_READY: &str = "Ready for next call";

// =============================================================================
// PROGRESS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundGauge {
    pub progress: u8,
    pub active: bool,
    pub glow: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundGauge {
    pub progress: u8,
    pub label: String,
}

impl Default for OutboundGauge {
    fn default() -> Self {
        Self {
            progress: 0,
            label: OUTBOUND_IDLE_LABEL.to_string(),
        }
    }
}

/// Inbound and outbound gauges, updated independently
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaugePair {
    pub inbound: InboundGauge,
    pub outbound: OutboundGauge,
}

/// The single "connected" banner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    pub direction: Direction,
}

impl Banner {
    pub fn text(&self) -> &'static str {
        match self.direction {
            Direction::Inbound => "📥 Connected to an Inbound Caller",
            Direction::Outbound => "📤 Connected to an Outbound Lead",
        }
    }
}

/// Everything the progress synchronizer renders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressView {
    pub gauges: GaugePair,
    pub banner: Option<Banner>,
    pub status: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Default for ProgressView {
    fn default() -> Self {
        Self {
            gauges: GaugePair::default(),
            banner: None,
            status: None,
            updated_at: Utc::now(),
        }
    }
}

impl ProgressView {
    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let inbound = &self.gauges.inbound;
        let outbound = &self.gauges.outbound;

        let mut inbound_str = format!("in {:>3}%", inbound.progress).normal();
        if inbound.glow {
            inbound_str = inbound_str.bright_yellow().bold();
        } else if inbound.active {
            inbound_str = inbound_str.cyan();
        }

        let mut line = format!(
            "{} | out {:>3}% {}",
            inbound_str,
            outbound.progress,
            outbound.label.dimmed()
        );
        if let Some(banner) = &self.banner {
            line.push_str(&format!(" | {}", banner.text().green().bold()));
        }
        if let Some(status) = &self.status {
            line.push_str(&format!(" | {}", status.dimmed()));
        }
        line
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        let banner = self
            .banner
            .map(|b| b.direction.to_string())
            .unwrap_or_else(|| "none".to_string());
        format!(
            "inbound={} active={} glow={} | outbound={} label={} | banner={}",
            self.gauges.inbound.progress,
            self.gauges.inbound.active,
            self.gauges.inbound.glow,
            self.gauges.outbound.progress,
            self.gauges.outbound.label,
            banner
        )
    }
}

// =============================================================================
// SESSION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorTone {
    Neutral,
    Ok,
    Err,
}

/// The shared DTMF indicator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorState {
    pub text: String,
    pub tone: IndicatorTone,
}

impl IndicatorState {
    pub fn new(text: impl Into<String>, tone: IndicatorTone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }

    /// Resting text for the given call state
    pub fn resting(call_active: bool) -> Self {
        let text = if call_active {
            INDICATOR_IN_CALL
        } else {
            INDICATOR_IDLE
        };
        Self::new(text, IndicatorTone::Neutral)
    }
}

impl Default for IndicatorState {
    fn default() -> Self {
        Self::resting(false)
    }
}

/// Everything the session controller renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub dial_number: String,
    pub campaign: String,
    pub indicator: IndicatorState,
    pub default_campaign_label: String,
    pub call_active: bool,
}

pub fn default_campaign_label(use_default: bool) -> String {
    format!(
        "Use Default Campaign: {}",
        if use_default { "On" } else { "Off" }
    )
}

impl Default for SessionView {
    fn default() -> Self {
        Self {
            dial_number: String::new(),
            campaign: String::new(),
            indicator: IndicatorState::default(),
            default_campaign_label: default_campaign_label(true),
            call_active: false,
        }
    }
}
