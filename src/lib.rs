//! Nuvia Dialer: call-session synchronization core
//!
//! Three cooperating state machines sit between the CRM desktop host and the
//! agent event feed:
//! - capability discovery (bounded polling for the host SDK)
//! - call session controller (call-active flag, DTMF gating, indicator)
//! - progress stream synchronizer (gauges, banner, idle reset)

pub mod config;
pub mod core;
pub mod error;
pub mod types;

pub use error::{DialerError, Result};

// =============================================================================
// DISCOVERY DEFAULTS
// =============================================================================

/// Delay between discovery lookups (milliseconds)
pub const POLL_INTERVAL_MS: u64 = 250;

/// Capability-object ceiling: 1200 * 250ms, about 5 minutes
pub const MAX_CAPABILITY_ATTEMPTS: u32 = 1200;

/// Registration sub-capability ceiling: 360 * 250ms, about 90 seconds
pub const MAX_SUB_CAPABILITY_ATTEMPTS: u32 = 360;

/// Emit an operator diagnostic every Nth attempt
pub const DIAGNOSTIC_EVERY: u32 = 40;

/// Host globals worth listing while waiting for the SDK
pub const DIAGNOSTIC_NAME_PATTERN: &str = "five9|crm";

// =============================================================================
// SESSION
// =============================================================================

/// Indicator self-revert delay (milliseconds)
pub const INDICATOR_REVERT_MS: u64 = 1200;

// =============================================================================
// PROGRESS GAUGES
// =============================================================================

/// Inbound gauge glows above this progress value
pub const GLOW_THRESHOLD: u8 = 70;

/// Gauge ceiling
pub const GAUGE_MAX: u8 = 100;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
