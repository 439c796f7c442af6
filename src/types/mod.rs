//! Core types for the dialer

mod command;
mod digit;
mod lifecycle;
mod outcome;
mod presence;
mod progress;
mod view;

pub use command::CommandId;
pub use digit::DigitSymbol;
pub use lifecycle::LifecycleEvent;
pub use outcome::{DigitOutcome, DiscoveryOutcome};
pub use presence::{DialRequest, PresenceStatus, Severity};
pub use progress::{Direction, EventKind, Lead, ProgressEvent};
pub use view::{
    default_campaign_label, Banner, GaugePair, InboundGauge, IndicatorState, IndicatorTone,
    OutboundGauge, ProgressView, SessionView, INDICATOR_IDLE, INDICATOR_IN_CALL,
    OUTBOUND_CONNECTED_LABEL, OUTBOUND_DIALING_LABEL, OUTBOUND_IDLE_LABEL, STATUS_FEED_CLOSED,
    STATUS_FEED_CONNECTED, STATUS_READY,
};
