//! Host call-lifecycle notifications

use serde::{Deserialize, Serialize};

/// The four lifecycle callbacks the host fires for the single active call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleEvent {
    /// Call started (outbound dial placed)
    Started,
    /// Call accepted (inbound answered)
    Accepted,
    /// Call ended (media torn down)
    Ended,
    /// Call finished (disposition complete)
    Finished,
}

impl LifecycleEvent {
    /// Value `call_active` takes after this event
    pub fn marks_active(&self) -> bool {
        matches!(self, Self::Started | Self::Accepted)
    }

    /// Host callback name
    pub fn callback_name(&self) -> &'static str {
        match self {
            Self::Started => "callStarted",
            Self::Accepted => "callAccepted",
            Self::Ended => "callEnded",
            Self::Finished => "callFinished",
        }
    }
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.callback_name())
    }
}
