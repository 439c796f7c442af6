//! Typed identifiers for every command the host can invoke on the plugin

use serde::{Deserialize, Serialize};

use crate::types::{DigitSymbol, PresenceStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandId {
    Dial,
    Clear,
    ToggleDefaultCampaign,
    Presence(PresenceStatus),
    BringToFront,
    Digit(DigitSymbol),
}

impl CommandId {
    /// Every command, keypad last
    pub fn all() -> Vec<CommandId> {
        let mut ids = vec![
            CommandId::Dial,
            CommandId::Clear,
            CommandId::ToggleDefaultCampaign,
            CommandId::Presence(PresenceStatus::Working),
            CommandId::Presence(PresenceStatus::NotReady),
            CommandId::Presence(PresenceStatus::Logout),
            CommandId::BringToFront,
        ];
        ids.extend(DigitSymbol::ALL.into_iter().map(CommandId::Digit));
        ids
    }

    /// Key the host uses to call back into the plugin
    pub fn key(&self) -> String {
        match self {
            CommandId::Dial => "nv_onDial".to_string(),
            CommandId::Clear => "nv_onClear".to_string(),
            CommandId::ToggleDefaultCampaign => "nv_toggleDefault".to_string(),
            CommandId::Presence(PresenceStatus::Working) => "nv_setWorking".to_string(),
            CommandId::Presence(PresenceStatus::NotReady) => "nv_setNotReady".to_string(),
            CommandId::Presence(PresenceStatus::Logout) => "nv_setLogout".to_string(),
            CommandId::BringToFront => "nv_bringToFront".to_string(),
            CommandId::Digit(d) => format!("nv_digit_{}", d.key_suffix()),
        }
    }

    pub fn from_key(key: &str) -> Option<CommandId> {
        if let Some(suffix) = key.strip_prefix("nv_digit_") {
            return DigitSymbol::from_key_suffix(suffix).map(CommandId::Digit);
        }
        Self::all().into_iter().find(|id| id.key() == key)
    }
}

impl std::fmt::Display for CommandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}
