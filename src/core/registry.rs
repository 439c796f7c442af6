//! Command callback table and component bundles
//!
//! The host calls back into the plugin by command key. Keys are resolved to
//! `CommandId`s and checked against the table when a bundle is built, so a
//! template can never reference a command nobody handles.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::session::SessionHandle;
use crate::error::{DialerError, Result};
use crate::types::CommandId;

pub type CommandHandler = Arc<dyn Fn() + Send + Sync>;

/// Host-side placement of a group of plugin controls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentTemplate {
    pub location: String,
    pub label: String,
    /// Commands the template's controls invoke
    pub commands: Vec<CommandId>,
}

impl ComponentTemplate {
    pub const CALL_TAB_LOCATION: &'static str = "3rdPartyComp-li-call-tab";
    pub const CALL_DETAILS_FOOTER_LOCATION: &'static str = "3rdPartyComp-li-call-details-bottom";

    /// Dialer tab: number entry, dial controls, presence, keypad
    pub fn call_tab() -> Self {
        Self {
            location: Self::CALL_TAB_LOCATION.to_string(),
            label: "Nuvia Dialer".to_string(),
            commands: CommandId::all(),
        }
    }

    /// Quick-actions strip under the call details
    pub fn call_details_footer() -> Self {
        Self {
            location: Self::CALL_DETAILS_FOOTER_LOCATION.to_string(),
            label: "Nuvia Quick Actions".to_string(),
            commands: vec![CommandId::BringToFront],
        }
    }
}

#[derive(Clone, Default)]
pub struct CallbackTable {
    handlers: HashMap<CommandId, CommandHandler>,
}

impl CallbackTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<F>(&mut self, id: CommandId, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.handlers.insert(id, Arc::new(handler));
    }

    pub fn with_handler<F>(mut self, id: CommandId, handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.insert(id, handler);
        self
    }

    /// Route every command into the session actor
    pub fn for_session(handle: &SessionHandle) -> Self {
        let mut table = Self::new();
        for id in CommandId::all() {
            let handle = handle.clone();
            table.insert(id, move || {
                if let Err(e) = handle.command(id) {
                    tracing::warn!(command = %id, error = %e, "Command dropped");
                }
            });
        }
        table
    }

    pub fn contains(&self, id: CommandId) -> bool {
        self.handlers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Every command the template references must have a handler
    pub fn validate(&self, template: &ComponentTemplate) -> Result<()> {
        match template.commands.iter().find(|id| !self.contains(**id)) {
            Some(missing) => Err(DialerError::MissingHandler(*missing)),
            None => Ok(()),
        }
    }

    pub fn invoke(&self, id: CommandId) -> Result<()> {
        let handler = self
            .handlers
            .get(&id)
            .ok_or(DialerError::MissingHandler(id))?;
        handler();
        Ok(())
    }

    /// Entry point for hosts that call back by string key
    pub fn invoke_key(&self, key: &str) -> Result<()> {
        let id = CommandId::from_key(key).ok_or_else(|| DialerError::UnknownCommand(key.to_string()))?;
        self.invoke(id)
    }
}

impl std::fmt::Debug for CallbackTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<String> = self.handlers.keys().map(|id| id.key()).collect();
        keys.sort();
        f.debug_struct("CallbackTable").field("commands", &keys).finish()
    }
}

/// A validated template + callback table, ready for the host
#[derive(Debug, Clone)]
pub struct ComponentBundle {
    template: ComponentTemplate,
    callbacks: CallbackTable,
}

impl ComponentBundle {
    pub fn new(template: ComponentTemplate, callbacks: CallbackTable) -> Result<Self> {
        callbacks.validate(&template)?;
        Ok(Self {
            template,
            callbacks,
        })
    }

    pub fn template(&self) -> &ComponentTemplate {
        &self.template
    }

    pub fn callbacks(&self) -> &CallbackTable {
        &self.callbacks
    }
}
