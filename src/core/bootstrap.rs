//! Application startup once discovery hands over the SDK
//!
//! Starts the session actor, subscribes it to call lifecycle callbacks and
//! registers the plugin controls. The tab placement may fail on some host
//! layouts; the footer strip is registered regardless.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::DialerConfig;
use crate::core::host::{ComponentsApi, CrmSdk, HostCapabilities};
use crate::core::registry::{CallbackTable, ComponentBundle, ComponentTemplate};
use crate::core::session::{KeyDisposition, SessionController, SessionHandle};
use crate::error::Result;
use crate::types::Severity;

/// Which templates the host accepted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registration {
    pub tab: bool,
    pub footer: bool,
}

#[derive(Debug)]
pub struct DialerApp {
    session: SessionHandle,
    callbacks: CallbackTable,
    host: HostCapabilities,
    registration: Registration,
}

impl DialerApp {
    /// Must be called inside a tokio runtime (spawns the session actor)
    pub fn init(
        sdk: Arc<dyn CrmSdk>,
        components: Arc<dyn ComponentsApi>,
        config: &DialerConfig,
    ) -> Self {
        let host = HostCapabilities::from_sdk(sdk.as_ref());
        info!(?host, "SDK ready, initializing UI");

        let session = SessionController::new(host.clone(), &config.session).spawn();

        match &host.interaction {
            Some(interaction) => {
                if let Err(e) = interaction.subscribe(session.lifecycle_callbacks()) {
                    warn!(error = %e, "Lifecycle subscription failed");
                }
            }
            None => warn!("interactionApi unavailable; call state will stay idle"),
        }

        let callbacks = CallbackTable::for_session(&session);
        let mut registration = Registration::default();

        match register(components.as_ref(), ComponentTemplate::call_tab(), &callbacks) {
            Ok(()) => {
                info!("Registered tab location.");
                registration.tab = true;
            }
            Err(e) => warn!(error = %e, "Tab registration failed, trying footer only."),
        }

        match register(
            components.as_ref(),
            ComponentTemplate::call_details_footer(),
            &callbacks,
        ) {
            Ok(()) => {
                info!("Registered footer quick actions.");
                registration.footer = true;
                host.notify("Nuvia Dialer loaded (PLUS)", Severity::Success);
            }
            Err(e) => {
                error!(error = %e, "Footer registration failed.");
                host.notify("Custom UI failed to load. See console.", Severity::Error);
            }
        }

        Self {
            session,
            callbacks,
            host,
            registration,
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn callbacks(&self) -> &CallbackTable {
        &self.callbacks
    }

    pub fn host(&self) -> &HostCapabilities {
        &self.host
    }

    pub fn registration(&self) -> Registration {
        self.registration
    }

    /// Window-level keyboard hook
    pub fn key_pressed(&self, key: &str) -> KeyDisposition {
        self.session.key_pressed(key)
    }
}

fn register(
    components: &dyn ComponentsApi,
    template: ComponentTemplate,
    callbacks: &CallbackTable,
) -> Result<()> {
    let bundle = ComponentBundle::new(template, callbacks.clone())?;
    components.register_components(bundle)
}
