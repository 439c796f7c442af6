//! Host capability surface
//!
//! The CRM desktop exposes an SDK object whose sub-APIs may or may not be
//! present. Everything here is implemented by the host side (or a test
//! double); the core only consumes it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::registry::ComponentBundle;
use crate::error::Result;
use crate::types::{DialRequest, DigitSymbol, LifecycleEvent, PresenceStatus, Severity};

pub type LifecycleCallback = Box<dyn Fn() + Send + Sync>;

/// The four named callbacks handed to the host's lifecycle subscription
pub struct LifecycleCallbacks {
    pub call_started: LifecycleCallback,
    pub call_accepted: LifecycleCallback,
    pub call_ended: LifecycleCallback,
    pub call_finished: LifecycleCallback,
}

impl LifecycleCallbacks {
    /// Build all four callbacks from one event sink
    pub fn from_sink<F>(sink: F) -> Self
    where
        F: Fn(LifecycleEvent) + Clone + Send + Sync + 'static,
    {
        let bind = |event: LifecycleEvent| -> LifecycleCallback {
            let sink = sink.clone();
            Box::new(move || sink(event))
        };
        Self {
            call_started: bind(LifecycleEvent::Started),
            call_accepted: bind(LifecycleEvent::Accepted),
            call_ended: bind(LifecycleEvent::Ended),
            call_finished: bind(LifecycleEvent::Finished),
        }
    }

    /// Invoke the callback matching `event`, the way the host would
    pub fn fire(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Started => (self.call_started)(),
            LifecycleEvent::Accepted => (self.call_accepted)(),
            LifecycleEvent::Ended => (self.call_ended)(),
            LifecycleEvent::Finished => (self.call_finished)(),
        }
    }
}

impl std::fmt::Debug for LifecycleCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleCallbacks").finish_non_exhaustive()
    }
}

#[async_trait]
pub trait InteractionApi: Send + Sync {
    fn subscribe(&self, callbacks: LifecycleCallbacks) -> Result<()>;

    async fn send_dtmf(&self, digit: DigitSymbol) -> Result<()>;
}

#[async_trait]
pub trait PresenceApi: Send + Sync {
    async fn set_status(&self, status: PresenceStatus) -> Result<()>;
}

pub trait CrmApi: Send + Sync {
    fn click_to_dial(&self, request: DialRequest) -> Result<()>;
}

pub trait ApplicationApi: Send + Sync {
    fn bring_to_front(&self);

    fn notify(&self, message: &str, severity: Severity);
}

/// Registration sub-capability
pub trait ComponentsApi: Send + Sync {
    fn register_components(&self, bundle: ComponentBundle) -> Result<()>;
}

/// The SDK object discovery waits for. Every sub-API is optional.
pub trait CrmSdk: Send + Sync {
    fn interaction(&self) -> Option<Arc<dyn InteractionApi>> {
        None
    }

    fn presence(&self) -> Option<Arc<dyn PresenceApi>> {
        None
    }

    fn crm(&self) -> Option<Arc<dyn CrmApi>> {
        None
    }

    fn application(&self) -> Option<Arc<dyn ApplicationApi>> {
        None
    }

    fn components(&self) -> Result<Option<Arc<dyn ComponentsApi>>> {
        Ok(None)
    }
}

/// Opens cross-reference views (fire-and-forget)
pub trait Navigator: Send + Sync {
    fn open(&self, url: &str);
}

/// Navigator that only records the URL in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn open(&self, url: &str) {
        tracing::info!(%url, "Opening contact");
    }
}

/// Sub-APIs resolved once at startup
#[derive(Clone, Default)]
pub struct HostCapabilities {
    pub interaction: Option<Arc<dyn InteractionApi>>,
    pub presence: Option<Arc<dyn PresenceApi>>,
    pub crm: Option<Arc<dyn CrmApi>>,
    pub application: Option<Arc<dyn ApplicationApi>>,
}

impl HostCapabilities {
    pub fn from_sdk(sdk: &dyn CrmSdk) -> Self {
        Self {
            interaction: sdk.interaction(),
            presence: sdk.presence(),
            crm: sdk.crm(),
            application: sdk.application(),
        }
    }

    /// Host notification, or the log when the host has no application API
    pub fn notify(&self, message: &str, severity: Severity) {
        match &self.application {
            Some(app) => app.notify(message, severity),
            None => match severity {
                Severity::Error => tracing::error!("{}", message),
                Severity::Success | Severity::Info => tracing::info!("{}", message),
            },
        }
    }
}

impl std::fmt::Debug for HostCapabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostCapabilities")
            .field("interaction", &self.interaction.is_some())
            .field("presence", &self.presence.is_some())
            .field("crm", &self.crm.is_some())
            .field("application", &self.application.is_some())
            .finish()
    }
}
