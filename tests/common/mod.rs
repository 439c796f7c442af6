//! Shared host double for integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Notify};

use nuvia_dialer::core::{
    ApplicationApi, ComponentBundle, ComponentsApi, CrmApi, CrmSdk, InteractionApi,
    LifecycleCallbacks, PresenceApi,
};
use nuvia_dialer::types::{
    DialRequest, DigitSymbol, LifecycleEvent, PresenceStatus, SessionView, Severity,
};
use nuvia_dialer::{DialerError, Result};

/// Records every host call; failures are switchable per capability
#[derive(Default)]
pub struct MockHost {
    pub lifecycle: Mutex<Option<LifecycleCallbacks>>,
    pub bundles: Mutex<Vec<ComponentBundle>>,
    pub sent: Mutex<Vec<DigitSymbol>>,
    pub presence: Mutex<Vec<PresenceStatus>>,
    pub dialed: Mutex<Vec<DialRequest>>,
    pub notices: Mutex<Vec<(String, Severity)>>,
    pub fronted: AtomicU32,
    pub fail_dtmf: AtomicBool,
    pub fail_presence: AtomicBool,
    /// While set, every DTMF send waits for a `dtmf_gate` permit
    pub hold_dtmf: AtomicBool,
    pub dtmf_gate: Notify,
    pub rejected_locations: Mutex<Vec<String>>,
}

impl MockHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sdk(self: &Arc<Self>) -> Arc<dyn CrmSdk> {
        Arc::new(MockSdk(self.clone()))
    }

    pub fn reject_location(&self, location: &str) {
        self.rejected_locations
            .lock()
            .unwrap()
            .push(location.to_string());
    }

    /// Fire a lifecycle callback the way the desktop would
    pub fn fire(&self, event: LifecycleEvent) {
        let guard = self.lifecycle.lock().unwrap();
        guard.as_ref().expect("no lifecycle subscriber").fire(event);
    }

    /// Press a plugin control by host key
    pub fn invoke(&self, key: &str) -> Result<()> {
        let bundles = self.bundles.lock().unwrap();
        let mut last = Err(DialerError::UnknownCommand(key.to_string()));
        for bundle in bundles.iter() {
            last = bundle.callbacks().invoke_key(key);
            if last.is_ok() {
                break;
            }
        }
        last
    }

    pub fn notices(&self) -> Vec<(String, Severity)> {
        self.notices.lock().unwrap().clone()
    }
}

pub struct MockSdk(pub Arc<MockHost>);

impl CrmSdk for MockSdk {
    fn interaction(&self) -> Option<Arc<dyn InteractionApi>> {
        Some(self.0.clone())
    }

    fn presence(&self) -> Option<Arc<dyn PresenceApi>> {
        Some(self.0.clone())
    }

    fn crm(&self) -> Option<Arc<dyn CrmApi>> {
        Some(self.0.clone())
    }

    fn application(&self) -> Option<Arc<dyn ApplicationApi>> {
        Some(self.0.clone())
    }

    fn components(&self) -> Result<Option<Arc<dyn ComponentsApi>>> {
        Ok(Some(self.0.clone()))
    }
}

#[async_trait]
impl InteractionApi for MockHost {
    fn subscribe(&self, callbacks: LifecycleCallbacks) -> Result<()> {
        *self.lifecycle.lock().unwrap() = Some(callbacks);
        Ok(())
    }

    async fn send_dtmf(&self, digit: DigitSymbol) -> Result<()> {
        self.sent.lock().unwrap().push(digit);
        if self.hold_dtmf.load(Ordering::SeqCst) {
            self.dtmf_gate.notified().await;
        }
        if self.fail_dtmf.load(Ordering::SeqCst) {
            return Err(DialerError::Transmit("line busy".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PresenceApi for MockHost {
    async fn set_status(&self, status: PresenceStatus) -> Result<()> {
        self.presence.lock().unwrap().push(status);
        if self.fail_presence.load(Ordering::SeqCst) {
            return Err(DialerError::Presence("denied".into()));
        }
        Ok(())
    }
}

impl CrmApi for MockHost {
    fn click_to_dial(&self, request: DialRequest) -> Result<()> {
        self.dialed.lock().unwrap().push(request);
        Ok(())
    }
}

impl ApplicationApi for MockHost {
    fn bring_to_front(&self) {
        self.fronted.fetch_add(1, Ordering::SeqCst);
    }

    fn notify(&self, message: &str, severity: Severity) {
        self.notices
            .lock()
            .unwrap()
            .push((message.to_string(), severity));
    }
}

impl ComponentsApi for MockHost {
    fn register_components(&self, bundle: ComponentBundle) -> Result<()> {
        let location = bundle.template().location.clone();
        if self.rejected_locations.lock().unwrap().contains(&location) {
            return Err(DialerError::Registration(format!("{} not available", location)));
        }
        self.bundles.lock().unwrap().push(bundle);
        Ok(())
    }
}

/// Wait until the session view satisfies `pred`
pub async fn wait_for_view<F>(rx: &mut watch::Receiver<SessionView>, pred: F) -> SessionView
where
    F: Fn(&SessionView) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|view| pred(view)))
        .await
        .expect("timed out waiting for session view")
        .expect("session closed")
        .clone()
}

/// Poll `cond` until it holds
pub async fn eventually<F>(cond: F)
where
    F: Fn() -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition never held");
}
