//! Call Session Controller
//!
//! Owns the call-active flag and everything the keypad touches:
//! - lifecycle callbacks are the only writers of `call_active`
//! - digits always land in the dial buffer; they are sent as DTMF only
//!   while a call is active
//! - the shared indicator flashes the outcome and reverts after a delay,
//!   reading `call_active` at revert time
//!
//! The controller runs as an actor (`run`) fed by `SessionHandle`s. Each
//! input is handled to completion before the next one is taken. Host calls
//! that answer asynchronously (DTMF, presence) run as their own tasks and
//! report back as replies, so a slow host never holds up other inputs.

use std::pin::Pin;
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use tokio::sync::{mpsc, watch};
use tokio::time::Sleep;
use tracing::{debug, error, info};

use crate::config::SessionConfig;
use crate::core::host::{HostCapabilities, LifecycleCallbacks};
use crate::error::{DialerError, Result};
use crate::types::{
    default_campaign_label, CommandId, DialRequest, DigitOutcome, DigitSymbol, IndicatorState,
    IndicatorTone, LifecycleEvent, PresenceStatus, SessionView, Severity,
};

lazy_static! {
    /// Everything a dial string may not contain
    static ref RE_NON_DIALABLE: Regex = Regex::new(r"[^0-9*#+]").unwrap();
}

/// Strip a free-text number down to `0-9 * # +`
pub fn sanitize_dial_number(input: &str) -> String {
    RE_NON_DIALABLE.replace_all(input, "").into_owned()
}

/// Inputs accepted by the session actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    Lifecycle(LifecycleEvent),
    Digit(DigitSymbol),
    Command(CommandId),
    SetDialNumber(String),
    SetCampaign(String),
}

/// Whether a key press was taken by the keypad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Key is a keypad symbol; propagation must stop
    Consumed(DigitSymbol),
    /// Not ours; let other handlers see it
    Ignored,
}

impl KeyDisposition {
    pub fn for_key(key: &str) -> Self {
        match DigitSymbol::from_key(key) {
            Some(digit) => Self::Consumed(digit),
            None => Self::Ignored,
        }
    }

    pub fn stop_propagation(&self) -> bool {
        matches!(self, Self::Consumed(_))
    }
}

/// Replies from host calls the session started
#[derive(Debug)]
enum HostReply {
    Dtmf {
        digit: DigitSymbol,
        result: Result<()>,
    },
    Presence {
        status: PresenceStatus,
        result: Result<()>,
    },
}

pub struct SessionController {
    host: HostCapabilities,
    call_active: bool,
    use_default_campaign: bool,
    dial_number: String,
    campaign: String,
    indicator: IndicatorState,
    /// Cancellable revert; replacing it cancels the previous one
    pending_revert: Option<Pin<Box<Sleep>>>,
    revert_delay: Duration,
    replies_tx: mpsc::UnboundedSender<HostReply>,
    replies: mpsc::UnboundedReceiver<HostReply>,
    host_calls_pending: usize,
    view_tx: watch::Sender<SessionView>,
}

impl SessionController {
    pub fn new(host: HostCapabilities, config: &SessionConfig) -> Self {
        let (view_tx, _) = watch::channel(SessionView {
            default_campaign_label: default_campaign_label(config.use_default_campaign),
            ..SessionView::default()
        });
        let (replies_tx, replies) = mpsc::unbounded_channel();
        Self {
            host,
            call_active: false,
            use_default_campaign: config.use_default_campaign,
            dial_number: String::new(),
            campaign: String::new(),
            indicator: IndicatorState::default(),
            pending_revert: None,
            revert_delay: config.indicator_revert(),
            replies_tx,
            replies,
            host_calls_pending: 0,
            view_tx,
        }
    }

    /// Start the actor on the current runtime
    pub fn spawn(self) -> SessionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let view = self.view_tx.subscribe();
        tokio::spawn(self.run(rx));
        SessionHandle { tx, view }
    }

    /// Process inputs, host replies and indicator reverts until every
    /// handle is dropped
    pub async fn run(mut self, mut inputs: mpsc::UnboundedReceiver<SessionInput>) {
        loop {
            tokio::select! {
                input = inputs.recv() => match input {
                    Some(input) => self.handle(input),
                    None => break,
                },
                Some(reply) = self.replies.recv() => self.on_host_reply(reply),
                () = revert_due(&mut self.pending_revert) => self.revert_indicator(),
            }
        }
        debug!(pending = self.host_calls_pending, "Session inputs closed");
    }

    /// Single entry point for every input. Never fails outward and never
    /// waits on the host.
    pub fn handle(&mut self, input: SessionInput) {
        match input {
            SessionInput::Lifecycle(event) => self.on_lifecycle_event(event),
            SessionInput::Digit(digit) => {
                self.dispatch_digit(digit);
            }
            SessionInput::Command(id) => self.handle_command(id),
            SessionInput::SetDialNumber(number) => self.set_dial_number(number),
            SessionInput::SetCampaign(campaign) => self.set_campaign(campaign),
        }
    }

    pub fn on_lifecycle_event(&mut self, event: LifecycleEvent) {
        let active = event.marks_active();
        if self.call_active != active {
            info!(%event, call_active = active, "Call state changed");
        }
        self.call_active = active;
        self.publish();
    }

    /// Append `digit` to the dial buffer and, during a call, start sending it
    /// as DTMF. The transmit settles later through `on_dtmf_result`.
    pub fn dispatch_digit(&mut self, digit: DigitSymbol) -> DigitOutcome {
        self.dial_number.push(digit.as_char());

        let interaction = self.host.interaction.clone().filter(|_| self.call_active);
        let Some(interaction) = interaction else {
            self.flash_indicator("No active call", IndicatorTone::Err);
            return DigitOutcome::NoActiveCall;
        };
        self.publish();

        let replies = self.replies_tx.clone();
        self.host_calls_pending += 1;
        tokio::spawn(async move {
            let result = interaction.send_dtmf(digit).await;
            // Fails only once the controller is gone
            let _ = replies.send(HostReply::Dtmf { digit, result });
        });
        DigitOutcome::Transmitting
    }

    /// Flash the outcome of a finished transmit
    pub fn on_dtmf_result(&mut self, digit: DigitSymbol, result: Result<()>) -> DigitOutcome {
        let outcome = match result {
            Ok(()) => {
                self.flash_indicator(format!("Sent DTMF {}", digit), IndicatorTone::Ok);
                DigitOutcome::Sent
            }
            Err(e) => {
                error!(%digit, error = %e, "sendDtmf failed");
                self.flash_indicator(format!("DTMF {} failed", digit), IndicatorTone::Err);
                DigitOutcome::Failed
            }
        };
        debug!(%digit, %outcome, "DTMF settled");
        outcome
    }

    fn on_presence_result(&mut self, status: PresenceStatus, result: Result<()>) {
        match result {
            Ok(()) => info!(%status, "Presence set"),
            Err(e) => {
                error!(%status, error = %e, "setPresence failed");
                self.host.notify("Presence change failed.", Severity::Error);
            }
        }
    }

    fn on_host_reply(&mut self, reply: HostReply) {
        self.host_calls_pending = self.host_calls_pending.saturating_sub(1);
        match reply {
            HostReply::Dtmf { digit, result } => {
                self.on_dtmf_result(digit, result);
            }
            HostReply::Presence { status, result } => self.on_presence_result(status, result),
        }
    }

    /// Wait for the next host reply and apply it. Returns `false` at once
    /// when no host call is pending.
    pub async fn settle_host_call(&mut self) -> bool {
        if self.host_calls_pending == 0 {
            return false;
        }
        match self.replies.recv().await {
            Some(reply) => {
                self.on_host_reply(reply);
                true
            }
            None => false,
        }
    }

    /// Keyboard entry: keypad symbols are dispatched, everything else ignored
    pub fn on_key(&mut self, key: &str) -> KeyDisposition {
        let disposition = KeyDisposition::for_key(key);
        if let KeyDisposition::Consumed(digit) = disposition {
            self.dispatch_digit(digit);
        }
        disposition
    }

    /// Show `text` on the indicator and restart the revert countdown
    pub fn flash_indicator(&mut self, text: impl Into<String>, tone: IndicatorTone) {
        self.indicator = IndicatorState::new(text, tone);
        self.pending_revert = Some(Box::pin(tokio::time::sleep(self.revert_delay)));
        self.publish();
    }

    fn revert_indicator(&mut self) {
        self.pending_revert = None;
        self.indicator = IndicatorState::resting(self.call_active);
        self.publish();
    }

    /// Wait for the pending revert and apply it. Returns `false` at once when
    /// nothing is pending.
    pub async fn wait_for_revert(&mut self) -> bool {
        if self.pending_revert.is_none() {
            return false;
        }
        revert_due(&mut self.pending_revert).await;
        self.revert_indicator();
        true
    }

    /// Dial the buffer. An empty sanitized number aborts silently.
    pub fn dial(&mut self) -> Option<DialRequest> {
        let number = sanitize_dial_number(&self.dial_number);
        if number.is_empty() {
            debug!("Nothing to dial");
            return None;
        }

        let campaign = self.campaign.trim();
        let request = DialRequest {
            click_to_dial_number: number,
            default_campaign: self.use_default_campaign,
            preselected_campaign_name: (!campaign.is_empty()).then(|| campaign.to_string()),
        };

        let Some(crm) = self.host.crm.clone() else {
            debug!("crmApi unavailable, dial skipped");
            return None;
        };
        match crm.click_to_dial(request.clone()) {
            Ok(()) => info!(number = %request.click_to_dial_number, "click2dial"),
            Err(e) => {
                error!(error = %e, "click2dial failed");
                self.host.notify("click2dial() failed.", Severity::Error);
            }
        }
        Some(request)
    }

    pub fn clear(&mut self) {
        self.dial_number.clear();
        self.publish();
    }

    pub fn set_dial_number(&mut self, number: impl Into<String>) {
        self.dial_number = number.into();
        self.publish();
    }

    pub fn set_campaign(&mut self, campaign: impl Into<String>) {
        self.campaign = campaign.into();
        self.publish();
    }

    /// Flip "use default campaign", returning the new value
    pub fn toggle_default_campaign(&mut self) -> bool {
        self.use_default_campaign = !self.use_default_campaign;
        self.publish();
        self.use_default_campaign
    }

    /// Start a presence change; failures are notified when the reply lands
    pub fn set_presence(&mut self, status: PresenceStatus) {
        let Some(presence) = self.host.presence.clone() else {
            debug!(%status, "presenceApi unavailable");
            return;
        };
        let replies = self.replies_tx.clone();
        self.host_calls_pending += 1;
        tokio::spawn(async move {
            let result = presence.set_status(status).await;
            let _ = replies.send(HostReply::Presence { status, result });
        });
    }

    pub fn bring_to_front(&self) {
        if let Some(app) = &self.host.application {
            app.bring_to_front();
        }
    }

    pub fn handle_command(&mut self, id: CommandId) {
        debug!(command = %id, "Command");
        match id {
            CommandId::Dial => {
                self.dial();
            }
            CommandId::Clear => self.clear(),
            CommandId::ToggleDefaultCampaign => {
                self.toggle_default_campaign();
            }
            CommandId::Presence(status) => self.set_presence(status),
            CommandId::BringToFront => self.bring_to_front(),
            CommandId::Digit(digit) => {
                self.dispatch_digit(digit);
            }
        }
    }

    pub fn call_active(&self) -> bool {
        self.call_active
    }

    pub fn use_default_campaign(&self) -> bool {
        self.use_default_campaign
    }

    pub fn dial_number(&self) -> &str {
        &self.dial_number
    }

    pub fn indicator(&self) -> &IndicatorState {
        &self.indicator
    }

    pub fn revert_pending(&self) -> bool {
        self.pending_revert.is_some()
    }

    /// Host calls started but not yet settled
    pub fn host_calls_pending(&self) -> usize {
        self.host_calls_pending
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            dial_number: self.dial_number.clone(),
            campaign: self.campaign.clone(),
            indicator: self.indicator.clone(),
            default_campaign_label: default_campaign_label(self.use_default_campaign),
            call_active: self.call_active,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view_tx.subscribe()
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.view());
    }
}

async fn revert_due(pending: &mut Option<Pin<Box<Sleep>>>) {
    match pending {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending::<()>().await,
    }
}

/// Cloneable entry point into a running session actor
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionInput>,
    view: watch::Receiver<SessionView>,
}

impl SessionHandle {
    pub fn send(&self, input: SessionInput) -> Result<()> {
        self.tx.send(input).map_err(|_| DialerError::SessionClosed)
    }

    pub fn lifecycle(&self, event: LifecycleEvent) -> Result<()> {
        self.send(SessionInput::Lifecycle(event))
    }

    pub fn digit(&self, digit: DigitSymbol) -> Result<()> {
        self.send(SessionInput::Digit(digit))
    }

    pub fn command(&self, id: CommandId) -> Result<()> {
        self.send(SessionInput::Command(id))
    }

    pub fn set_dial_number(&self, number: impl Into<String>) -> Result<()> {
        self.send(SessionInput::SetDialNumber(number.into()))
    }

    pub fn set_campaign(&self, campaign: impl Into<String>) -> Result<()> {
        self.send(SessionInput::SetCampaign(campaign.into()))
    }

    /// Keyboard hook. Keypad symbols are forwarded and reported as consumed.
    pub fn key_pressed(&self, key: &str) -> KeyDisposition {
        let disposition = KeyDisposition::for_key(key);
        if let KeyDisposition::Consumed(digit) = disposition {
            if let Err(e) = self.digit(digit) {
                debug!(%digit, error = %e, "Key dropped");
            }
        }
        disposition
    }

    /// Callbacks for the host's lifecycle subscription
    pub fn lifecycle_callbacks(&self) -> LifecycleCallbacks {
        let handle = self.clone();
        LifecycleCallbacks::from_sink(move |event| {
            if let Err(e) = handle.lifecycle(event) {
                debug!(%event, error = %e, "Lifecycle event dropped");
            }
        })
    }

    pub fn view(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::host::{CrmApi, InteractionApi};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    #[derive(Default)]
    struct FakeInteraction {
        fail: bool,
        /// When set, every transmit waits for a permit
        gate: Option<Arc<Notify>>,
        sent: Mutex<Vec<DigitSymbol>>,
    }

    #[async_trait]
    impl InteractionApi for FakeInteraction {
        fn subscribe(&self, _callbacks: LifecycleCallbacks) -> Result<()> {
            Ok(())
        }

        async fn send_dtmf(&self, digit: DigitSymbol) -> Result<()> {
            self.sent.lock().unwrap().push(digit);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                Err(DialerError::Transmit("rejected".into()))
            } else {
                Ok(())
            }
        }
    }

    #[derive(Default)]
    struct FakeCrm {
        dialed: Mutex<Vec<DialRequest>>,
    }

    impl CrmApi for FakeCrm {
        fn click_to_dial(&self, request: DialRequest) -> Result<()> {
            self.dialed.lock().unwrap().push(request);
            Ok(())
        }
    }

    fn controller(interaction: Arc<FakeInteraction>) -> SessionController {
        let host = HostCapabilities {
            interaction: Some(interaction),
            ..HostCapabilities::default()
        };
        SessionController::new(host, &SessionConfig::default())
    }

    #[test]
    fn test_sanitize_keeps_only_dialable() {
        assert_eq!(sanitize_dial_number("+1 (800) 555-1234"), "+18005551234");
        assert_eq!(sanitize_dial_number("*72#"), "*72#");
        assert_eq!(sanitize_dial_number("abc"), "");
        assert_eq!(sanitize_dial_number(""), "");
    }

    #[test]
    fn test_key_disposition() {
        assert_eq!(
            KeyDisposition::for_key("5"),
            KeyDisposition::Consumed(DigitSymbol::D5)
        );
        assert!(!KeyDisposition::for_key("Escape").stop_propagation());
    }

    #[tokio::test]
    async fn test_lifecycle_sets_call_active() {
        let mut c = controller(Arc::default());
        assert!(!c.call_active());
        c.on_lifecycle_event(LifecycleEvent::Started);
        assert!(c.call_active());
        c.on_lifecycle_event(LifecycleEvent::Started);
        assert!(c.call_active());
        c.on_lifecycle_event(LifecycleEvent::Finished);
        assert!(!c.call_active());
        c.on_lifecycle_event(LifecycleEvent::Accepted);
        assert!(c.call_active());
        c.on_lifecycle_event(LifecycleEvent::Ended);
        assert!(!c.call_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_digit_is_buffered_not_sent() {
        let interaction = Arc::new(FakeInteraction::default());
        let mut c = controller(interaction.clone());

        let outcome = c.dispatch_digit(DigitSymbol::D4);
        assert_eq!(outcome, DigitOutcome::NoActiveCall);
        assert_eq!(c.dial_number(), "4");
        assert_eq!(c.indicator().text, "No active call");
        assert_eq!(c.indicator().tone, IndicatorTone::Err);
        assert_eq!(c.host_calls_pending(), 0);
        assert!(interaction.sent.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_call_without_interaction_is_not_sent() {
        let mut c = SessionController::new(HostCapabilities::default(), &SessionConfig::default());
        c.on_lifecycle_event(LifecycleEvent::Started);

        assert_eq!(c.dispatch_digit(DigitSymbol::D7), DigitOutcome::NoActiveCall);
        assert_eq!(c.dial_number(), "7");
        assert_eq!(c.indicator().text, "No active call");
        assert_eq!(c.host_calls_pending(), 0);
        assert!(!c.settle_host_call().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_call_digit_sent_then_reverts() {
        let interaction = Arc::new(FakeInteraction::default());
        let mut c = controller(interaction.clone());
        let view = c.subscribe();
        c.on_lifecycle_event(LifecycleEvent::Accepted);

        assert_eq!(c.dispatch_digit(DigitSymbol::D7), DigitOutcome::Transmitting);
        assert_eq!(view.borrow().dial_number, "7");

        assert!(c.settle_host_call().await);
        assert_eq!(c.indicator().text, "Sent DTMF 7");
        assert_eq!(c.indicator().tone, IndicatorTone::Ok);
        assert_eq!(*interaction.sent.lock().unwrap(), vec![DigitSymbol::D7]);

        let start = tokio::time::Instant::now();
        assert!(c.wait_for_revert().await);
        assert!(start.elapsed() >= Duration::from_millis(1200));
        assert_eq!(c.indicator(), &IndicatorState::resting(true));
        assert!(!c.wait_for_revert().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transmit_failure_flashes_error() {
        let interaction = Arc::new(FakeInteraction {
            fail: true,
            ..FakeInteraction::default()
        });
        let mut c = controller(interaction);
        c.on_lifecycle_event(LifecycleEvent::Started);

        assert_eq!(c.dispatch_digit(DigitSymbol::Hash), DigitOutcome::Transmitting);
        assert!(c.settle_host_call().await);
        assert_eq!(c.indicator().text, "DTMF # failed");
        assert_eq!(c.indicator().tone, IndicatorTone::Err);
        assert_eq!(c.dial_number(), "#");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_transmit_does_not_hold_inputs() {
        let gate = Arc::new(Notify::new());
        let interaction = Arc::new(FakeInteraction {
            gate: Some(gate.clone()),
            ..FakeInteraction::default()
        });
        let mut c = controller(interaction.clone());

        c.on_lifecycle_event(LifecycleEvent::Started);
        assert_eq!(c.dispatch_digit(DigitSymbol::D1), DigitOutcome::Transmitting);
        c.on_lifecycle_event(LifecycleEvent::Ended);
        assert_eq!(c.dispatch_digit(DigitSymbol::D2), DigitOutcome::NoActiveCall);
        assert!(!c.call_active());
        assert_eq!(c.dial_number(), "12");
        assert_eq!(c.host_calls_pending(), 1);

        gate.notify_one();
        assert!(c.settle_host_call().await);
        assert_eq!(c.indicator().text, "Sent DTMF 1");
        assert_eq!(c.host_calls_pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_revert_reads_call_state_at_revert_time() {
        let mut c = controller(Arc::default());
        c.on_lifecycle_event(LifecycleEvent::Started);
        c.dispatch_digit(DigitSymbol::D1);
        c.settle_host_call().await;
        c.on_lifecycle_event(LifecycleEvent::Ended);

        c.wait_for_revert().await;
        assert_eq!(c.indicator().text, "DTMF: idle");
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_flash_cancels_pending_revert() {
        let mut c = controller(Arc::default());
        c.dispatch_digit(DigitSymbol::D1);
        tokio::time::advance(Duration::from_millis(800)).await;
        c.flash_indicator("second", IndicatorTone::Ok);

        // The first flash's deadline passes without reverting the second
        let early = tokio::time::timeout(Duration::from_millis(1000), c.wait_for_revert()).await;
        assert!(early.is_err());
        assert_eq!(c.indicator().text, "second");

        assert!(c.wait_for_revert().await);
        assert_eq!(c.indicator().text, "DTMF: idle");
    }

    #[tokio::test]
    async fn test_dial_aborts_on_empty_number() {
        let crm = Arc::new(FakeCrm::default());
        let host = HostCapabilities {
            crm: Some(crm.clone()),
            ..HostCapabilities::default()
        };
        let mut c = SessionController::new(host, &SessionConfig::default());

        c.set_dial_number("abc");
        assert_eq!(c.dial(), None);
        assert!(crm.dialed.lock().unwrap().is_empty());

        c.set_dial_number("+1 800-555-1234");
        c.set_campaign("  ");
        let request = c.dial().unwrap();
        assert_eq!(request.click_to_dial_number, "+18005551234");
        assert!(request.default_campaign);
        assert_eq!(request.preselected_campaign_name, None);
        assert_eq!(crm.dialed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_updates_label() {
        let mut c = controller(Arc::default());
        let view = c.subscribe();
        assert_eq!(view.borrow().default_campaign_label, "Use Default Campaign: On");

        assert!(!c.toggle_default_campaign());
        assert_eq!(view.borrow().default_campaign_label, "Use Default Campaign: Off");

        assert!(c.toggle_default_campaign());
        assert_eq!(view.borrow().default_campaign_label, "Use Default Campaign: On");
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_key_ignores_non_keypad() {
        let mut c = controller(Arc::default());
        assert_eq!(c.on_key("a"), KeyDisposition::Ignored);
        assert_eq!(c.dial_number(), "");
        assert_eq!(c.on_key("*"), KeyDisposition::Consumed(DigitSymbol::Star));
        assert_eq!(c.dial_number(), "*");
    }
}
