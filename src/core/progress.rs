//! Progress Stream Synchronizer
//!
//! Reduces agent-feed events into two gauges, one banner and an idle reset.
//! Every event re-renders the affected gauge from its own fields, so repeated
//! delivery of the same event is harmless and the last write wins.
//!
//! Rules (checked independently for each event):
//! - dialing + Inbound: inbound = p, active iff p > 0, glow iff p > 70
//! - dialing + Outbound: outbound = p, label = stage name or placeholder
//! - connected: single banner; the matching gauge is forced to 100
//! - idle: no banner, both gauges 0, placeholders restored

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::core::host::Navigator;
use crate::types::{
    Banner, Direction, EventKind, GaugePair, ProgressEvent, ProgressView,
    OUTBOUND_CONNECTED_LABEL, OUTBOUND_DIALING_LABEL, STATUS_FEED_CLOSED, STATUS_FEED_CONNECTED,
    STATUS_READY,
};
use crate::{GAUGE_MAX, GLOW_THRESHOLD};

/// CRM contact page for a connected lead
pub fn contact_url(location_ref: &str, contact_ref: &str) -> String {
    format!(
        "https://app.gohighlevel.com/v2/location/{}/contacts/detail/{}",
        location_ref, contact_ref
    )
}

pub struct ProgressSynchronizer {
    view: ProgressView,
    navigator: Arc<dyn Navigator>,
    view_tx: watch::Sender<ProgressView>,
}

impl ProgressSynchronizer {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        let view = ProgressView::default();
        let (view_tx, _) = watch::channel(view.clone());
        Self {
            view,
            navigator,
            view_tx,
        }
    }

    /// Apply one received event. Unrecognized combinations change nothing.
    pub fn on_progress_event(&mut self, evt: &ProgressEvent) {
        let mut applied = false;

        if evt.event == EventKind::Dialing && evt.direction == Some(Direction::Inbound) {
            let p = evt.gauge_progress();
            let inbound = &mut self.view.gauges.inbound;
            inbound.progress = p;
            inbound.active = p > 0;
            inbound.glow = p > GLOW_THRESHOLD;
            applied = true;
        }

        if evt.event == EventKind::Dialing && evt.direction == Some(Direction::Outbound) {
            let outbound = &mut self.view.gauges.outbound;
            outbound.progress = evt.gauge_progress();
            outbound.label = evt
                .stage_label()
                .unwrap_or(OUTBOUND_DIALING_LABEL)
                .to_string();
            applied = true;
        }

        if evt.event == EventKind::Connected {
            self.on_connected(evt);
            applied = true;
        }

        if evt.event == EventKind::Idle {
            self.view.banner = None;
            self.view.gauges = GaugePair::default();
            self.view.status = Some(STATUS_READY.to_string());
            applied = true;
        }

        if applied {
            self.publish();
        } else {
            debug!(event = ?evt.event, direction = ?evt.direction, "Ignoring progress event");
        }
    }

    fn on_connected(&mut self, evt: &ProgressEvent) {
        let direction = evt.direction.unwrap_or(Direction::Outbound);
        self.view.banner = Some(Banner { direction });

        if direction == Direction::Inbound {
            let inbound = &mut self.view.gauges.inbound;
            inbound.progress = GAUGE_MAX;
            inbound.active = false;
            inbound.glow = false;
        } else {
            let outbound = &mut self.view.gauges.outbound;
            outbound.progress = GAUGE_MAX;
            outbound.label = OUTBOUND_CONNECTED_LABEL.to_string();
        }

        if let Some((location, contact)) = evt.lead.as_ref().and_then(|lead| lead.references()) {
            let url = contact_url(location, contact);
            info!(%direction, "Connected, opening lead");
            self.navigator.open(&url);
        }
    }

    pub fn on_feed_connected(&mut self) {
        self.view.status = Some(STATUS_FEED_CONNECTED.to_string());
        self.publish();
    }

    pub fn on_feed_closed(&mut self) {
        self.view.status = Some(STATUS_FEED_CLOSED.to_string());
        self.publish();
    }

    pub fn view(&self) -> &ProgressView {
        &self.view
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressView> {
        self.view_tx.subscribe()
    }

    fn publish(&mut self) {
        self.view.updated_at = Utc::now();
        self.view_tx.send_replace(self.view.clone());
    }
}
