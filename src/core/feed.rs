//! Agent event feed consumers
//!
//! Each message is decoded and handed to the synchronizer in delivery order.
//! Malformed messages are logged and dropped. No reconnection: when the
//! transport closes, consumption ends.

use futures_util::StreamExt;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::core::progress::ProgressSynchronizer;
use crate::error::{DialerError, Result};
use crate::types::ProgressEvent;

pub fn decode_event(text: &str) -> Result<ProgressEvent> {
    Ok(serde_json::from_str(text)?)
}

/// Decode and apply one raw message. Returns whether it decoded.
pub fn apply_message(sync: &mut ProgressSynchronizer, text: &str) -> bool {
    match decode_event(text) {
        Ok(evt) => {
            sync.on_progress_event(&evt);
            true
        }
        Err(e) => {
            warn!(error = %e, "Dropping malformed feed message");
            false
        }
    }
}

/// Newline-delimited JSON events (stdin mode). Returns messages applied.
pub async fn consume_lines<R>(reader: R, sync: &mut ProgressSynchronizer) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut applied = 0;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if apply_message(sync, line) {
            applied += 1;
        }
    }
    debug!(applied, "Line feed ended");
    Ok(applied)
}

/// Live websocket feed
pub async fn consume_websocket(url: &str, sync: &mut ProgressSynchronizer) -> Result<()> {
    let (mut ws, _) = connect_async(url)
        .await
        .map_err(|e| DialerError::Feed(e.to_string()))?;
    info!(%url, "Agent feed connected");
    sync.on_feed_connected();

    while let Some(frame) = ws.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                apply_message(sync, &text);
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Agent feed error");
                break;
            }
        }
    }

    info!("Agent feed disconnected");
    sync.on_feed_closed();
    Ok(())
}
