//! WebSocket follower for the live event channel

use super::live_log::LiveEventLog;
use crate::{Error, Result};
use futures_util::StreamExt;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

pub const MSG_CONNECTED: &str = "WS connected";
pub const MSG_CLOSED: &str = "WS closed";
pub const MSG_ERROR: &str = "WS error";

/// Connect to `url` and feed every message into `log` until the channel closes.
///
/// `on_update` runs after each change to the log. A failed connection is
/// logged as "WS init failed: ..." and returned as `Error::StreamInit`; a
/// read error after connecting is logged and ends the stream normally.
pub async fn follow<F>(url: &str, log: &mut LiveEventLog, mut on_update: F) -> Result<()>
where
    F: FnMut(&LiveEventLog),
{
    let (mut ws, _response) = match tokio_tungstenite::connect_async(url).await {
        Ok(conn) => conn,
        Err(e) => {
            warn!("Live stream {} unavailable: {}", url, e);
            log.push_status(format!("WS init failed: {}", e));
            on_update(log);
            return Err(Error::StreamInit(e.to_string()));
        }
    };
    info!(url, "Live stream connected");
    log.push_status(MSG_CONNECTED);
    on_update(log);

    while let Some(message) = ws.next().await {
        match message {
            Ok(Message::Text(text)) => {
                log.push_message(text.as_str());
            }
            Ok(Message::Binary(bytes)) => {
                log.push_message(&String::from_utf8_lossy(&bytes));
            }
            Ok(Message::Close(_)) => break,
            // Ping/pong are answered by tungstenite
            Ok(_) => continue,
            Err(e) => {
                warn!("Live stream error: {}", e);
                log.push_status(MSG_ERROR);
                on_update(log);
                break;
            }
        }
        on_update(log);
    }

    info!(url, "Live stream closed");
    log.push_status(MSG_CLOSED);
    on_update(log);
    Ok(())
}
