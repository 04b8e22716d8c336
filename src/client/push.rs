use anyhow::{anyhow, Result};
use futures_util::StreamExt;
use std::time::Duration;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::core::config::PushConfig;
use crate::core::PushSlot;

type PushStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Reads the server push channel and writes every decoded message into the
/// single-slot [`PushSlot`]. Framing beyond "one JSON object per text frame"
/// is not interpreted here.
pub struct PushListener {
    url: Url,
    config: PushConfig,
}

impl PushListener {
    pub fn new(url: Url, config: PushConfig) -> Self {
        Self { url, config }
    }

    /// Pump messages until the reader side of the slot is dropped or the
    /// reconnect budget is exhausted.
    pub async fn run(self, mut slot: PushSlot) -> Result<()> {
        let mut attempt = 0u32;

        loop {
            let mut stream = match connect_async(self.url.as_str()).await {
                Ok((stream, _)) => {
                    tracing::info!("Push channel connected to {}", self.url);
                    attempt = 0;
                    stream
                }
                Err(e) => {
                    if attempt >= self.config.max_attempts {
                        return Err(anyhow!(
                            "Failed to connect push channel after {} attempts: {}",
                            attempt + 1,
                            e
                        ));
                    }
                    let delay = reconnect_delay(&self.config, attempt);
                    tracing::warn!(
                        "Push channel connection attempt {} failed: {}. Retrying in {:.1}s",
                        attempt + 1,
                        e,
                        delay.as_secs_f64()
                    );
                    attempt += 1;
                    sleep(delay).await;
                    continue;
                }
            };

            if !pump(&mut stream, &mut slot).await {
                tracing::debug!("Push slot has no readers, stopping listener");
                return Ok(());
            }

            tracing::info!("Push channel closed, reconnecting");
            let delay = reconnect_delay(&self.config, attempt);
            attempt += 1;
            sleep(delay).await;
        }
    }
}

/// Forward frames until the socket ends. Returns false when nobody is
/// listening on the slot anymore.
async fn pump(stream: &mut PushStream, slot: &mut PushSlot) -> bool {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match slot.publish_json(&text) {
                Ok(true) => {}
                Ok(false) => return false,
                Err(e) => tracing::debug!("Ignoring undecodable push frame: {}", e),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!("Push channel error: {}", e);
                break;
            }
        }
    }
    true
}

/// Exponential backoff with a little jitter, capped at `max_delay_ms`.
pub fn reconnect_delay(config: &PushConfig, attempt: u32) -> Duration {
    let delay_ms = (config.base_delay_ms as f64 * config.backoff_factor.powi(attempt as i32))
        .min(config.max_delay_ms as f64) as u64;

    let jitter = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| (d.as_millis() % 250) as u64)
        .unwrap_or(0);

    Duration::from_millis(delay_ms + jitter)
}
