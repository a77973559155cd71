//! Socket-relay backend: a signaling channel carried over a WebSocket to a
//! shared relay server, each [`SignalMessage`] serialized as a JSON text
//! frame. Reconnects with exponential backoff when the socket drops.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use crate::error::SignalingError;
use crate::provider::SignalingProvider;
use crate::types::SignalMessage;

/// Backoff schedule for reconnect attempts: `base * attempt`, capped at
/// `max_attempts` before giving up.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub base: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy { base: Duration::from_secs(1), max_attempts: 5 }
    }
}

/// A [`SignalingProvider`] that relays messages through a remote WebSocket
/// server, reconnecting on its own when the connection drops.
pub struct SocketRelay {
    local_id: String,
    outgoing_tx: mpsc::UnboundedSender<SignalMessage>,
    incoming_tx: Arc<Mutex<Option<mpsc::UnboundedSender<SignalMessage>>>>,
    incoming_rx: Mutex<Option<mpsc::UnboundedReceiver<SignalMessage>>>,
}

impl SocketRelay {
    /// Connect to `url` (with a `peer_id` query parameter identifying
    /// `local_id` to the relay) and spawn the background read/write task.
    /// The connection is (re)established lazily; construction never blocks.
    pub fn new(url: impl Into<String>, local_id: impl Into<String>, policy: ReconnectPolicy) -> Self {
        let local_id = local_id.into();
        let url = url.into();
        let connect_url = with_peer_id_query(&url, &local_id);
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        let incoming_tx = Arc::new(Mutex::new(Some(incoming_tx)));

        tokio::spawn(run_connection(connect_url, outgoing_rx, incoming_tx.clone(), policy));

        SocketRelay { local_id, outgoing_tx, incoming_tx, incoming_rx: Mutex::new(Some(incoming_rx)) }
    }
}

/// Append `?peer_id=<local_id>` to `url`, so the relay can identify which
/// peer a connection belongs to (§4.6). Falls back to the raw URL, unchanged,
/// if it doesn't parse — `connect_async` will then surface the real error.
fn with_peer_id_query(url: &str, local_id: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            parsed.query_pairs_mut().append_pair("peer_id", local_id);
            parsed.to_string()
        }
        Err(e) => {
            warn!(url, error = %e, "signaling URL did not parse, connecting without a peer_id query param");
            url.to_string()
        }
    }
}

async fn run_connection(
    url: String,
    mut outgoing_rx: mpsc::UnboundedReceiver<SignalMessage>,
    incoming_tx: Arc<Mutex<Option<mpsc::UnboundedSender<SignalMessage>>>>,
    policy: ReconnectPolicy,
) {
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match tokio_tungstenite::connect_async(&url).await {
            Ok((ws, _response)) => {
                info!(url = %url, "signaling socket connected");
                attempt = 0;
                let (mut write, mut read) = ws.split();

                loop {
                    tokio::select! {
                        outgoing = outgoing_rx.recv() => {
                            match outgoing {
                                Some(msg) => {
                                    let text = match serde_json::to_string(&msg) {
                                        Ok(t) => t,
                                        Err(e) => { warn!(error = %e, "failed to serialize signaling message"); continue; }
                                    };
                                    if let Err(e) = write.send(WsMessage::Text(text)).await {
                                        warn!(error = %e, "signaling socket write failed");
                                        break;
                                    }
                                }
                                None => return, // provider dropped, give up entirely
                            }
                        }
                        incoming = read.next() => {
                            match incoming {
                                Some(Ok(WsMessage::Text(text))) => {
                                    match serde_json::from_str::<SignalMessage>(&text) {
                                        Ok(msg) => {
                                            if let Some(tx) = incoming_tx.lock().await.as_ref() {
                                                let _ = tx.send(msg);
                                            }
                                        }
                                        Err(e) => debug!(error = %e, "ignoring malformed signaling frame"),
                                    }
                                }
                                Some(Ok(_)) => {} // ping/pong/binary frames carry no signaling payload
                                Some(Err(e)) => {
                                    warn!(error = %e, "signaling socket read failed");
                                    break;
                                }
                                None => {
                                    warn!("signaling socket closed by relay");
                                    break;
                                }
                            }
                        }
                    }
                }
            }
            Err(e) => {
                warn!(url = %url, attempt, error = %e, "signaling socket connect failed");
            }
        }

        if attempt >= policy.max_attempts {
            warn!(attempts = attempt, "signaling socket reconnect attempts exhausted, giving up");
            return;
        }
        tokio::time::sleep(policy.base * attempt).await;
    }
}

#[async_trait]
impl SignalingProvider for SocketRelay {
    async fn send(&self, msg: SignalMessage) -> Result<(), SignalingError> {
        self.outgoing_tx.send(msg).map_err(|_| SignalingError::NotConnected)
    }

    fn subscribe(&self) -> BoxStream<'static, SignalMessage> {
        let rx = self.incoming_rx.try_lock().ok().and_then(|mut g| g.take()).expect("subscribe called more than once");
        Box::pin(tokio_stream::wrappers::UnboundedReceiverStream::new(rx))
    }

    fn local_id(&self) -> &str {
        &self.local_id
    }
}
