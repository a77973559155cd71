// Copyright (c) 2026 MXP contributors
//
// SPDX-License-Identifier: MIT
//! The chat demo itself (§4.12): two peers exchange one `message/send` call
//! over an in-memory signaling hub and a paired in-memory datagram channel,
//! proving the public API usable end to end without any real ICE/SDP stack.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use mxp_a2a::{from_mxp, to_mxp, Message};
use mxp_peer::testdouble::InMemoryConnection;
use mxp_peer::{ConnectionFactory, Dispatcher, PeerConfig, PeerConnection, PeerEvent};
use mxp_signaling::{MemoryHub, MemoryHubProvider};
use tokio::sync::mpsc;
use tracing::info;

/// Hands out one half of a pre-wired [`InMemoryConnection`] pair per side.
/// Each dispatcher in the demo only ever opens a single connection (to its
/// one known counterpart), so a one-shot factory is sufficient — no peer id
/// is threaded through `ConnectionFactory::create`.
struct LoopbackFactory {
    half: Mutex<Option<InMemoryConnection>>,
}

impl LoopbackFactory {
    fn pair() -> (Arc<LoopbackFactory>, Arc<LoopbackFactory>) {
        let (a, b) = InMemoryConnection::pair();
        (
            Arc::new(LoopbackFactory { half: Mutex::new(Some(a)) }),
            Arc::new(LoopbackFactory { half: Mutex::new(Some(b)) }),
        )
    }
}

impl ConnectionFactory for LoopbackFactory {
    fn create(&self) -> Arc<dyn PeerConnection> {
        let half = self.half.lock().unwrap().take().expect("loopback connection used only once per demo peer");
        Arc::new(half)
    }
}

/// Run the demo: `local_id` dials `remote_id` over `hub`, sends `message`
/// once connected, and `remote_id` echoes back an acknowledgement.
pub async fn run(local_id: &str, remote_id: &str, message: &str, peer_config: PeerConfig, hub: MemoryHub) -> anyhow::Result<()> {
    let (initiator_events_tx, mut initiator_events) = mpsc::unbounded_channel();
    let (responder_events_tx, mut responder_events) = mpsc::unbounded_channel();

    let initiator_signaling = Arc::new(MemoryHubProvider::new(local_id, hub.clone()));
    let responder_signaling = Arc::new(MemoryHubProvider::new(remote_id, hub));

    let (initiator_factory, responder_factory) = LoopbackFactory::pair();
    let initiator = Dispatcher::new(peer_config.clone(), initiator_signaling, initiator_factory, initiator_events_tx);
    let responder = Dispatcher::new(
        PeerConfig::new(remote_id),
        responder_signaling.clone(),
        responder_factory,
        responder_events_tx,
    );

    // The responder reacts to signaling and echoes any message it receives
    // back to the sender, driven entirely by its own event loop task.
    let responder_for_signaling = responder.clone();
    let responder_signaling_loop = {
        let signaling = responder_signaling.clone();
        tokio::spawn(async move {
            use futures::StreamExt;
            let mut incoming = signaling.subscribe();
            while let Some(msg) = incoming.next().await {
                responder_for_signaling.handle_signal(msg).await;
            }
        })
    };

    let responder_echo_loop = {
        let responder = responder.clone();
        tokio::spawn(async move {
            while let Some(event) = responder_events.recv().await {
                if let PeerEvent::Message { peer_id, frame } = event {
                    let Ok(bridged) = from_mxp(&frame) else { continue };
                    let Some(incoming) = bridged.message else { continue };
                    info!(from = %peer_id, text = %incoming.text_content(), "responder received message");
                    let reply = Message::agent_text(format!("ack: {}", incoming.text_content()));
                    let _ = responder.send(&peer_id, to_mxp(&reply)).await;
                }
            }
        })
    };

    info!(%local_id, %remote_id, "connecting");
    let peer = initiator.connect(remote_id).await.context("connecting to remote peer")?;

    // Drain the Connecting/Connected state-change events before sending.
    loop {
        match initiator_events.recv().await {
            Some(PeerEvent::StateChanged { state, .. }) if state == mxp_peer::PeerState::Connected => break,
            Some(_) => continue,
            None => anyhow::bail!("initiator peer events channel closed before connecting"),
        }
    }

    let outgoing = Message::user_text(message);
    println!("{local_id} -> {remote_id}: {}", outgoing.text_content());
    initiator.send(&peer.peer_id, to_mxp(&outgoing)).await.context("sending chat message")?;

    let reply = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match initiator_events.recv().await {
                Some(PeerEvent::Message { frame, .. }) => return Some(frame),
                Some(_) => continue,
                None => return None,
            }
        }
    })
    .await
    .context("timed out waiting for a reply")?;

    if let Some(frame) = reply {
        if let Ok(bridged) = from_mxp(&frame) {
            if let Some(message) = bridged.message {
                println!("{remote_id} -> {local_id}: {}", message.text_content());
            }
        }
    }

    responder_signaling_loop.abort();
    responder_echo_loop.abort();
    initiator.disconnect(&peer.peer_id).await;
    Ok(())
}
