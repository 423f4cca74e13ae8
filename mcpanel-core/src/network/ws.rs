//! Production [`Link`] over a WebSocket.
//!
//! Each `open` spawns one session task that connects, then pumps frames
//! both ways until the socket ends or the session is cancelled. Everything
//! the task observes is posted to the dashboard's input queue as
//! [`Input::Link`], tagged with the generation it was opened for.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::dashboard::Input;
use crate::error::PanelError;
use crate::network::{Endpoint, Link, LinkEvent};

/// Close code reported when the connection ends without a close frame.
const ABNORMAL_CLOSURE: u16 = 1006;
/// Close code reported for a close frame with no status.
const NO_STATUS: u16 = 1005;

#[derive(Debug)]
struct Session {
    outbound: mpsc::UnboundedSender<Message>,
    cancel: CancellationToken,
}

/// WebSocket link driven by a background task per connection.
#[derive(Debug)]
pub struct WsLink {
    inputs: mpsc::UnboundedSender<Input>,
    connect_timeout: Duration,
    session: Option<Session>,
}

impl WsLink {
    pub fn new(inputs: mpsc::UnboundedSender<Input>, connect_timeout: Duration) -> Self {
        Self {
            inputs,
            connect_timeout,
            session: None,
        }
    }
}

impl Link for WsLink {
    fn open(&mut self, endpoint: &Endpoint, generation: u64) {
        self.close();

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        tokio::spawn(run_session(
            endpoint.url(),
            generation,
            self.connect_timeout,
            self.inputs.clone(),
            outbound_rx,
            cancel.clone(),
        ));
        self.session = Some(Session { outbound, cancel });
    }

    fn send(&mut self, frame: String) -> Result<(), PanelError> {
        let session = self.session.as_ref().ok_or(PanelError::ChannelNotOpen)?;
        session.outbound.send(Message::Text(frame.into()))?;
        Ok(())
    }

    fn close(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancel.cancel();
        }
    }
}

impl Drop for WsLink {
    fn drop(&mut self) {
        self.close();
    }
}

fn report(inputs: &mpsc::UnboundedSender<Input>, generation: u64, event: LinkEvent) {
    // The dashboard may already be gone during shutdown.
    let _ = inputs.send(Input::Link { generation, event });
}

async fn run_session(
    url: String,
    generation: u64,
    connect_timeout: Duration,
    inputs: mpsc::UnboundedSender<Input>,
    mut outbound_rx: mpsc::UnboundedReceiver<Message>,
    cancel: CancellationToken,
) {
    debug!(%url, generation, "connecting");
    let connect = tokio::time::timeout(connect_timeout, connect_async(url.as_str()));
    let ws = tokio::select! {
        _ = cancel.cancelled() => return,
        result = connect => match result {
            Ok(Ok((ws, _response))) => ws,
            Ok(Err(e)) => {
                warn!(%url, "connect failed: {e}");
                report(&inputs, generation, LinkEvent::Closed {
                    code: ABNORMAL_CLOSURE,
                    reason: e.to_string(),
                });
                return;
            }
            Err(_) => {
                warn!(%url, "connect timed out after {connect_timeout:?}");
                report(&inputs, generation, LinkEvent::Closed {
                    code: ABNORMAL_CLOSURE,
                    reason: "connect timed out".into(),
                });
                return;
            }
        },
    };

    report(&inputs, generation, LinkEvent::Opened);
    let (mut sink, mut stream) = ws.split();

    let (code, reason) = loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                return;
            }
            Some(msg) = outbound_rx.recv() => {
                if let Err(e) = sink.send(msg).await {
                    break (ABNORMAL_CLOSURE, e.to_string());
                }
            }
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    report(&inputs, generation, LinkEvent::Frame(text.as_str().to_string()));
                }
                Some(Ok(Message::Close(frame))) => {
                    break frame
                        .map(|f| (u16::from(f.code), f.reason.as_str().to_string()))
                        .unwrap_or((NO_STATUS, String::new()));
                }
                // ping/pong are answered by tungstenite; binary is not part of the protocol
                Some(Ok(_)) => {}
                Some(Err(e)) => break (ABNORMAL_CLOSURE, e.to_string()),
                None => break (ABNORMAL_CLOSURE, "connection reset".to_string()),
            },
        }
    };

    debug!(generation, code, %reason, "socket closed");
    report(&inputs, generation, LinkEvent::Closed { code, reason });
}
