// Transport contract and the default WebSocket implementation.
//
// The client core only sees the `Transport` trait and the event queue; the
// concrete socket library stays behind this crate so tests can substitute a
// scripted transport.
use anyhow::{Context, Result};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;
use tracing::debug;

/// Socket lifecycle as observed through `Transport::state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Connecting,
    Open,
    Closing,
    Closed,
}

/// Callbacks from the socket, delivered as queue events so the client core
/// consumes them on its own dispatch context.
#[derive(Debug)]
pub enum TransportEvent {
    Opened,
    Message(Bytes),
    Error(String),
    /// Terminal event; the close code is absent when the peer vanished
    /// without a close frame.
    Closed(Option<u16>),
}

/// One live socket. A fresh instance is created per connect attempt and
/// discarded on close; instances are never reopened.
pub trait Transport: Send + Sync {
    /// Queue a frame for sending. Frames queued before the socket opens are
    /// buffered and flushed once it does.
    fn send(&self, frame: Bytes) -> Result<()>;
    /// Begin the close handshake. The terminal `Closed` event follows on the
    /// event queue.
    fn close(&self);
    fn state(&self) -> TransportState;
}

/// Creates a transport per connect attempt.
pub trait TransportFactory: Send + Sync {
    fn create(&self, url: &str, events: mpsc::Sender<TransportEvent>) -> Box<dyn Transport>;
}

enum Outbound {
    Frame(Bytes),
    Close,
}

/// Default transport over tokio-tungstenite.
pub struct WebSocketTransport {
    outbound: mpsc::UnboundedSender<Outbound>,
    state: Arc<Mutex<TransportState>>,
}

/// Factory for [`WebSocketTransport`].
#[derive(Debug, Default, Clone)]
pub struct WebSocketFactory;

impl TransportFactory for WebSocketFactory {
    fn create(&self, url: &str, events: mpsc::Sender<TransportEvent>) -> Box<dyn Transport> {
        Box::new(WebSocketTransport::spawn(url, events))
    }
}

impl WebSocketTransport {
    fn spawn(url: &str, events: mpsc::Sender<TransportEvent>) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(TransportState::Connecting));
        tokio::spawn(run_socket(
            url.to_string(),
            events,
            outbound_rx,
            Arc::clone(&state),
        ));
        Self {
            outbound: outbound_tx,
            state,
        }
    }
}

impl Transport for WebSocketTransport {
    fn send(&self, frame: Bytes) -> Result<()> {
        self.outbound
            .send(Outbound::Frame(frame))
            .map_err(|_| anyhow::anyhow!("transport is closed"))
    }

    fn close(&self) {
        set_state(&self.state, TransportState::Closing);
        let _ = self.outbound.send(Outbound::Close);
    }

    fn state(&self) -> TransportState {
        *self.state.lock().expect("transport state lock")
    }
}

fn set_state(state: &Arc<Mutex<TransportState>>, next: TransportState) {
    *state.lock().expect("transport state lock") = next;
}

async fn run_socket(
    url: String,
    events: mpsc::Sender<TransportEvent>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    state: Arc<Mutex<TransportState>>,
) {
    let stream = match connect_async(url.as_str()).await.context("websocket connect") {
        Ok((stream, _response)) => stream,
        Err(err) => {
            debug!(url = %url, error = %err, "websocket connect failed");
            set_state(&state, TransportState::Closed);
            let _ = events.send(TransportEvent::Error(err.to_string())).await;
            let _ = events.send(TransportEvent::Closed(None)).await;
            return;
        }
    };
    debug!(url = %url, "websocket open");
    set_state(&state, TransportState::Open);
    if events.send(TransportEvent::Opened).await.is_err() {
        return;
    }

    let (mut write, mut read) = stream.split();

    let writer_events = events.clone();
    let writer = tokio::spawn(async move {
        while let Some(item) = outbound.recv().await {
            let message = match item {
                Outbound::Frame(frame) => match String::from_utf8(frame.to_vec()) {
                    Ok(text) => Message::Text(text.into()),
                    Err(_) => Message::Binary(frame),
                },
                Outbound::Close => {
                    let frame = CloseFrame {
                        code: WsCloseCode::Normal,
                        reason: "".into(),
                    };
                    let _ = write.send(Message::Close(Some(frame))).await;
                    break;
                }
            };
            if let Err(err) = write.send(message).await {
                debug!(error = %err, "websocket send failed");
                let _ = writer_events
                    .send(TransportEvent::Error(err.to_string()))
                    .await;
                break;
            }
        }
    });

    // Single reader owns the terminal Closed event.
    let mut close_code = None;
    loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => {
                let frame = Bytes::copy_from_slice(text.as_bytes());
                if events.send(TransportEvent::Message(frame)).await.is_err() {
                    break;
                }
            }
            Some(Ok(Message::Binary(frame))) => {
                if events.send(TransportEvent::Message(frame)).await.is_err() {
                    break;
                }
            }
            Some(Ok(Message::Close(frame))) => {
                close_code = frame.map(|frame| u16::from(frame.code));
                break;
            }
            Some(Ok(_)) => {}
            Some(Err(err)) => {
                debug!(error = %err, "websocket read failed");
                let _ = events.send(TransportEvent::Error(err.to_string())).await;
                break;
            }
            None => break,
        }
    }
    writer.abort();
    set_state(&state, TransportState::Closed);
    let _ = events.send(TransportEvent::Closed(close_code)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio::time::{Duration, timeout};
    use tokio_tungstenite::accept_async;

    async fn next_event(events: &mut mpsc::Receiver<TransportEvent>) -> TransportEvent {
        timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("event timeout")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn open_send_receive_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.expect("accept");
            let mut ws = accept_async(socket).await.expect("handshake");
            let inbound = ws.next().await.expect("client frame").expect("frame");
            assert_eq!(inbound.into_text().expect("text").as_str(), "{\"id\":1}");
            ws.send(Message::Text("{\"id\":1,\"connect\":{}}".into()))
                .await
                .expect("send");
            ws.send(Message::Close(Some(CloseFrame {
                code: WsCloseCode::from(4333),
                reason: "".into(),
            })))
            .await
            .expect("close");
        });

        let (events_tx, mut events) = mpsc::channel(16);
        let transport = WebSocketFactory.create(&format!("ws://{addr}"), events_tx);
        // Queued before open; must be flushed after the handshake.
        transport
            .send(Bytes::from_static(b"{\"id\":1}"))
            .expect("send");

        assert!(matches!(next_event(&mut events).await, TransportEvent::Opened));
        assert_eq!(transport.state(), TransportState::Open);
        match next_event(&mut events).await {
            TransportEvent::Message(frame) => {
                assert_eq!(frame.as_ref(), b"{\"id\":1,\"connect\":{}}")
            }
            other => panic!("unexpected event: {other:?}"),
        }
        match next_event(&mut events).await {
            TransportEvent::Closed(code) => assert_eq!(code, Some(4333)),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(transport.state(), TransportState::Closed);
        server.await.expect("server");
    }

    #[tokio::test]
    async fn failed_connect_reports_error_then_closed() {
        let (events_tx, mut events) = mpsc::channel(16);
        // Nothing listens on this port.
        let transport = WebSocketFactory.create("ws://127.0.0.1:1", events_tx);
        assert!(matches!(
            next_event(&mut events).await,
            TransportEvent::Error(_)
        ));
        assert!(matches!(
            next_event(&mut events).await,
            TransportEvent::Closed(None)
        ));
        assert_eq!(transport.state(), TransportState::Closed);
    }

    #[tokio::test]
    async fn client_close_completes_handshake() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.expect("accept");
            let mut ws = accept_async(socket).await.expect("handshake");
            // Echo the close frame so the client observes the code.
            while let Some(Ok(message)) = ws.next().await {
                if let Message::Close(frame) = message {
                    let _ = ws.send(Message::Close(frame)).await;
                    break;
                }
            }
        });

        let (events_tx, mut events) = mpsc::channel(16);
        let transport = WebSocketFactory.create(&format!("ws://{addr}"), events_tx);
        assert!(matches!(next_event(&mut events).await, TransportEvent::Opened));
        transport.close();
        assert_eq!(transport.state(), TransportState::Closing);
        match next_event(&mut events).await {
            TransportEvent::Closed(code) => assert_eq!(code, Some(1000)),
            other => panic!("unexpected event: {other:?}"),
        }
        server.await.expect("server");
    }
}
