// In-process WebSocket servers that speak the pylon wire dialect.
//
// Two flavors: [`HarnessServer`] auto-acknowledges every command and exposes
// a push feed, for demos and soak binaries that only need a live endpoint;
// [`ScriptedServer`] runs an explicit expect/reply/push/close script and
// fails when the client deviates from it, for tests that assert command
// order or drive deliberate closes.
use anyhow::{Context, Result, bail};
use futures_util::{SinkExt, StreamExt};
use pylon_wire::{
    Command, ConnectResult, Method, Publication, PublicationData, Push, Reply, ReplyError,
    SubscribeResult,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;
use tracing::{debug, info};

type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;

/// Stream epoch the harness reports in every subscribe ack.
pub const HARNESS_EPOCH: &str = "h1";

pub struct HarnessServer {
    addr: SocketAddr,
    push_tx: mpsc::UnboundedSender<String>,
    accepted: Arc<AtomicUsize>,
}

impl HarnessServer {
    /// Bind an ephemeral port and start accepting client connections.
    pub async fn spawn() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind harness listener")?;
        let addr = listener.local_addr().context("harness local addr")?;
        let (push_tx, push_rx) = mpsc::unbounded_channel();
        let accepted = Arc::new(AtomicUsize::new(0));
        tokio::spawn(run_server(listener, push_rx, Arc::clone(&accepted)));
        info!(%addr, "harness server listening");
        Ok(Self {
            addr,
            push_tx,
            accepted,
        })
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Queue a publication push for the connected client.
    pub fn push(&self, channel: &str, payload: &str, offset: u64) -> Result<()> {
        let frame = encode_push(channel, payload, offset)?;
        self.push_tx.send(frame).context("push feed closed")?;
        Ok(())
    }

    /// How many WebSocket connections the harness has accepted so far.
    pub fn connections_accepted(&self) -> usize {
        self.accepted.load(Ordering::Acquire)
    }
}

async fn run_server(
    listener: TcpListener,
    mut push_rx: mpsc::UnboundedReceiver<String>,
    accepted: Arc<AtomicUsize>,
) {
    // One live connection at a time; a reconnect replaces the previous one.
    loop {
        let Ok((socket, peer)) = listener.accept().await else {
            break;
        };
        accepted.fetch_add(1, Ordering::AcqRel);
        debug!(%peer, "harness accepted connection");
        if !serve_connection(socket, &mut push_rx).await {
            break;
        }
    }
}

/// Returns false when the push feed is gone and the server should stop.
async fn serve_connection(socket: TcpStream, push_rx: &mut mpsc::UnboundedReceiver<String>) -> bool {
    let mut ws = match accept_async(socket).await {
        Ok(ws) => ws,
        Err(err) => {
            debug!(error = %err, "harness handshake failed");
            return true;
        }
    };
    loop {
        tokio::select! {
            message = ws.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        for document in text.split('\n') {
                            let document = document.trim();
                            if document.is_empty() || document == "{}" {
                                continue;
                            }
                            let command: Command = match serde_json::from_str(document) {
                                Ok(command) => command,
                                Err(err) => {
                                    debug!(error = %err, "harness could not parse command");
                                    continue;
                                }
                            };
                            let reply = answer(&command);
                            if ws.send(Message::Text(reply.into())).await.is_err() {
                                return true;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return true,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        debug!(error = %err, "harness read failed");
                        return true;
                    }
                }
            }
            push = push_rx.recv() => {
                match push {
                    Some(frame) => {
                        if ws.send(Message::Text(frame.into())).await.is_err() {
                            return true;
                        }
                    }
                    None => return false,
                }
            }
        }
    }
}

/// Reply body a scripted `Expect` step answers with.
#[derive(Debug, Clone)]
pub enum ScriptReply {
    Connect(ConnectResult),
    Subscribe(SubscribeResult),
    Unsubscribe,
    Publish,
    Error(ReplyError),
}

/// One step of a scripted session, executed in order.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Read the next inbound command, assert its method, and answer it.
    Expect { method: Method, reply: ScriptReply },
    /// Push a publication to the client.
    Push {
        channel: String,
        payload: String,
        offset: u64,
    },
    /// Close the connection with the given close code; ends the script.
    Close { code: u16 },
}

impl ScriptStep {
    pub fn expect(method: Method, reply: ScriptReply) -> Self {
        ScriptStep::Expect { method, reply }
    }

    pub fn push(channel: impl Into<String>, payload: impl Into<String>, offset: u64) -> Self {
        ScriptStep::Push {
            channel: channel.into(),
            payload: payload.into(),
            offset,
        }
    }

    pub fn close(code: u16) -> Self {
        ScriptStep::Close { code }
    }
}

/// Server driven by an explicit step script over a single connection.
///
/// The script is the assertion: an out-of-order or unexpected command fails
/// the run, surfaced by [`ScriptedServer::finish`].
pub struct ScriptedServer {
    addr: SocketAddr,
    task: JoinHandle<Result<()>>,
}

impl ScriptedServer {
    pub async fn spawn(script: Vec<ScriptStep>) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind scripted listener")?;
        let addr = listener.local_addr().context("scripted local addr")?;
        let task = tokio::spawn(run_script(listener, script));
        info!(%addr, "scripted server listening");
        Ok(Self { addr, task })
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Await the script; an error means the client deviated from it.
    pub async fn finish(self) -> Result<()> {
        self.task.await.context("scripted server task")?
    }
}

async fn run_script(listener: TcpListener, script: Vec<ScriptStep>) -> Result<()> {
    let (socket, _) = listener.accept().await.context("accept connection")?;
    let mut ws = accept_async(socket).await.context("websocket handshake")?;
    for (index, step) in script.into_iter().enumerate() {
        match step {
            ScriptStep::Expect { method, reply } => {
                let command = read_command(&mut ws)
                    .await
                    .with_context(|| format!("step {index}: waiting for {}", method.as_str()))?;
                if command.method() != method {
                    bail!(
                        "step {index}: expected {} command, got {}",
                        method.as_str(),
                        command.method().as_str()
                    );
                }
                let frame = encode_scripted_reply(command.id, reply)?;
                ws.send(Message::Text(frame.into()))
                    .await
                    .with_context(|| format!("step {index}: send reply"))?;
            }
            ScriptStep::Push {
                channel,
                payload,
                offset,
            } => {
                let frame = encode_push(&channel, &payload, offset)?;
                ws.send(Message::Text(frame.into()))
                    .await
                    .with_context(|| format!("step {index}: send push"))?;
            }
            ScriptStep::Close { code } => {
                let frame = CloseFrame {
                    code: WsCloseCode::from(code),
                    reason: "".into(),
                };
                ws.send(Message::Close(Some(frame)))
                    .await
                    .with_context(|| format!("step {index}: send close"))?;
                return Ok(());
            }
        }
    }
    Ok(())
}

/// Read until a command arrives, skipping client pongs.
async fn read_command(ws: &mut WsStream) -> Result<Command> {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                for document in text.split('\n') {
                    let document = document.trim();
                    if document.is_empty() || document == "{}" {
                        continue;
                    }
                    return serde_json::from_str(document).context("parse command");
                }
            }
            Some(Ok(Message::Close(_))) | None => bail!("connection closed mid-script"),
            Some(Ok(_)) => {}
            Some(Err(err)) => return Err(err).context("read command"),
        }
    }
}

fn encode_scripted_reply(id: u32, reply: ScriptReply) -> Result<String> {
    let mut body = Reply {
        id,
        ..Default::default()
    };
    match reply {
        ScriptReply::Connect(result) => body.connect = Some(result),
        ScriptReply::Subscribe(result) => body.subscribe = Some(result),
        ScriptReply::Unsubscribe => body.unsubscribe = Some(Default::default()),
        ScriptReply::Publish => body.publish = Some(Default::default()),
        ScriptReply::Error(error) => body.error = Some(error),
    }
    serde_json::to_string(&body).context("encode scripted reply")
}

fn encode_push(channel: &str, payload: &str, offset: u64) -> Result<String> {
    let body = Reply {
        push: Some(Push {
            channel: channel.to_string(),
            publication: Some(Publication {
                offset,
                data: PublicationData {
                    payload: payload.to_string(),
                },
            }),
            ..Default::default()
        }),
        ..Default::default()
    };
    serde_json::to_string(&body).context("encode push")
}

fn answer(command: &Command) -> String {
    let mut reply = Reply {
        id: command.id,
        ..Default::default()
    };
    match command.method() {
        Method::Connect => {
            reply.connect = Some(ConnectResult {
                client: "harness".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ping: 25,
                pong: false,
                subs: Default::default(),
            });
        }
        Method::Subscribe => {
            reply.subscribe = Some(SubscribeResult {
                epoch: HARNESS_EPOCH.to_string(),
                offset: 0,
                recoverable: true,
                publications: Vec::new(),
                data: None,
            });
        }
        Method::Unsubscribe => {
            reply.unsubscribe = Some(Default::default());
        }
        Method::Publish => {
            reply.publish = Some(Default::default());
        }
    }
    serde_json::to_string(&reply).expect("encode harness reply")
}
