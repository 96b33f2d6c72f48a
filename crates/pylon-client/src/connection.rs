// Connection lifecycle: handshake, dispatch loop, reconnect policy.
use crate::backoff::ExponentialBackoff;
use crate::commands::{CommandRegistry, next_command_id};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::reachability::NetworkProbe;
use crate::registry::SubscriptionRegistry;
use crate::scheduler::{ActionId, Scheduler};
use crate::subscription::{Subscription, SubscriptionState};
use crate::telemetry;
use crate::token::ChannelTokenProvider;
use bytes::Bytes;
use pylon_transport::{Transport, TransportEvent, TransportFactory};
use pylon_wire::{
    CloseCode, Command, ConnectRequest, ConnectResult, HEARTBEAT_FRAME, PublicationData,
    PublishRequest, Push, Reply, decode_frames, encode_command,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

/// Observed connection lifecycle. Reconnection intent is tracked separately;
/// a client that wants a connection can still be `Disconnected` while a
/// retry timer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnecting => "disconnecting",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PingSettings {
    interval: Duration,
    pong_required: bool,
}

/// Realtime messaging client. Cheap to clone; all clones share one
/// connection.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    config: ClientConfig,
    access_token: Mutex<String>,
    transport_factory: Box<dyn TransportFactory>,
    probe: Box<dyn NetworkProbe>,
    commands: CommandRegistry,
    registry: SubscriptionRegistry,
    scheduler: Scheduler,
    backoff: Mutex<ExponentialBackoff>,
    state_tx: watch::Sender<ConnectionState>,
    want_connected: AtomicBool,
    disabled: AtomicBool,
    // Bumped per connect attempt; events from a superseded transport are
    // dropped by comparing against this.
    generation: AtomicU64,
    transport: Mutex<Option<Arc<dyn Transport>>>,
    reconnect_action: Mutex<Option<ActionId>>,
    ping_action: Mutex<Option<ActionId>>,
    ping: Mutex<Option<PingSettings>>,
    connect_waiters: Mutex<Vec<oneshot::Sender<Result<()>>>>,
    disconnect_waiters: Mutex<Vec<oneshot::Sender<()>>>,
    connected_observers: Mutex<Vec<Arc<dyn Fn() + Send + Sync>>>,
    disconnected_observers: Mutex<Vec<Arc<dyn Fn(CloseCode) + Send + Sync>>>,
}

impl Client {
    /// Build a client over the default WebSocket transport.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(
            config,
            Box::new(pylon_transport::WebSocketFactory),
            Box::new(crate::reachability::AlwaysReachable),
        )
    }

    /// Build a client over an explicit transport factory and network probe.
    pub fn with_transport(
        config: ClientConfig,
        transport_factory: Box<dyn TransportFactory>,
        probe: Box<dyn NetworkProbe>,
    ) -> Self {
        let backoff = ExponentialBackoff::new(
            config.backoff_base,
            config.backoff_cap,
            config.backoff_jitter,
        );
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let access_token = config.access_token.clone();
        let inner = Arc::new(ClientInner {
            config,
            access_token: Mutex::new(access_token),
            transport_factory,
            probe,
            commands: CommandRegistry::new(),
            registry: SubscriptionRegistry::new(),
            scheduler: Scheduler::new(),
            backoff: Mutex::new(backoff),
            state_tx,
            want_connected: AtomicBool::new(false),
            disabled: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            transport: Mutex::new(None),
            reconnect_action: Mutex::new(None),
            ping_action: Mutex::new(None),
            ping: Mutex::new(None),
            connect_waiters: Mutex::new(Vec::new()),
            disconnect_waiters: Mutex::new(Vec::new()),
            connected_observers: Mutex::new(Vec::new()),
            disconnected_observers: Mutex::new(Vec::new()),
        });
        Self { inner }
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state()
    }

    /// Watch connection state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Replace the bearer token used by subsequent handshakes.
    pub fn set_access_token(&self, token: impl Into<String>) {
        *self.inner.access_token.lock().expect("token lock") = token.into();
    }

    pub fn on_connected<F>(&self, observer: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner
            .connected_observers
            .lock()
            .expect("observers lock")
            .push(Arc::new(observer));
    }

    pub fn on_disconnected<F>(&self, observer: F)
    where
        F: Fn(CloseCode) + Send + Sync + 'static,
    {
        self.inner
            .disconnected_observers
            .lock()
            .expect("observers lock")
            .push(Arc::new(observer));
    }

    /// Connect and complete the handshake. A no-op when already connected;
    /// concurrent callers share the in-flight attempt.
    pub async fn connect(&self) -> Result<()> {
        connect_inner(Arc::clone(&self.inner)).await
    }

    /// Close the connection and keep it closed. Concurrent callers share a
    /// single disconnection completion.
    pub async fn disconnect(&self) {
        disconnect_inner(&self.inner).await;
    }

    /// Disconnect and suppress every future reconnect. Subscriptions are
    /// released; the client performs no further network I/O.
    pub async fn disable(&self) {
        self.inner.disabled.store(true, Ordering::Release);
        self.inner.cancel_reconnect();
        disconnect_inner(&self.inner).await;
        self.inner.registry.clear();
        self.inner.commands.clear();
    }

    /// Create a subscription entity for the provider's channel. The entity
    /// joins the registry on its first subscribe.
    pub fn create_channel(&self, provider: Arc<dyn ChannelTokenProvider>) -> Arc<Subscription> {
        Subscription::new(Arc::downgrade(&self.inner), provider).into()
    }

    /// Identity switch: tear the connection down, drop all pending state,
    /// and reconnect when an access token is present.
    pub async fn on_identity_changed(&self, player_id: &str) {
        info!(player_id, "identity changed; resetting connection");
        disconnect_inner(&self.inner).await;
        self.inner.commands.clear();
        self.inner.registry.clear();
        let has_token = !self
            .inner
            .access_token
            .lock()
            .expect("token lock")
            .is_empty();
        if has_token
            && let Err(err) = connect_inner(Arc::clone(&self.inner)).await
        {
            warn!(error = %err, "reconnect after identity change failed");
        }
    }

    /// Publish a payload to a channel through the server.
    pub async fn publish(&self, channel: impl Into<String>, payload: impl Into<String>) -> Result<()> {
        let command = Command::publish(
            next_command_id(),
            PublishRequest {
                channel: channel.into(),
                data: PublicationData {
                    payload: payload.into(),
                },
            },
        );
        let reply = self.inner.send_command(command).await?;
        if let Some(error) = reply.error {
            return Err(ClientError::Server {
                code: error.code,
                message: error.message,
            });
        }
        Ok(())
    }

    pub fn subscription_count(&self) -> usize {
        self.inner.registry.len()
    }

    pub fn on_subscription_count_changed<F>(&self, observer: F)
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.inner.registry.on_count_changed(observer);
    }
}

impl ClientInner {
    pub(crate) fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    pub(crate) fn want_connected(&self) -> bool {
        self.want_connected.load(Ordering::Acquire)
    }

    pub(crate) fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Send a command and await its reply. Commands issued while a connect
    /// is in flight wait for the handshake first; otherwise the frame goes
    /// straight out and the transport may buffer it.
    pub(crate) async fn send_command(&self, command: Command) -> Result<Reply> {
        if self.state() == ConnectionState::Connecting {
            self.await_connect_result().await?;
        }
        self.send_command_now(command).await
    }

    async fn send_command_now(&self, command: Command) -> Result<Reply> {
        let method = command.method();
        let start = Instant::now();
        let result = self.send_command_raw(command).await;
        telemetry::command_duration(
            method.as_str(),
            result.is_ok(),
            start.elapsed().as_secs_f64() * 1000.0,
        );
        result
    }

    async fn send_command_raw(&self, command: Command) -> Result<Reply> {
        let id = command.id;
        let waiter = self.commands.register(id)?;
        let frame = encode_command(&command)?;
        let transport = self
            .transport
            .lock()
            .expect("transport lock")
            .clone()
            .ok_or(ClientError::ConnectionFailed {
                reason: "no transport".to_string(),
            });
        let transport = match transport {
            Ok(transport) => transport,
            Err(err) => {
                self.commands.discard(id);
                return Err(err);
            }
        };
        if let Err(err) = transport.send(frame) {
            self.commands.discard(id);
            return Err(ClientError::ConnectionFailed {
                reason: err.to_string(),
            });
        }
        waiter.await_reply(self.config.command_timeout).await
    }

    /// Await the in-flight connect attempt, sharing its outcome.
    async fn await_connect_result(&self) -> Result<()> {
        let rx = {
            let mut waiters = self.connect_waiters.lock().expect("connect waiters lock");
            // Re-check under the lock; the handshake resolves waiters after
            // publishing the Connected state, and close-handling publishes
            // Disconnected before draining.
            match self.state() {
                ConnectionState::Connected => return Ok(()),
                ConnectionState::Connecting => {}
                _ => {
                    return Err(ClientError::ConnectionFailed {
                        reason: "no connect in flight".to_string(),
                    });
                }
            }
            let (tx, rx) = oneshot::channel();
            waiters.push(tx);
            rx
        };
        match rx.await {
            Ok(result) => result,
            Err(_) => Err(ClientError::ConnectionFailed {
                reason: "connect aborted".to_string(),
            }),
        }
    }

    fn resolve_connect_waiters(&self, result: Result<()>) {
        let drained: Vec<_> = {
            let mut waiters = self.connect_waiters.lock().expect("connect waiters lock");
            waiters.drain(..).collect()
        };
        for waiter in drained {
            let _ = waiter.send(result.clone());
        }
    }

    fn register_disconnect_waiter(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        let mut waiters = self
            .disconnect_waiters
            .lock()
            .expect("disconnect waiters lock");
        if self.state() == ConnectionState::Disconnected {
            let _ = tx.send(());
        } else {
            waiters.push(tx);
        }
        rx
    }

    fn resolve_disconnect_waiters(&self) {
        let drained: Vec<_> = {
            let mut waiters = self
                .disconnect_waiters
                .lock()
                .expect("disconnect waiters lock");
            waiters.drain(..).collect()
        };
        for waiter in drained {
            let _ = waiter.send(());
        }
    }

    fn set_state(&self, next: ConnectionState) {
        let changed = self.state_tx.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
        if changed {
            self.on_state_changed(next);
        }
    }

    fn on_state_changed(&self, next: ConnectionState) {
        debug!(state = next.as_str(), "connection state changed");
        telemetry::connection_state_change(next.as_str());
    }

    fn close_transport(&self) -> bool {
        let transport = self.transport.lock().expect("transport lock").clone();
        match transport {
            Some(transport) => {
                transport.close();
                true
            }
            None => false,
        }
    }

    fn cancel_reconnect(&self) {
        if let Some(id) = self
            .reconnect_action
            .lock()
            .expect("reconnect action lock")
            .take()
        {
            self.scheduler.cancel_action(id);
        }
    }

    fn cancel_ping_deadline(&self) {
        if let Some(id) = self.ping_action.lock().expect("ping action lock").take() {
            self.scheduler.cancel_action(id);
        }
    }

    fn arm_ping_deadline(self: &Arc<Self>, generation: u64) {
        let ping = *self.ping.lock().expect("ping lock");
        let Some(settings) = ping else {
            return;
        };
        if settings.interval.is_zero() {
            return;
        }
        self.cancel_ping_deadline();
        let delay = settings.interval + self.config.max_server_ping_delay;
        let inner = Arc::clone(self);
        let id = self.scheduler.schedule_action(delay, move || {
            if inner.generation.load(Ordering::Acquire) != generation {
                return;
            }
            warn!("no server message within the ping deadline; closing transport");
            inner.close_transport();
        });
        *self.ping_action.lock().expect("ping action lock") = Some(id);
    }

    fn schedule_reconnect(self: &Arc<Self>, delay: Duration) {
        debug!(delay_ms = delay.as_millis() as u64, "scheduling reconnect");
        let inner = Arc::clone(self);
        let id = self.scheduler.schedule_action(delay, move || {
            let inner = Arc::clone(&inner);
            tokio::spawn(async move {
                if let Err(err) = connect_inner(inner).await {
                    warn!(error = %err, "reconnect attempt failed");
                }
            });
        });
        *self.reconnect_action.lock().expect("reconnect action lock") = Some(id);
    }

    fn schedule_network_check(self: &Arc<Self>) {
        let interval = self
            .config
            .network_check_interval
            .max(Duration::from_secs(1));
        let inner = Arc::clone(self);
        let id = self.scheduler.schedule_action(interval, move || {
            let inner = Arc::clone(&inner);
            tokio::spawn(async move {
                if inner.disabled.load(Ordering::Acquire) {
                    return;
                }
                if inner.probe.is_reachable().await {
                    info!("network reachable again; resuming connection");
                    inner.want_connected.store(true, Ordering::Release);
                    if let Err(err) = connect_inner(Arc::clone(&inner)).await {
                        warn!(error = %err, "reconnect after network recovery failed");
                    }
                } else {
                    inner.schedule_network_check();
                }
            });
        });
        *self.reconnect_action.lock().expect("reconnect action lock") = Some(id);
    }

    fn notify_connected(&self) {
        let observers: Vec<_> = self
            .connected_observers
            .lock()
            .expect("observers lock")
            .clone();
        for observer in observers {
            if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| observer())).is_err() {
                warn!("connected observer panicked; continuing");
            }
        }
    }

    fn notify_disconnected(&self, close_code: CloseCode) {
        let observers: Vec<_> = self
            .disconnected_observers
            .lock()
            .expect("observers lock")
            .clone();
        for observer in observers {
            let result =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| observer(close_code)));
            if result.is_err() {
                warn!("disconnected observer panicked; continuing");
            }
        }
    }

    fn on_frame(self: &Arc<Self>, generation: u64, frame: &Bytes) {
        telemetry::message_received();
        // Any inbound traffic proves the server is alive: cancel and re-arm
        // the deadline, echoing the pong first when the server asked for it.
        let ping = *self.ping.lock().expect("ping lock");
        if let Some(settings) = ping {
            if settings.pong_required {
                let transport = self.transport.lock().expect("transport lock").clone();
                if let Some(transport) = transport
                    && let Err(err) = transport.send(Bytes::from_static(HEARTBEAT_FRAME))
                {
                    debug!(error = %err, "pong send failed");
                }
            }
            self.arm_ping_deadline(generation);
        }
        let replies = match decode_frames(frame) {
            Ok(replies) => replies,
            Err(err) => {
                error!(error = %err, "inbound frame failed to decode; closing transport");
                self.close_transport();
                return;
            }
        };
        for reply in replies {
            if reply.is_ping() {
                continue;
            }
            if reply.id > 0 {
                self.commands.on_reply(reply);
            } else if let Some(push) = reply.push {
                self.on_push(push);
            }
        }
    }

    fn on_push(&self, push: Push) {
        telemetry::push_received(push.push_type());
        let Some(entity) = self.registry.get(&push.channel) else {
            debug!(channel = %push.channel, "push for unknown channel; dropped");
            return;
        };
        if let Some(publication) = push.publication {
            entity.on_publication(&publication);
        } else if push.unsub.is_some() {
            self.registry.remove(&push.channel);
            entity.on_kick();
        } else if let Some(disconnect) = push.disconnect {
            warn!(
                code = disconnect.code,
                reason = %disconnect.reason,
                "server requested disconnect"
            );
            self.close_transport();
        } else {
            debug!(channel = %push.channel, "push with unknown body; dropped");
        }
    }
}

async fn connect_inner(inner: Arc<ClientInner>) -> Result<()> {
    if inner.disabled.load(Ordering::Acquire) {
        return Err(ClientError::ConnectionFailed {
            reason: "client is disabled".to_string(),
        });
    }
    inner.cancel_reconnect();

    // Wait out a disconnect in progress.
    let mut state_rx = inner.state_tx.subscribe();
    while *state_rx.borrow_and_update() == ConnectionState::Disconnecting {
        if state_rx.changed().await.is_err() {
            break;
        }
    }
    match inner.state() {
        ConnectionState::Connected => return Ok(()),
        ConnectionState::Connecting => return inner.await_connect_result().await,
        _ => {}
    }

    inner.want_connected.store(true, Ordering::Release);
    // Only one caller wins the Disconnected -> Connecting edge; the rest
    // share its completion.
    let started = inner.state_tx.send_if_modified(|state| {
        if *state == ConnectionState::Disconnected {
            *state = ConnectionState::Connecting;
            true
        } else {
            false
        }
    });
    if !started {
        return match inner.state() {
            ConnectionState::Connected => Ok(()),
            _ => inner.await_connect_result().await,
        };
    }
    inner.on_state_changed(ConnectionState::Connecting);

    let generation = inner.generation.fetch_add(1, Ordering::AcqRel) + 1;
    let (events_tx, events_rx) = mpsc::channel(inner.config.event_queue_depth);
    let transport: Arc<dyn Transport> = Arc::from(
        inner
            .transport_factory
            .create(&inner.config.address, events_tx),
    );
    *inner.transport.lock().expect("transport lock") = Some(transport);
    tokio::spawn(run_dispatch(Arc::clone(&inner), generation, events_rx));

    inner.await_connect_result().await
}

async fn disconnect_inner(inner: &Arc<ClientInner>) {
    inner.cancel_reconnect();
    inner.want_connected.store(false, Ordering::Release);
    match inner.state() {
        ConnectionState::Disconnected => return,
        ConnectionState::Disconnecting => {
            let _ = inner.register_disconnect_waiter().await;
            return;
        }
        _ => {}
    }
    inner.set_state(ConnectionState::Disconnecting);
    let rx = inner.register_disconnect_waiter();
    if !inner.close_transport() {
        // Nothing on the wire; finish the close locally.
        inner.commands.clear();
        inner.set_state(ConnectionState::Disconnected);
        inner.resolve_disconnect_waiters();
    }
    let _ = rx.await;
}

async fn run_dispatch(
    inner: Arc<ClientInner>,
    generation: u64,
    mut events: mpsc::Receiver<TransportEvent>,
) {
    while let Some(event) = events.recv().await {
        if inner.generation.load(Ordering::Acquire) != generation {
            break;
        }
        match event {
            TransportEvent::Opened => {
                // The handshake awaits its own reply, which arrives through
                // this loop, so it runs as a sibling task.
                tokio::spawn(run_handshake(Arc::clone(&inner), generation));
            }
            TransportEvent::Message(frame) => inner.on_frame(generation, &frame),
            TransportEvent::Error(message) => {
                warn!(error = %message, "transport error");
                telemetry::websocket_error();
            }
            TransportEvent::Closed(code) => {
                on_close(&inner, code).await;
                break;
            }
        }
    }
}

async fn run_handshake(inner: Arc<ClientInner>, generation: u64) {
    let result = perform_handshake(&inner, generation).await;
    if inner.generation.load(Ordering::Acquire) != generation {
        return;
    }
    match result {
        Ok(connect_result) => {
            inner.backoff.lock().expect("backoff lock").reset();
            *inner.ping.lock().expect("ping lock") = Some(PingSettings {
                interval: Duration::from_secs(u64::from(connect_result.ping)),
                pong_required: connect_result.pong,
            });
            inner.registry.recover(&connect_result);
            inner.arm_ping_deadline(generation);
            inner.set_state(ConnectionState::Connected);
            inner.resolve_connect_waiters(Ok(()));
            inner.notify_connected();
            resubscribe_unsynced(&inner);
        }
        Err(err) => {
            warn!(error = %err, "handshake failed");
            inner.resolve_connect_waiters(Err(err));
            inner.close_transport();
        }
    }
}

async fn perform_handshake(inner: &Arc<ClientInner>, generation: u64) -> Result<ConnectResult> {
    let subs = inner.registry.subscription_requests_for_reconnect().await;
    if inner.generation.load(Ordering::Acquire) != generation {
        return Err(ClientError::ConnectionFailed {
            reason: "connection superseded".to_string(),
        });
    }
    let access_token = inner.access_token.lock().expect("token lock").clone();
    if access_token.is_empty() {
        return Err(ClientError::EmptyToken);
    }
    let mut request = ConnectRequest::new(access_token);
    request.name = inner.config.name.clone();
    request.version = inner.config.version.clone();
    request.subs = subs;
    let command = Command::connect(next_command_id(), request);
    let reply = inner
        .send_command_now(command)
        .await
        .map_err(|err| match err {
            ClientError::CommandInterrupted { .. } | ClientError::CommandTimeout => {
                ClientError::ConnectionFailed {
                    reason: err.to_string(),
                }
            }
            other => other,
        })?;
    if let Some(error) = reply.error {
        return Err(ClientError::ConnectionFailed {
            reason: format!("server refused connect {}: {}", error.code, error.message),
        });
    }
    reply.connect.ok_or(ClientError::ConnectionFailed {
        reason: "connect reply missing body".to_string(),
    })
}

/// Issue fresh subscribe commands for entities the handshake's recovery
/// block did not mention.
fn resubscribe_unsynced(inner: &Arc<ClientInner>) {
    for entity in inner.registry.get_all() {
        if entity.wants_subscription() && entity.state() == SubscriptionState::Unsynced {
            tokio::spawn(async move {
                if let Err(err) = entity.subscribe().await {
                    warn!(
                        channel = %entity.channel().unwrap_or_default(),
                        error = %err,
                        "resubscribe after reconnect failed"
                    );
                }
            });
        }
    }
}

async fn on_close(inner: &Arc<ClientInner>, code: Option<u16>) {
    let close_code = code.map(CloseCode::from_u16).unwrap_or(CloseCode::Absent);
    info!(%close_code, "transport closed");
    inner.cancel_ping_deadline();
    *inner.ping.lock().expect("ping lock") = None;
    *inner.transport.lock().expect("transport lock") = None;

    // Close-handling completes before any reconnect is scheduled: pending
    // commands fail, subscriptions fall out of sync, waiters resolve. The
    // state flips to Disconnected before the drains so late registrants see
    // it rather than wait on a connect that is already gone.
    inner.commands.fail_all(close_code);
    for entity in inner.registry.get_all() {
        entity.on_connectivity_change(false);
    }
    inner.set_state(ConnectionState::Disconnected);
    inner.resolve_connect_waiters(Err(ClientError::ConnectionFailed {
        reason: format!("transport closed: {close_code}"),
    }));
    inner.resolve_disconnect_waiters();
    inner.notify_disconnected(close_code);

    if !close_code.is_reconnectable() {
        info!(%close_code, "close code denies reconnection");
        return;
    }
    if inner.disabled.load(Ordering::Acquire) || !inner.want_connected() {
        return;
    }
    if close_code == CloseCode::TokenVerificationFailed {
        // Fixed wait; deliberately leaves the backoff sequence untouched.
        inner.schedule_reconnect(inner.config.token_verification_delay);
        return;
    }
    if !inner.probe.is_reachable().await {
        info!("network unreachable; suspending reconnection");
        inner.want_connected.store(false, Ordering::Release);
        inner.schedule_network_check();
        return;
    }
    let delay = inner.backoff.lock().expect("backoff lock").next();
    inner.schedule_reconnect(delay);
}
