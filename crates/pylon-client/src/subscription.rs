// Per-channel subscription entity and its state machine.
use crate::commands::next_command_id;
use crate::connection::ClientInner;
use crate::error::{ClientError, Result};
use crate::token::{ChannelToken, ChannelTokenProvider};
use bytes::Bytes;
use pylon_wire::{Command, Publication, SubscribeRequest, SubscribeResult, UnsubscribeRequest};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tracing::{debug, warn};

/// Channel subscription lifecycle.
///
/// `Unsubscribed` is terminal: the server kicked this entity and a new one
/// must be created to rejoin the channel. `Error` permits retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Unsynced,
    Subscribing,
    Synced,
    Unsubscribed,
    Error,
}

impl SubscriptionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionState::Unsynced => "unsynced",
            SubscriptionState::Subscribing => "subscribing",
            SubscriptionState::Synced => "synced",
            SubscriptionState::Unsubscribed => "unsubscribed",
            SubscriptionState::Error => "error",
        }
    }
}

/// Everything a subscription can tell its observer, in delivery order.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// A publication payload, as text and as its UTF-8 bytes.
    Publication {
        text: String,
        data: Bytes,
        offset: u64,
    },
    StateChanged(SubscriptionState),
    /// The server force-removed this subscription.
    Kicked,
    Failed(String),
}

type Observer = Arc<dyn Fn(ChannelEvent) + Send + Sync>;

/// A single channel subscription owned by the client's registry.
///
/// Created via [`crate::Client::create_channel`]. The channel name is fixed
/// by the first token fetch; the provider returning a different channel on
/// a later fetch is a hard error.
pub struct Subscription {
    client: Weak<ClientInner>,
    provider: Arc<dyn ChannelTokenProvider>,
    channel: Mutex<Option<String>>,
    state: Mutex<SubscriptionState>,
    offset: AtomicU64,
    epoch: Mutex<String>,
    want_subscribed: AtomicBool,
    disposed: AtomicBool,
    observer: Mutex<Option<Observer>>,
}

impl Subscription {
    pub(crate) fn new(client: Weak<ClientInner>, provider: Arc<dyn ChannelTokenProvider>) -> Self {
        Self {
            client,
            provider,
            channel: Mutex::new(None),
            state: Mutex::new(SubscriptionState::Unsynced),
            offset: AtomicU64::new(0),
            epoch: Mutex::new(String::new()),
            want_subscribed: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            observer: Mutex::new(None),
        }
    }

    /// Install the observer, replacing any previous one.
    pub fn observe<F>(&self, observer: F)
    where
        F: Fn(ChannelEvent) + Send + Sync + 'static,
    {
        *self.observer.lock().expect("observer lock") = Some(Arc::new(observer));
    }

    pub fn state(&self) -> SubscriptionState {
        *self.state.lock().expect("state lock")
    }

    /// Channel name, known once the first token fetch pinned it.
    pub fn channel(&self) -> Option<String> {
        self.channel.lock().expect("channel lock").clone()
    }

    pub fn offset(&self) -> u64 {
        self.offset.load(Ordering::Acquire)
    }

    pub fn epoch(&self) -> String {
        self.epoch.lock().expect("epoch lock").clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Subscribe to the provider's channel and await the server ack.
    pub async fn subscribe(self: &Arc<Self>) -> Result<()> {
        if self.is_disposed() {
            return Err(ClientError::Disposed);
        }
        match self.state() {
            SubscriptionState::Subscribing | SubscriptionState::Synced => {
                return Err(ClientError::AlreadySubscribed(
                    self.channel().unwrap_or_default(),
                ));
            }
            SubscriptionState::Unsubscribed => {
                return Err(ClientError::AlreadyUnsubscribed(
                    self.channel().unwrap_or_default(),
                ));
            }
            SubscriptionState::Unsynced | SubscriptionState::Error => {}
        }
        let client = self.client.upgrade().ok_or(ClientError::ConnectionFailed {
            reason: "client dropped".to_string(),
        })?;
        let token = self.fetch_token().await?;
        if self.is_disposed() {
            return Err(ClientError::Disposed);
        }
        client.registry().claim(&token.channel, self)?;
        self.want_subscribed.store(true, Ordering::Release);
        self.set_state(SubscriptionState::Subscribing);
        let command = Command::subscribe(next_command_id(), self.subscribe_request(token));
        match client.send_command(command).await {
            Ok(reply) => {
                if let Some(error) = reply.error {
                    let err = ClientError::Server {
                        code: error.code,
                        message: error.message,
                    };
                    self.fail(&err);
                    return Err(err);
                }
                if self.is_disposed() {
                    return Err(ClientError::Disposed);
                }
                self.set_state(SubscriptionState::Synced);
                if let Some(result) = reply.subscribe {
                    self.apply_subscribe_result(&result);
                }
                Ok(())
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    /// Drop the subscription intent and tell the server, when one is
    /// listening. Resolves immediately while the client does not want a
    /// connection.
    pub async fn unsubscribe(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(ClientError::Disposed);
        }
        if !self.want_subscribed.swap(false, Ordering::AcqRel) {
            return Err(ClientError::AlreadyUnsubscribed(
                self.channel().unwrap_or_default(),
            ));
        }
        let Some(client) = self.client.upgrade() else {
            self.set_state(SubscriptionState::Unsynced);
            return Ok(());
        };
        let Some(channel) = self.channel() else {
            self.set_state(SubscriptionState::Unsynced);
            return Ok(());
        };
        if !client.want_connected() {
            self.set_state(SubscriptionState::Unsynced);
            return Ok(());
        }
        let command = Command::unsubscribe(next_command_id(), UnsubscribeRequest { channel });
        match client.send_command(command).await {
            Ok(reply) => {
                if let Some(error) = reply.error {
                    let err = ClientError::Server {
                        code: error.code,
                        message: error.message,
                    };
                    self.fail(&err);
                    return Err(err);
                }
                self.set_state(SubscriptionState::Unsynced);
                Ok(())
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    /// Deterministic disposal: drains the unsubscribe over the wire, removes
    /// the entity from the registry, and clears the observer. Safe to call
    /// twice; the second call is a no-op.
    pub async fn close(self: &Arc<Self>) -> Result<()> {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let wanted = self.want_subscribed.swap(false, Ordering::AcqRel);
        if let Some(client) = self.client.upgrade()
            && let Some(channel) = self.channel()
        {
            client.registry().remove(&channel);
            if wanted && client.want_connected() {
                let command = Command::unsubscribe(
                    next_command_id(),
                    UnsubscribeRequest {
                        channel: channel.clone(),
                    },
                );
                if let Err(err) = client.send_command(command).await {
                    debug!(channel = %channel, error = %err, "unsubscribe on close failed");
                }
            }
        }
        self.clear_observer();
        Ok(())
    }

    pub(crate) fn wants_subscription(&self) -> bool {
        self.want_subscribed.load(Ordering::Acquire) && !self.is_disposed()
    }

    #[cfg(test)]
    pub(crate) fn mark_want_subscribed(&self) {
        self.want_subscribed.store(true, Ordering::Release);
    }

    /// Build the subscribe request sent inside a reconnect handshake. The
    /// entity stays `Unsynced` until the handshake either recovers it or a
    /// fresh subscribe goes out.
    pub(crate) async fn reconnect_request(&self) -> Result<SubscribeRequest> {
        let token = self.fetch_token().await?;
        Ok(self.subscribe_request(token))
    }

    fn subscribe_request(&self, token: ChannelToken) -> SubscribeRequest {
        let epoch = self.epoch();
        SubscribeRequest {
            channel: token.channel,
            token: token.token,
            recover: !epoch.is_empty(),
            offset: self.offset(),
            epoch,
        }
    }

    /// Deliver a publication, then advance the offset. Delivery comes first
    /// so an observer that fails does not lose its retry opportunity; the
    /// offset update always completes.
    pub(crate) fn on_publication(&self, publication: &Publication) {
        let text = publication.data.payload.clone();
        let data = Bytes::from(publication.data.payload.clone().into_bytes());
        self.emit(ChannelEvent::Publication {
            text,
            data,
            offset: publication.offset,
        });
        self.offset.fetch_max(publication.offset, Ordering::AcqRel);
    }

    pub(crate) fn on_kick(&self) {
        self.want_subscribed.store(false, Ordering::Release);
        self.set_state(SubscriptionState::Unsubscribed);
        self.emit(ChannelEvent::Kicked);
    }

    pub(crate) fn on_connectivity_change(&self, connected: bool) {
        match self.state() {
            SubscriptionState::Unsubscribed | SubscriptionState::Error => {}
            _ => self.set_state(if connected {
                SubscriptionState::Synced
            } else {
                SubscriptionState::Unsynced
            }),
        }
    }

    /// Apply a subscribe result: adopt the stream epoch and deliver catch-up
    /// publications in array order. A reply with no publications but an
    /// embedded single-publication body delivers it and bumps the offset by
    /// one.
    pub(crate) fn apply_subscribe_result(&self, result: &SubscribeResult) {
        let epoch_changed = {
            let mut epoch = self.epoch.lock().expect("epoch lock");
            if *epoch != result.epoch {
                *epoch = result.epoch.clone();
                true
            } else {
                false
            }
        };
        if epoch_changed {
            // New epoch restarts the stream; prior offsets are meaningless.
            self.offset.store(result.offset, Ordering::Release);
        }
        if !result.publications.is_empty() {
            for publication in &result.publications {
                self.on_publication(publication);
            }
        } else if let Some(embedded) = &result.data {
            let offset = self.offset().saturating_add(1);
            let text = embedded.data.payload.clone();
            let data = Bytes::from(embedded.data.payload.clone().into_bytes());
            self.emit(ChannelEvent::Publication { text, data, offset });
            self.offset.fetch_add(1, Ordering::AcqRel);
        }
    }

    pub(crate) fn fail(&self, err: &ClientError) {
        self.set_state(SubscriptionState::Error);
        self.emit(ChannelEvent::Failed(err.to_string()));
    }

    fn set_state(&self, next: SubscriptionState) {
        {
            let mut state = self.state.lock().expect("state lock");
            if *state == next {
                return;
            }
            *state = next;
        }
        self.emit(ChannelEvent::StateChanged(next));
    }

    async fn fetch_token(&self) -> Result<ChannelToken> {
        let token = self
            .provider
            .get_token()
            .await
            .map_err(|err| ClientError::TokenRetrieverFailed(err.to_string()))?;
        if token.channel.is_empty() {
            return Err(ClientError::EmptyChannel);
        }
        if token.token.is_empty() {
            return Err(ClientError::EmptyToken);
        }
        let mut pinned = self.channel.lock().expect("channel lock");
        match pinned.as_ref() {
            None => *pinned = Some(token.channel.clone()),
            Some(existing) if *existing != token.channel => {
                return Err(ClientError::ChannelChanged {
                    previous: existing.clone(),
                    current: token.channel,
                });
            }
            Some(_) => {}
        }
        Ok(token)
    }

    fn emit(&self, event: ChannelEvent) {
        // Clone the observer out of the lock so a callback may re-enter the
        // subscription without deadlocking.
        let observer = self.observer.lock().expect("observer lock").clone();
        if let Some(observer) = observer {
            let result =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| observer(event)));
            if result.is_err() {
                warn!(
                    channel = %self.channel().unwrap_or_default(),
                    "subscription observer panicked; continuing"
                );
            }
        }
    }

    fn clear_observer(&self) {
        *self.observer.lock().expect("observer lock") = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Non-deterministic disposal: the transport may already be gone, so
        // only local bookkeeping is released here. No command is sent.
        self.clear_observer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::StaticTokenProvider;
    use std::sync::atomic::AtomicUsize;

    fn detached(provider: StaticTokenProvider) -> Arc<Subscription> {
        Arc::new(Subscription::new(Weak::new(), Arc::new(provider)))
    }

    fn publication(offset: u64, payload: &str) -> Publication {
        Publication {
            offset,
            data: pylon_wire::PublicationData {
                payload: payload.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn publication_is_delivered_before_offset_update() {
        let sub = detached(StaticTokenProvider::new("room.1", "t"));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let sub_for_observer = Arc::downgrade(&sub);
        sub.observe(move |event| {
            if let ChannelEvent::Publication { text, data, offset } = event {
                // The entity's own offset must still be the old one here.
                let observed = sub_for_observer.upgrade().expect("sub").offset();
                assert!(observed < offset);
                assert_eq!(data.as_ref(), text.as_bytes());
                seen_clone.lock().expect("seen").push((text, offset));
            }
        });
        sub.on_publication(&publication(1, "hi"));
        sub.on_publication(&publication(2, "hi2"));
        assert_eq!(sub.offset(), 2);
        let seen = seen.lock().expect("seen");
        assert_eq!(*seen, vec![("hi".to_string(), 1), ("hi2".to_string(), 2)]);
    }

    #[tokio::test]
    async fn panicking_observer_does_not_block_offset() {
        let sub = detached(StaticTokenProvider::new("room.1", "t"));
        sub.observe(|_event| panic!("bad observer"));
        sub.on_publication(&publication(5, "x"));
        assert_eq!(sub.offset(), 5);
    }

    #[tokio::test]
    async fn embedded_form_increments_offset_by_one() {
        let sub = detached(StaticTokenProvider::new("room.1", "t"));
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        sub.observe(move |event| {
            if let ChannelEvent::Publication { text, offset, .. } = event {
                assert_eq!(text, "solo");
                assert_eq!(offset, 1);
                count_clone.fetch_add(1, Ordering::Relaxed);
            }
        });
        let result = SubscribeResult {
            epoch: "e1".into(),
            offset: 0,
            recoverable: true,
            publications: Vec::new(),
            data: Some(pylon_wire::EmbeddedData {
                data: pylon_wire::PublicationData {
                    payload: "solo".into(),
                },
            }),
        };
        sub.apply_subscribe_result(&result);
        assert_eq!(count.load(Ordering::Relaxed), 1);
        assert_eq!(sub.offset(), 1);
        assert_eq!(sub.epoch(), "e1");
    }

    #[tokio::test]
    async fn epoch_change_restarts_the_stream() {
        let sub = detached(StaticTokenProvider::new("room.1", "t"));
        sub.apply_subscribe_result(&SubscribeResult {
            epoch: "e1".into(),
            offset: 7,
            recoverable: true,
            ..Default::default()
        });
        assert_eq!(sub.offset(), 7);
        sub.apply_subscribe_result(&SubscribeResult {
            epoch: "e2".into(),
            offset: 0,
            recoverable: true,
            ..Default::default()
        });
        assert_eq!(sub.offset(), 0);
        assert_eq!(sub.epoch(), "e2");
    }

    #[tokio::test]
    async fn kick_is_terminal_for_the_entity() {
        let sub = detached(StaticTokenProvider::new("room.1", "t"));
        sub.on_kick();
        assert_eq!(sub.state(), SubscriptionState::Unsubscribed);
        // Connectivity changes no longer move the state.
        sub.on_connectivity_change(true);
        assert_eq!(sub.state(), SubscriptionState::Unsubscribed);
        assert!(matches!(
            sub.subscribe().await,
            Err(ClientError::AlreadyUnsubscribed(_))
        ));
    }

    #[tokio::test]
    async fn connectivity_change_does_not_touch_error_state() {
        let sub = detached(StaticTokenProvider::new("room.1", "t"));
        sub.fail(&ClientError::CommandTimeout);
        sub.on_connectivity_change(true);
        assert_eq!(sub.state(), SubscriptionState::Error);
    }

    #[tokio::test]
    async fn close_twice_is_a_no_op() {
        let sub = detached(StaticTokenProvider::new("room.1", "t"));
        sub.close().await.expect("close");
        assert!(sub.is_disposed());
        sub.close().await.expect("second close");
        assert!(matches!(sub.subscribe().await, Err(ClientError::Disposed)));
        assert!(matches!(
            sub.unsubscribe().await,
            Err(ClientError::Disposed)
        ));
    }
}
