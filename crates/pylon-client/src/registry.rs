// Channel-keyed subscription registry with recovery support.
use crate::error::{ClientError, Result};
use crate::subscription::Subscription;
use pylon_wire::{ConnectResult, SubscribeRequest};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

type CountObserver = Arc<dyn Fn(usize) + Send + Sync>;

/// Owns every live subscription, keyed by channel.
///
/// Mutation can race between the dispatch loop (subscribe acks, kicks) and
/// application calls, so all access goes through one lock held only for the
/// duration of the map operation.
pub struct SubscriptionRegistry {
    subscriptions: Mutex<HashMap<String, Arc<Subscription>>>,
    count_observer: Mutex<Option<CountObserver>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            subscriptions: Mutex::new(HashMap::new()),
            count_observer: Mutex::new(None),
        }
    }

    /// Bind `entity` to `channel`. A different entity already holding the
    /// channel is a contract violation; re-claiming by the same entity is
    /// fine (resubscribe after reconnect).
    pub fn claim(&self, channel: &str, entity: &Arc<Subscription>) -> Result<()> {
        let inserted = {
            let mut subscriptions = self.subscriptions.lock().expect("registry lock");
            match subscriptions.get(channel) {
                Some(existing) if Arc::ptr_eq(existing, entity) => false,
                Some(_) => return Err(ClientError::AlreadySubscribed(channel.to_string())),
                None => {
                    subscriptions.insert(channel.to_string(), Arc::clone(entity));
                    true
                }
            }
        };
        if inserted {
            self.notify_count();
        }
        Ok(())
    }

    pub fn remove(&self, channel: &str) -> Option<Arc<Subscription>> {
        let removed = self
            .subscriptions
            .lock()
            .expect("registry lock")
            .remove(channel);
        if removed.is_some() {
            self.notify_count();
        }
        removed
    }

    pub fn get(&self, channel: &str) -> Option<Arc<Subscription>> {
        self.subscriptions
            .lock()
            .expect("registry lock")
            .get(channel)
            .cloned()
    }

    pub fn contains(&self, entity: &Arc<Subscription>) -> bool {
        self.subscriptions
            .lock()
            .expect("registry lock")
            .values()
            .any(|existing| Arc::ptr_eq(existing, entity))
    }

    pub fn get_all(&self) -> Vec<Arc<Subscription>> {
        self.subscriptions
            .lock()
            .expect("registry lock")
            .values()
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        let drained = {
            let mut subscriptions = self.subscriptions.lock().expect("registry lock");
            let was_empty = subscriptions.is_empty();
            subscriptions.clear();
            !was_empty
        };
        if drained {
            self.notify_count();
        }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.lock().expect("registry lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn on_count_changed<F>(&self, observer: F)
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        *self.count_observer.lock().expect("count observer lock") = Some(Arc::new(observer));
    }

    /// Apply the recovery block of a reconnect handshake: entities the
    /// server echoed move to `Synced` and receive their catch-up
    /// publications; unmentioned entities stay `Unsynced` and will issue
    /// fresh subscribe commands.
    pub fn recover(&self, result: &ConnectResult) {
        for (channel, subscribe_result) in &result.subs {
            match self.get(channel) {
                Some(entity) => {
                    entity.on_connectivity_change(true);
                    entity.apply_subscribe_result(subscribe_result);
                }
                None => debug!(channel = %channel, "recovery for unknown channel; dropped"),
            }
        }
    }

    /// Collect the subscribe requests carried inside a reconnect handshake.
    /// An entity whose token fetch fails is omitted and will retry on its
    /// own once the connection is up. Entities parked in `Error` are not
    /// carried either; leaving that state takes an explicit retry.
    pub async fn subscription_requests_for_reconnect(&self) -> Vec<SubscribeRequest> {
        let entities: Vec<Arc<Subscription>> = self
            .get_all()
            .into_iter()
            .filter(|entity| {
                entity.wants_subscription()
                    && entity.state() != crate::subscription::SubscriptionState::Error
            })
            .collect();
        let mut requests = Vec::with_capacity(entities.len());
        for entity in entities {
            match entity.reconnect_request().await {
                Ok(request) => requests.push(request),
                Err(err) => warn!(
                    channel = %entity.channel().unwrap_or_default(),
                    error = %err,
                    "token fetch failed; channel omitted from reconnect"
                ),
            }
        }
        requests
    }

    fn notify_count(&self) {
        let count = self.len();
        crate::telemetry::subscription_count(count);
        let observer = self
            .count_observer
            .lock()
            .expect("count observer lock")
            .clone();
        if let Some(observer) = observer {
            observer(count);
        }
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
