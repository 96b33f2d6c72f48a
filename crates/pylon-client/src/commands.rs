// Command id allocation and pending-reply correlation.
use crate::error::{ClientError, Result};
use pylon_wire::{CloseCode, Reply};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::debug;

// Ids start at 1; 0 is reserved on the wire for server pushes. The counter
// is process-wide so ids stay monotonic across reconnects.
static COMMAND_ID: AtomicU32 = AtomicU32::new(1);

pub fn next_command_id() -> u32 {
    COMMAND_ID.fetch_add(1, Ordering::Relaxed)
}

/// Restart the id sequence. Only for process/init boundaries; resetting
/// while commands are pending would allow id reuse.
pub fn reset_command_ids() {
    COMMAND_ID.store(1, Ordering::Relaxed);
}

type PendingMap = Arc<Mutex<HashMap<u32, oneshot::Sender<Result<Reply>>>>>;

/// Registry of commands awaiting their reply.
///
/// Every waiter resolves exactly once: with the matching reply, with
/// `CommandTimeout`, or with `CommandInterrupted` when the transport drops.
/// A reply arriving after resolution is a silent no-op.
#[derive(Clone)]
pub struct CommandRegistry {
    pending: PendingMap,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn register(&self, id: u32) -> Result<ReplyWaiter> {
        let (tx, rx) = oneshot::channel();
        let mut pending = self.pending.lock().expect("pending lock");
        if pending.contains_key(&id) {
            return Err(ClientError::DuplicateCommandId(id));
        }
        pending.insert(id, tx);
        Ok(ReplyWaiter {
            id,
            rx,
            pending: Arc::clone(&self.pending),
        })
    }

    pub fn on_reply(&self, reply: Reply) {
        let waiter = self.pending.lock().expect("pending lock").remove(&reply.id);
        match waiter {
            Some(tx) => {
                let _ = tx.send(Ok(reply));
            }
            None => debug!(id = reply.id, "reply without a waiter; dropped"),
        }
    }

    /// Fail every pending command because the transport dropped.
    pub fn fail_all(&self, close_code: CloseCode) {
        let drained: Vec<_> = {
            let mut pending = self.pending.lock().expect("pending lock");
            pending.drain().collect()
        };
        if !drained.is_empty() {
            debug!(count = drained.len(), %close_code, "failing pending commands");
        }
        for (_, tx) in drained {
            let _ = tx.send(Err(ClientError::CommandInterrupted { close_code }));
        }
    }

    pub fn clear(&self) {
        self.fail_all(CloseCode::Absent);
    }

    /// Forget a registered command whose frame never reached the wire.
    pub fn discard(&self, id: u32) {
        self.pending.lock().expect("pending lock").remove(&id);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().expect("pending lock").len()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ReplyWaiter {
    id: u32,
    rx: oneshot::Receiver<Result<Reply>>,
    pending: PendingMap,
}

impl ReplyWaiter {
    pub async fn await_reply(self, timeout: Duration) -> Result<Reply> {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(result)) => result,
            // Sender dropped without resolving: the registry was torn down.
            Ok(Err(_)) => Err(ClientError::CommandInterrupted {
                close_code: CloseCode::Absent,
            }),
            Err(_) => {
                self.pending.lock().expect("pending lock").remove(&self.id);
                Err(ClientError::CommandTimeout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(id: u32) -> Reply {
        Reply {
            id,
            ..Default::default()
        }
    }

    #[test]
    fn ids_are_monotonic() {
        let first = next_command_id();
        let second = next_command_id();
        let third = next_command_id();
        assert!(first < second && second < third);
    }

    #[tokio::test]
    async fn reply_completes_the_waiter() {
        let registry = CommandRegistry::new();
        let waiter = registry.register(41).expect("register");
        registry.on_reply(reply(41));
        let got = waiter
            .await_reply(Duration::from_secs(1))
            .await
            .expect("reply");
        assert_eq!(got.id, 41);
        assert_eq!(registry.pending_count(), 0);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let registry = CommandRegistry::new();
        let _waiter = registry.register(7).expect("register");
        assert!(matches!(
            registry.register(7),
            Err(ClientError::DuplicateCommandId(7))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fails_the_waiter_and_late_reply_is_dropped() {
        let registry = CommandRegistry::new();
        let waiter = registry.register(9).expect("register");
        let result = waiter.await_reply(Duration::from_secs(10)).await;
        assert!(matches!(result, Err(ClientError::CommandTimeout)));
        assert_eq!(registry.pending_count(), 0);
        // Late reply after the timeout must be a silent no-op.
        registry.on_reply(reply(9));
    }

    #[tokio::test]
    async fn disconnect_fails_all_pending() {
        let registry = CommandRegistry::new();
        let first = registry.register(1).expect("register");
        let second = registry.register(2).expect("register");
        registry.fail_all(CloseCode::Abnormal);
        for waiter in [first, second] {
            let result = waiter.await_reply(Duration::from_secs(1)).await;
            assert_eq!(
                result,
                Err(ClientError::CommandInterrupted {
                    close_code: CloseCode::Abnormal
                })
            );
        }
        assert_eq!(registry.pending_count(), 0);
    }

    #[tokio::test]
    async fn reply_without_waiter_is_ignored() {
        let registry = CommandRegistry::new();
        registry.on_reply(reply(1234));
        assert_eq!(registry.pending_count(), 0);
    }
}
