// Delayed-action scheduling for reconnect timers and watchdogs.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::AbortHandle;

pub type ActionId = u64;

/// Runs closures after a delay; actions are cancellable until they fire.
///
/// Actions execute on the runtime, not a dedicated thread, so they must not
/// block. Long-running work belongs in a task the action spawns.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    next_id: AtomicU64,
    actions: Mutex<HashMap<ActionId, AbortHandle>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                next_id: AtomicU64::new(1),
                actions: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn schedule_action<F>(&self, delay: Duration, action: F) -> ActionId
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Deregister before running so the action can reschedule itself.
            inner.actions.lock().expect("scheduler lock").remove(&id);
            action();
        });
        self.inner
            .actions
            .lock()
            .expect("scheduler lock")
            .insert(id, handle.abort_handle());
        id
    }

    pub fn cancel_action(&self, id: ActionId) {
        if let Some(handle) = self
            .inner
            .actions
            .lock()
            .expect("scheduler lock")
            .remove(&id)
        {
            handle.abort();
        }
    }

    pub fn pending_actions(&self) -> usize {
        self.inner.actions.lock().expect("scheduler lock").len()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
