// Mutation Queue - at most one in-flight mutation per entity id, the rest wait in FIFO order

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::trace;

/// Per-id FIFO of pending mutations. An id with an entry is busy; the entry
/// holds the waiters queued behind the in-flight mutation.
#[derive(Debug, Default)]
pub struct MutationQueue {
    slots: Mutex<HashMap<String, VecDeque<oneshot::Sender<()>>>>,
}

impl MutationQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Wait for this id's turn. The turn is held until the returned value drops.
    pub async fn acquire(self: &Arc<Self>, id: &str) -> MutationTurn {
        let rx = {
            let mut slots = self.slots.lock();
            match slots.get_mut(id) {
                None => {
                    slots.insert(id.to_string(), VecDeque::new());
                    None
                }
                Some(waiters) => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push_back(tx);
                    Some(rx)
                }
            }
        };

        if let Some(rx) = rx {
            trace!(id, "mutation queued behind in-flight mutation");
            let mut waiter = Waiter {
                queue: Arc::clone(self),
                id: id.to_string(),
                rx: Some(rx),
            };
            if let Some(rx) = waiter.rx.as_mut() {
                let _ = rx.await;
            }
            waiter.rx = None;
        }

        MutationTurn {
            queue: Arc::clone(self),
            id: id.to_string(),
        }
    }

    /// Take the turn only if the id is idle
    pub fn try_acquire(self: &Arc<Self>, id: &str) -> Option<MutationTurn> {
        let mut slots = self.slots.lock();
        if slots.contains_key(id) {
            return None;
        }
        slots.insert(id.to_string(), VecDeque::new());
        Some(MutationTurn {
            queue: Arc::clone(self),
            id: id.to_string(),
        })
    }

    pub fn is_busy(&self, id: &str) -> bool {
        self.slots.lock().contains_key(id)
    }

    /// Mutations waiting behind the in-flight one
    pub fn queued(&self, id: &str) -> usize {
        self.slots.lock().get(id).map(VecDeque::len).unwrap_or(0)
    }

    fn release(&self, id: &str) {
        let mut slots = self.slots.lock();
        if let Some(waiters) = slots.get_mut(id) {
            while let Some(next) = waiters.pop_front() {
                // A dropped waiter gave up its place; hand the turn to the next one
                if next.send(()).is_ok() {
                    return;
                }
            }
        }
        slots.remove(id);
    }
}

/// Exclusive right to mutate one id
#[derive(Debug)]
pub struct MutationTurn {
    queue: Arc<MutationQueue>,
    id: String,
}

impl Drop for MutationTurn {
    fn drop(&mut self) {
        self.queue.release(&self.id);
    }
}

/// Passes the turn on if the waiting future is dropped after being handed it
struct Waiter {
    queue: Arc<MutationQueue>,
    id: String,
    rx: Option<oneshot::Receiver<()>>,
}

impl Drop for Waiter {
    fn drop(&mut self) {
        if let Some(mut rx) = self.rx.take() {
            if rx.try_recv().is_ok() {
                self.queue.release(&self.id);
            }
        }
    }
}
