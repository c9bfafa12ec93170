//! Worker registry — routes item updates to the worker that renders their type.
//!
//! DESIGN
//! ======
//! Each registered worker gets a `WorkerId` and an entry whose item type is
//! unset until the worker announces it. A type index (`by_type`) makes
//! lookup O(1) and makes duplicate announcements an explicit policy
//! decision instead of an iteration-order accident.
//!
//! Workers talk back through one shared inbox. Every worker's listener tags
//! its messages with the worker id and forwards them as `Envelope`s; the
//! owner drains the inbox with `pump` (non-blocking) or `recv` (async).
//!
//! LIFECYCLE
//! =========
//! Registered (type unset) → Typed(T) → Typed(T') on re-announcement.
//! Under the `Reject` policy a refused announcement moves Registered →
//! Rejected(T); a later accepted announcement still moves it to Typed.
//! There is no way back to Registered and no per-worker removal; the only
//! exit is `remove_all`, which terminates every worker.
//!
//! BUFFERING
//! =========
//! `add_item` right after `add_worker` races the announcement. While at
//! least one worker has not announced, updates for an unknown type are held
//! (bounded per type) and flushed FIFO to the worker that announces it.

use std::collections::{HashMap, VecDeque};

use frames::{EditorMessage, ItemId, ItemPayload, WorkerMessage};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{DEFAULT_ANNOUNCE_BUFFER, DuplicateTypePolicy};

pub type WorkerId = Uuid;
pub type SubscriptionId = Uuid;

/// A worker message tagged with the worker that sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub worker: WorkerId,
    pub message: WorkerMessage,
}

/// Sending half of the registry inbox, handed to each worker's listener.
pub type Inbox = mpsc::UnboundedSender<Envelope>;

/// A handle to one rendering worker, as seen by the registry.
pub trait WorkerEndpoint {
    /// Post a message to the worker. Returns `false` when the worker is gone
    /// and the message was dropped.
    fn post(&self, message: EditorMessage) -> bool;

    /// Start forwarding the worker's messages into `inbox`, tagged with `id`.
    fn listen(&mut self, id: WorkerId, inbox: Inbox);

    /// Stop the worker and detach its listener. Irreversible.
    fn terminate(&mut self);
}

/// Registration state of one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerState {
    Registered,
    Typed(String),
    /// Announced a type that another worker already holds; not routable.
    Rejected(String),
}

/// How the registry classified one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// The worker declared its type; `flushed` buffered updates were delivered.
    Announced { worker: WorkerId, item_type: String, previous: Option<String>, flushed: usize },
    /// The worker rendered an item. No registry state changes.
    Acknowledged { worker: WorkerId, item: ItemId },
    /// Tag outside the recognized set.
    Ignored { worker: WorkerId, event_name: String },
}

/// Result of routing one outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Posted to the worker.
    Delivered(WorkerId),
    /// Held until a worker announces the type; `pending` items are queued for it.
    Buffered { pending: usize },
    /// The worker was terminated or has exited; the message is lost.
    Lost(WorkerId),
    /// No worker holds the type yet; `removed` buffered updates were discarded.
    Pruned { removed: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no worker registered for item type '{0}'")]
    UnregisteredType(String),
    #[error("item type '{item_type}' is already held by worker {holder}; announcement from worker {rejected} rejected")]
    DuplicateType { item_type: String, holder: WorkerId, rejected: WorkerId },
    #[error("message from unknown worker {0}")]
    UnknownWorker(WorkerId),
    #[error("announcement buffer for '{item_type}' is full ({limit} items)")]
    BufferFull { item_type: String, limit: usize },
}

struct Entry<W> {
    id: WorkerId,
    worker: W,
    item_type: Option<String>,
    rejected: Option<String>,
}

type Handler = Box<dyn FnMut(&Envelope) + Send>;

pub struct WorkerRegistry<W: WorkerEndpoint> {
    entries: Vec<Entry<W>>,
    by_type: HashMap<String, WorkerId>,
    subscribers: Vec<(SubscriptionId, Handler)>,
    pending: HashMap<String, VecDeque<ItemPayload>>,
    policy: DuplicateTypePolicy,
    announce_buffer: usize,
    inbox_tx: Inbox,
    inbox_rx: mpsc::UnboundedReceiver<Envelope>,
}

impl<W: WorkerEndpoint> Default for WorkerRegistry<W> {
    fn default() -> Self {
        Self::new(DuplicateTypePolicy::default(), DEFAULT_ANNOUNCE_BUFFER)
    }
}

impl<W: WorkerEndpoint> WorkerRegistry<W> {
    #[must_use]
    pub fn new(policy: DuplicateTypePolicy, announce_buffer: usize) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Self {
            entries: Vec::new(),
            by_type: HashMap::new(),
            subscribers: Vec::new(),
            pending: HashMap::new(),
            policy,
            announce_buffer,
            inbox_tx,
            inbox_rx,
        }
    }

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    /// Register a worker, attach its listener and ask it to announce its type.
    pub fn add_worker(&mut self, mut worker: W) -> WorkerId {
        let id = Uuid::new_v4();
        worker.listen(id, self.inbox_tx.clone());
        if !worker.post(EditorMessage::AnnounceType) {
            warn!(worker = %id, "registry: announcement request not delivered");
        }
        self.entries.push(Entry { id, worker, item_type: None, rejected: None });
        info!(worker = %id, workers = self.entries.len(), "registry: worker added");
        id
    }

    /// The worker currently routable for `item_type`.
    #[must_use]
    pub fn get_worker(&self, item_type: &str) -> Option<&W> {
        let id = self.by_type.get(item_type)?;
        self.entry(*id).map(|entry| &entry.worker)
    }

    #[must_use]
    pub fn worker_id(&self, item_type: &str) -> Option<WorkerId> {
        self.by_type.get(item_type).copied()
    }

    #[must_use]
    pub fn state(&self, id: WorkerId) -> Option<WorkerState> {
        self.entry(id).map(|entry| match (&entry.item_type, &entry.rejected) {
            (Some(item_type), _) => WorkerState::Typed(item_type.clone()),
            (None, Some(item_type)) => WorkerState::Rejected(item_type.clone()),
            (None, None) => WorkerState::Registered,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Items buffered for `item_type` awaiting an announcement.
    #[must_use]
    pub fn pending(&self, item_type: &str) -> usize {
        self.pending.get(item_type).map_or(0, VecDeque::len)
    }

    /// A sender into the registry inbox.
    #[must_use]
    pub fn inbox(&self) -> Inbox {
        self.inbox_tx.clone()
    }

    fn entry(&self, id: WorkerId) -> Option<&Entry<W>> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    fn awaiting_announcement(&self) -> bool {
        self.entries.iter().any(|entry| entry.item_type.is_none() && entry.rejected.is_none())
    }

    // =========================================================================
    // INBOUND
    // =========================================================================

    /// Apply one worker message to registry state, then notify subscribers.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownWorker`] for envelopes from unregistered ids
    /// (subscribers are not notified), [`RegistryError::DuplicateType`] when
    /// the `Reject` policy refuses an announcement.
    pub fn handle_message(&mut self, envelope: Envelope) -> Result<Inbound, RegistryError> {
        let worker = envelope.worker;
        let Some(index) = self.entries.iter().position(|entry| entry.id == worker) else {
            return Err(RegistryError::UnknownWorker(worker));
        };

        let result = match &envelope.message {
            WorkerMessage::Type(item_type) => self.announce(index, item_type.clone()),
            WorkerMessage::Rendered(item) => Ok(Inbound::Acknowledged { worker, item: item.clone() }),
            WorkerMessage::Unknown { event_name, .. } => {
                debug!(%worker, event_name, "registry: ignoring unrecognized message");
                Ok(Inbound::Ignored { worker, event_name: event_name.clone() })
            }
        };

        for (_, handler) in &mut self.subscribers {
            handler(&envelope);
        }
        result
    }

    fn announce(&mut self, index: usize, item_type: String) -> Result<Inbound, RegistryError> {
        let worker = self.entries[index].id;

        if let Some(&holder) = self.by_type.get(&item_type) {
            if holder != worker {
                if self.policy == DuplicateTypePolicy::Reject {
                    warn!(%worker, %holder, item_type, "registry: duplicate type announcement rejected");
                    self.entries[index].rejected = Some(item_type.clone());
                    self.drop_orphaned_pending();
                    return Err(RegistryError::DuplicateType { item_type, holder, rejected: worker });
                }
                warn!(%worker, displaced = %holder, item_type, "registry: type re-routed to newer worker");
            }
        }

        self.entries[index].rejected = None;
        let previous = self.entries[index].item_type.replace(item_type.clone());
        if let Some(prev) = &previous {
            if *prev != item_type && self.by_type.get(prev) == Some(&worker) {
                self.by_type.remove(prev);
            }
        }
        self.by_type.insert(item_type.clone(), worker);
        info!(%worker, item_type, previous = ?previous, "registry: worker announced type");

        let flushed = self.flush_pending(index, &item_type);
        self.drop_orphaned_pending();
        Ok(Inbound::Announced { worker, item_type, previous, flushed })
    }

    fn flush_pending(&mut self, index: usize, item_type: &str) -> usize {
        let Some(queue) = self.pending.remove(item_type) else {
            return 0;
        };
        let entry = &self.entries[index];
        let total = queue.len();
        let delivered = queue
            .into_iter()
            .map(|payload| entry.worker.post(EditorMessage::Update(payload)))
            .filter(|posted| *posted)
            .count();
        if delivered < total {
            warn!(worker = %entry.id, item_type, lost = total - delivered, "registry: buffered updates lost");
        }
        debug!(worker = %entry.id, item_type, delivered, "registry: flushed buffered updates");
        delivered
    }

    /// Once every worker has announced, nothing can claim leftover buffers.
    fn drop_orphaned_pending(&mut self) {
        if self.awaiting_announcement() {
            return;
        }
        for (item_type, queue) in self.pending.drain() {
            warn!(item_type, dropped = queue.len(), "registry: no worker announced type; buffered items dropped");
        }
    }

    /// Drain every queued envelope without blocking. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(envelope) = self.inbox_rx.try_recv() {
            if let Err(e) = self.handle_message(envelope) {
                warn!(error = %e, "registry: inbound message rejected");
            }
            handled += 1;
        }
        handled
    }

    /// Wait for the next envelope and handle it.
    ///
    /// The registry keeps its own inbox sender alive, so this waits until a
    /// worker sends something; wrap it in a timeout when that may never happen.
    pub async fn recv(&mut self) -> Option<Result<Inbound, RegistryError>> {
        let envelope = self.inbox_rx.recv().await?;
        Some(self.handle_message(envelope))
    }

    // =========================================================================
    // OUTBOUND
    // =========================================================================

    /// Route an item update to the worker for `item_type`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnregisteredType`] when no worker holds the type and
    /// none is still pending announcement (or buffering is disabled);
    /// [`RegistryError::BufferFull`] when the per-type buffer is at capacity.
    pub fn dispatch(&mut self, item_type: &str, payload: ItemPayload) -> Result<DispatchOutcome, RegistryError> {
        if let Some(worker) = self.worker_id(item_type) {
            return Ok(self.post_to(worker, EditorMessage::Update(payload)));
        }

        if self.announce_buffer == 0 || !self.awaiting_announcement() {
            debug!(item_type, item = %payload.id(), "registry: no worker for type");
            return Err(RegistryError::UnregisteredType(item_type.to_owned()));
        }

        let limit = self.announce_buffer;
        let queue = self.pending.entry(item_type.to_owned()).or_default();
        if queue.len() >= limit {
            return Err(RegistryError::BufferFull { item_type: item_type.to_owned(), limit });
        }
        queue.push_back(payload);
        debug!(item_type, pending = queue.len(), "registry: update buffered until announcement");
        Ok(DispatchOutcome::Buffered { pending: queue.len() })
    }

    /// Ask the worker for `item_type` to drop an item. Buffered updates for
    /// the same id are discarded as well; when the type is not routable yet
    /// that discard is the whole removal and reports `Pruned`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnregisteredType`] when no worker holds the type and
    /// nothing buffered matched.
    pub fn dispatch_remove(&mut self, item_type: &str, id: ItemId) -> Result<DispatchOutcome, RegistryError> {
        let removed = match self.pending.get_mut(item_type) {
            Some(queue) => {
                let before = queue.len();
                queue.retain(|payload| *payload.id() != id);
                before - queue.len()
            }
            None => 0,
        };
        match self.worker_id(item_type) {
            Some(worker) => Ok(self.post_to(worker, EditorMessage::Remove(id))),
            None if removed > 0 => {
                debug!(item_type, item = %id, removed, "registry: buffered updates pruned");
                Ok(DispatchOutcome::Pruned { removed })
            }
            None => Err(RegistryError::UnregisteredType(item_type.to_owned())),
        }
    }

    fn post_to(&self, worker: WorkerId, message: EditorMessage) -> DispatchOutcome {
        let delivered = self.entry(worker).is_some_and(|entry| entry.worker.post(message));
        if delivered {
            DispatchOutcome::Delivered(worker)
        } else {
            debug!(%worker, "registry: worker gone, message lost");
            DispatchOutcome::Lost(worker)
        }
    }

    // =========================================================================
    // SUBSCRIPTIONS
    // =========================================================================

    /// Observe every inbound envelope after the registry has processed it.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&Envelope) + Send + 'static,
    {
        let id = Uuid::new_v4();
        self.subscribers.push((id, Box::new(handler)));
        id
    }

    /// Returns `false` if the subscription was not found.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    // =========================================================================
    // TEARDOWN
    // =========================================================================

    /// Terminate every worker, detach listeners and drop subscriptions,
    /// buffered items and unprocessed inbound messages.
    pub fn remove_all(&mut self) -> usize {
        let count = self.entries.len();
        for entry in &mut self.entries {
            entry.worker.terminate();
        }
        self.entries.clear();
        self.by_type.clear();
        self.subscribers.clear();
        self.pending.clear();
        while self.inbox_rx.try_recv().is_ok() {}
        if count > 0 {
            info!(workers = count, "registry: all workers terminated");
        }
        count
    }
}

impl<W: WorkerEndpoint> Drop for WorkerRegistry<W> {
    fn drop(&mut self) {
        self.remove_all();
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
