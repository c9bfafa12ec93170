//! Rendering workers — one item type per worker, each on its own tokio task.
//!
//! `WorkerCore` is the synchronous state machine (store + surfaces +
//! renderer); `WorkerHandle` owns the task that drives it and the channels
//! in and out. The editor only ever sees the handle, through
//! [`WorkerEndpoint`].

use std::collections::HashMap;

use canvas::render::ItemRenderer;
use canvas::store::{ItemStore, MergeOutcome};
use frames::{EditorMessage, ItemId, WorkerMessage};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::registry::{Envelope, Inbox, WorkerEndpoint, WorkerId};

// =============================================================================
// CORE
// =============================================================================

/// Worker-side state for one item type.
pub struct WorkerCore<R: ItemRenderer> {
    renderer: R,
    store: ItemStore,
    surfaces: HashMap<ItemId, R::Surface>,
}

impl<R: ItemRenderer> WorkerCore<R> {
    #[must_use]
    pub fn new(renderer: R) -> Self {
        Self { renderer, store: ItemStore::new(), surfaces: HashMap::new() }
    }

    #[must_use]
    pub fn item_type(&self) -> &str {
        self.renderer.item_type()
    }

    #[must_use]
    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    #[must_use]
    pub fn surface(&self, id: &ItemId) -> Option<&R::Surface> {
        self.surfaces.get(id)
    }

    /// Apply one editor message. Returns the reply to post back, if any.
    pub fn handle(&mut self, message: EditorMessage) -> Option<WorkerMessage> {
        match message {
            EditorMessage::AnnounceType => Some(WorkerMessage::Type(self.renderer.item_type().to_owned())),
            EditorMessage::Update(payload) => {
                let id = payload.id().clone();
                let (outcome, record) = self.store.apply_update(payload);
                if outcome == MergeOutcome::Inserted {
                    debug!(item = %id, "worker: item inserted");
                }
                let surface = self
                    .surfaces
                    .entry(id.clone())
                    .or_insert_with(|| self.renderer.create_surface(record));
                match self.renderer.render(record, surface) {
                    Ok(()) => Some(WorkerMessage::Rendered(id)),
                    Err(e) => {
                        warn!(item = %id, error = %e, "worker: render failed");
                        None
                    }
                }
            }
            EditorMessage::Remove(id) => {
                let existed = self.store.remove(&id).is_some();
                self.surfaces.remove(&id);
                debug!(item = %id, existed, "worker: item removed");
                None
            }
            EditorMessage::Unknown { event_name, .. } => {
                debug!(event_name, "worker: ignoring unrecognized message");
                None
            }
        }
    }
}

async fn run_worker<R: ItemRenderer>(
    mut core: WorkerCore<R>,
    mut rx: mpsc::UnboundedReceiver<EditorMessage>,
    tx: mpsc::UnboundedSender<WorkerMessage>,
) {
    info!(item_type = core.item_type(), "worker: started");
    while let Some(message) = rx.recv().await {
        let Some(reply) = core.handle(message) else {
            continue;
        };
        if tx.send(reply).is_err() {
            debug!(item_type = core.item_type(), "worker: editor side closed");
            break;
        }
    }
    info!(item_type = core.item_type(), items = core.store().len(), "worker: stopped");
}

// =============================================================================
// HANDLE
// =============================================================================

/// Editor-side handle to a spawned worker task.
pub struct WorkerHandle {
    to_worker: mpsc::UnboundedSender<EditorMessage>,
    from_worker: Option<mpsc::UnboundedReceiver<WorkerMessage>>,
    task: JoinHandle<()>,
    listener: Option<JoinHandle<()>>,
    terminated: bool,
}

impl WorkerHandle {
    /// Start a worker task for `renderer`. Must be called inside a tokio runtime.
    #[must_use]
    pub fn spawn<R: ItemRenderer>(renderer: R) -> Self {
        let (to_worker, rx) = mpsc::unbounded_channel();
        let (tx, from_worker) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_worker(WorkerCore::new(renderer), rx, tx));
        Self { to_worker, from_worker: Some(from_worker), task, listener: None, terminated: false }
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl WorkerEndpoint for WorkerHandle {
    fn post(&self, message: EditorMessage) -> bool {
        !self.terminated && self.to_worker.send(message).is_ok()
    }

    fn listen(&mut self, id: WorkerId, inbox: Inbox) {
        let Some(mut rx) = self.from_worker.take() else {
            warn!(worker = %id, "worker: listener already attached");
            return;
        };
        self.listener = Some(tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if inbox.send(Envelope { worker: id, message }).is_err() {
                    break;
                }
            }
        }));
    }

    fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        self.task.abort();
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(test)]
#[path = "worker_test.rs"]
mod tests;
