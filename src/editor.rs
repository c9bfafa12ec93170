//! Editor — owns the viewport, the host binding and the worker registry.
//!
//! Everything here runs on one task and is driven by `&mut self`: input
//! events and setters update the viewport and push the new transform to the
//! host; items are routed to workers through the registry; worker replies
//! are drained with `process_messages` or awaited with `next_message`.

use canvas::input::{EventDisposition, PointerEvent, WheelEvent};
use canvas::render::ItemRenderer;
use canvas::viewport::{Point, Transform, Viewport, ViewportError};
use frames::{CodecError, ItemId, ItemPayload};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::EditorConfig;
use crate::host::Host;
use crate::registry::{
    DispatchOutcome, Envelope, Inbound, RegistryError, SubscriptionId, WorkerEndpoint, WorkerId, WorkerRegistry,
};
use crate::worker::WorkerHandle;

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("editor has been destroyed")]
    Destroyed,
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Viewport(#[from] ViewportError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

pub struct Editor<H: Host, W: WorkerEndpoint = WorkerHandle> {
    host: H,
    config: EditorConfig,
    viewport: Viewport,
    registry: WorkerRegistry<W>,
    destroyed: bool,
}

impl<H: Host, W: WorkerEndpoint> Editor<H, W> {
    /// Mount an editor on `host` and apply the initial transform.
    pub fn new(mut host: H, config: EditorConfig) -> Self {
        let viewport = Viewport::new();
        host.apply_transform(&viewport.transform());
        let registry = WorkerRegistry::new(config.duplicate_policy, config.announce_buffer);
        info!(editable = config.editable, policy = ?config.duplicate_policy, "editor: mounted");
        Self { host, config, viewport, registry, destroyed: false }
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[must_use]
    pub fn registry(&self) -> &WorkerRegistry<W> {
        &self.registry
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Scene-space pointer position from the latest pointer or wheel event.
    #[must_use]
    pub fn mouse_position(&self) -> Point {
        self.viewport.mouse()
    }

    // =========================================================================
    // VIEWPORT
    // =========================================================================

    pub fn set_x(&mut self, value: f64) -> Transform {
        let transform = self.viewport.set_x(value);
        self.host.apply_transform(&transform);
        transform
    }

    pub fn set_y(&mut self, value: f64) -> Transform {
        let transform = self.viewport.set_y(value);
        self.host.apply_transform(&transform);
        transform
    }

    pub fn set_pan(&mut self, x: f64, y: f64) -> Transform {
        let transform = self.viewport.set_pan(x, y);
        self.host.apply_transform(&transform);
        transform
    }

    /// # Errors
    ///
    /// [`EditorError::Viewport`] for a non-positive or non-finite scale.
    pub fn set_scale(&mut self, value: f64) -> Result<Transform, EditorError> {
        let transform = self.viewport.set_scale(value)?;
        self.host.apply_transform(&transform);
        Ok(transform)
    }

    fn accepts_input(&self) -> bool {
        self.config.editable && !self.destroyed
    }

    /// Track the pointer. Returns the new scene-space position, or `None`
    /// when input is disabled.
    pub fn on_pointer_move(&mut self, event: &PointerEvent) -> Option<Point> {
        if !self.accepts_input() {
            return None;
        }
        let bounds = self.host.bounding_box();
        Some(self.viewport.update_mouse_position(event.client, &bounds))
    }

    /// Ctrl+wheel zooms toward the pointer; plain wheel pans. A handled
    /// event returns `PreventDefault`.
    pub fn on_wheel(&mut self, event: &WheelEvent) -> EventDisposition {
        if !self.accepts_input() {
            return EventDisposition::Default;
        }
        let bounds = self.host.bounding_box();
        let outcome = self.viewport.on_wheel(event, &bounds);
        self.host.apply_transform(&outcome.transform);
        outcome.disposition
    }

    // =========================================================================
    // WORKERS + ITEMS
    // =========================================================================

    /// Register a worker. It becomes routable once its type announcement
    /// has been processed.
    ///
    /// # Errors
    ///
    /// [`EditorError::Destroyed`] after `destroy`; the worker is dropped.
    pub fn add_worker(&mut self, worker: W) -> Result<WorkerId, EditorError> {
        if self.destroyed {
            return Err(EditorError::Destroyed);
        }
        Ok(self.registry.add_worker(worker))
    }

    #[must_use]
    pub fn get_worker(&self, item_type: &str) -> Option<&W> {
        self.registry.get_worker(item_type)
    }

    /// Send an item update to the worker for `item_type`. `data` must be an
    /// object carrying an `id`.
    ///
    /// # Errors
    ///
    /// [`EditorError::Destroyed`], [`EditorError::Codec`] for malformed data,
    /// and [`EditorError::Registry`] when no worker can take the type. None
    /// of these affect editor state.
    pub fn add_item(&mut self, item_type: &str, data: Value) -> Result<DispatchOutcome, EditorError> {
        if self.destroyed {
            return Err(EditorError::Destroyed);
        }
        let payload = ItemPayload::from_value(data)?;
        let id = payload.id().clone();
        self.registry.dispatch(item_type, payload).map_err(|e| {
            warn!(item_type, item = %id, error = %e, "editor: item not dispatched");
            e.into()
        })
    }

    /// # Errors
    ///
    /// [`EditorError::Destroyed`], or [`EditorError::Registry`] when no
    /// worker holds the type and no buffered update for `id` was pending.
    pub fn remove_item(&mut self, item_type: &str, id: ItemId) -> Result<DispatchOutcome, EditorError> {
        if self.destroyed {
            return Err(EditorError::Destroyed);
        }
        Ok(self.registry.dispatch_remove(item_type, id)?)
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&Envelope) + Send + 'static,
    {
        self.registry.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.registry.unsubscribe(id)
    }

    /// Handle every worker message already queued. Never waits.
    pub fn process_messages(&mut self) -> usize {
        self.registry.pump()
    }

    /// Wait for the next worker message and handle it. `None` once destroyed.
    pub async fn next_message(&mut self) -> Option<Result<Inbound, EditorError>> {
        if self.destroyed {
            return None;
        }
        let result = self.registry.recv().await?;
        Some(result.map_err(EditorError::from))
    }

    /// Terminate every worker and stop accepting input. Idempotent.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        let workers = self.registry.remove_all();
        info!(workers, "editor: destroyed");
    }
}

impl<H: Host> Editor<H, WorkerHandle> {
    /// Spawn a tokio worker for `renderer` and register it.
    ///
    /// # Errors
    ///
    /// [`EditorError::Destroyed`] after `destroy`.
    pub fn spawn_worker<R: ItemRenderer>(&mut self, renderer: R) -> Result<WorkerId, EditorError> {
        if self.destroyed {
            return Err(EditorError::Destroyed);
        }
        self.add_worker(WorkerHandle::spawn(renderer))
    }
}

#[cfg(test)]
#[path = "editor_test.rs"]
mod tests;
