use canvas::input::{Modifiers, PointerEvent, WheelDelta, WheelEvent};
use canvas::render::{RecordingSurface, TEXT_ITEM_TYPE, TextRenderer};
use canvas::viewport::{BoundingBox, Point};
use canvas_editor::config::EditorConfig;
use canvas_editor::editor::Editor;
use canvas_editor::host::HeadlessHost;
use serde_json::json;
use tokio::time::{Duration, timeout};
use tracing::{info, warn};

const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("no .env loaded: {e}");
    }
    tracing_subscriber::fmt::init();

    let config = EditorConfig::from_env().unwrap_or_else(|e| {
        warn!(error = %e, "invalid editor config; using defaults");
        EditorConfig::default()
    });

    let host = HeadlessHost::new(BoundingBox::new(0.0, 0.0, 800.0, 600.0));
    let mut editor: Editor<HeadlessHost> = Editor::new(host, config);

    let worker = editor
        .spawn_worker(TextRenderer::<RecordingSurface>::new())
        .expect("fresh editor accepts workers");
    info!(%worker, "text worker spawned");

    for (id, text) in [(1, "hello"), (2, "canvas")] {
        match editor.add_item(TEXT_ITEM_TYPE, json!({ "id": id, "text": text, "width": 240 })) {
            Ok(outcome) => info!(id, ?outcome, "item sent"),
            Err(e) => warn!(id, error = %e, "item not sent"),
        }
    }

    // Announcement plus one acknowledgement per item.
    for _ in 0..3 {
        match timeout(REPLY_TIMEOUT, editor.next_message()).await {
            Ok(Some(Ok(inbound))) => info!(?inbound, "worker message"),
            Ok(Some(Err(e))) => warn!(error = %e, "worker message rejected"),
            Ok(None) => break,
            Err(_) => {
                warn!("timed out waiting for worker");
                break;
            }
        }
    }

    let client = Point::new(600.0, 200.0);
    if let Some(scene) = editor.on_pointer_move(&PointerEvent { client }) {
        info!(x = scene.x, y = scene.y, "pointer in scene space");
    }
    let zoom = WheelEvent {
        client,
        delta: WheelDelta { dx: 0.0, dy: -100.0 },
        modifiers: Modifiers { ctrl: true, ..Modifiers::default() },
    };
    let pan = WheelEvent { client, delta: WheelDelta { dx: 40.0, dy: 0.0 }, modifiers: Modifiers::default() };
    for event in [zoom, pan] {
        let disposition = editor.on_wheel(&event);
        info!(?disposition, transform = %editor.viewport().transform(), "wheel");
    }

    editor.destroy();
}
