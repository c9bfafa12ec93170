#![allow(clippy::float_cmp)]

use std::sync::{Arc, Mutex};

use canvas::input::{Modifiers, WheelDelta};
use canvas::render::{RecordingSurface, TEXT_ITEM_TYPE, TextRenderer};
use canvas::viewport::BoundingBox;
use serde_json::json;
use tokio::time::{Duration, timeout};

use super::*;
use crate::config::DuplicateTypePolicy;
use crate::host::HeadlessHost;

fn bounds() -> BoundingBox {
    BoundingBox::new(0.0, 0.0, 800.0, 600.0)
}

fn editor() -> Editor<HeadlessHost> {
    Editor::new(HeadlessHost::new(bounds()), EditorConfig::default())
}

fn wheel(x: f64, y: f64, dx: f64, dy: f64, ctrl: bool) -> WheelEvent {
    WheelEvent {
        client: Point::new(x, y),
        delta: WheelDelta { dx, dy },
        modifiers: Modifiers { ctrl, ..Modifiers::default() },
    }
}

async fn next(editor: &mut Editor<HeadlessHost>) -> Inbound {
    timeout(Duration::from_millis(500), editor.next_message())
        .await
        .expect("worker message timed out")
        .expect("inbox closed")
        .expect("message rejected")
}

// --- viewport wiring ---

#[test]
fn mount_applies_identity_transform() {
    let ed = editor();
    let applied = ed.host().applied();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].scale, 1.0);
    assert_eq!(applied[0].translate_x, 0.0);
}

#[test]
fn setters_push_transform_to_host() {
    let mut ed = editor();
    let t = ed.set_pan(10.0, -4.0);
    assert_eq!(ed.host().current(), Some(&t));
    assert_eq!(t.translate_x, -10.0);
    assert_eq!(t.translate_y, 4.0);

    ed.set_x(3.0);
    ed.set_y(5.0);
    assert_eq!(ed.viewport().x(), 3.0);
    assert_eq!(ed.viewport().y(), 5.0);
    assert_eq!(ed.host().applied().len(), 4);
}

#[test]
fn invalid_scale_is_rejected_without_host_update() {
    let mut ed = editor();
    assert!(matches!(ed.set_scale(0.0), Err(EditorError::Viewport(_))));
    assert_eq!(ed.host().applied().len(), 1);
    assert_eq!(ed.set_scale(2.0).unwrap().scale, 2.0);
}

#[test]
fn plain_wheel_pans_and_consumes_event() {
    let mut ed = editor();
    let disposition = ed.on_wheel(&wheel(400.0, 300.0, 0.0, 100.0, false));
    assert_eq!(disposition, EventDisposition::PreventDefault);
    assert_eq!(ed.viewport().y(), 100.0);
    assert_eq!(ed.host().current().unwrap().translate_y, -100.0);
}

#[test]
fn ctrl_wheel_keeps_point_under_pointer() {
    let mut ed = editor();
    ed.set_pan(25.0, -40.0);
    let client = Point::new(610.0, 120.0);
    let scene = ed.on_pointer_move(&PointerEvent { client }).unwrap();

    assert_eq!(ed.on_wheel(&wheel(client.x, client.y, 0.0, -120.0, true)), EventDisposition::PreventDefault);
    assert!(ed.viewport().scale() > 1.0);

    let back = ed.viewport().scene_to_host(scene, &bounds());
    assert!((back.x - client.x).abs() < 1e-9);
    assert!((back.y - client.y).abs() < 1e-9);
}

#[test]
fn pointer_move_updates_mouse_position() {
    let mut ed = editor();
    let p = ed.on_pointer_move(&PointerEvent { client: Point::new(500.0, 250.0) }).unwrap();
    assert_eq!(p, Point::new(100.0, -50.0));
    assert_eq!(ed.mouse_position(), p);
}

#[test]
fn read_only_editor_ignores_input() {
    let config = EditorConfig { editable: false, ..EditorConfig::default() };
    let mut ed: Editor<HeadlessHost> = Editor::new(HeadlessHost::new(bounds()), config);

    assert!(ed.on_pointer_move(&PointerEvent { client: Point::new(500.0, 250.0) }).is_none());
    assert_eq!(ed.on_wheel(&wheel(400.0, 300.0, 0.0, 50.0, false)), EventDisposition::Default);
    assert_eq!(ed.viewport().y(), 0.0);
    // Programmatic setters still apply.
    ed.set_pan(1.0, 1.0);
    assert_eq!(ed.viewport().x(), 1.0);
}

// --- items without workers ---

#[test]
fn add_item_without_workers_is_not_fatal() {
    let mut ed = editor();
    let err = ed.add_item(TEXT_ITEM_TYPE, json!({ "id": 1, "text": "x" })).unwrap_err();
    assert!(matches!(err, EditorError::Registry(RegistryError::UnregisteredType(_))));
    assert!(ed.get_worker(TEXT_ITEM_TYPE).is_none());

    // The editor keeps working.
    ed.set_pan(5.0, 5.0);
    assert_eq!(ed.process_messages(), 0);
}

#[test]
fn add_item_requires_object_with_id() {
    let mut ed = editor();
    assert!(matches!(ed.add_item(TEXT_ITEM_TYPE, json!({ "text": "x" })), Err(EditorError::Codec(_))));
    assert!(matches!(ed.add_item(TEXT_ITEM_TYPE, json!("x")), Err(EditorError::Codec(_))));
}

#[test]
fn destroy_is_idempotent_and_final() {
    let mut ed = editor();
    ed.destroy();
    ed.destroy();
    assert!(ed.is_destroyed());
    assert!(matches!(ed.add_item(TEXT_ITEM_TYPE, json!({ "id": 1 })), Err(EditorError::Destroyed)));
    assert!(matches!(ed.remove_item(TEXT_ITEM_TYPE, ItemId::from(1)), Err(EditorError::Destroyed)));
    assert_eq!(ed.on_wheel(&wheel(0.0, 0.0, 0.0, 10.0, false)), EventDisposition::Default);
}

// --- with spawned workers ---

#[tokio::test]
async fn spawned_worker_announces_then_renders_items() {
    let mut ed = editor();
    let id = ed.spawn_worker(TextRenderer::<RecordingSurface>::new()).unwrap();

    let announced = next(&mut ed).await;
    assert_eq!(
        announced,
        Inbound::Announced { worker: id, item_type: TEXT_ITEM_TYPE.into(), previous: None, flushed: 0 }
    );
    assert!(ed.get_worker(TEXT_ITEM_TYPE).is_some());

    let outcome = ed.add_item(TEXT_ITEM_TYPE, json!({ "id": 1, "text": "hello" })).unwrap();
    assert_eq!(outcome, DispatchOutcome::Delivered(id));
    assert_eq!(next(&mut ed).await, Inbound::Acknowledged { worker: id, item: ItemId::from(1) });

    assert_eq!(ed.remove_item(TEXT_ITEM_TYPE, ItemId::from(1)).unwrap(), DispatchOutcome::Delivered(id));
    ed.destroy();
    assert!(ed.next_message().await.is_none());
}

#[tokio::test]
async fn items_added_before_announcement_are_flushed() {
    let mut ed = editor();
    let id = ed.spawn_worker(TextRenderer::<RecordingSurface>::new()).unwrap();

    let outcome = ed.add_item(TEXT_ITEM_TYPE, json!({ "id": "early", "text": "x" })).unwrap();
    assert_eq!(outcome, DispatchOutcome::Buffered { pending: 1 });

    assert!(matches!(next(&mut ed).await, Inbound::Announced { flushed: 1, .. }));
    assert_eq!(next(&mut ed).await, Inbound::Acknowledged { worker: id, item: ItemId::from("early") });
}

#[tokio::test]
async fn unbuffered_editor_reports_early_items() {
    let config = EditorConfig { announce_buffer: 0, ..EditorConfig::default() };
    let mut ed: Editor<HeadlessHost> = Editor::new(HeadlessHost::new(bounds()), config);
    ed.spawn_worker(TextRenderer::<RecordingSurface>::new()).unwrap();

    let early = ed.add_item(TEXT_ITEM_TYPE, json!({ "id": 1, "text": "x" }));
    assert!(matches!(early, Err(EditorError::Registry(RegistryError::UnregisteredType(_)))));

    next(&mut ed).await;
    assert!(ed.add_item(TEXT_ITEM_TYPE, json!({ "id": 1, "text": "x" })).is_ok());
}

#[tokio::test]
async fn rejected_duplicate_surfaces_as_error() {
    let config = EditorConfig { duplicate_policy: DuplicateTypePolicy::Reject, ..EditorConfig::default() };
    let mut ed: Editor<HeadlessHost> = Editor::new(HeadlessHost::new(bounds()), config);
    let first = ed.spawn_worker(TextRenderer::<RecordingSurface>::new()).unwrap();
    next(&mut ed).await;
    ed.spawn_worker(TextRenderer::<RecordingSurface>::new()).unwrap();

    let second = timeout(Duration::from_millis(500), ed.next_message()).await.unwrap().unwrap();
    assert!(matches!(second, Err(EditorError::Registry(RegistryError::DuplicateType { .. }))));
    assert_eq!(ed.registry().worker_id(TEXT_ITEM_TYPE), Some(first));

    // Every worker has now answered, so an unclaimed type is a lookup failure.
    let unclaimed = ed.add_item("image", json!({ "id": 1 }));
    assert!(matches!(unclaimed, Err(EditorError::Registry(RegistryError::UnregisteredType(_)))));
}

#[tokio::test]
async fn subscribers_observe_worker_messages() {
    let mut ed = editor();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let sub = ed.subscribe(move |env| sink.lock().unwrap().push(env.message.clone()));

    ed.spawn_worker(TextRenderer::<RecordingSurface>::new()).unwrap();
    next(&mut ed).await;
    assert!(ed.unsubscribe(sub));

    assert_eq!(*seen.lock().unwrap(), vec![frames::WorkerMessage::Type(TEXT_ITEM_TYPE.into())]);
}

#[tokio::test]
async fn destroy_terminates_spawned_workers() {
    let mut ed = editor();
    ed.spawn_worker(TextRenderer::<RecordingSurface>::new()).unwrap();
    next(&mut ed).await;

    ed.destroy();
    assert!(ed.get_worker(TEXT_ITEM_TYPE).is_none());
    assert!(ed.registry().is_empty());
    assert!(matches!(
        ed.spawn_worker(TextRenderer::<RecordingSurface>::new()),
        Err(EditorError::Destroyed)
    ));
}
