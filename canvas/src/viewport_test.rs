#![allow(clippy::float_cmp)]

use super::*;
use crate::input::{Modifiers, WheelDelta};

const EPSILON: f64 = 1e-10;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

/// 200x100 container at the host origin; center is (100, 50).
fn bounds() -> BoundingBox {
    BoundingBox::new(0.0, 0.0, 200.0, 100.0)
}

fn wheel(client: Point, dx: f64, dy: f64, ctrl: bool) -> WheelEvent {
    WheelEvent { client, delta: WheelDelta { dx, dy }, modifiers: Modifiers { ctrl, ..Default::default() } }
}

// --- Defaults ---

#[test]
fn viewport_defaults_to_identity() {
    let vp = Viewport::new();
    assert_eq!(vp.x(), 0.0);
    assert_eq!(vp.y(), 0.0);
    assert_eq!(vp.scale(), 1.0);
    assert_eq!(vp.mouse(), Point::new(0.0, 0.0));
    assert_eq!(vp.transform(), compute_transform(0.0, 0.0, 1.0));
}

#[test]
fn bounding_box_center() {
    let b = BoundingBox::new(10.0, 20.0, 200.0, 100.0);
    assert_eq!(b.center(), Point::new(110.0, 70.0));
}

// --- Transform ---

#[test]
fn transform_negates_pan() {
    let t = compute_transform(10.0, -4.0, 2.0);
    assert_eq!(t.translate_x, -10.0);
    assert_eq!(t.translate_y, 4.0);
    assert_eq!(t.scale, 2.0);
}

#[test]
fn transform_css_format() {
    assert_eq!(compute_transform(10.0, -4.5, 1.5).to_css(), "translate(-10px, 4.5px) scale(1.5)");
}

#[test]
fn transform_css_prints_zero_pan_without_sign() {
    assert_eq!(compute_transform(0.0, 0.0, 1.0).to_string(), "translate(0px, 0px) scale(1)");
}

#[test]
fn transform_matrix_layout() {
    let m = compute_transform(3.0, 4.0, 2.0).matrix();
    assert_eq!(m, [2.0, 0.0, 0.0, 2.0, -3.0, -4.0]);
}

#[test]
fn transform_apply_and_invert_are_inverse() {
    let t = compute_transform(13.7, -42.3, 0.75);
    let p = Point::new(333.3, -999.9);
    assert!(point_approx_eq(t.invert(t.apply(p)), p));
}

// --- Setters ---

#[test]
fn setters_return_the_new_transform() {
    let mut vp = Viewport::new();
    assert_eq!(vp.set_x(5.0), compute_transform(5.0, 0.0, 1.0));
    assert_eq!(vp.set_y(6.0), compute_transform(5.0, 6.0, 1.0));
    let t = vp.set_scale(2.0).expect("valid scale");
    assert_eq!(t, compute_transform(5.0, 6.0, 2.0));
    assert_eq!(vp.transform(), t);
}

#[test]
fn setter_sequence_matches_single_computation() {
    let mut vp = Viewport::new();
    vp.set_x(1.0);
    vp.set_scale(3.0).expect("valid scale");
    vp.set_y(7.0);
    vp.set_x(-2.0);
    vp.set_scale(0.5).expect("valid scale");
    vp.set_pan(4.0, 9.0);
    vp.set_y(-1.0);
    assert_eq!(vp.transform(), compute_transform(4.0, -1.0, 0.5));
}

#[test]
fn set_scale_rejects_zero_negative_and_nan() {
    let mut vp = Viewport::new();
    assert!(matches!(vp.set_scale(0.0), Err(ViewportError::InvalidScale(_))));
    assert!(matches!(vp.set_scale(-1.0), Err(ViewportError::InvalidScale(_))));
    assert!(matches!(vp.set_scale(f64::NAN), Err(ViewportError::InvalidScale(_))));
    assert!(matches!(vp.set_scale(f64::INFINITY), Err(ViewportError::InvalidScale(_))));
    assert_eq!(vp.scale(), 1.0);
}

// --- Mouse position ---

#[test]
fn mouse_at_container_center_is_scene_origin() {
    let mut vp = Viewport::new();
    let m = vp.update_mouse_position(Point::new(100.0, 50.0), &bounds());
    assert_eq!(m, Point::new(0.0, 0.0));
    assert_eq!(vp.mouse(), m);
}

#[test]
fn mouse_accounts_for_container_offset() {
    let mut vp = Viewport::new();
    let b = BoundingBox::new(40.0, 30.0, 200.0, 100.0);
    let m = vp.update_mouse_position(Point::new(150.0, 80.0), &b);
    assert_eq!(m, Point::new(10.0, 0.0));
}

#[test]
fn mouse_divides_by_scale() {
    let mut vp = Viewport::new();
    vp.set_scale(2.0).expect("valid scale");
    let m = vp.update_mouse_position(Point::new(140.0, 70.0), &bounds());
    assert!(point_approx_eq(m, Point::new(20.0, 10.0)));
}

#[test]
fn mouse_is_inverse_of_scene_to_host() {
    let mut vp = Viewport::new();
    vp.set_pan(35.0, -12.0);
    vp.set_scale(1.75).expect("valid scale");
    let scene = Point::new(-80.0, 44.0);
    let host = vp.scene_to_host(scene, &bounds());
    assert!(point_approx_eq(vp.update_mouse_position(host, &bounds()), scene));
}

// --- Zoom to pointer ---

#[test]
fn zoom_in_keeps_pointer_point_fixed() {
    let mut vp = Viewport::new();
    let b = bounds();
    // Pointer 50px right of center: scene (50, 0).
    let client = Point::new(150.0, 50.0);
    let scene = vp.update_mouse_position(client, &b);
    assert_eq!(scene, Point::new(50.0, 0.0));
    let before = vp.scene_to_host(scene, &b);

    let outcome = vp.on_wheel(&wheel(client, 0.0, -100.0, true), &b);

    assert!(approx_eq(vp.scale(), 1.2));
    assert!(approx_eq(vp.x(), 10.0));
    assert!(approx_eq(vp.y(), 0.0));
    assert!(point_approx_eq(vp.scene_to_host(scene, &b), before));
    assert_eq!(outcome.disposition, EventDisposition::PreventDefault);
    assert_eq!(outcome.transform, vp.transform());
}

#[test]
fn zoom_out_keeps_pointer_point_fixed_with_existing_pan() {
    let mut vp = Viewport::new();
    vp.set_pan(-30.0, 25.0);
    vp.set_scale(2.0).expect("valid scale");
    let b = BoundingBox::new(15.0, 5.0, 640.0, 480.0);
    let client = Point::new(97.0, 411.0);
    let scene = vp.host_to_scene(client, &b);

    vp.on_wheel(&wheel(client, 0.0, 120.0, true), &b);

    assert!(vp.scale() < 2.0);
    assert!(point_approx_eq(vp.scene_to_host(scene, &b), client));
}

#[test]
fn zoom_clamps_to_minimum_scale() {
    let mut vp = Viewport::new();
    vp.update_mouse_position(Point::new(100.0, 50.0), &bounds());
    vp.zoom_at_pointer(10_000.0);
    assert_eq!(vp.scale(), crate::consts::MIN_SCALE);
}

#[test]
fn zoom_clamps_to_maximum_scale() {
    let mut vp = Viewport::new();
    vp.set_scale(90.0).expect("valid scale");
    vp.zoom_at_pointer(-500.0);
    assert_eq!(vp.scale(), crate::consts::MAX_SCALE);
}

// --- Pan ---

#[test]
fn pan_at_unit_scale_moves_by_delta() {
    let mut vp = Viewport::new();
    let outcome = vp.on_wheel(&wheel(Point::new(0.0, 0.0), 10.0, 0.0, false), &bounds());
    assert_eq!(vp.x(), 10.0);
    assert_eq!(vp.y(), 0.0);
    assert_eq!(outcome.disposition, EventDisposition::PreventDefault);
}

#[test]
fn pan_does_not_change_scale() {
    let mut vp = Viewport::new();
    vp.set_scale(3.0).expect("valid scale");
    vp.on_wheel(&wheel(Point::new(0.0, 0.0), 5.0, 5.0, false), &bounds());
    assert_eq!(vp.scale(), 3.0);
}

#[test]
fn pan_speed_is_one_at_unit_scale() {
    assert_eq!(pan_speed(1.0), 1.0);
}

#[test]
fn pan_speed_floors_when_zoomed_in() {
    // 1/20 = 0.05 -> floored.
    assert_eq!(pan_speed(20.0), 0.1);
}

#[test]
fn pan_speed_compresses_when_zoomed_out() {
    // 1/0.1 = 10 -> (10 - 1) * 0.01 + 1.
    assert!(approx_eq(pan_speed(0.1), 1.09));
}

#[test]
fn pan_uses_clamped_speed() {
    let mut vp = Viewport::new();
    vp.set_scale(20.0).expect("valid scale");
    vp.pan_by(10.0, -20.0);
    assert!(approx_eq(vp.x(), 1.0));
    assert!(approx_eq(vp.y(), -2.0));
}

#[test]
fn wheel_updates_mouse_even_when_panning() {
    let mut vp = Viewport::new();
    vp.on_wheel(&wheel(Point::new(120.0, 60.0), 1.0, 0.0, false), &bounds());
    assert_eq!(vp.mouse(), Point::new(20.0, 10.0));
}
