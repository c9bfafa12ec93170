//! Viewport math, input types and worker-side item handling for the canvas editor.
//!
//! Everything here is runtime-free: no threads, channels or host APIs. The
//! editor crate composes these pieces with its worker registry, and worker
//! runtimes drive [`store::ItemStore`] and [`render::ItemRenderer`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`viewport`] | Pan/zoom state, transform and host ⇄ scene conversions |
//! | [`input`] | Pointer and wheel event types, modifier keys |
//! | [`store`] | Per-worker item records with shallow-merge updates |
//! | [`render`] | Drawing-surface trait, renderer trait, text autosize renderer |
//! | [`consts`] | Shared numeric constants (zoom limits, pan speed, text defaults) |

pub mod consts;
pub mod input;
pub mod render;
pub mod store;
pub mod viewport;
