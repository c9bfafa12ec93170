//! Canvas editor: a pan/zoom viewport over a host container, plus a set of
//! rendering workers that each own one item type.
//!
//! | Module     | Role                                                     |
//! |------------|----------------------------------------------------------|
//! | `config`   | `EditorConfig` from `CANVAS_*` environment variables     |
//! | `editor`   | `Editor`: viewport + host binding + worker registry      |
//! | `host`     | `Host` trait and a headless host                         |
//! | `registry` | Worker registration, type routing, inbound dispatch      |
//! | `worker`   | `WorkerCore` state machine and the tokio `WorkerHandle`  |
//!
//! The runtime-free pieces live in the `canvas` (viewport, input, store,
//! rendering) and `frames` (message protocol) crates and are re-exported here.

pub mod config;
pub mod editor;
pub mod host;
pub mod registry;
pub mod worker;

pub use canvas;
pub use frames;
