//! Per-frame input snapshot.
//!
//! The window layer writes into an [`InputState`] while polling platform
//! events; consumers (the scene camera, the editor UI) only read it.
//!
//! # Invariants
//! - Per-frame deltas (mouse motion, scroll, presses) are reset by
//!   [`InputState::begin_frame`] and accumulate until the next call.
//! - Held state survives across frames until the matching release.

mod state;

pub use state::{InputState, Key, MouseButton};
