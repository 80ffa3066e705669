//! Shared types for the bubble editor.
//!
//! # Invariants
//! - Entity handles are never zero. Zero is the "no entity" sentinel in the
//!   object-id attachment.

mod types;

pub use types::{EntityId, Extent, Transform};
