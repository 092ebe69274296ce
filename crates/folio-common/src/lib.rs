//! Common utilities for the Folio layout engine.
//!
//! This crate provides shared infrastructure used by all engine components:
//! - **Warning System** - deduplicated diagnostics for skipped or malformed input
//! - **Cancellation** - a cooperative checkpoint polled by long traversals

pub mod cancel;
pub mod warning;

pub use cancel::{CancelToken, Cancelled};
