//! Frame Store: run-scoped durable staging of rasterized frames.

/// Staging directory, frame keys and staged frame handles.
pub mod store;

pub use store::{FrameStore, StagedFrame};
