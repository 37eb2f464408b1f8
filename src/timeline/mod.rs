//! Timeline Resolver: frame count, frame rate and canvas size from animation metadata.

/// Resolved descriptor and the loader that produces it.
pub mod descriptor;

pub use descriptor::{
    Animation, AnimationDescriptor, DEFAULT_CANVAS_SIZE, DEFAULT_FRAME_RATE, load_animation,
    resolve,
};
