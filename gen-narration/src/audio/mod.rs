//! Audio assembly for narrated chapters.

pub mod assembler;
pub mod duration;
pub mod store;

pub use assembler::{AudioAssembler, RetryPolicy};
pub use duration::estimate_duration_secs;
pub use store::{AudioLookup, AudioStore};
