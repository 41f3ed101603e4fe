//! Block type registry: per-type render and light flags, TOML-configurable.
#![forbid(unsafe_code)]

pub mod config;
mod registry;
pub mod types;

pub use registry::BlockRegistry;
pub use types::{AIR, BlockId, BlockType, OUT_OF_BOUNDS};
