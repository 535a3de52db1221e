//! Atlas layout and texel storage
//!
//! - [`packer`]: places one region per clip
//! - [`texture`]: the RGBA16F buffer those regions live in

pub mod packer;
pub mod texture;

pub use packer::{AtlasPacker, ClipRegion, DEFAULT_FILL_FACTOR, PackOptions, PackResult, Rect};
pub use texture::{AddressMode, Atlas, FilterMode};
