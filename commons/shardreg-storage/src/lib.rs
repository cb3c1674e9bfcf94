pub mod error;
mod table;
pub mod traits;

#[cfg(feature = "file")]
pub mod file;

#[cfg(feature = "memory")]
pub mod memory;

// Always compile the unified facade; it internally gates per-feature.
pub mod unified;

pub use error::*;
pub use traits::*;
