pub mod enums;
pub mod search;
pub mod shard;
pub mod store;

pub use enums::*;
pub use search::*;
pub use shard::*;
pub use store::*;
