pub mod cache;
pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod floc;
mod registry;
pub mod slice;

pub use cache::{SccCache, SimpleCache};
pub use config::{FlocSelection, RegistryConfig};
pub use error::RegistryError;
pub use floc::KnownFlocs;
pub use registry::{
    FlocView, ShardRegistry, ShardRegistryBuilder, StateCache, TokenCache,
};
pub use slice::ReplicaPolicy;
