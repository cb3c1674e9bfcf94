use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Value, json};
use shardreg_models::{Floc, SearchParameters, ShardState, StoreRef};

use crate::{RegistryError, ShardRegistry};

#[derive(clap::Parser, Clone, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct ShardRegCli {
    #[command(subcommand)]
    pub command: ShardRegCommands,
}

#[derive(clap::Subcommand, Clone, Debug)]
pub enum ShardRegCommands {
    /// Register shard states read from a JSON file (one state or an array)
    #[clap(aliases = &["reg", "r"])]
    Register { file: PathBuf },
    /// Select one replica per shard for the given stores
    #[clap(aliases = &["s"])]
    Slice {
        /// Target store, e.g. `workspace://SpacesStore`
        #[arg(short, long = "store", required = true)]
        stores: Vec<StoreRef>,
    },
    /// List known flocs with their shards and replicas
    #[clap(aliases = &["f"])]
    Flocs,
    /// Remove shard states
    Purge {
        /// Only remove instances older than SHARDREG_INSTANCE_TIMEOUT_SECS
        #[arg(long)]
        aged: bool,
    },
}

#[derive(Serialize)]
struct FlocEntry {
    floc: Floc,
    shards: Vec<ShardEntry>,
}

#[derive(Serialize)]
struct ShardEntry {
    instance: u32,
    replicas: Vec<ShardState>,
}

/// Parse a register payload: either a single state or an array of states.
pub fn parse_states(payload: &str) -> Result<Vec<ShardState>, RegistryError> {
    let value: Value = serde_json::from_str(payload)?;
    let states = match value {
        Value::Array(_) => serde_json::from_value(value)?,
        other => vec![serde_json::from_value(other)?],
    };
    Ok(states)
}

/// Run one command and return its JSON output.
pub async fn run(
    registry: &ShardRegistry,
    command: &ShardRegCommands,
) -> anyhow::Result<Value> {
    let output = match command {
        ShardRegCommands::Register { file } => {
            let payload = tokio::fs::read_to_string(file).await?;
            let states = parse_states(&payload)?;
            let count = states.len();
            for state in states {
                registry.register_shard_state(state).await?;
            }
            json!({ "registered": count })
        }
        ShardRegCommands::Slice { stores } => {
            let params: SearchParameters = stores.iter().cloned().collect();
            serde_json::to_value(registry.index_slice(&params).await?)?
        }
        ShardRegCommands::Flocs => {
            registry.reload().await?;
            let mut view = registry.flocs();
            let mut entries = Vec::new();
            for floc in registry.known_flocs() {
                let mut shards: Vec<ShardEntry> = view
                    .remove(&floc)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(shard, replicas)| ShardEntry {
                        instance: shard.instance,
                        replicas,
                    })
                    .collect();
                shards.sort_by_key(|shard| shard.instance);
                entries.push(FlocEntry { floc, shards });
            }
            json!({ "sharded": registry.is_sharded(), "flocs": entries })
        }
        ShardRegCommands::Purge { aged: true } => {
            json!({ "purged": registry.purge_aged_out_shards().await? })
        }
        ShardRegCommands::Purge { aged: false } => {
            json!({ "purged": registry.purge().await? })
        }
    };
    Ok(output)
}
