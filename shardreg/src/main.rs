use std::sync::Arc;

use clap::Parser;
use envconfig::Envconfig;
use shardreg::{
    RegistryConfig, ShardRegistry,
    cli::{ShardRegCli, run},
};
use shardreg_storage::unified::StoreConfig;
use tracing::debug;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_log();
    let cli = ShardRegCli::parse();
    let conf = RegistryConfig::init_from_env()?;
    let store = StoreConfig::init_from_env()?.open().await?;
    debug!("registry config: {:?}", conf);

    let registry = ShardRegistry::builder(Arc::new(store)).config(conf).build();
    registry.init().await?;
    let output = run(&registry, &cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn init_log() {
    use tracing::level_filters::LevelFilter;
    use tracing_subscriber::{
        EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("SHARDREG_LOG")
                .from_env_lossy(),
        )
        .init();
}
