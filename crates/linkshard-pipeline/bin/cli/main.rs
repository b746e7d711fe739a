mod cli;

use crate::cli::{Command, CLI};
use anyhow::Context;
use clap::Parser;
use linkshard_core::ShortCode;
use linkshard_pipeline::{build_pipeline, connect_shards, LinkService};
use linkshard_storage::{Shard, ShardRouter};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    let _telemetry = linkshard_telemetry::init(&config.telemetry_settings())?;
    let settings = config.pipeline_settings();

    info!(
        shards = settings.shards.len(),
        node_id = settings.node_id,
        cache = %config.cache,
        dedupe = settings.dedupe,
        filter = %config.filter,
        "starting linkshard"
    );

    match &config.command {
        Command::Assign { long_url } => {
            let service = LinkService::new(build_pipeline(&settings).await?);
            let code = service
                .assign(long_url)
                .await
                .with_context(|| format!("failed to assign a code to {long_url}"))?;
            println!("{code}");
        }
        Command::Resolve { code } => {
            let service = LinkService::new(build_pipeline(&settings).await?);
            let long_url = service
                .resolve(code)
                .await
                .with_context(|| format!("failed to resolve {code}"))?;
            println!("{long_url}");
        }
        Command::Migrate => {
            settings.validate()?;
            for (idx, shard) in connect_shards(&settings).await?.iter().enumerate() {
                shard
                    .ensure_schema()
                    .await
                    .with_context(|| format!("failed to migrate shard {idx}"))?;
                info!(shard = idx, "Schema ready");
            }
        }
        Command::Route { code } => {
            let code = ShortCode::new(code.as_str())?;
            println!("{}", ShardRouter::new(settings.shards.len()).route(&code));
        }
    }

    Ok(())
}
