// ABOUTME: Sync command implementation.
// ABOUTME: Resolves the configured batch and runs it through the syncer.

use super::runtime_connection::{connect_to_runtime, lazy_runtime};
use image_sync::config::Config;
use image_sync::error::Result;
use image_sync::output::Output;
use image_sync::runtime::RuntimeConfig;
use image_sync::sync::Syncer;
use image_sync::types::SyncDirection;

/// Sync every configured image. Entry failures are reported, not returned.
pub async fn sync(
    config: Config,
    direction: Option<SyncDirection>,
    dry_run: bool,
    flags: RuntimeConfig,
    mut output: Output,
) -> Result<()> {
    output.start_timer();

    let mut context = config.context();
    if let Some(direction) = direction {
        context = context.direction(direction);
    }

    let runtime = lazy_runtime(flags, Some(config.runtime_config()));
    if !dry_run {
        connect_to_runtime(&runtime, &output).await?;
    }

    let specs: Vec<&str> = config.images.iter().map(String::as_str).collect();
    let report = Syncer::new(&runtime, &output)
        .options(config.sync_options(dry_run))
        .sync_batch(&specs, &context)
        .await;

    output.summary(&report);
    Ok(())
}
