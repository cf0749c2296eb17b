// ABOUTME: Purge command implementation.
// ABOUTME: Removes named images, images by id, and/or dangling images.

use super::runtime_connection::{connect_to_runtime, lazy_runtime};
use image_sync::error::{Error, Result};
use image_sync::output::Output;
use image_sync::purge::{PurgeOutcome, Purger};
use image_sync::runtime::RuntimeConfig;

/// What to purge, as given on the command line.
pub struct PurgeTargets {
    pub names: Vec<String>,
    pub ids: Vec<String>,
    pub dangling: bool,
}

impl PurgeTargets {
    fn is_empty(&self) -> bool {
        self.names.is_empty() && self.ids.is_empty() && !self.dangling
    }
}

pub async fn purge(targets: PurgeTargets, flags: RuntimeConfig, mut output: Output) -> Result<()> {
    if targets.is_empty() {
        return Err(Error::NoPurgeTarget);
    }

    output.start_timer();
    let runtime = lazy_runtime(flags, None);
    connect_to_runtime(&runtime, &output).await?;

    let purger = Purger::new(&runtime, &output);
    let mut removed = 0;

    for name in &targets.names {
        if purger.purge_by_name(name).await? == PurgeOutcome::Removed {
            removed += 1;
        }
    }

    for id in &targets.ids {
        if purger.purge_by_id(id).await? == PurgeOutcome::Removed {
            removed += 1;
        }
    }

    if targets.dangling {
        let report = purger.purge_dangling().await?;
        removed += report.removed.len();
    }

    output.success(&format!("Removed {removed} image(s)"));
    Ok(())
}
