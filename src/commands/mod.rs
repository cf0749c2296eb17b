// ABOUTME: Command module aggregator for the image-sync CLI.
// ABOUTME: Re-exports sync and purge command handlers.

mod purge;
mod runtime_connection;
mod sync;

pub use purge::{PurgeTargets, purge};
pub use sync::sync;
