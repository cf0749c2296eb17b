// ABOUTME: Registry sync: mirror images through pull, retag and push.
// ABOUTME: Best effort per batch; failures are reported, never retried.

mod dry_run;
mod error;
mod syncer;

pub use dry_run::simulated_push;
pub use error::{Stage, SyncError};
pub use syncer::{BatchReport, SyncOptions, Syncer};
