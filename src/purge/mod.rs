// ABOUTME: Purge local images that no container references.
// ABOUTME: Exact-name, id-prefix and dangling-image purges.

mod error;
mod purger;

pub use error::PurgeError;
pub use purger::{PurgeOutcome, PurgeReport, Purger};
