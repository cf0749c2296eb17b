// ABOUTME: Simulated registry responses for dry runs.
// ABOUTME: Fixed, realistic push record sequence; nothing is contacted.

use crate::types::{ImageReference, StatusRecord};
use serde_json::json;

const LAYER_ID: &str = "5f70bf18a086";
const MANIFEST_DIGEST: &str =
    "sha256:0a06b8a7b1c4b0c2b4e43fb3a1fc6f0e0a0c32c0ab4a3e1b4f5b0c1f9d4e2a71";
const MANIFEST_SIZE: u64 = 528;

/// The records a registry would stream back for an already-mirrored image.
///
/// The sequence always ends with the `aux` summary carrying `Tag`,
/// `Digest` and `Size`.
pub fn simulated_push(reference: &ImageReference) -> Vec<StatusRecord> {
    let tag = reference.tag();
    vec![
        StatusRecord::new().with(
            "status",
            format!("The push refers to repository [{}]", reference.dest_repo()),
        ),
        StatusRecord::new()
            .with("status", "Preparing")
            .with("progressDetail", json!({}))
            .with("id", LAYER_ID),
        StatusRecord::new()
            .with("status", "Layer already exists")
            .with("progressDetail", json!({}))
            .with("id", LAYER_ID),
        StatusRecord::new().with(
            "status",
            format!("{tag}: digest: {MANIFEST_DIGEST} size: {MANIFEST_SIZE}"),
        ),
        StatusRecord::new().with("progressDetail", json!({})).with(
            "aux",
            json!({"Tag": tag, "Digest": MANIFEST_DIGEST, "Size": MANIFEST_SIZE}),
        ),
    ]
}
