// ABOUTME: Shared helper for building and connecting the container runtime.
// ABOUTME: CLI flags win over config values; detection fills in the rest.

use image_sync::error::Result;
use image_sync::output::Output;
use image_sync::runtime::traits::RuntimeInfo;
use image_sync::runtime::{LazyRuntime, RuntimeConfig};
use image_sync::sink::{LogSink, Severity};

/// A runtime handle that has not connected yet.
pub fn lazy_runtime(flags: RuntimeConfig, config: Option<RuntimeConfig>) -> LazyRuntime {
    LazyRuntime::new(flags.or(config.unwrap_or_default()))
}

/// Connect now, so detection and connection errors end the command
/// before any image work starts.
pub async fn connect_to_runtime(runtime: &LazyRuntime, output: &Output) -> Result<()> {
    let connected = runtime.get().await?;

    // Version is informational only
    let version = connected
        .version()
        .await
        .unwrap_or_else(|_| "unknown version".to_string());

    output.log(
        Severity::Info,
        &format!(
            "Connected to {} {} at {}",
            connected.runtime_type(),
            version,
            connected.socket_path().unwrap_or("default socket")
        ),
    );

    Ok(())
}
