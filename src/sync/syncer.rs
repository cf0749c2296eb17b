// ABOUTME: Pull -> tag -> push orchestration for one image or a whole batch.
// ABOUTME: Each stage is guarded; a failure ends its entry and the batch moves on.

use super::dry_run::simulated_push;
use super::error::SyncError;
use crate::runtime::ImageOps;
use crate::runtime::traits::RegistryAuth;
use crate::sink::{LogSink, Severity};
use crate::types::{ImageReference, ImageSpec, RegistryContext, StatusRecord};
use std::time::Duration;
use tracing::{debug, warn};

/// Knobs for a sync run.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Simulate every stage instead of calling the runtime.
    pub dry_run: bool,
    /// Pause before each simulated stage.
    pub dry_run_delay: Duration,
    /// Sent with pulls and pushes against the registry it belongs to.
    pub auth: Option<RegistryAuth>,
}

/// Outcome of a batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Destination names of the entries that went through all stages.
    pub synced: Vec<String>,
    /// Specs that were abandoned, with the reason.
    pub failed: Vec<(String, SyncError)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.synced.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs the sync pipeline against a runtime, reporting to a sink.
pub struct Syncer<'a, R: ImageOps> {
    runtime: &'a R,
    sink: &'a dyn LogSink,
    options: SyncOptions,
}

impl<'a, R: ImageOps> Syncer<'a, R> {
    pub fn new(runtime: &'a R, sink: &'a dyn LogSink) -> Self {
        Self {
            runtime,
            sink,
            options: SyncOptions::default(),
        }
    }

    pub fn options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve and sync every spec in order.
    ///
    /// Never fails as a whole: unresolvable specs and failed stages are
    /// logged, recorded in the report, and the next entry runs.
    pub async fn sync_batch<S: AsRef<str>>(
        &self,
        specs: &[S],
        context: &RegistryContext,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let total = specs.len();

        for (index, spec) in specs.iter().enumerate() {
            let spec = spec.as_ref().trim();
            self.sink.section(spec);

            let result = match ImageSpec::parse(spec) {
                Ok(parsed) => {
                    let reference = ImageReference::resolve(&parsed, context)
                        .with_dry_run(self.options.dry_run);
                    self.sync(&reference).await.map(|_| reference.dest_name())
                }
                Err(e) => {
                    let err = SyncError::from(e);
                    self.sink
                        .log(Severity::Warn, &format!("Invalid Image Spec: {}", err));
                    warn!(spec, error = %err, "skipping entry");
                    Err(err)
                }
            };

            match result {
                Ok(dest) => report.synced.push(dest),
                Err(err) => report.failed.push((spec.to_string(), err)),
            }
            self.sink.progress(index + 1, total);
        }

        report
    }

    /// Pull, tag and push one image.
    ///
    /// Logs one line per stage started and exactly one line on failure;
    /// the returned error has already been reported.
    pub async fn sync(&self, reference: &ImageReference) -> Result<Vec<StatusRecord>, SyncError> {
        let result = self.run_stages(reference).await;
        if let Err(ref err) = result {
            self.sink.log(Severity::Warn, &failure_line(err));
            warn!(image = %reference, stage = ?err.stage(), error = %err, "entry aborted");
        }
        result
    }

    async fn run_stages(&self, reference: &ImageReference) -> Result<Vec<StatusRecord>, SyncError> {
        self.pull(reference).await?;
        self.tag(reference).await?;
        let records = self.push(reference).await?;
        self.sink.push_result(reference, &records);
        Ok(records)
    }

    async fn pull(&self, reference: &ImageReference) -> Result<(), SyncError> {
        self.sink.log(
            Severity::Info,
            &format!("Image Pull >>> {}", reference.source_name()),
        );

        if reference.is_dry_run() {
            self.simulate_latency().await;
            return Ok(());
        }

        let repository = reference.source_repo();
        self.runtime
            .pull_image(&repository, reference.tag(), self.auth_for(&repository))
            .await
            .map_err(|e| SyncError::from_pull(e, reference.tag()))
    }

    async fn tag(&self, reference: &ImageReference) -> Result<(), SyncError> {
        let source = reference.source_name();
        let dest = reference.dest_name();
        self.sink.log(
            Severity::Info,
            &format!("Image Tag  >>> {} => {}", source, dest),
        );

        if reference.is_dry_run() {
            self.simulate_latency().await;
            return Ok(());
        }

        let image = self
            .runtime
            .inspect_image(&source)
            .await
            .map_err(|e| SyncError::TagFailure(e.to_string()))?
            .ok_or_else(|| SyncError::TagFailure(format!("{} is not present locally", source)))?;

        debug!(image = %image.id, %dest, "retagging");
        match self.runtime.tag_image(&image, &dest).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(SyncError::TagFailure(format!(
                "runtime refused to tag {} as {}",
                source, dest
            ))),
            Err(e) => Err(SyncError::TagFailure(e.to_string())),
        }
    }

    async fn push(&self, reference: &ImageReference) -> Result<Vec<StatusRecord>, SyncError> {
        self.sink.log(
            Severity::Info,
            &format!("Image Push >>> {}", reference.dest_name()),
        );

        if reference.is_dry_run() {
            self.simulate_latency().await;
            return Ok(simulated_push(reference));
        }

        let repository = reference.dest_repo();
        self.runtime
            .push_image(&repository, reference.tag(), self.auth_for(&repository))
            .await
            .map_err(|e| SyncError::PushFailure(e.to_string()))
    }

    fn auth_for(&self, repository: &str) -> Option<&RegistryAuth> {
        self.options
            .auth
            .as_ref()
            .filter(|auth| auth.applies_to(repository))
    }

    async fn simulate_latency(&self) {
        if !self.options.dry_run_delay.is_zero() {
            tokio::time::sleep(self.options.dry_run_delay).await;
        }
    }
}

fn failure_line(err: &SyncError) -> String {
    match err {
        SyncError::InvalidReference(e) => format!("Invalid Image Spec: {}", e),
        SyncError::ImageNotFound(_) => "Image Not Found.".to_string(),
        SyncError::InvalidTag(tag) => format!("Invalid Tag <{}>", tag),
        SyncError::PullFailure(e) => format!("Image Pull Failed: {}", e),
        SyncError::TagFailure(_) => "Image Tag Failed.".to_string(),
        SyncError::PushFailure(e) => format!("Image Push Failed: {}", e),
    }
}
