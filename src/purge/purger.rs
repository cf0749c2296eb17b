// ABOUTME: Removes local images that no running or stopped container uses.
// ABOUTME: Every lookup re-queries the runtime; nothing is cached between calls.

use super::error::PurgeError;
use crate::runtime::{ContainerFilters, ContainerSummary, FullRuntime, ImageError, ImageSummary};
use crate::sink::{LogSink, Severity};
use crate::types::ImageId;
use tracing::debug;

/// Result of purging a single image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeOutcome {
    /// Nothing matched; nothing was done.
    NotFound,
    /// Left in place because these containers use it.
    InUse { containers: Vec<String> },
    /// Removed from the local store.
    Removed,
}

/// Result of a dangling-image purge.
#[derive(Debug, Default)]
pub struct PurgeReport {
    /// Images looked at, tagged ones included.
    pub examined: usize,
    pub removed: Vec<ImageId>,
    pub in_use: Vec<(ImageId, Vec<String>)>,
}

/// Purges images through a runtime, reporting to a sink.
pub struct Purger<'a, R: FullRuntime> {
    runtime: &'a R,
    sink: &'a dyn LogSink,
}

impl<'a, R: FullRuntime> Purger<'a, R> {
    pub fn new(runtime: &'a R, sink: &'a dyn LogSink) -> Self {
        Self { runtime, sink }
    }

    /// Containers, running or stopped, whose image is exactly `image_id`.
    pub async fn containers_using(
        &self,
        image_id: &ImageId,
    ) -> Result<Vec<ContainerSummary>, PurgeError> {
        let containers = self
            .runtime
            .list_containers(&ContainerFilters::all())
            .await?;

        Ok(containers
            .into_iter()
            .filter(|c| &c.image_id == image_id)
            .collect())
    }

    /// Find a local image by a possibly truncated id.
    ///
    /// When several images share the prefix, the last one listed wins.
    pub async fn find_by_id(&self, raw_id: &str) -> Result<Option<ImageSummary>, PurgeError> {
        let prefix = ImageId::normalize(raw_id)?;
        let images = self
            .runtime
            .list_images()
            .await
            .map_err(PurgeError::ListImages)?;

        Ok(images
            .into_iter()
            .filter(|image| image.id.matches_prefix(&prefix))
            .last())
    }

    /// Remove the image called `name` unless a container uses it.
    ///
    /// An unknown name is a silent no-op.
    pub async fn purge_by_name(&self, name: &str) -> Result<PurgeOutcome, PurgeError> {
        let image = match self.runtime.inspect_image(name).await {
            Ok(Some(image)) => image,
            Ok(None) | Err(ImageError::NotFound(_)) => {
                debug!(image = name, "nothing to purge");
                return Ok(PurgeOutcome::NotFound);
            }
            Err(source) => {
                return Err(PurgeError::Lookup {
                    name: name.to_string(),
                    source,
                });
            }
        };

        self.purge_unused(name, &image, name).await
    }

    /// Like [`Purger::purge_by_name`], but looks the image up by id prefix.
    pub async fn purge_by_id(&self, raw_id: &str) -> Result<PurgeOutcome, PurgeError> {
        match self.find_by_id(raw_id).await? {
            Some(image) => {
                let target = image.id.to_string();
                self.purge_unused(&target, &image, image.short_id()).await
            }
            None => {
                debug!(id = raw_id, "nothing to purge");
                Ok(PurgeOutcome::NotFound)
            }
        }
    }

    /// Force-remove every untagged image no container uses.
    ///
    /// Tagged images are never touched. Progress is reported after each
    /// image; the first removal error ends the run.
    pub async fn purge_dangling(&self) -> Result<PurgeReport, PurgeError> {
        let images = self
            .runtime
            .list_images()
            .await
            .map_err(PurgeError::ListImages)?;

        let total = images.len();
        let mut report = PurgeReport::default();

        for (index, image) in images.iter().enumerate() {
            report.examined += 1;

            if image.is_dangling() {
                let users = self.container_names(&image.id).await?;
                if users.is_empty() {
                    self.remove(image.id.as_str(), true).await?;
                    self.sink.log(
                        Severity::Info,
                        &format!("Image \"{}\" is removed", image.short_id()),
                    );
                    report.removed.push(image.id.clone());
                } else {
                    self.report_in_use(image.short_id(), &users);
                    report.in_use.push((image.id.clone(), users));
                }
            }

            self.sink.progress(index + 1, total);
        }

        Ok(report)
    }

    async fn purge_unused(
        &self,
        target: &str,
        image: &ImageSummary,
        label: &str,
    ) -> Result<PurgeOutcome, PurgeError> {
        let users = self.container_names(&image.id).await?;
        if !users.is_empty() {
            self.report_in_use(label, &users);
            return Ok(PurgeOutcome::InUse { containers: users });
        }

        self.remove(target, false).await?;
        let what = if image.tags.is_empty() {
            image.short_id().to_string()
        } else {
            format!("[{}]", image.tags.join(", "))
        };
        self.sink
            .log(Severity::Info, &format!("Image {} is removed", what));

        Ok(PurgeOutcome::Removed)
    }

    async fn container_names(&self, image_id: &ImageId) -> Result<Vec<String>, PurgeError> {
        Ok(self
            .containers_using(image_id)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    async fn remove(&self, target: &str, force: bool) -> Result<(), PurgeError> {
        self.runtime
            .remove_image(target, force)
            .await
            .map_err(|source| PurgeError::RemovalFailure {
                image: target.to_string(),
                source,
            })
    }

    fn report_in_use(&self, label: &str, containers: &[String]) {
        self.sink.log(
            Severity::Warn,
            &format!(
                "Image \"{}\" is in use by: [{}]",
                label,
                containers.join(", ")
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::fake::{Call, FakeRuntime};
    use crate::sink::MemorySink;

    const USED: &str = "sha256:1111111111111111111111111111111111111111111111111111111111111111";
    const FREE: &str = "sha256:2222222222222222222222222222222222222222222222222222222222222222";
    const TAGGED: &str = "sha256:3333333333333333333333333333333333333333333333333333333333333333";
    const TAGGED_USED: &str =
        "sha256:4444444444444444444444444444444444444444444444444444444444444444";

    #[tokio::test]
    async fn name_in_use_is_kept() {
        let runtime = FakeRuntime::new()
            .with_image(USED, &["app:1"])
            .with_container("web", USED)
            .with_container("worker", USED);
        let sink = MemorySink::new();

        let outcome = Purger::new(&runtime, &sink)
            .purge_by_name("app:1")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            PurgeOutcome::InUse {
                containers: vec!["web".to_string(), "worker".to_string()]
            }
        );
        assert!(runtime.removals().is_empty());
        assert_eq!(
            sink.texts(),
            vec!["Image \"app:1\" is in use by: [web, worker]"]
        );
    }

    #[tokio::test]
    async fn unused_name_is_removed_without_force() {
        let runtime = FakeRuntime::new()
            .with_image(FREE, &["app:1", "reg.example.com/team/app:1"])
            .with_container("web", USED);
        let sink = MemorySink::new();

        let outcome = Purger::new(&runtime, &sink)
            .purge_by_name("app:1")
            .await
            .unwrap();

        assert_eq!(outcome, PurgeOutcome::Removed);
        assert_eq!(runtime.removals(), vec![("app:1".to_string(), false)]);
        assert_eq!(
            sink.texts(),
            vec!["Image [app:1, reg.example.com/team/app:1] is removed"]
        );
    }

    #[tokio::test]
    async fn unknown_name_is_a_silent_no_op() {
        let runtime = FakeRuntime::new();
        let sink = MemorySink::new();

        let outcome = Purger::new(&runtime, &sink)
            .purge_by_name("ghost:1")
            .await
            .unwrap();

        assert_eq!(outcome, PurgeOutcome::NotFound);
        assert_eq!(runtime.calls(), vec![Call::Inspect("ghost:1".to_string())]);
        assert!(sink.lines().is_empty());
    }

    #[tokio::test]
    async fn removal_errors_propagate() {
        let runtime = FakeRuntime::new()
            .with_image(FREE, &["app:1"])
            .failing_remove("app:1");
        let sink = MemorySink::new();

        let err = Purger::new(&runtime, &sink)
            .purge_by_name("app:1")
            .await
            .unwrap_err();

        assert!(matches!(err, PurgeError::RemovalFailure { ref image, .. } if image == "app:1"));
        assert!(sink.lines().is_empty());
    }

    #[tokio::test]
    async fn dangling_purge_removes_only_unused_untagged_images() {
        let runtime = FakeRuntime::new()
            .with_image(USED, &[])
            .with_image(FREE, &["<none>:<none>"])
            .with_image(TAGGED, &["app:1"])
            .with_image(TAGGED_USED, &["app:2"])
            .with_container("builder", USED)
            .with_container("web", TAGGED_USED);
        let sink = MemorySink::new();

        let report = Purger::new(&runtime, &sink).purge_dangling().await.unwrap();

        assert_eq!(report.examined, 4);
        assert_eq!(report.removed, vec![ImageId::new(FREE)]);
        assert_eq!(
            report.in_use,
            vec![(ImageId::new(USED), vec!["builder".to_string()])]
        );
        assert_eq!(runtime.removals(), vec![(FREE.to_string(), true)]);

        let remaining: Vec<String> = runtime.images().iter().map(|i| i.id.to_string()).collect();
        assert_eq!(remaining, vec![USED, TAGGED, TAGGED_USED]);

        assert_eq!(
            sink.texts(),
            vec![
                "Image \"sha256:1111111111\" is in use by: [builder]",
                "Image \"sha256:2222222222\" is removed",
            ]
        );
        assert_eq!(
            sink.progress_updates(),
            vec![(1, 4), (2, 4), (3, 4), (4, 4)]
        );
    }

    #[tokio::test]
    async fn listing_errors_are_fatal() {
        let runtime = FakeRuntime::new().failing_lists();
        let sink = MemorySink::new();

        let err = Purger::new(&runtime, &sink).purge_dangling().await.unwrap_err();

        assert!(matches!(err, PurgeError::ListImages(_)));
        assert!(runtime.removals().is_empty());
    }

    #[tokio::test]
    async fn purge_by_id_resolves_prefix() {
        let runtime = FakeRuntime::new().with_image(FREE, &["app:1"]);
        let sink = MemorySink::new();

        let outcome = Purger::new(&runtime, &sink)
            .purge_by_id("222222222222")
            .await
            .unwrap();

        assert_eq!(outcome, PurgeOutcome::Removed);
        assert_eq!(runtime.removals(), vec![(FREE.to_string(), false)]);
    }

    #[tokio::test]
    async fn purge_by_id_rejects_short_ids() {
        let runtime = FakeRuntime::new();
        let sink = MemorySink::new();

        let err = Purger::new(&runtime, &sink)
            .purge_by_id("abc")
            .await
            .unwrap_err();

        assert!(matches!(err, PurgeError::InvalidIdentifier(_)));
        assert!(runtime.calls().is_empty());
    }

    #[tokio::test]
    async fn find_by_id_prefers_last_match() {
        let first = "sha256:aaaaaaaaaaaa0000000000000000000000000000000000000000000000000001";
        let second = "sha256:aaaaaaaaaaaa0000000000000000000000000000000000000000000000000002";
        let runtime = FakeRuntime::new()
            .with_image(first, &["a:1"])
            .with_image(second, &["a:2"]);
        let sink = MemorySink::new();

        let found = Purger::new(&runtime, &sink)
            .find_by_id("aaaaaaaaaaaa")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.id.as_str(), second);
    }
}
