// ABOUTME: In-memory runtime for orchestrator tests.
// ABOUTME: Records every call and fails on demand.

use super::traits::sealed::Sealed;
use super::traits::{
    ContainerError, ContainerFilters, ContainerOps, ContainerSummary, ImageError, ImageOps,
    ImageSummary, RegistryAuth,
};
use crate::types::{ContainerId, ImageId, StatusRecord};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Pull(String),
    Inspect(String),
    Tag(String, String),
    Push(String),
    ListImages,
    ListContainers,
    Remove(String, bool),
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum PullFailure {
    NotFound,
    InvalidTag,
    Other,
}

#[derive(Default)]
struct State {
    images: Vec<ImageSummary>,
    containers: Vec<ContainerSummary>,
    pull_failures: HashMap<String, PullFailure>,
    tag_failures: Vec<String>,
    tag_refusals: Vec<String>,
    pull_stores: bool,
    push_failures: Vec<String>,
    remove_failures: Vec<String>,
    list_fails: bool,
    calls: Vec<Call>,
    credentials: Vec<(String, Option<String>)>,
    next_id: u32,
}

pub(crate) struct FakeRuntime {
    state: Mutex<State>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                pull_stores: true,
                ..State::default()
            }),
        }
    }

    pub fn with_image(self, id: &str, tags: &[&str]) -> Self {
        self.state.lock().images.push(ImageSummary::new(
            id,
            tags.iter().map(|t| t.to_string()).collect(),
        ));
        self
    }

    pub fn with_container(self, name: &str, image_id: &str) -> Self {
        self.state.lock().containers.push(ContainerSummary {
            id: ContainerId::new(format!("c-{name}")),
            name: name.to_string(),
            image_id: ImageId::new(image_id),
            state: "exited".to_string(),
        });
        self
    }

    /// Fail pulls of `repo:tag`.
    pub fn failing_pull(self, name: &str, failure: PullFailure) -> Self {
        self.state
            .lock()
            .pull_failures
            .insert(name.to_string(), failure);
        self
    }

    /// Fail tagging towards `target`.
    pub fn failing_tag(self, target: &str) -> Self {
        self.state.lock().tag_failures.push(target.to_string());
        self
    }

    /// Answer `Ok(false)` when tagging towards `target`.
    pub fn refusing_tag(self, target: &str) -> Self {
        self.state.lock().tag_refusals.push(target.to_string());
        self
    }

    /// Pulls succeed but leave nothing in the local store.
    pub fn pull_without_store(self) -> Self {
        self.state.lock().pull_stores = false;
        self
    }

    /// Fail pushes of `repo:tag`.
    pub fn failing_push(self, name: &str) -> Self {
        self.state.lock().push_failures.push(name.to_string());
        self
    }

    /// Fail removal of the given name or id.
    pub fn failing_remove(self, name_or_id: &str) -> Self {
        self.state.lock().remove_failures.push(name_or_id.to_string());
        self
    }

    /// Fail every listing call.
    pub fn failing_lists(self) -> Self {
        self.state.lock().list_fails = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Username sent with each pull and push, in call order.
    pub fn credentials(&self) -> Vec<(String, Option<String>)> {
        self.state.lock().credentials.clone()
    }

    pub fn images(&self) -> Vec<ImageSummary> {
        self.state.lock().images.clone()
    }

    pub fn removals(&self) -> Vec<(String, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Remove(name, force) => Some((name, force)),
                _ => None,
            })
            .collect()
    }
}

fn find<'a>(images: &'a mut [ImageSummary], name: &str) -> Option<&'a mut ImageSummary> {
    images
        .iter_mut()
        .find(|i| i.id.as_str() == name || i.tags.iter().any(|t| t == name))
}

impl Sealed for FakeRuntime {}

#[async_trait]
impl ImageOps for FakeRuntime {
    async fn pull_image(
        &self,
        repository: &str,
        tag: &str,
        auth: Option<&RegistryAuth>,
    ) -> Result<(), ImageError> {
        let name = format!("{repository}:{tag}");
        let mut state = self.state.lock();
        state.calls.push(Call::Pull(name.clone()));
        state
            .credentials
            .push((name.clone(), auth.map(|a| a.username.clone())));

        match state.pull_failures.get(&name) {
            Some(PullFailure::NotFound) => return Err(ImageError::NotFound(name)),
            Some(PullFailure::InvalidTag) => return Err(ImageError::InvalidTag(name)),
            Some(PullFailure::Other) => return Err(ImageError::PullFailed(name)),
            None => {}
        }

        if state.pull_stores && find(&mut state.images, &name).is_none() {
            state.next_id += 1;
            let id = format!("sha256:{:064x}", state.next_id);
            state.images.push(ImageSummary::new(id, vec![name]));
        }
        Ok(())
    }

    async fn inspect_image(&self, name: &str) -> Result<Option<ImageSummary>, ImageError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Inspect(name.to_string()));
        Ok(find(&mut state.images, name).map(|i| i.clone()))
    }

    async fn tag_image(&self, image: &ImageSummary, target: &str) -> Result<bool, ImageError> {
        let mut state = self.state.lock();
        state
            .calls
            .push(Call::Tag(image.id.to_string(), target.to_string()));

        if state.tag_failures.iter().any(|t| t == target) {
            return Err(ImageError::TagFailed(target.to_string()));
        }
        if state.tag_refusals.iter().any(|t| t == target) {
            return Ok(false);
        }

        match find(&mut state.images, image.id.as_str()) {
            Some(found) => {
                found.tags.push(target.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn push_image(
        &self,
        repository: &str,
        tag: &str,
        auth: Option<&RegistryAuth>,
    ) -> Result<Vec<StatusRecord>, ImageError> {
        let name = format!("{repository}:{tag}");
        let mut state = self.state.lock();
        state.calls.push(Call::Push(name.clone()));
        state
            .credentials
            .push((name.clone(), auth.map(|a| a.username.clone())));

        if state.push_failures.contains(&name) {
            return Err(ImageError::PushFailed(name));
        }

        Ok(vec![
            StatusRecord::new().with(
                "status",
                format!("The push refers to repository [{repository}]"),
            ),
            StatusRecord::new().with(
                "aux",
                serde_json::json!({"Tag": tag, "Digest": "sha256:feed", "Size": 1}),
            ),
        ])
    }

    async fn list_images(&self) -> Result<Vec<ImageSummary>, ImageError> {
        let mut state = self.state.lock();
        state.calls.push(Call::ListImages);
        if state.list_fails {
            return Err(ImageError::Runtime("daemon unavailable".to_string()));
        }
        Ok(state.images.clone())
    }

    async fn remove_image(&self, name_or_id: &str, force: bool) -> Result<(), ImageError> {
        let mut state = self.state.lock();
        state
            .calls
            .push(Call::Remove(name_or_id.to_string(), force));

        if state.remove_failures.iter().any(|n| n == name_or_id) {
            return Err(ImageError::InUse(name_or_id.to_string()));
        }

        let before = state.images.len();
        state
            .images
            .retain(|i| i.id.as_str() != name_or_id && !i.tags.iter().any(|t| t == name_or_id));
        if state.images.len() == before {
            return Err(ImageError::NotFound(name_or_id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ContainerOps for FakeRuntime {
    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let mut state = self.state.lock();
        state.calls.push(Call::ListContainers);
        if state.list_fails {
            return Err(ContainerError::Runtime("daemon unavailable".to_string()));
        }
        Ok(state
            .containers
            .iter()
            .filter(|c| filters.all || c.state == "running")
            .cloned()
            .collect())
    }
}
