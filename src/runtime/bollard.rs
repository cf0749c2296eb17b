// ABOUTME: Bollard-based container runtime implementation.
// ABOUTME: Docker-compatible API for both runtimes, raw push streams, libpod for Podman.

use crate::runtime::traits::sealed::Sealed;
use crate::runtime::traits::{
    ContainerError, ContainerFilters, ContainerOps, ContainerSummary, ImageError, ImageOps,
    ImageSummary, RegistryAuth, RuntimeInfo, RuntimeInfoError,
};
use crate::runtime::types::{RuntimeInfo as DetectedRuntime, RuntimeType};
use crate::types::{ContainerId, ImageId, StatusRecord, parse_status_stream};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bollard::Docker;
use bollard::auth::DockerCredentials;
use bollard::query_parameters::{
    CreateImageOptions, ListContainersOptions, ListImagesOptions, RemoveImageOptions,
    TagImageOptionsBuilder,
};
use futures::StreamExt;
use http_body_util::BodyExt;
use hyper_util::rt::TokioIo;
use tokio::net::UnixStream;
use tracing::debug;

/// Request timeout for the Docker client. Pushes of large layers are slow.
const CLIENT_TIMEOUT_SECS: u64 = 600;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

/// Classify a pull failure message into not-found, bad tag, auth or other.
fn classify_pull_message(image_name: &str, message: &str) -> ImageError {
    let lower = message.to_lowercase();
    if lower.contains("manifest unknown")
        || lower.contains("manifest for")
        || lower.contains("tag not found")
    {
        ImageError::InvalidTag(format!("{}: {}", image_name, message))
    } else if lower.contains("not found")
        || lower.contains("does not exist")
        || lower.contains("name unknown")
        || lower.contains("no such image")
    {
        ImageError::NotFound(format!("{}: {}", image_name, message))
    } else if lower.contains("unauthorized") || lower.contains("authentication required") {
        ImageError::AuthenticationFailed(format!("{}: {}", image_name, message))
    } else {
        ImageError::PullFailed(format!("{}: {}", image_name, message))
    }
}

fn map_image_pull_error(e: bollard::errors::Error, image_name: &str) -> ImageError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 401 => ImageError::AuthenticationFailed(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => classify_pull_message(image_name, message),
        bollard::errors::Error::DockerStreamError { error } => {
            classify_pull_message(image_name, error)
        }
        _ => ImageError::PullFailed(format!("{}: {}", image_name, e)),
    }
}

fn map_image_tag_error(e: bollard::errors::Error, target: &str) -> ImageError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ImageError::NotFound(message.clone()),
        _ => ImageError::TagFailed(format!("{}: {}", target, e)),
    }
}

fn map_image_remove_error(e: bollard::errors::Error, image_name: &str) -> ImageError {
    match &e {
        bollard::errors::Error::DockerResponseServerError { status_code, .. }
            if *status_code == 404 =>
        {
            ImageError::NotFound(image_name.to_string())
        }
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 409 => ImageError::InUse(format!("{}: {}", image_name, message)),
        _ => ImageError::Runtime(format!("failed to remove {}: {}", image_name, e)),
    }
}

/// First error reported inside a progress stream, if any.
fn stream_error(records: &[StatusRecord]) -> Option<&str> {
    records.iter().find_map(StatusRecord::error)
}

fn is_auth_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("unauthorized")
        || lower.contains("authentication required")
        || lower.contains("no basic auth credentials")
        || lower.contains("denied")
}

/// `message` field of a daemon error body, or the trimmed body itself.
fn error_body_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Turn a raw push response into its status records.
///
/// Records are kept exactly as the registry sent them, so layer `id`s and
/// the closing `aux` digest survive.
fn push_records(
    status: u16,
    body: &str,
    image_name: &str,
) -> Result<Vec<StatusRecord>, ImageError> {
    match status {
        200..=299 => {}
        404 => return Err(ImageError::NotFound(image_name.to_string())),
        401 | 403 => return Err(ImageError::AuthenticationFailed(image_name.to_string())),
        _ => {
            return Err(ImageError::PushFailed(format!(
                "{}: {}",
                image_name,
                error_body_message(body)
            )));
        }
    }

    let records = parse_status_stream(body).map_err(|e| {
        ImageError::PushFailed(format!("{}: bad progress stream: {}", image_name, e))
    })?;
    if let Some(error) = stream_error(&records) {
        let message = format!("{}: {}", image_name, error);
        return Err(if is_auth_message(error) {
            ImageError::AuthenticationFailed(message)
        } else {
            ImageError::PushFailed(message)
        });
    }

    Ok(records)
}

fn docker_credentials(auth: &RegistryAuth) -> DockerCredentials {
    DockerCredentials {
        username: Some(auth.username.clone()),
        password: Some(auth.password.clone()),
        serveraddress: auth.server.clone(),
        ..Default::default()
    }
}

/// `X-Registry-Auth` value: base64 JSON credentials, `{}` when anonymous.
fn registry_auth_header(auth: Option<&RegistryAuth>) -> String {
    let json = auth
        .and_then(|a| serde_json::to_string(&docker_credentials(a)).ok())
        .unwrap_or_else(|| "{}".to_string());
    STANDARD.encode(json)
}

// =============================================================================
// BollardRuntime
// =============================================================================

/// Container runtime implementation using bollard.
///
/// Supports both Docker and Podman via Docker-compatible API.
/// For Podman, pull and push use the native libpod API so that plain-HTTP
/// private registries work without daemon configuration. Pushes on either
/// runtime read the raw response body, since bollard's typed push stream
/// drops the `id` and `aux` fields.
pub struct BollardRuntime {
    client: Docker,
    runtime_type: RuntimeType,
    socket_path: Option<String>,
}

impl BollardRuntime {
    /// Create a new BollardRuntime with socket path for libpod API access.
    pub fn new_with_socket(client: Docker, runtime_type: RuntimeType, socket_path: String) -> Self {
        Self {
            client,
            runtime_type,
            socket_path: Some(socket_path),
        }
    }

    /// Connect to a container runtime using detected runtime info.
    pub fn connect(info: &DetectedRuntime) -> Result<Self, RuntimeInfoError> {
        let client = Docker::connect_with_unix(
            &info.socket_path,
            CLIENT_TIMEOUT_SECS,
            bollard::API_DEFAULT_VERSION,
        )
        .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
        Ok(Self::new_with_socket(
            client,
            info.runtime_type,
            info.socket_path.clone(),
        ))
    }

    /// Get the runtime type (Docker or Podman).
    pub fn runtime_type(&self) -> RuntimeType {
        self.runtime_type
    }

    pub fn socket_path(&self) -> Option<&str> {
        self.socket_path.as_deref()
    }

    fn uses_libpod(&self) -> bool {
        self.runtime_type == RuntimeType::Podman && self.socket_path.is_some()
    }

    /// POST straight to the daemon socket and return the status code and raw body.
    async fn raw_post(
        &self,
        uri: &str,
        registry_auth: Option<String>,
    ) -> Result<(u16, String), String> {
        let socket_path = self
            .socket_path
            .as_ref()
            .ok_or_else(|| "socket path not available for raw API access".to_string())?;

        let stream = UnixStream::connect(socket_path)
            .await
            .map_err(|e| format!("failed to connect to socket: {}", e))?;

        let io = TokioIo::new(stream);

        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| format!("HTTP handshake failed: {}", e))?;

        // Drive the connection until the response body is read
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::warn!("daemon connection error: {}", e);
            }
        });

        let mut builder = hyper::Request::builder()
            .method("POST")
            .uri(uri)
            .header("Host", "localhost");
        if let Some(value) = registry_auth {
            builder = builder.header("X-Registry-Auth", value);
        }
        let req = builder
            .body(http_body_util::Empty::<bytes::Bytes>::new())
            .map_err(|e| format!("failed to build request: {}", e))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = resp.status().as_u16();
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| format!("failed to read response: {}", e))?;
        let body_bytes = body.to_bytes();

        Ok((status, String::from_utf8_lossy(&body_bytes).into_owned()))
    }

    /// Pull image using Podman's native libpod API with tlsVerify=false.
    async fn pull_image_libpod(
        &self,
        image_name: &str,
        auth: Option<&RegistryAuth>,
    ) -> Result<(), ImageError> {
        let uri = format!(
            "/v4.0.0/libpod/images/pull?reference={}&tlsVerify=false",
            urlencoding::encode(image_name)
        );

        let (status, body) = self
            .raw_post(&uri, auth.map(|a| registry_auth_header(Some(a))))
            .await
            .map_err(|e| ImageError::PullFailed(format!("{}: {}", image_name, e)))?;

        match status {
            200..=299 => {}
            401 | 403 => return Err(ImageError::AuthenticationFailed(image_name.to_string())),
            _ => return Err(classify_pull_message(image_name, &body)),
        }

        let records = parse_status_stream(&body).map_err(|e| {
            ImageError::PullFailed(format!("{}: bad progress stream: {}", image_name, e))
        })?;
        if let Some(error) = stream_error(&records) {
            return Err(classify_pull_message(image_name, error));
        }

        Ok(())
    }

    /// Push image using Podman's native libpod API with tlsVerify=false.
    async fn push_image_libpod(
        &self,
        image_name: &str,
        auth: Option<&RegistryAuth>,
    ) -> Result<Vec<StatusRecord>, ImageError> {
        let uri = format!(
            "/v4.0.0/libpod/images/{}/push?destination={}&tlsVerify=false",
            image_name,
            urlencoding::encode(image_name)
        );

        let (status, body) = self
            .raw_post(&uri, auth.map(|a| registry_auth_header(Some(a))))
            .await
            .map_err(|e| ImageError::PushFailed(format!("{}: {}", image_name, e)))?;

        push_records(status, &body, image_name)
    }

    /// Push image through the Docker API, keeping the raw progress stream.
    async fn push_image_docker(
        &self,
        repository: &str,
        tag: &str,
        auth: Option<&RegistryAuth>,
    ) -> Result<Vec<StatusRecord>, ImageError> {
        let image_name = format!("{}:{}", repository, tag);
        let uri = format!("/images/{}/push?tag={}", repository, urlencoding::encode(tag));

        // The daemon rejects pushes without the header, so anonymous sends `{}`
        let (status, body) = self
            .raw_post(&uri, Some(registry_auth_header(auth)))
            .await
            .map_err(|e| ImageError::PushFailed(format!("{}: {}", image_name, e)))?;

        push_records(status, &body, &image_name)
    }
}

impl Sealed for BollardRuntime {}

#[async_trait]
impl RuntimeInfo for BollardRuntime {
    async fn ping(&self) -> Result<(), RuntimeInfoError> {
        self.client
            .ping()
            .await
            .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
        Ok(())
    }

    async fn version(&self) -> Result<String, RuntimeInfoError> {
        let version = self
            .client
            .version()
            .await
            .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;

        version.version.ok_or_else(|| {
            RuntimeInfoError::UnexpectedResponse("no version reported".to_string())
        })
    }
}

#[async_trait]
impl ImageOps for BollardRuntime {
    async fn pull_image(
        &self,
        repository: &str,
        tag: &str,
        auth: Option<&RegistryAuth>,
    ) -> Result<(), ImageError> {
        let image_name = format!("{}:{}", repository, tag);
        debug!(
            image = %image_name,
            runtime = %self.runtime_type,
            authenticated = auth.is_some(),
            "pulling image"
        );

        if self.uses_libpod() {
            return self.pull_image_libpod(&image_name, auth).await;
        }

        let opts = CreateImageOptions {
            from_image: Some(repository.to_string()),
            tag: Some(tag.to_string()),
            ..Default::default()
        };

        // Pull returns a stream of progress updates - consume it
        let credentials = auth.map(docker_credentials);
        let mut stream = self.client.create_image(Some(opts), None, credentials);
        while let Some(result) = stream.next().await {
            result.map_err(|e| map_image_pull_error(e, &image_name))?;
        }

        Ok(())
    }

    async fn inspect_image(&self, name: &str) -> Result<Option<ImageSummary>, ImageError> {
        match self.client.inspect_image(name).await {
            Ok(image) => Ok(Some(ImageSummary::new(
                image.id.unwrap_or_default(),
                image.repo_tags.unwrap_or_default(),
            ))),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(None),
            Err(e) => Err(ImageError::Runtime(format!(
                "failed to inspect {}: {}",
                name, e
            ))),
        }
    }

    async fn tag_image(&self, image: &ImageSummary, target: &str) -> Result<bool, ImageError> {
        // Split "repo:tag" on the last colon that is not part of a registry port
        let (repo, tag) = match target.rsplit_once(':') {
            Some((repo, tag)) if !tag.contains('/') => (repo, tag),
            _ => (target, crate::types::DEFAULT_TAG),
        };
        debug!(image = %image.id, target, "tagging image");

        let opts = TagImageOptionsBuilder::default().repo(repo).tag(tag).build();
        self.client
            .tag_image(image.id.as_str(), Some(opts))
            .await
            .map_err(|e| map_image_tag_error(e, target))?;

        Ok(true)
    }

    async fn push_image(
        &self,
        repository: &str,
        tag: &str,
        auth: Option<&RegistryAuth>,
    ) -> Result<Vec<StatusRecord>, ImageError> {
        let image_name = format!("{}:{}", repository, tag);
        debug!(
            image = %image_name,
            runtime = %self.runtime_type,
            authenticated = auth.is_some(),
            "pushing image"
        );

        if self.uses_libpod() {
            return self.push_image_libpod(&image_name, auth).await;
        }

        self.push_image_docker(repository, tag, auth).await
    }

    async fn list_images(&self) -> Result<Vec<ImageSummary>, ImageError> {
        let images = self
            .client
            .list_images(None::<ListImagesOptions>)
            .await
            .map_err(|e| ImageError::Runtime(format!("failed to list images: {}", e)))?;

        Ok(images
            .into_iter()
            .map(|image| ImageSummary::new(image.id, image.repo_tags))
            .collect())
    }

    async fn remove_image(&self, name_or_id: &str, force: bool) -> Result<(), ImageError> {
        debug!(image = %name_or_id, force, "removing image");

        let opts = RemoveImageOptions {
            force,
            ..Default::default()
        };

        self.client
            .remove_image(name_or_id, Some(opts), None)
            .await
            .map_err(|e| map_image_remove_error(e, name_or_id))?;

        Ok(())
    }
}

#[async_trait]
impl ContainerOps for BollardRuntime {
    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let opts = ListContainersOptions {
            all: filters.all,
            ..Default::default()
        };

        let containers = self
            .client
            .list_containers(Some(opts))
            .await
            .map_err(|e| ContainerError::Runtime(e.to_string()))?;

        Ok(containers
            .into_iter()
            .map(|c| {
                let name = c
                    .names
                    .unwrap_or_default()
                    .first()
                    .map(|n| n.trim_start_matches('/').to_string())
                    .unwrap_or_default();

                let state = c
                    .state
                    .map(|s| format!("{:?}", s).to_lowercase())
                    .unwrap_or_default();

                ContainerSummary {
                    id: ContainerId::new(c.id.unwrap_or_default()),
                    name,
                    image_id: ImageId::new(c.image_id.unwrap_or_default()),
                    state,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_manifest_is_invalid_tag() {
        let err = classify_pull_message(
            "nginx:nope",
            "manifest for nginx:nope not found: manifest unknown: manifest unknown",
        );
        assert!(matches!(err, ImageError::InvalidTag(_)));
    }

    #[test]
    fn missing_repository_is_not_found() {
        let err = classify_pull_message(
            "nosuch/app:1",
            "pull access denied for nosuch/app, repository does not exist or may require 'docker login'",
        );
        assert!(matches!(err, ImageError::NotFound(_)));
    }

    #[test]
    fn other_messages_are_pull_failures() {
        let err = classify_pull_message("app:1", "connection reset by peer");
        assert!(matches!(err, ImageError::PullFailed(_)));
    }

    const DOCKER_PUSH_BODY: &str = concat!(
        r#"{"status":"The push refers to repository [reg.example.com/team/app]"}"#,
        "\n",
        r#"{"status":"Preparing","progressDetail":{},"id":"5f70bf18a086"}"#,
        "\n",
        r#"{"status":"Layer already exists","progressDetail":{},"id":"5f70bf18a086"}"#,
        "\n",
        r#"{"status":"1.0: digest: sha256:feed size: 528"}"#,
        "\n",
        r#"{"progressDetail":{},"aux":{"Tag":"1.0","Digest":"sha256:feed","Size":528}}"#,
        "\n",
    );

    #[test]
    fn push_records_keep_layer_ids_and_digest() {
        let records =
            push_records(200, DOCKER_PUSH_BODY, "reg.example.com/team/app:1.0").unwrap();

        assert_eq!(records.len(), 5);
        assert_eq!(records[2].status(), Some("Layer already exists"));
        assert_eq!(
            records[2].get("id").and_then(|v| v.as_str()),
            Some("5f70bf18a086")
        );
        let last = records.last().unwrap();
        assert_eq!(last.digest(), Some("sha256:feed"));
        assert_eq!(
            last.get("aux").and_then(|aux| aux.get("Size")),
            Some(&serde_json::json!(528))
        );
    }

    #[test]
    fn push_stream_errors_fail_the_push() {
        let body = concat!(
            r#"{"status":"Preparing","progressDetail":{},"id":"5f70bf18a086"}"#,
            r#"{"errorDetail":{"message":"no basic auth credentials"},"error":"no basic auth credentials"}"#,
        );
        let err = push_records(200, body, "reg.example.com/app:1").unwrap_err();
        assert!(
            matches!(err, ImageError::AuthenticationFailed(msg) if msg.contains("no basic auth"))
        );

        let body = r#"{"error":"blob upload invalid"}"#;
        let err = push_records(200, body, "reg.example.com/app:1").unwrap_err();
        assert!(matches!(err, ImageError::PushFailed(_)));
    }

    #[test]
    fn push_http_errors_use_the_daemon_message() {
        let err = push_records(
            500,
            r#"{"message":"An image does not exist locally with the tag: app"}"#,
            "app:1",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ImageError::PushFailed(msg)
                if msg == "app:1: An image does not exist locally with the tag: app"
        ));
        assert!(matches!(
            push_records(404, "", "app:1"),
            Err(ImageError::NotFound(_))
        ));
    }

    #[test]
    fn anonymous_auth_header_is_an_empty_object() {
        assert_eq!(registry_auth_header(None), "e30=");
    }

    #[test]
    fn auth_header_carries_credentials_and_server() {
        let auth = RegistryAuth::new("ci", "s3cret").server("reg.example.com");
        let decoded = STANDARD.decode(registry_auth_header(Some(&auth))).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&decoded).unwrap();

        assert_eq!(json["username"], "ci");
        assert_eq!(json["password"], "s3cret");
        assert_eq!(json["serveraddress"], "reg.example.com");
    }

    #[test]
    fn stream_errors_are_detected() {
        let records = parse_status_stream(
            r#"{"stream":"Getting image source signatures\n"}{"error":"name unknown"}"#,
        )
        .unwrap();
        assert_eq!(stream_error(&records), Some("name unknown"));
    }
}
