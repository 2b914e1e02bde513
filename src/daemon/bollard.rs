// ABOUTME: Bollard-based container daemon implementation.
// ABOUTME: Talks to the local daemon directly and to the remote one over a forwarded socket.

use super::archive::pack_context;
use super::auth::RegistryAuth;
use super::error::DaemonError;
use super::traits::{
    BuildContext, ContainerDaemon, ContainerSpec, ContainerSummary, CreatedContainer,
};
use crate::progress::{ProgressError, ProgressRecord, ProgressStream};
use crate::ssh::Session;
use crate::types::{ContainerId, ContainerName, ImageId, ImageRef};
use async_trait::async_trait;
use bollard::Docker;
use bollard::models::{ContainerCreateBody, EndpointSettings, HostConfig, PortBinding};
use bollard::query_parameters::{
    BuildImageOptions, CreateContainerOptions, CreateImageOptions, ListContainersOptions,
    PushImageOptions, RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
    TagImageOptions,
};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use http_body_util::{Either, Full};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Daemon socket path on the remote host unless configured otherwise.
pub const REMOTE_DOCKER_SOCKET: &str = "/var/run/docker.sock";

// Builds and pulls of large images run far longer than the usual API call.
const REQUEST_TIMEOUT_SECS: u64 = 3600;

// =============================================================================
// Stream Mapping Helpers
// =============================================================================

/// Re-read a typed bollard progress item as a [`ProgressRecord`].
///
/// The typed models serialize back to the daemon's wire names, so this keeps
/// the record shape in one place.
fn to_record<T: Serialize>(info: &T) -> Result<ProgressRecord, ProgressError> {
    let value = serde_json::to_value(info)?;
    Ok(serde_json::from_value(value)?)
}

/// Turn a bollard progress stream into a record stream.
///
/// Errors the daemon reported in-band become error records so the decoder
/// stops on them like any other; anything else is a transport failure.
fn into_records<S, T>(stream: S) -> ProgressStream
where
    S: Stream<Item = Result<T, bollard::errors::Error>> + Send + 'static,
    T: Serialize,
{
    Box::pin(stream.map(|item| match item {
        Ok(info) => to_record(&info),
        Err(bollard::errors::Error::DockerStreamError { error }) => {
            Ok(ProgressRecord::failure(error))
        }
        Err(bollard::errors::Error::DockerResponseServerError { message, .. }) => {
            Ok(ProgressRecord::failure(message))
        }
        Err(e) => Err(ProgressError::Transport(e.to_string())),
    }))
}

fn connection_error(e: impl std::fmt::Display) -> DaemonError {
    DaemonError::Connection(e.to_string())
}

// =============================================================================
// BollardDaemon
// =============================================================================

/// Container daemon reached through bollard's Docker API client.
#[derive(Debug, Clone)]
pub struct BollardDaemon {
    client: Docker,
}

impl BollardDaemon {
    pub fn new(client: Docker) -> Self {
        Self { client }
    }

    /// Connect to the local daemon.
    ///
    /// With no socket the usual local defaults apply, including `DOCKER_HOST`.
    pub fn connect_local(socket: Option<&Path>) -> Result<Self, DaemonError> {
        let client = match socket {
            Some(path) => Docker::connect_with_unix(
                &path.to_string_lossy(),
                REQUEST_TIMEOUT_SECS,
                bollard::API_DEFAULT_VERSION,
            ),
            None => Docker::connect_with_local_defaults()
                .map(|docker| docker.with_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))),
        }
        .map_err(connection_error)?;

        Ok(Self::new(client))
    }

    /// Connect to the daemon on the far side of `session`.
    ///
    /// The remote socket is forwarded to a private local socket that lives as
    /// long as the session.
    pub async fn connect_remote(session: &Session, remote_socket: &str) -> Result<Self, DaemonError> {
        let local_socket = session
            .forward_socket(remote_socket)
            .await
            .map_err(connection_error)?;

        tracing::debug!(remote = %remote_socket, local = ?local_socket, "forwarded daemon socket");

        let client = Docker::connect_with_unix(
            &local_socket.to_string_lossy(),
            REQUEST_TIMEOUT_SECS,
            bollard::API_DEFAULT_VERSION,
        )
        .map_err(connection_error)?;

        Ok(Self::new(client))
    }
}

#[async_trait]
impl ContainerDaemon for BollardDaemon {
    async fn build_image(&self, context: &BuildContext) -> Result<ProgressStream, DaemonError> {
        let dir = context.dir.clone();
        let archive = tokio::task::spawn_blocking(move || pack_context(&dir))
            .await
            .map_err(|e| DaemonError::Api(format!("context packing task failed: {}", e)))??;

        tracing::debug!(
            context = ?context.dir,
            dockerfile = %context.dockerfile,
            bytes = archive.len(),
            "submitting build context"
        );

        let opts = BuildImageOptions {
            dockerfile: context.dockerfile.clone(),
            rm: true,
            ..Default::default()
        };
        let body = Either::Left(Full::new(Bytes::from(archive)));

        Ok(into_records(self.client.build_image(opts, None, Some(body))))
    }

    async fn tag_image(&self, image: &ImageId, reference: &ImageRef) -> Result<(), DaemonError> {
        let opts = TagImageOptions {
            repo: Some(reference.repository()),
            tag: reference.tag().map(str::to_string),
            ..Default::default()
        };

        self.client
            .tag_image(image.as_str(), Some(opts))
            .await
            .map_err(DaemonError::from)
    }

    fn push_image(&self, reference: &ImageRef, auth: &RegistryAuth) -> ProgressStream {
        let opts = PushImageOptions {
            tag: reference.tag().map(str::to_string),
            ..Default::default()
        };

        into_records(self.client.push_image(
            &reference.repository(),
            Some(opts),
            Some(auth.docker_credentials()),
        ))
    }

    fn pull_image(&self, reference: &ImageRef, auth: &RegistryAuth) -> ProgressStream {
        let opts = CreateImageOptions {
            from_image: Some(reference.to_string()),
            ..Default::default()
        };

        into_records(
            self.client
                .create_image(Some(opts), None, Some(auth.docker_credentials())),
        )
    }

    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>, DaemonError> {
        let opts = ListContainersOptions {
            all,
            ..Default::default()
        };

        let containers = self.client.list_containers(Some(opts)).await?;

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
                    image: c.image.unwrap_or_default(),
                    state,
                    status: c.status.unwrap_or_default(),
                    labels: c.labels.unwrap_or_default(),
                }
            })
            .collect())
    }

    async fn stop_container(
        &self,
        name: &ContainerName,
        timeout: Duration,
    ) -> Result<(), DaemonError> {
        let opts = StopContainerOptions {
            t: Some(timeout.as_secs() as i32),
            signal: None,
        };

        self.client
            .stop_container(name.as_str(), Some(opts))
            .await
            .map_err(DaemonError::from)
    }

    async fn remove_container(&self, name: &ContainerName) -> Result<(), DaemonError> {
        let opts = RemoveContainerOptions {
            force: false,
            ..Default::default()
        };

        self.client
            .remove_container(name.as_str(), Some(opts))
            .await
            .map_err(DaemonError::from)
    }

    async fn create_container(
        &self,
        spec: &ContainerSpec,
    ) -> Result<CreatedContainer, DaemonError> {
        let port_key = spec.publish.port_key();

        let port_bindings = HashMap::from([(
            port_key.clone(),
            Some(vec![PortBinding {
                host_ip: Some(spec.publish.host_ip.clone()),
                host_port: Some(spec.publish.host_port.to_string()),
            }]),
        )]);

        let host_config = HostConfig {
            port_bindings: Some(port_bindings),
            ..Default::default()
        };

        let networking_config = spec.network.as_ref().map(|network| {
            bollard::models::NetworkingConfig {
                endpoints_config: Some(HashMap::from([(
                    network.clone(),
                    EndpointSettings::default(),
                )])),
            }
        });

        let body = ContainerCreateBody {
            image: Some(spec.image.as_str().to_string()),
            exposed_ports: Some(vec![port_key]),
            labels: if spec.labels.is_empty() {
                None
            } else {
                Some(spec.labels.clone())
            },
            host_config: Some(host_config),
            networking_config,
            ..Default::default()
        };

        let opts = CreateContainerOptions {
            name: Some(spec.name.to_string()),
            ..Default::default()
        };

        let response = self.client.create_container(Some(opts), body).await?;

        Ok(CreatedContainer {
            id: ContainerId::new(response.id),
            warnings: response.warnings,
        })
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), DaemonError> {
        self.client
            .start_container(id.as_str(), None::<StartContainerOptions>)
            .await
            .map_err(DaemonError::from)
    }
}
