// ABOUTME: The container daemon operations the deployment pipeline needs.
// ABOUTME: Image build/tag/push/pull and container list/stop/remove/create/start.

use super::auth::RegistryAuth;
use super::error::DaemonError;
use crate::progress::ProgressStream;
use crate::types::{ContainerId, ContainerName, ImageId, ImageRef};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// A container daemon, local or reached through a forwarded socket.
///
/// Streaming operations hand back the raw progress records; the caller
/// decides when the operation has failed by decoding them.
#[async_trait]
pub trait ContainerDaemon: Send + Sync {
    /// Pack `context` and submit it for building.
    async fn build_image(&self, context: &BuildContext) -> Result<ProgressStream, DaemonError>;

    /// Give an existing image an additional reference.
    async fn tag_image(&self, image: &ImageId, reference: &ImageRef) -> Result<(), DaemonError>;

    fn push_image(&self, reference: &ImageRef, auth: &RegistryAuth) -> ProgressStream;

    fn pull_image(&self, reference: &ImageRef, auth: &RegistryAuth) -> ProgressStream;

    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>, DaemonError>;

    /// Stop a running container, killing it after `timeout`.
    async fn stop_container(
        &self,
        name: &ContainerName,
        timeout: Duration,
    ) -> Result<(), DaemonError>;

    async fn remove_container(&self, name: &ContainerName) -> Result<(), DaemonError>;

    async fn create_container(&self, spec: &ContainerSpec)
    -> Result<CreatedContainer, DaemonError>;

    async fn start_container(&self, id: &ContainerId) -> Result<(), DaemonError>;
}

/// Directory to build plus the Dockerfile name inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub dir: PathBuf,
    pub dockerfile: String,
}

/// Network protocol of a published port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A container port bound to a host address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPort {
    pub container_port: u16,
    pub protocol: Protocol,
    pub host_ip: String,
    pub host_port: u16,
}

impl PublishedPort {
    /// The `<port>/<proto>` key the daemon uses for exposed ports.
    pub fn port_key(&self) -> String {
        format!("{}/{}", self.container_port, self.protocol)
    }
}

/// Everything needed to create the deployed container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: ContainerName,
    /// Created from the image id, not a tag, so a concurrent retag cannot
    /// change what runs.
    pub image: ImageId,
    pub publish: PublishedPort,
    pub network: Option<String>,
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedContainer {
    pub id: ContainerId,
    /// Non-fatal warnings returned by the daemon.
    pub warnings: Vec<String>,
}

/// Summary row from a container listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    pub id: ContainerId,
    pub name: String,
    pub image: String,
    pub state: String,
    pub status: String,
    pub labels: HashMap<String, String>,
}

impl ContainerSummary {
    pub fn is_managed(&self) -> bool {
        self.labels
            .get(crate::deploy::labels::MANAGED)
            .is_some_and(|v| v == "true")
    }
}
