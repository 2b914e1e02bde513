// ABOUTME: The fixed parameters of a deployment.
// ABOUTME: Which image runs under which name, published where, on which network.

use crate::daemon::PublishedPort;
use crate::types::{ContainerName, ImageRef};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTarget {
    /// Registry reference the built image is tagged, pushed and pulled as.
    pub image: ImageRef,
    /// Name of the container replaced on the remote host.
    pub container: ContainerName,
    pub publish: PublishedPort,
    /// Network the new container joins, if any.
    pub network: Option<String>,
    /// Grace period before the old container is killed.
    pub stop_timeout: Duration,
    /// Extra labels for the new container.
    pub labels: HashMap<String, String>,
}
