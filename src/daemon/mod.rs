// ABOUTME: Container daemon facade used by the deployment pipeline.
// ABOUTME: One trait, a bollard implementation, build-context packing and registry auth.

mod archive;
mod auth;
mod bollard;
mod error;
mod traits;

pub use self::bollard::{BollardDaemon, REMOTE_DOCKER_SOCKET};
pub use archive::pack_context;
pub use auth::{CredentialError, RegistryAuth};
pub use error::DaemonError;
pub use traits::{
    BuildContext, ContainerDaemon, ContainerSpec, ContainerSummary, CreatedContainer, Protocol,
    PublishedPort,
};
