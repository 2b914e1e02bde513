// ABOUTME: Deployment state types for the type state pattern.
// ABOUTME: Each state carries exactly the data later steps are allowed to use.

use crate::daemon::RegistryAuth;
use crate::types::{ContainerId, ImageId};

/// Nothing has happened yet.
/// Available actions: `build()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Init;

/// Image built locally.
/// Available actions: `tag()`
#[derive(Debug, Clone)]
pub struct Built {
    pub(crate) image: ImageId,
}

/// Image tagged with the deployment reference.
/// Available actions: `authenticate()`
#[derive(Debug, Clone)]
pub struct Tagged {
    pub(crate) image: ImageId,
}

/// Registry credentials loaded.
/// Available actions: `push()`
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub(crate) image: ImageId,
    pub(crate) auth: RegistryAuth,
}

/// Image pushed to the registry.
/// Available actions: `pull_remote()`
#[derive(Debug, Clone)]
pub struct Pushed {
    pub(crate) image: ImageId,
    pub(crate) auth: RegistryAuth,
}

/// Image present on the remote host.
/// Available actions: `clean_old()`
#[derive(Debug, Clone)]
pub struct PulledRemote {
    pub(crate) image: ImageId,
}

/// Any previous container with the same name is gone, or could not be
/// removed and a warning was recorded.
/// Available actions: `create()`
#[derive(Debug, Clone)]
pub struct CleanedOld {
    pub(crate) image: ImageId,
}

/// New container created but not running.
/// Available actions: `start()`
#[derive(Debug, Clone)]
pub struct Created {
    pub(crate) image: ImageId,
    pub(crate) container: ContainerId,
}

/// New container running.
/// Available actions: `finish()`
#[derive(Debug, Clone)]
pub struct Started {
    pub(crate) image: ImageId,
    pub(crate) container: ContainerId,
}

/// Deployment finished.
#[derive(Debug, Clone)]
pub struct Done {
    pub(crate) image: ImageId,
    pub(crate) container: ContainerId,
}
