// ABOUTME: Generic deployment struct parameterized by state.
// ABOUTME: State types carry their own data for compile-time guarantees.

use crate::types::{ContainerId, ImageId, ImageRef};

use super::DeploymentTarget;
use super::state::{
    Authenticated, Built, CleanedOld, Created, Done, Init, PulledRemote, Pushed, Started, Tagged,
};

/// A deployment in progress, parameterized by its current state.
///
/// The state type parameter `S` carries state-specific data (the built image
/// id, the registry credential, the new container id) so a step can only use
/// what earlier steps actually produced.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) target: DeploymentTarget,
    pub(crate) state: S,
}

impl Deployment<Init> {
    pub fn new(target: DeploymentTarget) -> Self {
        Deployment {
            target,
            state: Init,
        }
    }
}

impl<S> Deployment<S> {
    pub fn target(&self) -> &DeploymentTarget {
        &self.target
    }

    /// Registry reference being deployed.
    pub fn image_ref(&self) -> &ImageRef {
        &self.target.image
    }

    /// Move to the next state, carrying the target along.
    pub(crate) fn map_state<T>(self, next: impl FnOnce(S) -> T) -> Deployment<T> {
        Deployment {
            target: self.target,
            state: next(self.state),
        }
    }
}

macro_rules! image_accessor {
    ($($state:ty),*) => {
        $(
            impl Deployment<$state> {
                /// Id of the image built in this deployment.
                pub fn image_id(&self) -> &ImageId {
                    &self.state.image
                }
            }
        )*
    };
}

image_accessor!(
    Built,
    Tagged,
    Authenticated,
    Pushed,
    PulledRemote,
    CleanedOld,
    Created,
    Started,
    Done
);

impl Deployment<Created> {
    pub fn container_id(&self) -> &ContainerId {
        &self.state.container
    }
}

impl Deployment<Started> {
    pub fn container_id(&self) -> &ContainerId {
        &self.state.container
    }
}

impl Deployment<Done> {
    pub fn container_id(&self) -> &ContainerId {
        &self.state.container
    }
}
