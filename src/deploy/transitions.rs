// ABOUTME: State transition methods for deployment orchestration.
// ABOUTME: Each method consumes self and returns the next state on success.

use chrono::Utc;

use crate::daemon::{BuildContext, ContainerDaemon, ContainerSpec, CredentialError, RegistryAuth};
use crate::diagnostics::{Diagnostics, Warning};
use crate::progress::{ProgressRecord, decode_build, decode_progress};

use super::Deployment;
use super::error::DeployError;
use super::labels::{container_labels, local_hostname};
use super::state::{
    Authenticated, Built, CleanedOld, Created, Done, Init, PulledRemote, Pushed, Started, Tagged,
};

// =============================================================================
// Init -> Built
// =============================================================================

impl Deployment<Init> {
    /// Build the image on the local daemon.
    ///
    /// Every build record is passed to `on_record`.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Build` if the build reports an error, and
    /// `DeployError::MissingImageId` if it finishes without naming an image.
    #[must_use = "deployment state must be used"]
    pub async fn build<D, F>(
        self,
        local: &D,
        context: &BuildContext,
        on_record: F,
    ) -> Result<Deployment<Built>, DeployError>
    where
        D: ContainerDaemon + ?Sized,
        F: FnMut(&ProgressRecord),
    {
        let records = local
            .build_image(context)
            .await
            .map_err(DeployError::BuildSubmit)?;

        let image = decode_build(records, on_record)
            .await
            .map_err(DeployError::Build)?
            .ok_or(DeployError::MissingImageId)?;

        tracing::debug!(image = %image, "image built");
        Ok(self.map_state(|Init| Built { image }))
    }
}

// =============================================================================
// Built -> Tagged
// =============================================================================

impl Deployment<Built> {
    /// Tag the built image with the deployment reference.
    #[must_use = "deployment state must be used"]
    pub async fn tag<D>(self, local: &D) -> Result<Deployment<Tagged>, DeployError>
    where
        D: ContainerDaemon + ?Sized,
    {
        local
            .tag_image(&self.state.image, &self.target.image)
            .await
            .map_err(|source| DeployError::Tag {
                image: self.state.image.clone(),
                reference: self.target.image.clone(),
                source,
            })?;

        Ok(self.map_state(|Built { image }| Tagged { image }))
    }
}

// =============================================================================
// Tagged -> Authenticated
// =============================================================================

impl Deployment<Tagged> {
    /// Load registry credentials.
    pub fn authenticate<C>(self, credentials: C) -> Result<Deployment<Authenticated>, DeployError>
    where
        C: FnOnce() -> Result<RegistryAuth, CredentialError>,
    {
        let auth = credentials().map_err(DeployError::Credentials)?;
        tracing::debug!(user = %auth.username(), "registry credentials loaded");

        Ok(self.map_state(|Tagged { image }| Authenticated { image, auth }))
    }
}

// =============================================================================
// Authenticated -> Pushed
// =============================================================================

impl Deployment<Authenticated> {
    /// Push the tagged image from the local daemon to the registry.
    #[must_use = "deployment state must be used"]
    pub async fn push<D, F>(self, local: &D, on_record: F) -> Result<Deployment<Pushed>, DeployError>
    where
        D: ContainerDaemon + ?Sized,
        F: FnMut(&ProgressRecord),
    {
        let records = local.push_image(&self.target.image, &self.state.auth);
        decode_progress(records, on_record)
            .await
            .map_err(DeployError::Push)?;

        Ok(self.map_state(|Authenticated { image, auth }| Pushed { image, auth }))
    }
}

// =============================================================================
// Pushed -> PulledRemote
// =============================================================================

impl Deployment<Pushed> {
    /// Pull the pushed image on the remote daemon.
    #[must_use = "deployment state must be used"]
    pub async fn pull_remote<D, F>(
        self,
        remote: &D,
        on_record: F,
    ) -> Result<Deployment<PulledRemote>, DeployError>
    where
        D: ContainerDaemon + ?Sized,
        F: FnMut(&ProgressRecord),
    {
        let records = remote.pull_image(&self.target.image, &self.state.auth);
        decode_progress(records, on_record)
            .await
            .map_err(DeployError::Pull)?;

        // The credential is dropped here; nothing later needs it.
        Ok(self.map_state(|Pushed { image, .. }| PulledRemote { image }))
    }
}

// =============================================================================
// PulledRemote -> CleanedOld
// =============================================================================

impl Deployment<PulledRemote> {
    /// Stop and remove the previous container of the same name.
    ///
    /// Never fails. A container that does not exist (or is already stopped)
    /// is the normal first-deploy case; any other failure is recorded in
    /// `diag` and the deployment carries on.
    pub async fn clean_old<D>(self, remote: &D, diag: &mut Diagnostics) -> Deployment<CleanedOld>
    where
        D: ContainerDaemon + ?Sized,
    {
        let name = &self.target.container;

        match remote.stop_container(name, self.target.stop_timeout).await {
            Ok(()) => tracing::debug!(container = %name, "stopped old container"),
            Err(e) if e.is_not_found() || e.is_not_modified() => {
                tracing::debug!(container = %name, "nothing to stop: {}", e)
            }
            Err(e) => diag.warn(Warning::cleanup(format!(
                "{}: {}",
                name,
                DeployError::Stop(e)
            ))),
        }

        match remote.remove_container(name).await {
            Ok(()) => tracing::debug!(container = %name, "removed old container"),
            Err(e) if e.is_not_found() => {
                tracing::debug!(container = %name, "nothing to remove: {}", e)
            }
            Err(e) => diag.warn(Warning::cleanup(format!(
                "{}: {}",
                name,
                DeployError::Remove(e)
            ))),
        }

        self.map_state(|PulledRemote { image }| CleanedOld { image })
    }
}

// =============================================================================
// CleanedOld -> Created
// =============================================================================

impl Deployment<CleanedOld> {
    /// Create the new container from the built image id.
    ///
    /// Warnings the daemon returns alongside the new container are recorded
    /// in `diag`.
    #[must_use = "deployment state must be used"]
    pub async fn create<D>(
        self,
        remote: &D,
        diag: &mut Diagnostics,
    ) -> Result<Deployment<Created>, DeployError>
    where
        D: ContainerDaemon + ?Sized,
    {
        let spec = self.container_spec();
        let created = remote
            .create_container(&spec)
            .await
            .map_err(DeployError::Create)?;

        for warning in created.warnings {
            diag.warn(Warning::create(warning));
        }

        Ok(self.map_state(|CleanedOld { image }| Created {
            image,
            container: created.id,
        }))
    }

    fn container_spec(&self) -> ContainerSpec {
        ContainerSpec {
            name: self.target.container.clone(),
            image: self.state.image.clone(),
            publish: self.target.publish.clone(),
            network: self.target.network.clone(),
            labels: container_labels(&self.target, Utc::now(), &local_hostname()),
        }
    }
}

// =============================================================================
// Created -> Started -> Done
// =============================================================================

impl Deployment<Created> {
    #[must_use = "deployment state must be used"]
    pub async fn start<D>(self, remote: &D) -> Result<Deployment<Started>, DeployError>
    where
        D: ContainerDaemon + ?Sized,
    {
        remote
            .start_container(&self.state.container)
            .await
            .map_err(DeployError::Start)?;

        Ok(self.map_state(|Created { image, container }| Started { image, container }))
    }
}

impl Deployment<Started> {
    pub fn finish(self) -> Deployment<Done> {
        self.map_state(|Started { image, container }| Done { image, container })
    }
}
