// ABOUTME: Drives a deployment from Init to Done, stopping at the first failure.
// ABOUTME: Reports every stage reached and every progress record to an observer.

use std::fmt;

use crate::daemon::{BuildContext, ContainerDaemon, CredentialError, RegistryAuth};
use crate::diagnostics::Diagnostics;
use crate::progress::ProgressRecord;

use super::error::DeployError;
use super::state::Done;
use super::{Deployment, DeploymentTarget};

/// Pipeline stages, in order, plus the terminal failure stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Init,
    Built,
    Tagged,
    Authenticated,
    Pushed,
    PulledRemote,
    CleanedOld,
    Created,
    Started,
    Done,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Built => "built",
            Stage::Tagged => "tagged",
            Stage::Authenticated => "authenticated",
            Stage::Pushed => "pushed",
            Stage::PulledRemote => "pulled-remote",
            Stage::CleanedOld => "cleaned-old",
            Stage::Created => "created",
            Stage::Started => "started",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives pipeline events as they happen.
pub trait StageObserver {
    /// The deployment reached `stage`. `Stage::Failed` is reported once,
    /// right before the pipeline returns an error.
    fn reached(&mut self, stage: Stage);

    /// A progress record arrived while working toward `next`.
    fn progress(&mut self, _next: Stage, _record: &ProgressRecord) {}
}

/// Records the stages reached, in order.
impl StageObserver for Vec<Stage> {
    fn reached(&mut self, stage: Stage) {
        self.push(stage);
    }
}

/// The pipeline stopped. `stage` is the last stage completed.
#[derive(Debug, thiserror::Error)]
#[error("deployment failed after stage {stage}: {error}")]
pub struct PipelineFailure {
    pub stage: Stage,
    #[source]
    pub error: DeployError,
}

/// Record reaching `next`, or the failure after `last`.
fn checkpoint<S, O>(
    observer: &mut O,
    result: Result<Deployment<S>, DeployError>,
    last: Stage,
    next: Stage,
) -> Result<Deployment<S>, PipelineFailure>
where
    O: StageObserver + ?Sized,
{
    match result {
        Ok(deployment) => {
            tracing::debug!(stage = %next, "stage reached");
            observer.reached(next);
            Ok(deployment)
        }
        Err(error) => {
            tracing::debug!(stage = %last, error = %error, "pipeline failed");
            observer.reached(Stage::Failed);
            Err(PipelineFailure { stage: last, error })
        }
    }
}

/// Build locally, publish through the registry, and replace the container
/// on the remote host.
///
/// Steps run strictly in order and the first failure ends the run. Nothing
/// done before the failure is undone: a failure after the old container was
/// removed leaves the host without a running container.
pub async fn run_pipeline<L, R, C, O>(
    target: DeploymentTarget,
    context: &BuildContext,
    local: &L,
    remote: &R,
    credentials: C,
    observer: &mut O,
    diag: &mut Diagnostics,
) -> Result<Deployment<Done>, PipelineFailure>
where
    L: ContainerDaemon + ?Sized,
    R: ContainerDaemon + ?Sized,
    C: FnOnce() -> Result<RegistryAuth, CredentialError>,
    O: StageObserver + ?Sized,
{
    let deployment = Deployment::new(target);
    observer.reached(Stage::Init);

    let result = deployment
        .build(local, context, |r| observer.progress(Stage::Built, r))
        .await;
    let deployment = checkpoint(observer, result, Stage::Init, Stage::Built)?;

    let result = deployment.tag(local).await;
    let deployment = checkpoint(observer, result, Stage::Built, Stage::Tagged)?;

    let result = deployment.authenticate(credentials);
    let deployment = checkpoint(observer, result, Stage::Tagged, Stage::Authenticated)?;

    let result = deployment
        .push(local, |r| observer.progress(Stage::Pushed, r))
        .await;
    let deployment = checkpoint(observer, result, Stage::Authenticated, Stage::Pushed)?;

    let result = deployment
        .pull_remote(remote, |r| observer.progress(Stage::PulledRemote, r))
        .await;
    let deployment = checkpoint(observer, result, Stage::Pushed, Stage::PulledRemote)?;

    let deployment = deployment.clean_old(remote, diag).await;
    observer.reached(Stage::CleanedOld);

    let result = deployment.create(remote, diag).await;
    let deployment = checkpoint(observer, result, Stage::CleanedOld, Stage::Created)?;

    let result = deployment.start(remote).await;
    let deployment = checkpoint(observer, result, Stage::Created, Stage::Started)?;

    let deployment = deployment.finish();
    observer.reached(Stage::Done);

    Ok(deployment)
}
