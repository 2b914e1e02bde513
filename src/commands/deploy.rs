// ABOUTME: Deploy command implementation.
// ABOUTME: Connects both daemons, runs the pipeline and prints its progress.

use super::session::{close_session, open_session};
use burrow::config::Config;
use burrow::daemon::BollardDaemon;
use burrow::deploy::{Deployment, Done, Stage, StageObserver, run_pipeline};
use burrow::diagnostics::Diagnostics;
use burrow::error::Result;
use burrow::output::Output;
use burrow::progress::ProgressRecord;
use burrow::ssh::Session;

/// Build, publish and replace the container described by `config`.
pub async fn deploy(config: Config, mut output: Output) -> Result<()> {
    output.start_timer();
    let mut diag = Diagnostics::default();

    output.progress(&format!(
        "Deploying {} as {} to {}",
        config.image, config.container, config.remote.host
    ));

    let local = BollardDaemon::connect_local(config.local_socket().as_deref())?;
    let session = open_session(&config, &output).await?;

    let result = deploy_with_session(&config, &session, &local, &output, &mut diag).await;

    close_session(session, &config, &mut diag).await;

    // Emit collected warnings
    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    let deployment = result?;
    output.success(&format!(
        "Deployed {} as container {} ({})",
        deployment.image_ref(),
        deployment.target().container,
        deployment.container_id().short()
    ));
    Ok(())
}

async fn deploy_with_session(
    config: &Config,
    session: &Session,
    local: &BollardDaemon,
    output: &Output,
    diag: &mut Diagnostics,
) -> Result<Deployment<Done>> {
    let remote = BollardDaemon::connect_remote(session, &config.remote.socket).await?;
    let mut printer = ProgressPrinter { config, output };

    let deployment = run_pipeline(
        config.target(),
        &config.build_context(),
        local,
        &remote,
        || config.registry_auth(),
        &mut printer,
        diag,
    )
    .await?;

    Ok(deployment)
}

/// Announces each step before it runs and echoes daemon output under it.
struct ProgressPrinter<'a> {
    config: &'a Config,
    output: &'a Output,
}

impl StageObserver for ProgressPrinter<'_> {
    fn reached(&mut self, stage: Stage) {
        let next = match stage {
            Stage::Init => format!(
                "  → Building {}...",
                self.config.build_context().dir.display()
            ),
            Stage::Built => format!("  → Tagging as {}...", self.config.image),
            Stage::Tagged => "  → Loading registry credentials...".to_string(),
            Stage::Authenticated => format!("  → Pushing {}...", self.config.image),
            Stage::Pushed => format!("  → Pulling on {}...", self.config.remote.host),
            Stage::PulledRemote => format!(
                "  → Removing previous {} container...",
                self.config.container
            ),
            Stage::CleanedOld => "  → Creating container...".to_string(),
            Stage::Created => "  → Starting container...".to_string(),
            Stage::Started | Stage::Done | Stage::Failed => return,
        };
        self.output.progress(&next);
    }

    fn progress(&mut self, _next: Stage, record: &ProgressRecord) {
        if let Some(line) = record.display_line() {
            self.output.detail(&line);
        }
    }
}
