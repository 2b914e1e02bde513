// ABOUTME: Ps command implementation.
// ABOUTME: Lists containers on the remote host through the forwarded daemon socket.

use super::session::{close_session, open_session};
use burrow::config::Config;
use burrow::daemon::{BollardDaemon, ContainerDaemon, ContainerSummary};
use burrow::diagnostics::Diagnostics;
use burrow::error::Result;
use burrow::output::Output;
use burrow::ssh::Session;

/// Print the remote host's containers, marking the ones burrow deployed.
pub async fn ps(config: Config, all: bool, output: Output) -> Result<()> {
    let mut diag = Diagnostics::default();

    let session = open_session(&config, &output).await?;
    let result = list_remote(&config, &session, all).await;
    close_session(session, &config, &mut diag).await;

    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    let containers = result?;
    println!("{}", render_table(&containers));
    Ok(())
}

async fn list_remote(
    config: &Config,
    session: &Session,
    all: bool,
) -> Result<Vec<ContainerSummary>> {
    let remote = BollardDaemon::connect_remote(session, &config.remote.socket).await?;
    Ok(remote.list_containers(all).await?)
}

fn render_table(containers: &[ContainerSummary]) -> String {
    let name_width = containers
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0)
        .max("NAME".len());
    let image_width = containers
        .iter()
        .map(|c| c.image.len())
        .max()
        .unwrap_or(0)
        .max("IMAGE".len());

    let mut lines = vec![format!(
        "  {:<12}  {:<name_width$}  {:<image_width$}  {:<10}  STATUS",
        "ID", "NAME", "IMAGE", "STATE"
    )];
    for c in containers {
        let marker = if c.is_managed() { '*' } else { ' ' };
        lines.push(format!(
            "{} {:<12}  {:<name_width$}  {:<image_width$}  {:<10}  {}",
            marker,
            c.id.short(),
            c.name,
            c.image,
            c.state,
            c.status
        ));
    }
    lines.join("\n")
}
