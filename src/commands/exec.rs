// ABOUTME: Exec command implementation.
// ABOUTME: Runs a shell command on the remote host through the tunnel.

use super::session::{close_session, open_session};
use burrow::config::Config;
use burrow::diagnostics::Diagnostics;
use burrow::error::Result;
use burrow::output::Output;
use burrow::ssh::{Error as SshError, Session};

/// Execute `command` on the remote host and relay its output.
pub async fn exec_command(config: Config, command: Vec<String>, output: Output) -> Result<()> {
    let mut diag = Diagnostics::default();
    let command = shell_join(&command);

    let session = open_session(&config, &output).await?;
    let result = exec_on_session(&session, &command).await;
    close_session(session, &config, &mut diag).await;

    // Emit collected warnings
    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    result
}

async fn exec_on_session(session: &Session, command: &str) -> Result<()> {
    match session.run(command).await {
        Ok(result) => {
            print!("{}", result.stdout);
            eprint!("{}", result.stderr);
            Ok(())
        }
        Err(err) => {
            // stderr travels in the error message.
            if let SshError::NonZeroExit { ref stdout, .. } = err {
                print!("{}", stdout);
            }
            Err(err.into())
        }
    }
}

/// Join arguments into one command line for the remote shell, quoting each
/// so it arrives as a single word.
fn shell_join(args: &[String]) -> String {
    args.iter()
        .map(|arg| shell_quote(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./=:,@%+".contains(c))
    {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}
