// ABOUTME: Private OpenSSH server driven over stdin/stdout for session tests.
// ABOUTME: `sshd -i` runs as the tunnel program, so no port or system daemon is needed.

use burrow::ssh::SessionConfig;
use nonempty::NonEmpty;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

const SSHD_CANDIDATES: [&str; 4] = [
    "/usr/sbin/sshd",
    "/usr/bin/sshd",
    "/usr/local/sbin/sshd",
    "/sbin/sshd",
];

// sshd running as root refuses to start without one of these.
const PRIVSEP_DIRS: [&str; 4] = ["/run/sshd", "/var/run/sshd", "/var/empty", "/var/empty/sshd"];

/// A throwaway sshd configuration in its own directory.
///
/// Every session spawns a fresh `sshd -i` that serves exactly one connection
/// and logs in as the user running the tests.
pub struct InetdSshd {
    dir: TempDir,
    sshd: PathBuf,
    config: PathBuf,
    user: String,
}

impl InetdSshd {
    /// Prepare the server, or `None` when sshd cannot run on this machine.
    pub fn start() -> Option<Self> {
        let Some(sshd) = SSHD_CANDIDATES.iter().map(PathBuf::from).find(|p| p.exists()) else {
            eprintln!("sshd not installed, skipping");
            return None;
        };

        let running_as_root = std::fs::metadata("/proc/self").is_ok_and(|m| m.uid() == 0);
        if running_as_root && !PRIVSEP_DIRS.iter().any(|d| Path::new(d).is_dir()) {
            eprintln!("no sshd privilege separation directory, skipping");
            return None;
        }

        let user = current_user()?;
        let dir = tempfile::tempdir().ok()?;
        let key = super::test_key_path();

        // The test key doubles as the host key; sshd insists on 0600.
        let host_key = dir.path().join("host_key");
        std::fs::copy(&key, &host_key).ok()?;
        std::fs::set_permissions(&host_key, std::fs::Permissions::from_mode(0o600)).ok()?;

        let authorized = dir.path().join("authorized_keys");
        std::fs::copy(key.with_extension("pub"), &authorized).ok()?;

        let config = dir.path().join("sshd_config");
        let contents = format!(
            "HostKey {}\n\
             AuthorizedKeysFile {}\n\
             PubkeyAuthentication yes\n\
             PasswordAuthentication no\n\
             StrictModes no\n\
             UsePAM no\n\
             AllowStreamLocalForwarding yes\n\
             LogLevel ERROR\n",
            host_key.display(),
            authorized.display(),
        );
        std::fs::write(&config, contents).ok()?;

        Some(Self {
            dir,
            sshd,
            config,
            user,
        })
    }

    /// Scratch directory on the "remote" side, which is this machine.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Tunnel command that starts sshd in inetd mode. The appended host
    /// lands in an unused positional parameter.
    pub fn tunnel(&self) -> NonEmpty<String> {
        NonEmpty::from_vec(vec![
            "sh".to_string(),
            "-c".to_string(),
            r#"exec "$0" -i -e -f "$1""#.to_string(),
            self.sshd.display().to_string(),
            self.config.display().to_string(),
        ])
        .unwrap()
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new("sshd.test", &self.user, super::test_key_path())
            .tunnel(self.tunnel())
            .connect_timeout(Duration::from_secs(10))
    }
}

fn current_user() -> Option<String> {
    let output = std::process::Command::new("id").arg("-un").output().ok()?;
    let user = String::from_utf8(output.stdout).ok()?.trim().to_string();
    (output.status.success() && !user.is_empty()).then_some(user)
}
