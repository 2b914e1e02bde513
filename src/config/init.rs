// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Writes a commented burrow.yml template.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::CONFIG_FILENAME;

pub const TEMPLATE: &str = r#"# Container name on the remote host
container: my-app
image: my-user/my-app:latest

build:
  context: .
  dockerfile: Dockerfile

registry:
  username: my-user
  # File holding the registry access token (single line)
  token_file: .dockerhub

remote:
  host: ssh.example.com
  user: deploy
  key_path: ~/.ssh/id_ed25519
  # Spawned locally with the host appended; its stdin/stdout carry SSH
  tunnel: [cloudflared, access, ssh, --hostname]
  socket: /var/run/docker.sock
  connect_timeout: 5s

publish:
  container_port: 80
  host_port: 8080
  host_ip: 0.0.0.0
  protocol: tcp

# network: my-network
stop_timeout: 10s
labels: {}
"#;

/// Write the template into `dir`, returning the path written.
pub fn init_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    std::fs::write(&config_path, TEMPLATE)?;

    Ok(config_path)
}
