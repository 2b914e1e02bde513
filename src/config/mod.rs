// ABOUTME: Configuration types and parsing for burrow.yml.
// ABOUTME: Handles YAML parsing, file discovery, and derivation of the deployment target.

mod deserialize;
mod init;
mod remote;

pub use init::{TEMPLATE, init_config};
pub use remote::{RemoteConfig, expand_home};

use crate::daemon::{BuildContext, CredentialError, Protocol, PublishedPort, RegistryAuth};
use crate::deploy::DeploymentTarget;
use crate::error::{Error, Result};
use crate::types::{ContainerName, ImageRef};
use deserialize::{deserialize_container_name, deserialize_image_ref};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "burrow.yml";
pub const CONFIG_FILENAME_ALT: &str = "burrow.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".burrow/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Name of the container on the remote host.
    #[serde(deserialize_with = "deserialize_container_name")]
    pub container: ContainerName,

    #[serde(deserialize_with = "deserialize_image_ref")]
    pub image: ImageRef,

    pub build: BuildConfig,

    pub registry: RegistryConfig,

    pub remote: RemoteConfig,

    #[serde(default)]
    pub local: LocalConfig,

    pub publish: PublishConfig,

    #[serde(default)]
    pub network: Option<String>,

    #[serde(default = "default_stop_timeout", with = "humantime_serde")]
    pub stop_timeout: Duration,

    #[serde(default)]
    pub labels: HashMap<String, String>,

    /// Directory relative paths are resolved against.
    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    pub context: PathBuf,
    #[serde(default = "default_dockerfile")]
    pub dockerfile: String,
}

fn default_dockerfile() -> String {
    "Dockerfile".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    pub username: String,
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
    #[serde(default)]
    pub server: Option<String>,
}

fn default_token_file() -> PathBuf {
    PathBuf::from(".dockerhub")
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalConfig {
    /// Local daemon socket; unset means the platform default.
    #[serde(default)]
    pub socket: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishConfig {
    pub container_port: u16,
    pub host_port: u16,
    #[serde(default = "default_host_ip")]
    pub host_ip: String,
    #[serde(default)]
    pub protocol: Protocol,
}

fn default_host_ip() -> String {
    "0.0.0.0".to_string()
}

fn default_stop_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;

        // `.burrow/config.yml` still resolves paths against the project root.
        let dir = path.parent().unwrap_or(Path::new(""));
        config.base_dir = if dir.ends_with(".burrow") {
            dir.parent().unwrap_or(dir).to_path_buf()
        } else {
            dir.to_path_buf()
        };

        Ok(config)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!(path = ?path, "loading configuration");
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    fn validate(&self) -> Result<()> {
        // The build is tagged, pushed and pulled by tag.
        if let Some(digest) = self.image.digest() {
            return Err(Error::InvalidConfig(format!(
                "image must be a tag reference, not a digest (@{})",
                digest
            )));
        }
        if self.remote.host.trim().is_empty() {
            return Err(Error::InvalidConfig("remote.host cannot be empty".to_string()));
        }
        if self.remote.user.trim().is_empty() {
            return Err(Error::InvalidConfig("remote.user cannot be empty".to_string()));
        }
        if self.registry.username.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "registry.username cannot be empty".to_string(),
            ));
        }
        if self.publish.container_port == 0 || self.publish.host_port == 0 {
            return Err(Error::InvalidConfig(
                "publish ports must be between 1 and 65535".to_string(),
            ));
        }
        if self.network.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(Error::InvalidConfig("network cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Resolve a configured path against the configuration's directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        let path = expand_home(path);
        if path.is_absolute() {
            path
        } else {
            self.base_dir.join(path)
        }
    }

    /// What gets deployed where.
    pub fn target(&self) -> DeploymentTarget {
        DeploymentTarget {
            image: self.image.clone(),
            container: self.container.clone(),
            publish: PublishedPort {
                container_port: self.publish.container_port,
                protocol: self.publish.protocol,
                host_ip: self.publish.host_ip.clone(),
                host_port: self.publish.host_port,
            },
            network: self.network.clone(),
            stop_timeout: self.stop_timeout,
            labels: self.labels.clone(),
        }
    }

    pub fn build_context(&self) -> BuildContext {
        BuildContext {
            dir: self.resolve_path(&self.build.context),
            dockerfile: self.build.dockerfile.clone(),
        }
    }

    /// Read the registry token and assemble the credential.
    pub fn registry_auth(&self) -> std::result::Result<RegistryAuth, CredentialError> {
        let path = self.resolve_path(&self.registry.token_file);
        let auth = RegistryAuth::from_token_file(&self.registry.username, &path)?;
        Ok(match &self.registry.server {
            Some(server) => auth.server(server),
            None => auth,
        })
    }

    pub fn local_socket(&self) -> Option<PathBuf> {
        self.local.socket.as_deref().map(|p| self.resolve_path(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
container: hello_world
image: gojoe2/hello_world:latest
build:
  context: ../hello_world
registry:
  username: gojoe2
remote:
  host: ssh.gojoe.dev
  user: deepwater
publish:
  container_port: 80
  host_port: 3004
network: deepwater_web
"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = Config::from_yaml(MINIMAL).unwrap();

        assert_eq!(config.container.as_str(), "hello_world");
        assert_eq!(config.build.dockerfile, "Dockerfile");
        assert_eq!(config.registry.token_file, PathBuf::from(".dockerhub"));
        assert_eq!(config.publish.host_ip, "0.0.0.0");
        assert_eq!(config.publish.protocol, Protocol::Tcp);
        assert_eq!(config.stop_timeout, Duration::from_secs(10));
        assert!(config.local.socket.is_none());
    }

    #[test]
    fn target_carries_publish_and_network() {
        let target = Config::from_yaml(MINIMAL).unwrap().target();

        assert_eq!(target.image.to_string(), "gojoe2/hello_world:latest");
        assert_eq!(target.publish.port_key(), "80/tcp");
        assert_eq!(target.publish.host_port, 3004);
        assert_eq!(target.network.as_deref(), Some("deepwater_web"));
    }

    #[test]
    fn invalid_container_name_is_rejected() {
        let yaml = MINIMAL.replace("container: hello_world", "container: -bad");
        assert!(matches!(Config::from_yaml(&yaml), Err(Error::Yaml(_))));
    }

    #[test]
    fn zero_host_port_is_rejected() {
        let yaml = MINIMAL.replace("host_port: 3004", "host_port: 0");
        assert!(matches!(
            Config::from_yaml(&yaml),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), MINIMAL).unwrap();

        let config = Config::discover(dir.path()).unwrap();

        assert_eq!(
            config.build_context().dir,
            dir.path().join("../hello_world")
        );
    }

    #[test]
    fn dot_dir_config_resolves_against_project_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".burrow")).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME_DIR), MINIMAL).unwrap();
        std::fs::write(dir.path().join(".dockerhub"), "token\n").unwrap();

        let config = Config::discover(dir.path()).unwrap();
        let auth = config.registry_auth().unwrap();

        assert_eq!(auth.username(), "gojoe2");
    }

    #[test]
    fn discover_without_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::discover(dir.path()),
            Err(Error::ConfigNotFound(_))
        ));
    }
}
