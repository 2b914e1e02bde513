// ABOUTME: Registry credentials attached to push and pull requests.
// ABOUTME: Loaded from a token file, handed to bollard, never printed.

use bollard::auth::DockerCredentials;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("cannot read registry token from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("registry token file {0} is empty")]
    Empty(PathBuf),
}

/// Username and access token for a registry.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryAuth {
    username: String,
    token: String,
    server: Option<String>,
}

impl RegistryAuth {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
            server: None,
        }
    }

    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    /// Read the token from a single-line file, trimming surrounding whitespace.
    pub fn from_token_file(
        username: impl Into<String>,
        path: &Path,
    ) -> Result<Self, CredentialError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CredentialError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let token = raw.trim();
        if token.is_empty() {
            return Err(CredentialError::Empty(path.to_path_buf()));
        }
        Ok(Self::new(username, token))
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn server_address(&self) -> Option<&str> {
        self.server.as_deref()
    }

    /// Credentials for push and pull requests. bollard serializes them to
    /// JSON and base64url-encodes the result into `X-Registry-Auth`.
    pub fn docker_credentials(&self) -> DockerCredentials {
        DockerCredentials {
            username: Some(self.username.clone()),
            password: Some(self.token.clone()),
            serveraddress: self.server.clone(),
            ..Default::default()
        }
    }
}

impl std::fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryAuth")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .field("server", &self.server)
            .finish()
    }
}
