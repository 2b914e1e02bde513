// ABOUTME: Validated container name as accepted by the Docker daemon.
// ABOUTME: Names match [a-zA-Z0-9][a-zA-Z0-9_.-]*.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContainerNameError {
    #[error("container name cannot be empty")]
    Empty,

    #[error("container name must start with a letter or digit")]
    InvalidStart,

    #[error("invalid character in container name: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerName(String);

impl ContainerName {
    pub fn new(value: &str) -> Result<Self, ContainerNameError> {
        let mut chars = value.chars();
        match chars.next() {
            None => return Err(ContainerNameError::Empty),
            Some(c) if !c.is_ascii_alphanumeric() => return Err(ContainerNameError::InvalidStart),
            Some(_) => {}
        }

        if let Some(c) = chars.find(|c| !(c.is_ascii_alphanumeric() || "_.-".contains(*c))) {
            return Err(ContainerNameError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_underscores_and_dots() {
        assert_eq!(
            ContainerName::new("hello_world.v2").unwrap().as_str(),
            "hello_world.v2"
        );
    }

    #[test]
    fn rejects_leading_separator() {
        assert_eq!(
            ContainerName::new("-svc"),
            Err(ContainerNameError::InvalidStart)
        );
        assert_eq!(ContainerName::new(""), Err(ContainerNameError::Empty));
    }

    #[test]
    fn rejects_slash() {
        assert_eq!(
            ContainerName::new("a/b"),
            Err(ContainerNameError::InvalidChar('/'))
        );
    }
}
