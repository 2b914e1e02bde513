// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles container names, image refs, and the tunnel command line.

use nonempty::NonEmpty;
use serde::Deserialize;

use crate::types::{ContainerName, ImageRef};

pub fn deserialize_container_name<'de, D>(deserializer: D) -> Result<ContainerName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ContainerName::new(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_image_ref<'de, D>(deserializer: D) -> Result<ImageRef, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ImageRef::parse(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_tunnel<'de, D>(deserializer: D) -> Result<NonEmpty<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<String> = Vec::deserialize(deserializer)?;

    if values.iter().any(|arg| arg.trim().is_empty()) {
        return Err(serde::de::Error::custom(
            "tunnel arguments cannot be empty strings",
        ));
    }

    NonEmpty::from_vec(values)
        .ok_or_else(|| serde::de::Error::custom("tunnel command needs at least a program"))
}
