// ABOUTME: Labels stamped on every container burrow creates.
// ABOUTME: Records what was deployed, when, and from which machine.

use super::DeploymentTarget;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;

pub const MANAGED: &str = "burrow.managed";
pub const IMAGE: &str = "burrow.image";
pub const DEPLOYED_AT: &str = "burrow.deployed-at";
pub const DEPLOYED_BY: &str = "burrow.deployed-by";

/// Configured labels plus burrow's own, which win on conflict.
pub fn container_labels(
    target: &DeploymentTarget,
    deployed_at: DateTime<Utc>,
    deployed_by: &str,
) -> HashMap<String, String> {
    let mut labels = target.labels.clone();
    labels.insert(MANAGED.to_string(), "true".to_string());
    labels.insert(IMAGE.to_string(), target.image.to_string());
    labels.insert(
        DEPLOYED_AT.to_string(),
        deployed_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    );
    labels.insert(DEPLOYED_BY.to_string(), deployed_by.to_string());
    labels
}

/// Host name of this machine, for `burrow.deployed-by`.
pub fn local_hostname() -> String {
    gethostname::gethostname().to_string_lossy().into_owned()
}
