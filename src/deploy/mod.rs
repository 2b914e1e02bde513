// ABOUTME: Deployment orchestration using the type state pattern.
// ABOUTME: Exports state types, the Deployment struct and the pipeline driver.

mod deployment;
mod error;
pub mod labels;
mod pipeline;
mod state;
mod target;
mod transitions;

pub use deployment::Deployment;
pub use error::DeployError;
pub use pipeline::{PipelineFailure, Stage, StageObserver, run_pipeline};
pub use state::{
    Authenticated, Built, CleanedOld, Created, Done, Init, PulledRemote, Pushed, Started, Tagged,
};
pub use target::DeploymentTarget;
