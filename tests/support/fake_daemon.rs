// ABOUTME: In-memory ContainerDaemon for driving the deployment pipeline in tests.
// ABOUTME: Mimics daemon status semantics for stop/remove/create/start and scripts streams.

use async_trait::async_trait;
use burrow::daemon::{
    BuildContext, ContainerDaemon, ContainerSpec, ContainerSummary, CreatedContainer, DaemonError,
    PublishedPort, RegistryAuth,
};
use burrow::progress::{ProgressRecord, ProgressStream};
use burrow::types::{ContainerId, ContainerName, ImageId, ImageRef};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// One daemon operation, recorded in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Build,
    Tag(String),
    Push(String),
    Pull(String),
    List,
    Stop(String),
    Remove(String),
    Create(String),
    Start(String),
}

#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub id: ContainerId,
    pub name: String,
    pub image: ImageId,
    pub running: bool,
    pub publish: Option<PublishedPort>,
    pub network: Option<String>,
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    containers: Vec<FakeContainer>,
    images: HashSet<String>,
    build_records: Vec<ProgressRecord>,
    push_records: Vec<ProgressRecord>,
    pull_records: Vec<ProgressRecord>,
    create_warnings: Vec<String>,
    failing_stop: bool,
    next_id: usize,
}

#[derive(Debug, Default)]
pub struct FakeDaemon {
    state: Mutex<State>,
}

fn scripted(records: Vec<ProgressRecord>) -> ProgressStream {
    Box::pin(futures::stream::iter(records.into_iter().map(Ok)))
}

impl FakeDaemon {
    pub fn new() -> Self {
        Self::default()
    }

    /// A local daemon whose build of any context produces `image`.
    pub fn building(image: &str) -> Self {
        Self::new()
            .with_build_output(&[
                "Step 1/2 : FROM scratch\n".to_string(),
                format!("Successfully built {image}\n"),
            ])
            .with_image(image)
    }

    pub fn with_build_output(self, lines: &[String]) -> Self {
        self.with_build_records(
            lines
                .iter()
                .map(|l| ProgressRecord::stream_text(l.as_str()))
                .collect(),
        )
    }

    pub fn with_build_records(self, records: Vec<ProgressRecord>) -> Self {
        self.state.lock().build_records = records;
        self
    }

    pub fn with_image(self, image: &str) -> Self {
        self.state.lock().images.insert(image.to_string());
        self
    }

    pub fn with_push_records(self, records: Vec<ProgressRecord>) -> Self {
        self.state.lock().push_records = records;
        self
    }

    pub fn with_pull_records(self, records: Vec<ProgressRecord>) -> Self {
        self.state.lock().pull_records = records;
        self
    }

    pub fn with_container(self, name: &str, image: &str, running: bool) -> Self {
        {
            let mut state = self.state.lock();
            state.next_id += 1;
            let id = ContainerId::new(format!("old-{}", state.next_id));
            state.containers.push(FakeContainer {
                id,
                name: name.to_string(),
                image: ImageId::new(image),
                running,
                publish: None,
                network: None,
                labels: HashMap::new(),
            });
        }
        self
    }

    pub fn with_create_warnings(self, warnings: &[&str]) -> Self {
        self.state.lock().create_warnings = warnings.iter().map(|w| w.to_string()).collect();
        self
    }

    /// Every stop request fails with a generic daemon error.
    pub fn with_failing_stop(self) -> Self {
        self.state.lock().failing_stop = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn containers(&self) -> Vec<FakeContainer> {
        self.state.lock().containers.clone()
    }

    pub fn container(&self, name: &str) -> Option<FakeContainer> {
        self.state
            .lock()
            .containers
            .iter()
            .find(|c| c.name == name)
            .cloned()
    }
}

#[async_trait]
impl ContainerDaemon for FakeDaemon {
    async fn build_image(&self, _context: &BuildContext) -> Result<ProgressStream, DaemonError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Build);
        Ok(scripted(state.build_records.clone()))
    }

    async fn tag_image(&self, image: &ImageId, reference: &ImageRef) -> Result<(), DaemonError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Tag(reference.to_string()));
        if !state.images.contains(image.as_str()) {
            return Err(DaemonError::NotFound(format!("No such image: {image}")));
        }
        Ok(())
    }

    fn push_image(&self, reference: &ImageRef, _auth: &RegistryAuth) -> ProgressStream {
        let mut state = self.state.lock();
        state.calls.push(Call::Push(reference.to_string()));
        scripted(state.push_records.clone())
    }

    fn pull_image(&self, reference: &ImageRef, _auth: &RegistryAuth) -> ProgressStream {
        let mut state = self.state.lock();
        state.calls.push(Call::Pull(reference.to_string()));
        scripted(state.pull_records.clone())
    }

    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>, DaemonError> {
        let mut state = self.state.lock();
        state.calls.push(Call::List);
        Ok(state
            .containers
            .iter()
            .filter(|c| all || c.running)
            .map(|c| ContainerSummary {
                id: c.id.clone(),
                name: c.name.clone(),
                image: c.image.to_string(),
                state: if c.running { "running" } else { "exited" }.to_string(),
                status: if c.running { "Up 2 seconds" } else { "Exited (0)" }.to_string(),
                labels: c.labels.clone(),
            })
            .collect())
    }

    async fn stop_container(
        &self,
        name: &ContainerName,
        _timeout: Duration,
    ) -> Result<(), DaemonError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Stop(name.to_string()));
        if state.failing_stop {
            return Err(DaemonError::Api("stop timed out".to_string()));
        }
        let Some(container) = state.containers.iter_mut().find(|c| c.name == name.as_str()) else {
            return Err(DaemonError::NotFound(format!("No such container: {name}")));
        };
        if !container.running {
            return Err(DaemonError::NotModified(format!("{name} is not running")));
        }
        container.running = false;
        Ok(())
    }

    async fn remove_container(&self, name: &ContainerName) -> Result<(), DaemonError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Remove(name.to_string()));
        let Some(index) = state.containers.iter().position(|c| c.name == name.as_str()) else {
            return Err(DaemonError::NotFound(format!("No such container: {name}")));
        };
        if state.containers[index].running {
            return Err(DaemonError::Conflict(format!(
                "cannot remove running container {name}"
            )));
        }
        state.containers.remove(index);
        Ok(())
    }

    async fn create_container(
        &self,
        spec: &ContainerSpec,
    ) -> Result<CreatedContainer, DaemonError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Create(spec.name.to_string()));
        if state.containers.iter().any(|c| c.name == spec.name.as_str()) {
            return Err(DaemonError::Conflict(format!(
                "container name {} is already in use",
                spec.name
            )));
        }

        state.next_id += 1;
        let id = ContainerId::new(format!("ctr-{}", state.next_id));
        state.containers.push(FakeContainer {
            id: id.clone(),
            name: spec.name.to_string(),
            image: spec.image.clone(),
            running: false,
            publish: Some(spec.publish.clone()),
            network: spec.network.clone(),
            labels: spec.labels.clone(),
        });

        Ok(CreatedContainer {
            id,
            warnings: state.create_warnings.clone(),
        })
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), DaemonError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Start(id.to_string()));
        match state.containers.iter_mut().find(|c| &c.id == id) {
            Some(container) => {
                container.running = true;
                Ok(())
            }
            None => Err(DaemonError::NotFound(format!("No such container: {id}"))),
        }
    }
}
