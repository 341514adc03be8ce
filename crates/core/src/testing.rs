//! Shared fixtures for service tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use monitor_agent::{AgentError, InstanceAgent};
use monitor_common::{DistributionConfig, MessagesConfig};
use monitor_db::test_utils::message;
use monitor_db::{
    InstanceRepository, KeyedLocks, MessageRepository, ServiceMessage, SharedInstanceStore,
    SharedMessageStore, SofieInstance,
};
use monitor_distribution::{
    DistributionCoordinator, JobScheduler, ProcessorContext, ProcessorRegistry, RetryingExecutor,
};

use crate::services::{AddInstanceInput, InstanceService, ServiceMessageService};

/// Agent keyed by instance host. Successful calls are recorded.
#[derive(Default)]
pub struct StubAgent {
    created: Mutex<Vec<String>>,
    recalled: Mutex<Vec<String>>,
    published: Mutex<HashSet<String>>,
    rejecting_creates: Mutex<HashSet<String>>,
    failing_recalls: Mutex<HashSet<String>>,
    unreachable: Mutex<HashSet<String>>,
}

impl StubAgent {
    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    pub fn recalled(&self) -> Vec<String> {
        self.recalled.lock().unwrap().clone()
    }

    /// Report the message as present on `host`.
    pub fn publish(&self, host: &str) {
        self.published.lock().unwrap().insert(host.to_string());
    }

    /// Answer creates on `host` with 400.
    pub fn fail_creates(&self, host: &str) {
        self.rejecting_creates.lock().unwrap().insert(host.to_string());
    }

    /// Answer recalls on `host` with 503.
    pub fn fail_recalls(&self, host: &str) {
        self.failing_recalls.lock().unwrap().insert(host.to_string());
    }

    pub fn make_unreachable(&self, host: &str) {
        self.unreachable.lock().unwrap().insert(host.to_string());
    }

    fn host(instance: &SofieInstance) -> String {
        instance.url.host_str().unwrap().to_string()
    }
}

#[async_trait]
impl InstanceAgent for StubAgent {
    async fn create_message(
        &self,
        _message: &ServiceMessage,
        instance: &SofieInstance,
    ) -> Result<(), AgentError> {
        let host = Self::host(instance);
        if self.rejecting_creates.lock().unwrap().contains(&host) {
            return Err(AgentError::from_status(400, String::new(), &[200, 201]));
        }
        self.created.lock().unwrap().push(host);
        Ok(())
    }

    async fn recall_message(
        &self,
        _message: &ServiceMessage,
        instance: &SofieInstance,
    ) -> Result<(), AgentError> {
        let host = Self::host(instance);
        if self.failing_recalls.lock().unwrap().contains(&host) {
            return Err(AgentError::from_status(503, String::new(), &[200, 404]));
        }
        self.recalled.lock().unwrap().push(host);
        Ok(())
    }

    async fn get_message(
        &self,
        id: &str,
        instance: &SofieInstance,
    ) -> Result<Option<ServiceMessage>, AgentError> {
        let host = Self::host(instance);
        if self.unreachable.lock().unwrap().contains(&host) {
            return Err(AgentError::from_status(503, String::new(), &[200, 404]));
        }
        if self.published.lock().unwrap().contains(&host) {
            return Ok(Some(message(Some(id), true, &[instance.clone()])));
        }
        Ok(None)
    }
}

/// Services wired over in-memory registries and a [`StubAgent`].
pub struct Fixture {
    pub messages: ServiceMessageService,
    pub instances: InstanceService,
    pub store: SharedMessageStore,
    pub agent: Arc<StubAgent>,
    targets: Vec<SofieInstance>,
}

impl Fixture {
    /// Register one `http://{host}/` instance per host.
    pub async fn new(hosts: &[&str]) -> Self {
        let store: SharedMessageStore = Arc::new(MessageRepository::in_memory());
        let instance_store: SharedInstanceStore = Arc::new(InstanceRepository::in_memory());
        let instances = InstanceService::new(instance_store.clone(), store.clone());

        let mut targets = Vec::new();
        for host in hosts {
            let input = AddInstanceInput {
                url: format!("http://{host}/"),
                name: None,
            };
            targets.push(instances.add(input).await.unwrap());
        }

        let agent = Arc::new(StubAgent::default());
        let locks = KeyedLocks::new();
        let registry = ProcessorRegistry::standard(ProcessorContext {
            messages: store.clone(),
            instances: instance_store.clone(),
            agent: agent.clone(),
            locks: locks.clone(),
        });
        let coordinator = DistributionCoordinator::new(
            registry,
            RetryingExecutor::new(JobScheduler::new()),
            &DistributionConfig::default(),
        );
        let messages = ServiceMessageService::new(
            store.clone(),
            instance_store,
            agent.clone(),
            coordinator,
            locks,
            &MessagesConfig::default(),
        );

        Self {
            messages,
            instances,
            store,
            agent,
            targets,
        }
    }

    /// The `index`th registered instance.
    pub fn instance(&self, index: usize) -> SofieInstance {
        self.targets[index].clone()
    }
}

/// Let scheduled jobs run their first attempt.
pub async fn advance() {
    tokio::time::sleep(Duration::from_secs(1)).await;
}
