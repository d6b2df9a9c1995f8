//! Test doubles for the connector ports
//!
//! Available to downstream crates through the `test-utils` feature.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use prato_domain::{PratoError, Result};

use crate::audit::{AuditEvent, AuditSink};
use crate::connector_ports::SecretsProvider;

/// Secrets provider backed by a fixed map
#[derive(Debug, Default)]
pub struct StaticSecretsProvider {
    secrets: HashMap<String, HashMap<String, String>>,
}

impl StaticSecretsProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a secret bundle under a name.
    #[must_use]
    pub fn with_secret(mut self, name: &str, values: &[(&str, &str)]) -> Self {
        let bundle = values.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        self.secrets.insert(name.to_string(), bundle);
        self
    }
}

#[async_trait]
impl SecretsProvider for StaticSecretsProvider {
    async fn get_secret(&self, name: &str) -> Result<HashMap<String, String>> {
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| PratoError::NotFound(format!("secret bundle: {name}")))
    }
}

/// Audit sink that captures every record for assertions
#[derive(Debug, Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events.
    #[allow(clippy::expect_used)]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("mutex poisoned").clone()
    }

    /// Count of records for a given action name.
    pub fn count(&self, action: &str) -> usize {
        self.events().iter().filter(|e| e.action == action).count()
    }
}

impl AuditSink for RecordingAuditSink {
    #[allow(clippy::expect_used)]
    fn record(&self, event: AuditEvent) {
        self.events.lock().expect("mutex poisoned").push(event);
    }
}
