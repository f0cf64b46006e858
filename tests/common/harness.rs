//! Harness wiring pointed at a mock server.

use super::constants::*;
use super::server::MockServer;
use spinwish_harness::client::ApiClient;
use spinwish_harness::identity::IdentityFactory;
use spinwish_harness::workflows::WorkflowSettings;
use spinwish_harness::WorkflowRunner;
use std::sync::Arc;

pub fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(server.base_url.clone(), CLIENT_TIMEOUT_SEC)
}

/// A runner that honours each workflow's own failure policy.
pub fn runner_for(server: &MockServer) -> WorkflowRunner {
    WorkflowRunner::new(Arc::new(client_for(server)))
}

pub fn settings() -> WorkflowSettings {
    WorkflowSettings {
        identities: IdentityFactory::new(TEST_PASSWORD, TEST_EMAIL_DOMAIN),
        ..WorkflowSettings::default()
    }
}
