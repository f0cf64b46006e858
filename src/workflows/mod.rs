//! Built-in SpinWish workflows and the catalog that names them.

mod auth;
mod catalog;
mod common;
mod health;
mod requests;
mod sessions;

use crate::harness::{HarnessError, Workflow};
use crate::identity::IdentityFactory;
use std::sync::Arc;

pub use common::{login, signup};

/// Knobs shared by every built-in workflow.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    /// Number of parallel requests in fan-out steps.
    pub concurrency: usize,
    /// Any one of these must be present in a login response.
    pub login_user_paths: Vec<String>,
    pub identities: IdentityFactory,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            concurrency: 5,
            login_user_paths: vec!["userDetails".to_string(), "user".to_string()],
            identities: IdentityFactory::default(),
        }
    }
}

/// Something that can build a runnable workflow.
pub trait WorkflowSource: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Builds a fresh workflow. Every call generates new identities.
    fn build(&self, settings: &WorkflowSettings) -> Workflow;
}

/// A workflow defined by a plain builder function.
#[derive(Clone, Copy)]
pub struct BuiltinWorkflow {
    name: &'static str,
    description: &'static str,
    build: fn(&WorkflowSettings) -> Workflow,
}

impl WorkflowSource for BuiltinWorkflow {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn build(&self, settings: &WorkflowSettings) -> Workflow {
        (self.build)(settings).describe(self.description)
    }
}

const BUILTINS: &[BuiltinWorkflow] = &[
    BuiltinWorkflow {
        name: health::HEALTH_CHECK,
        description: "Backend is up: actuator health reports UP, guarded endpoints answer 401/403",
        build: health::health_check,
    },
    BuiltinWorkflow {
        name: auth::SIGNUP_LOGIN,
        description: "Sign up a new client, then log in with the same credentials",
        build: auth::signup_login,
    },
    BuiltinWorkflow {
        name: auth::AUTH_GUARD,
        description: "Protected endpoints reject missing and malformed tokens with 401",
        build: auth::auth_guard,
    },
    BuiltinWorkflow {
        name: auth::PUBLIC_ENDPOINTS,
        description: "Signup and login answer an empty body with 400/422, never 401/403",
        build: auth::public_endpoints,
    },
    BuiltinWorkflow {
        name: catalog::CATALOG_ROUNDTRIP,
        description: "Artist and song create, fetch, update and delete round trip",
        build: catalog::catalog_roundtrip,
    },
    BuiltinWorkflow {
        name: requests::SONG_REQUEST_JOURNEY,
        description: "Client requests a DJ's song, the DJ marks it done",
        build: requests::song_request_journey,
    },
    BuiltinWorkflow {
        name: requests::CONCURRENT_REQUESTS,
        description: "Concurrent song requests all succeed with distinct ids",
        build: requests::concurrent_requests,
    },
    BuiltinWorkflow {
        name: requests::UNKNOWN_DJ_REQUEST,
        description: "Song requests for an unknown DJ (404) or without a song id are rejected",
        build: requests::unknown_dj_request,
    },
    BuiltinWorkflow {
        name: sessions::DJ_SESSION_LIFECYCLE,
        description: "DJ creates a club session, goes live and ends it",
        build: sessions::dj_session_lifecycle,
    },
];

/// Registry of named workflows, in registration order.
pub struct WorkflowCatalog {
    sources: Vec<Arc<dyn WorkflowSource>>,
}

impl WorkflowCatalog {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Catalog holding every built-in workflow.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for builtin in BUILTINS {
            catalog.sources.push(Arc::new(*builtin));
        }
        catalog
    }

    /// Registers a workflow, replacing any existing one with the same name.
    pub fn register(&mut self, source: impl WorkflowSource + 'static) {
        self.sources.retain(|s| s.name() != source.name());
        self.sources.push(Arc::new(source));
    }

    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// `(name, description)` pairs, for `--list`.
    pub fn entries(&self) -> Vec<(&str, &str)> {
        self.sources
            .iter()
            .map(|s| (s.name(), s.description()))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn WorkflowSource>> {
        self.sources.iter().find(|s| s.name() == name).cloned()
    }

    pub fn build(&self, name: &str, settings: &WorkflowSettings) -> Result<Workflow, HarnessError> {
        self.get(name)
            .map(|source| source.build(settings))
            .ok_or_else(|| HarnessError::UnknownWorkflow(name.to_string()))
    }

    /// Builds the named workflows, or all of them when `names` is empty.
    pub fn select(
        &self,
        names: &[String],
        settings: &WorkflowSettings,
    ) -> Result<Vec<Workflow>, HarnessError> {
        if names.is_empty() {
            return Ok(self.sources.iter().map(|s| s.build(settings)).collect());
        }
        names.iter().map(|name| self.build(name, settings)).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Default for WorkflowCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
