//! Backend liveness pre-flight.

use super::WorkflowSettings;
use crate::harness::{Expectation, RequestTemplate, Step, Workflow};

pub(super) const HEALTH_CHECK: &str = "health-check";

/// Health endpoint exposed by Spring Boot actuator, when enabled.
const ACTUATOR_HEALTH: &str = "/actuator/health";

pub(super) fn health_check(_settings: &WorkflowSettings) -> Workflow {
    Workflow::new(HEALTH_CHECK)
        .step(
            // Deployments without actuator answer 404; the guarded endpoint
            // below still proves the API is up.
            Step::new("actuator health", RequestTemplate::get(ACTUATOR_HEALTH))
                .expect(Expectation::status_in(&[200, 404]))
                .expect_soft(Expectation::equals("status", "UP")),
        )
        .step(
            Step::new(
                "guarded endpoint answers",
                RequestTemplate::get("/api/v1/users"),
            )
            .expect(Expectation::status_in(&[401, 403])),
        )
}
